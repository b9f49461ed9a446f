//! Authoritative scoring over persisted answer records. Scores are always
//! recomputed from the stored records against the test definition; nothing a
//! client declares about its own result is ever read.

use crate::models::domain::{AnswerRecord, Question, QuestionKind, TestDefinition};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreOutcome {
    /// Percentage, 0-100.
    pub score: u32,
    pub passed: bool,
    pub correct_count: usize,
    pub scorable_count: usize,
}

/// Correctness of one saved answer. `open` questions are never correct in
/// the automatic sense; they stay out of both numerator and denominator.
pub fn is_correct_answer(question: &Question, selected_option: usize) -> bool {
    question.kind == QuestionKind::SingleChoice
        && question.correct_option == Some(selected_option)
}

/// `score = round(100 * correct / scorable)` where `scorable` counts the
/// single-choice questions of the definition. A definition with no scorable
/// questions yields a score of zero.
pub fn score_attempt(test: &TestDefinition, answers: &[AnswerRecord]) -> ScoreOutcome {
    let scorable_count = test.scorable_question_count();

    let correct_count = answers
        .iter()
        .filter(|record| {
            test.question(&record.question_id)
                .map(|question| is_correct_answer(question, record.selected_option))
                .unwrap_or(false)
        })
        .count();

    let score = if scorable_count == 0 {
        0
    } else {
        ((correct_count * 100) as f64 / scorable_count as f64).round() as u32
    };

    ScoreOutcome {
        score,
        passed: score >= test.pass_threshold,
        correct_count,
        scorable_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::domain::TestStatus;

    fn single_choice(id: &str, correct: usize) -> Question {
        Question {
            id: id.to_string(),
            kind: QuestionKind::SingleChoice,
            prompt: format!("Question {}", id),
            options: vec!["A".to_string(), "B".to_string(), "C".to_string(), "D".to_string()],
            correct_option: Some(correct),
            reference_answer: None,
        }
    }

    fn open(id: &str) -> Question {
        Question {
            id: id.to_string(),
            kind: QuestionKind::Open,
            prompt: format!("Question {}", id),
            options: vec![],
            correct_option: None,
            reference_answer: None,
        }
    }

    fn make_test(pass_threshold: u32, questions: Vec<Question>) -> TestDefinition {
        TestDefinition {
            id: "test-1".to_string(),
            title: "Scoring Test".to_string(),
            duration_minutes: 30,
            pass_threshold,
            max_attempts: 3,
            status: TestStatus::Published,
            questions,
            created_at: None,
            modified_at: None,
        }
    }

    fn answer(question_id: &str, selected: usize) -> AnswerRecord {
        AnswerRecord::new("attempt-1", question_id, selected, false)
    }

    #[test]
    fn three_of_four_correct_passes_threshold_75() {
        let test = make_test(
            75,
            vec![
                single_choice("q1", 0),
                single_choice("q2", 1),
                single_choice("q3", 2),
                single_choice("q4", 3),
            ],
        );
        let answers = vec![
            answer("q1", 0),
            answer("q2", 1),
            answer("q3", 2),
            answer("q4", 0), // wrong
        ];

        let outcome = score_attempt(&test, &answers);
        assert_eq!(outcome.score, 75);
        assert!(outcome.passed);
        assert_eq!(outcome.correct_count, 3);
        assert_eq!(outcome.scorable_count, 4);
    }

    #[test]
    fn identical_answers_fail_threshold_80() {
        let test = make_test(
            80,
            vec![
                single_choice("q1", 0),
                single_choice("q2", 1),
                single_choice("q3", 2),
                single_choice("q4", 3),
            ],
        );
        let answers = vec![
            answer("q1", 0),
            answer("q2", 1),
            answer("q3", 2),
            answer("q4", 0),
        ];

        let outcome = score_attempt(&test, &answers);
        assert_eq!(outcome.score, 75);
        assert!(!outcome.passed);
    }

    #[test]
    fn open_questions_stay_out_of_the_denominator() {
        let test = make_test(50, vec![single_choice("q1", 1), open("q2")]);
        let answers = vec![answer("q1", 1)];

        let outcome = score_attempt(&test, &answers);
        assert_eq!(outcome.score, 100);
        assert_eq!(outcome.scorable_count, 1);
    }

    #[test]
    fn no_answers_scores_zero() {
        let test = make_test(75, vec![single_choice("q1", 0), single_choice("q2", 1)]);

        let outcome = score_attempt(&test, &[]);
        assert_eq!(outcome.score, 0);
        assert!(!outcome.passed);
    }

    #[test]
    fn all_open_definition_scores_zero_without_dividing() {
        let test = make_test(0, vec![open("q1"), open("q2")]);

        let outcome = score_attempt(&test, &[]);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.scorable_count, 0);
        // threshold 0 is still met by a zero score
        assert!(outcome.passed);
    }

    #[test]
    fn score_rounds_to_nearest_percent() {
        let test = make_test(
            50,
            vec![
                single_choice("q1", 0),
                single_choice("q2", 0),
                single_choice("q3", 0),
            ],
        );

        let one_correct = vec![answer("q1", 0)];
        assert_eq!(score_attempt(&test, &one_correct).score, 33);

        let two_correct = vec![answer("q1", 0), answer("q2", 0)];
        assert_eq!(score_attempt(&test, &two_correct).score, 67);
    }

    #[test]
    fn answers_for_unknown_questions_are_ignored() {
        let test = make_test(50, vec![single_choice("q1", 0)]);
        let answers = vec![answer("q1", 0), answer("ghost", 0)];

        let outcome = score_attempt(&test, &answers);
        assert_eq!(outcome.correct_count, 1);
        assert_eq!(outcome.score, 100);
    }
}

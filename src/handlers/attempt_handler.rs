use actix_web::{get, post, put, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::{
        request::SubmitAnswerRequest,
        response::{AttemptResultDto, AttemptStateDto, SavedAnswerDto, StartAttemptResponse},
    },
};

/// Start an attempt on one assignment instance. Eligibility is re-checked
/// server-side here; a client-cached listing is never trusted. If an attempt
/// is already open for the pair it is returned with 200 instead of 201.
#[post("/sources/{source_id}/attempts")]
pub async fn start_attempt(
    state: web::Data<AppState>,
    source_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let outcome = state.attempt_service.start(&source_id, &auth.0.sub).await?;

    let body = StartAttemptResponse::from(&outcome);
    if outcome.created {
        Ok(HttpResponse::Created().json(body))
    } else {
        Ok(HttpResponse::Ok().json(body))
    }
}

/// Attempt status with remaining seconds and saved answers, for the client
/// countdown and resume-after-reload.
#[get("/attempts/{attempt_id}")]
pub async fn get_attempt_state(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let attempt_state = state.attempt_service.state(&attempt_id, &auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(AttemptStateDto::from(attempt_state)))
}

/// Best-effort answer save, invoked on every answer change. Safe to repeat:
/// the record for the question is replaced, not appended.
#[put("/attempts/{attempt_id}/answers/{question_id}")]
pub async fn save_answer(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    request: web::Json<SubmitAnswerRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let (attempt_id, question_id) = path.into_inner();

    let record = state
        .attempt_service
        .save_answer(&attempt_id, &auth.0.sub, &question_id, request.selected_option)
        .await?;

    Ok(HttpResponse::Ok().json(SavedAnswerDto::from(&record)))
}

/// Close the attempt and compute the authoritative score from persisted
/// answers. Idempotent: repeating the call returns the stored result.
#[post("/attempts/{attempt_id}/finalize")]
pub async fn finalize_attempt(
    state: web::Data<AppState>,
    attempt_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let result = state
        .attempt_service
        .finalize(&attempt_id, &auth.0.sub)
        .await?;

    Ok(HttpResponse::Ok().json(AttemptResultDto::from(result)))
}

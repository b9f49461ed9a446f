use actix_web::{get, post, web, HttpResponse};
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::{require_admin, AuthenticatedUser},
    errors::AppError,
    models::dto::{
        request::AssignTestRequest,
        response::{AssignmentSummaryResponse, ResultsRowDto},
    },
};

/// Grant a test to a list of users, with optional deadline and attempt-cap
/// override. Upserts per user and reports what happened to each.
#[post("/admin/assignments")]
pub async fn assign_test(
    state: web::Data<AppState>,
    request: web::Json<AssignTestRequest>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let request = request.into_inner();
    request.validate()?;

    let outcomes = state
        .assignment_service
        .assign(
            &request.test_id,
            &request.user_ids,
            request.deadline,
            request.max_attempts_override,
        )
        .await?;

    Ok(HttpResponse::Ok().json(AssignmentSummaryResponse::new(&request.test_id, outcomes)))
}

/// All attempts across learners, including open ones the sweep will close.
#[get("/admin/results")]
pub async fn results_report(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth.0)?;

    let rows = state.attempt_service.results_report().await?;
    let body: Vec<ResultsRowDto> = rows.into_iter().map(ResultsRowDto::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

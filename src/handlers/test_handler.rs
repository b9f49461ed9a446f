use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState,
    auth::AuthenticatedUser,
    errors::AppError,
    models::dto::response::TestContentDto,
};

/// Test content for taking or reviewing a test. Learners never receive the
/// answer key; unpublished tests are invisible to them.
#[get("/tests/{test_id}")]
pub async fn get_test_content(
    state: web::Data<AppState>,
    test_id: web::Path<String>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let test = state.eligibility_service.test_content(&test_id).await?;

    if auth.0.is_admin() {
        return Ok(HttpResponse::Ok().json(TestContentDto::for_admin(&test)));
    }

    if !test.is_published() {
        return Err(AppError::NotFound(format!("Test '{}' not found", test_id)));
    }

    Ok(HttpResponse::Ok().json(TestContentDto::for_learner(&test)))
}

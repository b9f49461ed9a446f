pub mod admin_handler;
pub mod attempt_handler;
pub mod eligibility_handler;
pub mod test_handler;

use actix_web::{get, web, HttpResponse};

use crate::{app_state::AppState, errors::AppError};

pub use admin_handler::{assign_test, results_report};
pub use attempt_handler::{finalize_attempt, get_attempt_state, save_answer, start_attempt};
pub use eligibility_handler::list_eligibility;
pub use test_handler::get_test_content;

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state.db.health_check().await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

use actix_web::{get, web, HttpResponse};

use crate::{
    app_state::AppState, auth::AuthenticatedUser, errors::AppError,
    models::dto::response::EligibleTestDto,
};

/// Every assignment instance the caller can see, one row per source, with
/// its derived status and attempt summary.
#[get("/eligibility")]
pub async fn list_eligibility(
    state: web::Data<AppState>,
    auth: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let eligible = state
        .eligibility_service
        .resolve_for_user(&auth.0.sub)
        .await?;

    let body: Vec<EligibleTestDto> = eligible.into_iter().map(EligibleTestDto::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

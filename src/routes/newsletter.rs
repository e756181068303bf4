use axum::{Json, Router, extract::State, routing::{get, post}};

use crate::{
    dto::newsletter::SubscribeRequest,
    error::AppResult,
    marketing::NewsletterDetails,
    response::ApiResponse,
    services::marketing_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/subscribe", post(subscribe))
        .route("/details", get(details))
}

#[utoipa::path(
    post,
    path = "/api/newsletter/subscribe",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "Subscribed to the newsletter", body = ApiResponse<serde_json::Value>),
        (status = 400, description = "Subscription rejected"),
    ),
    tag = "Newsletter"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(payload): Json<SubscribeRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = marketing_service::subscribe(&state.marketing, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/newsletter/details",
    responses(
        (status = 200, description = "Newsletter list name and welcome coupon", body = ApiResponse<NewsletterDetails>),
    ),
    tag = "Newsletter"
)]
pub async fn details(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<NewsletterDetails>>> {
    let resp = marketing_service::newsletter_details(&state.marketing).await?;
    Ok(Json(resp))
}

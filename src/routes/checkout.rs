use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CheckoutRequest, CheckoutResponse},
    error::AppResult,
    middleware::session::CartSessionId,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(begin_checkout))
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    params(("x-cart-session" = String, Header, description = "Cart session key")),
    responses(
        (status = 200, description = "Hosted checkout URL", body = ApiResponse<CheckoutResponse>),
        (status = 404, description = "Cart expired"),
    ),
    tag = "Checkout"
)]
pub async fn begin_checkout(
    State(state): State<AppState>,
    session: CartSessionId,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<Json<ApiResponse<CheckoutResponse>>> {
    // the session's synchronizer knows whether a server cart exists yet
    let cart_id = {
        let shared = state.cart_session(&session.0).await;
        let mut cart = shared.lock().await;
        cart.ensure_hydrated(&state.shutdown).await?;
        cart.state().server_cart_id.clone()
    };

    let resp =
        checkout_service::begin_checkout(&state.commerce, cart_id, payload, &state.shutdown)
            .await?;
    Ok(Json(resp))
}

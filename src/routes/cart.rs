use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};

use crate::{
    dto::cart::{AddItemRequest, ApplyCouponRequest, SetQuantityRequest, SetShippingRequest},
    error::AppResult,
    middleware::session::CartSessionId,
    models::NewCartItem,
    response::ApiResponse,
    services::cart_sync::CartView,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/{variant_id}", put(set_quantity).delete(remove_item))
        .route("/coupon", post(apply_coupon).delete(remove_coupon))
        .route("/shipping", put(set_shipping))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(("x-cart-session" = String, Header, description = "Cart session key")),
    responses(
        (status = 200, description = "Current cart with derived pricing", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    session: CartSessionId,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;
    Ok(Json(ApiResponse::success("OK", cart.view(), None)))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddItemRequest,
    params(("x-cart-session" = String, Header, description = "Cart session key")),
    responses(
        (status = 200, description = "Item added and synced", body = ApiResponse<CartView>),
        (status = 502, description = "Backend unreachable, mutation rolled back"),
    ),
    tag = "Cart"
)]
pub async fn add_item(
    State(state): State<AppState>,
    session: CartSessionId,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;

    let item = NewCartItem {
        variant_id: payload.variant_id,
        title: payload.title,
        variant_label: payload.variant_label,
        unit_price: payload.unit_price,
        image_url: payload.image_url,
    };
    let view = cart
        .add_item(item, payload.quantity, &state.shutdown)
        .await?;
    Ok(Json(ApiResponse::success("Added to cart", view, None)))
}

#[utoipa::path(
    put,
    path = "/api/cart/items/{variant_id}",
    request_body = SetQuantityRequest,
    params(
        ("variant_id" = String, Path, description = "Variant ID"),
        ("x-cart-session" = String, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "Quantity updated; zero removes the line", body = ApiResponse<CartView>),
        (status = 404, description = "No such item"),
    ),
    tag = "Cart"
)]
pub async fn set_quantity(
    State(state): State<AppState>,
    session: CartSessionId,
    Path(variant_id): Path<String>,
    Json(payload): Json<SetQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;

    let view = cart
        .set_quantity(&variant_id, payload.quantity, &state.shutdown)
        .await?;
    Ok(Json(ApiResponse::success("Quantity updated", view, None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{variant_id}",
    params(
        ("variant_id" = String, Path, description = "Variant ID"),
        ("x-cart-session" = String, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "Item removed", body = ApiResponse<CartView>),
        (status = 404, description = "No such item"),
    ),
    tag = "Cart"
)]
pub async fn remove_item(
    State(state): State<AppState>,
    session: CartSessionId,
    Path(variant_id): Path<String>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;

    let view = cart.remove_item(&variant_id, &state.shutdown).await?;
    Ok(Json(ApiResponse::success("Removed from cart", view, None)))
}

#[utoipa::path(
    post,
    path = "/api/cart/coupon",
    request_body = ApplyCouponRequest,
    params(("x-cart-session" = String, Header, description = "Cart session key")),
    responses(
        (status = 200, description = "Coupon applied", body = ApiResponse<CartView>),
        (status = 400, description = "Cart not initialized"),
        (status = 422, description = "Code accepted but not applicable"),
    ),
    tag = "Cart"
)]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: CartSessionId,
    Json(payload): Json<ApplyCouponRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;

    let view = cart.apply_coupon(&payload.code, &state.shutdown).await?;
    Ok(Json(ApiResponse::success("Discount applied", view, None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart/coupon",
    params(("x-cart-session" = String, Header, description = "Cart session key")),
    responses(
        (status = 200, description = "Coupon cleared optimistically", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn remove_coupon(
    State(state): State<AppState>,
    session: CartSessionId,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;

    let view = cart.remove_coupon(&state.shutdown).await?;
    Ok(Json(ApiResponse::success("Discount removed", view, None)))
}

#[utoipa::path(
    put,
    path = "/api/cart/shipping",
    request_body = SetShippingRequest,
    params(("x-cart-session" = String, Header, description = "Cart session key")),
    responses(
        (status = 200, description = "Shipping method selected", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn set_shipping(
    State(state): State<AppState>,
    session: CartSessionId,
    Json(payload): Json<SetShippingRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;

    let view = cart.set_shipping_method(payload.method);
    Ok(Json(ApiResponse::success("Shipping updated", view, None)))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(("x-cart-session" = String, Header, description = "Cart session key")),
    responses(
        (status = 200, description = "Cart cleared", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: CartSessionId,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let shared = state.cart_session(&session.0).await;
    let mut cart = shared.lock().await;
    cart.ensure_hydrated(&state.shutdown).await?;

    let view = cart.clear().await;
    Ok(Json(ApiResponse::success("Cart cleared", view, None)))
}

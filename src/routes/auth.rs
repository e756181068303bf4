use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};

use crate::{
    dto::auth::{
        LoginRequest, LoginResponse, OAuthCallbackQuery, RecoverRequest, RegisterRequest,
        RegisterResponse, SaveCardRequest, UpdateCustomerRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthCustomer,
    models::{Customer, SavedCard},
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/recover", post(recover))
        .route("/google", get(google_callback))
        .route("/customer", get(get_customer).put(update_customer))
        .route("/cards", post(save_card))
        .route("/cards/{card_id}", delete(delete_card))
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Register customer", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Validation or backend rejection"),
    ),
    tag = "Auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<Json<ApiResponse<RegisterResponse>>> {
    let resp =
        auth_service::register_customer(&state.commerce, payload, &state.shutdown).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login customer", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_customer(&state.commerce, payload, &state.shutdown).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/recover",
    request_body = RecoverRequest,
    responses(
        (status = 200, description = "Recovery email requested", body = ApiResponse<serde_json::Value>),
    ),
    tag = "Auth"
)]
pub async fn recover(
    State(state): State<AppState>,
    Json(payload): Json<RecoverRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp =
        auth_service::recover_account(&state.commerce, &payload.email, &state.shutdown).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/google",
    params(
        ("code" = Option<String>, Query, description = "Authorization code from the provider")
    ),
    responses(
        (status = 200, description = "Federated login", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Exchange failed or account requires a password login"),
    ),
    tag = "Auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let code = query
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;
    let resp = auth_service::federated_login(
        &state.commerce,
        state.config.oauth.as_ref(),
        &code,
        &state.shutdown,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/customer",
    responses(
        (status = 200, description = "Customer profile", body = ApiResponse<Customer>),
        (status = 401, description = "Not signed in"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn get_customer(
    State(state): State<AppState>,
    customer: AuthCustomer,
) -> AppResult<Json<ApiResponse<Customer>>> {
    let resp =
        auth_service::get_profile(&state.commerce, &customer.access_token, &state.shutdown)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/auth/customer",
    request_body = UpdateCustomerRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Not signed in"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn update_customer(
    State(state): State<AppState>,
    customer: AuthCustomer,
    Json(payload): Json<UpdateCustomerRequest>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::update_profile(
        &state.commerce,
        &customer.access_token,
        payload,
        &state.shutdown,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/cards",
    request_body = SaveCardRequest,
    responses(
        (status = 200, description = "Card metadata saved", body = ApiResponse<Vec<SavedCard>>),
        (status = 401, description = "Not signed in"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn save_card(
    State(state): State<AppState>,
    customer: AuthCustomer,
    Json(payload): Json<SaveCardRequest>,
) -> AppResult<Json<ApiResponse<Vec<SavedCard>>>> {
    let resp = auth_service::save_card(
        &state.commerce,
        &customer.access_token,
        payload,
        &state.shutdown,
    )
    .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/auth/cards/{card_id}",
    params(
        ("card_id" = String, Path, description = "Saved card ID")
    ),
    responses(
        (status = 200, description = "Card metadata removed", body = ApiResponse<Vec<SavedCard>>),
        (status = 401, description = "Not signed in"),
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn delete_card(
    State(state): State<AppState>,
    customer: AuthCustomer,
    Path(card_id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<SavedCard>>>> {
    let resp = auth_service::delete_card(
        &state.commerce,
        &customer.access_token,
        &card_id,
        &state.shutdown,
    )
    .await?;
    Ok(Json(resp))
}

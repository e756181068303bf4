//! Customer authentication and profile operations. Credentials are
//! verified by the commerce backend; this layer wraps its customer access
//! token in a signed session JWT and implements the federated login flow.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Deserialize;
use sha2::Sha256;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use validator::Validate;

use crate::commerce::CommerceClient;
use crate::commerce::customer::{CustomerCreateInput, CustomerUpdateInput};
use crate::config::OAuthConfig;
use crate::dto::auth::{
    Claims, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, SaveCardRequest,
    UpdateCustomerRequest,
};
use crate::error::{AppError, AppResult};
use crate::models::{Customer, SavedCard};
use crate::response::{ApiResponse, Meta};

pub async fn register_customer(
    commerce: &CommerceClient,
    payload: RegisterRequest,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<RegisterResponse>> {
    payload.validate()?;

    let customer_id = commerce
        .create_customer(
            CustomerCreateInput {
                email: payload.email,
                password: payload.password,
                first_name: payload.first_name,
                last_name: payload.last_name,
                phone: payload.phone.filter(|phone| !phone.is_empty()),
                accepts_marketing: true,
            },
            cancel,
        )
        .await?;

    Ok(ApiResponse::success(
        "Account created",
        RegisterResponse { customer_id },
        None,
    ))
}

pub async fn login_customer(
    commerce: &CommerceClient,
    payload: LoginRequest,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<LoginResponse>> {
    let token = commerce
        .create_access_token(&payload.email, &payload.password, cancel)
        .await?;

    let session = issue_session_token(&token.access_token, token.expires_at, payload.remember_me)?;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {session}"),
        },
        Some(Meta::empty()),
    ))
}

pub async fn recover_account(
    commerce: &CommerceClient,
    email: &str,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if email.is_empty() {
        return Err(AppError::BadRequest("Email is required".to_string()));
    }
    commerce.recover_customer(email, cancel).await?;
    Ok(ApiResponse::success(
        "Recovery email sent",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_profile(
    commerce: &CommerceClient,
    access_token: &str,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<Customer>> {
    let customer = commerce.get_customer(access_token, cancel).await?;
    Ok(ApiResponse::success("OK", customer, None))
}

pub async fn update_profile(
    commerce: &CommerceClient,
    access_token: &str,
    payload: UpdateCustomerRequest,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<serde_json::Value>> {
    commerce
        .update_customer(
            access_token,
            CustomerUpdateInput {
                first_name: payload.first_name,
                last_name: payload.last_name,
                password: payload.password,
                saved_cards: None,
            },
            cancel,
        )
        .await?;
    Ok(ApiResponse::success(
        "Profile updated",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn save_card(
    commerce: &CommerceClient,
    access_token: &str,
    payload: SaveCardRequest,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<Vec<SavedCard>>> {
    let mut cards = commerce.get_customer(access_token, cancel).await?.saved_cards;
    cards.push(SavedCard {
        id: Uuid::new_v4().to_string(),
        card_number: format!("************{}", payload.last4),
        brand: payload.brand,
        expiry: payload.expiry,
    });

    commerce
        .update_customer(
            access_token,
            CustomerUpdateInput {
                saved_cards: Some(cards.clone()),
                ..CustomerUpdateInput::default()
            },
            cancel,
        )
        .await?;

    Ok(ApiResponse::success("Card saved", cards, None))
}

pub async fn delete_card(
    commerce: &CommerceClient,
    access_token: &str,
    card_id: &str,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<Vec<SavedCard>>> {
    let mut cards = commerce.get_customer(access_token, cancel).await?.saved_cards;
    cards.retain(|card| card.id != card_id);

    commerce
        .update_customer(
            access_token,
            CustomerUpdateInput {
                saved_cards: Some(cards.clone()),
                ..CustomerUpdateInput::default()
            },
            cancel,
        )
        .await?;

    Ok(ApiResponse::success("Card removed", cards, None))
}

/// Federated login: exchange the authorization code, look the user up, and
/// bind them to a commerce account via the bridge credential. An existing
/// account simply fails the create and proceeds to login.
pub async fn federated_login(
    commerce: &CommerceClient,
    oauth: Option<&OAuthConfig>,
    code: &str,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<LoginResponse>> {
    let oauth = oauth.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!("federated login is not configured"))
    })?;

    let profile = fetch_federated_profile(oauth, code).await?;
    let bridge_password = bridge_credential(&profile.email)?;

    if let Err(err) = commerce
        .create_customer(
            CustomerCreateInput {
                email: profile.email.clone(),
                password: bridge_password.clone(),
                first_name: profile.first_name,
                last_name: profile.last_name,
                phone: None,
                accepts_marketing: true,
            },
            cancel,
        )
        .await
    {
        tracing::debug!(error = %err, "federated customer create skipped, attempting login");
    }

    let token = commerce
        .create_access_token(&profile.email, &bridge_password, cancel)
        .await
        .map_err(|_| {
            AppError::Unauthorized(
                "This email already has a password account. Please sign in manually.".to_string(),
            )
        })?;

    let session = issue_session_token(&token.access_token, token.expires_at, true)?;
    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {session}"),
        },
        None,
    ))
}

fn issue_session_token(
    access_token: &str,
    token_expires_at: DateTime<Utc>,
    remember_me: bool,
) -> AppResult<String> {
    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    // the session can never outlive the commerce token it wraps
    let horizon = if remember_me {
        Duration::days(30)
    } else {
        Duration::hours(24)
    };
    let expiration = token_expires_at.min(Utc::now() + horizon);

    let claims = Claims {
        sub: access_token.to_string(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

struct FederatedProfile {
    email: String,
    first_name: String,
    last_name: String,
}

async fn fetch_federated_profile(
    oauth: &OAuthConfig,
    code: &str,
) -> AppResult<FederatedProfile> {
    #[derive(Deserialize)]
    struct TokenResponse {
        access_token: String,
    }

    #[derive(Deserialize)]
    struct UserInfo {
        email: String,
        given_name: Option<String>,
        family_name: Option<String>,
    }

    let client = reqwest::Client::new();

    let token_response = client
        .post(&oauth.token_url)
        .form(&[
            ("code", code),
            ("client_id", oauth.client_id.as_str()),
            ("client_secret", oauth.client_secret.as_str()),
            ("redirect_uri", oauth.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .map_err(|_| AppError::RemoteUnavailable)?;

    if !token_response.status().is_success() {
        return Err(AppError::Unauthorized(
            "Failed to exchange authorization code".to_string(),
        ));
    }
    let tokens: TokenResponse = token_response
        .json()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let userinfo_response = client
        .get(&oauth.userinfo_url)
        .bearer_auth(&tokens.access_token)
        .send()
        .await
        .map_err(|_| AppError::RemoteUnavailable)?;

    if !userinfo_response.status().is_success() {
        return Err(AppError::Unauthorized(
            "Failed to fetch the user profile".to_string(),
        ));
    }
    let info: UserInfo = userinfo_response
        .json()
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    Ok(FederatedProfile {
        email: info.email,
        first_name: info.given_name.unwrap_or_else(|| "Google".to_string()),
        last_name: info.family_name.unwrap_or_else(|| "User".to_string()),
    })
}

/// Deterministic credential binding a federated identity to the commerce
/// backend's password-based accounts. Keyed by a dedicated secret; see
/// DESIGN.md for the trade-off.
fn bridge_credential(email: &str) -> AppResult<String> {
    let secret = std::env::var("IDENTITY_BRIDGE_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("IDENTITY_BRIDGE_SECRET is not set")))?;

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;
    mac.update(email.as_bytes());

    let digest = mac.finalize().into_bytes();
    Ok(digest.iter().map(|byte| format!("{byte:02x}")).collect())
}

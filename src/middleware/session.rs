use axum::extract::FromRequestParts;

use crate::error::AppError;

/// Header carrying the client-chosen cart session key, the unit of cart
/// persistence (the client keeps it the way a browser keeps local storage).
pub const SESSION_HEADER: &str = "x-cart-session";

#[derive(Debug, Clone)]
pub struct CartSessionId(pub String);

impl<S> FromRequestParts<S> for CartSessionId
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("Missing {SESSION_HEADER} header")))?;

        Ok(CartSessionId(value.to_string()))
    }
}

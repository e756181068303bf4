use crate::dto::newsletter::SubscribeRequest;
use crate::error::AppResult;
use crate::marketing::{MarketingClient, NewsletterDetails, Review};
use crate::response::{ApiResponse, Meta};

pub async fn subscribe(
    marketing: &MarketingClient,
    payload: SubscribeRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    marketing
        .subscribe(
            &payload.email,
            payload.first_name.as_deref(),
            payload.last_name.as_deref(),
        )
        .await?;
    Ok(ApiResponse::success(
        "Subscribed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn newsletter_details(
    marketing: &MarketingClient,
) -> AppResult<ApiResponse<NewsletterDetails>> {
    let details = marketing.newsletter_details().await?;
    Ok(ApiResponse::success("OK", details, None))
}

pub async fn product_reviews(
    marketing: &MarketingClient,
    product_id: &str,
) -> AppResult<ApiResponse<Vec<Review>>> {
    let reviews = marketing.product_reviews(product_id).await?;
    let total = reviews.len() as i64;
    Ok(ApiResponse::success("OK", reviews, Some(Meta::total(total))))
}

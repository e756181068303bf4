//! Client for the marketing/email platform: newsletter subscriptions, list
//! metadata and product reviews.

use serde::Serialize;
use serde_json::{Value, json};
use url::Url;
use utoipa::ToSchema;

use crate::config::MarketingConfig;
use crate::error::{AppError, AppResult};

const API_REVISION: &str = "2024-10-15";

#[derive(Debug)]
pub struct MarketingClient {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
    newsletter_list_id: Option<String>,
    welcome_coupon: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NewsletterDetails {
    pub name: String,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Review {
    pub rating: Option<f64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub reviewer_name: String,
    pub created_at: Option<String>,
}

impl MarketingClient {
    pub fn new(config: &MarketingConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::new(),
            base: Url::parse(&config.api_base)?,
            api_key: config.api_key.clone(),
            newsletter_list_id: config.newsletter_list_id.clone(),
            welcome_coupon: config.welcome_coupon.clone(),
        })
    }

    fn credentials(&self) -> AppResult<(&str, &str)> {
        match (self.api_key.as_deref(), self.newsletter_list_id.as_deref()) {
            (Some(key), Some(list)) => Ok((key, list)),
            _ => Err(AppError::Internal(anyhow::anyhow!(
                "marketing credentials are not configured"
            ))),
        }
    }

    pub async fn subscribe(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> AppResult<()> {
        let (key, list_id) = self.credentials()?;

        let payload = json!({
            "data": {
                "type": "profile-subscription-bulk-create-job",
                "attributes": {
                    "profiles": {
                        "data": [{
                            "type": "profile",
                            "attributes": {
                                "email": email,
                                "first_name": first_name,
                                "last_name": last_name,
                                "subscriptions": {
                                    "email": { "marketing": { "consent": "SUBSCRIBED" } }
                                }
                            }
                        }]
                    }
                },
                "relationships": {
                    "list": { "data": { "type": "list", "id": list_id } }
                }
            }
        });

        let url = self
            .base
            .join("/api/profile-subscription-bulk-create-jobs/")
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Klaviyo-API-Key {key}"))
            .header("Accept", "application/json")
            .header("Revision", API_REVISION)
            .json(&payload)
            .send()
            .await
            .map_err(|_| AppError::RemoteUnavailable)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, body, "newsletter subscription rejected");
        if status.is_client_error() {
            Err(AppError::BadRequest(
                "Newsletter subscription was rejected".to_string(),
            ))
        } else {
            Err(AppError::RemoteUnavailable)
        }
    }

    pub async fn newsletter_details(&self) -> AppResult<NewsletterDetails> {
        let (key, list_id) = self.credentials()?;

        let url = self
            .base
            .join(&format!("/api/lists/{list_id}/"))
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Klaviyo-API-Key {key}"))
            .header("Accept", "application/json")
            .header("Revision", API_REVISION)
            .send()
            .await
            .map_err(|_| AppError::RemoteUnavailable)?;

        if !response.status().is_success() {
            return Err(AppError::RemoteUnavailable);
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let name = body
            .pointer("/data/attributes/name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(NewsletterDetails {
            name,
            coupon_code: self.welcome_coupon.clone(),
        })
    }

    /// Reviews are keyed by a platform-specific compound item id; accounts
    /// differ on the prefix, so a miss on the long form retries the short
    /// form before giving up.
    pub async fn product_reviews(&self, product_id: &str) -> AppResult<Vec<Review>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("marketing credentials are not configured")))?;

        let primary = format!("$custom:::$default:::{product_id}");
        let reviews = self.fetch_reviews(key, &primary).await?;
        if !reviews.is_empty() {
            return Ok(reviews);
        }

        let fallback = format!("$default:::{product_id}");
        self.fetch_reviews(key, &fallback).await
    }

    async fn fetch_reviews(&self, key: &str, item_id: &str) -> AppResult<Vec<Review>> {
        let filter = format!("equals(item.id,'{item_id}')");
        let mut url = self
            .base
            .join("/api/reviews/")
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        url.query_pairs_mut().append_pair("filter", &filter);

        let response = self
            .http
            .get(url)
            .header("Authorization", format!("Klaviyo-API-Key {key}"))
            .header("Accept", "application/json")
            .header("Revision", API_REVISION)
            .send()
            .await
            .map_err(|_| AppError::RemoteUnavailable)?;

        if !response.status().is_success() {
            return Ok(Vec::new());
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(items
            .iter()
            .map(|item| {
                let attributes = item.get("attributes").cloned().unwrap_or(Value::Null);
                Review {
                    rating: attributes.get("rating").and_then(Value::as_f64),
                    title: attributes
                        .get("title")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    content: attributes
                        .get("content")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                    reviewer_name: attributes
                        .get("author")
                        .and_then(Value::as_str)
                        .unwrap_or("Verified Buyer")
                        .to_string(),
                    created_at: attributes
                        .get("created")
                        .or_else(|| attributes.get("created_at"))
                        .and_then(Value::as_str)
                        .map(str::to_string),
                }
            })
            .collect())
    }
}

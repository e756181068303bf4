use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProductSearchQuery {
    /// Free-text title search; omit to list the catalog.
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewsQuery {
    pub product_id: String,
}

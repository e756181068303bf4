use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::models::ShippingMethod;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub variant_id: String,
    pub title: String,
    #[serde(default)]
    pub variant_label: String,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    #[serde(default)]
    pub image_url: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ApplyCouponRequest {
    pub code: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SetShippingRequest {
    pub method: ShippingMethod,
}

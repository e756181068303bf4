use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::ShippingMethod;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    /// Instant-buy path: create a throwaway cart for this variant.
    pub variant_id: Option<String>,
    pub quantity: Option<u32>,
    pub customer_details: Option<CustomerDetails>,
    pub shipping_method: Option<ShippingMethod>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerDetails {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub street_address: String,
    pub apartment: Option<String>,
    pub town_city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub url: String,
}

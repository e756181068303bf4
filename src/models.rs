use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One line as the shopper sees it. `variant_id` is the stable merge key;
/// `server_line_id` exists only once the remote cart has acknowledged the
/// line and is never invented locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub variant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_line_id: Option<String>,
    pub title: String,
    pub variant_label: String,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    pub quantity: u32,
    pub image_url: String,
}

impl CartItem {
    pub fn from_line(line: &CartLine) -> Self {
        Self {
            variant_id: line.merchandise_id.clone(),
            server_line_id: Some(line.id.clone()),
            title: line.title.clone(),
            variant_label: line.variant_title.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            image_url: line.image_url.clone(),
        }
    }
}

/// Item data supplied by the caller on first add-to-cart, before any
/// quantity or server identity exists.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewCartItem {
    pub variant_id: String,
    pub title: String,
    pub variant_label: String,
    #[schema(value_type = String)]
    pub unit_price: Decimal,
    pub image_url: String,
}

impl NewCartItem {
    pub fn into_item(self, quantity: u32) -> CartItem {
        CartItem {
            variant_id: self.variant_id,
            server_line_id: None,
            title: self.title,
            variant_label: self.variant_label,
            unit_price: self.unit_price,
            quantity,
            image_url: self.image_url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

/// Authoritative response from the remote cart gateway. Local state is
/// replaced from it, never merged field by field.
#[derive(Debug, Clone)]
pub struct CartSnapshot {
    pub id: String,
    pub checkout_url: String,
    pub lines: Vec<CartLine>,
    /// Post-discount subtotal reported by the backend.
    pub subtotal_amount: Decimal,
    pub total_tax_amount: Option<Decimal>,
    pub total_amount: Decimal,
    pub discount_codes: Vec<DiscountCode>,
}

#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: String,
    pub quantity: u32,
    pub merchandise_id: String,
    pub unit_price: Decimal,
    pub title: String,
    pub variant_title: String,
    pub image_url: String,
}

#[derive(Debug, Clone)]
pub struct DiscountCode {
    pub code: String,
    pub applicable: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductSummary {
    /// First variant id when present, else the product id; what add-to-cart
    /// submits as the merchandise identifier.
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub handle: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub image_url: String,
    pub category: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDetail {
    pub id: String,
    pub product_id: String,
    pub title: String,
    pub handle: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub image_url: String,
    pub category: String,
    pub description_html: String,
    pub variants: Vec<ProductVariant>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductVariant {
    pub id: String,
    pub title: String,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub quantity_available: Option<i64>,
    pub image_url: Option<String>,
    pub selected_options: Vec<SelectedOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub addresses: Vec<Address>,
    pub orders: Vec<OrderSummary>,
    pub saved_cards: Vec<SavedCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub country: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderSummary {
    pub order_number: i64,
    pub processed_at: DateTime<Utc>,
    pub fulfillment_status: Option<String>,
    #[schema(value_type = String)]
    pub total: Decimal,
}

/// Payment-method metadata held in a customer metafield. Only display data
/// ever reaches this system; the masked number is stored as rendered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SavedCard {
    pub id: String,
    pub card_number: String,
    pub brand: String,
    pub expiry: String,
}

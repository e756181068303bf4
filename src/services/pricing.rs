//! Pure pricing derivation over the current item collection. Recomputed on
//! every read; nothing here is stored or mutated.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::config::ShippingConfig;
use crate::models::{CartItem, ShippingMethod};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PriceSummary {
    #[schema(value_type = String)]
    pub subtotal: Decimal,
    #[schema(value_type = String)]
    pub discount_amount: Decimal,
    #[schema(value_type = String)]
    pub shipping_cost: Decimal,
    #[schema(value_type = String)]
    pub final_total: Decimal,
}

/// Derive subtotal, discount, shipping and total.
///
/// The subtotal is the "true" pre-discount sum over local items. The
/// discount is inferred from the gap between that and the authoritative
/// post-discount subtotal, when one has been observed; gaps under one cent
/// are rounding noise and count as no discount. The final total is
/// deliberately not floored at zero: a discount exceeding subtotal plus
/// shipping is a data-integrity signal worth surfacing.
pub fn summarize(
    items: &[CartItem],
    method: ShippingMethod,
    remote_subtotal: Option<Decimal>,
    shipping: &ShippingConfig,
) -> PriceSummary {
    let subtotal: Decimal = items
        .iter()
        .map(|item| item.unit_price * Decimal::from(item.quantity))
        .sum();

    let discount_amount = remote_subtotal
        .map(|remote| subtotal - remote)
        .filter(|discount| *discount >= Decimal::new(1, 2))
        .unwrap_or(Decimal::ZERO);

    let shipping_cost = if items.is_empty() {
        Decimal::ZERO
    } else {
        match method {
            ShippingMethod::Standard if subtotal >= shipping.free_shipping_threshold => {
                Decimal::ZERO
            }
            ShippingMethod::Standard => shipping.standard_cost,
            // express is never eligible for the free-shipping waiver
            ShippingMethod::Express => shipping.express_cost,
        }
    };

    PriceSummary {
        subtotal,
        discount_amount,
        shipping_cost,
        final_total: subtotal + shipping_cost - discount_amount,
    }
}

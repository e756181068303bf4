use rust_decimal::Decimal;

use storefront_api::config::ShippingConfig;
use storefront_api::models::{CartItem, ShippingMethod};
use storefront_api::services::pricing;

fn shipping_config() -> ShippingConfig {
    ShippingConfig {
        free_shipping_threshold: Decimal::new(99, 0),
        standard_cost: Decimal::new(9, 0),
        express_cost: Decimal::new(1495, 2),
    }
}

fn item(unit_price: Decimal, quantity: u32) -> CartItem {
    CartItem {
        variant_id: "V1".to_string(),
        server_line_id: None,
        title: "Product".to_string(),
        variant_label: "Default".to_string(),
        unit_price,
        quantity,
        image_url: String::new(),
    }
}

#[test]
fn discount_is_the_gap_between_local_and_remote_subtotals() {
    let items = vec![item(Decimal::new(10000, 2), 1)];
    let summary = pricing::summarize(
        &items,
        ShippingMethod::Express,
        Some(Decimal::new(8000, 2)),
        &shipping_config(),
    );
    assert_eq!(summary.subtotal, Decimal::new(10000, 2));
    assert_eq!(summary.discount_amount, Decimal::new(2000, 2));
}

#[test]
fn equal_remote_subtotal_means_no_discount() {
    let items = vec![item(Decimal::new(10000, 2), 1)];
    let summary = pricing::summarize(
        &items,
        ShippingMethod::Express,
        Some(Decimal::new(10000, 2)),
        &shipping_config(),
    );
    assert_eq!(summary.discount_amount, Decimal::ZERO);
}

#[test]
fn sub_cent_gap_counts_as_no_discount() {
    let items = vec![item(Decimal::new(10000, 2), 1)];
    let summary = pricing::summarize(
        &items,
        ShippingMethod::Standard,
        Some(Decimal::new(999999, 4)),
        &shipping_config(),
    );
    assert_eq!(summary.discount_amount, Decimal::ZERO);
}

#[test]
fn no_remote_snapshot_means_no_discount() {
    let items = vec![item(Decimal::new(10000, 2), 1)];
    let summary = pricing::summarize(&items, ShippingMethod::Standard, None, &shipping_config());
    assert_eq!(summary.discount_amount, Decimal::ZERO);
}

#[test]
fn negative_gap_is_clamped_to_zero() {
    // the backend reporting more than the local sum is not a discount
    let items = vec![item(Decimal::new(5000, 2), 1)];
    let summary = pricing::summarize(
        &items,
        ShippingMethod::Standard,
        Some(Decimal::new(6000, 2)),
        &shipping_config(),
    );
    assert_eq!(summary.discount_amount, Decimal::ZERO);
}

#[test]
fn standard_shipping_is_free_at_the_threshold() {
    let items = vec![item(Decimal::new(9900, 2), 1)];
    let summary = pricing::summarize(&items, ShippingMethod::Standard, None, &shipping_config());
    assert_eq!(summary.shipping_cost, Decimal::ZERO);
}

#[test]
fn standard_shipping_charges_below_the_threshold() {
    let items = vec![item(Decimal::new(9899, 2), 1)];
    let summary = pricing::summarize(&items, ShippingMethod::Standard, None, &shipping_config());
    assert_eq!(summary.shipping_cost, Decimal::new(9, 0));
}

#[test]
fn express_shipping_is_never_waived() {
    let config = shipping_config();

    let below = vec![item(Decimal::new(9899, 2), 1)];
    let summary = pricing::summarize(&below, ShippingMethod::Express, None, &config);
    assert_eq!(summary.shipping_cost, Decimal::new(1495, 2));

    let above = vec![item(Decimal::new(9900, 2), 1)];
    let summary = pricing::summarize(&above, ShippingMethod::Express, None, &config);
    assert_eq!(summary.shipping_cost, Decimal::new(1495, 2));
}

#[test]
fn empty_cart_ships_for_nothing() {
    let summary = pricing::summarize(&[], ShippingMethod::Express, None, &shipping_config());
    assert_eq!(summary.shipping_cost, Decimal::ZERO);
    assert_eq!(summary.final_total, Decimal::ZERO);
}

#[test]
fn final_total_is_not_floored_at_zero() {
    // a pathological discount is surfaced, not hidden
    let items = vec![item(Decimal::new(500, 2), 1)];
    let summary = pricing::summarize(
        &items,
        ShippingMethod::Standard,
        Some(Decimal::new(-2000, 2)),
        &shipping_config(),
    );
    assert!(summary.final_total < Decimal::ZERO);
}

#[test]
fn subtotal_multiplies_quantity() {
    let items = vec![
        item(Decimal::new(2500, 2), 2),
        CartItem {
            variant_id: "V2".to_string(),
            ..item(Decimal::new(1050, 2), 3)
        },
    ];
    let summary = pricing::summarize(&items, ShippingMethod::Standard, None, &shipping_config());
    assert_eq!(summary.subtotal, Decimal::new(8150, 2));
}

//! Hand-off from cart to hosted checkout: instant buy, buyer identity, and
//! delivery option selection.

use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::commerce::CommerceClient;
use crate::commerce::cart::CartRemote;
use crate::commerce::checkout::DeliveryOption;
use crate::dto::checkout::{CheckoutRequest, CheckoutResponse, CustomerDetails};
use crate::error::{AppError, AppResult};
use crate::models::ShippingMethod;
use crate::response::ApiResponse;

pub async fn begin_checkout(
    commerce: &CommerceClient,
    cart_id: Option<String>,
    payload: CheckoutRequest,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<CheckoutResponse>> {
    // instant buy: no cart yet, a variant id is enough for a throwaway cart
    if cart_id.is_none() {
        let Some(variant_id) = payload.variant_id.as_deref() else {
            return Err(AppError::BadRequest(
                "cart or variant_id is required".to_string(),
            ));
        };
        let snapshot = commerce
            .create_cart(variant_id, payload.quantity.unwrap_or(1), cancel)
            .await?;
        return Ok(checkout_response(snapshot.checkout_url));
    }

    let cart_id = cart_id.unwrap_or_default();

    if let Some(details) = payload.customer_details {
        let identity = commerce
            .update_buyer_identity(&cart_id, buyer_identity(&details), cancel)
            .await?;

        if let (Some(method), Some(group)) = (payload.shipping_method, identity.delivery_group) {
            if let Some(handle) = pick_delivery_option(&group.delivery_options, method) {
                if let Some(url) = commerce
                    .select_delivery_option(&cart_id, &group.id, &handle, cancel)
                    .await?
                {
                    return Ok(checkout_response(url));
                }
            }
        }

        if let Some(url) = identity.checkout_url {
            return Ok(checkout_response(url));
        }
    }

    let url = commerce.fetch_checkout_url(&cart_id, cancel).await?;
    Ok(checkout_response(url))
}

fn checkout_response(url: String) -> ApiResponse<CheckoutResponse> {
    ApiResponse::success("Checkout ready", CheckoutResponse { url }, None)
}

/// Prefer an option whose title names the requested method; fall back to
/// the cheapest (standard) or priciest (express) offered rate.
fn pick_delivery_option(options: &[DeliveryOption], method: ShippingMethod) -> Option<String> {
    let keyword = match method {
        ShippingMethod::Standard => "standard",
        ShippingMethod::Express => "express",
    };

    if let Some(option) = options
        .iter()
        .find(|option| option.title.to_lowercase().contains(keyword))
    {
        return Some(option.handle.clone());
    }

    let mut sorted: Vec<&DeliveryOption> = options.iter().collect();
    sorted.sort_by_key(|option| option.estimated_cost.as_ref().map(|cost| cost.amount));
    let fallback = match method {
        ShippingMethod::Standard => sorted.first(),
        ShippingMethod::Express => sorted.last(),
    };
    fallback.map(|option| option.handle.clone())
}

fn buyer_identity(details: &CustomerDetails) -> Value {
    let country = country_code(&details.country);
    json!({
        "email": details.email,
        "countryCode": country,
        "deliveryAddressPreferences": [{
            "deliveryAddress": {
                "firstName": details.first_name,
                "lastName": details.last_name,
                "address1": details.street_address,
                "address2": details.apartment.clone().unwrap_or_default(),
                "city": details.town_city,
                "province": details.state,
                "country": country,
                "zip": details.pincode,
                "phone": details.phone,
            }
        }]
    })
}

fn country_code(country: &str) -> &'static str {
    match country {
        "Australia" => "AU",
        "United States" => "US",
        "United Kingdom" => "GB",
        "New Zealand" => "NZ",
        "Canada" => "CA",
        _ => "AU",
    }
}

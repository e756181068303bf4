//! Hand-off to the backend's hosted checkout: buyer identity updates,
//! delivery option selection and checkout URL resolution.

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};

use super::{CommerceClient, Edges, decode};

const BUYER_IDENTITY_UPDATE: &str = r#"
    mutation cartBuyerIdentityUpdate($cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!) {
      cartBuyerIdentityUpdate(cartId: $cartId, buyerIdentity: $buyerIdentity) {
        cart {
          checkoutUrl
          deliveryGroups(first: 1) {
            edges {
              node {
                id
                deliveryOptions {
                  handle
                  title
                  estimatedCost { amount currencyCode }
                }
              }
            }
          }
        }
        userErrors { field message }
      }
    }
"#;

const SELECT_DELIVERY_OPTION: &str = r#"
    mutation cartSelectedDeliveryOptionsUpdate($cartId: ID!, $selectedDeliveryOptions: [CartSelectedDeliveryOptionInput!]!) {
      cartSelectedDeliveryOptionsUpdate(cartId: $cartId, selectedDeliveryOptions: $selectedDeliveryOptions) {
        cart { checkoutUrl }
        userErrors { field message }
      }
    }
"#;

const CHECKOUT_URL_QUERY: &str = r#"
    query getCart($id: ID!) {
      cart(id: $id) { checkoutUrl }
    }
"#;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOption {
    pub handle: String,
    pub title: String,
    pub estimated_cost: Option<DeliveryCost>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryCost {
    pub amount: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryGroup {
    pub id: String,
    #[serde(default)]
    pub delivery_options: Vec<DeliveryOption>,
}

/// Result of a buyer identity update: the backend may or may not have
/// produced delivery options for the given address.
#[derive(Debug)]
pub struct IdentityUpdate {
    pub checkout_url: Option<String>,
    pub delivery_group: Option<DeliveryGroup>,
}

impl CommerceClient {
    pub async fn update_buyer_identity(
        &self,
        cart_id: &str,
        buyer_identity: Value,
        cancel: &CancellationToken,
    ) -> AppResult<IdentityUpdate> {
        let variables = json!({ "cartId": cart_id, "buyerIdentity": buyer_identity });
        let data = self.execute(BUYER_IDENTITY_UPDATE, variables, cancel).await?;
        let payload = data.get("cartBuyerIdentityUpdate").cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("missing cartBuyerIdentityUpdate payload"))
        })?;

        // identity errors are not fatal to checkout; the original proceeds
        // with whatever checkout URL the cart still carries
        if let Some(errors) = payload.get("userErrors").and_then(Value::as_array)
            && !errors.is_empty()
        {
            tracing::warn!(?errors, "buyer identity update reported errors");
        }

        let cart = payload.get("cart").cloned().unwrap_or(Value::Null);
        if cart.is_null() {
            return Err(AppError::CartNotFound);
        }

        let checkout_url = cart
            .get("checkoutUrl")
            .and_then(Value::as_str)
            .map(str::to_string);
        let delivery_group = cart
            .get("deliveryGroups")
            .cloned()
            .map(|groups| decode::<Edges<DeliveryGroup>>(groups, "deliveryGroups"))
            .transpose()?
            .and_then(|groups| groups.into_nodes().into_iter().next());

        Ok(IdentityUpdate {
            checkout_url,
            delivery_group,
        })
    }

    pub async fn select_delivery_option(
        &self,
        cart_id: &str,
        group_id: &str,
        option_handle: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Option<String>> {
        let variables = json!({
            "cartId": cart_id,
            "selectedDeliveryOptions": [{
                "deliveryGroupId": group_id,
                "deliveryOptionHandle": option_handle,
            }]
        });
        let data = self.execute(SELECT_DELIVERY_OPTION, variables, cancel).await?;
        Ok(data
            .get("cartSelectedDeliveryOptionsUpdate")
            .and_then(|payload| payload.get("cart"))
            .and_then(|cart| cart.get("checkoutUrl"))
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Resolve the hosted checkout URL for an existing cart. A cart the
    /// backend no longer knows is a stale session, not a server fault.
    pub async fn fetch_checkout_url(
        &self,
        cart_id: &str,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let data = self
            .execute(CHECKOUT_URL_QUERY, json!({ "id": cart_id }), cancel)
            .await?;
        data.get("cart")
            .filter(|cart| !cart.is_null())
            .and_then(|cart| cart.get("checkoutUrl"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(AppError::CartNotFound)
    }
}

//! The remote cart gateway: the five cart intents against the commerce
//! backend, each returning a normalized [`CartSnapshot`].

use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::models::{CartLine, CartSnapshot, DiscountCode};

use super::{CommerceClient, Edges, Money, decode};

/// Selection set shared by every cart query and mutation.
const CART_FIELDS: &str = r#"
    id
    checkoutUrl
    cost {
      subtotalAmount { amount currencyCode }
      totalTaxAmount { amount currencyCode }
      totalAmount { amount currencyCode }
    }
    lines(first: 100) {
      edges {
        node {
          id
          quantity
          merchandise {
            ... on ProductVariant {
              id
              title
              image { url }
              price { amount currencyCode }
              product { title }
            }
          }
        }
      }
    }
    discountCodes {
      code
      applicable
    }
"#;

/// The cart operations the synchronizer depends on. The seam exists so the
/// synchronizer can run against a scripted backend in tests.
pub trait CartRemote: Send + Sync {
    fn create_cart(
        &self,
        variant_id: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> impl Future<Output = AppResult<CartSnapshot>> + Send;

    fn fetch_cart(
        &self,
        cart_id: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = AppResult<CartSnapshot>> + Send;

    fn add_line(
        &self,
        cart_id: &str,
        variant_id: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> impl Future<Output = AppResult<CartSnapshot>> + Send;

    fn update_line_quantity(
        &self,
        cart_id: &str,
        line_id: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> impl Future<Output = AppResult<CartSnapshot>> + Send;

    fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: &[String],
        cancel: &CancellationToken,
    ) -> impl Future<Output = AppResult<CartSnapshot>> + Send;

    /// Sending an empty list clears all discount codes; there is no separate
    /// removal verb at this level. Callers must check the returned
    /// snapshot's `applicable` flags themselves.
    fn set_discount_codes(
        &self,
        cart_id: &str,
        codes: &[String],
        cancel: &CancellationToken,
    ) -> impl Future<Output = AppResult<CartSnapshot>> + Send;
}

impl CartRemote for CommerceClient {
    async fn create_cart(
        &self,
        variant_id: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let query = format!(
            "mutation cartCreate($input: CartInput!) {{
               cartCreate(input: $input) {{
                 cart {{ {CART_FIELDS} }}
                 userErrors {{ field message }}
               }}
             }}"
        );
        let variables = json!({
            "input": { "lines": [{ "merchandiseId": variant_id, "quantity": quantity }] }
        });
        let data = self.execute(&query, variables, cancel).await?;
        extract_cart(data, "cartCreate", AppError::InvalidVariant, AppError::InvalidVariant)
    }

    async fn fetch_cart(&self, cart_id: &str, cancel: &CancellationToken) -> AppResult<CartSnapshot> {
        let query = format!(
            "query getCart($cartId: ID!) {{
               cart(id: $cartId) {{ {CART_FIELDS} }}
             }}"
        );
        let data = self
            .execute(&query, json!({ "cartId": cart_id }), cancel)
            .await?;
        let cart = data.get("cart").cloned().unwrap_or(Value::Null);
        if cart.is_null() {
            return Err(AppError::CartNotFound);
        }
        let remote: RemoteCart = decode(cart, "cart")?;
        Ok(remote.into_snapshot())
    }

    async fn add_line(
        &self,
        cart_id: &str,
        variant_id: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let query = format!(
            "mutation cartLinesAdd($cartId: ID!, $lines: [CartLineInput!]!) {{
               cartLinesAdd(cartId: $cartId, lines: $lines) {{
                 cart {{ {CART_FIELDS} }}
                 userErrors {{ field message }}
               }}
             }}"
        );
        let variables = json!({
            "cartId": cart_id,
            "lines": [{ "merchandiseId": variant_id, "quantity": quantity }]
        });
        let data = self.execute(&query, variables, cancel).await?;
        extract_cart(data, "cartLinesAdd", AppError::InvalidVariant, AppError::CartNotFound)
    }

    async fn update_line_quantity(
        &self,
        cart_id: &str,
        line_id: &str,
        quantity: u32,
        cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let query = format!(
            "mutation cartLinesUpdate($cartId: ID!, $lines: [CartLineUpdateInput!]!) {{
               cartLinesUpdate(cartId: $cartId, lines: $lines) {{
                 cart {{ {CART_FIELDS} }}
                 userErrors {{ field message }}
               }}
             }}"
        );
        let variables = json!({
            "cartId": cart_id,
            "lines": [{ "id": line_id, "quantity": quantity }]
        });
        let data = self.execute(&query, variables, cancel).await?;
        extract_cart(data, "cartLinesUpdate", AppError::LineNotFound, AppError::CartNotFound)
    }

    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: &[String],
        cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let query = format!(
            "mutation cartLinesRemove($cartId: ID!, $lineIds: [ID!]!) {{
               cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {{
                 cart {{ {CART_FIELDS} }}
                 userErrors {{ field message }}
               }}
             }}"
        );
        let variables = json!({ "cartId": cart_id, "lineIds": line_ids });
        let data = self.execute(&query, variables, cancel).await?;
        extract_cart(data, "cartLinesRemove", AppError::LineNotFound, AppError::CartNotFound)
    }

    async fn set_discount_codes(
        &self,
        cart_id: &str,
        codes: &[String],
        cancel: &CancellationToken,
    ) -> AppResult<CartSnapshot> {
        let query = format!(
            "mutation cartDiscountCodesUpdate($cartId: ID!, $discountCodes: [String!]) {{
               cartDiscountCodesUpdate(cartId: $cartId, discountCodes: $discountCodes) {{
                 cart {{ {CART_FIELDS} }}
                 userErrors {{ field message }}
               }}
             }}"
        );
        let variables = json!({ "cartId": cart_id, "discountCodes": codes });
        let data = self.execute(&query, variables, cancel).await?;
        extract_cart(
            data,
            "cartDiscountCodesUpdate",
            AppError::BadRequest("Discount code rejected".to_string()),
            AppError::CartNotFound,
        )
    }
}

/// Unwrap a mutation payload: user errors map to `rejected`, a null cart
/// (the backend's way of saying the id no longer resolves) to `missing`.
fn extract_cart(
    data: Value,
    field: &str,
    rejected: AppError,
    missing: AppError,
) -> AppResult<CartSnapshot> {
    let payload = data
        .get(field)
        .cloned()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing {field} payload")))?;

    if let Some(first) = payload
        .get("userErrors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("rejected by commerce backend");
        tracing::warn!(field, message, "cart mutation rejected");
        return Err(rejected);
    }

    let cart = payload.get("cart").cloned().unwrap_or(Value::Null);
    if cart.is_null() {
        return Err(missing);
    }
    let remote: RemoteCart = decode(cart, field)?;
    Ok(remote.into_snapshot())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteCart {
    id: String,
    checkout_url: String,
    cost: RemoteCost,
    #[serde(default)]
    lines: Edges<RemoteLine>,
    #[serde(default)]
    discount_codes: Vec<RemoteDiscountCode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteCost {
    subtotal_amount: Money,
    total_tax_amount: Option<Money>,
    total_amount: Money,
}

#[derive(Debug, Deserialize)]
struct RemoteLine {
    id: String,
    quantity: u32,
    merchandise: RemoteVariant,
}

#[derive(Debug, Deserialize)]
struct RemoteVariant {
    id: String,
    title: String,
    price: Money,
    product: RemoteProduct,
    image: Option<RemoteImage>,
}

#[derive(Debug, Deserialize)]
struct RemoteProduct {
    title: String,
}

#[derive(Debug, Deserialize)]
struct RemoteImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RemoteDiscountCode {
    code: String,
    applicable: bool,
}

impl RemoteCart {
    fn into_snapshot(self) -> CartSnapshot {
        CartSnapshot {
            id: self.id,
            checkout_url: self.checkout_url,
            subtotal_amount: self.cost.subtotal_amount.amount,
            total_tax_amount: self.cost.total_tax_amount.map(|money| money.amount),
            total_amount: self.cost.total_amount.amount,
            lines: self
                .lines
                .into_nodes()
                .into_iter()
                .map(|line| CartLine {
                    id: line.id,
                    quantity: line.quantity,
                    merchandise_id: line.merchandise.id,
                    unit_price: line.merchandise.price.amount,
                    title: line.merchandise.product.title,
                    variant_title: if line.merchandise.title == "Default Title" {
                        "Default".to_string()
                    } else {
                        line.merchandise.title
                    },
                    image_url: line.merchandise.image.map(|image| image.url).unwrap_or_default(),
                })
                .collect(),
            discount_codes: self
                .discount_codes
                .into_iter()
                .map(|code| DiscountCode {
                    code: code.code,
                    applicable: code.applicable,
                })
                .collect(),
        }
    }
}

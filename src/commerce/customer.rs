//! Customer account operations: the commerce backend owns accounts and
//! verifies credentials; this module only relays them.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::models::{Address, Customer, OrderSummary, SavedCard};

use super::{CommerceClient, Edges, Money, decode};

/// Metafield slot holding saved payment-method metadata.
const CARDS_NAMESPACE: &str = "custom";
const CARDS_KEY: &str = "saved_card";

#[derive(Debug, Clone)]
pub struct CustomerCreateInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub accepts_marketing: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerUpdateInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub saved_cards: Option<Vec<SavedCard>>,
}

#[derive(Debug, Clone)]
pub struct CustomerAccessToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

const CUSTOMER_CREATE: &str = r#"
    mutation customerCreate($input: CustomerCreateInput!) {
      customerCreate(input: $input) {
        customer { id }
        customerUserErrors { message }
      }
    }
"#;

const ACCESS_TOKEN_CREATE: &str = r#"
    mutation customerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) {
      customerAccessTokenCreate(input: $input) {
        customerAccessToken { accessToken expiresAt }
        customerUserErrors { message }
      }
    }
"#;

const CUSTOMER_UPDATE: &str = r#"
    mutation customerUpdate($customerAccessToken: String!, $customer: CustomerUpdateInput!) {
      customerUpdate(customerAccessToken: $customerAccessToken, customer: $customer) {
        customer { id }
        customerUserErrors { message }
      }
    }
"#;

const CUSTOMER_RECOVER: &str = r#"
    mutation customerRecover($email: String!) {
      customerRecover(email: $email) {
        customerUserErrors { message }
      }
    }
"#;

const CUSTOMER_QUERY: &str = r#"
    query getCustomer($customerAccessToken: String!) {
      customer(customerAccessToken: $customerAccessToken) {
        firstName
        lastName
        email
        phone
        addresses(first: 10) {
          edges {
            node { firstName lastName address1 address2 city province country zip phone }
          }
        }
        orders(first: 10) {
          edges {
            node {
              orderNumber
              processedAt
              fulfillmentStatus
              totalPrice { amount currencyCode }
            }
          }
        }
        cards: metafield(namespace: "custom", key: "saved_card") {
          value
        }
      }
    }
"#;

impl CommerceClient {
    pub async fn create_customer(
        &self,
        input: CustomerCreateInput,
        cancel: &CancellationToken,
    ) -> AppResult<String> {
        let variables = json!({
            "input": {
                "email": input.email,
                "password": input.password,
                "firstName": input.first_name,
                "lastName": input.last_name,
                "phone": input.phone,
                "acceptsMarketing": input.accepts_marketing,
            }
        });
        let data = self.execute(CUSTOMER_CREATE, variables, cancel).await?;
        let payload = data
            .get("customerCreate")
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing customerCreate payload")))?;

        if let Some(message) = first_user_error(&payload) {
            return Err(AppError::BadRequest(message));
        }

        payload
            .get("customer")
            .and_then(|customer| customer.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::BadRequest(
                    "Customer creation succeeded but no data was returned".to_string(),
                )
            })
    }

    pub async fn create_access_token(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> AppResult<CustomerAccessToken> {
        let variables = json!({ "input": { "email": email, "password": password } });
        let data = self.execute(ACCESS_TOKEN_CREATE, variables, cancel).await?;
        let payload = data.get("customerAccessTokenCreate").cloned().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("missing customerAccessTokenCreate payload"))
        })?;

        if let Some(message) = first_user_error(&payload) {
            return Err(AppError::Unauthorized(message));
        }

        let token = payload
            .get("customerAccessToken")
            .cloned()
            .unwrap_or(Value::Null);
        if token.is_null() {
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
        let token: RemoteAccessToken = decode(token, "customerAccessToken")?;
        Ok(CustomerAccessToken {
            access_token: token.access_token,
            expires_at: token.expires_at,
        })
    }

    pub async fn update_customer(
        &self,
        access_token: &str,
        update: CustomerUpdateInput,
        cancel: &CancellationToken,
    ) -> AppResult<()> {
        let mut customer = serde_json::Map::new();
        if let Some(first_name) = update.first_name {
            customer.insert("firstName".to_string(), json!(first_name));
        }
        if let Some(last_name) = update.last_name {
            customer.insert("lastName".to_string(), json!(last_name));
        }
        if let Some(password) = update.password {
            customer.insert("password".to_string(), json!(password));
        }
        if let Some(cards) = update.saved_cards {
            let value = serde_json::to_string(&cards)
                .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
            customer.insert(
                "metafields".to_string(),
                json!([{
                    "namespace": CARDS_NAMESPACE,
                    "key": CARDS_KEY,
                    "value": value,
                    "type": "json",
                }]),
            );
        }

        let variables = json!({
            "customerAccessToken": access_token,
            "customer": Value::Object(customer),
        });
        let data = self.execute(CUSTOMER_UPDATE, variables, cancel).await?;
        let payload = data
            .get("customerUpdate")
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing customerUpdate payload")))?;

        if let Some(message) = first_user_error(&payload) {
            return Err(AppError::BadRequest(message));
        }
        Ok(())
    }

    pub async fn recover_customer(&self, email: &str, cancel: &CancellationToken) -> AppResult<()> {
        let data = self
            .execute(CUSTOMER_RECOVER, json!({ "email": email }), cancel)
            .await?;
        let payload = data
            .get("customerRecover")
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing customerRecover payload")))?;

        if let Some(message) = first_user_error(&payload) {
            return Err(AppError::BadRequest(message));
        }
        Ok(())
    }

    pub async fn get_customer(
        &self,
        access_token: &str,
        cancel: &CancellationToken,
    ) -> AppResult<Customer> {
        let data = self
            .execute(
                CUSTOMER_QUERY,
                json!({ "customerAccessToken": access_token }),
                cancel,
            )
            .await?;
        let customer = data.get("customer").cloned().unwrap_or(Value::Null);
        if customer.is_null() {
            return Err(AppError::Unauthorized("Session expired".to_string()));
        }
        let customer: RemoteCustomer = decode(customer, "customer")?;
        Ok(customer.into_customer())
    }
}

fn first_user_error(payload: &Value) -> Option<String> {
    payload
        .get("customerUserErrors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteAccessToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteCustomer {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    #[serde(default)]
    addresses: Edges<Address>,
    #[serde(default)]
    orders: Edges<RemoteOrder>,
    cards: Option<RemoteMetafield>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteOrder {
    order_number: i64,
    processed_at: DateTime<Utc>,
    fulfillment_status: Option<String>,
    total_price: Money,
}

#[derive(Debug, Deserialize)]
struct RemoteMetafield {
    value: String,
}

impl RemoteCustomer {
    fn into_customer(self) -> Customer {
        // a corrupt metafield falls back to no saved cards rather than a failure
        let saved_cards = self
            .cards
            .and_then(|metafield| serde_json::from_str::<Vec<SavedCard>>(&metafield.value).ok())
            .unwrap_or_default();

        Customer {
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            phone: self.phone,
            addresses: self.addresses.into_nodes(),
            orders: self
                .orders
                .into_nodes()
                .into_iter()
                .map(|order| OrderSummary {
                    order_number: order.order_number,
                    processed_at: order.processed_at,
                    fulfillment_status: order.fulfillment_status,
                    total: order.total_price.amount,
                })
                .collect(),
            saved_cards,
        }
    }
}

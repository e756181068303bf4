//! Read-only product lookups. The storefront only needs enough catalog
//! data to render listings and hand a variant id to the cart gateway.

use serde::Deserialize;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, AppResult};
use crate::models::{ProductDetail, ProductSummary, ProductVariant, SelectedOption};

use super::{CommerceClient, Edges, Money, decode};

/// Listing fetch size; filtering happens on the full result set.
const LISTING_PAGE: u32 = 240;

const PRODUCTS_QUERY: &str = r#"
    query getProducts($first: Int!, $query: String) {
      products(first: $first, query: $query) {
        edges {
          node {
            id
            title
            handle
            productType
            images(first: 1) { edges { node { url } } }
            variants(first: 1) { edges { node { id price { amount currencyCode } } } }
          }
        }
      }
    }
"#;

const PRODUCT_QUERY: &str = r#"
    query getProduct($handle: String!) {
      product(handle: $handle) {
        id
        title
        handle
        productType
        descriptionHtml
        images(first: 1) { edges { node { url } } }
        variants(first: 50) {
          edges {
            node {
              id
              title
              quantityAvailable
              image { url }
              price { amount currencyCode }
              selectedOptions { name value }
            }
          }
        }
      }
    }
"#;

impl CommerceClient {
    /// Free-text listing search. An empty query lists the whole catalog.
    pub async fn list_products(
        &self,
        search: Option<&str>,
        cancel: &CancellationToken,
    ) -> AppResult<Vec<ProductSummary>> {
        let query_filter = search.map(|term| format!("title:*{term}*"));
        let data = self
            .execute(
                PRODUCTS_QUERY,
                json!({ "first": LISTING_PAGE, "query": query_filter }),
                cancel,
            )
            .await?;

        let products = data
            .get("products")
            .cloned()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("missing products payload")))?;
        let products: Edges<RemoteListing> = decode(products, "products")?;

        Ok(products
            .into_nodes()
            .into_iter()
            .map(RemoteListing::into_summary)
            .collect())
    }

    pub async fn get_product(
        &self,
        handle: &str,
        cancel: &CancellationToken,
    ) -> AppResult<ProductDetail> {
        let data = self
            .execute(PRODUCT_QUERY, json!({ "handle": handle }), cancel)
            .await?;
        let product = data.get("product").cloned().unwrap_or(Value::Null);
        if product.is_null() {
            return Err(AppError::NotFound);
        }
        let product: RemoteProduct = decode(product, "product")?;
        Ok(product.into_detail())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteListing {
    id: String,
    title: String,
    handle: String,
    product_type: Option<String>,
    #[serde(default)]
    images: Edges<RemoteImage>,
    #[serde(default)]
    variants: Edges<RemoteListingVariant>,
}

#[derive(Debug, Deserialize)]
struct RemoteImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RemoteListingVariant {
    id: String,
    price: Money,
}

impl RemoteListing {
    fn into_summary(self) -> ProductSummary {
        let image_url = self
            .images
            .into_nodes()
            .into_iter()
            .next()
            .map(|image| image.url)
            .unwrap_or_default();
        let variant = self.variants.into_nodes().into_iter().next();
        ProductSummary {
            id: variant
                .as_ref()
                .map(|v| v.id.clone())
                .unwrap_or_else(|| self.id.clone()),
            product_id: self.id,
            title: self.title,
            handle: self.handle,
            price: variant.map(|v| v.price.amount).unwrap_or_default(),
            image_url,
            category: self.product_type.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteProduct {
    id: String,
    title: String,
    handle: String,
    product_type: Option<String>,
    description_html: Option<String>,
    #[serde(default)]
    images: Edges<RemoteImage>,
    #[serde(default)]
    variants: Edges<RemoteDetailVariant>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteDetailVariant {
    id: String,
    title: String,
    quantity_available: Option<i64>,
    image: Option<RemoteImage>,
    price: Money,
    #[serde(default)]
    selected_options: Vec<RemoteSelectedOption>,
}

#[derive(Debug, Deserialize)]
struct RemoteSelectedOption {
    name: String,
    value: String,
}

impl RemoteProduct {
    fn into_detail(self) -> ProductDetail {
        let image_url = self
            .images
            .into_nodes()
            .into_iter()
            .next()
            .map(|image| image.url)
            .unwrap_or_default();
        let variants: Vec<ProductVariant> = self
            .variants
            .into_nodes()
            .into_iter()
            .map(|variant| ProductVariant {
                id: variant.id,
                title: variant.title,
                price: variant.price.amount,
                quantity_available: variant.quantity_available,
                image_url: variant.image.map(|image| image.url),
                selected_options: variant
                    .selected_options
                    .into_iter()
                    .map(|option| SelectedOption {
                        name: option.name,
                        value: option.value,
                    })
                    .collect(),
            })
            .collect();

        let first = variants.first();
        ProductDetail {
            id: first.map(|v| v.id.clone()).unwrap_or_else(|| self.id.clone()),
            product_id: self.id,
            title: self.title,
            handle: self.handle,
            price: first.map(|v| v.price).unwrap_or_default(),
            image_url,
            category: self.product_type.unwrap_or_default(),
            description_html: self.description_html.unwrap_or_default(),
            variants,
        }
    }
}

use tokio_util::sync::CancellationToken;

use crate::commerce::CommerceClient;
use crate::error::AppResult;
use crate::models::{ProductDetail, ProductSummary};
use crate::response::{ApiResponse, Meta};

pub async fn list_products(
    commerce: &CommerceClient,
    search: Option<&str>,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<Vec<ProductSummary>>> {
    let products = commerce.list_products(search, cancel).await?;
    let total = products.len() as i64;
    Ok(ApiResponse::success("OK", products, Some(Meta::total(total))))
}

pub async fn get_product(
    commerce: &CommerceClient,
    handle: &str,
    cancel: &CancellationToken,
) -> AppResult<ApiResponse<ProductDetail>> {
    let product = commerce.get_product(handle, cancel).await?;
    Ok(ApiResponse::success("OK", product, None))
}

use snafu::ResultExt;
use tracing::info;
use urlencoding::encode;

use crate::Result;
use crate::error::{HttpClientSnafu, HttpResponseParseSnafu};
use dto::product::ProductDto;

use super::{ApiClient, Envelope};

pub async fn list_products(client: &ApiClient) -> Result<Vec<ProductDto>> {
    let response = client
        .get("/api/admin/products")
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to list products. Try again later.".to_string(),
        })?;

    let response = client.check(response, "products").await?;

    let products = response
        .json::<Envelope<Vec<ProductDto>>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse products.".to_string(),
        })?;

    Ok(products.into_inner())
}

/// Submits the whole product, tag lists included
pub async fn update_product(client: &ApiClient, product: &ProductDto) -> Result<ProductDto> {
    let url = format!("/api/admin/products/{}", encode(&product.id));
    let response = client
        .put(&url)
        .json(product)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to update product. Try again later.",
        })?;

    let response = client.check(response, "product").await?;

    let product = response
        .json::<Envelope<ProductDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse product information.",
        })?;

    let product = product.into_inner();
    info!("Updated product {}", product.id);
    Ok(product)
}

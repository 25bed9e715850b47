use snafu::ResultExt;
use tracing::info;
use urlencoding::encode;

use crate::Result;
use crate::error::{HttpClientSnafu, HttpResponseParseSnafu};
use dto::order::{FulfillmentDto, OrderDto, OrderStatus, RejectOrderDto};

use super::{ApiClient, Envelope};

async fn fetch_orders(client: &ApiClient, path: &str, query: &[(&str, &str)]) -> Result<Vec<OrderDto>> {
    let response = client
        .get(path)
        .query(query)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to list orders. Try again later.".to_string(),
        })?;

    let response = client.check(response, "orders").await?;

    let orders = response
        .json::<Envelope<Vec<OrderDto>>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse orders.".to_string(),
        })?;

    Ok(orders.into_inner())
}

/// All orders, admin view
pub async fn list_orders(client: &ApiClient, search: Option<&str>) -> Result<Vec<OrderDto>> {
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(keyword) = search {
        query.push(("search", keyword));
    }
    fetch_orders(client, "/api/admin/orders", &query).await
}

pub async fn list_pending_orders(
    client: &ApiClient,
    search: Option<&str>,
) -> Result<Vec<OrderDto>> {
    let mut query: Vec<(&str, &str)> = vec![("status", OrderStatus::Pending.as_str())];
    if let Some(keyword) = search {
        query.push(("search", keyword));
    }
    let mut orders = fetch_orders(client, "/api/admin/orders", &query).await?;

    // Older backends ignore the status parameter
    orders.retain(|o| o.status == OrderStatus::Pending);
    Ok(orders)
}

/// Orders of the signed in organization
pub async fn list_org_orders(client: &ApiClient, search: Option<&str>) -> Result<Vec<OrderDto>> {
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(keyword) = search {
        query.push(("search", keyword));
    }
    fetch_orders(client, "/api/org/orders", &query).await
}

pub async fn get_order(client: &ApiClient, order_id: &str) -> Result<OrderDto> {
    let url = format!("/api/admin/orders/{}", encode(order_id));
    let response = client.get(&url).send().await.context(HttpClientSnafu {
        msg: "Unable to get order. Try again later.",
    })?;

    let response = client.check(response, "order").await?;

    let order = response
        .json::<Envelope<OrderDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse order.",
        })?;

    Ok(order.into_inner())
}

pub async fn approve_order(
    client: &ApiClient,
    order_id: &str,
    data: &FulfillmentDto,
) -> Result<OrderDto> {
    let url = format!("/api/admin/orders/{}/approve", encode(order_id));
    let response = client
        .put(&url)
        .json(data)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to approve order. Try again later.",
        })?;

    let response = client.check(response, "order").await?;

    let order = response
        .json::<Envelope<OrderDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse order information.",
        })?;

    info!("Approved order {}", order_id);
    Ok(order.into_inner())
}

pub async fn reject_order(
    client: &ApiClient,
    order_id: &str,
    data: &RejectOrderDto,
) -> Result<OrderDto> {
    let url = format!("/api/admin/orders/{}/reject", encode(order_id));
    let response = client
        .put(&url)
        .json(data)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to reject order. Try again later.",
        })?;

    let response = client.check(response, "order").await?;

    let order = response
        .json::<Envelope<OrderDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse order information.",
        })?;

    info!("Rejected order {}", order_id);
    Ok(order.into_inner())
}

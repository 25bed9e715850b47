use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Snafu)]
#[snafu(display("Invalid order status: {status}"))]
pub struct InvalidOrderStatusError {
    status: String,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = InvalidOrderStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            // The backend has used both spellings
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            _ => InvalidOrderStatusSnafu { status: value }.fail(),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = InvalidOrderStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OrderStatus::try_from(value.as_str())
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDto {
    pub product_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub org_id: String,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub product_type: Option<String>,
    #[serde(default)]
    pub batch_size: Option<String>,
    #[serde(default)]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    pub status: OrderStatus,
    #[serde(default, alias = "orderDate", alias = "createdAt")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<LineItemDto>,

    // Set once an admin approves the order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulfillment: Option<FulfillmentDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

/// Fulfillment details supplied by the operator on approval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentDto {
    pub batch_sizes: Vec<u32>,
    pub mrp: f64,
    pub size_code: String,
    pub expected_delivery_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectOrderDto {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_spellings() {
        assert_eq!(OrderStatus::try_from("CANCELED").unwrap(), OrderStatus::Cancelled);
        assert_eq!(OrderStatus::try_from("Shipped").unwrap(), OrderStatus::Shipped);

        let status = OrderStatus::try_from("lost");
        assert!(status.is_err());
        if let Err(e) = status {
            assert_eq!(e.to_string(), "Invalid order status: lost");
        }
    }

    #[test]
    fn test_deserialize_order() {
        let order: OrderDto = serde_json::from_value(json!({
            "_id": "ord-7",
            "orgId": "org-1",
            "productName": "Paracetamol 500",
            "amount": 1250.5,
            "status": "Pending",
            "orderDate": "2026-03-01T10:00:00Z",
            "items": [{ "productName": "Paracetamol 500", "quantity": 20 }],
        }))
        .unwrap();

        assert_eq!(order.id, "ord-7");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items.len(), 1);
        assert!(order.submitted_at.is_some());
        assert!(order.fulfillment.is_none());
    }

    #[test]
    fn test_serialize_status_lowercase() {
        let value = serde_json::to_value(OrderStatus::Delivered).unwrap();
        assert_eq!(value, json!("delivered"));
    }
}

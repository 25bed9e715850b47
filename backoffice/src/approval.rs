//! Review of a pending order: approve it with fulfillment details or reject
//! it with a reason. Both outcomes are final.

use chrono::NaiveDate;
use snafu::ensure;
use std::sync::{Mutex, MutexGuard};
use validator::{Validate, ValidationError};

use crate::Result;
use crate::error::InvalidTransitionSnafu;
use crate::flight::SingleFlight;
use crate::services::ApiClient;
use crate::services::orders::{approve_order, get_order, reject_order};
use dto::order::{FulfillmentDto, OrderDto, OrderStatus, RejectOrderDto};

fn valid_mrp(value: &str) -> core::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => Ok(()),
        _ => Err(ValidationError::new("mrp").with_message("MRP must be a positive number.".into())),
    }
}

fn valid_batch_sizes(value: &str) -> core::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match parse_batch_sizes(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("batch_sizes")
            .with_message("Batch sizes must be positive whole numbers separated by commas.".into())),
    }
}

fn valid_delivery_date(value: &str) -> core::result::Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("date")
            .with_message("Expected delivery date must be YYYY-MM-DD.".into())),
    }
}

fn parse_batch_sizes(value: &str) -> Option<Vec<u32>> {
    let mut sizes = Vec::new();
    for part in value.split(',') {
        match part.trim().parse::<u32>() {
            Ok(n) if n > 0 => sizes.push(n),
            _ => return None,
        }
    }
    Some(sizes)
}

/// Approval form as typed by the operator
#[derive(Debug, Clone, Default, Validate)]
pub struct ApprovalForm {
    #[validate(
        length(min = 1, message = "Batch sizes are required."),
        custom(function = "valid_batch_sizes")
    )]
    pub batch_sizes: String,

    #[validate(
        length(min = 1, message = "MRP is required."),
        custom(function = "valid_mrp")
    )]
    pub mrp: String,

    #[validate(length(min = 1, max = 20, message = "Size code is required."))]
    pub size_code: String,

    #[validate(
        length(min = 1, message = "Expected delivery date is required."),
        custom(function = "valid_delivery_date")
    )]
    pub expected_delivery_date: String,
}

impl ApprovalForm {
    fn trimmed(&self) -> Self {
        Self {
            batch_sizes: self.batch_sizes.trim().to_string(),
            mrp: self.mrp.trim().to_string(),
            size_code: self.size_code.trim().to_string(),
            expected_delivery_date: self.expected_delivery_date.trim().to_string(),
        }
    }

    /// Validates every field and builds the payload sent to the backend
    pub fn to_fulfillment(&self) -> Result<FulfillmentDto> {
        let form = self.trimmed();
        form.validate()?;

        // Validated above, parsing cannot fail
        let batch_sizes = parse_batch_sizes(&form.batch_sizes).unwrap_or_default();
        let mrp = form.mrp.parse::<f64>().unwrap_or_default();
        let expected_delivery_date =
            NaiveDate::parse_from_str(&form.expected_delivery_date, "%Y-%m-%d")
                .unwrap_or_default();

        Ok(FulfillmentDto {
            batch_sizes,
            mrp,
            size_code: form.size_code,
            expected_delivery_date,
        })
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct RejectionForm {
    #[validate(length(min = 1, max = 500, message = "Rejection reason is required."))]
    pub reason: String,
}

impl RejectionForm {
    pub fn to_rejection(&self) -> Result<RejectOrderDto> {
        let form = RejectionForm {
            reason: self.reason.trim().to_string(),
        };
        form.validate()?;
        Ok(RejectOrderDto {
            reason: form.reason,
        })
    }
}

/// One order under review
pub struct PendingOrderReview {
    order: Mutex<OrderDto>,
    flight: SingleFlight,
}

impl PendingOrderReview {
    pub fn new(order: OrderDto) -> Self {
        Self {
            order: Mutex::new(order),
            flight: SingleFlight::new(),
        }
    }

    pub async fn load(client: &ApiClient, order_id: &str) -> Result<Self> {
        let order = get_order(client, order_id).await?;
        Ok(Self::new(order))
    }

    pub fn order(&self) -> OrderDto {
        self.lock().clone()
    }

    pub fn state(&self) -> OrderStatus {
        self.lock().status
    }

    pub fn is_submitting(&self) -> bool {
        self.flight.is_busy()
    }

    /// Pending to processing
    pub async fn approve(&self, client: &ApiClient, form: &ApprovalForm) -> Result<OrderDto> {
        let fulfillment = form.to_fulfillment()?;

        // Status is checked while holding the permit
        let updated = self
            .flight
            .run(async {
                let order_id = self.ensure_pending()?;
                approve_order(client, &order_id, &fulfillment).await
            })
            .await?;

        let mut order = self.lock();
        *order = updated;
        order.status = OrderStatus::Processing;
        if order.fulfillment.is_none() {
            order.fulfillment = Some(fulfillment);
        }
        Ok(order.clone())
    }

    /// Pending to cancelled
    pub async fn reject(&self, client: &ApiClient, form: &RejectionForm) -> Result<OrderDto> {
        let rejection = form.to_rejection()?;

        let updated = self
            .flight
            .run(async {
                let order_id = self.ensure_pending()?;
                reject_order(client, &order_id, &rejection).await
            })
            .await?;

        let mut order = self.lock();
        *order = updated;
        order.status = OrderStatus::Cancelled;
        if order.rejection_reason.is_none() {
            order.rejection_reason = Some(rejection.reason);
        }
        Ok(order.clone())
    }

    fn ensure_pending(&self) -> Result<String> {
        let order = self.lock();
        ensure!(
            order.status == OrderStatus::Pending,
            InvalidTransitionSnafu {
                order_id: order.id.clone(),
                status: order.status,
            }
        );
        Ok(order.id.clone())
    }

    fn lock(&self) -> MutexGuard<'_, OrderDto> {
        self.order.lock().unwrap_or_else(|e| e.into_inner())
    }
}

use dto::order::{OrderDto, OrderStatus};
use dto::org::{OrgDto, OrgStatus};

use crate::listing::{SortDirection, SortKey, SortSpec, sort_records};

#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub total_orders: usize,
    /// Count per status, in `OrderStatus::ALL` order
    pub by_status: Vec<(OrderStatus, usize)>,
    /// Sum over orders that carry an amount
    pub total_amount: f64,
    pub pending_amount: f64,
    pub recent: Vec<OrderDto>,
}

impl OrderSummary {
    pub fn count(&self, status: OrderStatus) -> usize {
        self.by_status
            .iter()
            .find(|(s, _)| *s == status)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }
}

pub fn summarize_orders(orders: &[OrderDto], recent_limit: usize) -> OrderSummary {
    let by_status = OrderStatus::ALL
        .iter()
        .map(|status| (*status, orders.iter().filter(|o| o.status == *status).count()))
        .collect();

    let total_amount = orders.iter().filter_map(|o| o.amount).sum();
    let pending_amount = orders
        .iter()
        .filter(|o| o.status == OrderStatus::Pending)
        .filter_map(|o| o.amount)
        .sum();

    let mut recent = orders.to_vec();
    sort_records(&mut recent, &SortSpec::new(SortKey::Date, SortDirection::Desc));
    recent.truncate(recent_limit);

    OrderSummary {
        total_orders: orders.len(),
        by_status,
        total_amount,
        pending_amount,
        recent,
    }
}

pub fn count_orgs(orgs: &[OrgDto]) -> Vec<(OrgStatus, usize)> {
    OrgStatus::ALL
        .iter()
        .map(|status| (*status, orgs.iter().filter(|o| o.status == *status).count()))
        .collect()
}

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::services::ApiClient;
use crate::session::SessionStore;
use dto::order::{OrderDto, OrderStatus};
use dto::org::{AddressDto, OrgDto, OrgStatus};
use dto::role::Role;
use dto::user::UserDto;

/// In-process backend bound to a random local port, counting every request
pub struct MockBackend {
    url: String,
    hits: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn spawn(router: Router) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = router.layer(middleware::from_fn_with_state(hits.clone(), count_hits));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Local address is required");
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Mock backend must start");
        });

        Self {
            url: format!("http://{}", addr),
            hits,
            handle,
        }
    }

    pub fn client(&self, token: Option<&str>) -> ApiClient {
        ApiClient::new(&self.url, SessionStore::memory(token.map(|t| t.to_string())))
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn count_hits(State(hits): State<Arc<AtomicUsize>>, req: Request, next: Next) -> Response {
    hits.fetch_add(1, Ordering::SeqCst);
    next.run(req).await
}

pub fn test_user() -> UserDto {
    UserDto {
        id: "user-1".to_string(),
        name: "Admin".to_string(),
        email: "admin@example.com".to_string(),
        role: Role::Admin,
    }
}

fn timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    value.map(|v| {
        DateTime::parse_from_rfc3339(v)
            .expect("valid timestamp")
            .with_timezone(&Utc)
    })
}

pub fn order(
    id: &str,
    org_id: &str,
    product_name: &str,
    amount: Option<f64>,
    status: OrderStatus,
    submitted_at: Option<&str>,
) -> OrderDto {
    OrderDto {
        id: id.to_string(),
        org_id: org_id.to_string(),
        org_name: None,
        product_name: Some(product_name.to_string()),
        brand: None,
        product_type: Some("tablet".to_string()),
        batch_size: None,
        unit_type: None,
        amount,
        status,
        submitted_at: timestamp(submitted_at),
        items: Vec::new(),
        fulfillment: None,
        rejection_reason: None,
    }
}

pub fn sample_orders() -> Vec<OrderDto> {
    vec![
        order(
            "ord-1",
            "org-1",
            "Amoxicillin 250",
            Some(1200.0),
            OrderStatus::Pending,
            Some("2026-01-10T09:30:00Z"),
        ),
        order(
            "ord-2",
            "org-2",
            "Paracetamol 500",
            Some(450.5),
            OrderStatus::Processing,
            Some("2026-02-03T11:00:00Z"),
        ),
        order("ord-3", "org-1", "Cetirizine 10", None, OrderStatus::Pending, None),
        order(
            "ord-4",
            "org-3",
            "azithromycin 500",
            Some(3000.0),
            OrderStatus::Delivered,
            Some("2026-01-25T16:45:00Z"),
        ),
        order(
            "ord-5",
            "org-2",
            "Ibuprofen 400",
            Some(800.0),
            OrderStatus::Cancelled,
            Some("2026-03-15T08:00:00Z"),
        ),
        order(
            "ord-6",
            "org-3",
            "Pantoprazole 40",
            Some(150.0),
            OrderStatus::Pending,
            Some("2026-02-20T23:59:00Z"),
        ),
        order(
            "ord-7",
            "org-2",
            "Metformin 500",
            Some(999.99),
            OrderStatus::Shipped,
            Some("2026-02-03T11:00:00Z"),
        ),
    ]
}

pub fn sample_orgs() -> Vec<OrgDto> {
    let org = |id: &str, name: Option<&str>, status: OrgStatus, created: Option<&str>| OrgDto {
        id: id.to_string(),
        name: name.map(|n| n.to_string()),
        address: AddressDto {
            city: Some("Pune".to_string()),
            ..AddressDto::default()
        },
        gst_number: None,
        drug_license_number: None,
        email: None,
        phone: None,
        status,
        created_at: timestamp(created),
    };

    vec![
        org(
            "org-1",
            Some("beta Meds"),
            OrgStatus::Pending,
            Some("2025-11-02T10:00:00Z"),
        ),
        org(
            "org-2",
            Some("Acme Pharma"),
            OrgStatus::Completed,
            Some("2025-10-01T10:00:00Z"),
        ),
        org("org-3", None, OrgStatus::Processing, None),
        org(
            "org-4",
            Some("Zen Health"),
            OrgStatus::Rejected,
            Some("2026-01-15T10:00:00Z"),
        ),
    ]
}

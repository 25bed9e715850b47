use snafu::ResultExt;
use tracing::info;
use urlencoding::encode;
use validator::Validate;

use crate::Result;
use crate::error::{HttpClientSnafu, HttpResponseParseSnafu};
use dto::org::{NewOrgDto, OrgDto, OrgStatus, OrgStatusDto};

use super::{ApiClient, Envelope};

pub async fn list_orgs(client: &ApiClient, search: Option<&str>) -> Result<Vec<OrgDto>> {
    let mut query: Vec<(&str, &str)> = Vec::new();
    if let Some(keyword) = search {
        query.push(("search", keyword));
    }

    let response = client
        .get("/api/new-org")
        .query(&query)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to list organizations. Try again later.".to_string(),
        })?;

    let response = client.check(response, "organizations").await?;

    let orgs = response
        .json::<Envelope<Vec<OrgDto>>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse organizations.".to_string(),
        })?;

    Ok(orgs.into_inner())
}

pub async fn get_org(client: &ApiClient, org_id: &str) -> Result<OrgDto> {
    let url = format!("/api/new-org/{}", encode(org_id));
    let response = client.get(&url).send().await.context(HttpClientSnafu {
        msg: "Unable to get organization. Try again later.",
    })?;

    let response = client.check(response, "organization").await?;

    let org = response
        .json::<Envelope<OrgDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse organization.",
        })?;

    Ok(org.into_inner())
}

/// Validates the onboarding form locally before submitting it
pub async fn register_org(client: &ApiClient, data: &NewOrgDto) -> Result<OrgDto> {
    data.validate()?;

    let response = client
        .post("/api/new-org")
        .json(data)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to register organization. Try again later.".to_string(),
        })?;

    let response = client.check(response, "organization").await?;

    let org = response
        .json::<Envelope<OrgDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse organization information.",
        })?;

    let org = org.into_inner();
    info!("Registered organization {}", org.id);
    Ok(org)
}

pub async fn update_org_status(
    client: &ApiClient,
    org_id: &str,
    status: OrgStatus,
) -> Result<OrgDto> {
    let url = format!("/api/new-org/{}/status", encode(org_id));
    let data = OrgStatusDto { status };
    let response = client
        .patch(&url)
        .json(&data)
        .send()
        .await
        .context(HttpClientSnafu {
            msg: "Unable to update organization. Try again later.",
        })?;

    let response = client.check(response, "organization").await?;

    let org = response
        .json::<Envelope<OrgDto>>()
        .await
        .context(HttpResponseParseSnafu {
            msg: "Unable to parse organization information.",
        })?;

    info!("Organization {} is now {}", org_id, status);
    Ok(org.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use axum::extract::{Path, Query};
    use axum::routing::{get, patch};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;

    fn org_routes() -> Router {
        Router::new()
            .route(
                "/api/new-org",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let orgs = json!([
                        { "_id": "org-1", "name": "Acme Pharma", "status": "pending" },
                        { "_id": "org-2", "name": "Beta Meds", "status": "completed" },
                    ]);
                    match q.get("search") {
                        Some(_) => Json(json!({ "data": [orgs[0].clone()] })),
                        None => Json(orgs),
                    }
                })
                .post(|| async {
                    Json(json!({ "_id": "org-3", "name": "Gamma Labs", "status": "pending" }))
                }),
            )
            .route(
                "/api/new-org/{id}/status",
                patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                    Json(json!({ "_id": id, "name": "Acme Pharma", "status": body["status"] }))
                }),
            )
    }

    #[tokio::test]
    async fn test_list_orgs() {
        let backend = MockBackend::spawn(org_routes()).await;
        let client = backend.client(Some("token"));

        let orgs = list_orgs(&client, None).await.unwrap();
        assert_eq!(orgs.len(), 2);

        let orgs = list_orgs(&client, Some("acme")).await.unwrap();
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].name.as_deref(), Some("Acme Pharma"));
    }

    #[tokio::test]
    async fn test_update_org_status() {
        let backend = MockBackend::spawn(org_routes()).await;
        let client = backend.client(Some("token"));

        let org = update_org_status(&client, "org-1", OrgStatus::Completed)
            .await
            .unwrap();
        assert_eq!(org.id, "org-1");
        assert_eq!(org.status, OrgStatus::Completed);
    }

    #[tokio::test]
    async fn test_register_org_validates_first() {
        let backend = MockBackend::spawn(org_routes()).await;
        let client = backend.client(Some("token"));

        let data = NewOrgDto {
            name: "".to_string(),
            address_line1: "12 Market Road".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            gst_number: "27ABCDE1234F1Z5".to_string(),
            drug_license_number: "MH-PZ-123456".to_string(),
            email: "ops@gamma.example".to_string(),
            phone: "+919800000000".to_string(),
        };

        let result = register_org(&client, &data).await;
        assert!(result.is_err());
        assert_eq!(backend.hits(), 0);

        let data = NewOrgDto {
            name: "Gamma Labs".to_string(),
            ..data
        };
        let org = register_org(&client, &data).await.unwrap();
        assert_eq!(org.id, "org-3");
        assert_eq!(backend.hits(), 1);
    }
}

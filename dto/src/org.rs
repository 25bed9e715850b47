use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::Snafu;
use validator::Validate;

#[derive(PartialEq, Eq, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrgStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
}

#[derive(Debug, Snafu)]
#[snafu(display("Invalid organization status: {status}"))]
pub struct InvalidOrgStatusError {
    status: String,
}

impl OrgStatus {
    pub const ALL: [OrgStatus; 4] = [
        OrgStatus::Pending,
        OrgStatus::Processing,
        OrgStatus::Completed,
        OrgStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrgStatus::Pending => "pending",
            OrgStatus::Processing => "processing",
            OrgStatus::Completed => "completed",
            OrgStatus::Rejected => "rejected",
        }
    }
}

impl TryFrom<&str> for OrgStatus {
    type Error = InvalidOrgStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "pending" => Ok(OrgStatus::Pending),
            "processing" => Ok(OrgStatus::Processing),
            "completed" => Ok(OrgStatus::Completed),
            "rejected" => Ok(OrgStatus::Rejected),
            _ => InvalidOrgStatusSnafu { status: value }.fail(),
        }
    }
}

impl TryFrom<String> for OrgStatus {
    type Error = InvalidOrgStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OrgStatus::try_from(value.as_str())
    }
}

impl From<OrgStatus> for String {
    fn from(status: OrgStatus) -> Self {
        status.as_str().to_string()
    }
}

impl core::fmt::Display for OrgStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgDto {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: AddressDto,
    #[serde(default)]
    pub gst_number: Option<String>,
    #[serde(default)]
    pub drug_license_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub status: OrgStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Registration payload of the onboarding form
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewOrgDto {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(min = 1, max = 200))]
    pub address_line1: String,

    #[validate(length(min = 1, max = 100))]
    pub city: String,

    #[validate(length(min = 1, max = 100))]
    pub state: String,

    #[validate(length(min = 4, max = 10))]
    pub postal_code: String,

    #[validate(length(equal = 15))]
    pub gst_number: String,

    #[validate(length(min = 1, max = 50))]
    pub drug_license_number: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 7, max = 20))]
    pub phone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrgStatusDto {
    pub status: OrgStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_case_insensitive() {
        assert_eq!(OrgStatus::try_from("Completed").unwrap(), OrgStatus::Completed);
        assert_eq!(OrgStatus::try_from(" pending ").unwrap(), OrgStatus::Pending);
        assert!(OrgStatus::try_from("archived").is_err());
    }

    #[test]
    fn test_deserialize_sparse_org() {
        let org: OrgDto = serde_json::from_value(json!({
            "_id": "org-1",
            "name": "Acme Pharma",
            "status": "PROCESSING",
        }))
        .unwrap();

        assert_eq!(org.id, "org-1");
        assert_eq!(org.status, OrgStatus::Processing);
        assert_eq!(org.address, AddressDto::default());
        assert!(org.created_at.is_none());
    }

    #[test]
    fn test_new_org_validation() {
        let mut data = NewOrgDto {
            name: "Acme Pharma".to_string(),
            address_line1: "12 Market Road".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            postal_code: "411001".to_string(),
            gst_number: "27ABCDE1234F1Z5".to_string(),
            drug_license_number: "MH-PZ-123456".to_string(),
            email: "ops@acme.example".to_string(),
            phone: "+919800000000".to_string(),
        };
        assert!(data.validate().is_ok());

        data.gst_number = "123".to_string();
        data.email = "not-an-email".to_string();
        let errors = data.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("gst_number"));
        assert!(fields.contains_key("email"));
    }
}

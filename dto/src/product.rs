use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub product_type: Option<String>,
    #[serde(default)]
    pub unit_types: Vec<String>,
    #[serde(default)]
    pub batch_sizes: Vec<String>,
}

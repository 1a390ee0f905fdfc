use serde::{Deserialize, Serialize};

/// How confidently the backend matched the scanned item to a catalogue
/// product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Exact,
    Partial,
    NotFound,
}

/// Product identity resolved from a barcode lookup or photo identification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductInfo {
    /// Display name (API may send it as "product_name")
    #[serde(alias = "product_name")]
    pub name: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredients_text: Option<String>,
    #[serde(default)]
    pub match_status: Option<MatchStatus>,
}

impl ProductInfo {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            brand: None,
            barcode: None,
            image_url: None,
            ingredients_text: None,
            match_status: None,
        }
    }
}

//! Registration document records and their wire-format field mapping.
//!
//! Every scalar field is optional: an absent value is omitted from the
//! serialized form and a missing key deserializes to `None`. `products` is
//! always present on the wire, even when empty.

use serde::{Deserialize, Deserializer, Serialize};

/// Participant block nested under `description`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Description {
    /// Participant tax ID (INN)
    #[serde(rename = "participantInn", skip_serializing_if = "Option::is_none")]
    pub participant_inn: Option<String>,
}

impl Description {
    /// Create a description for the given participant tax ID.
    pub fn new(participant_inn: impl Into<String>) -> Self {
        Self {
            participant_inn: Some(participant_inn.into()),
        }
    }
}

/// One regulatory filing.
///
/// # Example
/// ```
/// use crpt_throttle::{Document, Product};
///
/// let document = Document {
///     doc_id: Some("123".to_string()),
///     products: vec![Product {
///         tnved_code: Some("6401100000".to_string()),
///         ..Product::default()
///     }],
///     ..Document::default()
/// };
///
/// assert_eq!(document.product_count(), 1);
/// assert!(!document.is_import());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Description>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    #[serde(rename = "importRequest", skip_serializing_if = "Option::is_none")]
    pub import_request: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_type: Option<String>,
    /// Line items, in submission order
    #[serde(deserialize_with = "null_as_empty")]
    pub products: Vec<Product>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reg_number: Option<String>,
}

impl Document {
    /// Number of line items carried by this document.
    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    /// Whether the document is flagged as an import request.
    ///
    /// An absent flag counts as `false`.
    pub fn is_import(&self) -> bool {
        self.import_request.unwrap_or(false)
    }
}

/// One line item of a [`Document`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Product {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_document_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_document_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_inn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_date: Option<String>,
    /// Commodity code (TN VED)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tnved_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uit_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uitu_code: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Product>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Product>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

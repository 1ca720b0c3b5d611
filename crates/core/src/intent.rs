//! Shopper intents and cart actions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified purpose of a shopper message.
///
/// The first five are the routable intents; `Error` marks input that could
/// not be classified at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProductQuery,
    CartUpdate,
    SummarizeCart,
    InitiatePayment,
    GeneralInfo,
    Error,
}

impl Intent {
    /// The intents a classifier is allowed to return
    pub const RECOGNIZED: [Intent; 5] = [
        Intent::ProductQuery,
        Intent::CartUpdate,
        Intent::SummarizeCart,
        Intent::InitiatePayment,
        Intent::GeneralInfo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductQuery => "product_query",
            Self::CartUpdate => "cart_update",
            Self::SummarizeCart => "summarize_cart",
            Self::InitiatePayment => "initiate_payment",
            Self::GeneralInfo => "general_info",
            Self::Error => "error",
        }
    }

    /// Parse one of the five recognized intent names.
    ///
    /// `error` is deliberately not accepted here: it is never a valid
    /// classifier answer.
    pub fn parse_recognized(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::RECOGNIZED
            .into_iter()
            .find(|intent| intent.as_str() == normalized)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cart mutation requested by the shopper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    #[default]
    Add,
    Remove,
}

impl CartAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "add" => Some(Self::Add),
            "remove" | "delete" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for CartAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

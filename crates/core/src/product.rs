//! Catalog records and rupee formatting

use serde::{Deserialize, Serialize};

/// Immutable catalog record returned by the product index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Currency-formatted price as shown to shoppers, e.g. `₹2499`
    pub price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl Product {
    /// Price in whole rupees, if the price string can be read
    pub fn price_rupees(&self) -> Option<u64> {
        parse_rupees(&self.price)
    }
}

/// Parse a currency string such as `₹1,49,999`, `Rs. 499` or `2499.00`
/// into whole rupees. Paise are truncated.
pub fn parse_rupees(price: &str) -> Option<u64> {
    let trimmed = price.trim();
    let without_symbol = trimmed
        .trim_start_matches('₹')
        .trim_start_matches("INR")
        .trim_start_matches("Rs.")
        .trim_start_matches("Rs")
        .trim();

    let whole = without_symbol.split('.').next().unwrap_or("");
    let digits: String = whole.chars().filter(|c| *c != ',' && *c != ' ').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Format whole rupees with Indian digit grouping: `₹1,00,000`
pub fn format_rupees(amount: u64) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{}", digits);
    }

    let (head, last_three) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("₹{},{}", groups.join(","), last_three)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rupees() {
        assert_eq!(parse_rupees("₹2499"), Some(2499));
        assert_eq!(parse_rupees("₹1,49,999"), Some(149_999));
        assert_eq!(parse_rupees("Rs. 499.50"), Some(499));
        assert_eq!(parse_rupees("INR 12999"), Some(12_999));
        assert_eq!(parse_rupees("free"), None);
        assert_eq!(parse_rupees(""), None);
    }

    #[test]
    fn test_format_rupees_indian_grouping() {
        assert_eq!(format_rupees(0), "₹0");
        assert_eq!(format_rupees(999), "₹999");
        assert_eq!(format_rupees(1_499), "₹1,499");
        assert_eq!(format_rupees(12_999), "₹12,999");
        assert_eq!(format_rupees(100_000), "₹1,00,000");
        assert_eq!(format_rupees(12_345_678), "₹1,23,45,678");
    }

    #[test]
    fn test_product_from_catalog_json() {
        let product: Product = serde_json::from_str(
            r#"{"id":"prod4","name":"Running Shoes","price":"₹2499","image_url":"/static/shoe.jpg"}"#,
        )
        .unwrap();
        assert_eq!(product.image_url.as_deref(), Some("/static/shoe.jpg"));
        assert_eq!(product.price_rupees(), Some(2499));
    }
}

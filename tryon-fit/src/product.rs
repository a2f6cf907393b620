use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Catalog entry. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<f64>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub on_sale: bool,
    #[serde(default)]
    pub trending: bool,
    #[serde(default)]
    pub new_arrival: bool,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub image: String,
    // description, rating, etc. pass through untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Product {
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// A product without a size list fits any size.
    pub fn offers_size(&self, size: &str) -> bool {
        self.sizes.is_empty() || self.sizes.iter().any(|s| s == size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_storefront_document() {
        let p: Product = serde_json::from_value(json!({
            "id": "p1",
            "name": "Round Frames",
            "category": "Glasses",
            "price": 79.5,
            "originalPrice": 99.0,
            "stock": 3,
            "onSale": true,
            "sizes": ["M", "L"],
            "image": "/img/p1.png",
            "rating": 4.5
        }))
        .unwrap();

        assert_eq!(p.original_price, Some(99.0));
        assert!(p.on_sale && !p.trending && !p.new_arrival);
        assert_eq!(p.extra["rating"], json!(4.5));
        assert!(p.offers_size("M"));
        assert!(!p.offers_size("S"));
    }

    #[test]
    fn no_sizes_fits_everything() {
        let p: Product = serde_json::from_value(json!({
            "id": "p2", "name": "Scarf", "category": "Accessories", "price": 20
        }))
        .unwrap();
        assert!(p.offers_size("XXL"));
        assert!(!p.in_stock());
    }
}

//! Rule-based product ranking
//!
//! Scores each product against a shopper's preferences and recent browsing,
//! then ranks highest first. Deterministic: equal scores keep catalog order.

use crate::product::Product;
use crate::profile::{PriceRange, ShopperProfile};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 8;

const PREFERRED_CATEGORY: i32 = 10;
const PRICE_RANGE: i32 = 5;
const TRENDING: i32 = 5;
const ON_SALE: i32 = 3;
const NEW_ARRIVAL: i32 = 2;
const RECENTLY_VIEWED_CATEGORY: i32 = 3;
const IN_STOCK: i32 = 2;

/// Contribution of each rule to a product's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub preferred_category: i32,
    pub price_range: i32,
    pub trending: i32,
    pub on_sale: i32,
    pub new_arrival: i32,
    pub recently_viewed: i32,
    pub in_stock: i32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> i32 {
        self.preferred_category
            + self.price_range
            + self.trending
            + self.on_sale
            + self.new_arrival
            + self.recently_viewed
            + self.in_stock
    }
}

/// A product with its recommendation score; serializes as the product's own
/// fields plus `recommendationScore`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredProduct<'a> {
    #[serde(flatten)]
    pub product: &'a Product,
    pub recommendation_score: i32,
    #[serde(skip)]
    pub breakdown: ScoreBreakdown,
}

fn flag(on: bool, points: i32) -> i32 {
    if on { points } else { 0 }
}

/// Scores one product. `viewed_categories` are the categories of recently viewed products.
pub fn score_product(
    product: &Product,
    profile: &ShopperProfile,
    viewed_categories: &HashSet<&str>,
) -> ScoreBreakdown {
    ScoreBreakdown {
        preferred_category: flag(
            profile.preferred_categories.contains(&product.category),
            PREFERRED_CATEGORY,
        ),
        price_range: flag(
            profile.price_range == Some(PriceRange::of(product.price)),
            PRICE_RANGE,
        ),
        trending: flag(product.trending, TRENDING),
        on_sale: flag(product.on_sale, ON_SALE),
        new_arrival: flag(product.new_arrival, NEW_ARRIVAL),
        recently_viewed: flag(
            viewed_categories.contains(product.category.as_str()),
            RECENTLY_VIEWED_CATEGORY,
        ),
        in_stock: flag(product.in_stock(), IN_STOCK),
    }
}

/// Ranks `products` for the shopper, returning at most `limit` entries.
pub fn recommend_products<'a>(
    products: &'a [Product],
    profile: &ShopperProfile,
    recently_viewed: &[Product],
    limit: usize,
) -> Vec<ScoredProduct<'a>> {
    if products.is_empty() || limit == 0 {
        return Vec::new();
    }

    let viewed_categories: HashSet<&str> = recently_viewed
        .iter()
        .map(|p| p.category.as_str())
        .collect();

    let mut scored: Vec<ScoredProduct> = products
        .iter()
        .filter(|p| match &profile.preferred_size {
            Some(size) => p.offers_size(size),
            None => true,
        })
        .map(|product| {
            let breakdown = score_product(product, profile, &viewed_categories);
            ScoredProduct {
                product,
                recommendation_score: breakdown.total(),
                breakdown,
            }
        })
        .collect();

    // sort_by is stable
    scored.sort_by(|a, b| b.recommendation_score.cmp(&a.recommendation_score));
    scored.truncate(limit);

    debug!(
        "Recommended {} of {} products",
        scored.len(),
        products.len()
    );
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product(id: &str, category: &str, price: f64) -> Product {
        serde_json::from_value(json!({
            "id": id, "name": id, "category": category, "price": price
        }))
        .unwrap()
    }

    fn ids(scored: &[ScoredProduct]) -> Vec<String> {
        scored.iter().map(|s| s.product.id.clone()).collect()
    }

    #[test]
    fn each_rule_adds_its_points() {
        let mut p = product("a", "Glasses", 120.);
        p.trending = true;
        p.on_sale = true;
        p.new_arrival = true;
        p.stock = 1;
        let profile = ShopperProfile {
            preferred_categories: vec!["Glasses".into()],
            price_range: Some(PriceRange::High),
            ..Default::default()
        };
        let viewed = HashSet::from(["Glasses"]);

        let b = score_product(&p, &profile, &viewed);
        assert_eq!(
            b,
            ScoreBreakdown {
                preferred_category: 10,
                price_range: 5,
                trending: 5,
                on_sale: 3,
                new_arrival: 2,
                recently_viewed: 3,
                in_stock: 2,
            }
        );
        assert_eq!(b.total(), 30);
    }

    #[test]
    fn preferred_size_filters_sized_products_only() {
        let mut sized = product("sized", "Shirts", 30.);
        sized.sizes = vec!["S".into(), "M".into()];
        let mut other_size = product("other", "Shirts", 30.);
        other_size.sizes = vec!["XL".into()];
        let one_size = product("unsized", "Hats", 30.);

        let profile = ShopperProfile {
            preferred_size: Some("M".into()),
            ..Default::default()
        };
        let catalog = [sized, other_size, one_size];
        let out = recommend_products(&catalog, &profile, &[], DEFAULT_LIMIT);

        assert_eq!(ids(&out), vec!["sized", "unsized"]);
    }

    #[test]
    fn recently_viewed_category_boosts() {
        let catalog = [product("shoe", "Shoes", 60.), product("hat", "Hats", 60.)];
        let viewed = [product("seen", "Hats", 10.)];

        let out = recommend_products(&catalog, &ShopperProfile::default(), &viewed, 8);
        assert_eq!(ids(&out), vec!["hat", "shoe"]);
        assert_eq!(out[0].recommendation_score, 3);
        assert_eq!(out[0].breakdown.recently_viewed, 3);
    }

    #[test]
    fn ties_keep_input_order_and_limit_truncates() {
        let catalog: Vec<Product> = (0..12)
            .map(|i| product(&format!("p{i}"), "Misc", 10.))
            .collect();

        let out = recommend_products(&catalog, &ShopperProfile::default(), &[], 5);
        assert_eq!(ids(&out), vec!["p0", "p1", "p2", "p3", "p4"]);
    }

    #[test]
    fn zero_limit_is_empty() {
        let catalog = [product("a", "Misc", 10.)];
        assert!(recommend_products(&catalog, &ShopperProfile::default(), &[], 0).is_empty());
    }

    #[test]
    fn serializes_with_score_field() {
        let catalog = [product("a", "Misc", 10.)];
        let out = recommend_products(&catalog, &ShopperProfile::default(), &[], 1);
        let v = serde_json::to_value(&out).unwrap();

        assert_eq!(v[0]["id"], json!("a"));
        assert_eq!(v[0]["recommendationScore"], json!(0));
        assert!(v[0].get("breakdown").is_none());
    }
}

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceRange {
    Low,
    Medium,
    High,
}

impl PriceRange {
    /// low: < 50, medium: [50, 100), high: >= 100
    pub fn of(price: f64) -> PriceRange {
        if price < 50. {
            PriceRange::Low
        } else if price < 100. {
            PriceRange::Medium
        } else {
            PriceRange::High
        }
    }
}

/// Explicit shopping preferences.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShopperProfile {
    pub preferred_size: Option<String>,
    pub preferred_categories: Vec<String>,
    pub price_range: Option<PriceRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Body measurements; weight in kg, lengths in cm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserMeasurements {
    pub gender: Option<Gender>,
    pub age: Option<f32>,
    pub weight: Option<f32>,
    pub height: Option<f32>,
    pub chest: Option<f32>,
    pub waist: Option<f32>,
    pub hips: Option<f32>,
}

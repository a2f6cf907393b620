//! Garment size estimates from body measurements.
//!
//! Advisory only: the formulas are heuristics, not a fitted model.

mod breakpoints;
mod chart;

pub use breakpoints::Breakpoints;
pub use chart::{Body, Garment, Labeler, SizeChart};

use crate::profile::{Gender, UserMeasurements};
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Basis {
    /// Taken from a measurement the user supplied.
    Measured,
    /// Derived from height, weight and age.
    Estimated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizeRecommendation {
    pub label: String,
    pub basis: Basis,
}

fn known(v: Option<f32>) -> Option<f32> {
    v.filter(|v| v.is_finite() && *v > 0.)
}

impl Body {
    /// None unless gender, weight and height are all present and usable.
    pub fn from_measurements(m: &UserMeasurements) -> Option<Body> {
        Some(Body {
            gender: m.gender?,
            age: known(m.age),
            weight: known(m.weight)?,
            height: known(m.height)?,
            chest: known(m.chest),
            waist: known(m.waist),
        })
    }
}

/// Size label for `category`, or None when gender, weight or height is missing.
pub fn recommend_size(m: &UserMeasurements, category: &str) -> Option<SizeRecommendation> {
    let body = Body::from_measurements(m)?;
    let chart = SizeChart::for_garment(Garment::from_category(category));

    let (value, basis) = match (chart.measured)(&body) {
        Some(v) => (v, Basis::Measured),
        None => ((chart.estimate)(&body), Basis::Estimated),
    };
    trace!("{category}: {value:.1} ({basis:?})");

    Some(SizeRecommendation {
        label: chart.label(value, body.gender),
        basis,
    })
}

pub fn jeans_size_from_waist(waist: f32, gender: Gender) -> &'static str {
    match gender {
        Gender::Male => breakpoints::MALE_WAIST.label_for(waist),
        _ => breakpoints::FEMALE_WAIST.label_for(waist),
    }
}

pub fn top_size_from_chest(chest: f32, gender: Gender) -> &'static str {
    match gender {
        Gender::Male => breakpoints::MALE_CHEST.label_for(chest),
        _ => breakpoints::FEMALE_CHEST.label_for(chest),
    }
}

/// US shoe size estimated from body height in cm.
pub fn shoe_size_from_height(height: f32, gender: Gender) -> f32 {
    let body = Body {
        gender,
        age: None,
        weight: 0.,
        height,
        chest: None,
        waist: None,
    };
    chart::us_shoe_size(chart::estimate_foot_length(&body), gender)
}

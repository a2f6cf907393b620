use super::breakpoints::{Breakpoints, FEMALE_CHEST, FEMALE_WAIST, MALE_CHEST, MALE_WAIST};
use crate::profile::Gender;

/// Validated inputs: gender, weight and height are known and positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub gender: Gender,
    pub age: Option<f32>,
    pub weight: f32,
    pub height: f32,
    pub chest: Option<f32>,
    pub waist: Option<f32>,
}

impl Body {
    pub fn bmi(&self) -> f32 {
        let height_m = self.height / 100.;
        self.weight / (height_m * height_m)
    }

    fn is_male(&self) -> bool {
        self.gender == Gender::Male
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Garment {
    Bottoms,
    Footwear,
    Tops,
}

impl Garment {
    pub fn from_category(category: &str) -> Garment {
        let category = category.trim();
        if category.eq_ignore_ascii_case("jeans") || category.eq_ignore_ascii_case("pants") {
            Garment::Bottoms
        } else if category.eq_ignore_ascii_case("shoes") {
            Garment::Footwear
        } else {
            Garment::Tops
        }
    }
}

pub enum Labeler {
    Table {
        male: &'static Breakpoints,
        female: &'static Breakpoints,
    },
    UsShoe,
}

/// How one garment class turns a body into a size label.
pub struct SizeChart {
    /// Measurement taken directly from the user, when the chart uses one.
    pub measured: fn(&Body) -> Option<f32>,
    pub estimate: fn(&Body) -> f32,
    pub labeler: Labeler,
}

impl SizeChart {
    pub fn for_garment(garment: Garment) -> &'static SizeChart {
        match garment {
            Garment::Bottoms => &BOTTOMS,
            Garment::Footwear => &FOOTWEAR,
            Garment::Tops => &TOPS,
        }
    }

    pub fn label(&self, value: f32, gender: Gender) -> String {
        match &self.labeler {
            Labeler::Table { male, female } => {
                let table = if gender == Gender::Male { male } else { female };
                table.label_for(value).to_string()
            }
            Labeler::UsShoe => format_half_size(us_shoe_size(value, gender)),
        }
    }
}

static BOTTOMS: SizeChart = SizeChart {
    measured: |b| b.waist,
    estimate: estimate_waist,
    labeler: Labeler::Table {
        male: &MALE_WAIST,
        female: &FEMALE_WAIST,
    },
};

static FOOTWEAR: SizeChart = SizeChart {
    measured: |_| None,
    estimate: estimate_foot_length,
    labeler: Labeler::UsShoe,
};

static TOPS: SizeChart = SizeChart {
    measured: |b| b.chest,
    estimate: estimate_chest,
    labeler: Labeler::Table {
        male: &MALE_CHEST,
        female: &FEMALE_CHEST,
    },
};

pub fn estimate_waist(body: &Body) -> f32 {
    let bmi = body.bmi();
    if body.is_male() {
        85. + (bmi - 22.) * 3.
    } else {
        72. + (bmi - 22.) * 2.5
    }
}

pub fn age_factor(age: Option<f32>) -> f32 {
    match age {
        Some(a) if a < 25. => 0.95,
        Some(a) if a > 50. => 1.05,
        _ => 1.,
    }
}

pub fn estimate_chest(body: &Body) -> f32 {
    let bmi = body.bmi();
    let base = if body.is_male() {
        95. + (bmi - 22.) * 2.5
    } else {
        88. + (bmi - 22.) * 2.2
    };

    let mut chest = base * age_factor(body.age);
    if body.weight > 100. {
        chest += 5.;
    } else if body.weight < 50. {
        chest -= 5.;
    }
    chest
}

/// Foot length in cm.
pub fn estimate_foot_length(body: &Body) -> f32 {
    let scale = if body.is_male() { 1.05 } else { 0.95 };
    body.height * 0.15 * scale
}

/// US size from foot length in cm, to the nearest half size.
pub fn us_shoe_size(foot_cm: f32, gender: Gender) -> f32 {
    let inches = foot_cm / 2.54;
    let size = if gender == Gender::Male {
        3. * inches - 22.
    } else {
        3. * inches - 21.
    };
    (size * 2.).round() / 2.
}

fn format_half_size(size: f32) -> String {
    if size.fract() == 0. {
        format!("{size:.0}")
    } else {
        format!("{size:.1}")
    }
}

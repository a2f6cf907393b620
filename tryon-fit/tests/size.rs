use tryon_fit::size::{Basis, jeans_size_from_waist, top_size_from_chest};
use tryon_fit::{Gender, UserMeasurements, recommend_size};

fn complete() -> UserMeasurements {
    UserMeasurements {
        gender: Some(Gender::Female),
        age: Some(30.),
        weight: Some(62.),
        height: Some(168.),
        chest: None,
        waist: None,
        hips: Some(96.),
    }
}

#[test]
fn waist_breakpoint_scenario() {
    assert_eq!(jeans_size_from_waist(80., Gender::Male), "30");
}

#[test]
fn chest_breakpoint_scenario() {
    assert_eq!(top_size_from_chest(95., Gender::Male), "M");
}

#[test]
fn missing_required_field_is_none() {
    let categories = ["Jeans", "Pants", "Shoes", "Shirts", ""];
    let mut no_gender = complete();
    no_gender.gender = None;
    let mut no_weight = complete();
    no_weight.weight = None;
    let mut no_height = complete();
    no_height.height = None;

    for m in [no_gender, no_weight, no_height, UserMeasurements::default()] {
        for category in categories {
            assert_eq!(recommend_size(&m, category), None, "{m:?} {category}");
        }
    }
}

#[test]
fn complete_measurements_always_size() {
    for gender in [Gender::Male, Gender::Female, Gender::Other] {
        for category in ["Jeans", "Pants", "Shoes", "Dresses"] {
            let mut m = complete();
            m.gender = Some(gender);
            let rec = recommend_size(&m, category).unwrap();
            assert!(!rec.label.is_empty());
            assert_eq!(rec.basis, Basis::Estimated);
        }
    }
}

#[test]
fn supplied_chest_is_measured() {
    let mut m = complete();
    m.chest = Some(90.);
    let rec = recommend_size(&m, "Blouses").unwrap();
    assert_eq!(rec.label, "M");
    assert_eq!(rec.basis, Basis::Measured);
}

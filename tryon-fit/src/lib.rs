pub mod catalog;
pub mod product;
pub mod profile;
pub mod recommend;
pub mod size;

pub use product::Product;
pub use profile::{Gender, PriceRange, ShopperProfile, UserMeasurements};
pub use recommend::{DEFAULT_LIMIT, ScoredProduct, recommend_products};
pub use size::{SizeRecommendation, recommend_size};

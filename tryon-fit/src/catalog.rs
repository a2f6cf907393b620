use crate::product::Product;
use crate::profile::{ShopperProfile, UserMeasurements};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Unknown product id: {0}")]
    UnknownProduct(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;

fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a JSON array of products.
pub fn load_products(path: &Path) -> Result<Vec<Product>> {
    let products: Vec<Product> = load(path)?;
    debug!("Loaded {} products from {path:?}", products.len());
    Ok(products)
}

pub fn load_profile(path: &Path) -> Result<ShopperProfile> {
    load(path)
}

pub fn load_measurements(path: &Path) -> Result<UserMeasurements> {
    load(path)
}

/// Looks up products by id, preserving the order of `ids`.
pub fn select(products: &[Product], ids: &[String]) -> Result<Vec<Product>> {
    ids.iter()
        .map(|id| {
            products
                .iter()
                .find(|p| &p.id == id)
                .cloned()
                .ok_or_else(|| CatalogError::UnknownProduct(id.clone()))
        })
        .collect()
}

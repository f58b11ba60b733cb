//! Product catalog
//!
//! The catalog is loaded once at startup and shared read-only. Every accessor recomputes its
//! result from the product list, nothing is cached.

use crate::config::Settings;
use di::{inject, injectable};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

const BUILTIN_CATALOG: &str = include_str!("../../data/products.json");

/// Categories the chatbot recognises in free text, in matching order.
pub const KNOWN_CATEGORIES: [&str; 4] = ["bata", "besi", "semen", "kayu"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "text")]
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub stock: u32,
    /// Price in whole rupiah.
    pub price: u64,
    /// Price before the current discount. Only discounted products carry one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_price: Option<u64>,
    pub image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<Badge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Product {
    pub fn name_contains(&self, keyword: &str) -> bool {
        self.name
            .to_lowercase()
            .contains(&keyword.to_lowercase())
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.to_lowercase() == category.to_lowercase())
    }

    pub fn is_discounted(&self) -> bool {
        self.old_price.is_some()
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.stock == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    products: Vec<Product>,
}

#[injectable]
impl Catalog {
    #[inject]
    pub fn create() -> Catalog {
        let settings = Settings::from_env();
        let catalog = Catalog::load(settings.catalog_path.as_deref());

        info!("catalog loaded with {} products", catalog.len());
        catalog
    }
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Catalog {
        Catalog { products }
    }

    /// The catalog bundled into the binary.
    pub fn builtin() -> Catalog {
        Catalog::from_json(BUILTIN_CATALOG).unwrap_or_else(|e| {
            error!("bundled catalog is invalid: {e}");
            Catalog::default()
        })
    }

    /// Reads the catalog at `path`, or the bundled one when no path is given or the file
    /// cannot be used.
    pub fn load(path: Option<&Path>) -> Catalog {
        match path {
            Some(path) => Catalog::from_file(path).unwrap_or_else(|| {
                error!(
                    "could not load catalog from {}, using the bundled one",
                    path.display()
                );
                Catalog::builtin()
            }),
            None => Catalog::builtin(),
        }
    }

    pub fn from_json(json: &str) -> Result<Catalog, serde_json::Error> {
        serde_json::from_str(json).map(Catalog::new)
    }

    fn from_file(path: &Path) -> Option<Catalog> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| error!("{}: {e}", path.display()))
            .ok()?;
        Catalog::from_json(&contents)
            .map_err(|e| error!("{}: {e}", path.display()))
            .ok()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn all(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, id: u32) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Case-insensitive substring match on the product name.
    pub fn search(&self, keyword: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.name_contains(keyword))
            .collect()
    }

    /// Case-insensitive equality on the category label.
    pub fn by_category(&self, category: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.in_category(category))
            .collect()
    }

    pub fn discounted(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_discounted()).collect()
    }

    pub fn out_of_stock(&self) -> Vec<&Product> {
        self.products.iter().filter(|p| p.is_out_of_stock()).collect()
    }
}

/// Formats a rupiah amount with Indonesian thousands separators, e.g. `15000` → `15.000`.
pub fn format_rupiah(amount: u64) -> String {
    let digits = amount.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(digit);
    }

    formatted
}

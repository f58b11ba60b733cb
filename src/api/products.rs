//! Catalog endpoints

use crate::api::products::schemas::{ProductList, ProductQuery};
use crate::core::catalog::{Catalog, Product};
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use di_axum::Inject;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
}

/// Lists products. Every filter given in the query must hold.
async fn list_products(
    Inject(catalog): Inject<Catalog>,
    Query(query): Query<ProductQuery>,
) -> Json<ProductList> {
    let products = catalog
        .all()
        .iter()
        .filter(|p| query.matches(p))
        .cloned()
        .collect();

    Json(ProductList { products })
}

async fn get_product(
    Inject(catalog): Inject<Catalog>,
    Path(id): Path<u32>,
) -> Result<Json<Product>, (StatusCode, &'static str)> {
    catalog
        .get(id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "product not found"))
}

pub mod schemas {
    use crate::core::catalog::Product;
    use serde::{Deserialize, Serialize};

    #[derive(Deserialize, Debug, Default)]
    pub struct ProductQuery {
        /// Name substring, case-insensitive.
        pub q: Option<String>,
        pub category: Option<String>,
        pub discounted: Option<bool>,
        pub out_of_stock: Option<bool>,
    }

    impl ProductQuery {
        pub fn matches(&self, product: &Product) -> bool {
            self.q.as_deref().is_none_or(|q| product.name_contains(q.trim()))
                && self
                    .category
                    .as_deref()
                    .is_none_or(|c| product.in_category(c.trim()))
                && self
                    .discounted
                    .is_none_or(|wanted| product.is_discounted() == wanted)
                && self
                    .out_of_stock
                    .is_none_or(|wanted| product.is_out_of_stock() == wanted)
        }
    }

    #[derive(Serialize, Debug)]
    pub struct ProductList {
        pub products: Vec<Product>,
    }
}

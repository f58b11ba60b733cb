//! DuraBata storefront API - Library exports for testing
//!
//! (c) DuraBata 2025

pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;

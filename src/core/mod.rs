pub mod assistant;
pub mod catalog;
pub mod router;
pub mod services;
pub mod session;
pub mod traits;

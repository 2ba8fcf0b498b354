//! Marketplace gateway subsystem.
//!
//! Typed endpoints that keep marketplace credentials on the server side of
//! the browser client.
//!
//! # Data Flow
//! ```text
//! POST /ebay/oauth/token                    → Basic auth grant → relay token JSON
//! GET|POST /ebay/buy/browse/item_summary/search → Bearer search  → relay results
//! POST /ebay/sell/inventory/item            → local placeholder
//! ```
//!
//! # Design Decisions
//! - Bodies are deserialized into typed requests; anything else is a 400
//! - Marketplace error statuses are kept, with the body wrapped as details

pub mod gateway;
pub mod handlers;
pub mod types;

pub use gateway::{MarketplaceError, MarketplaceGateway};
pub use handlers::routes;

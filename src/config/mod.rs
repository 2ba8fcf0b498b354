//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) or built-in preset
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → compiled into routing tables and upstream targets at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod presets;
pub mod schema;
pub mod validation;

pub use presets::Profile;
pub use schema::{
    AlternateBaseConfig, ClientConfig, CorsConfig, GatewayConfig, ListenerConfig, LogFormat,
    MarketplaceConfig, ObservabilityConfig, RouteConfig, TlsConfig, UpstreamConfig,
};

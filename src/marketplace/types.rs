//! Request and response bodies of the marketplace endpoints.

use serde::{Deserialize, Serialize};

/// Sandbox selector. Accepts `true`/`false` or the strings `"true"`/`"false"`.
///
/// Any string other than `"true"` (case-insensitive) selects production.
/// Absent means sandbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "SandboxRepr")]
pub struct SandboxFlag(pub bool);

impl Default for SandboxFlag {
    fn default() -> Self {
        SandboxFlag(true)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SandboxRepr {
    Flag(bool),
    Text(String),
}

impl From<SandboxRepr> for SandboxFlag {
    fn from(repr: SandboxRepr) -> Self {
        match repr {
            SandboxRepr::Flag(flag) => SandboxFlag(flag),
            SandboxRepr::Text(text) => SandboxFlag(text.trim().eq_ignore_ascii_case("true")),
        }
    }
}

/// `POST /ebay/oauth/token`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub sandbox: SandboxFlag,
}

/// `GET|POST /ebay/buy/browse/item_summary/search`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub access_token: String,
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub sandbox: SandboxFlag,
}

/// `POST /ebay/sell/inventory/item`
#[derive(Debug, Clone, Deserialize)]
pub struct ListingRequest {
    pub access_token: String,
    #[serde(default)]
    pub sandbox: SandboxFlag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingResponse {
    pub success: bool,
    pub message: String,
    pub sandbox: bool,
}

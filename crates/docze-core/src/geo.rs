//! Ambient location lookup.
//!
//! Location is best-effort context for the prompt footer. A failed lookup is
//! never an error for the caller: it becomes [`LocationInfo::Unavailable`].

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Result of a location lookup, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationInfo {
    /// Ordered `(label, value)` pairs, e.g. `("City", "Chennai")`.
    Known(Vec<(String, String)>),
    /// The lookup failed; carries the error text.
    Unavailable(String),
}

/// Source of ambient location information.
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn locate(&self) -> Result<Vec<(String, String)>>;
}

/// Run a lookup and fold any failure into [`LocationInfo::Unavailable`].
pub async fn locate_or_unavailable(locator: &dyn Geolocator) -> LocationInfo {
    match locator.locate().await {
        Ok(fields) => LocationInfo::Known(fields),
        Err(e) => {
            tracing::warn!(error = %e, "location lookup failed");
            LocationInfo::Unavailable(e.to_string())
        }
    }
}

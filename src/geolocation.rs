//! Ambient location lookup via ip-api.com.
//!
//! The engine treats location as best-effort: any error here becomes a
//! placeholder in the prompt footer.

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::debug;

use docze_core::geo::Geolocator;

use crate::config::GeolocationConfig;
use crate::http;

/// `(label, response field)` in display order.
const FIELDS: &[(&str, &str)] = &[
    ("Country", "country"),
    ("Region", "regionName"),
    ("City", "city"),
    ("Latitude", "lat"),
    ("Longitude", "lon"),
    ("ISP", "isp"),
    ("IP Address", "query"),
];

const NOT_AVAILABLE: &str = "not available";

/// Looks up the machine's public IP location.
pub struct IpApiLocator {
    url: String,
    client: reqwest::Client,
}

impl IpApiLocator {
    pub fn new(config: &GeolocationConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.clone(),
            client: http::client(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Geolocator for IpApiLocator {
    async fn locate(&self) -> Result<Vec<(String, String)>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            bail!("location lookup returned {}", status);
        }
        let json: serde_json::Value = response.json().await?;
        let fields = parse_ip_api_response(&json)?;
        debug!(fields = fields.len(), "location resolved");
        Ok(fields)
    }
}

/// Map an ip-api.com JSON body to ordered `(label, value)` pairs.
///
/// A body with `"status": "fail"` is an error; absent fields read
/// `not available`.
pub fn parse_ip_api_response(json: &serde_json::Value) -> Result<Vec<(String, String)>> {
    if json.get("status").and_then(|s| s.as_str()) == Some("fail") {
        let reason = json
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown reason");
        bail!("location lookup failed: {}", reason);
    }

    Ok(FIELDS
        .iter()
        .map(|(label, key)| {
            let value = match json.get(*key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                Some(serde_json::Value::Number(n)) => n.to_string(),
                _ => NOT_AVAILABLE.to_string(),
            };
            (label.to_string(), value)
        })
        .collect())
}

/// Always fails. Used when `geolocation.enabled = false`.
pub struct DisabledLocator;

#[async_trait]
impl Geolocator for DisabledLocator {
    async fn locate(&self) -> Result<Vec<(String, String)>> {
        bail!("geolocation disabled")
    }
}

pub fn create_locator(config: &GeolocationConfig) -> Result<Box<dyn Geolocator>> {
    if config.enabled {
        Ok(Box::new(IpApiLocator::new(config)?))
    } else {
        Ok(Box::new(DisabledLocator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_maps_fields_in_order() {
        let body = json!({
            "status": "success",
            "country": "India",
            "regionName": "Tamil Nadu",
            "city": "Chennai",
            "lat": 13.0827,
            "lon": 80.2707,
            "isp": "Example ISP",
            "query": "203.0.113.7"
        });
        let fields = parse_ip_api_response(&body).unwrap();
        let labels: Vec<&str> = fields.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Country", "Region", "City", "Latitude", "Longitude", "ISP", "IP Address"]
        );
        assert_eq!(fields[2].1, "Chennai");
        assert_eq!(fields[3].1, "13.0827");
        assert_eq!(fields[6].1, "203.0.113.7");
    }

    #[test]
    fn test_missing_fields_not_available() {
        let fields = parse_ip_api_response(&json!({"country": "Peru"})).unwrap();
        assert_eq!(fields[0].1, "Peru");
        assert_eq!(fields[2].1, NOT_AVAILABLE);
    }

    #[test]
    fn test_fail_status_is_error() {
        let body = json!({"status": "fail", "message": "reserved range"});
        let err = parse_ip_api_response(&body).unwrap_err();
        assert!(err.to_string().contains("reserved range"));
    }

    #[tokio::test]
    async fn test_disabled_locator() {
        let config = GeolocationConfig {
            enabled: false,
            ..GeolocationConfig::default()
        };
        let locator = create_locator(&config).unwrap();
        assert!(locator.locate().await.is_err());
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::net::IpAddr;
use std::time::Duration;

/// Syntactic check only. Callers gate geolocation lookups on this.
pub fn is_valid_ip(s: &str) -> bool {
    s.parse::<IpAddr>().is_ok()
}

#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn geolocate(&self, ip: &str) -> Result<Value>;
}

const IPINFO_BASE: &str = "https://ipinfo.io";

pub struct IpinfoClient {
    http_client: reqwest::Client,
    base_url: String,
    token: String,
}

impl IpinfoClient {
    pub fn new(token: String) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: IPINFO_BASE.to_string(),
            token,
        }
    }
}

#[async_trait]
impl GeoLocator for IpinfoClient {
    async fn geolocate(&self, ip: &str) -> Result<Value> {
        let url = format!("{}/{}?token={}", self.base_url, ip, self.token);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .context("Geolocation request failed")?
            .error_for_status()
            .context("Geolocation service returned an error status")?;

        let mut body: Value = response
            .json()
            .await
            .context("Geolocation response was not valid JSON")?;
        augment_coordinates(&mut body);
        Ok(body)
    }
}

/// Split a combined `"lat,lon"` `loc` field into separate string fields.
/// Anything other than exactly two numeric components leaves the body
/// untouched; callers must treat the coordinates as optional.
pub fn augment_coordinates(body: &mut Value) {
    let Some(loc) = body.get("loc").and_then(Value::as_str).map(str::to_owned) else {
        return;
    };
    let parts: Vec<&str> = loc.split(',').collect();
    if parts.len() != 2 || parts.iter().any(|p| p.trim().parse::<f64>().is_err()) {
        return;
    }
    if let Some(object) = body.as_object_mut() {
        object.insert("latitude".into(), Value::String(parts[0].trim().to_string()));
        object.insert("longitude".into(), Value::String(parts[1].trim().to_string()));
    }
}

pub fn coordinates(body: &Value) -> Option<(String, String)> {
    let latitude = body.get("latitude")?.as_str()?.to_string();
    let longitude = body.get("longitude")?.as_str()?.to_string();
    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_ipv4_and_ipv6_literals() {
        assert!(is_valid_ip("8.8.8.8"));
        assert!(is_valid_ip("1.1.1.1"));
        assert!(is_valid_ip("::1"));
        assert!(is_valid_ip("2001:db8::1"));
    }

    #[test]
    fn rejects_everything_else() {
        assert!(!is_valid_ip("999.1.1.1"));
        assert!(!is_valid_ip("not-an-ip"));
        assert!(!is_valid_ip("8.8.8"));
        assert!(!is_valid_ip("8.8.8.8.8"));
        assert!(!is_valid_ip(""));
        assert!(!is_valid_ip("example.com"));
    }

    #[test]
    fn splits_a_well_formed_loc_field() {
        let mut body = json!({ "ip": "8.8.8.8", "loc": "37.4056,-122.0775" });
        augment_coordinates(&mut body);
        assert_eq!(body["latitude"], "37.4056");
        assert_eq!(body["longitude"], "-122.0775");
        // original field stays in place
        assert_eq!(body["loc"], "37.4056,-122.0775");
    }

    #[test]
    fn leaves_the_body_alone_without_loc() {
        let mut body = json!({ "ip": "8.8.8.8", "bogon": true });
        augment_coordinates(&mut body);
        assert!(body.get("latitude").is_none());
        assert!(body.get("longitude").is_none());
    }

    #[test]
    fn leaves_the_body_alone_on_malformed_loc() {
        for loc in ["garbage", "1,2,3", "37.4056", "north,south", ""] {
            let mut body = json!({ "loc": loc });
            augment_coordinates(&mut body);
            assert!(body.get("latitude").is_none(), "loc = {:?}", loc);
        }
    }

    #[test]
    fn coordinates_extracts_augmented_fields() {
        let mut body = json!({ "loc": "51.5074,-0.1278" });
        augment_coordinates(&mut body);
        assert_eq!(
            coordinates(&body),
            Some(("51.5074".to_string(), "-0.1278".to_string()))
        );
        assert_eq!(coordinates(&json!({ "ip": "8.8.8.8" })), None);
    }
}

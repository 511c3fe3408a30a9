//! Outbound geolocation providers
//!
//! Each provider wraps one vendor HTTP API and normalizes its payload into
//! a [`GeoRecord`], defaulting absent fields to the sentinel values. The
//! resolver treats any error here as "try the next provider".

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::geo::models::{GeoRecord, DEFAULT_TIMEZONE, UNKNOWN, UNKNOWN_COUNTRY_CODE};

const USER_AGENT: &str = "MDMC-SmartLinks/1.0";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
    #[error("provider rejected lookup: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait GeoProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, ip: &str) -> Result<GeoRecord, ProviderError>;
}

fn or_unknown(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => UNKNOWN.to_string(),
    }
}

/// Primary provider: `GET {base}/{ip}/json/` (ipapi.co payload shape).
pub struct IpapiProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct IpapiPayload {
    country_name: Option<String>,
    region: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
    timezone: Option<String>,
    ip: Option<String>,
}

impl IpapiPayload {
    fn into_record(self, ip: &str) -> GeoRecord {
        GeoRecord {
            country: or_unknown(self.country_name),
            region: or_unknown(self.region),
            city: or_unknown(self.city),
            country_code: self
                .country_code
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| UNKNOWN_COUNTRY_CODE.to_string()),
            timezone: self
                .timezone
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            ip: self.ip.filter(|i| !i.is_empty()).unwrap_or_else(|| ip.to_string()),
        }
    }
}

impl IpapiProvider {
    pub fn new(client: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl GeoProvider for IpapiProvider {
    fn name(&self) -> &str {
        "ipapi"
    }

    async fn fetch(&self, ip: &str) -> Result<GeoRecord, ProviderError> {
        let url = format!("{}/{}/json/", self.base_url.trim_end_matches('/'), ip);
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let payload: IpapiPayload = response.json().await?;
        Ok(payload.into_record(ip))
    }
}

/// Fallback provider: `GET {base}/json/{ip}` (ip-api.com payload shape).
pub struct IpApiComProvider {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct IpApiComPayload {
    status: Option<String>,
    message: Option<String>,
    country: Option<String>,
    #[serde(rename = "regionName")]
    region_name: Option<String>,
    city: Option<String>,
    #[serde(rename = "countryCode")]
    country_code: Option<String>,
    timezone: Option<String>,
    query: Option<String>,
}

impl IpApiComPayload {
    fn into_record(self, ip: &str) -> GeoRecord {
        GeoRecord {
            country: or_unknown(self.country),
            region: or_unknown(self.region_name),
            city: or_unknown(self.city),
            country_code: self
                .country_code
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| UNKNOWN_COUNTRY_CODE.to_string()),
            timezone: self
                .timezone
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            ip: self.query.filter(|q| !q.is_empty()).unwrap_or_else(|| ip.to_string()),
        }
    }
}

impl IpApiComProvider {
    pub fn new(client: reqwest::Client, base_url: String, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }
}

#[async_trait]
impl GeoProvider for IpApiComProvider {
    fn name(&self) -> &str {
        "ip-api"
    }

    async fn fetch(&self, ip: &str) -> Result<GeoRecord, ProviderError> {
        let url = format!("{}/json/{}", self.base_url.trim_end_matches('/'), ip);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status()));
        }

        let payload: IpApiComPayload = response.json().await?;

        // ip-api answers 200 with status "fail" for reserved or bogus IPs.
        if payload.status.as_deref() != Some("success") {
            let reason = payload
                .message
                .unwrap_or_else(|| "status was not success".to_string());
            return Err(ProviderError::Rejected(reason));
        }

        Ok(payload.into_record(ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipapi_payload_normalization() {
        let payload: IpapiPayload = serde_json::from_str(
            r#"{
                "country_name": "France",
                "region": "Île-de-France",
                "city": "Paris",
                "country_code": "FR",
                "timezone": "Europe/Paris",
                "ip": "203.0.113.9"
            }"#,
        )
        .unwrap();

        let record = payload.into_record("203.0.113.9");
        assert_eq!(record.country, "France");
        assert_eq!(record.country_code, "FR");
        assert_eq!(record.timezone, "Europe/Paris");
    }

    #[test]
    fn test_ipapi_payload_defaults_missing_fields() {
        let payload: IpapiPayload = serde_json::from_str(r#"{"city": ""}"#).unwrap();
        let record = payload.into_record("203.0.113.9");
        assert_eq!(record.country, "Unknown");
        assert_eq!(record.region, "Unknown");
        assert_eq!(record.city, "Unknown");
        assert_eq!(record.country_code, "XX");
        assert_eq!(record.timezone, "UTC");
        assert_eq!(record.ip, "203.0.113.9");
    }

    #[test]
    fn test_ip_api_com_payload_normalization() {
        let payload: IpApiComPayload = serde_json::from_str(
            r#"{
                "status": "success",
                "country": "Canada",
                "regionName": "Quebec",
                "city": "Montreal",
                "countryCode": "CA",
                "timezone": "America/Toronto",
                "query": "203.0.113.9"
            }"#,
        )
        .unwrap();

        assert_eq!(payload.status.as_deref(), Some("success"));
        let record = payload.into_record("203.0.113.9");
        assert_eq!(record.region, "Quebec");
        assert_eq!(record.country_code, "CA");
        assert_eq!(record.ip, "203.0.113.9");
    }

    #[test]
    fn test_ip_api_com_fail_status_detected() {
        let payload: IpApiComPayload =
            serde_json::from_str(r#"{"status": "fail", "message": "reserved range", "query": "192.168.1.1"}"#)
                .unwrap();
        assert_ne!(payload.status.as_deref(), Some("success"));
    }
}

use serde::{Deserialize, Serialize};

/// Sentinel values used whenever a field cannot be resolved. Geo records
/// never carry absent fields; consumers can rely on every field being a
/// string.
pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_COUNTRY_CODE: &str = "XX";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Geographic location derived from a client IP. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoRecord {
    pub country: String,
    pub region: String,
    pub city: String,
    /// ISO 3166-1 alpha-2, or "XX" when unresolved.
    pub country_code: String,
    /// IANA timezone name, or "UTC" when unresolved.
    pub timezone: String,
    pub ip: String,
}

impl GeoRecord {
    /// The record returned when no real geolocation data is obtainable.
    pub fn unknown(ip: &str) -> Self {
        Self {
            country: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            city: UNKNOWN.to_string(),
            country_code: UNKNOWN_COUNTRY_CODE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            ip: ip.to_string(),
        }
    }
}

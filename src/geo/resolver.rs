//! Geolocation resolution with cache and fallback chain
//!
//! `resolve` is total: whatever the input or the state of the upstream
//! providers, the caller always gets back a fully-populated record. All
//! provider failures are absorbed here and logged as warnings.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::GeoConfig;
use crate::geo::cache::GeoCache;
use crate::geo::ip::is_private_ip;
use crate::geo::models::GeoRecord;
use crate::geo::provider::{GeoProvider, IpApiComProvider, IpapiProvider};

pub struct GeoResolver {
    cache: GeoCache,
    providers: Vec<Box<dyn GeoProvider>>,
}

impl GeoResolver {
    pub fn new(cache: GeoCache, providers: Vec<Box<dyn GeoProvider>>) -> Self {
        Self { cache, providers }
    }

    /// Build the production resolver: ipapi.co primary, ip-api.com fallback.
    pub fn from_config(config: &GeoConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().build()?;

        let providers: Vec<Box<dyn GeoProvider>> = vec![
            Box::new(IpapiProvider::new(
                client.clone(),
                config.primary_url.clone(),
                Duration::from_millis(config.primary_timeout_ms),
            )),
            Box::new(IpApiComProvider::new(
                client,
                config.fallback_url.clone(),
                Duration::from_millis(config.fallback_timeout_ms),
            )),
        ];

        let cache = GeoCache::new(
            Duration::from_secs(config.cache_ttl_secs),
            config.cache_max_entries,
        );

        Ok(Self::new(cache, providers))
    }

    /// Resolve `ip` to a geographic record. Never fails.
    ///
    /// Private, loopback, and syntactically invalid addresses short-circuit
    /// to the sentinel record without touching the network or the cache.
    /// Otherwise the cache is consulted, then each provider in order; if
    /// every provider fails the sentinel is returned AND cached, so a
    /// persistently-unresolvable address costs one provider round per TTL
    /// window instead of hammering the chain on every click.
    pub async fn resolve(&self, ip: &str) -> GeoRecord {
        let parsed: Option<IpAddr> = ip.parse().ok();
        let routable = matches!(parsed, Some(addr) if !is_private_ip(addr));
        if !routable {
            return GeoRecord::unknown(ip);
        }

        if let Some(hit) = self.cache.get(ip) {
            return hit;
        }

        for provider in &self.providers {
            match provider.fetch(ip).await {
                Ok(record) => {
                    self.cache.insert(ip.to_string(), record.clone());
                    return record;
                }
                Err(err) => {
                    warn!(provider = provider.name(), %ip, error = %err, "geolocation provider failed");
                }
            }
        }

        let sentinel = GeoRecord::unknown(ip);
        self.cache.insert(ip.to_string(), sentinel.clone());
        sentinel
    }
}

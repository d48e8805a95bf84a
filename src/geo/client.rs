//! HTTP geolocation client
//!
//! Every request carries the configured timeout. Fallback lists are data:
//! the order of `self_ip_urls` and `geocoders` in the configuration is the
//! order providers are tried in.

use crate::config::{GeocoderInfo, ProviderConfig};
use crate::error::{GeoError, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::net::IpAddr;

use super::traits::{ADDRESS_LOOKUP_FAILED, GeoBackend};
use super::types::{GeoRecord, GeocodeResponse, IpInfoResponse, SelfAddressResponse};

/// Geolocation client backed by HTTP providers
pub struct GeoClient {
    client: reqwest::Client,
    providers: ProviderConfig,
}

impl GeoClient {
    /// Create a new client from provider configuration
    pub fn new(providers: ProviderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(format!("ipscope-rs/{}", env!("CARGO_PKG_VERSION")))
            .timeout(providers.timeout())
            .build()
            .map_err(|e| GeoError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, providers })
    }

    pub fn providers(&self) -> &ProviderConfig {
        &self.providers
    }

    /// Send a request and decode a 2xx JSON body
    async fn fetch_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::HttpError(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GeoError::network(format!("Failed to decode response: {}", e)))
    }

    /// Build the address-lookup URL
    ///
    /// `{base}/{address}/json`, or `{base}/json` for the caller's own address.
    pub fn lookup_url(&self, address: &str) -> Result<Url> {
        let mut url = Url::parse(&self.providers.lookup_base_url)
            .map_err(|e| GeoError::config(format!("Invalid lookup_base_url: {}", e)))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GeoError::config("lookup_base_url cannot be used as a base"))?;
            segments.pop_if_empty();
            if !address.is_empty() {
                segments.push(address);
            }
            segments.push("json");
        }
        Ok(url)
    }

    /// Ask one self-address provider
    async fn fetch_own_address(&self, url: &str) -> Result<String> {
        let body: SelfAddressResponse = self.fetch_json(self.client.get(url)).await?;

        let ip = body
            .ip
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty())
            .ok_or_else(|| GeoError::network("response has no ip field"))?;

        ip.parse::<IpAddr>()
            .map_err(|_| GeoError::network(format!("response ip is not an address: {}", ip)))?;

        Ok(ip)
    }

    /// Ask one reverse-geocoding provider
    ///
    /// `q` goes out form-encoded as `lat+lon`.
    async fn fetch_place(&self, geocoder: &GeocoderInfo, latitude: f64, longitude: f64) -> Result<Option<String>> {
        let mut request = self
            .client
            .get(&geocoder.url)
            .query(&[("q", format!("{} {}", latitude, longitude))]);
        if let Some(ref key) = geocoder.key {
            request = request.query(&[("key", key)]);
        }

        let body: GeocodeResponse = self.fetch_json(request).await?;
        Ok(body.first_formatted())
    }
}

#[async_trait]
impl GeoBackend for GeoClient {
    async fn discover_own_address(&self) -> Result<String> {
        for url in &self.providers.self_ip_urls {
            match self.fetch_own_address(url).await {
                Ok(ip) => {
                    log::info!("Detected own address {} via {}", ip, url);
                    return Ok(ip);
                }
                Err(e) => {
                    log::warn!("Service {} failed: {}", url, e);
                }
            }
        }

        Err(GeoError::AllProvidersExhausted)
    }

    async fn lookup(&self, address: &str) -> Result<GeoRecord> {
        let address = address.trim();
        let url = self.lookup_url(address)?;
        log::debug!("Fetching from URL: {}", url);

        let mut request = self.client.get(url);
        if let Some(ref token) = self.providers.lookup_token {
            request = request.query(&[("token", token)]);
        }

        let response: IpInfoResponse = self.fetch_json(request).await?;
        Ok(GeoRecord::from_ipinfo(address, response))
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String {
        for geocoder in &self.providers.geocoders {
            match self.fetch_place(geocoder, latitude, longitude).await {
                Ok(Some(place)) => return place,
                Ok(None) => {
                    log::warn!("Geocoder {} returned no results for {},{}", geocoder.name, latitude, longitude);
                }
                Err(e) => {
                    log::warn!("Geocoder {} failed: {}", geocoder.name, e);
                }
            }
        }

        ADDRESS_LOOKUP_FAILED.to_string()
    }

    fn name(&self) -> &str {
        "http"
    }
}

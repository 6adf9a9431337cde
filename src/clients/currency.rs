//! Currency conversion and currency resolution
//!
//! Prices come from the search results in USD. They are converted to the
//! user's currency unless it is the base reporting currency.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::BotError;
use crate::user_store::DEFAULT_CURRENCY;

/// Currency amounts are reported in when no conversion applies
pub const BASE_CURRENCY: &str = DEFAULT_CURRENCY;

/// Currency prices are quoted in before conversion
pub const SOURCE_CURRENCY: &str = "USD";

const COUNTRY_CURRENCIES: &[(&str, &str)] = &[
    ("US", "USD"),
    ("IN", "INR"),
    ("GB", "GBP"),
    ("FR", "EUR"),
    ("JP", "JPY"),
    ("CA", "CAD"),
    ("AU", "AUD"),
];

const TIMEZONE_CURRENCIES: &[(&str, &str)] = &[
    ("America/New_York", "USD"),
    ("Asia/Kolkata", "INR"),
    ("Europe/London", "GBP"),
    ("Europe/Paris", "EUR"),
    ("Asia/Tokyo", "JPY"),
];

/// Currency for an ISO 3166 country code; unknown codes map to INR
pub fn currency_from_country_code(code: &str) -> &'static str {
    let code = code.trim();
    COUNTRY_CURRENCIES
        .iter()
        .find(|(country, _)| country.eq_ignore_ascii_case(code))
        .map(|(_, currency)| *currency)
        .unwrap_or(DEFAULT_CURRENCY)
}

/// Currency for an IANA timezone name; unknown zones map to INR
pub fn currency_from_timezone(timezone: &str) -> &'static str {
    TIMEZONE_CURRENCIES
        .iter()
        .find(|(zone, _)| *zone == timezone)
        .map(|(_, currency)| *currency)
        .unwrap_or(DEFAULT_CURRENCY)
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

#[derive(Debug, Deserialize)]
struct ConversionResponse {
    result: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ReverseGeocode {
    address: Option<GeocodeAddress>,
}

#[derive(Debug, Deserialize)]
struct GeocodeAddress {
    country_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CurrencyClient {
    http: reqwest::Client,
    currency_url: String,
    geocode_url: String,
}

impl CurrencyClient {
    pub fn new(http: reqwest::Client, currency_url: &str, geocode_url: &str) -> Self {
        Self {
            http,
            currency_url: currency_url.to_string(),
            geocode_url: geocode_url.to_string(),
        }
    }

    /// Convert a USD amount into `target`
    ///
    /// Returns the amount unchanged when `target` is absent or the base
    /// currency, and on any upstream failure.
    pub async fn convert(&self, amount_usd: f64, target: Option<&str>) -> f64 {
        let target = match target {
            Some(target) if !target.eq_ignore_ascii_case(BASE_CURRENCY) => target,
            _ => return amount_usd,
        };

        match self.fetch_conversion(amount_usd, target).await {
            Ok(converted) => round_cents(converted),
            Err(e) => {
                warn!(target = %target, error = %e, "Currency conversion failed, keeping USD amount");
                amount_usd
            }
        }
    }

    async fn fetch_conversion(&self, amount_usd: f64, target: &str) -> Result<f64, BotError> {
        let response: ConversionResponse = self
            .http
            .get(&self.currency_url)
            .query(&[
                ("from", SOURCE_CURRENCY.to_string()),
                ("to", target.to_string()),
                ("amount", amount_usd.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .result
            .ok_or_else(|| BotError::Upstream("conversion response has no result".to_string()))
    }

    /// Currency of the country containing the given point; INR on any failure
    pub async fn currency_from_location(&self, latitude: f64, longitude: f64) -> String {
        match self.reverse_geocode(latitude, longitude).await {
            Ok(country_code) => {
                let currency = currency_from_country_code(&country_code);
                debug!(country_code = %country_code, currency = %currency, "Location resolved");
                currency.to_string()
            }
            Err(e) => {
                warn!(error = %e, "Reverse geocoding failed, using default currency");
                DEFAULT_CURRENCY.to_string()
            }
        }
    }

    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<String, BotError> {
        let response: ReverseGeocode = self
            .http
            .get(&self.geocode_url)
            .query(&[
                ("format", "json".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .address
            .and_then(|address| address.country_code)
            .map(|code| code.to_ascii_uppercase())
            .ok_or_else(|| BotError::Upstream("geocoding response has no country code".to_string()))
    }
}

//! # Product Search Module
//!
//! Turns instant-answer results into product suggestions. The price signal
//! is naive: the first `$<number>` in an entry's text, or a placeholder.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

use crate::clients::{CurrencyClient, RelatedTopic, SearchClient};

/// Number of search entries considered per product query
pub const PRODUCT_RESULTS: usize = 5;

/// USD price used when an entry mentions none
pub const PLACEHOLDER_PRICE_USD: f64 = 100.0;

/// Categories offered on the keyboard
pub const CATEGORIES: [&str; 4] = ["Electronics", "Fashion", "Books", "Home"];

lazy_static! {
    static ref PRICE_REGEX: Regex =
        Regex::new(r"\$\s?(\d[\d,]*(?:\.\d+)?)").expect("Price pattern should be valid");
    static ref PRODUCT_QUERY_REGEX: Regex =
        Regex::new(r"(?i)buy|price|inr|usd").expect("Product query pattern should be valid");
}

/// A product suggestion with its price in the user's currency
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub title: String,
    pub url: Option<String>,
    pub description: String,
    pub price: f64,
    pub currency: String,
}

/// Whether `text` is exactly one of the category names
pub fn is_category(text: &str) -> bool {
    CATEGORIES.contains(&text)
}

/// Whether `text` looks like a shopping question
pub fn is_product_query(text: &str) -> bool {
    PRODUCT_QUERY_REGEX.is_match(text)
}

/// First `$<number>` in the text, in USD
pub fn extract_price(text: &str) -> Option<f64> {
    PRICE_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|amount| amount.as_str().replace(',', "").parse().ok())
}

/// Title shown for an entry: the text before the first " - " separator
fn title_of(text: &str) -> String {
    text.split(" - ")
        .next()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .unwrap_or(text)
        .to_string()
}

/// Search for products and price them in `currency`
///
/// Never fails: a search error yields an empty list.
pub async fn search_products(
    search: &SearchClient,
    currency_client: &CurrencyClient,
    query: &str,
    currency: &str,
) -> Vec<Product> {
    let topics = match search.related(query, PRODUCT_RESULTS).await {
        Ok(topics) => topics,
        Err(e) => {
            warn!(query = %query, error = %e, "Product search failed");
            return Vec::new();
        }
    };

    let mut products = Vec::with_capacity(topics.len());
    for topic in topics {
        let product = price_product(currency_client, topic, currency).await;
        products.push(product);
    }

    debug!(query = %query, products = products.len(), currency = %currency, "Products priced");
    products
}

async fn price_product(
    currency_client: &CurrencyClient,
    topic: RelatedTopic,
    currency: &str,
) -> Product {
    let text = topic.summary().unwrap_or_default().to_string();
    let price_usd = extract_price(&text).unwrap_or(PLACEHOLDER_PRICE_USD);
    let price = currency_client.convert(price_usd, Some(currency)).await;

    Product {
        title: title_of(&text),
        url: topic.first_url,
        description: text,
        price,
        currency: currency.to_string(),
    }
}

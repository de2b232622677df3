//! Hover enrichment lookups against external balance and attribution endpoints.
//!
//! Endpoints are URL templates with an `{address}` placeholder. The two
//! lookups are independent: either may fail, and a failure only marks its own
//! field unavailable. Requests go through gloo-net in the browser; native
//! builds report every lookup as unsupported.

use serde::Deserialize;

use super::error::EnrichmentError;
use super::interaction::{Attribution, Balance};

/// Enrichment endpoints. A missing template disables that lookup.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
	/// e.g. `/api/contracts/{address}/balance`
	pub balance_url: Option<String>,
	/// e.g. `/api/contracts/{address}/attribution`
	pub attribution_url: Option<String>,
}

impl EnrichmentConfig {
	/// Balance URL for `address`.
	pub fn balance_url_for(&self, address: &str) -> Result<String, EnrichmentError> {
		expand(self.balance_url.as_deref(), address)
	}

	/// Attribution URL for `address`.
	pub fn attribution_url_for(&self, address: &str) -> Result<String, EnrichmentError> {
		expand(self.attribution_url.as_deref(), address)
	}
}

fn expand(template: Option<&str>, address: &str) -> Result<String, EnrichmentError> {
	let template = template
		.filter(|t| !t.trim().is_empty())
		.ok_or(EnrichmentError::NotConfigured)?;
	Ok(template.replace("{address}", address))
}

/// Look up the native balance of `address`.
pub async fn fetch_balance(
	config: &EnrichmentConfig,
	address: &str,
) -> Result<Balance, EnrichmentError> {
	let url = config.balance_url_for(address)?;
	get_json(&url).await
}

/// Look up who `address` is attributed to.
pub async fn fetch_attribution(
	config: &EnrichmentConfig,
	address: &str,
) -> Result<Attribution, EnrichmentError> {
	let url = config.attribution_url_for(address)?;
	get_json(&url).await
}

#[cfg(target_arch = "wasm32")]
async fn get_json<T: serde::de::DeserializeOwned>(url: &str) -> Result<T, EnrichmentError> {
	use gloo_net::http::Request;

	let resp = Request::get(url)
		.send()
		.await
		.map_err(|e| EnrichmentError::Network(e.to_string()))?;

	if !resp.ok() {
		return Err(EnrichmentError::Http {
			status: resp.status(),
		});
	}

	resp.json()
		.await
		.map_err(|e| EnrichmentError::Decode(e.to_string()))
}

#[cfg(not(target_arch = "wasm32"))]
async fn get_json<T: serde::de::DeserializeOwned>(_url: &str) -> Result<T, EnrichmentError> {
	Err(EnrichmentError::Unsupported)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn templates_expand_address() {
		let config = EnrichmentConfig {
			balance_url: Some("/api/{address}/balance".into()),
			attribution_url: None,
		};
		assert_eq!(
			config.balance_url_for("0xabc"),
			Ok("/api/0xabc/balance".to_string())
		);
		assert_eq!(
			config.attribution_url_for("0xabc"),
			Err(EnrichmentError::NotConfigured)
		);
	}

	#[test]
	fn blank_template_counts_as_missing() {
		let config = EnrichmentConfig {
			balance_url: Some("  ".into()),
			attribution_url: None,
		};
		assert_eq!(
			config.balance_url_for("0xabc"),
			Err(EnrichmentError::NotConfigured)
		);
	}

	#[test]
	fn balance_response_shape() {
		let balance: Balance = serde_json::from_str(r#"{"balance":"12.5","symbol":"ETH"}"#).unwrap();
		assert_eq!(balance.symbol.as_deref(), Some("ETH"));
		let attribution: Attribution = serde_json::from_str(r#"{"name":"Uniswap V3: Router"}"#).unwrap();
		assert!(!attribution.verified);
	}
}

//! Error types for payload intake, configuration and enrichment lookups.

use thiserror::Error;

/// A graph payload that cannot be turned into a model.
///
/// Raised before anything is built, so a malformed payload never renders partially.
#[derive(Debug, Error)]
pub enum PayloadError {
	/// Input is not valid JSON for a payload.
	#[error("graph payload is not valid JSON: {0}")]
	Parse(#[from] serde_json::Error),
	/// The subject address is blank.
	#[error("graph payload has no subject address")]
	MissingAddress,
	/// An edge has a blank source or target.
	#[error("edge {index} has an empty {endpoint} address")]
	EmptyEndpoint { index: usize, endpoint: &'static str },
	/// An edge carries no interaction kinds.
	#[error("edge {index} ({edge}) lists no interaction kinds")]
	NoInteractions { index: usize, edge: String },
	/// An interaction kind has a zero count.
	#[error("edge {index} reports a zero count for interaction kind `{kind}`")]
	ZeroCount { index: usize, kind: String },
	/// `from_block` is after `to_block`.
	#[error("block range is inverted: from {from} is after to {to}")]
	InvertedBlockRange { from: u64, to: u64 },
}

/// Invalid engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Input is not valid JSON for a config.
	#[error("graph config is not valid JSON: {0}")]
	Parse(#[from] serde_json::Error),
	/// Zoom bounds are empty or non-positive.
	#[error("zoom bounds are invalid: min {min} must be positive and below max {max}")]
	ZoomBounds { min: f64, max: f64 },
	/// A size or duration is zero or negative.
	#[error("`{field}` must be positive, got {value}")]
	NonPositive { field: &'static str, value: f64 },
	/// A factor lies outside its allowed range.
	#[error("`{field}` must be in {range}, got {value}")]
	OutOfRange {
		field: &'static str,
		value: f64,
		range: &'static str,
	},
}

/// A failed hover enrichment lookup. Rendered as "unavailable" for that field only.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum EnrichmentError {
	/// No URL template for this lookup.
	#[error("no endpoint configured")]
	NotConfigured,
	/// The request did not complete.
	#[error("network error: {0}")]
	Network(String),
	/// The endpoint answered with a non-success status.
	#[error("HTTP {status}")]
	Http { status: u16 },
	/// The response body did not decode.
	#[error("unexpected response: {0}")]
	Decode(String),
	/// Lookups need a browser.
	#[error("lookups are only available in the browser")]
	Unsupported,
}

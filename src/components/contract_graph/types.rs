//! Graph payload structures received from the dependency analysis layer.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::PayloadError;

/// Observed interactions from one contract to another.
#[derive(Clone, Debug, Deserialize, Hash, PartialEq, Eq)]
pub struct RawEdge {
	/// Calling contract address.
	pub source: String,
	/// Called contract address.
	pub target: String,
	/// Interaction kind (e.g. "call", "delegatecall") mapped to its observation count.
	pub types: BTreeMap<String, u64>,
}

/// A complete dependency graph snapshot for one subject contract.
#[derive(Clone, Debug, Deserialize, Hash, PartialEq, Eq)]
pub struct GraphPayload {
	/// The subject contract the graph is centered on.
	pub address: String,
	/// Observed interactions, one entry per (source, target) pair.
	pub edges: Vec<RawEdge>,
	/// Optional display names keyed by address (any casing).
	#[serde(default)]
	pub nodes: BTreeMap<String, String>,
	/// First block of the observation window.
	#[serde(default, alias = "fromBlock")]
	pub from_block: Option<u64>,
	/// Last block of the observation window.
	#[serde(default, alias = "toBlock")]
	pub to_block: Option<u64>,
}

impl GraphPayload {
	/// Parse and validate a payload from JSON.
	pub fn from_json(json: &str) -> Result<Self, PayloadError> {
		let payload: Self = serde_json::from_str(json)?;
		payload.validate()?;
		Ok(payload)
	}

	/// Check the structural invariants the model builder relies on.
	pub fn validate(&self) -> Result<(), PayloadError> {
		if self.address.trim().is_empty() {
			return Err(PayloadError::MissingAddress);
		}
		if let (Some(from), Some(to)) = (self.from_block, self.to_block) {
			if from > to {
				return Err(PayloadError::InvertedBlockRange { from, to });
			}
		}
		for (index, edge) in self.edges.iter().enumerate() {
			if edge.source.trim().is_empty() {
				return Err(PayloadError::EmptyEndpoint {
					index,
					endpoint: "source",
				});
			}
			if edge.target.trim().is_empty() {
				return Err(PayloadError::EmptyEndpoint {
					index,
					endpoint: "target",
				});
			}
			if edge.types.is_empty() {
				return Err(PayloadError::NoInteractions {
					index,
					edge: format!("{} -> {}", edge.source, edge.target),
				});
			}
			if let Some((kind, _)) = edge.types.iter().find(|(_, count)| **count == 0) {
				return Err(PayloadError::ZeroCount {
					index,
					kind: kind.clone(),
				});
			}
		}
		Ok(())
	}

	/// True when the payload carries no dependencies at all.
	pub fn is_empty(&self) -> bool {
		self.edges.is_empty()
	}

	/// Display name for an address, matched case-insensitively.
	pub fn display_name(&self, address: &str) -> Option<&str> {
		self.nodes
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(address))
			.map(|(_, name)| name.as_str())
	}

	/// Human-readable block range, e.g. "blocks 100 to 200".
	pub fn range_label(&self) -> Option<String> {
		match (self.from_block, self.to_block) {
			(Some(from), Some(to)) => Some(format!("blocks {from} to {to}")),
			(Some(from), None) => Some(format!("blocks from {from}")),
			(None, Some(to)) => Some(format!("blocks up to {to}")),
			(None, None) => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_camel_case_block_range() {
		let payload = GraphPayload::from_json(
			r#"{"address":"0xAAA","edges":[],"fromBlock":10,"toBlock":20}"#,
		)
		.unwrap();
		assert_eq!(payload.from_block, Some(10));
		assert_eq!(payload.to_block, Some(20));
		assert_eq!(payload.range_label().as_deref(), Some("blocks 10 to 20"));
	}

	#[test]
	fn missing_edges_is_malformed() {
		let err = GraphPayload::from_json(r#"{"address":"0xAAA"}"#).unwrap_err();
		assert!(matches!(err, PayloadError::Parse(_)));
	}

	#[test]
	fn missing_address_is_malformed() {
		let err = GraphPayload::from_json(r#"{"edges":[]}"#).unwrap_err();
		assert!(matches!(err, PayloadError::Parse(_)));

		let err = GraphPayload::from_json(r#"{"address":"  ","edges":[]}"#).unwrap_err();
		assert!(matches!(err, PayloadError::MissingAddress));
	}

	#[test]
	fn rejects_zero_counts_and_empty_kinds() {
		let err = GraphPayload::from_json(
			r#"{"address":"0xA","edges":[{"source":"0xA","target":"0xB","types":{"call":0}}]}"#,
		)
		.unwrap_err();
		assert!(matches!(err, PayloadError::ZeroCount { index: 0, .. }));

		let err = GraphPayload::from_json(
			r#"{"address":"0xA","edges":[{"source":"0xA","target":"0xB","types":{}}]}"#,
		)
		.unwrap_err();
		assert!(matches!(err, PayloadError::NoInteractions { index: 0, .. }));
	}

	#[test]
	fn rejects_inverted_range() {
		let err = GraphPayload::from_json(
			r#"{"address":"0xA","edges":[],"from_block":5,"to_block":1}"#,
		)
		.unwrap_err();
		assert!(matches!(
			err,
			PayloadError::InvertedBlockRange { from: 5, to: 1 }
		));
	}

	#[test]
	fn display_name_ignores_case() {
		let payload = GraphPayload::from_json(
			r#"{"address":"0xA","edges":[],"nodes":{"0xAbC":"Router"}}"#,
		)
		.unwrap();
		assert_eq!(payload.display_name("0xabc"), Some("Router"));
		assert_eq!(payload.display_name("0xdef"), None);
	}
}

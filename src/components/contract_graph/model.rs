//! Graph model built from a payload: deduplicated contract nodes and typed links.
//!
//! Every interaction kind on a raw edge becomes its own [`Link`], so an edge
//! observed as both `call` and `staticcall` is drawn as two links sharing the
//! same endpoints. Nodes are keyed by lowercase address and keep the casing of
//! their first appearance for display.

use std::collections::HashMap;

use super::types::GraphPayload;

/// Whether a node is the subject contract or one of its dependencies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeGroup {
	/// The subject contract.
	Main,
	/// A dependency of the subject.
	Other,
}

/// Who currently decides a node's position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PositionOwner {
	/// Free node, moved by the layout simulator.
	Simulator,
	/// Pinned by a pointer interaction at a fixed graph-space point.
	Interaction { x: f64, y: f64 },
}

/// A contract in the dependency graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
	/// Lowercase address, the identity key.
	pub id: String,
	/// Address with the casing it was first seen in.
	pub address: String,
	/// Display name supplied by the payload, if any.
	pub label: Option<String>,
	/// Subject or dependency.
	pub group: NodeGroup,
	/// Number of links touching this node.
	pub degree: usize,
	/// Graph-space x.
	pub x: f64,
	/// Graph-space y.
	pub y: f64,
	/// Velocity along x.
	pub vx: f64,
	/// Velocity along y.
	pub vy: f64,
	owner: PositionOwner,
}

impl Node {
	fn new(address: &str, label: Option<String>, group: NodeGroup) -> Self {
		Self {
			id: address.to_ascii_lowercase(),
			address: address.to_string(),
			label,
			group,
			degree: 0,
			x: 0.0,
			y: 0.0,
			vx: 0.0,
			vy: 0.0,
			owner: PositionOwner::Simulator,
		}
	}

	/// Who controls the position.
	pub fn owner(&self) -> PositionOwner {
		self.owner
	}

	/// The pinned point, or `None` while the simulator owns the node.
	pub fn pin(&self) -> Option<(f64, f64)> {
		match self.owner {
			PositionOwner::Simulator => None,
			PositionOwner::Interaction { x, y } => Some((x, y)),
		}
	}

	/// True while held by a drag.
	pub fn is_pinned(&self) -> bool {
		self.pin().is_some()
	}

	/// True for the subject contract.
	pub fn is_main(&self) -> bool {
		self.group == NodeGroup::Main
	}

	/// Hand the node to the interaction layer at a fixed point.
	pub(crate) fn set_pin(&mut self, x: f64, y: f64) {
		self.owner = PositionOwner::Interaction { x, y };
		self.x = x;
		self.y = y;
		self.vx = 0.0;
		self.vy = 0.0;
	}

	/// Return the node to free simulation.
	pub(crate) fn release(&mut self) {
		self.owner = PositionOwner::Simulator;
	}

	/// Label if present, otherwise a shortened address like `0x1234…abcd`.
	pub fn display_name(&self) -> String {
		if let Some(label) = &self.label {
			return label.clone();
		}
		shorten_address(&self.address)
	}
}

/// Shorten long hex addresses for display, keeping short identifiers intact.
pub fn shorten_address(address: &str) -> String {
	let chars: Vec<char> = address.chars().collect();
	if chars.len() <= 12 {
		return address.to_string();
	}
	let head: String = chars[..6].iter().collect();
	let tail: String = chars[chars.len() - 4..].iter().collect();
	format!("{head}…{tail}")
}

/// One interaction kind between two contracts.
#[derive(Clone, Debug, PartialEq)]
pub struct Link {
	/// Index of the source node.
	pub source: usize,
	/// Index of the target node.
	pub target: usize,
	/// Interaction kind, e.g. "call".
	pub kind: String,
	/// Number of observed interactions, always > 0.
	pub count: u64,
}

impl Link {
	/// True when `node` is an endpoint.
	pub fn touches(&self, node: usize) -> bool {
		self.source == node || self.target == node
	}
}

/// Nodes and links derived from one payload.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	/// Lowercase subject address.
	pub subject: String,
	/// Nodes in order of first appearance.
	pub nodes: Vec<Node>,
	/// One link per edge and interaction kind.
	pub links: Vec<Link>,
	index: HashMap<String, usize>,
}

impl GraphModel {
	/// Build the model. Node order is the order of first appearance in `payload.edges`.
	pub fn build(payload: &GraphPayload) -> Self {
		let subject = payload.address.to_ascii_lowercase();
		let mut model = Self {
			subject,
			..Self::default()
		};

		for edge in &payload.edges {
			let kinds: Vec<(&String, u64)> = edge
				.types
				.iter()
				.filter(|(_, count)| **count > 0)
				.map(|(kind, count)| (kind, *count))
				.collect();
			if kinds.is_empty() {
				continue;
			}

			let source = model.intern(&edge.source, payload);
			let target = model.intern(&edge.target, payload);
			for (kind, count) in kinds {
				model.links.push(Link {
					source,
					target,
					kind: kind.clone(),
					count,
				});
				model.nodes[source].degree += 1;
				model.nodes[target].degree += 1;
			}
		}

		model
	}

	fn intern(&mut self, address: &str, payload: &GraphPayload) -> usize {
		let key = address.to_ascii_lowercase();
		if let Some(&idx) = self.index.get(&key) {
			return idx;
		}
		let group = if key == self.subject {
			NodeGroup::Main
		} else {
			NodeGroup::Other
		};
		let label = payload.display_name(address).map(str::to_string);
		let idx = self.nodes.len();
		self.nodes.push(Node::new(address, label, group));
		self.index.insert(key, idx);
		idx
	}

	/// True when the payload had no edges.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Index of the node with this address, matched case-insensitively.
	pub fn node_index(&self, address: &str) -> Option<usize> {
		self.index.get(&address.to_ascii_lowercase()).copied()
	}

	/// Index of the subject contract, if it appears.
	pub fn subject_index(&self) -> Option<usize> {
		self.index.get(&self.subject).copied()
	}

	/// A link is direct when one of its endpoints is the subject contract.
	pub fn is_direct(&self, link: &Link) -> bool {
		match self.subject_index() {
			Some(subject) => link.touches(subject),
			None => false,
		}
	}
}

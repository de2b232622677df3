//! Focus-driven subgraph highlighting with smooth opacity transitions.
//!
//! Focusing an address dims everything except that node and the links touching
//! it. Highlighted links are toned by whether they touch the subject contract
//! (direct) or connect two dependencies (transitive).
//!
//! Each element has a target opacity and a displayed opacity. Targets switch
//! instantly on focus changes; displayed values ease toward them with
//! exponential smoothing, `value += (target - value) * (1 - e^(-speed * dt))`,
//! which slows naturally as it approaches the target.

use serde::Deserialize;

use super::model::{GraphModel, Link};

/// Highlight tuning.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
	/// Opacity of elements outside the focused subgraph.
	pub dim_opacity: f64,
	/// Smoothing speed toward full opacity (higher is faster).
	pub fade_in_speed: f64,
	/// Smoothing speed toward dimmed opacity.
	pub fade_out_speed: f64,
}

impl Default for HighlightConfig {
	fn default() -> Self {
		Self {
			dim_opacity: 0.12,
			// ~150ms to 95% at 60fps
			fade_in_speed: 6.0,
			// ~250ms to 95%
			fade_out_speed: 4.0,
		}
	}
}

/// Highlight state machine.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum HighlightMode {
	/// Nothing focused; everything at full opacity.
	#[default]
	Neutral,
	/// Lowercase address of the focused contract.
	Focused(String),
}

/// Color role of a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkTone {
	/// Not highlighted.
	Default,
	/// Highlighted, one endpoint is the subject contract.
	Direct,
	/// Highlighted, neither endpoint is the subject contract.
	Transitive,
}

/// Target appearance of one element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementStyle {
	/// Target opacity.
	pub opacity: f64,
	/// Color role; only meaningful for links.
	pub tone: LinkTone,
}

const NEUTRAL: ElementStyle = ElementStyle {
	opacity: 1.0,
	tone: LinkTone::Default,
};

/// Dims and highlights nodes and links around a focused address.
#[derive(Clone, Debug, Default)]
pub struct HighlightEngine {
	config: HighlightConfig,
	mode: HighlightMode,
	node_targets: Vec<ElementStyle>,
	link_targets: Vec<ElementStyle>,
	node_opacity: Vec<f64>,
	link_opacity: Vec<f64>,
}

impl HighlightEngine {
	/// Create for a model. Everything starts neutral and settled.
	pub fn new(config: HighlightConfig, model: &GraphModel) -> Self {
		let (nodes, links) = (model.nodes.len(), model.links.len());
		Self {
			config,
			mode: HighlightMode::Neutral,
			node_targets: vec![NEUTRAL; nodes],
			link_targets: vec![NEUTRAL; links],
			node_opacity: vec![1.0; nodes],
			link_opacity: vec![1.0; links],
		}
	}

	/// Current focus state.
	pub fn mode(&self) -> &HighlightMode {
		&self.mode
	}

	/// Enter `Focused(address)`, or `Neutral` for `None`. Re-entering the
	/// current state changes nothing.
	pub fn focus(&mut self, address: Option<&str>, model: &GraphModel) {
		let mode = match address {
			Some(addr) => HighlightMode::Focused(addr.to_ascii_lowercase()),
			None => HighlightMode::Neutral,
		};
		if mode == self.mode {
			return;
		}
		self.mode = mode;
		self.retarget(model);
	}

	/// Recompute targets for the current mode.
	fn retarget(&mut self, model: &GraphModel) {
		let focused = match &self.mode {
			HighlightMode::Neutral => None,
			HighlightMode::Focused(addr) => model.node_index(addr),
		};

		let Some(focus) = focused else {
			// Neutral, or an address not present in this graph.
			self.node_targets.fill(NEUTRAL);
			self.link_targets.fill(NEUTRAL);
			return;
		};

		let dim = ElementStyle {
			opacity: self.config.dim_opacity,
			tone: LinkTone::Default,
		};
		for (i, target) in self.node_targets.iter_mut().enumerate() {
			*target = if i == focus { NEUTRAL } else { dim };
		}
		for (link, target) in model.links.iter().zip(self.link_targets.iter_mut()) {
			*target = if link.touches(focus) {
				ElementStyle {
					opacity: 1.0,
					tone: tone_for(model, link),
				}
			} else {
				dim
			};
		}
	}

	/// Ease displayed opacities toward their targets.
	pub fn tick(&mut self, dt: f64) {
		let fade_in = 1.0 - (-self.config.fade_in_speed * dt).exp();
		let fade_out = 1.0 - (-self.config.fade_out_speed * dt).exp();
		let ease = |value: &mut f64, target: f64| {
			let factor = if target > *value { fade_in } else { fade_out };
			*value += (target - *value) * factor;
			if (target - *value).abs() < 0.005 {
				*value = target;
			}
		};
		for (value, target) in self.node_opacity.iter_mut().zip(&self.node_targets) {
			ease(value, target.opacity);
		}
		for (value, target) in self.link_opacity.iter_mut().zip(&self.link_targets) {
			ease(value, target.opacity);
		}
	}

	/// Jump displayed opacities to their targets.
	pub fn settle(&mut self) {
		for (value, target) in self.node_opacity.iter_mut().zip(&self.node_targets) {
			*value = target.opacity;
		}
		for (value, target) in self.link_opacity.iter_mut().zip(&self.link_targets) {
			*value = target.opacity;
		}
	}

	/// Target style of a node.
	pub fn node_style(&self, idx: usize) -> ElementStyle {
		self.node_targets.get(idx).copied().unwrap_or(NEUTRAL)
	}

	/// Target style of a link.
	pub fn link_style(&self, idx: usize) -> ElementStyle {
		self.link_targets.get(idx).copied().unwrap_or(NEUTRAL)
	}

	/// Displayed (smoothed) node opacity.
	pub fn node_opacity(&self, idx: usize) -> f64 {
		self.node_opacity.get(idx).copied().unwrap_or(1.0)
	}

	/// Displayed (smoothed) link opacity.
	pub fn link_opacity(&self, idx: usize) -> f64 {
		self.link_opacity.get(idx).copied().unwrap_or(1.0)
	}

	/// True while any opacity is still easing.
	pub fn is_transitioning(&self) -> bool {
		self.node_opacity
			.iter()
			.zip(&self.node_targets)
			.chain(self.link_opacity.iter().zip(&self.link_targets))
			.any(|(value, target)| *value != target.opacity)
	}
}

fn tone_for(model: &GraphModel, link: &Link) -> LinkTone {
	if model.is_direct(link) {
		LinkTone::Direct
	} else {
		LinkTone::Transitive
	}
}

//! Directional flow indicators travelling along links.
//!
//! Every link runs its own loop:
//!
//! ```text
//! Waiting --delay--> Traveling --travel_secs--> FadingOut --fade_secs--> Waiting
//! ```
//!
//! Delays are drawn from a per-link RNG, so indicators drift out of phase and
//! never depend on each other. Positions are not stored: [`FlowAnimator::sample`]
//! interpolates between the endpoints' current coordinates, so indicators follow
//! nodes that are still moving.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use super::model::{Link, Node};

/// Flow animation tuning.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
	/// When false no indicator is ever drawn.
	pub enabled: bool,
	/// Seconds to travel from source to target (linear easing).
	pub travel_secs: f64,
	/// Seconds to fade out at the target.
	pub fade_secs: f64,
	/// Upper bound of the random pause before the next run.
	pub max_delay_secs: f64,
	/// Seed for the per-link delay generators.
	pub seed: u64,
}

impl Default for FlowConfig {
	fn default() -> Self {
		Self {
			enabled: true,
			travel_secs: 2.0,
			fade_secs: 0.4,
			max_delay_secs: 2.0,
			seed: 0xf10e,
		}
	}
}

/// Where one indicator is in its loop. Each phase carries its own clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlowPhase {
	/// Paused before the next run.
	Waiting { remaining: f64 },
	/// Moving from source to target.
	Traveling { elapsed: f64 },
	/// Fading at the target.
	FadingOut { elapsed: f64 },
	/// Detached. Never advances or renders again.
	Cancelled,
}

/// Indicator appearance for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlowSample {
	/// Graph-space x.
	pub x: f64,
	/// Graph-space y.
	pub y: f64,
	/// Indicator opacity in `0..=1`.
	pub opacity: f64,
}

#[derive(Clone, Debug)]
struct FlowIndicator {
	phase: FlowPhase,
	rng: StdRng,
}

impl FlowIndicator {
	fn delay(&mut self, config: &FlowConfig) -> f64 {
		if config.max_delay_secs <= 0.0 {
			0.0
		} else {
			self.rng.random_range(0.0..config.max_delay_secs)
		}
	}

	fn advance(&mut self, mut dt: f64, config: &FlowConfig) {
		// One call may cross several phase boundaries on a long frame.
		while dt > 0.0 {
			match self.phase {
				FlowPhase::Cancelled => return,
				FlowPhase::Waiting { remaining } => {
					if dt < remaining {
						self.phase = FlowPhase::Waiting {
							remaining: remaining - dt,
						};
						return;
					}
					dt -= remaining;
					self.phase = FlowPhase::Traveling { elapsed: 0.0 };
				}
				FlowPhase::Traveling { elapsed } => {
					let left = config.travel_secs - elapsed;
					if dt < left {
						self.phase = FlowPhase::Traveling {
							elapsed: elapsed + dt,
						};
						return;
					}
					dt -= left;
					self.phase = FlowPhase::FadingOut { elapsed: 0.0 };
				}
				FlowPhase::FadingOut { elapsed } => {
					let left = config.fade_secs - elapsed;
					if dt < left {
						self.phase = FlowPhase::FadingOut {
							elapsed: elapsed + dt,
						};
						return;
					}
					dt -= left;
					let remaining = self.delay(config);
					self.phase = FlowPhase::Waiting { remaining };
					if remaining <= 0.0 && config.travel_secs + config.fade_secs <= 0.0 {
						// Every duration is zero; nothing would ever consume dt.
						return;
					}
				}
			}
		}
	}
}

/// Owns one indicator per link.
#[derive(Clone, Debug)]
pub struct FlowAnimator {
	config: FlowConfig,
	indicators: Vec<FlowIndicator>,
}

impl FlowAnimator {
	/// Create one indicator per link, each starting after its own random delay.
	pub fn new(config: FlowConfig, link_count: usize) -> Self {
		let mut indicators: Vec<FlowIndicator> = (0..link_count)
			.map(|i| FlowIndicator {
				phase: FlowPhase::Cancelled,
				rng: StdRng::seed_from_u64(config.seed ^ (i as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)),
			})
			.collect();
		for indicator in &mut indicators {
			indicator.phase = if config.enabled {
				FlowPhase::Waiting {
					remaining: indicator.delay(&config),
				}
			} else {
				FlowPhase::Cancelled
			};
		}
		Self { config, indicators }
	}

	/// Phase of one link's indicator.
	pub fn phase(&self, link: usize) -> Option<FlowPhase> {
		self.indicators.get(link).map(|i| i.phase)
	}

	/// Number of indicators still looping.
	pub fn active_count(&self) -> usize {
		self.indicators
			.iter()
			.filter(|i| i.phase != FlowPhase::Cancelled)
			.count()
	}

	/// Advance every live indicator by `dt` seconds.
	pub fn advance(&mut self, dt: f64) {
		if dt <= 0.0 {
			return;
		}
		for indicator in &mut self.indicators {
			indicator.advance(dt, &self.config);
		}
	}

	/// Current position and opacity of a link's indicator, read from live
	/// node coordinates. `None` while waiting or cancelled.
	pub fn sample(&self, idx: usize, link: &Link, nodes: &[Node]) -> Option<FlowSample> {
		let indicator = self.indicators.get(idx)?;
		let (source, target) = (nodes.get(link.source)?, nodes.get(link.target)?);
		let (t, opacity) = match indicator.phase {
			FlowPhase::Waiting { .. } | FlowPhase::Cancelled => return None,
			FlowPhase::Traveling { elapsed } => {
				let t = if self.config.travel_secs > 0.0 {
					(elapsed / self.config.travel_secs).clamp(0.0, 1.0)
				} else {
					1.0
				};
				(t, 1.0)
			}
			FlowPhase::FadingOut { elapsed } => {
				let opacity = if self.config.fade_secs > 0.0 {
					1.0 - (elapsed / self.config.fade_secs).clamp(0.0, 1.0)
				} else {
					0.0
				};
				(1.0, opacity)
			}
		};
		Some(FlowSample {
			x: source.x + (target.x - source.x) * t,
			y: source.y + (target.y - source.y) * t,
			opacity,
		})
	}

	/// Cancel every loop and detach all indicators.
	pub fn cancel_all(&mut self) {
		for indicator in &mut self.indicators {
			indicator.phase = FlowPhase::Cancelled;
		}
		self.indicators.clear();
	}
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use super::*;
	use crate::components::contract_graph::model::GraphModel;
	use crate::components::contract_graph::types::{GraphPayload, RawEdge};

	fn two_nodes() -> (Vec<Node>, Link) {
		let mut model = GraphModel::build(&GraphPayload {
			address: "0xa".into(),
			edges: vec![RawEdge {
				source: "0xa".into(),
				target: "0xb".into(),
				types: BTreeMap::from([("call".to_string(), 1)]),
			}],
			nodes: BTreeMap::new(),
			from_block: None,
			to_block: None,
		});
		model.nodes[0].x = 0.0;
		model.nodes[0].y = 0.0;
		model.nodes[1].x = 100.0;
		model.nodes[1].y = 50.0;
		let link = model.links[0].clone();
		(model.nodes, link)
	}

	fn no_delay() -> FlowConfig {
		FlowConfig {
			max_delay_secs: 0.0,
			..FlowConfig::default()
		}
	}

	#[test]
	fn travels_linearly_then_fades() {
		let (nodes, link) = two_nodes();
		let mut flow = FlowAnimator::new(no_delay(), 1);
		assert_eq!(flow.phase(0), Some(FlowPhase::Waiting { remaining: 0.0 }));

		flow.advance(1.0);
		let mid = flow.sample(0, &link, &nodes).unwrap();
		assert!((mid.x - 50.0).abs() < 1e-9 && (mid.y - 25.0).abs() < 1e-9);
		assert_eq!(mid.opacity, 1.0);

		flow.advance(1.2);
		let fading = flow.sample(0, &link, &nodes).unwrap();
		assert_eq!((fading.x, fading.y), (100.0, 50.0));
		assert!((fading.opacity - 0.5).abs() < 1e-9);
	}

	#[test]
	fn samples_follow_moving_nodes() {
		let (mut nodes, link) = two_nodes();
		let mut flow = FlowAnimator::new(no_delay(), 1);
		flow.advance(1.0);
		nodes[1].x = 300.0;
		let sample = flow.sample(0, &link, &nodes).unwrap();
		assert!((sample.x - 150.0).abs() < 1e-9);
	}

	#[test]
	fn loop_restarts_after_fade() {
		let (nodes, link) = two_nodes();
		let mut flow = FlowAnimator::new(no_delay(), 1);
		flow.advance(2.0 + 0.4 + 0.5);
		assert!(matches!(flow.phase(0), Some(FlowPhase::Traveling { .. })));
		let sample = flow.sample(0, &link, &nodes).unwrap();
		assert!((sample.x - 25.0).abs() < 1e-6);
	}

	#[test]
	fn delays_desynchronize_links() {
		let flow = FlowAnimator::new(FlowConfig::default(), 8);
		let delays: Vec<f64> = (0..8)
			.map(|i| match flow.phase(i) {
				Some(FlowPhase::Waiting { remaining }) => remaining,
				other => panic!("unexpected phase {other:?}"),
			})
			.collect();
		assert!(delays.iter().all(|d| (0.0..2.0).contains(d)));
		assert!(delays.windows(2).any(|w| w[0] != w[1]));
	}

	#[test]
	fn cancel_all_detaches_everything() {
		let (nodes, link) = two_nodes();
		let mut flow = FlowAnimator::new(no_delay(), 2);
		flow.advance(0.5);
		flow.cancel_all();
		flow.advance(0.5);
		assert_eq!(flow.active_count(), 0);
		assert_eq!(flow.sample(0, &link, &nodes), None);
	}

	#[test]
	fn disabled_flow_never_renders() {
		let (nodes, link) = two_nodes();
		let mut flow = FlowAnimator::new(
			FlowConfig {
				enabled: false,
				..FlowConfig::default()
			},
			1,
		);
		flow.advance(10.0);
		assert_eq!(flow.sample(0, &link, &nodes), None);
	}
}

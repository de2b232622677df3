//! Force-directed layout simulation.
//!
//! Three forces act on every tick:
//! - a spring per link pulling its endpoints toward `link_distance`
//! - an inverse-square repulsion between every pair of nodes
//! - a centering shift moving the centroid of free nodes toward the canvas center
//!
//! Motion is scaled by `alpha`, which moves toward `alpha_target` by
//! `alpha_decay` each tick. The simulation settles once alpha drops below
//! `alpha_min`; raising the target (while dragging) wakes it up again.

use std::f64::consts::PI;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;

use super::model::{GraphModel, Link, Node};
use super::viewport::Bounds;

/// Tunable physics parameters.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
	/// Rest length of a link spring, in graph units.
	pub link_distance: f64,
	/// Multiplier on the degree-normalized spring strength.
	pub link_strength: f64,
	/// Repulsion strength. Negative values repel.
	pub charge: f64,
	/// Distances below this are clamped when computing repulsion.
	pub charge_distance_min: f64,
	/// Fraction of the centroid offset corrected per tick (0..=1).
	pub center_strength: f64,
	/// Fraction of velocity lost per tick (0..=1).
	pub velocity_decay: f64,
	/// Alpha below which the layout settles.
	pub alpha_min: f64,
	/// Fraction of the gap to `alpha_target` closed per tick, in `(0, 1]`.
	pub alpha_decay: f64,
	/// Target alpha held while a node is being dragged.
	pub drag_alpha_target: f64,
	/// Alpha the layout is reheated to when the canvas center moves.
	pub resize_alpha: f64,
	/// Seed for the coincident-node jitter.
	pub seed: u64,
}

impl Default for SimulationConfig {
	fn default() -> Self {
		Self {
			link_distance: 80.0,
			link_strength: 1.0,
			charge: -3000.0,
			charge_distance_min: 1.0,
			center_strength: 0.5,
			velocity_decay: 0.4,
			alpha_min: 0.001,
			// Settles in about 300 ticks from alpha = 1.
			alpha_decay: 1.0 - 0.001_f64.powf(1.0 / 300.0),
			drag_alpha_target: 0.3,
			resize_alpha: 0.3,
			seed: 0x5eed,
		}
	}
}

/// Where the simulation is in its energy lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationStatus {
	/// Ticking every frame.
	Running,
	/// Alpha fell below `alpha_min`. Restartable.
	Settled,
	/// Permanently stopped. Ticks are ignored and listeners are gone.
	Disposed,
}

/// Emitted after every tick that moved nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickEvent {
	/// Ticks applied so far.
	pub tick: u64,
	/// Alpha after this tick.
	pub alpha: f64,
}

/// Handle returned by [`LayoutSimulator::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type TickListener = Box<dyn FnMut(&TickEvent, &[Node])>;

/// Iterative physics layout over a [`GraphModel`]. Owns the node positions.
pub struct LayoutSimulator {
	model: GraphModel,
	config: SimulationConfig,
	center: (f64, f64),
	alpha: f64,
	alpha_target: f64,
	status: SimulationStatus,
	ticks: u64,
	/// Per-link (strength, bias), derived from endpoint degrees.
	link_params: Vec<(f64, f64)>,
	listeners: Vec<(SubscriptionId, TickListener)>,
	next_listener: u64,
	rng: StdRng,
}

impl LayoutSimulator {
	/// Seed positions on a circle around `center` and start running at alpha = 1.
	pub fn new(model: GraphModel, config: SimulationConfig, center: (f64, f64)) -> Self {
		let mut model = model;
		let total = model.nodes.len();
		let radius = 40.0 * (total as f64).sqrt().max(1.0);
		for (i, node) in model.nodes.iter_mut().enumerate() {
			let angle = (i as f64) * 2.0 * PI / total.max(1) as f64;
			node.x = center.0 + radius * angle.cos();
			node.y = center.1 + radius * angle.sin();
		}

		let link_params = model
			.links
			.iter()
			.map(|link| {
				let ds = model.nodes[link.source].degree.max(1) as f64;
				let dt = model.nodes[link.target].degree.max(1) as f64;
				(1.0 / ds.min(dt), ds / (ds + dt))
			})
			.collect();

		let status = if total == 0 {
			SimulationStatus::Settled
		} else {
			SimulationStatus::Running
		};
		let rng = StdRng::seed_from_u64(config.seed);

		Self {
			model,
			config,
			center,
			alpha: 1.0,
			alpha_target: 0.0,
			status,
			ticks: 0,
			link_params,
			listeners: Vec::new(),
			next_listener: 0,
			rng,
		}
	}

	/// Model with live positions.
	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	/// Nodes with live positions.
	pub fn nodes(&self) -> &[Node] {
		&self.model.nodes
	}

	/// Links of the model.
	pub fn links(&self) -> &[Link] {
		&self.model.links
	}

	/// One node by index.
	pub fn node(&self, idx: usize) -> Option<&Node> {
		self.model.nodes.get(idx)
	}

	/// Current alpha.
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Alpha the simulation eases toward.
	pub fn alpha_target(&self) -> f64 {
		self.alpha_target
	}

	/// Energy lifecycle state.
	pub fn status(&self) -> SimulationStatus {
		self.status
	}

	/// True while ticking.
	pub fn is_running(&self) -> bool {
		self.status == SimulationStatus::Running
	}

	/// Number of ticks applied so far.
	pub fn ticks(&self) -> u64 {
		self.ticks
	}

	/// Registered tick listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Move the point the centering force pulls toward.
	pub fn set_center(&mut self, x: f64, y: f64) {
		self.center = (x, y);
	}

	/// Set the alpha the simulation eases toward. Wakes a settled simulation
	/// when the target is above `alpha_min`.
	pub fn set_alpha_target(&mut self, target: f64) {
		if self.status == SimulationStatus::Disposed {
			return;
		}
		self.alpha_target = target.max(0.0);
		if self.alpha_target >= self.config.alpha_min {
			self.restart();
		}
	}

	/// Resume ticking from the current alpha.
	pub fn restart(&mut self) {
		if self.status == SimulationStatus::Disposed || self.model.nodes.is_empty() {
			return;
		}
		if self.alpha < self.config.alpha_min {
			self.alpha = self.config.alpha_min;
		}
		self.status = SimulationStatus::Running;
	}

	/// Raise alpha to at least `alpha` and resume ticking, so the layout gets
	/// enough ticks to follow a moved center.
	pub fn reheat(&mut self, alpha: f64) {
		if self.status == SimulationStatus::Disposed || self.model.nodes.is_empty() {
			return;
		}
		self.alpha = self.alpha.max(alpha);
		self.restart();
	}

	/// Stop for good and drop all listeners.
	pub fn dispose(&mut self) {
		self.status = SimulationStatus::Disposed;
		self.listeners.clear();
	}

	/// Call `listener` after every tick until unsubscribed or disposed.
	pub fn subscribe(
		&mut self,
		listener: impl FnMut(&TickEvent, &[Node]) + 'static,
	) -> SubscriptionId {
		let id = SubscriptionId(self.next_listener);
		self.next_listener += 1;
		if self.status != SimulationStatus::Disposed {
			self.listeners.push((id, Box::new(listener)));
		}
		id
	}

	/// Drop a tick listener. False if it was not registered.
	pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
		let before = self.listeners.len();
		self.listeners.retain(|(lid, _)| *lid != id);
		self.listeners.len() != before
	}

	/// Fix a node at a graph-space point, excluding it from physics.
	pub fn pin(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(node) = self.model.nodes.get_mut(idx) {
			node.set_pin(x, y);
		}
	}

	/// Hand a pinned node back to the physics.
	pub fn release(&mut self, idx: usize) {
		if let Some(node) = self.model.nodes.get_mut(idx) {
			node.release();
		}
	}

	/// Advance one tick. Returns false when nothing moved (settled or disposed).
	pub fn tick(&mut self) -> bool {
		if self.status != SimulationStatus::Running {
			return false;
		}

		self.alpha += (self.alpha_target - self.alpha) * self.config.alpha_decay;

		self.apply_link_force();
		self.apply_charge_force();
		self.integrate();
		self.apply_center_force();

		self.ticks += 1;
		let event = TickEvent {
			tick: self.ticks,
			alpha: self.alpha,
		};
		let nodes = &self.model.nodes;
		for (_, listener) in &mut self.listeners {
			listener(&event, nodes);
		}

		if self.alpha < self.config.alpha_min {
			self.status = SimulationStatus::Settled;
			debug!("contract-graph: layout settled after {} ticks", self.ticks);
		}
		true
	}

	/// Tick until settled, giving up after `max_ticks`. Returns ticks applied.
	pub fn run_until_settled(&mut self, max_ticks: usize) -> usize {
		let mut applied = 0;
		while applied < max_ticks && self.tick() {
			applied += 1;
		}
		applied
	}

	fn apply_link_force(&mut self) {
		for (i, link) in self.model.links.iter().enumerate() {
			let (source, target) = (link.source, link.target);
			if source == target {
				continue;
			}
			let (strength, bias) = self.link_params[i];
			let (s, t) = (&self.model.nodes[source], &self.model.nodes[target]);

			let mut dx = t.x + t.vx - s.x - s.vx;
			let mut dy = t.y + t.vy - s.y - s.vy;
			if dx == 0.0 {
				dx = jitter(&mut self.rng);
			}
			if dy == 0.0 {
				dy = jitter(&mut self.rng);
			}
			let dist = (dx * dx + dy * dy).sqrt();
			let l = (dist - self.config.link_distance) / dist
				* self.alpha * strength
				* self.config.link_strength;
			let (fx, fy) = (dx * l, dy * l);

			let t = &mut self.model.nodes[target];
			t.vx -= fx * bias;
			t.vy -= fy * bias;
			let s = &mut self.model.nodes[source];
			s.vx += fx * (1.0 - bias);
			s.vy += fy * (1.0 - bias);
		}
	}

	fn apply_charge_force(&mut self) {
		let n = self.model.nodes.len();
		let min_sq = self.config.charge_distance_min * self.config.charge_distance_min;
		for i in 0..n {
			for j in (i + 1)..n {
				let mut dx = self.model.nodes[j].x - self.model.nodes[i].x;
				let mut dy = self.model.nodes[j].y - self.model.nodes[i].y;
				if dx == 0.0 && dy == 0.0 {
					dx = jitter(&mut self.rng);
					dy = jitter(&mut self.rng);
				}
				let dist_sq = (dx * dx + dy * dy).max(min_sq);
				let dist = dist_sq.sqrt();
				// Inverse-square magnitude along the unit vector.
				let force = self.config.charge * self.alpha / dist_sq;
				let (fx, fy) = (force * dx / dist, force * dy / dist);

				let a = &mut self.model.nodes[i];
				a.vx += fx;
				a.vy += fy;
				let b = &mut self.model.nodes[j];
				b.vx -= fx;
				b.vy -= fy;
			}
		}
	}

	fn integrate(&mut self) {
		let keep = 1.0 - self.config.velocity_decay;
		for node in &mut self.model.nodes {
			match node.pin() {
				Some((px, py)) => {
					node.x = px;
					node.y = py;
					node.vx = 0.0;
					node.vy = 0.0;
				}
				None => {
					node.vx *= keep;
					node.vy *= keep;
					node.x += node.vx;
					node.y += node.vy;
				}
			}
		}
	}

	fn apply_center_force(&mut self) {
		let free: Vec<usize> = (0..self.model.nodes.len())
			.filter(|&i| !self.model.nodes[i].is_pinned())
			.collect();
		if free.is_empty() {
			return;
		}
		let count = free.len() as f64;
		let (sx, sy) = free.iter().fold((0.0, 0.0), |(sx, sy), &i| {
			(sx + self.model.nodes[i].x, sy + self.model.nodes[i].y)
		});
		let shift_x = (sx / count - self.center.0) * self.config.center_strength;
		let shift_y = (sy / count - self.center.1) * self.config.center_strength;
		for i in free {
			let node = &mut self.model.nodes[i];
			node.x -= shift_x;
			node.y -= shift_y;
		}
	}

	/// Bounding box of current node positions.
	pub fn bounds(&self) -> Option<Bounds> {
		Bounds::around(self.model.nodes.iter().map(|n| (n.x, n.y)))
	}
}

/// Tiny random offset that separates coincident nodes.
fn jitter(rng: &mut StdRng) -> f64 {
	(rng.random::<f64>() - 0.5) * 1e-6
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;
	use std::collections::BTreeMap;
	use std::rc::Rc;

	use super::*;
	use crate::components::contract_graph::types::{GraphPayload, RawEdge};

	fn chain(addresses: &[&str]) -> GraphModel {
		let edges = addresses
			.windows(2)
			.map(|w| RawEdge {
				source: w[0].into(),
				target: w[1].into(),
				types: BTreeMap::from([("call".to_string(), 1)]),
			})
			.collect();
		GraphModel::build(&GraphPayload {
			address: addresses[0].into(),
			edges,
			nodes: BTreeMap::new(),
			from_block: None,
			to_block: None,
		})
	}

	fn simulate(addresses: &[&str]) -> LayoutSimulator {
		LayoutSimulator::new(chain(addresses), SimulationConfig::default(), (0.0, 0.0))
	}

	fn distance(a: &Node, b: &Node) -> f64 {
		((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
	}

	#[test]
	fn alpha_decays_each_tick() {
		let mut sim = simulate(&["0xa", "0xb"]);
		let before = sim.alpha();
		assert!(sim.tick());
		assert!(sim.alpha() < before);
	}

	#[test]
	fn settles_by_energy_not_tick_budget() {
		let mut sim = LayoutSimulator::new(
			chain(&["0xa", "0xb", "0xc"]),
			SimulationConfig::default(),
			(0.0, 0.0),
		);
		let applied = sim.run_until_settled(10_000);
		assert!(applied < 10_000);
		assert_eq!(sim.status(), SimulationStatus::Settled);
		assert!(sim.alpha() < SimulationConfig::default().alpha_min);
		assert!(!sim.tick());
	}

	#[test]
	fn faster_decay_settles_sooner() {
		let slow = {
			let mut sim = simulate(&["0xa", "0xb"]);
			sim.run_until_settled(10_000)
		};
		let fast = {
			let config = SimulationConfig {
				alpha_decay: 0.1,
				..SimulationConfig::default()
			};
			let mut sim = LayoutSimulator::new(chain(&["0xa", "0xb"]), config, (0.0, 0.0));
			sim.run_until_settled(10_000)
		};
		assert!(fast < slow);
	}

	#[test]
	fn linked_nodes_approach_rest_distance() {
		let mut sim = simulate(&["0xa", "0xb"]);
		sim.run_until_settled(10_000);
		let d = distance(&sim.nodes()[0], &sim.nodes()[1]);
		let rest = SimulationConfig::default().link_distance;
		assert!((d - rest).abs() < rest * 0.5, "distance {d} far from rest {rest}");
	}

	#[test]
	fn centroid_moves_to_center() {
		let mut sim = LayoutSimulator::new(
			chain(&["0xa", "0xb", "0xc", "0xd"]),
			SimulationConfig::default(),
			(400.0, 300.0),
		);
		sim.run_until_settled(10_000);
		let n = sim.nodes().len() as f64;
		let cx = sim.nodes().iter().map(|n| n.x).sum::<f64>() / n;
		let cy = sim.nodes().iter().map(|n| n.y).sum::<f64>() / n;
		assert!((cx - 400.0).abs() < 1.0);
		assert!((cy - 300.0).abs() < 1.0);
	}

	#[test]
	fn reheat_after_center_move_recenters() {
		let mut sim = LayoutSimulator::new(
			chain(&["0xa", "0xb", "0xc", "0xd"]),
			SimulationConfig::default(),
			(400.0, 300.0),
		);
		sim.run_until_settled(10_000);
		sim.set_center(800.0, 600.0);
		sim.reheat(SimulationConfig::default().resize_alpha);
		let applied = sim.run_until_settled(10_000);
		assert!(applied > 10, "only {applied} ticks after reheat");
		let n = sim.nodes().len() as f64;
		let cx = sim.nodes().iter().map(|n| n.x).sum::<f64>() / n;
		let cy = sim.nodes().iter().map(|n| n.y).sum::<f64>() / n;
		assert!((cx - 800.0).abs() < 1.0, "centroid x {cx}");
		assert!((cy - 600.0).abs() < 1.0, "centroid y {cy}");
	}

	#[test]
	fn pinned_node_holds_its_point() {
		let mut sim = simulate(&["0xa", "0xb", "0xc"]);
		sim.pin(1, 250.0, -40.0);
		for _ in 0..50 {
			sim.tick();
		}
		let node = &sim.nodes()[1];
		assert_eq!((node.x, node.y), (250.0, -40.0));
		assert_eq!(node.pin(), Some((250.0, -40.0)));
	}

	#[test]
	fn pin_release_round_trip_is_idempotent() {
		let mut sim = simulate(&["0xa", "0xb"]);
		for _ in 0..3 {
			sim.pin(0, 10.0, 10.0);
			assert!(sim.nodes()[0].is_pinned());
			sim.release(0);
			assert_eq!(sim.nodes()[0].pin(), None);
		}
		let before = sim.nodes()[0].clone();
		sim.tick();
		assert_ne!((before.x, before.y), (sim.nodes()[0].x, sim.nodes()[0].y));
	}

	#[test]
	fn raising_target_wakes_settled_simulation() {
		let mut sim = simulate(&["0xa", "0xb"]);
		sim.run_until_settled(10_000);
		assert!(!sim.is_running());

		sim.set_alpha_target(0.3);
		assert!(sim.is_running());
		for _ in 0..500 {
			sim.tick();
		}
		assert!(sim.alpha() > 0.25, "alpha should hover near the drag target");

		sim.set_alpha_target(0.0);
		let applied = sim.run_until_settled(10_000);
		assert!(applied > 0 && applied < 10_000);
		assert_eq!(sim.status(), SimulationStatus::Settled);
	}

	#[test]
	fn listeners_receive_every_tick() {
		let mut sim = simulate(&["0xa", "0xb"]);
		let seen = Rc::new(Cell::new(0u64));
		let seen_in = seen.clone();
		let id = sim.subscribe(move |event, nodes| {
			assert_eq!(nodes.len(), 2);
			seen_in.set(event.tick);
		});
		sim.tick();
		sim.tick();
		assert_eq!(seen.get(), 2);

		assert!(sim.unsubscribe(id));
		sim.tick();
		assert_eq!(seen.get(), 2);
	}

	#[test]
	fn dispose_stops_ticks_and_drops_listeners() {
		let mut sim = simulate(&["0xa", "0xb"]);
		let fired = Rc::new(Cell::new(0u32));
		let fired_in = fired.clone();
		sim.subscribe(move |_, _| fired_in.set(fired_in.get() + 1));
		sim.dispose();

		assert_eq!(sim.listener_count(), 0);
		assert!(!sim.tick());
		sim.set_alpha_target(0.3);
		sim.restart();
		assert!(!sim.tick());
		assert_eq!(fired.get(), 0);
		assert_eq!(sim.ticks(), 0);
	}

	#[test]
	fn empty_model_never_runs() {
		let mut sim = LayoutSimulator::new(GraphModel::default(), SimulationConfig::default(), (0.0, 0.0));
		assert_eq!(sim.status(), SimulationStatus::Settled);
		sim.set_alpha_target(0.3);
		assert!(!sim.tick());
		assert_eq!(sim.bounds(), None);
	}

	#[test]
	fn unlinked_nodes_repel() {
		let mut model = chain(&["0xa", "0xb"]);
		model.links.clear();
		let mut sim = LayoutSimulator::new(model, SimulationConfig::default(), (0.0, 0.0));
		let before = distance(&sim.nodes()[0], &sim.nodes()[1]);
		sim.run_until_settled(10_000);
		assert!(distance(&sim.nodes()[0], &sim.nodes()[1]) > before);
	}
}

//! The graph engine: one owner for model, layout, viewport, interaction,
//! highlight, flow and lifecycle state.
//!
//! Renderers and UI shells talk only to [`GraphEngine`]. It has no browser
//! dependencies; the canvas component feeds it pointer events and frame deltas
//! and draws whatever it exposes.
//!
//! Within one [`GraphEngine::frame`] the simulator ticks first, so highlight,
//! flow and rendering all read positions from the same tick.

use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use super::config::GraphConfig;
use super::error::{EnrichmentError, PayloadError};
use super::flow::{FlowAnimator, FlowSample};
use super::highlight::HighlightEngine;
use super::interaction::{Attribution, Balance, HoverCard, HoverTicket, InteractionController, Release};
use super::lifecycle::{Admission, Lifecycle, LoadState};
use super::model::{GraphModel, Link, Node};
use super::scale::{ScaleConfig, ScaledValues};
use super::simulation::{LayoutSimulator, SimulationStatus, SubscriptionId, TickEvent};
use super::types::GraphPayload;
use super::viewport::{ViewTransform, ViewportController};

/// What the engine currently has to show.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GraphStatus {
	/// No payload yet.
	Empty,
	/// The payload is valid but has no edges.
	NoDependencies,
	/// A graph is built and drawn.
	Ready,
	/// The last payload was rejected. Nothing of the graph is drawn.
	Malformed(String),
}

/// Result of [`GraphEngine::load`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
	/// Same payload as the one already active; nothing was rebuilt.
	Unchanged,
	/// A new graph was built.
	Rebuilt { nodes: usize, links: usize },
	/// The payload is valid but has no edges.
	NoDependencies,
	/// The engine is disposed.
	Ignored,
}

/// Handle returned by [`GraphEngine::subscribe_ticks`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickSubscription(u64);

type SharedTickListener = Rc<RefCell<dyn FnMut(&TickEvent, &[Node])>>;

/// Engine-level tick listener. Survives rebuilds by re-attaching to each new
/// simulator.
struct TickSubscriber {
	id: TickSubscription,
	listener: SharedTickListener,
	attached: Option<SubscriptionId>,
}

/// Pointer grab of a node: offset from the pointer to the node center.
#[derive(Clone, Copy, Debug)]
struct Grab {
	dx: f64,
	dy: f64,
}

/// Headless owner of all graph state. Feed it payloads, pointer events and
/// frame deltas; read positions and styles back for drawing.
pub struct GraphEngine {
	config: GraphConfig,
	scale: ScaleConfig,
	lifecycle: Lifecycle,
	status: GraphStatus,
	range: Option<String>,
	simulator: Option<LayoutSimulator>,
	empty: GraphModel,
	viewport: ViewportController,
	interaction: InteractionController,
	highlight: HighlightEngine,
	flow: FlowAnimator,
	focus: Option<String>,
	grab: Option<Grab>,
	subscribers: Vec<TickSubscriber>,
	next_subscription: u64,
	on_select: Option<Box<dyn FnMut(&Node)>>,
}

impl GraphEngine {
	/// Engine for a canvas of `width` by `height` pixels, with no graph yet.
	pub fn new(config: GraphConfig, width: f64, height: f64) -> Self {
		let viewport = ViewportController::new(width, height, config.viewport.clone());
		let interaction = InteractionController::new(config.interaction.clone());
		let flow = FlowAnimator::new(config.flow.clone(), 0);
		Self {
			config,
			scale: ScaleConfig::default(),
			lifecycle: Lifecycle::new(),
			status: GraphStatus::Empty,
			range: None,
			simulator: None,
			empty: GraphModel::default(),
			viewport,
			interaction,
			highlight: HighlightEngine::default(),
			flow,
			focus: None,
			grab: None,
			subscribers: Vec::new(),
			next_subscription: 0,
			on_select: None,
		}
	}

	/// Replace the default zoom-dependent sizing.
	pub fn with_scale(mut self, scale: ScaleConfig) -> Self {
		self.scale = scale;
		self
	}

	/// Records a call on a disposed engine. Returns true when the caller must bail.
	fn closed(&mut self, operation: &str) -> bool {
		if self.lifecycle.is_disposed() {
			self.lifecycle.note_late_call(operation);
			true
		} else {
			false
		}
	}

	// ---- loading ----

	/// Feed a payload. Rebuilds model, layout, highlight and flow state only
	/// when the payload differs from the active one.
	pub fn load(&mut self, payload: &GraphPayload) -> Result<LoadOutcome, PayloadError> {
		let version = match self.lifecycle.begin(payload) {
			Admission::Closed => return Ok(LoadOutcome::Ignored),
			Admission::Unchanged => {
				return match self.status {
					GraphStatus::NoDependencies => Ok(LoadOutcome::NoDependencies),
					// Same rejected payload again: report the same error.
					GraphStatus::Malformed(_) => payload.validate().map(|()| LoadOutcome::Unchanged),
					_ => Ok(LoadOutcome::Unchanged),
				};
			}
			Admission::Build(version) => version,
		};

		self.teardown_graph();
		self.range = payload.range_label();

		if let Err(err) = payload.validate() {
			warn!("contract-graph: rejecting payload for {}: {err}", payload.address);
			self.lifecycle.reject(version);
			self.status = GraphStatus::Malformed(err.to_string());
			return Err(err);
		}

		let model = GraphModel::build(payload);
		if model.is_empty() {
			info!(
				"contract-graph: {} has no dependencies{}",
				payload.address,
				self.range.as_deref().map(|r| format!(" in {r}")).unwrap_or_default()
			);
			self.highlight = HighlightEngine::new(self.config.highlight.clone(), &model);
			self.lifecycle.finish(version);
			self.status = GraphStatus::NoDependencies;
			return Ok(LoadOutcome::NoDependencies);
		}

		let (nodes, links) = (model.nodes.len(), model.links.len());
		let (width, height) = self.viewport.dimensions();
		let mut simulator =
			LayoutSimulator::new(model, self.config.simulation.clone(), (width / 2.0, height / 2.0));
		for subscriber in &mut self.subscribers {
			subscriber.attached = Some(attach(&mut simulator, &subscriber.listener));
		}

		let mut highlight = HighlightEngine::new(self.config.highlight.clone(), simulator.model());
		highlight.focus(self.focus.as_deref(), simulator.model());
		highlight.settle();

		self.highlight = highlight;
		self.flow = FlowAnimator::new(self.config.flow.clone(), links);
		self.simulator = Some(simulator);
		self.lifecycle.finish(version);
		self.status = GraphStatus::Ready;
		info!(
			"contract-graph: built {nodes} nodes, {links} links for {}",
			payload.address
		);
		Ok(LoadOutcome::Rebuilt { nodes, links })
	}

	/// Parse and feed a JSON payload. Unparseable input is reported as
	/// malformed and clears the graph.
	pub fn load_json(&mut self, json: &str) -> Result<LoadOutcome, PayloadError> {
		if self.closed("load_json") {
			return Ok(LoadOutcome::Ignored);
		}
		match serde_json::from_str::<GraphPayload>(json) {
			Ok(payload) => self.load(&payload),
			Err(err) => {
				let err = PayloadError::from(err);
				warn!("contract-graph: {err}");
				self.teardown_graph();
				self.lifecycle.clear();
				self.range = None;
				self.status = GraphStatus::Malformed(err.to_string());
				Err(err)
			}
		}
	}

	/// Stop the current layout and drop per-graph state. Engine subscribers
	/// stay registered for the next simulator.
	fn teardown_graph(&mut self) {
		if let Some(mut simulator) = self.simulator.take() {
			simulator.dispose();
		}
		for subscriber in &mut self.subscribers {
			subscriber.attached = None;
		}
		self.flow.cancel_all();
		self.interaction.reset();
		self.highlight = HighlightEngine::default();
		self.grab = None;
	}

	// ---- subscriptions ----

	/// Listen to layout ticks, across rebuilds, until unsubscribed or disposed.
	pub fn subscribe_ticks(
		&mut self,
		listener: impl FnMut(&TickEvent, &[Node]) + 'static,
	) -> Option<TickSubscription> {
		if self.closed("subscribe_ticks") {
			return None;
		}
		let id = TickSubscription(self.next_subscription);
		self.next_subscription += 1;
		let listener: SharedTickListener = Rc::new(RefCell::new(listener));
		let attached = self
			.simulator
			.as_mut()
			.map(|simulator| attach(simulator, &listener));
		self.subscribers.push(TickSubscriber {
			id,
			listener,
			attached,
		});
		Some(id)
	}

	/// Detach a tick listener. False if it was not registered.
	pub fn unsubscribe_ticks(&mut self, id: TickSubscription) -> bool {
		let Some(pos) = self.subscribers.iter().position(|s| s.id == id) else {
			return false;
		};
		let subscriber = self.subscribers.remove(pos);
		if let (Some(simulator), Some(attached)) = (self.simulator.as_mut(), subscriber.attached) {
			simulator.unsubscribe(attached);
		}
		true
	}

	/// Called with the logical node when a node is clicked.
	pub fn set_selection_handler(&mut self, handler: impl FnMut(&Node) + 'static) {
		if self.closed("set_selection_handler") {
			return;
		}
		self.on_select = Some(Box::new(handler));
	}

	// ---- frames ----

	/// Advance everything by `dt` seconds. Returns true while something is
	/// still moving and another frame is worth drawing.
	pub fn frame(&mut self, dt: f64) -> bool {
		if self.closed("frame") {
			return false;
		}
		let moved = self
			.simulator
			.as_mut()
			.is_some_and(|simulator| simulator.tick());
		self.highlight.tick(dt);
		self.flow.advance(dt);
		moved || self.highlight.is_transitioning() || self.flow.active_count() > 0
	}

	// ---- pointer input ----

	/// Topmost node under a screen point, in reverse draw order: the
	/// subject contract first, then dependencies from the last drawn.
	pub fn node_at(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.viewport.screen_to_graph(sx, sy);
		let scaled = ScaledValues::new(&self.scale, self.viewport.transform().k);
		let nodes = self.nodes();
		let subject = nodes.iter().enumerate().filter(|(_, n)| n.is_main());
		let others = nodes.iter().enumerate().rev().filter(|(_, n)| !n.is_main());
		subject
			.chain(others)
			.find(|(_, node)| {
				let (dx, dy) = (node.x - gx, node.y - gy);
				(dx * dx + dy * dy).sqrt() <= scaled.pick_radius(node.is_main())
			})
			.map(|(idx, _)| idx)
	}

	/// Press on a node starts a drag and wakes the layout; press on the
	/// background starts a pan.
	pub fn pointer_down(&mut self, sx: f64, sy: f64) {
		if self.closed("pointer_down") {
			return;
		}
		let hit = self.node_at(sx, sy);
		let (Some(idx), Some(simulator)) = (hit, self.simulator.as_mut()) else {
			self.interaction.hover(None);
			self.viewport.begin_pan(sx, sy);
			return;
		};

		self.interaction.hover(None);
		self.interaction.begin_drag(idx, sx, sy);
		let (gx, gy) = self.viewport.screen_to_graph(sx, sy);
		if let Some(node) = simulator.node(idx) {
			let (nx, ny) = (node.x, node.y);
			self.grab = Some(Grab {
				dx: nx - gx,
				dy: ny - gy,
			});
			simulator.pin(idx, nx, ny);
		}
		simulator.set_alpha_target(self.config.simulation.drag_alpha_target);
	}

	/// Moves a dragged node, pans, or updates the hover. Returns a ticket when
	/// a new hover card opened and its lookups should start.
	pub fn pointer_move(&mut self, sx: f64, sy: f64) -> Option<HoverTicket> {
		if self.closed("pointer_move") {
			return None;
		}
		if let Some(idx) = self.interaction.drag_to(sx, sy) {
			let (gx, gy) = self.viewport.screen_to_graph(sx, sy);
			let grab = self.grab.unwrap_or(Grab { dx: 0.0, dy: 0.0 });
			if let Some(simulator) = self.simulator.as_mut() {
				simulator.pin(idx, gx + grab.dx, gy + grab.dy);
			}
			return None;
		}
		if self.viewport.pan_to(sx, sy) {
			return None;
		}

		let target = self.node_at(sx, sy).and_then(|idx| {
			self.nodes()
				.get(idx)
				.map(|node| (idx, node.address.clone(), node.display_name()))
		});
		self.interaction
			.hover(target.as_ref().map(|(idx, address, title)| (*idx, address.as_str(), title.clone())))
	}

	/// Ends a drag or pan. A release that did not travel past the click
	/// tolerance selects the node.
	pub fn pointer_up(&mut self, _sx: f64, _sy: f64) -> Release {
		if self.closed("pointer_up") {
			return Release::Nothing;
		}
		self.viewport.end_pan();
		let release = self.interaction.end_drag();
		match release {
			Release::Nothing => {}
			Release::Click(idx) | Release::DragEnd(idx) => {
				self.release_node(idx);
			}
		}
		if let Release::Click(idx) = release {
			self.select(idx);
		}
		release
	}

	/// Pointer left the canvas: drop drag, pan and hover without selecting.
	pub fn pointer_leave(&mut self) {
		if self.closed("pointer_leave") {
			return;
		}
		self.viewport.end_pan();
		if let Some(idx) = self.interaction.cancel_drag() {
			self.release_node(idx);
		}
		self.interaction.hover(None);
	}

	fn release_node(&mut self, idx: usize) {
		self.grab = None;
		if let Some(simulator) = self.simulator.as_mut() {
			simulator.release(idx);
			simulator.set_alpha_target(0.0);
		}
	}

	fn select(&mut self, idx: usize) {
		let Some(node) = self.simulator.as_ref().and_then(|s| s.node(idx)).cloned() else {
			return;
		};
		if let Some(handler) = self.on_select.as_mut() {
			handler(&node);
		}
	}

	/// Wheel zoom anchored at the pointer.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if self.closed("wheel") {
			return;
		}
		self.viewport.wheel(sx, sy, delta_y);
	}

	// ---- highlight ----

	/// Highlight the subgraph around `address`, or return to neutral.
	pub fn focus(&mut self, address: Option<&str>) {
		if self.closed("focus") {
			return;
		}
		self.focus = address.map(str::to_ascii_lowercase);
		let model = match self.simulator.as_ref() {
			Some(simulator) => simulator.model(),
			None => &self.empty,
		};
		self.highlight.focus(address, model);
	}

	// ---- enrichment ----

	/// Apply a balance lookup result. False when the ticket is stale.
	pub fn apply_balance(
		&mut self,
		ticket: &HoverTicket,
		result: Result<Balance, EnrichmentError>,
	) -> bool {
		if self.closed("apply_balance") {
			return false;
		}
		self.interaction.apply_balance(ticket, result)
	}

	/// Apply an attribution lookup result. False when the ticket is stale.
	pub fn apply_attribution(
		&mut self,
		ticket: &HoverTicket,
		result: Result<Attribution, EnrichmentError>,
	) -> bool {
		if self.closed("apply_attribution") {
			return false;
		}
		self.interaction.apply_attribution(ticket, result)
	}

	/// Card for the hovered node, if any.
	pub fn hover_card(&self) -> Option<&HoverCard> {
		self.interaction.hover_card()
	}

	// ---- zoom controls ----

	/// Zoom in about the canvas center.
	pub fn zoom_in(&mut self) {
		if !self.closed("zoom_in") {
			self.viewport.zoom_in();
		}
	}

	/// Zoom out about the canvas center.
	pub fn zoom_out(&mut self) {
		if !self.closed("zoom_out") {
			self.viewport.zoom_out();
		}
	}

	/// Back to the initial transform.
	pub fn reset_zoom(&mut self) {
		if !self.closed("reset_zoom") {
			self.viewport.reset();
		}
	}

	/// Fit the current layout into the canvas.
	pub fn zoom_to_fit(&mut self) {
		if self.closed("zoom_to_fit") {
			return;
		}
		let bounds = self.simulator.as_ref().and_then(LayoutSimulator::bounds);
		self.viewport.zoom_to_fit(bounds);
	}

	/// Center the node with this address. Returns false when it is not in the graph.
	pub fn zoom_to_node(&mut self, address: &str) -> bool {
		if self.closed("zoom_to_node") {
			return false;
		}
		let Some((x, y)) = self
			.simulator
			.as_ref()
			.and_then(|s| s.model().node_index(address).and_then(|i| s.node(i)))
			.map(|node| (node.x, node.y))
		else {
			return false;
		};
		self.viewport.zoom_to_point(x, y);
		true
	}

	/// New canvas size. The layout recenters on the new middle.
	pub fn resize(&mut self, width: f64, height: f64) {
		if self.closed("resize") {
			return;
		}
		self.viewport.resize(width, height);
		if let Some(simulator) = self.simulator.as_mut() {
			simulator.set_center(width / 2.0, height / 2.0);
			simulator.reheat(self.config.simulation.resize_alpha);
		}
	}

	// ---- teardown ----

	/// Stop the layout, cancel every animation and drop all listeners and the
	/// selection handler. Every later call is a counted no-op.
	pub fn dispose(&mut self) {
		if self.closed("dispose") {
			return;
		}
		self.teardown_graph();
		self.subscribers.clear();
		self.on_select = None;
		self.lifecycle.dispose();
		info!("contract-graph: engine disposed");
	}

	/// True once [`GraphEngine::dispose`] ran.
	pub fn is_disposed(&self) -> bool {
		self.lifecycle.is_disposed()
	}

	// ---- read accessors ----

	/// What the engine currently shows.
	pub fn status(&self) -> &GraphStatus {
		&self.status
	}

	/// Block range of the last payload, for the empty-state message.
	pub fn range_label(&self) -> Option<&str> {
		self.range.as_deref()
	}

	/// Load guard state.
	pub fn load_state(&self) -> LoadState {
		self.lifecycle.state()
	}

	/// Calls made after disposal.
	pub fn late_calls(&self) -> u64 {
		self.lifecycle.late_calls()
	}

	/// Full rebuilds so far.
	pub fn rebuilds(&self) -> u64 {
		self.lifecycle.rebuilds()
	}

	/// Active model, or an empty one.
	pub fn model(&self) -> &GraphModel {
		match self.simulator.as_ref() {
			Some(simulator) => simulator.model(),
			None => &self.empty,
		}
	}

	/// Nodes with live positions.
	pub fn nodes(&self) -> &[Node] {
		&self.model().nodes
	}

	/// Links of the active graph.
	pub fn links(&self) -> &[Link] {
		&self.model().links
	}

	/// Layout status, `None` without a graph.
	pub fn simulation_status(&self) -> Option<SimulationStatus> {
		self.simulator.as_ref().map(LayoutSimulator::status)
	}

	/// Layout alpha, `None` without a graph.
	pub fn alpha(&self) -> Option<f64> {
		self.simulator.as_ref().map(LayoutSimulator::alpha)
	}

	/// Layout ticks applied to the active graph.
	pub fn tick_count(&self) -> u64 {
		self.simulator.as_ref().map_or(0, LayoutSimulator::ticks)
	}

	/// Registered engine-level tick listeners.
	pub fn listener_count(&self) -> usize {
		self.subscribers.len()
	}

	/// True while a selection handler is set.
	pub fn has_selection_handler(&self) -> bool {
		self.on_select.is_some()
	}

	/// Current view transform.
	pub fn transform(&self) -> ViewTransform {
		self.viewport.transform()
	}

	/// Canvas size in pixels.
	pub fn dimensions(&self) -> (f64, f64) {
		self.viewport.dimensions()
	}

	/// Focus highlight state.
	pub fn highlight(&self) -> &HighlightEngine {
		&self.highlight
	}

	/// Flow indicator state.
	pub fn flow(&self) -> &FlowAnimator {
		&self.flow
	}

	/// Flow indicator for one link this frame, if visible.
	pub fn flow_sample(&self, link: usize) -> Option<FlowSample> {
		let model = self.model();
		self.flow.sample(link, model.links.get(link)?, &model.nodes)
	}

	/// Zoom-dependent sizing config.
	pub fn scale(&self) -> &ScaleConfig {
		&self.scale
	}

	/// Sizes for the current zoom.
	pub fn scaled(&self) -> ScaledValues {
		ScaledValues::new(&self.scale, self.viewport.transform().k)
	}

	/// Node being dragged.
	pub fn dragged_node(&self) -> Option<usize> {
		self.interaction.dragged_node()
	}

	/// Node under the pointer.
	pub fn hovered_node(&self) -> Option<usize> {
		self.interaction.hovered_node()
	}

}

fn attach(simulator: &mut LayoutSimulator, listener: &SharedTickListener) -> SubscriptionId {
	let listener = Rc::clone(listener);
	simulator.subscribe(move |event, nodes| {
		let mut listener = listener.borrow_mut();
		(*listener)(event, nodes)
	})
}

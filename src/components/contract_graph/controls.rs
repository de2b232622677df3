//! External handle for zoom controls.
//!
//! [`GraphControls`] shares the component's engine cell. While the canvas is
//! mounted every call reaches the engine; once it unmounts the cell is empty
//! and every call is a no-op.

use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use super::engine::GraphEngine;
use super::viewport::ViewTransform;

pub(crate) type EngineCell = Rc<RefCell<Option<GraphEngine>>>;

/// Cloneable zoom handle. Pass one to `ContractGraphCanvas` and keep a clone
/// to drive its viewport from buttons or keyboard shortcuts.
#[derive(Clone, Default)]
pub struct GraphControls {
	engine: EngineCell,
}

impl GraphControls {
	/// An unmounted handle. Every call is a no-op until a canvas mounts with it.
	pub fn new() -> Self {
		Self::default()
	}

	pub(crate) fn cell(&self) -> EngineCell {
		Rc::clone(&self.engine)
	}

	/// Run `f` against the mounted engine. Returns `None` when unmounted, or
	/// when called re-entrantly from inside an engine callback.
	fn with<R>(&self, f: impl FnOnce(&mut GraphEngine) -> R) -> Option<R> {
		let Ok(mut slot) = self.engine.try_borrow_mut() else {
			debug!("contract-graph: controls busy, ignoring call");
			return None;
		};
		slot.as_mut().map(f)
	}

	/// True while a canvas owns an engine through this handle.
	pub fn is_mounted(&self) -> bool {
		self.engine.try_borrow().is_ok_and(|slot| slot.is_some())
	}

	/// Zoom in about the canvas center.
	pub fn zoom_in(&self) {
		self.with(GraphEngine::zoom_in);
	}

	/// Zoom out about the canvas center.
	pub fn zoom_out(&self) {
		self.with(GraphEngine::zoom_out);
	}

	/// Fit the whole graph into the canvas.
	pub fn zoom_to_fit(&self) {
		self.with(GraphEngine::zoom_to_fit);
	}

	/// Back to the initial transform.
	pub fn reset_zoom(&self) {
		self.with(GraphEngine::reset_zoom);
	}

	/// Center the node with this address. False when unmounted or not in the graph.
	pub fn zoom_to_node(&self, address: &str) -> bool {
		self.with(|engine| engine.zoom_to_node(address))
			.unwrap_or(false)
	}

	/// Current view transform, if mounted.
	pub fn transform(&self) -> Option<ViewTransform> {
		self.with(|engine| engine.transform())
	}

	/// Canvas size in pixels, if mounted.
	pub fn dimensions(&self) -> Option<(f64, f64)> {
		self.with(|engine| engine.dimensions())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::contract_graph::config::GraphConfig;
	use crate::components::contract_graph::types::GraphPayload;

	fn mounted() -> GraphControls {
		let controls = GraphControls::new();
		let mut engine = GraphEngine::new(GraphConfig::default(), 800.0, 600.0);
		let payload = GraphPayload::from_json(
			r#"{"address":"0xA","edges":[{"source":"0xA","target":"0xB","types":{"call":1}}]}"#,
		)
		.unwrap();
		engine.load(&payload).unwrap();
		*controls.cell().borrow_mut() = Some(engine);
		controls
	}

	#[test]
	fn controls_drive_the_viewport() {
		let controls = mounted();
		controls.zoom_in();
		assert_eq!(controls.transform().map(|t| t.k), Some(1.25));
		controls.reset_zoom();
		assert_eq!(controls.transform(), Some(ViewTransform::default()));
		assert!(controls.zoom_to_node("0xb"));
		assert_eq!(controls.dimensions(), Some((800.0, 600.0)));
	}

	#[test]
	fn clones_share_one_engine() {
		let controls = mounted();
		let other = controls.clone();
		other.zoom_out();
		assert_eq!(controls.transform().map(|t| t.k), Some(0.8));
	}

	#[test]
	fn unmounted_controls_are_no_ops() {
		let controls = mounted();
		controls.cell().borrow_mut().take();
		assert!(!controls.is_mounted());
		controls.zoom_in();
		controls.zoom_to_fit();
		assert!(!controls.zoom_to_node("0xb"));
		assert_eq!(controls.transform(), None);
		assert_eq!(controls.dimensions(), None);
	}

	#[test]
	fn reentrant_calls_are_ignored() {
		let controls = mounted();
		let cell = controls.cell();
		let _guard = cell.borrow_mut();
		controls.zoom_in();
		assert!(!controls.is_mounted());
	}
}

//! Pointer interaction state: node dragging, click detection and hover cards.
//!
//! Dragging and hovering are mutually exclusive. While a drag is active no new
//! hover lookups start, so dragging across other nodes does not flood the
//! enrichment endpoints.
//!
//! Hover lookups complete asynchronously. Each hover issues a [`HoverTicket`];
//! a result is applied only while its ticket is still the current one, so an
//! answer for a node the pointer already left is dropped.

use std::fmt;

use log::debug;
use serde::Deserialize;

use super::error::EnrichmentError;

/// Pointer tuning.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
	/// Screen pixels a press may travel and still count as a click.
	pub click_tolerance: f64,
}

impl Default for InteractionConfig {
	fn default() -> Self {
		Self {
			click_tolerance: 4.0,
		}
	}
}

/// Native balance of a contract, as reported by the balance endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Balance {
	/// Decimal string, already scaled to whole units.
	pub balance: String,
	/// Unit, e.g. "ETH".
	#[serde(default)]
	pub symbol: Option<String>,
}

/// Who a contract is attributed to, as reported by the attribution endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct Attribution {
	/// Contract or label name.
	#[serde(default)]
	pub name: Option<String>,
	/// Owning project.
	#[serde(default)]
	pub project: Option<String>,
	/// Source verified by the provider.
	#[serde(default)]
	pub verified: bool,
}

impl fmt::Display for Balance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.symbol {
			Some(symbol) => write!(f, "{} {symbol}", self.balance),
			None => f.write_str(&self.balance),
		}
	}
}

impl fmt::Display for Attribution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match (&self.name, &self.project) {
			(Some(name), Some(project)) => format!("{name} ({project})"),
			(Some(name), None) => name.clone(),
			(None, Some(project)) => project.clone(),
			(None, None) => "unknown".to_string(),
		};
		f.write_str(&name)?;
		if self.verified {
			f.write_str(" ✓")?;
		}
		Ok(())
	}
}

/// State of one hover card field.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldState<T> {
	/// Lookup in flight.
	Loading,
	/// Lookup succeeded.
	Ready(T),
	/// The lookup failed. Rendered as an explicit "unavailable" marker.
	Unavailable(String),
}

impl<T> FieldState<T> {
	fn from_result(result: Result<T, EnrichmentError>) -> Self {
		match result {
			Ok(value) => FieldState::Ready(value),
			Err(err) => FieldState::Unavailable(err.to_string()),
		}
	}

	/// True while the lookup is in flight.
	pub fn is_loading(&self) -> bool {
		matches!(self, FieldState::Loading)
	}
}

impl<T: fmt::Display> FieldState<T> {
	/// Text shown in the hover card. Failures never fall back to a placeholder value.
	pub fn label(&self) -> String {
		match self {
			FieldState::Loading => "loading…".to_string(),
			FieldState::Ready(value) => value.to_string(),
			FieldState::Unavailable(_) => "unavailable".to_string(),
		}
	}
}

/// Identifies one hover episode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoverTicket {
	token: u64,
	/// Address the lookups are for.
	pub address: String,
}

/// Enrichment shown next to a hovered node.
#[derive(Clone, Debug, PartialEq)]
pub struct HoverCard {
	/// Index of the hovered node.
	pub node: usize,
	/// Contract address.
	pub address: String,
	/// Display name.
	pub title: String,
	/// Balance lookup state.
	pub balance: FieldState<Balance>,
	/// Attribution lookup state.
	pub attribution: FieldState<Attribution>,
	token: u64,
}

/// Tracks an in-progress node drag.
#[derive(Clone, Debug)]
struct DragState {
	node: usize,
	start_x: f64,
	start_y: f64,
	moved: bool,
}

/// What a pointer release amounted to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
	/// No drag was active.
	Nothing,
	/// Press and release on a node without moving: select it.
	Click(usize),
	/// The node was dragged and is now released back to the simulation.
	DragEnd(usize),
}

/// Drag and hover state for one canvas.
#[derive(Debug, Default)]
pub struct InteractionController {
	config: InteractionConfig,
	drag: Option<DragState>,
	hover: Option<HoverCard>,
	next_token: u64,
}

impl InteractionController {
	/// Idle controller.
	pub fn new(config: InteractionConfig) -> Self {
		Self {
			config,
			..Self::default()
		}
	}

	/// True while a node drag is active.
	pub fn is_dragging(&self) -> bool {
		self.drag.is_some()
	}

	/// Node being dragged.
	pub fn dragged_node(&self) -> Option<usize> {
		self.drag.as_ref().map(|d| d.node)
	}

	/// Start dragging `node` from screen point `(sx, sy)`.
	pub fn begin_drag(&mut self, node: usize, sx: f64, sy: f64) {
		self.drag = Some(DragState {
			node,
			start_x: sx,
			start_y: sy,
			moved: false,
		});
	}

	/// Record pointer travel. Returns the dragged node, if any.
	pub fn drag_to(&mut self, sx: f64, sy: f64) -> Option<usize> {
		let tolerance = self.config.click_tolerance;
		let drag = self.drag.as_mut()?;
		let (dx, dy) = (sx - drag.start_x, sy - drag.start_y);
		if (dx * dx + dy * dy).sqrt() > tolerance {
			drag.moved = true;
		}
		Some(drag.node)
	}

	/// Finish a drag and classify it.
	pub fn end_drag(&mut self) -> Release {
		match self.drag.take() {
			None => Release::Nothing,
			Some(DragState {
				node,
				moved: false,
				..
			}) => Release::Click(node),
			Some(DragState { node, .. }) => Release::DragEnd(node),
		}
	}

	/// Drop any drag without producing a click, e.g. when the pointer leaves.
	pub fn cancel_drag(&mut self) -> Option<usize> {
		self.drag.take().map(|d| d.node)
	}

	/// Update the hovered node.
	///
	/// Returns a ticket when a new card was opened and lookups should start.
	/// Ignored while dragging; repeated hovers over the same node are no-ops.
	pub fn hover(&mut self, target: Option<(usize, &str, String)>) -> Option<HoverTicket> {
		if self.is_dragging() {
			return None;
		}
		let Some((node, address, title)) = target else {
			self.hover = None;
			return None;
		};
		if self.hover.as_ref().is_some_and(|card| card.node == node) {
			return None;
		}

		self.next_token += 1;
		let token = self.next_token;
		self.hover = Some(HoverCard {
			node,
			address: address.to_string(),
			title,
			balance: FieldState::Loading,
			attribution: FieldState::Loading,
			token,
		});
		Some(HoverTicket {
			token,
			address: address.to_string(),
		})
	}

	/// Card for the hovered node.
	pub fn hover_card(&self) -> Option<&HoverCard> {
		self.hover.as_ref()
	}

	/// Node under the pointer.
	pub fn hovered_node(&self) -> Option<usize> {
		self.hover.as_ref().map(|card| card.node)
	}

	fn current_card(&mut self, ticket: &HoverTicket) -> Option<&mut HoverCard> {
		match self.hover.as_mut() {
			Some(card) if card.token == ticket.token => Some(card),
			_ => {
				debug!(
					"contract-graph: dropping stale enrichment for {}",
					ticket.address
				);
				None
			}
		}
	}

	/// Apply a balance lookup. Returns false when the ticket is stale.
	pub fn apply_balance(
		&mut self,
		ticket: &HoverTicket,
		result: Result<Balance, EnrichmentError>,
	) -> bool {
		match self.current_card(ticket) {
			Some(card) => {
				card.balance = FieldState::from_result(result);
				true
			}
			None => false,
		}
	}

	/// Apply an attribution lookup. Returns false when the ticket is stale.
	pub fn apply_attribution(
		&mut self,
		ticket: &HoverTicket,
		result: Result<Attribution, EnrichmentError>,
	) -> bool {
		match self.current_card(ticket) {
			Some(card) => {
				card.attribution = FieldState::from_result(result);
				true
			}
			None => false,
		}
	}

	/// Forget all drag and hover state. Outstanding tickets become stale.
	pub fn reset(&mut self) {
		self.drag = None;
		self.hover = None;
	}
}

//! contract-graph: Interactive dependency graph visualization for smart contracts.
//!
//! This crate provides a WASM-based graph component that renders the contracts
//! a subject contract interacts with, using an energy-based layout, pan/zoom,
//! focus highlighting, hover cards and animated interaction flow.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlScriptElement, Window};

/// Leptos components.
pub mod components;

pub use components::contract_graph::{
	ContractGraphCanvas, GraphConfig, GraphControls, GraphEngine, GraphPayload, Node, PayloadError,
	RawEdge,
};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("contract-graph: logging initialized");
}

/// Text content of the `<script>` element with this id, if present.
fn script_text(id: &str) -> Option<String> {
	let window: Window = web_sys::window()?;
	let document = window.document()?;
	let element = document.get_element_by_id(id)?;
	let script: HtmlScriptElement = element.dyn_into().ok()?;
	script.text().ok()
}

/// Load the graph payload from a script element with id="graph-data".
/// Expected format: JSON with { address, edges: [...], nodes?, fromBlock?, toBlock? }
///
/// A missing element is `Ok(None)`; present but malformed data is an error.
fn load_graph_data() -> Result<Option<GraphPayload>, PayloadError> {
	let Some(json_text) = script_text("graph-data") else {
		return Ok(None);
	};
	match GraphPayload::from_json(&json_text) {
		Ok(payload) => {
			info!(
				"contract-graph: loaded {} edges for {}",
				payload.edges.len(),
				payload.address
			);
			Ok(Some(payload))
		}
		Err(e) => {
			warn!("contract-graph: failed to parse graph data: {}", e);
			Err(e)
		}
	}
}

/// Load optional overrides from a script element with id="graph-config".
/// Falls back to defaults when absent or invalid.
fn load_graph_config() -> GraphConfig {
	let Some(json_text) = script_text("graph-config") else {
		return GraphConfig::default();
	};
	GraphConfig::from_json(&json_text).unwrap_or_else(|e| {
		warn!("contract-graph: ignoring graph config: {}", e);
		GraphConfig::default()
	})
}

/// Main application component.
/// Loads the payload from the DOM and renders the dependency graph with zoom controls.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let (graph_data, load_error) = match load_graph_data() {
		Ok(data) => (data, None),
		Err(e) => (None, Some(e.to_string())),
	};
	let graph_signal = Signal::derive(move || graph_data.clone());
	let config = load_graph_config();
	let controls = GraphControls::new();
	let focused = RwSignal::new(None::<String>);
	let on_node_click = Callback::new(move |node: Node| focused.set(Some(node.id)));

	let (zoom_in, zoom_out, fit, reset) =
		(controls.clone(), controls.clone(), controls.clone(), controls.clone());

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Contract Dependencies" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ContractGraphCanvas
				data=graph_signal
				focused=Signal::derive(move || focused.get())
				on_node_click=on_node_click
				config=config
				controls=controls
				fullscreen=true
			/>
			<div class="graph-overlay">
				<h1>"Contract Dependencies"</h1>
				<p class="subtitle">
					"Click a contract to focus it. Drag to pin. Scroll to zoom. Drag background to pan."
				</p>
				{load_error.map(|e| view! { <p class="graph-error">{e}</p> })}
			</div>
			<div class="graph-controls">
				<button on:click=move |_| zoom_in.zoom_in()>"+"</button>
				<button on:click=move |_| zoom_out.zoom_out()>"−"</button>
				<button on:click=move |_| fit.zoom_to_fit()>"Fit"</button>
				<button on:click=move |_| reset.reset_zoom()>"Reset"</button>
				<button on:click=move |_| focused.set(None)>"Clear focus"</button>
			</div>
		</div>
	}
}

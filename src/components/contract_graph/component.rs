//! Leptos component wrapping the contract graph canvas.
//!
//! The component owns the browser side only: a canvas, pointer and wheel
//! handlers, the `requestAnimationFrame` loop, hover card and status overlays,
//! and the enrichment fetches. All graph state lives in the [`GraphEngine`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, warn};
use send_wrapper::SendWrapper;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::config::GraphConfig;
use super::controls::{EngineCell, GraphControls};
use super::engine::{GraphEngine, GraphStatus};
use super::enrichment::{EnrichmentConfig, fetch_attribution, fetch_balance};
use super::error::EnrichmentError;
use super::interaction::{HoverCard, HoverTicket};
use super::model::Node;
use super::render;
use super::theme::Theme;
use super::types::GraphPayload;

/// Frame delta used for the first frame and after long stalls, in seconds.
const DEFAULT_DT: f64 = 0.016;
const MAX_DT: f64 = 0.1;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;
type ResizeCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Interactive contract dependency graph on a canvas element.
///
/// `data` carries the payload; a new payload rebuilds the graph, the same one
/// again is ignored. `focused` highlights the subgraph around an address and
/// `on_node_click` receives the clicked node. Pass `controls` to drive zoom
/// from outside. Sizing follows the parent unless `fullscreen` or explicit
/// `width`/`height` are given.
#[component]
pub fn ContractGraphCanvas(
	#[prop(into)] data: Signal<Option<GraphPayload>>,
	#[prop(optional, into)] focused: MaybeProp<String>,
	#[prop(optional, into)] on_node_click: Option<Callback<Node>>,
	#[prop(optional)] config: Option<GraphConfig>,
	#[prop(optional)] controls: Option<GraphControls>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let config = config.unwrap_or_default();
	let enrichment = Rc::new(config.enrichment.clone());
	let engine: EngineCell = controls.unwrap_or_default().cell();

	let alive = Rc::new(Cell::new(true));
	let frame_handle = Rc::new(Cell::new(None::<i32>));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	let resize_cb: ResizeCallback = Rc::new(RefCell::new(None));

	let status = RwSignal::new(GraphStatus::Empty);
	let range = RwSignal::new(None::<String>);
	let card = RwSignal::new(None::<HoverCard>);
	let card_pos = RwSignal::new((0.0_f64, 0.0_f64));

	// Mount once the canvas exists.
	{
		let (engine, alive, frame_handle, animate, resize_cb) = (
			engine.clone(),
			alive.clone(),
			frame_handle.clone(),
			animate.clone(),
			resize_cb.clone(),
		);
		Effect::new(move |_| {
			let Some(canvas) = canvas_ref.get() else {
				return;
			};
			if engine.borrow().is_some() || !alive.get() {
				return;
			}
			let canvas: HtmlCanvasElement = canvas.into();
			let Some(window) = web_sys::window() else {
				return;
			};
			let (w, h) = canvas_size(&window, &canvas, fullscreen, width, height);
			canvas.set_width(w as u32);
			canvas.set_height(h as u32);

			let Some(ctx) = context_2d(&canvas) else {
				warn!("contract-graph: canvas has no 2d context");
				return;
			};

			let mut graph = GraphEngine::new(config.clone(), w, h);
			if let Some(callback) = on_node_click {
				graph.set_selection_handler(move |node: &Node| callback.run(node.clone()));
			}
			graph.focus(focused.get_untracked().as_deref());
			load_into(&mut graph, data.get_untracked().as_ref(), status, range);
			*engine.borrow_mut() = Some(graph);

			if fullscreen {
				let (engine_resize, canvas_resize) = (engine.clone(), canvas.clone());
				*resize_cb.borrow_mut() = Some(Closure::new(move || {
					let Some(win) = web_sys::window() else {
						return;
					};
					let (nw, nh) = window_size(&win);
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					if let Some(graph) = engine_resize.borrow_mut().as_mut() {
						graph.resize(nw, nh);
					}
				}));
				if let Some(cb) = resize_cb.borrow().as_ref() {
					let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
			}

			let theme = Theme::default();
			let (engine_anim, animate_inner, alive_anim, handle_anim) = (
				engine.clone(),
				animate.clone(),
				alive.clone(),
				frame_handle.clone(),
			);
			let mut last: Option<f64> = None;
			*animate.borrow_mut() = Some(Closure::new(move |now: f64| {
				if !alive_anim.get() {
					return;
				}
				let dt = last.map_or(DEFAULT_DT, |prev| ((now - prev) / 1000.0).clamp(0.0, MAX_DT));
				last = Some(now);
				if let Some(graph) = engine_anim.borrow_mut().as_mut() {
					graph.frame(dt);
					render::render(graph, &ctx, &theme);
				}
				if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
					handle_anim.set(win.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
				}
			}));
			if let Some(cb) = animate.borrow().as_ref() {
				frame_handle.set(window.request_animation_frame(cb.as_ref().unchecked_ref()).ok());
			}
		});
	}

	// Later payloads. The lifecycle guard skips the one loaded at mount.
	{
		let engine = engine.clone();
		Effect::new(move |_| {
			let payload = data.get();
			if let Some(graph) = engine.borrow_mut().as_mut() {
				load_into(graph, payload.as_ref(), status, range);
				card.set(None);
			}
		});
	}

	{
		let engine = engine.clone();
		Effect::new(move |_| {
			let address = focused.get();
			if let Some(graph) = engine.borrow_mut().as_mut() {
				graph.focus(address.as_deref());
			}
		});
	}

	// Teardown: stop the frame loop, detach listeners, dispose and drop the engine.
	{
		let teardown = SendWrapper::new((
			engine.clone(),
			alive.clone(),
			frame_handle.clone(),
			animate.clone(),
			resize_cb.clone(),
		));
		on_cleanup(move || {
			let (engine, alive, frame_handle, animate, resize_cb) = teardown.take();
			alive.set(false);
			if let Some(window) = web_sys::window() {
				if let Some(handle) = frame_handle.take() {
					let _ = window.cancel_animation_frame(handle);
				}
				if let Some(cb) = resize_cb.borrow().as_ref() {
					let _ =
						window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
				}
			}
			if let Some(mut graph) = engine.borrow_mut().take() {
				graph.dispose();
			}
			animate.borrow_mut().take();
			resize_cb.borrow_mut().take();
		});
	}

	let engine_md = engine.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(graph) = engine_md.borrow_mut().as_mut() {
			graph.pointer_down(x, y);
		}
		card.set(None);
	};

	let (engine_mm, enrichment_mm) = (engine.clone(), enrichment.clone());
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		let (ticket, current) = match engine_mm.borrow_mut().as_mut() {
			Some(graph) => (graph.pointer_move(x, y), graph.hover_card().cloned()),
			None => return,
		};
		if ticket.is_some() {
			card_pos.set((x, y));
		}
		if card.with_untracked(|shown| shown != &current) {
			card.set(current);
		}
		if let Some(ticket) = ticket {
			spawn_lookups(engine_mm.clone(), enrichment_mm.clone(), ticket, card);
		}
	};

	let engine_mu = engine.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let (x, y) = local_point(canvas_ref, &ev).unwrap_or_default();
		if let Some(graph) = engine_mu.borrow_mut().as_mut() {
			graph.pointer_up(x, y);
		}
	};

	let engine_ml = engine.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(graph) = engine_ml.borrow_mut().as_mut() {
			graph.pointer_leave();
		}
		card.set(None);
	};

	let engine_wh = engine.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = local_point(canvas_ref, &ev) else {
			return;
		};
		if let Some(graph) = engine_wh.borrow_mut().as_mut() {
			graph.wheel(x, y, ev.delta_y());
		}
	};

	let status_overlay = move || match status.get() {
		GraphStatus::NoDependencies => {
			let detail = range.get().map(|r| format!(" ({r})")).unwrap_or_default();
			Some(
				view! {
					<div class="graph-status">{format!("No dependencies in range{detail}")}</div>
				}
				.into_any(),
			)
		}
		GraphStatus::Malformed(message) => Some(
			view! {
				<div class="graph-status graph-status-error">
					{format!("Malformed graph data: {message}")}
				</div>
			}
			.into_any(),
		),
		GraphStatus::Empty | GraphStatus::Ready => None,
	};

	let hover_overlay = move || {
		card.get().map(|c| {
			let (x, y) = card_pos.get();
			view! {
				<div
					class="graph-hover-card"
					style=format!("position: absolute; left: {}px; top: {}px; pointer-events: none;", x + 12.0, y + 12.0)
				>
					<div class="graph-hover-title">{c.title.clone()}</div>
					<div class="graph-hover-address">{c.address.clone()}</div>
					<div class="graph-hover-field">"Balance: " {c.balance.label()}</div>
					<div class="graph-hover-field">"Attribution: " {c.attribution.label()}</div>
				</div>
			}
		})
	};

	view! {
		<div class="contract-graph" style="position: relative; width: 100%; height: 100%;">
			<canvas
				node_ref=canvas_ref
				class="contract-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{status_overlay}
			{hover_overlay}
		</div>
	}
}

fn load_into(
	graph: &mut GraphEngine,
	payload: Option<&GraphPayload>,
	status: RwSignal<GraphStatus>,
	range: RwSignal<Option<String>>,
) {
	let Some(payload) = payload else {
		return;
	};
	if let Err(err) = graph.load(payload) {
		debug!("contract-graph: payload rejected: {err}");
	}
	status.set(graph.status().clone());
	range.set(graph.range_label().map(str::to_string));
}

/// Start both hover lookups. Each lands independently and only while the
/// ticket is still current.
fn spawn_lookups(
	engine: EngineCell,
	config: Rc<EnrichmentConfig>,
	ticket: HoverTicket,
	card: RwSignal<Option<HoverCard>>,
) {
	{
		let (engine, config, ticket) = (engine.clone(), config.clone(), ticket.clone());
		spawn_local(async move {
			let result = fetch_balance(&config, &ticket.address).await;
			log_failure("balance", &ticket, &result);
			publish(&engine, card, |graph| graph.apply_balance(&ticket, result));
		});
	}
	spawn_local(async move {
		let result = fetch_attribution(&config, &ticket.address).await;
		log_failure("attribution", &ticket, &result);
		publish(&engine, card, |graph| graph.apply_attribution(&ticket, result));
	});
}

fn log_failure<T>(field: &str, ticket: &HoverTicket, result: &Result<T, EnrichmentError>) {
	match result {
		Ok(_) | Err(EnrichmentError::NotConfigured) => {}
		Err(err) => warn!("contract-graph: {field} lookup for {} failed: {err}", ticket.address),
	}
}

fn publish(
	engine: &EngineCell,
	card: RwSignal<Option<HoverCard>>,
	apply: impl FnOnce(&mut GraphEngine) -> bool,
) {
	let mut slot = engine.borrow_mut();
	let Some(graph) = slot.as_mut() else {
		return;
	};
	if !apply(graph) {
		return;
	}
	let updated = graph.hover_card().cloned();
	drop(slot);
	card.set(updated);
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

fn window_size(window: &Window) -> (f64, f64) {
	let dim = |v: Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(dim(window.inner_width(), 800.0), dim(window.inner_height(), 600.0))
}

fn canvas_size(
	window: &Window,
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		return window_size(window);
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.filter(|w| *w > 0.0)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.filter(|h| *h > 0.0)
				.unwrap_or(600.0)
		}),
	)
}

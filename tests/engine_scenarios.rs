//! End-to-end scenarios driven through the headless engine.

#![allow(unused_crate_dependencies)]

use std::cell::RefCell;
use std::rc::Rc;

use contract_graph::components::contract_graph::engine::{GraphEngine, GraphStatus, LoadOutcome};
use contract_graph::components::contract_graph::error::EnrichmentError;
use contract_graph::components::contract_graph::highlight::{HighlightMode, LinkTone};
use contract_graph::components::contract_graph::interaction::{
	Attribution, Balance, FieldState, Release,
};
use contract_graph::components::contract_graph::model::NodeGroup;
use contract_graph::components::contract_graph::scale::ScaleConfig;
use contract_graph::{GraphConfig, GraphPayload};

const SINGLE: &str = r#"{
	"address": "0xAAA",
	"edges": [{ "source": "0xAAA", "target": "0xBBB", "types": { "call": 3 } }]
}"#;

const CHAIN: &str = r#"{
	"address": "0xAAA",
	"edges": [
		{ "source": "0xAAA", "target": "0xBBB", "types": { "call": 3 } },
		{ "source": "0xBBB", "target": "0xCCC", "types": { "delegatecall": 1 } }
	],
	"fromBlock": 100,
	"toBlock": 200
}"#;

fn payload(json: &str) -> GraphPayload {
	GraphPayload::from_json(json).unwrap()
}

fn engine_with(json: &str) -> GraphEngine {
	let mut engine = GraphEngine::new(GraphConfig::default(), 800.0, 600.0);
	engine.load(&payload(json)).unwrap();
	engine
}

/// Screen position of the node with this address.
fn screen_pos(engine: &GraphEngine, address: &str) -> (f64, f64) {
	let idx = engine.model().node_index(address).unwrap();
	let node = &engine.nodes()[idx];
	engine.transform().apply(node.x, node.y)
}

#[test]
fn single_edge_builds_two_nodes_and_one_link() {
	let engine = engine_with(SINGLE);

	assert_eq!(*engine.status(), GraphStatus::Ready);
	let nodes = engine.nodes();
	assert_eq!(nodes.len(), 2);
	assert_eq!(nodes[0].group, NodeGroup::Main);
	assert_eq!(nodes[1].group, NodeGroup::Other);

	let links = engine.links();
	assert_eq!(links.len(), 1);
	assert_eq!((links[0].kind.as_str(), links[0].count), ("call", 3));
	assert_eq!((links[0].source, links[0].target), (0, 1));
}

#[test]
fn empty_edges_report_no_dependencies_with_range() {
	let mut engine = GraphEngine::new(GraphConfig::default(), 800.0, 600.0);
	let empty = payload(r#"{"address":"0xAAA","edges":[],"fromBlock":5,"toBlock":9}"#);

	assert_eq!(engine.load(&empty).unwrap(), LoadOutcome::NoDependencies);
	assert_eq!(*engine.status(), GraphStatus::NoDependencies);
	assert!(engine.nodes().is_empty());
	assert_eq!(engine.range_label(), Some("blocks 5 to 9"));
	assert!(!engine.frame(0.016));

	// Same empty payload again stays empty without rebuilding.
	let rebuilds = engine.rebuilds();
	assert_eq!(engine.load(&empty).unwrap(), LoadOutcome::NoDependencies);
	assert_eq!(engine.rebuilds(), rebuilds);
}

#[test]
fn focus_highlights_direct_and_transitive_links() {
	let mut engine = engine_with(CHAIN);
	engine.focus(Some("0xbbb"));
	for _ in 0..120 {
		engine.frame(0.016);
	}

	let highlight = engine.highlight();
	assert_eq!(*highlight.mode(), HighlightMode::Focused("0xbbb".into()));

	let bbb = engine.model().node_index("0xBBB").unwrap();
	let aaa = engine.model().node_index("0xAAA").unwrap();
	assert_eq!(highlight.node_opacity(bbb), 1.0);
	assert!(highlight.node_opacity(aaa) < 1.0);

	// AAA -> BBB touches the subject; BBB -> CCC does not.
	assert_eq!(highlight.link_style(0).tone, LinkTone::Direct);
	assert_eq!(highlight.link_style(1).tone, LinkTone::Transitive);
	assert_eq!(highlight.link_opacity(0), 1.0);
	assert_eq!(highlight.link_opacity(1), 1.0);

	engine.focus(None);
	assert_eq!(engine.highlight().link_style(0).tone, LinkTone::Default);
}

#[test]
fn focusing_an_unknown_address_stays_neutral_looking() {
	let mut engine = engine_with(CHAIN);
	engine.focus(Some("0xdead"));
	engine.frame(0.016);

	let highlight = engine.highlight();
	assert_eq!(*highlight.mode(), HighlightMode::Focused("0xdead".into()));
	for idx in 0..engine.nodes().len() {
		assert_eq!(highlight.node_opacity(idx), 1.0);
	}
}

#[test]
fn identical_payload_is_unchanged_and_new_payload_rebuilds() {
	let mut engine = engine_with(SINGLE);
	let rebuilds = engine.rebuilds();

	assert_eq!(engine.load(&payload(SINGLE)).unwrap(), LoadOutcome::Unchanged);
	assert_eq!(engine.rebuilds(), rebuilds);

	assert_eq!(
		engine.load(&payload(CHAIN)).unwrap(),
		LoadOutcome::Rebuilt { nodes: 3, links: 2 }
	);
	assert_eq!(engine.rebuilds(), rebuilds + 1);
	assert_eq!(engine.range_label(), Some("blocks 100 to 200"));
}

#[test]
fn dispose_tears_everything_down() {
	let mut engine = engine_with(SINGLE);
	let fired = Rc::new(RefCell::new(0_u32));
	let counter = Rc::clone(&fired);
	engine.subscribe_ticks(move |_, _| *counter.borrow_mut() += 1).unwrap();
	engine.set_selection_handler(|_| {});
	engine.frame(0.016);
	assert_eq!(*fired.borrow(), 1);

	engine.dispose();
	let ticks = engine.tick_count();
	let late = engine.late_calls();

	assert!(!engine.frame(0.016));
	engine.zoom_in();
	engine.pointer_down(400.0, 300.0);
	assert_eq!(engine.tick_count(), ticks);
	assert_eq!(*fired.borrow(), 1);
	assert_eq!(engine.listener_count(), 0);
	assert!(!engine.has_selection_handler());
	assert_eq!(engine.flow().active_count(), 0);
	assert_eq!(engine.late_calls(), late + 3);
	assert_eq!(engine.load(&payload(CHAIN)).unwrap(), LoadOutcome::Ignored);
	assert!(engine.subscribe_ticks(|_, _| {}).is_none());
}

#[test]
fn dragging_pins_the_node_until_release() {
	let mut engine = engine_with(SINGLE);
	let (sx, sy) = screen_pos(&engine, "0xBBB");
	let idx = engine.model().node_index("0xBBB").unwrap();
	let (nx, ny) = (engine.nodes()[idx].x, engine.nodes()[idx].y);

	engine.pointer_down(sx, sy);
	assert_eq!(engine.dragged_node(), Some(idx));
	assert!(engine.nodes()[idx].is_pinned());

	// At k = 1 the node follows the pointer one to one.
	engine.pointer_move(sx + 50.0, sy + 20.0);
	let (px, py) = engine.nodes()[idx].pin().unwrap();
	assert!((px - (nx + 50.0)).abs() < 1e-9 && (py - (ny + 20.0)).abs() < 1e-9);

	for _ in 0..30 {
		engine.frame(0.016);
	}
	assert_eq!(engine.nodes()[idx].pin(), Some((px, py)));
	assert_eq!((engine.nodes()[idx].x, engine.nodes()[idx].y), (px, py));

	assert_eq!(engine.pointer_up(sx + 50.0, sy + 20.0), Release::DragEnd(idx));
	assert!(!engine.nodes()[idx].is_pinned());
	assert_eq!(engine.dragged_node(), None);
}

#[test]
fn click_selects_the_logical_node() {
	let mut engine = engine_with(SINGLE);
	let selected = Rc::new(RefCell::new(Vec::new()));
	let sink = Rc::clone(&selected);
	engine.set_selection_handler(move |node| sink.borrow_mut().push(node.id.clone()));

	let (sx, sy) = screen_pos(&engine, "0xBBB");
	engine.pointer_down(sx, sy);
	engine.pointer_move(sx + 2.0, sy + 1.0);
	let idx = engine.model().node_index("0xBBB").unwrap();
	assert_eq!(engine.pointer_up(sx + 2.0, sy + 1.0), Release::Click(idx));

	assert_eq!(*selected.borrow(), vec!["0xbbb".to_string()]);
	assert!(!engine.nodes()[idx].is_pinned());
}

#[test]
fn stale_enrichment_is_dropped_and_failures_stay_explicit() {
	let mut engine = engine_with(SINGLE);
	let (ax, ay) = screen_pos(&engine, "0xAAA");
	let (bx, by) = screen_pos(&engine, "0xBBB");

	let first = engine.pointer_move(ax, ay).unwrap();
	assert_eq!(first.address, "0xAAA");
	let second = engine.pointer_move(bx, by).unwrap();

	// The lookup for the first hover lands after the pointer moved on.
	let balance = Balance {
		balance: "1.5".into(),
		symbol: Some("ETH".into()),
	};
	assert!(!engine.apply_balance(&first, Ok(balance.clone())));

	assert!(engine.apply_balance(&second, Ok(balance)));
	assert!(engine.apply_attribution(&second, Err(EnrichmentError::Http { status: 503 })));

	let card = engine.hover_card().unwrap();
	assert_eq!(card.address, "0xBBB");
	assert_eq!(card.balance.label(), "1.5 ETH");
	assert!(matches!(card.attribution, FieldState::Unavailable(_)));
	assert_eq!(card.attribution.label(), "unavailable");

	engine.pointer_leave();
	assert!(engine.hover_card().is_none());
	assert!(!engine.apply_attribution(&second, Ok(Attribution::default())));
}

#[test]
fn heavier_links_are_never_thinner() {
	let scale = ScaleConfig::default();
	let mut engine = GraphEngine::new(GraphConfig::default(), 800.0, 600.0).with_scale(scale.clone());
	engine
		.load(&payload(
			r#"{"address":"0xA","edges":[
				{"source":"0xA","target":"0xB","types":{"call":1}},
				{"source":"0xA","target":"0xC","types":{"call":40}},
				{"source":"0xA","target":"0xD","types":{"call":5000}}
			]}"#,
		))
		.unwrap();

	let scaled = engine.scaled();
	let widths: Vec<f64> = engine
		.links()
		.iter()
		.map(|link| scaled.link_width(engine.scale(), link.count))
		.collect();
	assert!(widths[0] <= widths[1] && widths[1] <= widths[2], "{widths:?}");
}

#[test]
fn malformed_payload_is_reported_and_recovers() {
	let mut engine = engine_with(SINGLE);
	let bad = payload_unchecked(r#"{"address":"0xA","edges":[{"source":"","target":"0xB","types":{"call":1}}]}"#);

	assert!(engine.load(&bad).is_err());
	assert!(matches!(engine.status(), GraphStatus::Malformed(_)));
	assert!(engine.nodes().is_empty());
	// Same bad data again is still an error.
	assert!(engine.load(&bad).is_err());

	assert!(matches!(engine.load(&payload(SINGLE)).unwrap(), LoadOutcome::Rebuilt { .. }));
	assert_eq!(*engine.status(), GraphStatus::Ready);
}

fn payload_unchecked(json: &str) -> GraphPayload {
	serde_json::from_str(json).unwrap()
}

//! Canvas rendering for the contract graph.
//!
//! Drawing runs in passes for z-ordering:
//! 1. Background (screen space)
//! 2. Links with arrowheads (transitive ones dashed), then flow indicators (world space)
//! 3. Dependency nodes, then the subject contract, then labels on top
//!
//! Everything is read from the engine after the frame's tick, so links, flow
//! indicators and nodes always agree on positions.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::engine::GraphEngine;
use super::highlight::LinkTone;
use super::model::Node;
use super::scale::ScaledValues;
use super::theme::{Color, Theme};

pub fn render(engine: &GraphEngine, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let (width, height) = engine.dimensions();
	draw_background(ctx, theme, width, height);

	let transform = engine.transform();
	let scaled = engine.scaled();

	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);

	draw_links(engine, ctx, &scaled, theme);
	draw_flow(engine, ctx, &scaled, theme);
	draw_nodes(engine, ctx, &scaled, theme);

	ctx.restore();
}

fn draw_background(ctx: &CanvasRenderingContext2d, theme: &Theme, width: f64, height: f64) {
	match ctx.create_radial_gradient(
		width / 2.0,
		height / 2.0,
		0.0,
		width / 2.0,
		height / 2.0,
		width.max(height) * 0.8,
	) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background_secondary.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&theme.background.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, width, height);
}

fn radius_of(node: &Node, scaled: &ScaledValues) -> f64 {
	scaled.radius(node.is_main())
}

fn draw_links(
	engine: &GraphEngine,
	ctx: &CanvasRenderingContext2d,
	scaled: &ScaledValues,
	theme: &Theme,
) {
	let nodes = engine.nodes();
	let highlight = engine.highlight();

	for (idx, link) in engine.links().iter().enumerate() {
		let (Some(source), Some(target)) = (nodes.get(link.source), nodes.get(link.target)) else {
			continue;
		};
		let (dx, dy) = (target.x - source.x, target.y - source.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}
		let (ux, uy) = (dx / dist, dy / dist);
		let (r_source, r_target) = (radius_of(source, scaled), radius_of(target, scaled));
		if dist <= r_source + r_target {
			continue;
		}

		let opacity = highlight.link_opacity(idx);
		let tone = highlight.link_style(idx).tone;
		let color = theme.link_color(tone).fade(opacity);
		let arrow = if scaled.cull_arrows {
			0.0
		} else {
			scaled.arrow_size
		};

		ctx.set_stroke_style_str(&color.to_css());
		ctx.set_line_width(scaled.link_width(engine.scale(), link.count));
		if tone == LinkTone::Transitive {
			let (dash, gap) = scaled.transitive_dash;
			let _ = ctx.set_line_dash(&js_sys::Array::of2(
				&JsValue::from_f64(dash),
				&JsValue::from_f64(gap),
			));
		}
		ctx.begin_path();
		ctx.move_to(source.x + ux * r_source, source.y + uy * r_source);
		ctx.line_to(
			target.x - ux * (r_target + arrow),
			target.y - uy * (r_target + arrow),
		);
		ctx.stroke();
		if tone == LinkTone::Transitive {
			let _ = ctx.set_line_dash(&js_sys::Array::new());
		}

		if arrow > 0.0 {
			ctx.set_fill_style_str(&color.fade(scaled.arrow_alpha).to_css());
			let (tip_x, tip_y) = (target.x - ux * r_target, target.y - uy * r_target);
			let (back_x, back_y) = (tip_x - ux * arrow, tip_y - uy * arrow);
			let (px, py) = (-uy * arrow * 0.5, ux * arrow * 0.5);

			ctx.begin_path();
			ctx.move_to(tip_x, tip_y);
			ctx.line_to(back_x + px, back_y + py);
			ctx.line_to(back_x - px, back_y - py);
			ctx.close_path();
			ctx.fill();
		}
	}
}

fn draw_flow(
	engine: &GraphEngine,
	ctx: &CanvasRenderingContext2d,
	scaled: &ScaledValues,
	theme: &Theme,
) {
	let highlight = engine.highlight();
	for idx in 0..engine.links().len() {
		let Some(sample) = engine.flow_sample(idx) else {
			continue;
		};
		let alpha = sample.opacity * highlight.link_opacity(idx);
		if alpha < 0.01 {
			continue;
		}
		ctx.set_fill_style_str(&theme.flow.fade(alpha).to_css());
		ctx.begin_path();
		let _ = ctx.arc(sample.x, sample.y, scaled.flow_radius, 0.0, 2.0 * PI);
		ctx.fill();
	}
}

fn draw_nodes(
	engine: &GraphEngine,
	ctx: &CanvasRenderingContext2d,
	scaled: &ScaledValues,
	theme: &Theme,
) {
	let highlight = engine.highlight();
	let nodes = engine.nodes();

	// Subject contract last so it stays on top.
	let order = nodes
		.iter()
		.enumerate()
		.filter(|(_, n)| !n.is_main())
		.chain(nodes.iter().enumerate().filter(|(_, n)| n.is_main()));
	for (idx, node) in order {
		let alpha = highlight.node_opacity(idx);
		let hovered = engine.hovered_node() == Some(idx) || engine.dragged_node() == Some(idx);
		draw_node(ctx, node, scaled, theme, alpha, hovered);
	}

	if scaled.label_alpha <= 0.01 {
		return;
	}
	ctx.set_font(&scaled.label_font);
	for (idx, node) in nodes.iter().enumerate() {
		let alpha = highlight.node_opacity(idx) * scaled.label_alpha;
		if alpha < 0.05 {
			continue;
		}
		let radius = radius_of(node, scaled);
		ctx.set_fill_style_str(&theme.label.fade(alpha).to_css());
		let _ = ctx.fill_text(&node.display_name(), node.x + radius + 4.0 / scaled.k, node.y + 3.0 / scaled.k);
	}
}

fn draw_node(
	ctx: &CanvasRenderingContext2d,
	node: &Node,
	scaled: &ScaledValues,
	theme: &Theme,
	alpha: f64,
	hovered: bool,
) {
	let (x, y) = (node.x, node.y);
	let radius = radius_of(node, scaled);
	let base = theme.node_color(node.group);
	let base = if hovered { base.lighten(0.2) } else { base };

	ctx.set_global_alpha(alpha);
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	match ctx.create_radial_gradient(x - radius * 0.3, y - radius * 0.3, 0.0, x, y, radius) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &base.lighten(0.4).to_css());
			let _ = gradient.add_color_stop(1.0, &base.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&base.to_css()),
	}
	ctx.fill();

	if node.is_pinned() {
		draw_ring(ctx, x, y, radius + 2.0 * scaled.pin_ring_width, scaled.pin_ring_width, theme.pin_ring);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_ring(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, width: f64, color: Color) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(width);
	ctx.stroke();
}

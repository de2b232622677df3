//! Pan and zoom transform for the graph view.
//!
//! The transform maps graph space to screen space as `screen = graph * k + (x, y)`.
//! It is presentation only: nothing here writes node positions.

use serde::Deserialize;

/// Zoom limits and step sizes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
	/// Smallest allowed scale.
	pub min_scale: f64,
	/// Largest allowed scale.
	pub max_scale: f64,
	/// Zoom factor per wheel notch.
	pub wheel_step: f64,
	/// Zoom factor per zoom-in/zoom-out control press.
	pub button_step: f64,
	/// Screen-space margin kept around the graph by zoom-to-fit.
	pub fit_padding: f64,
	/// Minimum scale used when zooming to a single node.
	pub focus_scale: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.1,
			max_scale: 4.0,
			wheel_step: 1.1,
			button_step: 1.25,
			fit_padding: 40.0,
			focus_scale: 1.5,
		}
	}
}

/// Axis-aligned box in graph space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	/// Left edge.
	pub min_x: f64,
	/// Top edge.
	pub min_y: f64,
	/// Right edge.
	pub max_x: f64,
	/// Bottom edge.
	pub max_y: f64,
}

impl Bounds {
	/// Smallest box containing all points, or `None` for no points.
	pub fn around(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
		points.into_iter().fold(None, |acc: Option<Bounds>, (x, y)| {
			Some(match acc {
				None => Bounds {
					min_x: x,
					min_y: y,
					max_x: x,
					max_y: y,
				},
				Some(b) => Bounds {
					min_x: b.min_x.min(x),
					min_y: b.min_y.min(y),
					max_x: b.max_x.max(x),
					max_y: b.max_y.max(y),
				},
			})
		})
	}

	/// Horizontal extent.
	pub fn width(&self) -> f64 {
		self.max_x - self.min_x
	}

	/// Vertical extent.
	pub fn height(&self) -> f64 {
		self.max_y - self.min_y
	}

	/// Midpoint.
	pub fn center(&self) -> (f64, f64) {
		(
			(self.min_x + self.max_x) / 2.0,
			(self.min_y + self.max_y) / 2.0,
		)
	}
}

/// Translate + uniform scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	/// Screen-space x offset.
	pub x: f64,
	/// Screen-space y offset.
	pub y: f64,
	/// Zoom factor (1.0 = 100%).
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self {
			x: 0.0,
			y: 0.0,
			k: 1.0,
		}
	}
}

impl ViewTransform {
	/// Graph point to screen point.
	pub fn apply(&self, gx: f64, gy: f64) -> (f64, f64) {
		(gx * self.k + self.x, gy * self.k + self.y)
	}

	/// Screen point to graph point.
	pub fn invert(&self, sx: f64, sy: f64) -> (f64, f64) {
		((sx - self.x) / self.k, (sy - self.y) / self.k)
	}
}

/// Tracks an in-progress background pan.
#[derive(Clone, Debug, Default)]
struct PanState {
	active: bool,
	start_x: f64,
	start_y: f64,
	transform_start_x: f64,
	transform_start_y: f64,
}

/// Owns the view transform and the canvas dimensions.
#[derive(Clone, Debug)]
pub struct ViewportController {
	transform: ViewTransform,
	config: ViewportConfig,
	width: f64,
	height: f64,
	pan: PanState,
}

impl ViewportController {
	/// Viewport for a canvas of `width` by `height`, at the clamped unit scale.
	pub fn new(width: f64, height: f64, config: ViewportConfig) -> Self {
		let mut viewport = Self {
			transform: ViewTransform::default(),
			config,
			width,
			height,
			pan: PanState::default(),
		};
		viewport.transform = viewport.home();
		viewport
	}

	/// Unit scale clamped into the zoom bounds, anchored at the canvas
	/// center. Identity whenever 1.0 is within bounds.
	fn home(&self) -> ViewTransform {
		let k = self.clamp_scale(1.0);
		ViewTransform {
			x: self.width / 2.0 * (1.0 - k),
			y: self.height / 2.0 * (1.0 - k),
			k,
		}
	}

	/// Current transform.
	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	/// Canvas width and height in screen pixels.
	pub fn dimensions(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// New canvas size. The transform is kept.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Screen point to graph point.
	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		self.transform.invert(sx, sy)
	}

	/// Graph point to screen point.
	pub fn graph_to_screen(&self, gx: f64, gy: f64) -> (f64, f64) {
		self.transform.apply(gx, gy)
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		k.clamp(self.config.min_scale, self.config.max_scale)
	}

	/// Start a background pan at a screen point.
	pub fn begin_pan(&mut self, sx: f64, sy: f64) {
		self.pan = PanState {
			active: true,
			start_x: sx,
			start_y: sy,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	/// Move an active pan to the pointer. Returns false when no pan is active.
	pub fn pan_to(&mut self, sx: f64, sy: f64) -> bool {
		if !self.pan.active {
			return false;
		}
		self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
		self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
		true
	}

	/// Stop panning.
	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// True while a pan is active.
	pub fn is_panning(&self) -> bool {
		self.pan.active
	}

	/// Scale by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, factor: f64) {
		let new_k = self.clamp_scale(self.transform.k * factor);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Wheel zoom anchored at the pointer. Positive `delta_y` zooms out.
	pub fn wheel(&mut self, sx: f64, sy: f64, delta_y: f64) {
		if delta_y == 0.0 {
			return;
		}
		let factor = if delta_y > 0.0 {
			1.0 / self.config.wheel_step
		} else {
			self.config.wheel_step
		};
		self.zoom_at(sx, sy, factor);
	}

	/// Zoom in about the canvas center.
	pub fn zoom_in(&mut self) {
		self.zoom_at(self.width / 2.0, self.height / 2.0, self.config.button_step);
	}

	/// Zoom out about the canvas center.
	pub fn zoom_out(&mut self) {
		self.zoom_at(
			self.width / 2.0,
			self.height / 2.0,
			1.0 / self.config.button_step,
		);
	}

	/// Back to the unit scale, clamped into bounds.
	pub fn reset(&mut self) {
		self.transform = self.home();
		self.pan = PanState::default();
	}

	/// Fit `bounds` into the canvas with the configured padding.
	pub fn zoom_to_fit(&mut self, bounds: Option<Bounds>) {
		let Some(bounds) = bounds else {
			self.reset();
			return;
		};
		let available_w = (self.width - 2.0 * self.config.fit_padding).max(1.0);
		let available_h = (self.height - 2.0 * self.config.fit_padding).max(1.0);
		let k = if bounds.width() <= f64::EPSILON && bounds.height() <= f64::EPSILON {
			1.0
		} else {
			let kx = available_w / bounds.width().max(f64::EPSILON);
			let ky = available_h / bounds.height().max(f64::EPSILON);
			kx.min(ky)
		};
		self.center_on(bounds.center(), self.clamp_scale(k));
	}

	/// Center a graph-space point, zooming in to at least `focus_scale`.
	pub fn zoom_to_point(&mut self, gx: f64, gy: f64) {
		let k = self.clamp_scale(self.transform.k.max(self.config.focus_scale));
		self.center_on((gx, gy), k);
	}

	fn center_on(&mut self, (gx, gy): (f64, f64), k: f64) {
		self.transform = ViewTransform {
			x: self.width / 2.0 - gx * k,
			y: self.height / 2.0 - gy * k,
			k,
		};
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> ViewportController {
		ViewportController::new(800.0, 600.0, ViewportConfig::default())
	}

	#[test]
	fn screen_graph_round_trip() {
		let mut vp = viewport();
		vp.zoom_at(100.0, 50.0, 2.0);
		vp.begin_pan(0.0, 0.0);
		vp.pan_to(30.0, -20.0);
		let (gx, gy) = vp.screen_to_graph(320.0, 240.0);
		let (sx, sy) = vp.graph_to_screen(gx, gy);
		assert!((sx - 320.0).abs() < 1e-9 && (sy - 240.0).abs() < 1e-9);
	}

	#[test]
	fn zoom_keeps_anchor_fixed() {
		let mut vp = viewport();
		let before = vp.screen_to_graph(200.0, 150.0);
		vp.zoom_at(200.0, 150.0, 1.7);
		let after = vp.screen_to_graph(200.0, 150.0);
		assert!((before.0 - after.0).abs() < 1e-9);
		assert!((before.1 - after.1).abs() < 1e-9);
	}

	#[test]
	fn scale_is_clamped_to_default_bounds() {
		let mut vp = viewport();
		for _ in 0..100 {
			vp.zoom_in();
		}
		assert_eq!(vp.transform().k, 4.0);
		for _ in 0..200 {
			vp.wheel(10.0, 10.0, 1.0);
		}
		assert_eq!(vp.transform().k, 0.1);
	}

	#[test]
	fn pan_only_while_active() {
		let mut vp = viewport();
		assert!(!vp.pan_to(50.0, 50.0));
		vp.begin_pan(10.0, 10.0);
		assert!(vp.pan_to(60.0, 35.0));
		assert_eq!(vp.transform().x, 50.0);
		assert_eq!(vp.transform().y, 25.0);
		vp.end_pan();
		assert!(!vp.is_panning());
		assert!(!vp.pan_to(0.0, 0.0));
	}

	#[test]
	fn fit_places_bounds_inside_canvas() {
		let mut vp = viewport();
		let bounds = Bounds {
			min_x: -500.0,
			min_y: -100.0,
			max_x: 1500.0,
			max_y: 300.0,
		};
		vp.zoom_to_fit(Some(bounds));
		let (x0, y0) = vp.graph_to_screen(bounds.min_x, bounds.min_y);
		let (x1, y1) = vp.graph_to_screen(bounds.max_x, bounds.max_y);
		assert!(x0 >= 39.9 && x1 <= 760.1, "{x0}..{x1}");
		assert!(y0 >= 0.0 && y1 <= 600.0);
		let (cx, cy) = vp.graph_to_screen(500.0, 100.0);
		assert!((cx - 400.0).abs() < 1e-9 && (cy - 300.0).abs() < 1e-9);
	}

	#[test]
	fn fit_without_bounds_resets() {
		let mut vp = viewport();
		vp.zoom_in();
		vp.zoom_to_fit(None);
		assert_eq!(vp.transform(), ViewTransform::default());
	}

	#[test]
	fn zoom_to_point_centers_it() {
		let mut vp = viewport();
		vp.zoom_to_point(120.0, -80.0);
		assert_eq!(vp.transform().k, 1.5);
		let (sx, sy) = vp.graph_to_screen(120.0, -80.0);
		assert!((sx - 400.0).abs() < 1e-9 && (sy - 300.0).abs() < 1e-9);
	}

	#[test]
	fn initial_and_reset_scale_respect_bounds() {
		let config = ViewportConfig {
			min_scale: 2.0,
			max_scale: 8.0,
			..ViewportConfig::default()
		};
		let mut vp = ViewportController::new(800.0, 600.0, config);
		assert_eq!(vp.transform().k, 2.0);
		// The canvas center stays where the layout centers the graph.
		assert_eq!(vp.screen_to_graph(400.0, 300.0), (400.0, 300.0));

		vp.zoom_in();
		vp.reset();
		assert_eq!(vp.transform().k, 2.0);

		let capped = ViewportConfig {
			min_scale: 0.1,
			max_scale: 0.5,
			..ViewportConfig::default()
		};
		assert_eq!(ViewportController::new(800.0, 600.0, capped).transform().k, 0.5);
	}

	#[test]
	fn bounds_around_points() {
		assert_eq!(Bounds::around(Vec::new()), None);
		let b = Bounds::around(vec![(1.0, 5.0), (-3.0, 2.0), (4.0, -1.0)]).unwrap();
		assert_eq!((b.min_x, b.min_y, b.max_x, b.max_y), (-3.0, -1.0, 4.0, 5.0));
	}
}

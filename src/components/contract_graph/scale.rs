//! Zoom-dependent sizing for graph visuals.
//!
//! Drawing happens after the canvas transform, so every value handed to the
//! renderer is in world space. Sizes meant to look constant on screen are
//! divided by the zoom level `k`.
//!
//! Link width also depends on the link's interaction count: it grows with
//! `log2(1 + count)` and is capped, so busy links stand out without drowning
//! the rest of the graph.

/// How a size reacts to zoom.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant world-space size. Appears larger when zoomed in.
	World,
	/// Constant screen-space size (pixels).
	Screen,
	/// World-space size whose screen size is clamped to `[min_screen, max_screen]`.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value for `base` at zoom `k`.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

/// How an opacity multiplier reacts to zoom.
#[derive(Clone, Debug)]
pub enum AlphaBehavior {
	/// Linear in `k`, clamped to [0, 1].
	ScaleWithZoom,
	/// Zero at `zero_alpha_k`, full at `full_alpha_k`.
	Fade { zero_alpha_k: f64, full_alpha_k: f64 },
}

impl AlphaBehavior {
	/// Alpha at zoom `k`.
	pub fn apply(&self, k: f64) -> f64 {
		match self {
			AlphaBehavior::ScaleWithZoom => k.clamp(0.0, 1.0),
			AlphaBehavior::Fade {
				zero_alpha_k,
				full_alpha_k,
			} => {
				if zero_alpha_k == full_alpha_k {
					return 1.0;
				}
				((k - zero_alpha_k) / (full_alpha_k - zero_alpha_k)).clamp(0.0, 1.0)
			}
		}
	}
}

/// Node sizing.
#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	/// Radius of dependency nodes in world units.
	pub radius: f64,
	/// Radius of the subject contract in world units.
	pub main_radius: f64,
	/// How node radii react to zoom.
	pub radius_behavior: ScaleBehavior,
	/// Hit detection radius in world units.
	pub hit_radius: f64,
	/// How hit radii react to zoom.
	pub hit_behavior: ScaleBehavior,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// Label visibility against zoom.
	pub label_alpha: AlphaBehavior,
	/// Stroke width of the ring around pinned nodes, screen pixels.
	pub pin_ring_width: f64,
}

/// Link and arrow sizing.
#[derive(Clone, Debug)]
pub struct LinkScaleConfig {
	/// Width of a link with count 1, screen pixels.
	pub min_width: f64,
	/// Added width per doubling of the count, screen pixels.
	pub width_per_doubling: f64,
	/// Width cap, screen pixels.
	pub max_width: f64,
	/// Arrowhead length.
	pub arrow_size: f64,
	/// How arrowheads react to zoom.
	pub arrow_behavior: ScaleBehavior,
	/// Arrowhead visibility against zoom.
	pub arrow_alpha: AlphaBehavior,
	/// Arrows fainter than this are skipped.
	pub cull_alpha: f64,
	/// Dash and gap lengths for transitive links.
	pub transitive_dash: (f64, f64),
	/// How dashes react to zoom.
	pub dash_behavior: ScaleBehavior,
}

/// Flow indicator sizing.
#[derive(Clone, Debug)]
pub struct FlowScaleConfig {
	/// Indicator radius, screen pixels.
	pub radius: f64,
	/// How indicators react to zoom.
	pub behavior: ScaleBehavior,
}

/// All zoom-dependent sizing.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	/// Nodes and labels.
	pub node: NodeScaleConfig,
	/// Links and arrows.
	pub link: LinkScaleConfig,
	/// Flow indicators.
	pub flow: FlowScaleConfig,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				radius: 8.0,
				main_radius: 14.0,
				radius_behavior: ScaleBehavior::Clamped {
					min_screen: 4.0,
					max_screen: f64::INFINITY,
				},
				hit_radius: 12.0,
				hit_behavior: ScaleBehavior::Clamped {
					min_screen: 6.0,
					max_screen: f64::INFINITY,
				},
				label_size: 11.0,
				label_alpha: AlphaBehavior::Fade {
					zero_alpha_k: 0.35,
					full_alpha_k: 0.7,
				},
				pin_ring_width: 1.5,
			},
			link: LinkScaleConfig {
				min_width: 1.0,
				width_per_doubling: 0.75,
				max_width: 6.0,
				arrow_size: 6.0,
				arrow_behavior: ScaleBehavior::Clamped {
					min_screen: 0.0,
					max_screen: 16.0,
				},
				arrow_alpha: AlphaBehavior::ScaleWithZoom,
				cull_alpha: 0.05,
				transitive_dash: (6.0, 4.0),
				dash_behavior: ScaleBehavior::World,
			},
			flow: FlowScaleConfig {
				radius: 3.0,
				behavior: ScaleBehavior::Screen,
			},
		}
	}
}

impl LinkScaleConfig {
	/// Screen-space width for a link with `count` interactions.
	/// Non-decreasing in `count`.
	pub fn width_for(&self, count: u64) -> f64 {
		let grown = self.min_width + self.width_per_doubling * (count.max(1) as f64).log2();
		grown.clamp(self.min_width, self.max_width.max(self.min_width))
	}
}

/// Scale values for one zoom level. Build once per frame.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	/// Zoom these values were computed for.
	pub k: f64,
	/// Dependency node radius, world space.
	pub node_radius: f64,
	/// Subject node radius, world space.
	pub main_radius: f64,
	/// Hit radius in world space, used for pointer picking.
	pub hit_radius: f64,
	/// Canvas font for labels.
	pub label_font: String,
	/// Label alpha at this zoom.
	pub label_alpha: f64,
	/// Pin ring stroke, world space.
	pub pin_ring_width: f64,
	/// Arrowhead length, world space.
	pub arrow_size: f64,
	/// Arrowhead alpha.
	pub arrow_alpha: f64,
	/// True when arrows are too faint to draw.
	pub cull_arrows: bool,
	/// World-space dash pattern for transitive links.
	pub transitive_dash: (f64, f64),
	/// Flow indicator radius, world space.
	pub flow_radius: f64,
}

impl ScaledValues {
	/// Sizes for zoom `k`.
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let node = &config.node;
		let arrow_alpha = config.link.arrow_alpha.apply(k);
		Self {
			k,
			node_radius: node.radius_behavior.apply(node.radius, k),
			main_radius: node.radius_behavior.apply(node.main_radius, k),
			hit_radius: node.hit_behavior.apply(node.hit_radius, k),
			label_font: format!("{}px sans-serif", node.label_size / k),
			label_alpha: node.label_alpha.apply(k),
			pin_ring_width: node.pin_ring_width / k,
			arrow_size: config.link.arrow_behavior.apply(config.link.arrow_size, k),
			arrow_alpha,
			cull_arrows: arrow_alpha < config.link.cull_alpha,
			transitive_dash: (
				config.link.dash_behavior.apply(config.link.transitive_dash.0, k),
				config.link.dash_behavior.apply(config.link.transitive_dash.1, k),
			),
			flow_radius: config.flow.behavior.apply(config.flow.radius, k),
		}
	}

	/// World-space line width for a link of `count` interactions.
	pub fn link_width(&self, config: &ScaleConfig, count: u64) -> f64 {
		config.link.width_for(count) / self.k
	}

	/// World-space radius of a node, by group.
	pub fn radius(&self, is_main: bool) -> f64 {
		if is_main { self.main_radius } else { self.node_radius }
	}

	/// World-space pick radius: the larger of the hit radius and the drawn radius.
	pub fn pick_radius(&self, is_main: bool) -> f64 {
		self.hit_radius.max(self.radius(is_main))
	}
}

//! Colors for the contract graph.

use super::highlight::LinkTone;
use super::model::NodeGroup;

/// RGBA color.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	/// Red.
	pub r: u8,
	/// Green.
	pub g: u8,
	/// Blue.
	pub b: u8,
	/// Alpha in `0..=1`.
	pub a: f64,
}

impl Color {
	/// Opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	/// Color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Same color, new alpha.
	pub fn with_alpha(self, a: f64) -> Self {
		Self { a, ..self }
	}

	/// Multiply the current alpha, e.g. by a highlight opacity.
	pub fn fade(self, factor: f64) -> Self {
		Self {
			a: (self.a * factor).clamp(0.0, 1.0),
			..self
		}
	}

	/// Lighten the color by a factor (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		Self {
			r: (self.r as f64 + (255.0 - self.r as f64) * f) as u8,
			g: (self.g as f64 + (255.0 - self.g as f64) * f) as u8,
			b: (self.b as f64 + (255.0 - self.b as f64) * f) as u8,
			a: self.a,
		}
	}

	/// CSS `rgba()` string.
	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {:.3})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Colors for every drawn role.
#[derive(Clone, Debug)]
pub struct Theme {
	/// Canvas edge color.
	pub background: Color,
	/// Canvas center glow.
	pub background_secondary: Color,
	/// Subject contract fill.
	pub main_node: Color,
	/// Dependency fill.
	pub other_node: Color,
	/// Ring around pinned nodes.
	pub pin_ring: Color,
	/// Label text.
	pub label: Color,
	/// Links outside a focus.
	pub link: Color,
	/// Highlighted link touching the subject contract.
	pub direct_link: Color,
	/// Highlighted link between two dependencies.
	pub transitive_link: Color,
	/// Flow indicators.
	pub flow: Color,
}

impl Theme {
	/// Fill for a node group.
	pub fn node_color(&self, group: NodeGroup) -> Color {
		match group {
			NodeGroup::Main => self.main_node,
			NodeGroup::Other => self.other_node,
		}
	}

	/// Stroke for a link tone.
	pub fn link_color(&self, tone: LinkTone) -> Color {
		match tone {
			LinkTone::Default => self.link,
			LinkTone::Direct => self.direct_link,
			LinkTone::Transitive => self.transitive_link,
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self {
			background: Color::rgb(22, 27, 34),
			background_secondary: Color::rgb(30, 35, 42),
			main_node: Color::rgb(232, 170, 92),
			other_node: Color::rgb(94, 129, 172),
			pin_ring: Color::rgba(255, 255, 255, 0.8),
			label: Color::rgb(201, 209, 217),
			link: Color::rgba(140, 160, 180, 0.5),
			direct_link: Color::rgb(232, 170, 92),
			transitive_link: Color::rgb(129, 161, 193),
			flow: Color::rgb(230, 237, 243),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn css_output() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(Color::rgba(1, 2, 3, 0.5).to_css(), "rgba(1, 2, 3, 0.500)");
	}

	#[test]
	fn fade_multiplies_alpha() {
		let c = Color::rgba(0, 0, 0, 0.5).fade(0.5);
		assert_eq!(c.a, 0.25);
		assert_eq!(Color::rgb(0, 0, 0).fade(2.0).a, 1.0);
	}

	#[test]
	fn tones_map_to_distinct_colors() {
		let theme = Theme::default();
		assert_ne!(
			theme.link_color(LinkTone::Direct),
			theme.link_color(LinkTone::Transitive)
		);
	}
}

//! Engine configuration.
//!
//! Every section is optional in JSON and falls back to its defaults:
//!
//! ```json
//! {
//!   "simulation": { "link_distance": 120 },
//!   "viewport": { "max_scale": 8 },
//!   "enrichment": { "balance_url": "/api/balance/{address}" }
//! }
//! ```

use serde::Deserialize;

use super::enrichment::EnrichmentConfig;
use super::error::ConfigError;
use super::flow::FlowConfig;
use super::highlight::HighlightConfig;
use super::interaction::InteractionConfig;
use super::simulation::SimulationConfig;
use super::viewport::ViewportConfig;

/// Engine configuration, one section per subsystem.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Layout physics.
	pub simulation: SimulationConfig,
	/// Zoom bounds and steps.
	pub viewport: ViewportConfig,
	/// Flow indicator timing.
	pub flow: FlowConfig,
	/// Focus dimming and fade speeds.
	pub highlight: HighlightConfig,
	/// Pointer tuning.
	pub interaction: InteractionConfig,
	/// Hover lookup endpoints.
	pub enrichment: EnrichmentConfig,
}

impl GraphConfig {
	/// Parse and validate a config from JSON.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: Self = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Check ranges the engine relies on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		let vp = &self.viewport;
		if !(vp.min_scale > 0.0 && vp.min_scale < vp.max_scale) {
			return Err(ConfigError::ZoomBounds {
				min: vp.min_scale,
				max: vp.max_scale,
			});
		}
		above_one("viewport.wheel_step", vp.wheel_step)?;
		above_one("viewport.button_step", vp.button_step)?;
		positive("simulation.link_distance", self.simulation.link_distance)?;
		positive("simulation.alpha_min", self.simulation.alpha_min)?;
		unit_fraction("simulation.alpha_decay", self.simulation.alpha_decay)?;
		unit_fraction("simulation.velocity_decay", self.simulation.velocity_decay)?;
		positive("flow.travel_secs", self.flow.travel_secs)?;
		positive("flow.fade_secs", self.flow.fade_secs)?;
		positive("highlight.fade_in_speed", self.highlight.fade_in_speed)?;
		positive("highlight.fade_out_speed", self.highlight.fade_out_speed)?;
		Ok(())
	}
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
	if value > 0.0 {
		Ok(())
	} else {
		Err(ConfigError::NonPositive { field, value })
	}
}

fn above_one(field: &'static str, value: f64) -> Result<(), ConfigError> {
	if value > 1.0 {
		Ok(())
	} else {
		Err(ConfigError::OutOfRange {
			field,
			value,
			range: "(1, inf)",
		})
	}
}

/// `(0, 1]`: larger values overshoot and oscillate.
fn unit_fraction(field: &'static str, value: f64) -> Result<(), ConfigError> {
	if value > 0.0 && value <= 1.0 {
		Ok(())
	} else {
		Err(ConfigError::OutOfRange {
			field,
			value,
			range: "(0, 1]",
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_object_gives_defaults() {
		let config = GraphConfig::from_json("{}").unwrap();
		assert_eq!(config.viewport.min_scale, 0.1);
		assert_eq!(config.viewport.max_scale, 4.0);
		assert_eq!(config.flow.travel_secs, 2.0);
		assert!(config.enrichment.balance_url.is_none());
	}

	#[test]
	fn partial_sections_keep_other_defaults() {
		let config = GraphConfig::from_json(
			r#"{"simulation":{"link_distance":120},"enrichment":{"balance_url":"/b/{address}"}}"#,
		)
		.unwrap();
		assert_eq!(config.simulation.link_distance, 120.0);
		assert_eq!(config.simulation.velocity_decay, 0.4);
		assert_eq!(config.enrichment.balance_url.as_deref(), Some("/b/{address}"));
	}

	#[test]
	fn inverted_zoom_bounds_are_rejected() {
		let err = GraphConfig::from_json(r#"{"viewport":{"min_scale":5,"max_scale":2}}"#).unwrap_err();
		assert!(matches!(err, ConfigError::ZoomBounds { .. }));
	}

	#[test]
	fn non_positive_durations_are_rejected() {
		let err = GraphConfig::from_json(r#"{"flow":{"travel_secs":0}}"#).unwrap_err();
		assert!(matches!(
			err,
			ConfigError::NonPositive {
				field: "flow.travel_secs",
				..
			}
		));
	}

	#[test]
	fn decay_factors_must_be_fractions() {
		for json in [
			r#"{"simulation":{"alpha_decay":1.5}}"#,
			r#"{"simulation":{"velocity_decay":0}}"#,
			r#"{"simulation":{"velocity_decay":2}}"#,
		] {
			let err = GraphConfig::from_json(json).unwrap_err();
			assert!(matches!(err, ConfigError::OutOfRange { range: "(0, 1]", .. }), "{json}");
		}
		assert!(GraphConfig::from_json(r#"{"simulation":{"alpha_decay":1}}"#).is_ok());
	}

	#[test]
	fn zoom_steps_must_enlarge() {
		let err = GraphConfig::from_json(r#"{"viewport":{"wheel_step":0.9}}"#).unwrap_err();
		assert!(matches!(
			err,
			ConfigError::OutOfRange {
				field: "viewport.wheel_step",
				..
			}
		));
		let err = GraphConfig::from_json(r#"{"viewport":{"button_step":1}}"#).unwrap_err();
		assert!(matches!(
			err,
			ConfigError::OutOfRange {
				field: "viewport.button_step",
				..
			}
		));
	}

	#[test]
	fn bad_json_is_a_parse_error() {
		assert!(matches!(
			GraphConfig::from_json("{not json"),
			Err(ConfigError::Parse(_))
		));
	}
}

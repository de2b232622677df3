//! Contract dependency graph visualization.
//!
//! Turns a [`GraphPayload`] of observed contract interactions into a
//! force-directed node-link layout drawn on a canvas, with:
//! - Energy-based layout that settles on its own and wakes while dragging
//! - Pan, zoom and drag-to-pin
//! - Hover cards enriched from external balance and attribution lookups
//! - Focus highlighting of direct and transitive dependencies
//! - Animated flow indicators along every interaction
//!
//! [`GraphEngine`] holds all state and has no browser dependencies, so it can
//! be driven headless. [`ContractGraphCanvas`] is the Leptos shell around it.
//!
//! # Example
//!
//! ```ignore
//! let payload = GraphPayload::from_json(json)?;
//! let controls = GraphControls::new();
//!
//! view! {
//!     <ContractGraphCanvas
//!         data=Signal::derive(move || Some(payload.clone()))
//!         controls=controls.clone()
//!         fullscreen=true
//!     />
//!     <button on:click=move |_| controls.zoom_to_fit()>"Fit"</button>
//! }
//! ```

mod component;
pub mod config;
mod controls;
pub mod engine;
pub mod enrichment;
pub mod error;
pub mod flow;
pub mod highlight;
pub mod interaction;
pub mod lifecycle;
pub mod model;
mod render;
pub mod scale;
pub mod simulation;
pub mod theme;
pub mod types;
pub mod viewport;

pub use component::ContractGraphCanvas;
pub use config::GraphConfig;
pub use controls::GraphControls;
pub use engine::{GraphEngine, GraphStatus, LoadOutcome, TickSubscription};
pub use error::{ConfigError, EnrichmentError, PayloadError};
pub use model::{GraphModel, Link, Node, NodeGroup, PositionOwner};
pub use theme::Theme;
pub use types::{GraphPayload, RawEdge};

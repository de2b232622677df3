//! Redraw guard and teardown discipline.
//!
//! A payload is identified by a [`PayloadVersion`], a hash over its full
//! content. The guard answers one question per incoming payload: rebuild or
//! keep what is on screen. Only a version different from the active one clears
//! it. Once disposed the guard never builds again.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use log::debug;

use super::types::GraphPayload;

/// Content identity of a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PayloadVersion(u64);

impl PayloadVersion {
	/// Hash the full payload content.
	pub fn of(payload: &GraphPayload) -> Self {
		let mut hasher = DefaultHasher::new();
		payload.hash(&mut hasher);
		Self(hasher.finish())
	}
}

/// Where the engine is in the load cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
	/// Nothing loaded yet.
	#[default]
	Empty,
	/// A model for this version is being built.
	Building(PayloadVersion),
	/// This version is on screen.
	Ready(PayloadVersion),
	/// This version failed validation. Re-sending it is not retried.
	Rejected(PayloadVersion),
	/// Torn down. Terminal.
	Disposed,
}

/// What the guard decided for an incoming payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
	/// A new version: tear down the old graph and build this one.
	Build(PayloadVersion),
	/// Same version as the active or rejected one.
	Unchanged,
	/// The engine is disposed.
	Closed,
}

/// Load guard for one engine.
#[derive(Debug, Default)]
pub struct Lifecycle {
	state: LoadState,
	rebuilds: u64,
	late_calls: u64,
}

impl Lifecycle {
	/// Empty guard.
	pub fn new() -> Self {
		Self::default()
	}

	/// Current state.
	pub fn state(&self) -> LoadState {
		self.state
	}

	/// Version currently active or rejected, if any.
	pub fn version(&self) -> Option<PayloadVersion> {
		match self.state {
			LoadState::Building(v) | LoadState::Ready(v) | LoadState::Rejected(v) => Some(v),
			LoadState::Empty | LoadState::Disposed => None,
		}
	}

	/// Decide whether `payload` needs a rebuild, entering `Building` if so.
	pub fn begin(&mut self, payload: &GraphPayload) -> Admission {
		if self.is_disposed() {
			self.note_late_call("load");
			return Admission::Closed;
		}
		let version = PayloadVersion::of(payload);
		if self.version() == Some(version) {
			debug!("contract-graph: payload {version:?} already active, skipping rebuild");
			return Admission::Unchanged;
		}
		self.state = LoadState::Building(version);
		Admission::Build(version)
	}

	/// Mark the building version as on screen.
	pub fn finish(&mut self, version: PayloadVersion) {
		if self.state == LoadState::Building(version) {
			self.state = LoadState::Ready(version);
			self.rebuilds += 1;
		}
	}

	/// Mark the building version as malformed.
	pub fn reject(&mut self, version: PayloadVersion) {
		if self.state == LoadState::Building(version) {
			self.state = LoadState::Rejected(version);
		}
	}

	/// Forget the active version, e.g. after input that never parsed.
	pub fn clear(&mut self) {
		if !self.is_disposed() {
			self.state = LoadState::Empty;
		}
	}

	/// Close for good. Later calls are counted as late.
	pub fn dispose(&mut self) {
		self.state = LoadState::Disposed;
	}

	/// True once disposed.
	pub fn is_disposed(&self) -> bool {
		self.state == LoadState::Disposed
	}

	/// Record an engine entry after disposal. Such calls are no-ops.
	pub fn note_late_call(&mut self, operation: &str) {
		self.late_calls += 1;
		debug!("contract-graph: ignoring `{operation}` after dispose");
	}

	/// Engine entries seen after disposal.
	pub fn late_calls(&self) -> u64 {
		self.late_calls
	}

	/// Completed builds over the engine's lifetime.
	pub fn rebuilds(&self) -> u64 {
		self.rebuilds
	}
}

//! UI components.

pub mod contract_graph;

//! # Fuel estimation library.
//!
//! Learns how long each known path takes to traverse from historical telemetry, and projects the
//! time and fuel needed to finish a path from the vehicle's current progress.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arc length engine - planar distances along projected paths
pub mod arc;

/// Historical rate estimator - learns a representative time per centimeter for each path
pub mod history;

/// Parameters for the whole estimation pipeline
pub mod params;

/// Batch pipeline - ties the estimator, stores and projector together
pub mod pipeline;

/// Fuel and time projector - estimates what is needed to finish a path
pub mod projector;

/// Path collection and persisted tables
pub mod store;

//! # Path interface crate.
//!
//! Provides the path data model shared by the fuel estimation software, the serialized path blob
//! codec, the geodetic to local frame transforms and the historical run record format.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Geodetic (WGS84) to North-East-Down frame transforms
pub mod geodesy;

/// Path, waypoint and obstacle definitions
pub mod path;

/// Serialized path blob encoding and decoding
pub mod codec;

/// Historical run records parsed from telemetry dumps
pub mod history;

// ------------------------------------------------------------------------------------------------
// REEXPORTS
// ------------------------------------------------------------------------------------------------

pub use codec::DecodeError;
pub use geodesy::GeoPoint;
pub use path::{Action, NedPath, Obstacle, Path, PathError, Waypoint};

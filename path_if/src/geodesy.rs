//! # Geodesy
//!
//! Conversions between WGS84 geodetic coordinates and a local North-East-Down (NED) tangent
//! plane anchored at an origin point. Conversions go through Earth-Centred Earth-Fixed (ECEF)
//! coordinates, so no flat earth approximation is made.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// WGS84 semi-major axis.
///
/// Units: meters
pub const WGS84_A_M: f64 = 6_378_137.0;

/// WGS84 flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Maximum number of iterations used when solving for geodetic latitude.
const MAX_LAT_ITERATIONS: usize = 20;

/// Latitude convergence threshold.
///
/// Units: radians
const LAT_TOLERANCE_RAD: f64 = 1e-14;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A geodetic point on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude.
    ///
    /// Units: decimal degrees
    pub lat_deg: f64,

    /// Longitude.
    ///
    /// Units: decimal degrees
    pub lon_deg: f64,

    /// Altitude above the ellipsoid.
    ///
    /// Units: meters
    pub alt_m: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GeoPoint {
    pub fn new(lat_deg: f64, lon_deg: f64, alt_m: f64) -> Self {
        Self {
            lat_deg,
            lon_deg,
            alt_m,
        }
    }

    /// Convert this point into ECEF coordinates in meters.
    pub fn to_ecef(&self) -> Vector3<f64> {
        let lat_rad = self.lat_deg.to_radians();
        let lon_rad = self.lon_deg.to_radians();

        let n_m = prime_vertical_radius(lat_rad);

        Vector3::new(
            (n_m + self.alt_m) * lat_rad.cos() * lon_rad.cos(),
            (n_m + self.alt_m) * lat_rad.cos() * lon_rad.sin(),
            (n_m * (1.0 - WGS84_E2) + self.alt_m) * lat_rad.sin(),
        )
    }

    /// Build a geodetic point from ECEF coordinates in meters.
    pub fn from_ecef(ecef_m: &Vector3<f64>) -> Self {
        let (x, y, z) = (ecef_m[0], ecef_m[1], ecef_m[2]);

        let lon_rad = y.atan2(x);
        let p_m = x.hypot(y);

        // Iterate the latitude, starting from the zero altitude solution. The altitude form used
        // here stays well conditioned at the poles where cos(lat) goes to zero.
        let mut lat_rad = z.atan2(p_m * (1.0 - WGS84_E2));
        let mut alt_m = 0.0;

        for _ in 0..MAX_LAT_ITERATIONS {
            let sin_lat = lat_rad.sin();
            let n_m = prime_vertical_radius(lat_rad);

            alt_m = p_m * lat_rad.cos() + z * sin_lat
                - WGS84_A_M * (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

            let next_lat_rad = z.atan2(p_m * (1.0 - WGS84_E2 * n_m / (n_m + alt_m)));
            let converged = (next_lat_rad - lat_rad).abs() < LAT_TOLERANCE_RAD;
            lat_rad = next_lat_rad;

            if converged {
                break;
            }
        }

        Self {
            lat_deg: lat_rad.to_degrees(),
            lon_deg: lon_rad.to_degrees(),
            alt_m,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a geodetic point into the NED frame anchored at `origin`.
///
/// The returned vector is `[north, east, down]` in meters.
pub fn geodetic_to_ned(point: &GeoPoint, origin: &GeoPoint) -> Vector3<f64> {
    let diff_m = point.to_ecef() - origin.to_ecef();

    ecef_to_ned_rotation(origin) * diff_m
}

/// Convert a `[north, east, down]` vector in meters, relative to `origin`, back into a geodetic
/// point.
pub fn ned_to_geodetic(ned_m: &Vector3<f64>, origin: &GeoPoint) -> GeoPoint {
    // The rotation is orthonormal so its transpose is its inverse
    let ecef_m = origin.to_ecef() + ecef_to_ned_rotation(origin).transpose() * ned_m;

    GeoPoint::from_ecef(&ecef_m)
}

/// Radius of curvature in the prime vertical at the given latitude, in meters.
fn prime_vertical_radius(lat_rad: f64) -> f64 {
    let sin_lat = lat_rad.sin();
    WGS84_A_M / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt()
}

/// Rotation taking an ECEF difference vector into the NED frame at `origin`.
fn ecef_to_ned_rotation(origin: &GeoPoint) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = origin.lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = origin.lon_deg.to_radians().sin_cos();

    Matrix3::new(
        -sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat,
        -sin_lon, cos_lon, 0.0,
        -cos_lat * cos_lon, -cos_lat * sin_lon, -sin_lat,
    )
}

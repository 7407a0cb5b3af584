//! # Path
//!
//! This module defines the geographic path followed by the vehicle, along with the utilities
//! used to author paths and to project them into a local frame for distance calculations.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::warn;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::geodesy::{self, GeoPoint};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Scale factor between the meters produced by the geodesy transforms and the centimeters used
/// by all path distance calculations.
pub const CM_PER_M: f64 = 100.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A path the vehicle can be instructed to follow.
///
/// Waypoint order is significant, progress reports index directly into `waypoints`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    pub waypoints: Vec<Waypoint>,
    pub obstacles: Vec<Obstacle>,
}

/// A single instruction in a path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Waypoint {
    /// The location of the waypoint, if it has one.
    pub point: Option<GeoPoint>,

    /// Actions the vehicle controller shall perform at this waypoint.
    pub actions: Vec<Action>,
}

/// A discrete action tag attached to a waypoint.
///
/// Actions are opaque to the estimation software, they are only carried so that paths survive
/// being decoded and re-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub key: String,
    pub value: i32,
}

/// A path projected into the NED frame of some origin.
#[derive(Debug, Clone, Default)]
pub struct NedPath {
    /// Projected `[north, east, down]` points.
    ///
    /// Units: centimeters
    pub points_cm: Vec<Vector3<f64>>,

    /// Actions of each projected waypoint, aligned by index with `points_cm`. Waypoints without
    /// actions have an empty list.
    pub actions: Vec<Vec<Action>>,

    /// Indices of waypoints which had no geodetic point and so were not projected.
    pub skipped: Vec<usize>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// An obstacle which the vehicle must avoid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    /// A circular region about a centre point.
    Circle {
        centre: GeoPoint,

        /// Units: meters
        radius_m: f64,
    },

    /// A closed polygon, the last point implicitly joins the first.
    Ring { points: Vec<GeoPoint> },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PathError {
    #[error("Cannot insert at waypoint index {0}, the path only has {1} waypoints")]
    WaypointOutOfBounds(usize, usize),

    #[error("Obstacle doesn't exist at index {0}")]
    ObstacleNotFound(usize),

    #[error("Can't add points to the non-ring obstacle at index {0}")]
    NotARing(usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Path {
    /// Create a new empty path
    pub fn new_empty() -> Self {
        Self::default()
    }

    /// Get the number of waypoints in the path
    pub fn get_num_waypoints(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Get the first waypoint which has a geodetic point, which is the conventional origin for
    /// projecting the path.
    pub fn first_point(&self) -> Option<&GeoPoint> {
        self.waypoints.iter().find_map(|w| w.point.as_ref())
    }

    /// Add a new waypoint at the given point, at `index` or the end of the path if `None`.
    ///
    /// Returns the index of the new waypoint.
    pub fn add_point(&mut self, point: GeoPoint, index: Option<usize>) -> Result<usize, PathError> {
        let index = index.unwrap_or_else(|| self.waypoints.len());

        if index > self.waypoints.len() {
            return Err(PathError::WaypointOutOfBounds(index, self.waypoints.len()));
        }

        self.waypoints.insert(
            index,
            Waypoint {
                point: Some(point),
                actions: Vec::new(),
            },
        );

        Ok(index)
    }

    /// Append an action to the waypoint at the given index.
    pub fn add_action(&mut self, index: usize, action: Action) -> Result<(), PathError> {
        let num_waypoints = self.waypoints.len();

        match self.waypoints.get_mut(index) {
            Some(w) => {
                w.actions.push(action);
                Ok(())
            }
            None => Err(PathError::WaypointOutOfBounds(index, num_waypoints)),
        }
    }

    /// Add a circular obstacle.
    pub fn add_circle_obstacle(&mut self, centre: GeoPoint, radius_m: f64) {
        self.obstacles.push(Obstacle::Circle { centre, radius_m });
    }

    /// Add a new ring (polygon) obstacle with no points.
    ///
    /// Returns the index of the new obstacle.
    pub fn add_ring_obstacle(&mut self) -> usize {
        self.obstacles.push(Obstacle::Ring { points: Vec::new() });
        self.obstacles.len() - 1
    }

    /// Add a point to the ring obstacle at `index`, or the last obstacle if `None`.
    pub fn add_point_to_ring_obstacle(
        &mut self,
        point: GeoPoint,
        index: Option<usize>,
    ) -> Result<(), PathError> {
        let index = match index {
            Some(i) => i,
            None => self
                .obstacles
                .len()
                .checked_sub(1)
                .ok_or(PathError::ObstacleNotFound(0))?,
        };

        match self.obstacles.get_mut(index) {
            Some(Obstacle::Ring { points }) => {
                points.push(point);
                Ok(())
            }
            Some(Obstacle::Circle { .. }) => Err(PathError::NotARing(index)),
            None => Err(PathError::ObstacleNotFound(index)),
        }
    }

    /// Project every waypoint which has a point into the NED frame of `origin`, in centimeters.
    ///
    /// Waypoints without a point are not expected in well formed paths. They are left out of the
    /// projection, listed in [`NedPath::skipped`], and a warning is raised.
    pub fn to_ned(&self, origin: &GeoPoint) -> NedPath {
        let mut ned = NedPath::default();

        for (i, waypoint) in self.waypoints.iter().enumerate() {
            match waypoint.point {
                Some(ref p) => {
                    ned.points_cm
                        .push(geodesy::geodetic_to_ned(p, origin) * CM_PER_M);
                    ned.actions.push(waypoint.actions.clone());
                }
                None => ned.skipped.push(i),
            }
        }

        if !ned.skipped.is_empty() {
            warn!(
                "{} waypoint(s) without a point were skipped in NED projection (indices {:?})",
                ned.skipped.len(),
                ned.skipped
            );
        }

        ned
    }

    /// Project the path with the first waypoint's point as the origin.
    ///
    /// If no waypoint has a point `None` is returned.
    pub fn to_ned_from_first(&self) -> Option<NedPath> {
        self.first_point().map(|origin| self.to_ned(origin))
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Convert a single NED point in centimeters, relative to `origin`, back into a geodetic point.
pub fn ned_cm_to_geodetic(ned_cm: &Vector3<f64>, origin: &GeoPoint) -> GeoPoint {
    geodesy::ned_to_geodetic(&(*ned_cm / CM_PER_M), origin)
}

#[cfg(test)]
mod test {
    use super::*;

    fn square_path() -> Path {
        let mut path = Path::new_empty();
        path.add_point(GeoPoint::new(40.0, -105.0, 1600.0), None).unwrap();
        path.add_point(GeoPoint::new(40.0001, -105.0, 1600.0), None).unwrap();
        path.add_point(GeoPoint::new(40.0001, -104.9999, 1600.0), None).unwrap();
        path
    }

    #[test]
    fn test_add_point_index() {
        let mut path = square_path();

        let idx = path.add_point(GeoPoint::new(1.0, 2.0, 3.0), Some(1)).unwrap();
        assert_eq!(idx, 1);
        assert_eq!(path.get_num_waypoints(), 4);
        assert_eq!(path.waypoints[1].point, Some(GeoPoint::new(1.0, 2.0, 3.0)));
        assert_eq!(path.waypoints[2].point, Some(GeoPoint::new(40.0001, -105.0, 1600.0)));

        assert_eq!(
            path.add_point(GeoPoint::default(), Some(10)),
            Err(PathError::WaypointOutOfBounds(10, 4))
        );
    }

    #[test]
    fn test_add_action() {
        let mut path = square_path();
        let action = Action {
            key: String::from("FRONT_STATE"),
            value: 1,
        };

        path.add_action(2, action.clone()).unwrap();
        assert_eq!(path.waypoints[2].actions, vec![action.clone()]);

        assert_eq!(
            path.add_action(3, action),
            Err(PathError::WaypointOutOfBounds(3, 3))
        );
    }

    #[test]
    fn test_obstacles() {
        let mut path = Path::new_empty();

        assert_eq!(
            path.add_point_to_ring_obstacle(GeoPoint::default(), None),
            Err(PathError::ObstacleNotFound(0))
        );

        path.add_circle_obstacle(GeoPoint::new(1.0, 1.0, 0.0), 2.5);
        assert_eq!(
            path.add_point_to_ring_obstacle(GeoPoint::default(), None),
            Err(PathError::NotARing(0))
        );

        let ring = path.add_ring_obstacle();
        assert_eq!(ring, 1);
        path.add_point_to_ring_obstacle(GeoPoint::new(1.0, 1.0, 0.0), None)
            .unwrap();
        path.add_point_to_ring_obstacle(GeoPoint::new(1.0, 2.0, 0.0), Some(1))
            .unwrap();

        match &path.obstacles[1] {
            Obstacle::Ring { points } => assert_eq!(points.len(), 2),
            o => panic!("Expected a ring, got {:?}", o),
        }

        assert_eq!(
            path.add_point_to_ring_obstacle(GeoPoint::default(), Some(5)),
            Err(PathError::ObstacleNotFound(5))
        );
    }

    #[test]
    fn test_to_ned() {
        let mut path = square_path();
        path.add_action(
            1,
            Action {
                key: String::from("PAUSE"),
                value: 0,
            },
        )
        .unwrap();

        let ned = path.to_ned_from_first().unwrap();

        assert_eq!(ned.points_cm.len(), 3);
        assert_eq!(ned.actions.len(), 3);
        assert!(ned.skipped.is_empty());

        // First point is the origin
        assert!(ned.points_cm[0].norm() < 1e-6);

        // 0.0001 deg of latitude is about 11.1 m, so 1110 cm, north
        assert!((ned.points_cm[1][0] - 1110.0).abs() < 5.0, "{:?}", ned.points_cm[1]);
        assert!(ned.points_cm[1][1].abs() < 0.01);

        // Actions stay aligned with points
        assert!(ned.actions[0].is_empty());
        assert_eq!(ned.actions[1][0].key, "PAUSE");
        assert!(ned.actions[2].is_empty());
    }

    #[test]
    fn test_to_ned_skips_pointless_waypoints() {
        let mut path = square_path();
        path.waypoints.insert(
            1,
            Waypoint {
                point: None,
                actions: vec![Action {
                    key: String::from("LOG"),
                    value: 1,
                }],
            },
        );

        let ned = path.to_ned_from_first().unwrap();

        assert_eq!(ned.points_cm.len(), 3);
        assert_eq!(ned.actions.len(), 3);
        assert_eq!(ned.skipped, vec![1]);

        assert!(Path::new_empty().to_ned_from_first().is_none());
    }

    #[test]
    fn test_ned_cm_to_geodetic() {
        let path = square_path();
        let origin = *path.first_point().unwrap();
        let ned = path.to_ned(&origin);

        for (waypoint, point_cm) in path.waypoints.iter().zip(ned.points_cm.iter()) {
            let back = ned_cm_to_geodetic(point_cm, &origin);
            let expected = waypoint.point.unwrap();

            assert!((back.lat_deg - expected.lat_deg).abs() < 1e-6);
            assert!((back.lon_deg - expected.lon_deg).abs() < 1e-6);
            assert!((back.alt_m - expected.alt_m).abs() < 1e-3);
        }
    }
}

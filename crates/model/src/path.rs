use std::{error::Error, fmt};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::id::{HasId, Id};

use crate::location::Location;

/// Identifies a fixed route. Several waypoints share one path id.
pub type PathId = i32;

/// One point of a fixed route together with the distance travelled along the
/// route from its start up to this point.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub path_id: PathId,
    /// `None` once the referenced location was deleted.
    pub location: Option<Id<Location>>,
    pub order: i32,
    pub distance: i32,
}

impl HasId for Waypoint {
    type IdType = i32;
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaypointOrderError {
    OrderNotIncreasing {
        path_id: PathId,
        previous: i32,
        next: i32,
    },
    DistanceDecreasing {
        path_id: PathId,
        order: i32,
        previous: i32,
        next: i32,
    },
}

impl fmt::Display for WaypointOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaypointOrderError::OrderNotIncreasing {
                path_id,
                previous,
                next,
            } => write!(
                f,
                "path {}: waypoint order {} does not follow {}",
                path_id, next, previous
            ),
            WaypointOrderError::DistanceDecreasing {
                path_id,
                order,
                previous,
                next,
            } => write!(
                f,
                "path {}: distance drops from {} to {} at waypoint {}",
                path_id, previous, next, order
            ),
        }
    }
}

impl Error for WaypointOrderError {}

/// Checks that the waypoints of a single path, given sorted by `order`, have
/// strictly increasing orders and non-decreasing distances.
pub fn check_waypoint_order<'a, I>(waypoints: I) -> Result<(), WaypointOrderError>
where
    I: IntoIterator<Item = &'a Waypoint>,
{
    let mut previous: Option<&Waypoint> = None;
    for waypoint in waypoints {
        if let Some(last) = previous {
            if waypoint.order <= last.order {
                return Err(WaypointOrderError::OrderNotIncreasing {
                    path_id: waypoint.path_id,
                    previous: last.order,
                    next: waypoint.order,
                });
            }
            if waypoint.distance < last.distance {
                return Err(WaypointOrderError::DistanceDecreasing {
                    path_id: waypoint.path_id,
                    order: waypoint.order,
                    previous: last.distance,
                    next: waypoint.distance,
                });
            }
        }
        previous = Some(waypoint);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(order: i32, distance: i32) -> Waypoint {
        Waypoint {
            path_id: 1,
            location: None,
            order,
            distance,
        }
    }

    #[test]
    fn accepts_monotonic_route() {
        let route = [waypoint(1, 0), waypoint(2, 100), waypoint(3, 100)];
        assert_eq!(check_waypoint_order(&route), Ok(()));
    }

    #[test]
    fn rejects_repeated_order() {
        let route = [waypoint(1, 0), waypoint(1, 100)];
        assert!(matches!(
            check_waypoint_order(&route),
            Err(WaypointOrderError::OrderNotIncreasing { .. })
        ));
    }

    #[test]
    fn rejects_shrinking_distance() {
        let route = [waypoint(1, 0), waypoint(2, 100), waypoint(3, 50)];
        assert_eq!(
            check_waypoint_order(&route),
            Err(WaypointOrderError::DistanceDecreasing {
                path_id: 1,
                order: 3,
                previous: 100,
                next: 50,
            })
        );
    }
}

//! Maps recorded locations to distances along fixed routes.
//!
//! A location resolves only if it *is* one of the route's waypoints; there is
//! no interpolation between waypoints. Vehicles are snapped onto known
//! locations when they report a position, which keeps them resolvable.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use model::{
    location::Location,
    path::{check_waypoint_order, PathId, Waypoint, WaypointOrderError},
    WithId,
};
use utility::id::Id;

use crate::{Entity, RequestError, RequestResult};

#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    /// (path, location) => cumulative distance of the first matching waypoint
    distances: HashMap<(PathId, Id<Location>), i32>,
    /// paths whose waypoints are out of order, never resolved
    broken: HashMap<PathId, WaypointOrderError>,
}

impl PathIndex {
    /// Builds the index, verifying the ordering invariant per path. A broken
    /// path only fails queries on that path.
    pub fn new<I>(waypoints: I) -> Self
    where
        I: IntoIterator<Item = Waypoint>,
    {
        let mut paths: BTreeMap<PathId, Vec<Waypoint>> = BTreeMap::new();
        for waypoint in waypoints {
            paths.entry(waypoint.path_id).or_default().push(waypoint);
        }

        let mut index = Self::default();
        for (path_id, mut waypoints) in paths {
            waypoints.sort_by_key(|waypoint| waypoint.order);
            if let Err(why) = check_waypoint_order(waypoints.iter()) {
                log::warn!("ignoring path {}: {}", path_id, why);
                index.broken.insert(path_id, why);
                continue;
            }
            for waypoint in waypoints {
                if let Some(location) = waypoint.location {
                    // a route passing the same location twice resolves to the
                    // earlier visit
                    index
                        .distances
                        .entry((path_id, location))
                        .or_insert(waypoint.distance);
                }
            }
        }
        index
    }

    pub fn from_rows(rows: Vec<WithId<Waypoint>>) -> Self {
        Self::new(rows.into_iter().map(|row| row.content))
    }

    /// Cumulative distance of the waypoint of `path_id` located at `location`.
    pub fn distance_along_route(
        &self,
        path_id: PathId,
        location: Id<Location>,
    ) -> RequestResult<i32> {
        if let Some(why) = self.broken.get(&path_id) {
            return Err(RequestError::from(why.clone()));
        }
        self.distances
            .get(&(path_id, location))
            .copied()
            .ok_or(RequestError::NotFound(Entity::Path))
    }

    /// All intact paths having a waypoint at `location`, in ascending order.
    pub fn paths_through(&self, location: Id<Location>) -> Vec<PathId> {
        self.distances
            .keys()
            .filter(|(_, at)| *at == location)
            .map(|(path_id, _)| *path_id)
            .sorted()
            .dedup()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(path_id: PathId, location: i32, order: i32, distance: i32) -> Waypoint {
        Waypoint {
            path_id,
            location: Some(Id::new(location)),
            order,
            distance,
        }
    }

    fn index() -> PathIndex {
        PathIndex::new(vec![
            waypoint(1, 12, 3, 350),
            waypoint(1, 10, 1, 0),
            waypoint(1, 11, 2, 100),
            waypoint(2, 11, 1, 0),
            waypoint(2, 20, 2, 80),
        ])
    }

    #[test]
    fn resolves_exact_waypoint() {
        let index = index();
        assert_eq!(index.distance_along_route(1, Id::new(11)).unwrap(), 100);
        assert_eq!(index.distance_along_route(1, Id::new(12)).unwrap(), 350);
        assert_eq!(index.distance_along_route(2, Id::new(11)).unwrap(), 0);
    }

    #[test]
    fn unknown_location_is_not_found() {
        let index = index();
        assert!(matches!(
            index.distance_along_route(1, Id::new(20)),
            Err(RequestError::NotFound(Entity::Path))
        ));
        assert!(matches!(
            index.distance_along_route(7, Id::new(10)),
            Err(RequestError::NotFound(Entity::Path))
        ));
    }

    #[test]
    fn lists_paths_through_location() {
        let index = index();
        assert_eq!(index.paths_through(Id::new(11)), vec![1, 2]);
        assert_eq!(index.paths_through(Id::new(20)), vec![2]);
        assert!(index.paths_through(Id::new(99)).is_empty());
    }

    #[test]
    fn loop_route_resolves_first_visit() {
        let index = PathIndex::new(vec![
            waypoint(3, 1, 1, 0),
            waypoint(3, 2, 2, 500),
            waypoint(3, 1, 3, 1000),
        ]);
        assert_eq!(index.distance_along_route(3, Id::new(1)).unwrap(), 0);
    }

    #[test]
    fn broken_path_fails_only_its_own_queries() {
        let index = PathIndex::new(vec![
            waypoint(1, 1, 1, 0),
            waypoint(1, 2, 2, 100),
            waypoint(9, 3, 1, 500),
            waypoint(9, 4, 2, 10),
        ]);
        assert_eq!(index.distance_along_route(1, Id::new(2)).unwrap(), 100);
        assert!(matches!(
            index.distance_along_route(9, Id::new(3)),
            Err(RequestError::InvalidData(_))
        ));
        assert!(index.paths_through(Id::new(3)).is_empty());
    }

    #[test]
    fn skips_waypoints_without_location() {
        let mut orphan = waypoint(1, 0, 2, 10);
        orphan.location = None;
        let index = PathIndex::new(vec![waypoint(1, 1, 1, 0), orphan]);
        assert_eq!(index.distance_along_route(1, Id::new(1)).unwrap(), 0);
        assert_eq!(index.paths_through(Id::new(0)), Vec::<PathId>::new());
    }
}

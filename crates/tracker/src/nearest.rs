//! Nearest neighbor search over a small set of points.
//!
//! `LinearScan` computes the geodesic distance to every entry and sorts. That
//! is fast enough for a few hundred stops per city; a grid or R-tree can be
//! plugged in by implementing `NearestNeighbors`.

use model::WithDistance;
use utility::geo::{geodesic_meters, GeoPoint};

pub trait NearestNeighbors {
    type Item;

    /// The `k` entries closest to `origin`, nearest first. Entries at exactly
    /// the same distance are returned in insertion order, never merged.
    fn nearest(&self, origin: GeoPoint, k: usize) -> Vec<WithDistance<&Self::Item>>;
}

#[derive(Debug, Clone)]
pub struct LinearScan<T> {
    entries: Vec<(GeoPoint, T)>,
}

impl<T> LinearScan<T> {
    pub fn new() -> Self {
        Self { entries: vec![] }
    }

    pub fn insert(&mut self, point: GeoPoint, item: T) {
        self.entries.push((point, item));
    }
}

impl<T> Default for LinearScan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(GeoPoint, T)> for LinearScan<T> {
    fn from_iter<I: IntoIterator<Item = (GeoPoint, T)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<T> NearestNeighbors for LinearScan<T> {
    type Item = T;

    fn nearest(&self, origin: GeoPoint, k: usize) -> Vec<WithDistance<&T>> {
        let mut candidates = self
            .entries
            .iter()
            .filter_map(|(point, item)| match geodesic_meters(origin, *point) {
                Ok(distance) => Some(WithDistance::new(distance, item)),
                Err(why) => {
                    log::warn!("skipping entry in nearest neighbor search: {}", why);
                    None
                }
            })
            .collect::<Vec<_>>();
        // stable sort, ties keep insertion order
        candidates.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
        candidates.truncate(k);
        candidates
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    fn point(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude).unwrap()
    }

    #[test]
    fn returns_k_nearest_in_order() {
        let index = (0..5)
            .map(|i| (point(0.0, i as f64), format!("S{}", i + 1)))
            .collect::<LinearScan<_>>();
        let result = index
            .nearest(point(0.0, 0.0), 4)
            .into_iter()
            .map(|entry| entry.content.clone())
            .collect::<Vec<_>>();
        assert_eq!(result, vec!["S1", "S2", "S3", "S4"]);
    }

    #[test]
    fn reports_geodesic_distance() {
        let index: LinearScan<_> = vec![(point(0.0, 1.0), 1)].into_iter().collect();
        let result = index.nearest(point(0.0, 0.0), 1);
        assert_relative_eq!(result[0].distance_meters, 111_319.49, epsilon = 0.1);
    }

    #[test]
    fn keeps_every_entry_on_equal_distance() {
        // four points at exactly the same distance from the origin
        let index: LinearScan<_> = vec![
            (point(0.0, 1.0), "east"),
            (point(0.0, -1.0), "west"),
            (point(0.0, 1.0), "east again"),
            (point(0.0, -1.0), "west again"),
        ]
        .into_iter()
        .collect();
        let result = index
            .nearest(point(0.0, 0.0), 10)
            .into_iter()
            .map(|entry| *entry.content)
            .collect::<Vec<_>>();
        assert_eq!(result, vec!["east", "west", "east again", "west again"]);
    }

    #[test]
    fn fewer_entries_than_k() {
        let index: LinearScan<_> = vec![(point(1.0, 1.0), 1), (point(2.0, 2.0), 2)]
            .into_iter()
            .collect();
        assert_eq!(index.nearest(point(0.0, 0.0), 4).len(), 2);
        assert!(LinearScan::<u8>::new().nearest(point(0.0, 0.0), 4).is_empty());
    }

    #[test]
    fn skips_corrupt_points() {
        let mut index = LinearScan::new();
        index.insert(
            GeoPoint {
                latitude: f64::NAN,
                longitude: 0.0,
            },
            "broken",
        );
        index.insert(point(0.0, 0.5), "fine");
        let result = index.nearest(point(0.0, 0.0), 4);
        assert_eq!(result.len(), 1);
        assert_eq!(*result[0].content, "fine");
    }

    proptest! {
        #[test]
        fn returns_min_k_len_sorted(
            points in prop::collection::vec((-60.0..60.0f64, -170.0..170.0f64), 0..40),
            k in 0usize..10,
        ) {
            let index = points
                .iter()
                .enumerate()
                .map(|(i, (lat, lon))| (point(*lat, *lon), i))
                .collect::<LinearScan<_>>();
            let result = index.nearest(point(0.0, 0.0), k);
            prop_assert_eq!(result.len(), k.min(points.len()));
            for pair in result.windows(2) {
                prop_assert!(pair[0].distance_meters <= pair[1].distance_meters);
            }
            let mut ids = result.iter().map(|entry| *entry.content).collect::<Vec<_>>();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), result.len());
        }
    }
}

//! DBSCAN over (lat, lon) degrees with an R-tree neighbourhood index.
//!
//! A point's neighbourhood includes the point itself and every point within
//! `eps` (inclusive). Core points have at least `min_samples` neighbours.
//! Clusters are numbered in the order their first core point appears in the
//! input; border points join the first cluster that reaches them.

use std::collections::VecDeque;

use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::coords::LatLon;

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Cluster label per input point; `None` is noise.
pub fn dbscan(points: &[LatLon], eps: f64, min_samples: usize) -> Vec<Option<usize>> {
    let n = points.len();
    let mut labels: Vec<Option<usize>> = vec![None; n];
    if n == 0 {
        return labels;
    }

    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new([p.lat, p.lon], i))
            .collect(),
    );
    let eps2 = eps * eps;
    let neighbours = |i: usize| -> Vec<usize> {
        let p = points[i];
        let mut idx: Vec<usize> = tree
            .locate_within_distance([p.lat, p.lon], eps2)
            .map(|g| g.data)
            .collect();
        idx.sort_unstable();
        idx
    };

    let mut visited = vec![false; n];
    let mut next_cluster = 0usize;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;

        let seeds = neighbours(i);
        if seeds.len() < min_samples {
            // Noise for now; may still become a border point of a later cluster.
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = Some(cluster);

        let mut queue: VecDeque<usize> = seeds.into();
        while let Some(j) = queue.pop_front() {
            if labels[j].is_none() {
                labels[j] = Some(cluster);
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;
            let reach = neighbours(j);
            if reach.len() >= min_samples {
                queue.extend(reach);
            }
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<LatLon> {
        coords.iter().map(|&(a, b)| LatLon::new(a, b)).collect()
    }

    #[test]
    fn two_separated_groups_and_noise() {
        let p = pts(&[
            (35.0, 11.0),
            (35.05, 11.0),
            (36.0, 11.5),
            (35.1, 11.0),
            (36.05, 11.5),
            (34.0, 10.0),
        ]);
        let labels = dbscan(&p, 0.06, 2);
        assert_eq!(
            labels,
            vec![Some(0), Some(0), Some(1), Some(0), Some(1), None]
        );
    }

    #[test]
    fn chain_links_transitively() {
        let p: Vec<LatLon> = (0..10).map(|i| LatLon::new(35.0 + i as f64 * 0.05, 11.0)).collect();
        let labels = dbscan(&p, 0.051, 2);
        assert!(labels.iter().all(|l| *l == Some(0)), "{labels:?}");
    }

    #[test]
    fn distance_equal_to_eps_is_a_neighbour() {
        let p = pts(&[(0.0, 0.0), (0.0, 0.5)]);
        assert_eq!(dbscan(&p, 0.5, 2), vec![Some(0), Some(0)]);
    }

    #[test]
    fn min_samples_counts_the_point_itself() {
        let p = pts(&[(0.0, 0.0), (0.0, 0.1)]);
        assert_eq!(dbscan(&p, 0.2, 2), vec![Some(0), Some(0)]);
        assert_eq!(dbscan(&p, 0.2, 3), vec![None, None]);
    }

    #[test]
    fn empty_input() {
        assert!(dbscan(&[], 1.0, 2).is_empty());
    }
}

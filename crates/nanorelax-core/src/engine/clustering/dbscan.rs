use super::snapshot::snapshot_elements;
use crate::core::dynamics::cluster::StructureCluster;
use crate::core::models::ids::ComponentId;
use crate::core::models::structure::Structure;
use crate::engine::error::EngineError;
use kiddo::{KdTree, SquaredEuclidean};
use nalgebra::Point3;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Unvisited,
    Noise,
    Cluster(usize),
}

/// Groups the monomers of `components` with DBSCAN.
///
/// Two monomers are neighbours when their squared distance is at most
/// `neighbour_radius²`; a monomer counts as its own neighbour. Monomers with
/// fewer than `min_points` neighbours that no core monomer reaches are noise
/// and belong to no cluster. Clusters are returned in the order their seeds
/// were discovered.
///
/// Neighbour queries go through a k-d tree built once over the monomer
/// positions.
#[instrument(skip_all, name = "dbscan_clustering")]
pub fn create_dbscan_clusters(
    structure: &Structure,
    components: &[ComponentId],
    neighbour_radius: f64,
    min_points: usize,
) -> Result<Vec<StructureCluster>, EngineError> {
    let elements = snapshot_elements(structure, components);
    let positions: Vec<Point3<f64>> = elements.iter().map(|e| e.snapshot_position).collect();

    let memberships = dbscan(&positions, neighbour_radius * neighbour_radius, min_points);

    let noise = elements.len() - memberships.iter().map(Vec::len).sum::<usize>();
    info!(
        "DBSCAN found {} cluster(s) and {} noise monomer(s).",
        memberships.len(),
        noise
    );

    memberships
        .into_iter()
        .map(|members| {
            let cluster_elements = members.into_iter().map(|i| elements[i].clone()).collect();
            StructureCluster::new(cluster_elements).map_err(EngineError::from)
        })
        .collect()
}

/// Relative slack on the tree query radius; candidates are re-checked against
/// the exact inclusive bound.
const QUERY_SLACK: f64 = 1e-9;

/// Indices of every position within `radius_squared` of `positions[p]`,
/// boundary included, in ascending order.
fn region_query(
    tree: &KdTree<f64, 3>,
    positions: &[Point3<f64>],
    p: usize,
    radius_squared: f64,
) -> Vec<usize> {
    let center = positions[p];
    let query = [center.x, center.y, center.z];
    let mut neighbours: Vec<usize> = tree
        .within_unsorted::<SquaredEuclidean>(
            &query,
            radius_squared * (1.0 + QUERY_SLACK) + QUERY_SLACK,
        )
        .into_iter()
        .map(|neighbour| neighbour.item as usize)
        .filter(|&i| (positions[i] - center).norm_squared() <= radius_squared)
        .collect();
    neighbours.sort_unstable();
    neighbours
}

/// Returns the member indices of each cluster, in discovery order.
fn dbscan(positions: &[Point3<f64>], radius_squared: f64, min_points: usize) -> Vec<Vec<usize>> {
    let coordinates: Vec<[f64; 3]> = positions.iter().map(|p| [p.x, p.y, p.z]).collect();
    let tree: KdTree<f64, 3> = (&coordinates).into();
    let neighbours_of = |p: usize| region_query(&tree, positions, p, radius_squared);

    let mut labels = vec![Label::Unvisited; positions.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for point in 0..positions.len() {
        if labels[point] != Label::Unvisited {
            continue;
        }
        let neighbours = neighbours_of(point);
        if neighbours.len() < min_points {
            labels[point] = Label::Noise;
            continue;
        }

        let cluster = clusters.len();
        labels[point] = Label::Cluster(cluster);
        let mut members = vec![point];

        let mut seeds = neighbours;
        let mut next = 0;
        while next < seeds.len() {
            let candidate = seeds[next];
            next += 1;
            match labels[candidate] {
                Label::Noise => {
                    labels[candidate] = Label::Cluster(cluster);
                    members.push(candidate);
                    continue;
                }
                Label::Cluster(_) => continue,
                Label::Unvisited => {}
            }
            labels[candidate] = Label::Cluster(cluster);
            members.push(candidate);

            let candidate_neighbours = neighbours_of(candidate);
            if candidate_neighbours.len() >= min_points {
                seeds.extend(candidate_neighbours);
            }
        }

        debug!("Cluster #{} has {} member(s).", cluster, members.len());
        clusters.push(members);
    }
    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::strand::StrandKind;

    fn blob(center: Point3<f64>) -> Vec<Point3<f64>> {
        let mut points = vec![center];
        for offset in [-0.5, 0.5] {
            points.push(center + nalgebra::Vector3::new(offset, 0.0, 0.0));
            points.push(center + nalgebra::Vector3::new(0.0, offset, 0.0));
            points.push(center + nalgebra::Vector3::new(0.0, 0.0, offset));
        }
        points
    }

    #[test]
    fn two_dense_blobs_and_outliers_give_two_clusters() {
        let mut positions = blob(Point3::origin());
        positions.push(Point3::new(50.0, 50.0, 50.0));
        positions.extend(blob(Point3::new(20.0, 0.0, 0.0)));
        positions.push(Point3::new(-40.0, 0.0, 0.0));

        let clusters = dbscan(&positions, 1.0, 4);

        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 7);
        assert_eq!(clusters[1].len(), 7);
        assert!(clusters.iter().all(|c| !c.contains(&7) && !c.contains(&15)));
        assert!(clusters[0].iter().all(|&i| i < 7));
    }

    #[test]
    fn border_points_join_the_reaching_cluster() {
        // The points at x=0 and x=4 each see a single neighbour, so they are
        // labelled noise first and claimed later by the cluster that reaches
        // them.
        let positions = vec![
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        let clusters = dbscan(&positions, 1.0, 3);
        assert_eq!(clusters.len(), 1);
        let mut members = clusters[0].clone();
        members.sort_unstable();
        assert_eq!(members, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn region_query_returns_sorted_indices_within_radius() {
        let positions = vec![
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.5),
        ];
        let coordinates: Vec<[f64; 3]> = positions.iter().map(|p| [p.x, p.y, p.z]).collect();
        let tree: KdTree<f64, 3> = (&coordinates).into();

        assert_eq!(region_query(&tree, &positions, 1, 1.0), vec![1, 2]);
        assert_eq!(region_query(&tree, &positions, 1, 2.25), vec![1, 2, 3]);
        assert_eq!(region_query(&tree, &positions, 0, 0.5), vec![0]);
    }

    #[test]
    fn neighbourhood_boundary_is_inclusive() {
        let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        assert_eq!(dbscan(&positions, 4.0, 2).len(), 1);
        assert!(dbscan(&positions, 3.99, 2).is_empty());
    }

    #[test]
    fn clusters_are_built_from_structure_monomers() {
        let mut structure = Structure::new();
        let component = structure.add_component("c");
        let strand = structure
            .add_strand(component, "s", StrandKind::Dna, false)
            .unwrap();
        for p in blob(Point3::origin())
            .into_iter()
            .chain(blob(Point3::new(10.0, 0.0, 0.0)))
        {
            structure.add_monomer(strand, "T", p).unwrap();
        }
        structure
            .add_monomer(strand, "T", Point3::new(0.0, 30.0, 0.0))
            .unwrap();

        let clusters = create_dbscan_clusters(&structure, &[component], 1.0, 4).unwrap();

        assert_eq!(clusters.len(), 2);
        assert!(clusters[0].body().position().coords.norm() < 1e-9);
        assert!((clusters[1].body().position() - Point3::new(10.0, 0.0, 0.0)).norm() < 1e-9);
        assert_eq!(
            clusters.iter().map(|c| c.elements().len()).sum::<usize>(),
            14
        );
    }
}

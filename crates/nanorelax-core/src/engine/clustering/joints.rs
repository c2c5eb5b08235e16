use crate::core::dynamics::cluster::{ClusterElement, StructureCluster};
use crate::core::dynamics::ids::BodyId;
use crate::core::dynamics::joint::Joint;
use crate::core::dynamics::store::ElementStore;
use crate::core::models::monomer::Terminus;
use itertools::Itertools;
use tracing::{debug, instrument, trace};

/// Creates a spring joint for every backbone bond that crosses a cluster
/// boundary.
///
/// Two nucleotides are bonded when they sit on the same strand and are
/// sequence neighbours, or when they are the 5' and 3' ends of a circular
/// strand. Each joint is anchored at the current positions of the two
/// nucleotides, expressed in the local frame of their clusters.
///
/// Every cluster pair compares every element pair, so the cost grows with the
/// square of both the cluster count and the cluster size.
#[instrument(skip_all, name = "intercluster_joints")]
pub fn compute_intercluster_joints(
    clusters: &[(BodyId, &StructureCluster)],
    store: &dyn ElementStore,
    target_bond_length: f64,
    spring_constant: f64,
) -> Vec<Joint> {
    let mut joints = Vec::new();
    for ((start_id, start), (end_id, end)) in clusters.iter().tuple_combinations() {
        for a in start.elements() {
            for b in end.elements() {
                if !backbone_bonded(a, b) {
                    continue;
                }
                let a_world = store.element_position(a.id).unwrap_or(a.snapshot_position);
                let b_world = store.element_position(b.id).unwrap_or(b.snapshot_position);
                trace!(?start_id, ?end_id, "Backbone bond crosses clusters.");
                joints.push(Joint::spring(
                    *start_id,
                    start.body().world_to_local_pos(&a_world),
                    *end_id,
                    end.body().world_to_local_pos(&b_world),
                    spring_constant,
                    target_bond_length,
                ));
            }
        }
    }
    debug!(
        "Created {} joint(s) between {} cluster(s).",
        joints.len(),
        clusters.len()
    );
    joints
}

fn backbone_bonded(a: &ClusterElement, b: &ClusterElement) -> bool {
    if !a.kind.is_nucleotide() || !b.kind.is_nucleotide() || a.strand != b.strand {
        return false;
    }
    if a.sequence_index.abs_diff(b.sequence_index) == 1 {
        return true;
    }
    a.circular_strand
        && matches!(
            (a.terminus, b.terminus),
            (Some(Terminus::FivePrime), Some(Terminus::ThreePrime))
                | (Some(Terminus::ThreePrime), Some(Terminus::FivePrime))
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dynamics::bodies::BodySet;
    use crate::core::dynamics::joint::JointKind;
    use crate::core::models::strand::StrandKind;
    use crate::core::models::structure::Structure;
    use crate::engine::clustering::create_filter_clusters;
    use crate::core::selection::Filter;
    use nalgebra::Point3;

    fn build(kind: StrandKind, circular: bool, names: &[&str]) -> Structure {
        let mut structure = Structure::new();
        let component = structure.add_component("c");
        let strand = structure
            .add_strand(component, "s", kind, circular)
            .unwrap();
        for (i, name) in names.iter().enumerate() {
            structure
                .add_monomer(strand, name, Point3::new(3.0 * i as f64, 0.0, 0.0))
                .unwrap();
        }
        structure
    }

    fn joints_for(structure: &Structure, filters: &[&str]) -> Vec<Joint> {
        let filters: Vec<Filter> = filters.iter().map(|f| Filter::parse(f).unwrap()).collect();
        let clusters =
            create_filter_clusters(structure, &structure.component_ids(), &filters).unwrap();
        let mut bodies = BodySet::with_key();
        let ids: Vec<BodyId> = clusters
            .iter()
            .map(|cluster| bodies.insert(cluster.clone().into()))
            .collect();
        let pairs: Vec<(BodyId, &StructureCluster)> = ids.iter().copied().zip(clusters.iter()).collect();
        compute_intercluster_joints(&pairs, structure, 3.32, 10.0)
    }

    #[test]
    fn one_adjacent_pair_gives_one_joint() {
        let structure = build(StrandKind::Dna, false, &["A", "B", "C", "D"]);
        let joints = joints_for(&structure, &["A or B", "C or D"]);

        assert_eq!(joints.len(), 1);
        assert_eq!(
            *joints[0].kind(),
            JointKind::Spring {
                spring_constant: 10.0,
                rest_length: 3.32
            }
        );
        assert!(!joints[0].is_broken());
    }

    #[test]
    fn anchors_sit_on_the_bonded_monomers() {
        let structure = build(StrandKind::Dna, false, &["A", "B", "C", "D"]);
        let filters: Vec<Filter> = ["A or B", "C or D"]
            .iter()
            .map(|f| Filter::parse(f).unwrap())
            .collect();
        let clusters =
            create_filter_clusters(&structure, &structure.component_ids(), &filters).unwrap();
        let mut bodies = BodySet::with_key();
        let ids: Vec<BodyId> = clusters
            .iter()
            .map(|cluster| bodies.insert(cluster.clone().into()))
            .collect();
        let pairs: Vec<_> = ids.iter().copied().zip(clusters.iter()).collect();

        let joints = compute_intercluster_joints(&pairs, &structure, 3.32, 10.0);
        let (start, end) = joints[0].world_anchors(&bodies).unwrap();

        assert!((start - Point3::new(3.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((end - Point3::new(6.0, 0.0, 0.0)).norm() < 1e-9);
    }

    #[test]
    fn non_adjacent_pairs_produce_no_joint() {
        let structure = build(StrandKind::Dna, false, &["A", "B", "C", "D"]);
        assert_eq!(joints_for(&structure, &["A or D", "name B"]).len(), 1);
        assert!(joints_for(&structure, &["A", "C"]).is_empty());
    }

    #[test]
    fn different_strands_produce_no_joint() {
        let mut structure = Structure::new();
        let component = structure.add_component("c");
        for strand_name in ["s1", "s2"] {
            let strand = structure
                .add_strand(component, strand_name, StrandKind::Dna, false)
                .unwrap();
            structure
                .add_monomer(strand, strand_name, Point3::origin())
                .unwrap();
        }
        assert!(joints_for(&structure, &["strand s1", "strand s2"]).is_empty());
    }

    #[test]
    fn circular_strand_ends_are_bonded() {
        let circular = build(StrandKind::Dna, true, &["A", "B", "C"]);
        assert_eq!(joints_for(&circular, &["A", "C"]).len(), 1);

        let linear = build(StrandKind::Dna, false, &["A", "B", "C"]);
        assert!(joints_for(&linear, &["A", "C"]).is_empty());
    }

    #[test]
    fn amino_acids_are_never_bonded() {
        let structure = build(StrandKind::Protein, false, &["ALA", "GLY"]);
        assert!(joints_for(&structure, &["ALA", "GLY"]).is_empty());
    }
}

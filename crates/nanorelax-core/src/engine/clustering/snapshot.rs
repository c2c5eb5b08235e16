use crate::core::dynamics::cluster::ClusterElement;
use crate::core::models::ids::ComponentId;
use crate::core::models::structure::Structure;

/// Copies every monomer of `components` into a flat list of cluster
/// elements, component by component and strand by strand.
pub(super) fn snapshot_elements(
    structure: &Structure,
    components: &[ComponentId],
) -> Vec<ClusterElement> {
    components
        .iter()
        .flat_map(|&component_id| structure.monomers_of_component(component_id))
        .filter_map(|monomer_id| {
            let monomer = structure.monomer(monomer_id)?;
            let strand = structure.strand(monomer.strand_id)?;
            Some(ClusterElement {
                id: monomer_id,
                component: strand.component_id,
                strand: monomer.strand_id,
                sequence_index: monomer.sequence_index,
                kind: monomer.kind,
                terminus: strand.terminus_at(monomer.sequence_index),
                circular_strand: strand.circular,
                snapshot_position: monomer.position,
            })
        })
        .collect()
}

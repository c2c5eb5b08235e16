use super::snapshot::snapshot_elements;
use crate::core::dynamics::cluster::{ClusterElement, StructureCluster};
use crate::core::models::ids::ComponentId;
use crate::core::models::structure::Structure;
use crate::core::selection::Filter;
use crate::engine::error::EngineError;
use tracing::{debug, instrument, warn};

/// Builds one cluster per filter from the monomers of `components`.
///
/// Filters are applied in order and each one claims the still unclaimed
/// monomers it matches, so the first matching filter wins. A filter that
/// claims nothing contributes no cluster. Monomers no filter matches are left
/// out of every cluster.
#[instrument(skip_all, name = "filter_clustering")]
pub fn create_filter_clusters(
    structure: &Structure,
    components: &[ComponentId],
    filters: &[Filter],
) -> Result<Vec<StructureCluster>, EngineError> {
    let elements = snapshot_elements(structure, components);
    let mut claimed = vec![false; elements.len()];
    let mut clusters = Vec::new();

    for (filter_index, filter) in filters.iter().enumerate() {
        let matched: Vec<usize> = (0..elements.len())
            .filter(|&i| !claimed[i] && filter.matches(structure, elements[i].id))
            .collect();
        for &i in &matched {
            claimed[i] = true;
        }
        let members: Vec<ClusterElement> =
            matched.iter().map(|&i| elements[i].clone()).collect();

        if members.is_empty() {
            warn!("Filter #{} matched no unclaimed monomers.", filter_index);
            continue;
        }
        debug!("Filter #{} claimed {} monomer(s).", filter_index, members.len());
        clusters.push(StructureCluster::new(members)?);
    }

    let unclaimed = claimed.iter().filter(|&&c| !c).count();
    if unclaimed > 0 {
        debug!("{} monomer(s) were not claimed by any filter.", unclaimed);
    }
    Ok(clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::strand::StrandKind;
    use nalgebra::Point3;

    fn abc_structure() -> (Structure, ComponentId) {
        let mut structure = Structure::new();
        let component = structure.add_component("c");
        let strand = structure
            .add_strand(component, "s", StrandKind::Dna, false)
            .unwrap();
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            structure
                .add_monomer(strand, name, Point3::new(i as f64, 0.0, 0.0))
                .unwrap();
        }
        (structure, component)
    }

    fn parse(filters: &[&str]) -> Vec<Filter> {
        filters.iter().map(|f| Filter::parse(f).unwrap()).collect()
    }

    fn names(structure: &Structure, cluster: &StructureCluster) -> Vec<String> {
        cluster
            .elements()
            .iter()
            .map(|e| structure.monomer(e.id).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn filters_partition_monomers_in_order() {
        let (structure, component) = abc_structure();
        let clusters =
            create_filter_clusters(&structure, &[component], &parse(&["A", "B or C"])).unwrap();

        assert_eq!(clusters.len(), 2);
        assert_eq!(names(&structure, &clusters[0]), vec!["A"]);
        assert_eq!(names(&structure, &clusters[1]), vec!["B", "C"]);
    }

    #[test]
    fn filter_matching_nothing_contributes_no_cluster() {
        let (structure, component) = abc_structure();
        let clusters =
            create_filter_clusters(&structure, &[component], &parse(&["G", "A or B"])).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(names(&structure, &clusters[0]), vec!["A", "B"]);
    }

    #[test]
    fn first_matching_filter_wins() {
        let (structure, component) = abc_structure();
        let clusters =
            create_filter_clusters(&structure, &[component], &parse(&["all", "A"])).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].elements().len(), 3);
    }

    #[test]
    fn cluster_sphere_encloses_members() {
        let (structure, component) = abc_structure();
        let clusters =
            create_filter_clusters(&structure, &[component], &parse(&["B or C"])).unwrap();
        assert!((clusters[0].body().position() - Point3::new(1.5, 0.0, 0.0)).norm() < 1e-9);
        assert!((clusters[0].radius() - 0.5).abs() < 1e-9);
    }
}

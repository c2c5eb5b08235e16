use crate::core::models::ids::ComponentId;
use crate::core::models::structure::Structure;
use tracing::{debug, instrument};

/// Bakes the transform of every structure-bearing component into the stored
/// coordinates of its monomers. Afterwards each component transform is the
/// identity.
///
/// # Return
///
/// The number of components whose transform was baked.
#[instrument(skip_all, name = "prepare_components")]
pub fn prepare_components(structure: &mut Structure, components: &[ComponentId]) -> usize {
    let mut prepared = 0;
    for &component_id in components {
        let has_structure = structure
            .component(component_id)
            .is_some_and(|component| component.has_structure());
        if has_structure && structure.bake_component_transform(component_id).is_some() {
            prepared += 1;
        }
    }
    debug!("Baked transforms of {} component(s).", prepared);
    prepared
}

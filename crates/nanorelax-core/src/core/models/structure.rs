use super::component::Component;
use super::ids::{ComponentId, MonomerId, StrandId};
use super::monomer::{Monomer, Terminus};
use super::strand::{Strand, StrandKind};
use crate::core::dynamics::store::ElementStore;
use nalgebra::{Isometry3, Point3};
use slotmap::SlotMap;
use std::collections::HashMap;

/// Represents a complete coarse-grained structure made of components, strands
/// and monomers.
///
/// This struct is the data layer the dynamics engine operates on. It owns all
/// monomers and exposes them to the engine through the narrow
/// [`ElementStore`] capability surface, keeping the engine independent from
/// file formats and rendering.
#[derive(Debug, Clone, Default)]
pub struct Structure {
    /// Primary storage for monomers.
    monomers: SlotMap<MonomerId, Monomer>,
    /// Primary storage for strands.
    strands: SlotMap<StrandId, Strand>,
    /// Primary storage for components.
    components: SlotMap<ComponentId, Component>,
    /// Lookup map for finding components by name.
    component_name_map: HashMap<String, ComponentId>,
}

impl Structure {
    /// Creates a new, empty structure.
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieves an immutable reference to a monomer by its ID.
    pub fn monomer(&self, id: MonomerId) -> Option<&Monomer> {
        self.monomers.get(id)
    }

    /// Retrieves a mutable reference to a monomer by its ID.
    pub fn monomer_mut(&mut self, id: MonomerId) -> Option<&mut Monomer> {
        self.monomers.get_mut(id)
    }

    /// Returns an iterator over all monomers in the structure.
    pub fn monomers_iter(&self) -> impl Iterator<Item = (MonomerId, &Monomer)> {
        self.monomers.iter()
    }

    pub fn monomer_count(&self) -> usize {
        self.monomers.len()
    }

    pub fn strand(&self, id: StrandId) -> Option<&Strand> {
        self.strands.get(id)
    }

    pub fn strands_iter(&self) -> impl Iterator<Item = (StrandId, &Strand)> {
        self.strands.iter()
    }

    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id)
    }

    pub fn components_iter(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components.iter()
    }

    /// Returns the IDs of all components in insertion order.
    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.keys().collect()
    }

    /// Finds a component ID by its name.
    pub fn find_component_by_name(&self, name: &str) -> Option<ComponentId> {
        self.component_name_map.get(name).copied()
    }

    /// Adds a new component or returns the existing one with the same name.
    ///
    /// # Arguments
    ///
    /// * `name` - The unique name of the component.
    ///
    /// # Return
    ///
    /// The ID of the component (new or existing).
    pub fn add_component(&mut self, name: &str) -> ComponentId {
        if let Some(&id) = self.component_name_map.get(name) {
            return id;
        }
        let id = self.components.insert(Component::new(name));
        self.component_name_map.insert(name.to_string(), id);
        id
    }

    /// Appends a new, empty strand to a component.
    ///
    /// # Return
    ///
    /// Returns `Some(StrandId)` if successful, otherwise `None` (e.g., if the
    /// component doesn't exist).
    pub fn add_strand(
        &mut self,
        component_id: ComponentId,
        name: &str,
        kind: StrandKind,
        circular: bool,
    ) -> Option<StrandId> {
        let component = self.components.get_mut(component_id)?;
        let strand_id = self
            .strands
            .insert(Strand::new(name, kind, circular, component_id));
        component.strands.push(strand_id);
        Some(strand_id)
    }

    /// Appends a monomer at the 3' (or C-terminal) end of a strand.
    ///
    /// The monomer kind and sequence index are derived from the strand.
    ///
    /// # Return
    ///
    /// Returns `Some(MonomerId)` if successful, otherwise `None` (e.g., if the
    /// strand doesn't exist).
    pub fn add_monomer(
        &mut self,
        strand_id: StrandId,
        name: &str,
        position: Point3<f64>,
    ) -> Option<MonomerId> {
        let strand = self.strands.get_mut(strand_id)?;
        let mut monomer = Monomer::new(name, strand.kind.monomer_kind(), strand_id, position);
        monomer.sequence_index = strand.monomers.len();
        let monomer_id = self.monomers.insert(monomer);
        strand.monomers.push(monomer_id);
        Some(monomer_id)
    }

    /// Enumerates the monomers of a component, strand by strand in sequence
    /// order.
    pub fn monomers_of_component(&self, component_id: ComponentId) -> Vec<MonomerId> {
        self.components
            .get(component_id)
            .map(|component| {
                component
                    .strands
                    .iter()
                    .filter_map(|&strand_id| self.strands.get(strand_id))
                    .flat_map(|strand| strand.monomers.iter().copied())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the parent strand of a monomer.
    pub fn parent_strand(&self, monomer_id: MonomerId) -> Option<&Strand> {
        let monomer = self.monomers.get(monomer_id)?;
        self.strands.get(monomer.strand_id)
    }

    /// Returns the component owning a monomer.
    pub fn parent_component(&self, monomer_id: MonomerId) -> Option<ComponentId> {
        self.parent_strand(monomer_id)
            .map(|strand| strand.component_id)
    }

    /// Returns which strand end the monomer sits on, if any.
    pub fn terminus_of(&self, monomer_id: MonomerId) -> Option<Terminus> {
        let monomer = self.monomers.get(monomer_id)?;
        self.strands
            .get(monomer.strand_id)?
            .terminus_at(monomer.sequence_index)
    }

    /// Bakes a component's transform into the stored coordinates of all of
    /// its monomers and resets the component transform to identity.
    ///
    /// # Return
    ///
    /// Returns `Some(())` if the component exists, otherwise `None`.
    pub fn bake_component_transform(&mut self, component_id: ComponentId) -> Option<()> {
        let transform = self.components.get(component_id)?.transform;
        if transform != Isometry3::identity() {
            for monomer_id in self.monomers_of_component(component_id) {
                if let Some(monomer) = self.monomers.get_mut(monomer_id) {
                    monomer.apply_transform(&transform);
                }
            }
            self.components[component_id].needs_refresh = true;
        }
        self.components[component_id].transform = Isometry3::identity();
        Some(())
    }

    /// Returns and clears the set of components flagged for a visual refresh.
    pub fn drain_refresh_requests(&mut self) -> Vec<ComponentId> {
        self.components
            .iter_mut()
            .filter(|(_, component)| component.needs_refresh)
            .map(|(id, component)| {
                component.needs_refresh = false;
                id
            })
            .collect()
    }
}

impl ElementStore for Structure {
    fn element_position(&self, id: MonomerId) -> Option<Point3<f64>> {
        self.monomers.get(id).map(|monomer| monomer.position)
    }

    fn transform_element(&mut self, id: MonomerId, transform: &Isometry3<f64>) {
        if let Some(monomer) = self.monomers.get_mut(id) {
            monomer.apply_transform(transform);
        }
    }

    fn mark_component_dirty(&mut self, id: ComponentId) {
        if let Some(component) = self.components.get_mut(id) {
            component.needs_refresh = true;
        }
    }
}

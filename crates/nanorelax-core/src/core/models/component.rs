use super::ids::StrandId;
use nalgebra::Isometry3;

/// A top-level structural component, the unit a host application loads and
/// renders as one object.
///
/// The component transform places its strands in the world. Coordinates of
/// member monomers are stored in component space until the transform is
/// baked into them (see [`Structure::bake_component_transform`]).
///
/// [`Structure::bake_component_transform`]: super::structure::Structure::bake_component_transform
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub transform: Isometry3<f64>,
    pub(crate) strands: Vec<StrandId>,
    pub(crate) needs_refresh: bool,
}

impl Component {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transform: Isometry3::identity(),
            strands: Vec::new(),
            needs_refresh: false,
        }
    }

    pub fn strands(&self) -> &[StrandId] {
        &self.strands
    }

    /// Whether this component carries any polymer structure at all.
    pub fn has_structure(&self) -> bool {
        !self.strands.is_empty()
    }

    /// Whether the component's monomers were moved since the host last
    /// refreshed its visual representation.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }
}

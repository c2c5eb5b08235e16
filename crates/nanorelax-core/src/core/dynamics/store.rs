use crate::core::models::ids::{ComponentId, MonomerId};
use nalgebra::{Isometry3, Point3};

/// The capability surface the dynamics engine needs from a structural data
/// layer.
///
/// Clusters only ever read element positions, apply rigid transforms to
/// elements and flag the owning components for a visual refresh. Keeping the
/// engine behind this trait lets it be exercised without parsers or
/// renderers.
pub trait ElementStore {
    /// Returns the stored (world-space) position of an element.
    fn element_position(&self, id: MonomerId) -> Option<Point3<f64>>;

    /// Applies a rigid transform to an element in place. Unknown IDs are
    /// ignored.
    fn transform_element(&mut self, id: MonomerId, transform: &Isometry3<f64>);

    /// Flags a component as needing a visual refresh. Repeated calls within a
    /// frame are idempotent.
    fn mark_component_dirty(&mut self, id: ComponentId);
}

use super::body::{RigidBody, StepMotion};
use super::error::DynamicsError;
use super::shape::Shape;
use super::store::ElementStore;
use crate::core::models::ids::{ComponentId, MonomerId, StrandId};
use crate::core::models::monomer::{MonomerKind, Terminus};
use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion};

/// Mass given to every structure cluster.
pub const CLUSTER_MASS: f64 = 1.0;

/// Snapshot of one structural element taken when a cluster is built.
///
/// Topology fields are copied out of the data layer so that joint synthesis
/// can run without it; `snapshot_position` is the position at snapshot time
/// and goes stale once the simulation moves the element.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterElement {
    pub id: MonomerId,
    pub component: ComponentId,
    pub strand: StrandId,
    pub sequence_index: usize,
    pub kind: MonomerKind,
    pub terminus: Option<Terminus>,
    pub circular_strand: bool,
    pub snapshot_position: Point3<f64>,
}

/// A rigid body built around a set of structural elements, whose motion is
/// propagated onto those elements every step.
///
/// The body is a unit-mass sphere enclosing the bounding box of the element
/// positions at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureCluster {
    body: RigidBody,
    elements: Vec<ClusterElement>,
    components: Vec<ComponentId>,
}

impl StructureCluster {
    /// Builds a cluster from element snapshots.
    ///
    /// Element positions must already be expressed in world space, i.e. any
    /// component transform has been baked into them.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::EmptyCluster`] when `elements` is empty.
    pub fn new(elements: Vec<ClusterElement>) -> Result<Self, DynamicsError> {
        let (center, radius) = bounding_sphere(elements.iter().map(|e| e.snapshot_position))
            .ok_or(DynamicsError::EmptyCluster)?;

        let mut components: Vec<ComponentId> = Vec::new();
        for element in &elements {
            if !components.contains(&element.component) {
                components.push(element.component);
            }
        }

        Ok(Self {
            body: RigidBody::new(center, Shape::sphere(CLUSTER_MASS, radius)),
            elements,
            components,
        })
    }

    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut RigidBody {
        &mut self.body
    }

    pub fn elements(&self) -> &[ClusterElement] {
        &self.elements
    }

    /// Distinct components owning at least one element, in first-seen order.
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    pub fn radius(&self) -> f64 {
        self.body.shape().radius().unwrap_or(0.0)
    }

    /// Integrates the cluster body and applies the same rigid motion to every
    /// owned element, then flags the owning components for a refresh.
    pub fn update_position(&mut self, dt: f64, store: &mut dyn ElementStore) -> StepMotion {
        let motion = self.body.update_position(dt);
        if !motion.is_identity() {
            let transform = element_transform(self.body.position(), &motion);
            for element in &self.elements {
                store.transform_element(element.id, &transform);
            }
        }
        for &component in &self.components {
            store.mark_component_dirty(component);
        }
        motion
    }
}

/// Transform carrying an element along with a body that just moved by
/// `motion` and now sits at `new_center`.
///
/// The order is T(new_center) * R * T(-new_center) * T(translation): the
/// element is first translated with the body, then rotated about the
/// post-step center.
pub fn element_transform(new_center: &Point3<f64>, motion: &StepMotion) -> Isometry3<f64> {
    let to_center = Isometry3::from_parts(
        Translation3::from(new_center.coords),
        UnitQuaternion::identity(),
    );
    let rotate = Isometry3::from_parts(Translation3::identity(), motion.rotation);
    let from_center = Isometry3::from_parts(
        Translation3::from(-new_center.coords),
        UnitQuaternion::identity(),
    );
    let step = Isometry3::from_parts(
        Translation3::from(motion.translation),
        UnitQuaternion::identity(),
    );
    to_center * rotate * from_center * step
}

/// Sphere circumscribing the axis-aligned bounding box of `points`.
pub fn bounding_sphere(
    mut points: impl Iterator<Item = Point3<f64>>,
) -> Option<(Point3<f64>, f64)> {
    let first = points.next()?;
    let (min, max) = points.fold((first, first), |(min, max), p| {
        (min.inf(&p), max.sup(&p))
    });
    let center = nalgebra::center(&min, &max);
    Some((center, (max - min).norm() * 0.5))
}

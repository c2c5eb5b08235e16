use super::ids::BodyId;
use nalgebra::{Isometry3, Point3, Unit, Vector3};

const DIRECTION_EPSILON: f64 = 1e-12;

/// Kind-specific geometry of a [`Shape`].
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeKind {
    /// A solid sphere centered on the shape offset.
    Sphere { radius: f64 },
    /// An ordered composite of child shapes sharing the same owning body.
    Compound { children: Vec<Shape> },
}

/// The pair of deepest points found by a narrow-phase test.
///
/// `source` is the deepest point of the first shape inside the second one and
/// `colliding` is the deepest point of the second shape inside the first one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoints {
    pub source: Point3<f64>,
    pub colliding: Point3<f64>,
}

impl ContactPoints {
    fn swapped(self) -> Self {
        Self {
            source: self.colliding,
            colliding: self.source,
        }
    }
}

/// Geometry and mass descriptor attached to exactly one rigid body.
///
/// Offsets are expressed in the local space of the owning body. For compound
/// shapes, mass and moment of inertia are derived from the children and
/// cannot be assigned directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    owner: Option<BodyId>,
    mass: f64,
    offset: Vector3<f64>,
    kind: ShapeKind,
}

impl Shape {
    pub fn sphere(mass: f64, radius: f64) -> Self {
        Self {
            owner: None,
            mass,
            offset: Vector3::zeros(),
            kind: ShapeKind::Sphere { radius },
        }
    }

    pub fn compound(children: Vec<Shape>) -> Self {
        Self {
            owner: None,
            mass: 0.0,
            offset: Vector3::zeros(),
            kind: ShapeKind::Compound { children },
        }
    }

    pub fn with_offset(mut self, offset: Vector3<f64>) -> Self {
        self.offset = offset;
        self
    }

    pub fn kind(&self) -> &ShapeKind {
        &self.kind
    }

    pub fn offset(&self) -> &Vector3<f64> {
        &self.offset
    }

    /// The handle of the body this shape is attached to, once registered.
    pub fn owner(&self) -> Option<BodyId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<BodyId>) {
        self.owner = owner;
        if let ShapeKind::Compound { children } = &mut self.kind {
            for child in children {
                child.set_owner(owner);
            }
        }
    }

    pub fn radius(&self) -> Option<f64> {
        match self.kind {
            ShapeKind::Sphere { radius } => Some(radius),
            ShapeKind::Compound { .. } => None,
        }
    }

    pub fn mass(&self) -> f64 {
        match &self.kind {
            ShapeKind::Sphere { .. } => self.mass,
            ShapeKind::Compound { children } => children.iter().map(Shape::mass).sum(),
        }
    }

    /// Sets the mass of a sphere. Writing the mass of a compound is a no-op
    /// since it is always the sum of its children.
    pub fn set_mass(&mut self, mass: f64) {
        if let ShapeKind::Sphere { .. } = self.kind {
            self.mass = mass;
        }
    }

    /// Scalar moment of inertia about the owning body's origin.
    ///
    /// Spheres use the solid-sphere formula plus a parallel-axis term for the
    /// offset. Compounds simply sum their children without recombining axes.
    pub fn moment_of_inertia(&self) -> f64 {
        match &self.kind {
            ShapeKind::Sphere { radius } => {
                0.4 * self.mass * radius * radius + self.mass * self.offset.norm_squared()
            }
            ShapeKind::Compound { children } => {
                children.iter().map(Shape::moment_of_inertia).sum()
            }
        }
    }

    /// World-space center of the shape given the pose of its owning body.
    pub fn world_center(&self, pose: &Isometry3<f64>) -> Point3<f64> {
        pose * Point3::from(self.offset)
    }

    /// Narrow-phase test between this shape and another one.
    ///
    /// Returns `None` when the shapes do not overlap or the pair is not
    /// supported.
    pub fn collide(
        &self,
        pose: &Isometry3<f64>,
        other: &Shape,
        other_pose: &Isometry3<f64>,
    ) -> Option<ContactPoints> {
        match (&self.kind, &other.kind) {
            (ShapeKind::Sphere { radius }, ShapeKind::Sphere { radius: other_radius }) => {
                sphere_sphere(
                    self.world_center(pose),
                    *radius,
                    other.world_center(other_pose),
                    *other_radius,
                )
            }
            (ShapeKind::Compound { children }, _) => {
                compound_any(children, pose, other, other_pose)
            }
            (ShapeKind::Sphere { .. }, ShapeKind::Compound { children }) => {
                compound_any(children, other_pose, self, pose).map(ContactPoints::swapped)
            }
        }
    }
}

fn sphere_sphere(
    center_a: Point3<f64>,
    radius_a: f64,
    center_b: Point3<f64>,
    radius_b: f64,
) -> Option<ContactPoints> {
    let delta = center_b - center_a;
    let reach = radius_a + radius_b;
    if delta.norm_squared() > reach * reach {
        return None;
    }
    let direction = Unit::try_new(delta, DIRECTION_EPSILON)
        .map(Unit::into_inner)
        .unwrap_or_else(Vector3::zeros);
    Some(ContactPoints {
        source: center_a + direction * radius_a,
        colliding: center_b - direction * radius_b,
    })
}

// Unweighted centroid of every child contact; not a true contact manifold.
fn compound_any(
    children: &[Shape],
    pose: &Isometry3<f64>,
    other: &Shape,
    other_pose: &Isometry3<f64>,
) -> Option<ContactPoints> {
    let contacts: Vec<ContactPoints> = children
        .iter()
        .filter_map(|child| child.collide(pose, other, other_pose))
        .collect();
    if contacts.is_empty() {
        return None;
    }
    let count = contacts.len() as f64;
    let (source_sum, colliding_sum) = contacts.iter().fold(
        (Vector3::zeros(), Vector3::zeros()),
        |(source, colliding), contact| {
            (source + contact.source.coords, colliding + contact.colliding.coords)
        },
    );
    Some(ContactPoints {
        source: Point3::from(source_sum / count),
        colliding: Point3::from(colliding_sum / count),
    })
}

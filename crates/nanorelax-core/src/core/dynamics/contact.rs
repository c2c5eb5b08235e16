use super::body::RigidBody;
use super::ids::BodyId;
use nalgebra::{Point3, Unit, Vector3};

const NORMAL_EPSILON: f64 = 1e-12;

/// One detected interpenetration between two bodies, reported from the
/// perspective of the `source` body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionContact {
    pub source: BodyId,
    pub colliding: BodyId,
    /// Deepest point of the source body inside the colliding body.
    pub source_point: Point3<f64>,
    /// Deepest point of the colliding body inside the source body.
    pub colliding_point: Point3<f64>,
}

impl CollisionContact {
    /// Runs the narrow phase between two bodies.
    pub fn detect(
        source: BodyId,
        source_body: &RigidBody,
        colliding: BodyId,
        colliding_body: &RigidBody,
    ) -> Option<Self> {
        source_body
            .shape()
            .collide(
                &source_body.pose(),
                colliding_body.shape(),
                &colliding_body.pose(),
            )
            .map(|points| Self {
                source,
                colliding,
                source_point: points.source,
                colliding_point: points.colliding,
            })
    }

    /// Unit vector from the source point toward the colliding point, or zero
    /// when the two points coincide.
    pub fn normal(&self) -> Vector3<f64> {
        Unit::try_new(self.colliding_point - self.source_point, NORMAL_EPSILON)
            .map(Unit::into_inner)
            .unwrap_or_else(Vector3::zeros)
    }

    pub fn depth(&self) -> f64 {
        (self.colliding_point - self.source_point).norm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dynamics::shape::Shape;
    use slotmap::SlotMap;

    fn two_bodies(distance: f64) -> (SlotMap<BodyId, RigidBody>, BodyId, BodyId) {
        let mut bodies = SlotMap::with_key();
        let a = bodies.insert(RigidBody::new(Point3::origin(), Shape::sphere(1.0, 1.0)));
        let b = bodies.insert(RigidBody::new(
            Point3::new(distance, 0.0, 0.0),
            Shape::sphere(1.0, 1.0),
        ));
        (bodies, a, b)
    }

    #[test]
    fn normal_points_away_from_colliding_body() {
        let (bodies, a, b) = two_bodies(1.5);
        let contact = CollisionContact::detect(a, &bodies[a], b, &bodies[b]).unwrap();

        assert_eq!(contact.source, a);
        assert_eq!(contact.colliding, b);
        assert!((contact.normal() - Vector3::new(-1.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((contact.depth() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn coincident_points_give_zero_normal() {
        let (bodies, a, b) = two_bodies(0.0);
        let contact = CollisionContact::detect(a, &bodies[a], b, &bodies[b]).unwrap();
        assert_eq!(contact.normal(), Vector3::zeros());
        assert_eq!(contact.depth(), 0.0);
    }

    #[test]
    fn separated_bodies_have_no_contact() {
        let (bodies, a, b) = two_bodies(3.0);
        assert!(CollisionContact::detect(a, &bodies[a], b, &bodies[b]).is_none());
    }
}

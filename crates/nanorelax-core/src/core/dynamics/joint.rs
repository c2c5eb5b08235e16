use super::bodies::BodySet;
use super::ids::BodyId;
use nalgebra::{Point3, Unit, Vector3};

const AXIS_EPSILON: f64 = 1e-12;

/// Kind-specific constraint law of a [`Joint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointKind {
    /// Hookean spring along the anchor-to-anchor axis.
    Spring {
        spring_constant: f64,
        rest_length: f64,
    },
}

impl JointKind {
    /// Force acting on the start anchor for the given start-to-end axis. The
    /// end anchor receives the opposite force.
    fn start_force(&self, axis: &Vector3<f64>) -> Vector3<f64> {
        match *self {
            JointKind::Spring {
                spring_constant,
                rest_length,
            } => match Unit::try_new(*axis, AXIS_EPSILON) {
                Some(direction) => {
                    direction.into_inner() * (spring_constant * (axis.norm() - rest_length))
                }
                None => Vector3::zeros(),
            },
        }
    }
}

/// What a call to [`Joint::apply_forces`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointUpdate {
    /// Forces were applied to both bodies.
    Applied,
    /// The break threshold was reached during this call; nothing was applied.
    Broke,
    /// The joint was already broken.
    Inactive,
    /// One of the referenced bodies is no longer registered.
    Detached,
}

/// A constraint connecting two rigid bodies at local anchor points.
///
/// A joint with a finite break force turns `broken` once the difference of
/// the two bodies' current forces, projected on the joint axis, reaches the
/// threshold. Broken joints never apply forces again and ignore further
/// threshold changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    start: BodyId,
    end: BodyId,
    start_anchor: Point3<f64>,
    end_anchor: Point3<f64>,
    break_force: f64,
    broken: bool,
    kind: JointKind,
}

impl Joint {
    /// Creates an unbreakable spring joint.
    ///
    /// # Arguments
    ///
    /// * `start` / `end` - Handles of the connected bodies.
    /// * `start_anchor` / `end_anchor` - Anchor points in each body's local space.
    /// * `spring_constant` - Stiffness of the spring.
    /// * `rest_length` - Distance at which the spring exerts no force.
    pub fn spring(
        start: BodyId,
        start_anchor: Point3<f64>,
        end: BodyId,
        end_anchor: Point3<f64>,
        spring_constant: f64,
        rest_length: f64,
    ) -> Self {
        Self {
            start,
            end,
            start_anchor,
            end_anchor,
            break_force: f64::INFINITY,
            broken: false,
            kind: JointKind::Spring {
                spring_constant,
                rest_length,
            },
        }
    }

    pub fn with_break_force(mut self, break_force: f64) -> Self {
        self.set_break_force(break_force);
        self
    }

    pub fn start(&self) -> BodyId {
        self.start
    }

    pub fn end(&self) -> BodyId {
        self.end
    }

    pub fn start_anchor(&self) -> &Point3<f64> {
        &self.start_anchor
    }

    pub fn end_anchor(&self) -> &Point3<f64> {
        &self.end_anchor
    }

    pub fn kind(&self) -> &JointKind {
        &self.kind
    }

    pub fn break_force(&self) -> f64 {
        self.break_force
    }

    /// Changes the break threshold. Has no effect once the joint is broken.
    pub fn set_break_force(&mut self, break_force: f64) {
        if !self.broken {
            self.break_force = break_force;
        }
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// World-space anchor positions, or `None` if either body is missing.
    pub fn world_anchors(&self, bodies: &BodySet) -> Option<(Point3<f64>, Point3<f64>)> {
        let start = bodies.get(self.start)?.rigid();
        let end = bodies.get(self.end)?.rigid();
        Some((
            start.local_to_world_pos(&self.start_anchor),
            end.local_to_world_pos(&self.end_anchor),
        ))
    }

    /// Evaluates the break condition and, while the joint is active, adds the
    /// constraint forces to both bodies at their world anchor points.
    pub fn apply_forces(&mut self, bodies: &mut BodySet) -> JointUpdate {
        if self.broken {
            return JointUpdate::Inactive;
        }
        let Some((start_world, end_world)) = self.world_anchors(bodies) else {
            return JointUpdate::Detached;
        };
        let axis = end_world - start_world;

        if self.break_force.is_finite() {
            let start_force = bodies[self.start].rigid().current_force();
            let end_force = bodies[self.end].rigid().current_force();
            let strain = (project(&start_force, &axis) - project(&end_force, &axis)).norm();
            if strain >= self.break_force {
                self.broken = true;
                return JointUpdate::Broke;
            }
        }

        let force = self.kind.start_force(&axis);
        if let Some(body) = bodies.get_mut(self.start) {
            body.rigid_mut().add_force_at_position(&force, &start_world);
        }
        if let Some(body) = bodies.get_mut(self.end) {
            body.rigid_mut().add_force_at_position(&-force, &end_world);
        }
        JointUpdate::Applied
    }
}

fn project(vector: &Vector3<f64>, axis: &Vector3<f64>) -> Vector3<f64> {
    let axis_length_squared = axis.norm_squared();
    if axis_length_squared <= AXIS_EPSILON * AXIS_EPSILON {
        return Vector3::zeros();
    }
    axis * (vector.dot(axis) / axis_length_squared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dynamics::bodies::Body;
    use crate::core::dynamics::body::RigidBody;
    use crate::core::dynamics::shape::Shape;

    fn bodies_at(distance: f64) -> (BodySet, BodyId, BodyId) {
        let mut bodies = BodySet::with_key();
        let a = bodies.insert(Body::Rigid(RigidBody::new(
            Point3::origin(),
            Shape::sphere(1.0, 0.5),
        )));
        let b = bodies.insert(Body::Rigid(RigidBody::new(
            Point3::new(distance, 0.0, 0.0),
            Shape::sphere(1.0, 0.5),
        )));
        (bodies, a, b)
    }

    fn centered_spring(a: BodyId, b: BodyId, k: f64, rest: f64) -> Joint {
        Joint::spring(a, Point3::origin(), b, Point3::origin(), k, rest)
    }

    #[test]
    fn stretched_spring_pulls_bodies_together_with_hooke_magnitude() {
        let (mut bodies, a, b) = bodies_at(5.0);
        let mut joint = centered_spring(a, b, 2.0, 3.0);

        assert_eq!(joint.apply_forces(&mut bodies), JointUpdate::Applied);

        let force_a = bodies[a].rigid().current_force();
        let force_b = bodies[b].rigid().current_force();
        assert!((force_a - Vector3::new(4.0, 0.0, 0.0)).norm() < 1e-9);
        assert!((force_b + force_a).norm() < 1e-9);
    }

    #[test]
    fn compressed_spring_pushes_bodies_apart() {
        let (mut bodies, a, b) = bodies_at(1.0);
        let mut joint = centered_spring(a, b, 10.0, 3.0);
        joint.apply_forces(&mut bodies);
        let force_a = bodies[a].rigid().current_force();
        assert!((force_a.norm() - 20.0).abs() < 1e-9);
        assert!(force_a.x < 0.0);
    }

    #[test]
    fn spring_at_rest_length_applies_no_force() {
        let (mut bodies, a, b) = bodies_at(3.32);
        let mut joint = centered_spring(a, b, 10.0, 3.32);
        joint.apply_forces(&mut bodies);
        assert!(bodies[a].rigid().current_force().norm() < 1e-9);
        assert!(bodies[b].rigid().current_force().norm() < 1e-9);
    }

    #[test]
    fn offset_anchor_generates_torque() {
        let (mut bodies, a, b) = bodies_at(5.0);
        let mut joint = Joint::spring(a, Point3::new(0.0, 1.0, 0.0), b, Point3::new(0.0, 1.0, 0.0), 1.0, 0.0);
        joint.apply_forces(&mut bodies);
        assert!(bodies[a].rigid().current_torque().norm() > 0.0);
    }

    #[test]
    fn default_joint_never_breaks() {
        let (mut bodies, a, b) = bodies_at(100.0);
        let mut joint = centered_spring(a, b, 1000.0, 0.0);
        for _ in 0..5 {
            assert_eq!(joint.apply_forces(&mut bodies), JointUpdate::Applied);
        }
        assert!(!joint.is_broken());
        assert!(joint.break_force().is_infinite());
    }

    #[test]
    fn joint_breaks_under_excess_force_and_stays_broken() {
        let (mut bodies, a, b) = bodies_at(5.0);
        let mut joint = centered_spring(a, b, 2.0, 3.0).with_break_force(1.0);

        // First call accumulates +4 / -4 along the axis; the second one sees a
        // strain of 8 against a threshold of 1.
        assert_eq!(joint.apply_forces(&mut bodies), JointUpdate::Applied);
        assert_eq!(joint.apply_forces(&mut bodies), JointUpdate::Broke);
        assert!(joint.is_broken());

        for body in bodies.values_mut() {
            body.rigid_mut().clear_force_and_torque();
        }
        assert_eq!(joint.apply_forces(&mut bodies), JointUpdate::Inactive);
        assert!(joint.is_broken());
        assert!(bodies[a].rigid().current_force().norm() < 1e-9);
    }

    #[test]
    fn break_force_changes_after_breaking_are_ignored() {
        let (mut bodies, a, b) = bodies_at(5.0);
        let mut joint = centered_spring(a, b, 2.0, 3.0).with_break_force(0.5);
        joint.apply_forces(&mut bodies);
        joint.apply_forces(&mut bodies);
        assert!(joint.is_broken());

        joint.set_break_force(f64::INFINITY);
        assert_eq!(joint.break_force(), 0.5);
        assert!(joint.is_broken());
    }

    #[test]
    fn strain_is_measured_along_the_joint_axis_only() {
        let (mut bodies, a, b) = bodies_at(5.0);
        bodies[a].rigid_mut().add_force(&Vector3::new(0.0, 50.0, 0.0));
        let mut joint = centered_spring(a, b, 1.0, 5.0).with_break_force(1.0);
        assert_eq!(joint.apply_forces(&mut bodies), JointUpdate::Applied);
        assert!(!joint.is_broken());
    }

    #[test]
    fn joint_with_missing_body_is_detached() {
        let (mut bodies, a, b) = bodies_at(5.0);
        let mut joint = centered_spring(a, b, 1.0, 1.0);
        bodies.remove(b);
        assert_eq!(joint.apply_forces(&mut bodies), JointUpdate::Detached);
        assert!(bodies[a].rigid().current_force().norm() < 1e-9);
    }
}

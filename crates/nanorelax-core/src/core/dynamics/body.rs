use super::error::DynamicsError;
use super::shape::Shape;
use nalgebra::{Isometry3, Point3, Translation3, Unit, UnitQuaternion, Vector3};

/// Default flat per-step velocity damping factor.
pub const DEFAULT_FRICTION: f64 = 0.4;

const ROTATION_EPSILON: f64 = 1e-12;

/// The rigid motion produced by a single integration step.
///
/// `translation` is the displacement of the body origin and `rotation` the
/// world-space rotation that was pre-multiplied onto the orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMotion {
    pub translation: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl StepMotion {
    pub fn is_identity(&self) -> bool {
        self.translation == Vector3::zeros() && self.rotation == UnitQuaternion::identity()
    }
}

/// Physical state of a non-deformable body and its semi-implicit integrator.
///
/// Forces and torques accumulate between steps and are scaled by the time
/// step when integrated; impulses accumulate separately and change velocity
/// without time scaling. All four accumulators are cleared by
/// [`RigidBody::clear_force_and_torque`].
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    position: Point3<f64>,
    rotation: UnitQuaternion<f64>,
    linear_velocity: Vector3<f64>,
    angular_velocity: Vector3<f64>,
    force: Vector3<f64>,
    torque: Vector3<f64>,
    impulse_force: Vector3<f64>,
    impulse_torque: Vector3<f64>,
    friction: f64,
    shape: Shape,
}

impl RigidBody {
    /// Creates a resting body at `position` with identity rotation and the
    /// default friction.
    ///
    /// The shape's mass must be strictly positive; integration divides by it
    /// without checking.
    pub fn new(position: Point3<f64>, shape: Shape) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            force: Vector3::zeros(),
            torque: Vector3::zeros(),
            impulse_force: Vector3::zeros(),
            impulse_torque: Vector3::zeros(),
            friction: DEFAULT_FRICTION,
            shape,
        }
    }

    pub fn position(&self) -> &Point3<f64> {
        &self.position
    }

    pub fn set_position(&mut self, position: Point3<f64>) {
        self.position = position;
    }

    pub fn rotation(&self) -> &UnitQuaternion<f64> {
        &self.rotation
    }

    pub fn set_rotation(&mut self, rotation: UnitQuaternion<f64>) {
        self.rotation = rotation;
    }

    pub fn linear_velocity(&self) -> &Vector3<f64> {
        &self.linear_velocity
    }

    pub fn set_linear_velocity(&mut self, velocity: Vector3<f64>) {
        self.linear_velocity = velocity;
    }

    pub fn angular_velocity(&self) -> &Vector3<f64> {
        &self.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: Vector3<f64>) {
        self.angular_velocity = velocity;
    }

    pub fn friction(&self) -> f64 {
        self.friction
    }

    pub fn set_friction(&mut self, friction: f64) -> Result<(), DynamicsError> {
        if !(0.0..1.0).contains(&friction) {
            return Err(DynamicsError::InvalidFriction(friction));
        }
        self.friction = friction;
        Ok(())
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn shape_mut(&mut self) -> &mut Shape {
        &mut self.shape
    }

    pub fn mass(&self) -> f64 {
        self.shape.mass()
    }

    /// The body pose as an isometry from local to world space.
    pub fn pose(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position.coords), self.rotation)
    }

    /// Advances the body by one semi-implicit Euler step.
    ///
    /// Returns the rigid motion applied during the step so that owners of
    /// attached geometry can follow it.
    pub fn update_position(&mut self, dt: f64) -> StepMotion {
        let mass = self.shape.mass();
        let inertia = self.shape.moment_of_inertia();

        self.linear_velocity += self.force / mass * dt + self.impulse_force / mass;
        // Point-like bodies (zero radius, no offset) cannot be spun.
        if inertia > ROTATION_EPSILON {
            self.angular_velocity += self.torque / inertia * dt + self.impulse_torque / inertia;
        }

        let damping = 1.0 - self.friction;
        self.linear_velocity *= damping;
        self.angular_velocity *= damping;

        let translation = self.linear_velocity * dt;
        self.position += translation;

        let rotation = delta_rotation(&(self.angular_velocity * dt));
        self.rotation = rotation * self.rotation;

        StepMotion {
            translation,
            rotation,
        }
    }

    pub fn clear_force_and_torque(&mut self) {
        self.force = Vector3::zeros();
        self.torque = Vector3::zeros();
        self.impulse_force = Vector3::zeros();
        self.impulse_torque = Vector3::zeros();
    }

    pub fn add_force(&mut self, force: &Vector3<f64>) {
        self.force += force;
    }

    /// Adds a force acting at a world-space point, producing torque about the
    /// body origin.
    pub fn add_force_at_position(&mut self, force: &Vector3<f64>, position: &Point3<f64>) {
        self.force += force;
        self.torque += (position - self.position).cross(force);
    }

    pub fn add_impulse(&mut self, impulse: &Vector3<f64>) {
        self.impulse_force += impulse;
    }

    pub fn add_impulse_at_position(&mut self, impulse: &Vector3<f64>, position: &Point3<f64>) {
        self.impulse_force += impulse;
        self.impulse_torque += (position - self.position).cross(impulse);
    }

    pub fn local_to_world_pos(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    pub fn world_to_local_pos(&self, world: &Point3<f64>) -> Point3<f64> {
        Point3::from(self.rotation.inverse() * (world - self.position))
    }

    /// Accumulated force plus impulse force, per unit mass.
    pub fn current_force(&self) -> Vector3<f64> {
        (self.force + self.impulse_force) / self.shape.mass()
    }

    /// Accumulated torque plus impulse torque, per unit mass.
    pub fn current_torque(&self) -> Vector3<f64> {
        (self.torque + self.impulse_torque) / self.shape.mass()
    }
}

/// Rotation by `|scaled_axis|` radians about `scaled_axis`; identity for a
/// zero vector.
fn delta_rotation(scaled_axis: &Vector3<f64>) -> UnitQuaternion<f64> {
    match Unit::try_new(*scaled_axis, ROTATION_EPSILON) {
        Some(axis) => UnitQuaternion::from_axis_angle(&axis, scaled_axis.norm()),
        None => UnitQuaternion::identity(),
    }
}

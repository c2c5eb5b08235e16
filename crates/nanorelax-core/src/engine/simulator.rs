use super::config::SimulatorConfig;
use crate::core::dynamics::bodies::{Body, BodySet};
use crate::core::dynamics::contact::CollisionContact;
use crate::core::dynamics::ids::{BodyId, JointId};
use crate::core::dynamics::joint::{Joint, JointUpdate};
use crate::core::dynamics::store::ElementStore;
use nalgebra::{Point3, Unit, Vector3};
use slotmap::SlotMap;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimulationState {
    #[default]
    Stopped,
    Running,
    Paused,
}

/// Summary of one completed simulation step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// One-based index of the step since the simulation was last cleared.
    pub step: u64,
    pub dt: f64,
    /// Sum over all bodies of the magnitude of their resultant force.
    pub total_force: f64,
    pub contacts: usize,
    /// Joints that broke during this step.
    pub broken_joints: usize,
}

pub type StepListener<'a> = Box<dyn FnMut(&StepReport) + 'a>;

/// Hooks into the host application's frame loop.
///
/// The simulator registers for per-frame ticks when it starts, deregisters
/// when it stops and asks for a redraw after every step it runs from a tick.
pub trait HostLoop {
    fn register_tick(&mut self) {}
    fn deregister_tick(&mut self) {}
    fn request_redraw(&mut self) {}
}

/// A host loop that ignores every request, for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

impl HostLoop for Headless {}

/// Owns the bodies and joints of a simulation and advances them one step per
/// frame tick.
pub struct Simulator<'a> {
    config: SimulatorConfig,
    state: SimulationState,
    bodies: BodySet,
    body_order: Vec<BodyId>,
    joints: SlotMap<JointId, Joint>,
    joint_order: Vec<JointId>,
    last_contacts: Vec<CollisionContact>,
    step_count: u64,
    host: Box<dyn HostLoop + 'a>,
    listeners: Vec<StepListener<'a>>,
}

impl<'a> Simulator<'a> {
    pub fn new(config: SimulatorConfig) -> Self {
        Self::with_host_loop(config, Box::new(Headless))
    }

    pub fn with_host_loop(config: SimulatorConfig, host: Box<dyn HostLoop + 'a>) -> Self {
        Self {
            config,
            state: SimulationState::Stopped,
            bodies: BodySet::with_key(),
            body_order: Vec::new(),
            joints: SlotMap::with_key(),
            joint_order: Vec::new(),
            last_contacts: Vec::new(),
            step_count: 0,
            host,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    pub fn set_time_step(&mut self, time_step: f64) {
        self.config.time_step = time_step;
    }

    pub fn set_collision_resolution_multiplier(&mut self, multiplier: f64) {
        self.config.collision_resolution_multiplier = multiplier;
    }

    // --- Body registry ---

    pub fn add_body(&mut self, body: impl Into<Body>) -> BodyId {
        let id = self.bodies.insert(body.into());
        self.bodies[id].rigid_mut().shape_mut().set_owner(Some(id));
        self.body_order.push(id);
        id
    }

    pub fn add_bodies<B: Into<Body>>(&mut self, bodies: impl IntoIterator<Item = B>) -> Vec<BodyId> {
        bodies.into_iter().map(|body| self.add_body(body)).collect()
    }

    /// Removes a body. Joints still referring to it are skipped with a
    /// warning on every following step.
    pub fn remove_body(&mut self, id: BodyId) -> Option<Body> {
        let mut body = self.bodies.remove(id)?;
        self.body_order.retain(|&other| other != id);
        body.rigid_mut().shape_mut().set_owner(None);
        Some(body)
    }

    /// Replaces the whole body registry. Iteration order follows the arena.
    pub fn replace_bodies(&mut self, bodies: BodySet) {
        self.bodies = bodies;
        self.body_order = self.bodies.keys().collect();
        for (id, body) in self.bodies.iter_mut() {
            body.rigid_mut().shape_mut().set_owner(Some(id));
        }
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id)
    }

    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(id)
    }

    /// Registered bodies in registration order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.body_order
            .iter()
            .filter_map(|&id| self.bodies.get(id).map(|body| (id, body)))
    }

    pub fn body_count(&self) -> usize {
        self.body_order.len()
    }

    // --- Joint registry ---

    pub fn add_joint(&mut self, joint: Joint) -> JointId {
        let id = self.joints.insert(joint);
        self.joint_order.push(id);
        id
    }

    pub fn add_joints(&mut self, joints: impl IntoIterator<Item = Joint>) -> Vec<JointId> {
        joints.into_iter().map(|joint| self.add_joint(joint)).collect()
    }

    pub fn remove_joint(&mut self, id: JointId) -> Option<Joint> {
        let joint = self.joints.remove(id)?;
        self.joint_order.retain(|&other| other != id);
        Some(joint)
    }

    pub fn replace_joints(&mut self, joints: impl IntoIterator<Item = Joint>) {
        self.joints.clear();
        self.joint_order.clear();
        self.add_joints(joints);
    }

    pub fn joint(&self, id: JointId) -> Option<&Joint> {
        self.joints.get(id)
    }

    /// Registered joints in registration order.
    pub fn joints(&self) -> impl Iterator<Item = (JointId, &Joint)> {
        self.joint_order
            .iter()
            .filter_map(|&id| self.joints.get(id).map(|joint| (id, joint)))
    }

    pub fn joint_count(&self) -> usize {
        self.joint_order.len()
    }

    pub fn broken_joint_count(&self) -> usize {
        self.joints.values().filter(|joint| joint.is_broken()).count()
    }

    /// Contacts found during the most recent step, for debug overlays.
    pub fn last_contacts(&self) -> &[CollisionContact] {
        &self.last_contacts
    }

    pub fn add_step_listener(&mut self, listener: StepListener<'a>) {
        self.listeners.push(listener);
    }

    // --- Lifecycle ---

    /// Starts (or restarts) the simulation, optionally replacing the body and
    /// joint registries first.
    pub fn start(&mut self, bodies: Option<BodySet>, joints: Option<Vec<Joint>>) {
        if let Some(bodies) = bodies {
            self.replace_bodies(bodies);
        }
        if let Some(joints) = joints {
            self.replace_joints(joints);
        }
        if self.state == SimulationState::Stopped {
            self.host.register_tick();
        }
        self.state = SimulationState::Running;
        info!(
            "Simulation started with {} bodies and {} joints.",
            self.body_count(),
            self.joint_count()
        );
    }

    pub fn pause(&mut self) {
        if self.state == SimulationState::Running {
            self.state = SimulationState::Paused;
            debug!("Simulation paused after {} steps.", self.step_count);
        }
    }

    pub fn resume(&mut self) {
        if self.state == SimulationState::Paused {
            self.state = SimulationState::Running;
            debug!("Simulation resumed.");
        }
    }

    /// Stops the simulation and drops all bodies, joints and contacts.
    pub fn stop(&mut self) {
        if self.state != SimulationState::Stopped {
            self.host.deregister_tick();
        }
        self.state = SimulationState::Stopped;
        self.clear_data();
        info!("Simulation stopped.");
    }

    pub fn clear_data(&mut self) {
        self.bodies.clear();
        self.body_order.clear();
        self.joints.clear();
        self.joint_order.clear();
        self.last_contacts.clear();
        self.step_count = 0;
    }

    /// Entry point for the host frame loop. Runs one step while the
    /// simulation is running and does nothing otherwise.
    ///
    /// The fixed time step is used when it is positive, `frame_delta`
    /// otherwise.
    pub fn tick(&mut self, frame_delta: f64, store: &mut dyn ElementStore) -> Option<StepReport> {
        if self.state != SimulationState::Running {
            return None;
        }
        let dt = if self.config.time_step > 0.0 {
            self.config.time_step
        } else {
            frame_delta
        };
        let report = self.step(dt, store);
        self.host.request_redraw();
        Some(report)
    }

    /// Runs one full simulation step regardless of the lifecycle state.
    pub fn step(&mut self, dt: f64, store: &mut dyn ElementStore) -> StepReport {
        let broken_joints = self.apply_joint_forces();
        self.resolve_collisions();

        for &id in &self.body_order {
            if let Some(body) = self.bodies.get_mut(id) {
                body.update_position(dt, store);
            }
        }

        let total_force: f64 = self
            .bodies()
            .map(|(_, body)| body.rigid().current_force().norm())
            .sum();

        for body in self.bodies.values_mut() {
            body.rigid_mut().clear_force_and_torque();
        }

        self.step_count += 1;
        let report = StepReport {
            step: self.step_count,
            dt,
            total_force,
            contacts: self.last_contacts.len(),
            broken_joints,
        };
        debug!(
            step = report.step,
            total_force = report.total_force,
            contacts = report.contacts,
            "Step completed."
        );
        for listener in &mut self.listeners {
            (*listener)(&report);
        }
        report
    }

    fn apply_joint_forces(&mut self) -> usize {
        let mut broken = 0;
        for &id in &self.joint_order {
            let Some(joint) = self.joints.get_mut(id) else {
                continue;
            };
            match joint.apply_forces(&mut self.bodies) {
                JointUpdate::Broke => {
                    info!("Joint {:?} broke.", id);
                    broken += 1;
                }
                JointUpdate::Detached => {
                    warn!("Joint {:?} refers to a body that is no longer registered; skipping.", id);
                }
                JointUpdate::Applied | JointUpdate::Inactive => {}
            }
        }
        broken
    }

    fn resolve_collisions(&mut self) {
        self.last_contacts.clear();
        for &source in &self.body_order {
            let Some(source_body) = self.bodies.get(source) else {
                continue;
            };
            for &colliding in &self.body_order {
                if source == colliding {
                    continue;
                }
                let Some(colliding_body) = self.bodies.get(colliding) else {
                    continue;
                };
                if let Some(contact) = CollisionContact::detect(
                    source,
                    source_body.rigid(),
                    colliding,
                    colliding_body.rigid(),
                ) {
                    trace!(?source, ?colliding, depth = contact.depth(), "Contact detected.");
                    self.last_contacts.push(contact);
                }
            }
        }

        let multiplier = self.config.collision_resolution_multiplier;
        for contact in &self.last_contacts {
            if let Some(body) = self.bodies.get_mut(contact.source) {
                let force = contact.normal() * (contact.depth() * multiplier);
                body.rigid_mut()
                    .add_force_at_position(&force, &contact.source_point);
            }
        }
    }

    /// Pushes every body away from the mass-weighted centroid of the system
    /// with an impulse of magnitude `strength`. Bodies sitting exactly on the
    /// centroid are left alone.
    pub fn apply_explosion_at_center_of_mass(&mut self, strength: f64) {
        let total_mass: f64 = self.bodies.values().map(|body| body.rigid().mass()).sum();
        if total_mass <= 0.0 {
            return;
        }
        let weighted: Vector3<f64> = self
            .bodies
            .values()
            .map(|body| body.rigid().position().coords * body.rigid().mass())
            .sum();
        let center = Point3::from(weighted / total_mass);

        for body in self.bodies.values_mut() {
            let rigid = body.rigid_mut();
            if let Some(direction) = Unit::try_new(rigid.position() - center, 1e-12) {
                rigid.add_impulse(&(direction.into_inner() * strength));
            }
        }
        info!("Applied explosion of strength {} at {:?}.", strength, center);
    }
}

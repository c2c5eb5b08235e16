use super::body::{RigidBody, StepMotion};
use super::cluster::StructureCluster;
use super::ids::BodyId;
use super::store::ElementStore;
use slotmap::SlotMap;

/// Arena of every body taking part in a simulation, addressed by stable
/// handles.
pub type BodySet = SlotMap<BodyId, Body>;

/// A simulated body: either a free rigid body or a structure cluster that
/// drags its member elements along.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Rigid(RigidBody),
    Cluster(StructureCluster),
}

impl Body {
    pub fn rigid(&self) -> &RigidBody {
        match self {
            Body::Rigid(body) => body,
            Body::Cluster(cluster) => cluster.body(),
        }
    }

    pub fn rigid_mut(&mut self) -> &mut RigidBody {
        match self {
            Body::Rigid(body) => body,
            Body::Cluster(cluster) => cluster.body_mut(),
        }
    }

    pub fn as_cluster(&self) -> Option<&StructureCluster> {
        match self {
            Body::Cluster(cluster) => Some(cluster),
            Body::Rigid(_) => None,
        }
    }

    /// Integrates the body; clusters also move their elements in `store`.
    pub fn update_position(&mut self, dt: f64, store: &mut dyn ElementStore) -> StepMotion {
        match self {
            Body::Rigid(body) => body.update_position(dt),
            Body::Cluster(cluster) => cluster.update_position(dt, store),
        }
    }
}

impl From<RigidBody> for Body {
    fn from(body: RigidBody) -> Self {
        Body::Rigid(body)
    }
}

impl From<StructureCluster> for Body {
    fn from(cluster: StructureCluster) -> Self {
        Body::Cluster(cluster)
    }
}

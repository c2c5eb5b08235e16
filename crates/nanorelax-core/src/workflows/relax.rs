use crate::core::dynamics::bodies::{Body, BodySet};
use crate::core::dynamics::cluster::StructureCluster;
use crate::core::dynamics::ids::BodyId;
use crate::core::dynamics::joint::Joint;
use crate::core::models::ids::ComponentId;
use crate::core::models::structure::Structure;
use crate::core::selection::Filter;
use crate::engine::clustering::{
    compute_intercluster_joints, create_dbscan_clusters, create_filter_clusters,
    prepare_components,
};
use crate::engine::config::{ClusteringConfig, RelaxConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulator::Simulator;
use nalgebra::Point3;
use tracing::{debug, info, instrument};

/// Rigid clusters of a structure, ready to be handed to a [`Simulator`].
pub struct Partition {
    pub bodies: BodySet,
    /// Cluster handles in clustering order.
    pub clusters: Vec<BodyId>,
    pub joints: Vec<Joint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub monomers: usize,
    pub center: Point3<f64>,
    pub radius: f64,
}

#[derive(Debug, Clone)]
pub struct RelaxResult {
    pub steps: u64,
    pub converged: bool,
    pub final_total_force: f64,
    pub clusters: Vec<ClusterSummary>,
    pub joints: usize,
    pub broken_joints: usize,
    /// Total system force after each step.
    pub force_history: Vec<f64>,
}

impl Partition {
    pub fn summaries(&self) -> Vec<ClusterSummary> {
        summarize(self.clusters.iter().filter_map(|&id| self.bodies.get(id)))
    }
}

fn summarize<'b>(bodies: impl Iterator<Item = &'b Body>) -> Vec<ClusterSummary> {
    bodies
        .filter_map(Body::as_cluster)
        .map(|cluster| ClusterSummary {
            monomers: cluster.elements().len(),
            center: *cluster.body().position(),
            radius: cluster.radius(),
        })
        .collect()
}

/// Bakes component transforms, clusters the structure and synthesizes the
/// backbone joints between clusters.
///
/// # Errors
///
/// Returns [`EngineError::Filter`] for an unparsable filter and
/// [`EngineError::NoClusters`] when clustering yields nothing to simulate.
#[instrument(skip_all, name = "partition_workflow")]
pub fn partition(
    structure: &mut Structure,
    config: &RelaxConfig,
    reporter: &ProgressReporter,
) -> Result<Partition, EngineError> {
    // === Phase 1: Preparation ===
    reporter.report(Progress::PhaseStart {
        name: "Preparation",
    });
    let components = structure.component_ids();
    let baked = prepare_components(structure, &components);
    info!(
        "Prepared {} of {} component(s) for clustering.",
        baked,
        components.len()
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Clustering ===
    reporter.report(Progress::PhaseStart { name: "Clustering" });
    let clusters = build_clusters(structure, &components, &config.clustering)?;
    if clusters.is_empty() {
        return Err(EngineError::NoClusters);
    }
    info!("Built {} cluster(s).", clusters.len());
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Joints ===
    reporter.report(Progress::PhaseStart { name: "Joints" });
    let mut bodies = BodySet::with_key();
    let mut cluster_ids = Vec::with_capacity(clusters.len());
    for mut cluster in clusters {
        cluster.body_mut().set_friction(config.simulator.friction)?;
        cluster_ids.push(bodies.insert(Body::Cluster(cluster)));
    }

    let pairs: Vec<(BodyId, &StructureCluster)> = cluster_ids
        .iter()
        .filter_map(|&id| bodies.get(id)?.as_cluster().map(|cluster| (id, cluster)))
        .collect();
    let joints: Vec<Joint> = compute_intercluster_joints(
        &pairs,
        &*structure,
        config.joints.target_bond_length,
        config.joints.spring_constant,
    )
    .into_iter()
    .map(|joint| match config.joints.break_force {
        Some(force) => joint.with_break_force(force),
        None => joint,
    })
    .collect();
    info!("Created {} inter-cluster joint(s).", joints.len());
    reporter.report(Progress::PhaseFinish);

    Ok(Partition {
        bodies,
        clusters: cluster_ids,
        joints,
    })
}

fn build_clusters(
    structure: &Structure,
    components: &[ComponentId],
    clustering: &ClusteringConfig,
) -> Result<Vec<StructureCluster>, EngineError> {
    match clustering {
        ClusteringConfig::Filters { filters } => {
            let parsed = filters
                .iter()
                .map(|expression| {
                    Filter::parse(expression).map_err(|source| EngineError::Filter {
                        filter: expression.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            create_filter_clusters(structure, components, &parsed)
        }
        ClusteringConfig::Dbscan {
            neighbour_radius,
            min_points,
        } => create_dbscan_clusters(structure, components, *neighbour_radius, *min_points),
    }
}

/// Relaxes `structure` in place with rigid-body dynamics.
///
/// The structure is partitioned into clusters (see [`partition`]), which are
/// then simulated until `max_steps` is reached or the total system force
/// stays below the convergence threshold for the configured number of
/// consecutive steps.
#[instrument(skip_all, name = "relax_workflow")]
pub fn run(
    structure: &mut Structure,
    config: &RelaxConfig,
    reporter: &ProgressReporter,
) -> Result<RelaxResult, EngineError> {
    let Partition { bodies, joints, .. } = partition(structure, config, reporter)?;

    // === Phase 4: Simulation ===
    reporter.report(Progress::PhaseStart { name: "Simulation" });
    let mut simulator = Simulator::new(config.simulator);
    simulator.replace_bodies(bodies);
    simulator.replace_joints(joints);
    if let Some(strength) = config.explosion_strength {
        simulator.apply_explosion_at_center_of_mass(strength);
    }
    simulator.start(None, None);

    reporter.report(Progress::TaskStart {
        total_steps: config.max_steps as u64,
    });
    let mut force_history = Vec::with_capacity(config.max_steps);
    let mut calm_steps = 0;
    let mut converged = false;
    for _ in 0..config.max_steps {
        let Some(report) = simulator.tick(config.frame_delta, structure) else {
            break;
        };
        force_history.push(report.total_force);
        reporter.report(Progress::StepCompleted {
            step: report.step,
            total_force: report.total_force,
        });
        if report.broken_joints > 0 {
            reporter.report(Progress::Message(format!(
                "{} joint(s) broke at step {}",
                report.broken_joints, report.step
            )));
        }

        if let Some(convergence) = &config.convergence {
            if report.total_force < convergence.force_threshold {
                calm_steps += 1;
                if calm_steps >= convergence.patience {
                    converged = true;
                    info!(
                        "Converged after {} steps (total force {:.3e}).",
                        report.step, report.total_force
                    );
                    reporter.report(Progress::Message(format!(
                        "converged at step {}",
                        report.step
                    )));
                    break;
                }
            } else {
                calm_steps = 0;
            }
        }
    }
    reporter.report(Progress::TaskFinish);

    let result = RelaxResult {
        steps: simulator.step_count(),
        converged,
        final_total_force: force_history.last().copied().unwrap_or(0.0),
        clusters: summarize(simulator.bodies().map(|(_, body)| body)),
        joints: simulator.joint_count(),
        broken_joints: simulator.broken_joint_count(),
        force_history,
    };
    simulator.stop();

    let refreshed = structure.drain_refresh_requests();
    debug!("{} component(s) were moved.", refreshed.len());
    reporter.report(Progress::PhaseFinish);

    info!(
        "Relaxation finished after {} step(s); {} of {} joint(s) broke.",
        result.steps, result.broken_joints, result.joints
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::strand::StrandKind;
    use crate::engine::config::{ConvergenceConfig, RelaxConfigBuilder, SimulatorConfig};

    fn two_strand_structure(offset: f64) -> Structure {
        let mut structure = Structure::new();
        let component = structure.add_component("c");
        for (strand_name, start) in [("s1", 0.0), ("s2", offset)] {
            let strand = structure
                .add_strand(component, strand_name, StrandKind::Dna, false)
                .unwrap();
            for i in 0..2 {
                structure
                    .add_monomer(strand, "T", Point3::new(start + i as f64, 0.0, 0.0))
                    .unwrap();
            }
        }
        structure
    }

    fn filter_config(max_steps: usize) -> RelaxConfigBuilder {
        RelaxConfigBuilder::new()
            .clustering(ClusteringConfig::Filters {
                filters: vec!["strand s1".to_string(), "strand s2".to_string()],
            })
            .max_steps(max_steps)
            .simulator(SimulatorConfig {
                time_step: 0.1,
                ..SimulatorConfig::default()
            })
    }

    fn strand_center(structure: &Structure, strand_name: &str) -> Point3<f64> {
        let (_, strand) = structure
            .strands_iter()
            .find(|(_, s)| s.name == strand_name)
            .unwrap();
        let sum = strand
            .monomers()
            .iter()
            .map(|&id| structure.monomer(id).unwrap().position.coords)
            .sum::<nalgebra::Vector3<f64>>();
        Point3::from(sum / strand.len() as f64)
    }

    #[test]
    fn overlapping_clusters_are_pushed_apart() {
        let mut structure = two_strand_structure(0.5);
        let config = filter_config(20).build().unwrap();
        let before = (strand_center(&structure, "s2") - strand_center(&structure, "s1")).norm();

        let result = run(&mut structure, &config, &ProgressReporter::new()).unwrap();

        let after = (strand_center(&structure, "s2") - strand_center(&structure, "s1")).norm();
        assert!(after > before);
        assert_eq!(result.steps, 20);
        assert_eq!(result.force_history.len(), 20);
        assert_eq!(result.clusters.len(), 2);
        assert_eq!(result.joints, 0);
        assert!(!result.converged);
        assert!(structure.drain_refresh_requests().is_empty());
    }

    #[test]
    fn separated_clusters_converge_immediately() {
        let mut structure = two_strand_structure(100.0);
        let config = filter_config(50)
            .convergence(ConvergenceConfig {
                force_threshold: 1e-6,
                patience: 3,
            })
            .build()
            .unwrap();

        let result = run(&mut structure, &config, &ProgressReporter::new()).unwrap();

        assert!(result.converged);
        assert_eq!(result.steps, 3);
        assert_eq!(result.final_total_force, 0.0);
    }

    #[test]
    fn convergence_is_announced_through_the_reporter() {
        let mut structure = two_strand_structure(100.0);
        let config = filter_config(50)
            .convergence(ConvergenceConfig {
                force_threshold: 1e-6,
                patience: 2,
            })
            .build()
            .unwrap();
        let messages = std::sync::Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::Message(text) = event {
                messages.lock().unwrap().push(text);
            }
        }));

        let result = run(&mut structure, &config, &reporter).unwrap();
        drop(reporter);

        assert!(result.converged);
        assert_eq!(
            messages.into_inner().unwrap(),
            vec!["converged at step 2".to_string()]
        );
    }

    #[test]
    fn partition_reports_clusters_and_joints() {
        let mut structure = Structure::new();
        let component = structure.add_component("c");
        let strand = structure
            .add_strand(component, "s", StrandKind::Dna, false)
            .unwrap();
        for i in 0..4 {
            structure
                .add_monomer(strand, "T", Point3::new(3.32 * i as f64, 0.0, 0.0))
                .unwrap();
        }
        let config = RelaxConfigBuilder::new()
            .clustering(ClusteringConfig::Filters {
                filters: vec!["index 0-1".to_string(), "index 2-3".to_string()],
            })
            .max_steps(1)
            .build()
            .unwrap();

        let partition = partition(&mut structure, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(partition.clusters.len(), 2);
        assert_eq!(partition.joints.len(), 1);
        let summaries = partition.summaries();
        assert_eq!(summaries[0].monomers, 2);
        assert!((summaries[0].radius - 1.66).abs() < 1e-9);
    }

    #[test]
    fn empty_clustering_is_an_error() {
        let mut structure = two_strand_structure(0.0);
        let config = RelaxConfigBuilder::new()
            .clustering(ClusteringConfig::Filters {
                filters: vec!["kind protein".to_string()],
            })
            .max_steps(1)
            .build()
            .unwrap();
        assert!(matches!(
            run(&mut structure, &config, &ProgressReporter::new()),
            Err(EngineError::NoClusters)
        ));
    }

    #[test]
    fn invalid_filter_is_reported_with_its_text() {
        let mut structure = two_strand_structure(0.0);
        let config = RelaxConfigBuilder::new()
            .clustering(ClusteringConfig::Filters {
                filters: vec!["kind lipid".to_string()],
            })
            .max_steps(1)
            .build()
            .unwrap();
        let error = run(&mut structure, &config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(error, EngineError::Filter { ref filter, .. } if filter == "kind lipid"));
    }

    #[test]
    fn component_transforms_are_baked_before_clustering() {
        let mut structure = two_strand_structure(100.0);
        let component = structure.component_ids()[0];
        structure.component_mut(component).unwrap().transform =
            nalgebra::Isometry3::translation(0.0, 0.0, 7.0);
        let config = filter_config(1).build().unwrap();

        let result = run(&mut structure, &config, &ProgressReporter::new()).unwrap();

        assert!((result.clusters[0].center.z - 7.0).abs() < 1e-9);
        assert_eq!(
            structure.component(component).unwrap().transform,
            nalgebra::Isometry3::identity()
        );
    }
}

use crate::cli::RelaxArgs;
use crate::config::{Overrides, PartialRelaxConfig};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use nanorelax::{
    core::io::{
        telemetry::write_step_csv_to_path, toml_structure::TomlStructureFile,
        traits::StructureFile,
    },
    engine::progress::ProgressReporter,
    workflows,
};
use tracing::{info, warn};

pub fn run(args: RelaxArgs) -> Result<()> {
    let partial_config = PartialRelaxConfig::load(args.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let final_config = partial_config.merge_with_cli(&Overrides {
        max_steps: args.steps,
        time_step: args.time_step,
        explosion_strength: args.explode,
        filters: &args.filters,
        set_values: &args.set_values,
    })?;

    info!("Loading input structure from {:?}", &args.input);
    let mut structure =
        TomlStructureFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;
    info!(
        "Loaded {} monomer(s) in {} component(s).",
        structure.monomer_count(),
        structure.component_ids().len()
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting relaxation...");
    info!("Invoking the core relaxation workflow...");
    let result = workflows::relax::run(&mut structure, &final_config, &reporter)?;

    if result.converged {
        println!(
            "Converged after {} step(s) (total force {:.4e}).",
            result.steps, result.final_total_force
        );
    } else {
        warn!(
            "Stopped after {} step(s) without converging.",
            result.steps
        );
        println!(
            "Finished {} step(s) (total force {:.4e}).",
            result.steps, result.final_total_force
        );
    }
    println!(
        "  {} cluster(s), {} joint(s), {} broken.",
        result.clusters.len(),
        result.joints,
        result.broken_joints
    );

    TomlStructureFile::write_to_path(&structure, &args.output).map_err(|e| {
        CliError::FileWriting {
            path: args.output.clone(),
            source: e.into(),
        }
    })?;
    println!("✓ Relaxed structure written to: {}", args.output.display());

    if let Some(path) = &args.telemetry {
        info!("Writing per-step telemetry to {:?}", path);
        write_step_csv_to_path(path, &result.force_history).map_err(|e| {
            CliError::FileWriting {
                path: path.clone(),
                source: e.into(),
            }
        })?;
        println!("✓ Telemetry written to: {}", path.display());
    }

    Ok(())
}

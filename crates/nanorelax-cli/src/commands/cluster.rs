use crate::cli::ClusterArgs;
use crate::config::{Overrides, PartialRelaxConfig};
use crate::error::{CliError, Result};
use nanorelax::{
    core::io::{toml_structure::TomlStructureFile, traits::StructureFile},
    engine::progress::ProgressReporter,
    workflows,
};
use tracing::info;

pub fn run(args: ClusterArgs) -> Result<()> {
    let partial_config = PartialRelaxConfig::load(args.config.as_deref())?;
    let final_config = partial_config.merge_with_cli(&Overrides {
        filters: &args.filters,
        set_values: &args.set_values,
        ..Overrides::default()
    })?;

    info!("Loading input structure from {:?}", &args.input);
    let mut structure =
        TomlStructureFile::read_from_path(&args.input).map_err(|e| CliError::FileParsing {
            path: args.input.clone(),
            source: e.into(),
        })?;

    let partition =
        workflows::relax::partition(&mut structure, &final_config, &ProgressReporter::new())?;
    let summaries = partition.summaries();

    println!(
        "{} cluster(s), {} inter-cluster joint(s):",
        summaries.len(),
        partition.joints.len()
    );
    for (i, summary) in summaries.iter().enumerate() {
        println!(
            "  #{:<3} {:>6} monomer(s)  radius {:>8.3}  center ({:.3}, {:.3}, {:.3})",
            i + 1,
            summary.monomers,
            summary.radius,
            summary.center.x,
            summary.center.y,
            summary.center.z
        );
    }

    Ok(())
}

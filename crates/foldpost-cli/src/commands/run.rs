use super::annotate::read_annotation;
use crate::cli::RunArgs;
use crate::config::PartialAnalysisConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use foldpost::engine::progress::ProgressReporter;
use foldpost::engine::registry::PoseGroup;
use foldpost::workflows::Analyser;
use foldpost::workflows::refine::ENERGY_COLUMN;
use tracing::{info, warn};

/// Rejects flag combinations that clap accepts but the run cannot honour.
fn validate_args(args: &RunArgs) -> Result<()> {
    if args.output == args.folder {
        return Err(CliError::Argument(format!(
            "--output must differ from --folder ({}); dumped structures would mix with the models",
            args.folder.display()
        )));
    }
    if args.modifications.is_none() {
        let stray: Vec<&str> = [
            ("--chain", args.chain.is_some()),
            ("--min", args.min.is_some()),
            ("--max", args.max.is_some()),
        ]
        .into_iter()
        .filter_map(|(flag, given)| given.then_some(flag))
        .collect();
        if !stray.is_empty() {
            return Err(CliError::Argument(format!(
                "{} only apply together with --modifications",
                stray.join(", ")
            )));
        }
    }
    Ok(())
}

pub fn run(args: RunArgs) -> Result<()> {
    validate_args(&args)?;

    info!("Merging configuration from file and CLI arguments...");
    let config = PartialAnalysisConfig::from_args(&args)?.merge_with_cli(&args)?;

    // Parse the annotation before any refinement so a bad file fails fast.
    let annotation = match &args.modifications {
        Some(path) => Some(read_annotation(
            path,
            config.modification.minimum,
            config.modification.maximum,
        )?),
        None => None,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Loading models from {}...", args.folder.display());
    let mut analyser = Analyser::new(&args.folder, true, config.clone())?;
    if analyser.catalog().is_empty() {
        warn!("No ranked models found in {:?}.", &args.folder);
        println!("Warning: no ranked models found; nothing to do.");
        return Ok(());
    }
    info!("Loaded {} model(s).", analyser.catalog().len());

    println!("Relaxing {} model(s)...", analyser.catalog().len());
    analyser.constrain_and_relax(config.relax.cycles, &reporter)?;

    if args.no_interface {
        info!("Interface analysis disabled by flag.");
    } else {
        analyser.calculate_interface(&reporter)?;
    }

    if let Some(annotation) = annotation {
        if annotation.is_empty() {
            warn!("The annotation has no sites to apply; skipping modification.");
        } else {
            let modified = analyser.make_modified(
                &annotation,
                config.modification.chain,
                config.modification.cycles,
                &reporter,
            )?;
            let total: usize = modified.values().map(Vec::len).sum();
            info!("Modified {} residue(s) across {} model(s).", total, modified.len());
        }
    }

    analyser.dump(&args.output)?;

    let catalog = analyser.catalog();
    if let Some(best) = catalog
        .ranks()
        .into_iter()
        .filter_map(|rank| catalog.float(ENERGY_COLUMN, rank).map(|e| (rank, e)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
    {
        println!("✓ Lowest relaxed energy: rank {} ({:.4})", best.0, best.1);
    }
    println!(
        "✓ Results for groups [{}] written to: {}",
        analyser
            .registry()
            .loaded_groups()
            .iter()
            .map(PoseGroup::name)
            .collect::<Vec<_>>()
            .join(", "),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn run_args(argv: &[&str]) -> RunArgs {
        let argv = ["foldpost", "run"].into_iter().chain(argv.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("expected the run command, got {other:?}"),
        }
    }

    #[test]
    fn distinct_folders_pass_validation() {
        let args = run_args(&["--folder", "in", "--output", "out"]);
        assert!(validate_args(&args).is_ok());
        let args = run_args(&[
            "--folder", "in", "--output", "out", "--modifications", "sites.txt", "--chain", "B",
            "--min", "5",
        ]);
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn output_equal_to_folder_is_rejected() {
        let args = run_args(&["--folder", "in", "--output", "in"]);
        assert!(matches!(validate_args(&args), Err(CliError::Argument(_))));
    }

    #[test]
    fn window_flags_without_modifications_are_rejected() {
        let args = run_args(&["--folder", "in", "--output", "out", "--chain", "B", "--max", "9"]);
        let Err(CliError::Argument(message)) = validate_args(&args) else {
            panic!("expected an argument error");
        };
        assert!(message.starts_with("--chain, --max"));
    }

    #[test]
    fn run_fails_before_touching_the_folder() {
        let args = run_args(&["--folder", "missing", "--output", "missing"]);
        assert!(matches!(run(args), Err(CliError::Argument(_))));
    }
}

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use foldpost::engine::config::{AnalysisConfig, AnalysisConfigBuilder};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialRelaxConfig {
    sidechain_cycles: Option<usize>,
    cycles: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialConstraintConfig {
    error_cutoff: Option<f64>,
    tolerance: Option<f64>,
    weight: Option<f64>,
    adjacency_threshold: Option<usize>,
    interchain_cutoff: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialInterfaceConfig {
    descriptor: Option<String>,
    contact_threshold: Option<f64>,
    chains: Option<(usize, usize)>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PartialModificationConfig {
    chain: Option<char>,
    cycles: Option<usize>,
    neighbourhood_radius: Option<f64>,
    min: Option<isize>,
    max: Option<isize>,
}

/// Analysis settings as read from a TOML file; every field is optional.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PartialAnalysisConfig {
    relax: Option<PartialRelaxConfig>,
    constraints: Option<PartialConstraintConfig>,
    interface: Option<PartialInterfaceConfig>,
    modification: Option<PartialModificationConfig>,
}

fn set<T>(
    builder: AnalysisConfigBuilder,
    value: Option<T>,
    setter: fn(AnalysisConfigBuilder, T) -> AnalysisConfigBuilder,
) -> AnalysisConfigBuilder {
    match value {
        Some(value) => setter(builder, value),
        None => builder,
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<Option<T>> {
    value
        .parse()
        .map(Some)
        .map_err(|_| CliError::Config(format!("Invalid value for {key}: {value}")))
}

impl PartialAnalysisConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Loads `args.config` if given, otherwise starts from an empty file config.
    pub fn from_args(args: &RunArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Applies `-S` overrides to the file values, then lets explicit flags win
    /// and fills everything else with the library defaults.
    pub fn merge_with_cli(mut self, args: &RunArgs) -> Result<AnalysisConfig> {
        self.apply_set_values(&args.set_values)?;

        let relax = self.relax.take().unwrap_or_default();
        let constraints = self.constraints.take().unwrap_or_default();
        let interface = self.interface.take().unwrap_or_default();
        let modification = self.modification.take().unwrap_or_default();

        let mut builder = AnalysisConfig::builder();
        builder = set(
            builder,
            args.sidechain_cycles.or(relax.sidechain_cycles),
            AnalysisConfigBuilder::sidechain_cycles,
        );
        builder = set(builder, args.cycles.or(relax.cycles), AnalysisConfigBuilder::cycles);

        builder = set(builder, constraints.error_cutoff, AnalysisConfigBuilder::error_cutoff);
        builder = set(builder, constraints.tolerance, AnalysisConfigBuilder::tolerance);
        builder = set(builder, constraints.weight, AnalysisConfigBuilder::constraint_weight);
        builder = set(
            builder,
            constraints.adjacency_threshold,
            AnalysisConfigBuilder::adjacency_threshold,
        );
        builder = set(
            builder,
            constraints.interchain_cutoff,
            AnalysisConfigBuilder::interchain_cutoff,
        );

        builder = set(
            builder,
            args.interface.clone().or(interface.descriptor),
            |b, descriptor: String| b.interface(descriptor),
        );
        builder = set(
            builder,
            interface.contact_threshold,
            AnalysisConfigBuilder::contact_threshold,
        );
        builder = set(builder, interface.chains, |b, (first, second)| {
            b.interface_chains(first, second)
        });

        builder = set(
            builder,
            args.chain.or(modification.chain),
            AnalysisConfigBuilder::modification_chain,
        );
        builder = set(
            builder,
            modification.cycles,
            AnalysisConfigBuilder::modification_cycles,
        );
        builder = set(
            builder,
            modification.neighbourhood_radius,
            AnalysisConfigBuilder::neighbourhood_radius,
        );
        builder = set(builder, args.min.or(modification.min), AnalysisConfigBuilder::minimum);
        builder = set(builder, args.max.or(modification.max), AnalysisConfigBuilder::maximum);

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{kv_pair}'. Expected KEY=VALUE."
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "relax.sidechain-cycles" => {
                    self.relax.get_or_insert_with(Default::default).sidechain_cycles = parse_value(key, value)?;
                }
                "relax.cycles" => {
                    self.relax.get_or_insert_with(Default::default).cycles = parse_value(key, value)?;
                }
                "constraints.error-cutoff" => {
                    self.constraints.get_or_insert_with(Default::default).error_cutoff =
                        parse_value(key, value)?;
                }
                "constraints.tolerance" => {
                    self.constraints.get_or_insert_with(Default::default).tolerance =
                        parse_value(key, value)?;
                }
                "constraints.weight" => {
                    self.constraints.get_or_insert_with(Default::default).weight =
                        parse_value(key, value)?;
                }
                "constraints.adjacency-threshold" => {
                    self.constraints.get_or_insert_with(Default::default).adjacency_threshold =
                        parse_value(key, value)?;
                }
                "constraints.interchain-cutoff" => {
                    self.constraints.get_or_insert_with(Default::default).interchain_cutoff =
                        parse_value(key, value)?;
                }
                "interface.descriptor" => {
                    self.interface.get_or_insert_with(Default::default).descriptor =
                        Some(value.to_string());
                }
                "interface.contact-threshold" => {
                    self.interface.get_or_insert_with(Default::default).contact_threshold =
                        parse_value(key, value)?;
                }
                "modification.chain" => {
                    self.modification.get_or_insert_with(Default::default).chain =
                        parse_value(key, value)?;
                }
                "modification.cycles" => {
                    self.modification.get_or_insert_with(Default::default).cycles =
                        parse_value(key, value)?;
                }
                "modification.neighbourhood-radius" => {
                    self.modification
                        .get_or_insert_with(Default::default)
                        .neighbourhood_radius = parse_value(key, value)?;
                }
                "modification.min" => {
                    self.modification.get_or_insert_with(Default::default).min =
                        parse_value(key, value)?;
                }
                "modification.max" => {
                    self.modification.get_or_insert_with(Default::default).max =
                        parse_value(key, value)?;
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown or unsupported key for --set: '{key}'"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::io::Write;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["foldpost", "run", "--folder", "in", "--output", "out"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Run(args) => args,
            other => panic!("expected the run command, got {other:?}"),
        }
    }

    const FILE: &str = r#"
[relax]
sidechain-cycles = 2
cycles = 4

[constraints]
error-cutoff = 10.0
tolerance = 0.5

[interface]
descriptor = "AB_C"
chains = [1, 3]

[modification]
chain = "B"
neighbourhood-radius = 9.0
"#;

    #[test]
    fn empty_config_yields_defaults() {
        let config = PartialAnalysisConfig::default()
            .merge_with_cli(&run_args(&[]))
            .unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn file_values_are_used() {
        let config = PartialAnalysisConfig::from_toml(FILE)
            .unwrap()
            .merge_with_cli(&run_args(&[]))
            .unwrap();
        assert_eq!(config.relax.sidechain_cycles, 2);
        assert_eq!(config.relax.cycles, 4);
        assert_eq!(config.constraints.error_cutoff, 10.0);
        assert_eq!(config.constraints.tolerance, Some(0.5));
        assert_eq!(config.interface.descriptor.to_string(), "AB_C");
        assert_eq!(config.interface.chains, (1, 3));
        assert_eq!(config.modification.chain, 'B');
        assert_eq!(config.modification.neighbourhood_radius, 9.0);
        assert_eq!(config.modification.cycles, 3);
    }

    #[test]
    fn flags_win_over_file_and_set_values() {
        let config = PartialAnalysisConfig::from_toml(FILE)
            .unwrap()
            .merge_with_cli(&run_args(&[
                "--cycles",
                "9",
                "--interface",
                "A_B",
                "-S",
                "relax.cycles=1",
                "constraints.error-cutoff=8",
            ]))
            .unwrap();
        assert_eq!(config.relax.cycles, 9);
        assert_eq!(config.interface.descriptor.to_string(), "A_B");
        assert_eq!(config.constraints.error_cutoff, 8.0);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(PartialAnalysisConfig::from_toml("[relax]\nspeed = 3\n").is_err());
        let err = PartialAnalysisConfig::default()
            .merge_with_cli(&run_args(&["-S", "relax.speed=3"]))
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["relax.cycles", "relax.cycles=many"] {
            let err = PartialAnalysisConfig::default()
                .merge_with_cli(&run_args(&["-S", bad]))
                .unwrap_err();
            assert!(matches!(err, CliError::Config(_)), "{bad}");
        }
    }

    #[test]
    fn invalid_values_fail_validation() {
        let err = PartialAnalysisConfig::default()
            .merge_with_cli(&run_args(&["--interface", "AB"]))
            .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn unparsable_file_reports_its_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[relax\ncycles = 1").unwrap();
        let err = PartialAnalysisConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }
}

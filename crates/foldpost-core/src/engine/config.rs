use super::traits::InterfaceDescriptor;
use crate::core::scoring::constraints::ConstraintOptions;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidValue {
        parameter: &'static str,
        reason: String,
    },

    #[error("Invalid interface descriptor '{0}': expected two chain groups joined by '_' (e.g. 'A_B')")]
    InvalidDescriptor(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxConfig {
    /// Cycles of the side-chain-only pass.
    pub sidechain_cycles: usize,
    /// Cycles of the constrained full pass.
    pub cycles: usize,
}

impl Default for RelaxConfig {
    fn default() -> Self {
        Self {
            sidechain_cycles: 5,
            cycles: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintConfig {
    pub error_cutoff: f64,
    pub tolerance: Option<f64>,
    pub weight: f64,
    pub adjacency_threshold: usize,
    pub interchain_cutoff: f64,
}

impl Default for ConstraintConfig {
    fn default() -> Self {
        let options = ConstraintOptions::default();
        Self {
            error_cutoff: options.cutoff,
            tolerance: options.tolerance,
            weight: options.weight,
            adjacency_threshold: options.adjacency_threshold,
            interchain_cutoff: 15.0,
        }
    }
}

impl ConstraintConfig {
    pub fn options(&self) -> ConstraintOptions {
        ConstraintOptions {
            cutoff: self.error_cutoff,
            tolerance: self.tolerance,
            weight: self.weight,
            adjacency_threshold: self.adjacency_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceConfig {
    pub descriptor: InterfaceDescriptor,
    /// Heavy-atom distance below which residues of two chains are in contact.
    pub contact_threshold: f64,
    /// The two 1-based chain numbers whose interface residues are recorded.
    pub chains: (usize, usize),
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            descriptor: InterfaceDescriptor::new(vec!['A'], vec!['B']),
            contact_threshold: 3.0,
            chains: (1, 2),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModificationConfig {
    /// Chain the annotation's source numbering refers to.
    pub chain: char,
    pub cycles: usize,
    pub neighbourhood_radius: f64,
    pub minimum: isize,
    /// Upper residue bound; values below 1 mean unbounded.
    pub maximum: isize,
}

impl Default for ModificationConfig {
    fn default() -> Self {
        Self {
            chain: 'A',
            cycles: 3,
            neighbourhood_radius: 7.0,
            minimum: 1,
            maximum: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisConfig {
    pub relax: RelaxConfig,
    pub constraints: ConstraintConfig,
    pub interface: InterfaceConfig,
    pub modification: ModificationConfig,
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder::new()
    }
}

#[derive(Default)]
pub struct AnalysisConfigBuilder {
    sidechain_cycles: Option<usize>,
    cycles: Option<usize>,
    error_cutoff: Option<f64>,
    tolerance: Option<f64>,
    constraint_weight: Option<f64>,
    adjacency_threshold: Option<usize>,
    interchain_cutoff: Option<f64>,
    interface: Option<String>,
    contact_threshold: Option<f64>,
    interface_chains: Option<(usize, usize)>,
    modification_chain: Option<char>,
    modification_cycles: Option<usize>,
    neighbourhood_radius: Option<f64>,
    minimum: Option<isize>,
    maximum: Option<isize>,
}

fn positive(parameter: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            parameter,
            reason: format!("must be a positive number, got {value}"),
        })
    }
}

impl AnalysisConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sidechain_cycles(mut self, cycles: usize) -> Self {
        self.sidechain_cycles = Some(cycles);
        self
    }
    pub fn cycles(mut self, cycles: usize) -> Self {
        self.cycles = Some(cycles);
        self
    }
    pub fn error_cutoff(mut self, cutoff: f64) -> Self {
        self.error_cutoff = Some(cutoff);
        self
    }
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }
    pub fn constraint_weight(mut self, weight: f64) -> Self {
        self.constraint_weight = Some(weight);
        self
    }
    pub fn adjacency_threshold(mut self, threshold: usize) -> Self {
        self.adjacency_threshold = Some(threshold);
        self
    }
    pub fn interchain_cutoff(mut self, cutoff: f64) -> Self {
        self.interchain_cutoff = Some(cutoff);
        self
    }
    pub fn interface(mut self, descriptor: impl Into<String>) -> Self {
        self.interface = Some(descriptor.into());
        self
    }
    pub fn contact_threshold(mut self, threshold: f64) -> Self {
        self.contact_threshold = Some(threshold);
        self
    }
    pub fn interface_chains(mut self, first: usize, second: usize) -> Self {
        self.interface_chains = Some((first, second));
        self
    }
    pub fn modification_chain(mut self, chain: char) -> Self {
        self.modification_chain = Some(chain);
        self
    }
    pub fn modification_cycles(mut self, cycles: usize) -> Self {
        self.modification_cycles = Some(cycles);
        self
    }
    pub fn neighbourhood_radius(mut self, radius: f64) -> Self {
        self.neighbourhood_radius = Some(radius);
        self
    }
    pub fn minimum(mut self, minimum: isize) -> Self {
        self.minimum = Some(minimum);
        self
    }
    pub fn maximum(mut self, maximum: isize) -> Self {
        self.maximum = Some(maximum);
        self
    }

    /// Fills unset parameters with defaults and validates the result.
    pub fn build(self) -> Result<AnalysisConfig, ConfigError> {
        let defaults = AnalysisConfig::default();

        let relax = RelaxConfig {
            sidechain_cycles: self.sidechain_cycles.unwrap_or(defaults.relax.sidechain_cycles),
            cycles: self.cycles.unwrap_or(defaults.relax.cycles),
        };

        let constraints = ConstraintConfig {
            error_cutoff: positive(
                "error_cutoff",
                self.error_cutoff.unwrap_or(defaults.constraints.error_cutoff),
            )?,
            tolerance: match self.tolerance.or(defaults.constraints.tolerance) {
                Some(t) if t < 0.0 || !t.is_finite() => {
                    return Err(ConfigError::InvalidValue {
                        parameter: "tolerance",
                        reason: format!("must be non-negative, got {t}"),
                    });
                }
                other => other,
            },
            weight: positive(
                "constraint_weight",
                self.constraint_weight.unwrap_or(defaults.constraints.weight),
            )?,
            adjacency_threshold: self
                .adjacency_threshold
                .unwrap_or(defaults.constraints.adjacency_threshold),
            interchain_cutoff: positive(
                "interchain_cutoff",
                self.interchain_cutoff.unwrap_or(defaults.constraints.interchain_cutoff),
            )?,
        };

        let chains = self.interface_chains.unwrap_or(defaults.interface.chains);
        if chains.0 == 0 || chains.1 == 0 || chains.0 == chains.1 {
            return Err(ConfigError::InvalidValue {
                parameter: "interface_chains",
                reason: format!("expected two distinct 1-based chain numbers, got {chains:?}"),
            });
        }
        let interface = InterfaceConfig {
            descriptor: match self.interface {
                Some(text) => text.parse()?,
                None => defaults.interface.descriptor,
            },
            contact_threshold: positive(
                "contact_threshold",
                self.contact_threshold.unwrap_or(defaults.interface.contact_threshold),
            )?,
            chains,
        };

        let modification = ModificationConfig {
            chain: self.modification_chain.unwrap_or(defaults.modification.chain),
            cycles: self.modification_cycles.unwrap_or(defaults.modification.cycles),
            neighbourhood_radius: positive(
                "neighbourhood_radius",
                self.neighbourhood_radius
                    .unwrap_or(defaults.modification.neighbourhood_radius),
            )?,
            minimum: self.minimum.unwrap_or(defaults.modification.minimum),
            maximum: self.maximum.unwrap_or(defaults.modification.maximum),
        };

        Ok(AnalysisConfig {
            relax,
            constraints,
            interface,
            modification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_builder_yields_defaults() {
        let config = AnalysisConfigBuilder::new().build().unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.relax.sidechain_cycles, 5);
        assert_eq!(config.relax.cycles, 3);
        assert_eq!(config.constraints.interchain_cutoff, 15.0);
        assert_eq!(config.interface.contact_threshold, 3.0);
        assert_eq!(config.modification.neighbourhood_radius, 7.0);
    }

    #[test]
    fn builder_overrides_individual_parameters() {
        let config = AnalysisConfig::builder()
            .cycles(1)
            .interface("AB_C")
            .tolerance(1.5)
            .modification_chain('B')
            .build()
            .unwrap();
        assert_eq!(config.relax.cycles, 1);
        assert_eq!(config.relax.sidechain_cycles, 5);
        assert_eq!(config.interface.descriptor.to_string(), "AB_C");
        assert_eq!(config.constraints.options().tolerance, Some(1.5));
        assert_eq!(config.modification.chain, 'B');
    }

    #[test]
    fn builder_rejects_non_positive_radii() {
        let err = AnalysisConfig::builder()
            .neighbourhood_radius(0.0)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                parameter: "neighbourhood_radius",
                ..
            }
        ));
        assert!(AnalysisConfig::builder().error_cutoff(-1.0).build().is_err());
        assert!(AnalysisConfig::builder().tolerance(-0.5).build().is_err());
    }

    #[test]
    fn builder_rejects_malformed_descriptor() {
        let err = AnalysisConfig::builder().interface("ABC").build().unwrap_err();
        assert_eq!(err, ConfigError::InvalidDescriptor("ABC".to_string()));
        assert!(AnalysisConfig::builder().interface("A_B_C").build().is_err());
    }

    #[test]
    fn builder_rejects_identical_interface_chains() {
        assert!(AnalysisConfig::builder().interface_chains(1, 1).build().is_err());
    }
}

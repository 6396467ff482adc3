use crate::core::io::logbook::FlushPolicy;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HarvestConfig {
    /// Directory receiving structure files, ledgers and the logbook.
    pub output_dir: PathBuf,
    /// Start from an empty output directory and reprocess every identifier.
    pub overwrite: bool,
    pub impute_hydrogens: bool,
    pub write_structures: bool,
    pub flush_policy: FlushPolicy,
}

#[derive(Default)]
pub struct HarvestConfigBuilder {
    output_dir: Option<PathBuf>,
    overwrite: Option<bool>,
    impute_hydrogens: Option<bool>,
    write_structures: Option<bool>,
    flush_policy: Option<FlushPolicy>,
}

impl HarvestConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_dir(mut self, path: PathBuf) -> Self {
        self.output_dir = Some(path);
        self
    }
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = Some(overwrite);
        self
    }
    pub fn impute_hydrogens(mut self, enabled: bool) -> Self {
        self.impute_hydrogens = Some(enabled);
        self
    }
    pub fn write_structures(mut self, enabled: bool) -> Self {
        self.write_structures = Some(enabled);
        self
    }
    pub fn flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = Some(policy);
        self
    }

    /// Builds the configuration. Without an explicit flush policy the logbook is
    /// flushed immediately on a single worker thread and buffered otherwise.
    pub fn build(self) -> Result<HarvestConfig, ConfigError> {
        let flush_policy = self.flush_policy.unwrap_or_else(|| {
            if rayon::current_num_threads() > 1 {
                FlushPolicy::Buffered
            } else {
                FlushPolicy::Immediate
            }
        });
        Ok(HarvestConfig {
            output_dir: self
                .output_dir
                .ok_or(ConfigError::MissingParameter("output_dir"))?,
            overwrite: self.overwrite.unwrap_or(false),
            impute_hydrogens: self.impute_hydrogens.unwrap_or(true),
            write_structures: self.write_structures.unwrap_or(true),
            flush_policy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_output_dir() {
        let err = HarvestConfigBuilder::new().overwrite(true).build().unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("output_dir"));
    }

    #[test]
    fn build_applies_defaults() {
        let config = HarvestConfigBuilder::new()
            .output_dir(PathBuf::from("out"))
            .build()
            .unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.overwrite);
        assert!(config.impute_hydrogens);
        assert!(config.write_structures);
    }

    #[test]
    fn explicit_values_win() {
        let config = HarvestConfigBuilder::new()
            .output_dir(PathBuf::from("db"))
            .overwrite(true)
            .impute_hydrogens(false)
            .write_structures(false)
            .flush_policy(FlushPolicy::Immediate)
            .build()
            .unwrap();
        assert!(config.overwrite);
        assert!(!config.impute_hydrogens);
        assert!(!config.write_structures);
        assert_eq!(config.flush_policy, FlushPolicy::Immediate);
    }
}

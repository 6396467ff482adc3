use crate::cli::HarvestArgs;
use crate::error::{CliError, Result};
use acsd::core::io::logbook::FlushPolicy;
use acsd::engine::config::{HarvestConfig, HarvestConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPathsConfig {
    entries: Option<PathBuf>,
    output: Option<PathBuf>,
    exclude: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPipelineConfig {
    overwrite: Option<bool>,
    impute_hydrogens: Option<bool>,
    write_structures: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialLogbookConfig {
    flush_policy: Option<String>,
}

/// The `harvest` configuration file. Every key is optional; command-line flags win.
///
/// ```toml
/// [paths]
/// entries = "entries"
/// output = "db"
/// exclude = "excluded.txt"
///
/// [pipeline]
/// overwrite = false
/// impute-hydrogens = true
/// write-structures = true
///
/// [logbook]
/// flush-policy = "buffered"
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialHarvestConfig {
    paths: Option<PartialPathsConfig>,
    pipeline: Option<PartialPipelineConfig>,
    logbook: Option<PartialLogbookConfig>,
}

/// Everything the `harvest` command needs once file and flags are merged.
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    pub core: HarvestConfig,
    pub entries_dir: PathBuf,
    pub exclude_file: Option<PathBuf>,
}

impl PartialHarvestConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    pub fn merge_with_cli(self, args: &HarvestArgs) -> Result<HarvestSettings> {
        let paths = self.paths.unwrap_or_default();
        let pipeline = self.pipeline.unwrap_or_default();
        let logbook = self.logbook.unwrap_or_default();

        let entries_dir = args.entries.clone().or(paths.entries).ok_or_else(|| {
            CliError::Config(
                "An entries directory is required either as `paths.entries` or via --entries."
                    .to_string(),
            )
        })?;
        let output_dir = args.output.clone().or(paths.output).ok_or_else(|| {
            CliError::Config(
                "An output directory is required either as `paths.output` or via --output."
                    .to_string(),
            )
        })?;

        let file_policy = logbook
            .flush_policy
            .as_deref()
            .map(str::parse::<FlushPolicy>)
            .transpose()
            .map_err(|e| CliError::Config(format!("`logbook.flush-policy`: {}", e)))?;

        let mut builder = HarvestConfigBuilder::new()
            .output_dir(output_dir)
            .overwrite(args.overwrite || pipeline.overwrite.unwrap_or(false))
            .impute_hydrogens(!args.no_hydrogens && pipeline.impute_hydrogens.unwrap_or(true))
            .write_structures(!args.no_structures && pipeline.write_structures.unwrap_or(true));
        if let Some(policy) = args.flush_policy.or(file_policy) {
            builder = builder.flush_policy(policy);
        }

        Ok(HarvestSettings {
            core: builder.build().map_err(|e| CliError::Config(e.to_string()))?,
            entries_dir,
            exclude_file: args.exclude.clone().or(paths.exclude),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn args(extra: &[&str]) -> HarvestArgs {
        use crate::cli::{Cli, Commands};
        use clap::Parser;
        let mut argv = vec!["acsd", "harvest", "list.gcd"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Harvest(args) => args,
            _ => unreachable!(),
        }
    }

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const FULL_CONFIG: &str = r#"
[paths]
entries = "from-file/entries"
output = "from-file/db"
exclude = "from-file/excluded.txt"

[pipeline]
overwrite = true
impute-hydrogens = false
write-structures = true

[logbook]
flush-policy = "immediate"
"#;

    #[test]
    fn file_values_are_used_when_flags_are_absent() {
        let file = config_file(FULL_CONFIG);
        let settings = PartialHarvestConfig::from_file(file.path())
            .unwrap()
            .merge_with_cli(&args(&[]))
            .unwrap();

        assert_eq!(settings.entries_dir, PathBuf::from("from-file/entries"));
        assert_eq!(settings.core.output_dir, PathBuf::from("from-file/db"));
        assert_eq!(
            settings.exclude_file,
            Some(PathBuf::from("from-file/excluded.txt"))
        );
        assert!(settings.core.overwrite);
        assert!(!settings.core.impute_hydrogens);
        assert!(settings.core.write_structures);
        assert_eq!(settings.core.flush_policy, FlushPolicy::Immediate);
    }

    #[test]
    fn flags_override_file_values() {
        let file = config_file(FULL_CONFIG);
        let settings = PartialHarvestConfig::from_file(file.path())
            .unwrap()
            .merge_with_cli(&args(&[
                "--entries",
                "cli/entries",
                "--output",
                "cli/db",
                "--no-structures",
                "--flush-policy",
                "buffered",
            ]))
            .unwrap();

        assert_eq!(settings.entries_dir, PathBuf::from("cli/entries"));
        assert_eq!(settings.core.output_dir, PathBuf::from("cli/db"));
        assert!(!settings.core.write_structures);
        assert_eq!(settings.core.flush_policy, FlushPolicy::Buffered);
    }

    #[test]
    fn flags_alone_are_enough() {
        let settings = PartialHarvestConfig::default()
            .merge_with_cli(&args(&["-e", "entries", "-o", "db"]))
            .unwrap();
        assert!(!settings.core.overwrite);
        assert!(settings.core.impute_hydrogens);
        assert!(settings.core.write_structures);
        assert_eq!(settings.exclude_file, None);
    }

    #[test]
    fn missing_output_directory_is_reported() {
        let result = PartialHarvestConfig::default().merge_with_cli(&args(&["-e", "entries"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("paths.output")));
    }

    #[test]
    fn unknown_keys_and_bad_policies_are_rejected() {
        let unknown = config_file("[pipeline]\nimpute = true\n");
        assert!(matches!(
            PartialHarvestConfig::from_file(unknown.path()),
            Err(CliError::FileParsing { .. })
        ));

        let bad_policy = config_file("[logbook]\nflush-policy = \"sometimes\"\n");
        let result = PartialHarvestConfig::from_file(bad_policy.path())
            .unwrap()
            .merge_with_cli(&args(&["-e", "entries", "-o", "db"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("sometimes")));
    }
}

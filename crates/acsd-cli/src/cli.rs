use acsd::core::io::logbook::FlushPolicy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ACSD CLI - Builds an auditable on-disk database of validated crystal structures from crystallographic entries.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of worker threads.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build, complete and validate crystals for a list of identifiers and write them to disk.
    Harvest(HarvestArgs),
    /// Parse a chemical formula and print its element counts.
    Formula(FormulaArgs),
}

/// Arguments for the `harvest` subcommand.
#[derive(Args, Debug)]
pub struct HarvestArgs {
    /// Identifier lists (.gcd files) or directories containing them.
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Directory holding one `<IDENTIFIER>.json` entry file per identifier.
    #[arg(short, long, value_name = "DIR")]
    pub entries: Option<PathBuf>,

    /// Directory receiving structures, ledgers and the logbook.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Remove the output directory first and process every identifier again.
    #[arg(long)]
    pub overwrite: bool,

    /// File of identifiers to skip, one per line (anything after ':' is ignored).
    #[arg(short = 'x', long, value_name = "PATH")]
    pub exclude: Option<PathBuf>,

    /// Do not place hydrogens that the entry lists without coordinates.
    #[arg(long)]
    pub no_hydrogens: bool,

    /// Evaluate and record quality without writing structure files.
    #[arg(long)]
    pub no_structures: bool,

    /// How logbook lines are flushed: 'immediate' or 'buffered'.
    /// Defaults to 'immediate' with one thread and 'buffered' otherwise.
    #[arg(long, value_name = "POLICY")]
    pub flush_policy: Option<FlushPolicy>,
}

/// Arguments for the `formula` subcommand.
#[derive(Args, Debug)]
pub struct FormulaArgs {
    /// The formula to parse, e.g. "C10 H8 N2 O2,2(H2 O1)".
    #[arg(required = true)]
    pub formula: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn harvest_arguments_parse() {
        let cli = Cli::parse_from([
            "acsd",
            "-vv",
            "-j",
            "4",
            "harvest",
            "list.gcd",
            "more/",
            "--entries",
            "entries",
            "-o",
            "db",
            "--no-hydrogens",
            "--flush-policy",
            "Immediate",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
        let Commands::Harvest(args) = cli.command else {
            panic!("expected harvest command");
        };
        assert_eq!(
            args.inputs,
            [PathBuf::from("list.gcd"), PathBuf::from("more/")]
        );
        assert_eq!(args.entries, Some(PathBuf::from("entries")));
        assert!(args.no_hydrogens);
        assert!(!args.no_structures);
        assert_eq!(args.flush_policy, Some(FlushPolicy::Immediate));
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["acsd", "-q", "-v", "formula", "C6 H6"]);
        assert!(result.is_err());
    }
}

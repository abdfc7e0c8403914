use clap::{Args, Parser, Subcommand, ValueEnum};
use matscreen::engine::config::RatioSource;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Materials Screening Contributors",
    version,
    about = "matscreen - screen candidate materials by stoichiometry and generate new ones by isovalent substitution.",
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

    #[command(flatten)]
    pub options: ConfigArgs,
}

/// Options shared by every command that reads the layered configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory that receives result tables, summaries and plots.
    #[arg(short = 'o', long, global = true, value_name = "DIR")]
    pub results_dir: Option<PathBuf>,

    /// Do not draw the synthesis pie chart.
    #[arg(long, global = true)]
    pub no_plot: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S substitution.percent=10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", global = true)]
    pub set_values: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify candidate materials by their reduced stoichiometric ratio.
    Screen(ScreenArgs),
    /// Generate new materials by isovalent substitution of seed materials.
    Generate(GenerateArgs),
    /// Manage the local data directory holding the reference tables.
    Data(DataArgs),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceArg {
    /// The built-in perovskite-family ratio list.
    Builtin,
    /// Ratios of the known-materials table.
    KnownMaterials,
}

impl From<SourceArg> for RatioSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Builtin => RatioSource::Builtin,
            SourceArg::KnownMaterials => RatioSource::KnownMaterials,
        }
    }
}

/// Arguments for the `screen` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ScreenArgs {
    /// Candidate table (CSV with a `composition` column).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Known-materials table used for ICSD matching.
    /// Can be a path or a logical name (e.g., 'icsd').
    #[arg(long, value_name = "NAME_OR_PATH")]
    pub known: Option<String>,

    /// Where the accepted stoichiometric ratios come from.
    #[arg(long, value_enum, value_name = "SOURCE")]
    pub source: Option<SourceArg>,

    /// Compare ratios regardless of element order.
    #[arg(long)]
    pub unordered: bool,
}

/// Arguments for the `generate` subcommand.
#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Seed formula, e.g. CsPbI3. Use together with --site.
    #[arg(long, value_name = "FORMULA", required_unless_present = "seeds", conflicts_with = "seeds")]
    pub seed: Option<String>,

    /// Substitutable site of the seed as Element:Charge:Coordination (e.g., Pb:+2:VIII).
    /// Can be used multiple times.
    #[arg(long = "site", value_name = "SITE", requires = "seed")]
    pub sites: Vec<String>,

    /// Seed table (CSV with `formula` and `sites` columns).
    #[arg(long, value_name = "PATH")]
    pub seeds: Option<PathBuf>,

    /// Absolute property window, in the property's unit (Å for radii).
    #[arg(long, value_name = "FLOAT", conflicts_with = "percent")]
    pub tolerance: Option<f64>,

    /// Relative property window in percent of the site value.
    #[arg(long, value_name = "FLOAT")]
    pub percent: Option<f64>,

    /// Exclude values lying exactly on the window boundary.
    #[arg(long)]
    pub exclusive: bool,

    /// Accept substitutes at any coordination number.
    #[arg(long)]
    pub any_coordination: bool,

    /// Reference-table column compared between site and substitute.
    #[arg(long, value_name = "NAME")]
    pub property: Option<String>,

    /// Also report same-charge substitutes that fail the checks.
    #[arg(long)]
    pub include_rejected: bool,

    /// Ionic-radius reference table.
    /// Can be a path or a logical name (e.g., 'shannon' or 'shannon@2024').
    #[arg(long, value_name = "NAME_OR_PATH")]
    pub reference: Option<String>,

    /// Known-materials table used for ICSD matching.
    /// Can be a path or a logical name (e.g., 'icsd').
    #[arg(long, value_name = "NAME_OR_PATH")]
    pub known: Option<String>,
}

/// Arguments for the `data` subcommand.
#[derive(Args, Debug)]
pub struct DataArgs {
    #[command(subcommand)]
    pub command: DataCommands,
}

/// Available commands for data management.
#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// Show the absolute path to the local data directory.
    Path,
    /// Set a custom absolute path for the local data directory.
    SetPath {
        /// The new path to use for storing data files.
        #[arg(required = true)]
        path: PathBuf,
    },
    /// Reset the data path to its default, OS-specific location.
    ResetPath,
    /// Load the default reference tables and report their status.
    Check,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_screen_with_global_options() {
        let cli = Cli::parse_from([
            "matscreen",
            "-vv",
            "screen",
            "-i",
            "candidates.csv",
            "--source",
            "known-materials",
            "--known",
            "icsd",
            "--unordered",
            "-o",
            "out",
            "-S",
            "output.plot=false",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.options.results_dir, Some(PathBuf::from("out")));
        assert_eq!(cli.options.set_values, vec!["output.plot=false"]);
        let Commands::Screen(args) = cli.command else {
            panic!("expected screen command");
        };
        assert_eq!(args.source, Some(SourceArg::KnownMaterials));
        assert_eq!(args.known.as_deref(), Some("icsd"));
        assert!(args.unordered);
    }

    #[test]
    fn parses_generate_with_inline_seed() {
        let cli = Cli::parse_from([
            "matscreen",
            "generate",
            "--seed",
            "CsPbI3",
            "--site",
            "Pb:+2:VI",
            "--site",
            "Cs:+1:XII",
            "--tolerance",
            "0.1",
            "--exclusive",
        ]);
        let Commands::Generate(args) = cli.command else {
            panic!("expected generate command");
        };
        assert_eq!(args.seed.as_deref(), Some("CsPbI3"));
        assert_eq!(args.sites.len(), 2);
        assert_eq!(args.tolerance, Some(0.1));
        assert!(args.exclusive);
    }

    #[test]
    fn generate_requires_a_seed_source() {
        assert!(Cli::try_parse_from(["matscreen", "generate"]).is_err());
        assert!(
            Cli::try_parse_from([
                "matscreen", "generate", "--seed", "CsPbI3", "--seeds", "seeds.csv"
            ])
            .is_err()
        );
    }

    #[test]
    fn tolerance_and_percent_conflict() {
        assert!(
            Cli::try_parse_from([
                "matscreen",
                "generate",
                "--seeds",
                "seeds.csv",
                "--tolerance",
                "0.1",
                "--percent",
                "15",
            ])
            .is_err()
        );
    }

    #[test]
    fn quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["matscreen", "-q", "-v", "data", "path"]).is_err());
    }
}

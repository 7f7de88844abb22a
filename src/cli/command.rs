use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

use iab::validate::ConstraintSet;

#[derive(Debug, ClapParser)]
#[command(
    name       = env!("CARGO_PKG_NAME"),
    version    = env!("CARGO_PKG_VERSION"),
    author     = env!("CARGO_PKG_AUTHORS"),
    about      = "Tools for inspecting and validating SMPTE ST 2098-2 Immersive Audio Bitstreams",
    long_about = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat stream warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate the specified IAB stream against constraint-set profiles.
    Validate(ValidateArgs),

    /// Print stream information
    Info(InfoArgs),
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Input IAB bitstream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Write the JSON report to this path instead of stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Constraint set the exit status is judged against.
    #[arg(long, value_enum, default_value_t = ConstraintSetArg::CinemaSt2098_2_2018)]
    pub constraint_set: ConstraintSetArg,

    /// Stop validating once this many issues have accumulated for the
    /// selected constraint set.
    #[arg(long, value_name = "COUNT")]
    pub max_issues: Option<usize>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input IAB bitstream.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConstraintSetArg {
    /// Cinema ST2098-2:2018 base set.
    CinemaSt2098_2_2018,
    /// Cinema ST429-18:2019 track file set.
    CinemaSt429_18_2019,
    /// Dolby cinema vendor set.
    DbyCinema,
    /// IMF ST2098-2:2019 base set.
    ImfSt2098_2_2019,
    /// IMF ST2067-201:2019 application set.
    ImfSt2067_201_2019,
    /// Dolby IMF vendor set.
    DbyImf,
}

impl ConstraintSetArg {
    pub fn to_set(self) -> ConstraintSet {
        match self {
            Self::CinemaSt2098_2_2018 => ConstraintSet::CinemaSt2098_2_2018,
            Self::CinemaSt429_18_2019 => ConstraintSet::CinemaSt429_18_2019,
            Self::DbyCinema => ConstraintSet::DbyCinema,
            Self::ImfSt2098_2_2019 => ConstraintSet::ImfSt2098_2_2019,
            Self::ImfSt2067_201_2019 => ConstraintSet::ImfSt2067_201_2019,
            Self::DbyImf => ConstraintSet::DbyImf,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable log lines.
    Plain,
    /// One JSON object per log line.
    Json,
}

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use swimcube::dataset::Profile;
use swimcube::spectral::FftStrategy;

mod demo;
mod extract;
mod info;

pub use extract::ExtractArgs;

/// swimcube - SWIM acquisition to time/frequency cube extractor
#[derive(Parser)]
#[command(name = "swimcube")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Output profile for optimizing speed vs compression.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ProfileArg {
    /// Prioritize speed over compression
    Fast,
    /// Balance between speed and compression
    #[default]
    Balanced,
    /// Maximum compression, slower writes
    MaxCompression,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Fast => Profile::Fast,
            ProfileArg::Balanced => Profile::Balanced,
            ProfileArg::MaxCompression => Profile::MaxCompression,
        }
    }
}

/// Fourier transform execution strategy.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StrategyArg {
    /// Batched when it fits the memory budget, channel-at-a-time otherwise
    Auto,
    /// One bulk transform over every channel
    Batched,
    /// One reusable buffer, channels transformed in turn
    Channel,
}

impl From<StrategyArg> for FftStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Auto => FftStrategy::Auto,
            StrategyArg::Batched => FftStrategy::Batched,
            StrategyArg::Channel => FftStrategy::ChannelAtATime,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract time- and frequency-domain cubes from a Bruker .d directory
    Extract(ExtractArgs),

    /// Run the pipeline on a synthetic acquisition
    Demo {
        /// Output directory
        #[arg(value_name = "OUTPUT_DIR", default_value = "demo_output")]
        output_dir: PathBuf,

        /// Number of SWIM pulses
        #[arg(long, default_value_t = 256)]
        pulses: u32,

        /// Number of mass channels
        #[arg(long, default_value_t = 64)]
        channels: usize,

        /// Output profile (fast, balanced, max-compression)
        #[arg(short = 'p', long, default_value = "balanced", value_enum)]
        profile: ProfileArg,
    },

    /// Display information about a cube dataset
    Info {
        /// Input dataset path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract(args) => extract::run(args),
        Commands::Demo {
            output_dir,
            pulses,
            channels,
            profile,
        } => demo::run(output_dir, pulses, channels, Profile::from(profile)),
        Commands::Info { file } => info::run(file),
    }
}

/// Section heading, bold when colors are enabled
pub(crate) fn heading(text: &str) -> String {
    #[cfg(feature = "colorized_output")]
    {
        console::style(text).bold().to_string()
    }
    #[cfg(not(feature = "colorized_output"))]
    {
        text.to_string()
    }
}

/// Highlight a count that signals trouble when non-zero
pub(crate) fn warn_count(count: usize) -> String {
    #[cfg(feature = "colorized_output")]
    {
        if count > 0 {
            return console::style(count).yellow().to_string();
        }
        console::style(count).green().to_string()
    }
    #[cfg(not(feature = "colorized_output"))]
    {
        count.to_string()
    }
}

/// Print a one-screen summary of a finished run
pub(crate) fn print_summary(output: &swimcube::extract::ExtractionOutput) {
    let report = &output.report.reconstruction;
    println!("{}", heading("Extraction complete"));
    println!("  Time domain:      {}", output.time_domain_path.display());
    println!("  Frequency domain: {}", output.fourier_domain_path.display());
    println!(
        "  Shape:            {}x{} -> {}x{}",
        output.time_domain_stats.shape.0,
        output.time_domain_stats.shape.1,
        output.fourier_domain_stats.shape.0,
        output.fourier_domain_stats.shape.1
    );
    println!("  Records:          {}", report.records_total);
    println!("  Rows written:     {}", report.rows_written);
    println!("  Skipped records:  {}", warn_count(report.skipped.len()));
    println!("  Gaps detected:    {}", warn_count(report.gaps_detected));
    println!("  FFT strategy:     {}", output.report.strategy);
}

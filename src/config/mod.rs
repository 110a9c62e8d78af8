pub mod cli;
pub mod job_file;

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "marsh")]
#[command(about = "Schema-driven marshalling of JSON records")]
pub struct CliConfig {
    #[arg(long, default_value = "marsh.toml", help = "Path to the job file")]
    pub config: String,

    #[arg(long, help = "Override the job's output path")]
    pub output_path: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytscribe",
    about = "HTTP endpoint returning YouTube transcripts",
    version
)]
pub struct Cli {
    /// Address to listen on (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Config file (default: ~/.config/ytscribe/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,

    /// Print the effective configuration on startup
    #[arg(short, long)]
    pub verbose: bool,
}

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "veridex",
    version,
    about = "Prove local package artifacts against signed, trusted remote package indexes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Verify every artifact in a directory against the configured suites
    Verify(VerifyArgs),
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Directory holding the package artifacts to verify
    pub artifact_dir: PathBuf,

    /// Suite to consult, in priority order (repeatable)
    #[arg(long = "suite", required = true)]
    pub suites: Vec<String>,

    /// Component to consult within each suite (repeatable)
    #[arg(long = "component", default_values_t = [String::from("main")])]
    pub components: Vec<String>,

    /// Mirror base URL the indexes are retrieved from
    #[arg(long, env = "VERIDEX_MIRROR_URL")]
    pub mirror: String,

    /// Keyring file or directory of trusted `*.pub` keys
    #[arg(long, env = "VERIDEX_KEYRING")]
    pub keyring: PathBuf,

    /// Result CSV path (defaults to `<artifact_dir>/veridex_results.csv`)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Skip the suite gate and treat every suite as trusted
    #[arg(long)]
    pub force_suite: bool,

    /// Never offer a retry of suites that failed the gate
    #[arg(long)]
    pub no_retry_prompt: bool,

    /// Answer "yes" to the retry prompt without asking
    #[arg(long, conflicts_with = "no_retry_prompt")]
    pub assume_yes: bool,

    /// Seconds to wait at the retry prompt before declining
    #[arg(long, default_value_t = 15)]
    pub retry_timeout: u64,

    /// Bound on concurrently scanned artifacts
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Index blob cache directory override
    #[arg(long, env = "VERIDEX_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,
}

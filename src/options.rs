use super::*;

#[derive(Clone, Default, Debug, Parser)]
pub struct Options {
    #[arg(long, help = "Load configuration from <CONFIG>.")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Load configuration from <CONFIG_DIR>/pickaxe.toml.")]
    pub config_dir: Option<PathBuf>,

    #[arg(
        long,
        help = "Log at <LOG_LEVEL> unless RUST_LOG is set. [default: info]"
    )]
    pub log_level: Option<String>,
}

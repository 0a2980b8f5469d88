use super::*;

#[derive(Clone, Debug, Default, Args)]
pub(crate) struct MineOptions {
    #[arg(help = "Mine on pool at <STRATUM_ENDPOINT>. [default port: 3333]")]
    pub(crate) stratum_endpoint: Option<String>,

    #[arg(long, short = 'u', help = "Log in as <USERNAME>, usually a wallet address.")]
    pub(crate) username: Option<String>,

    #[arg(long, short = 'p', help = "Log in with <PASSWORD>. [default: x]")]
    pub(crate) password: Option<String>,

    #[arg(long, help = "Identify this rig as <RIG_ID>.")]
    pub(crate) rig_id: Option<String>,

    #[arg(long, short = 'a', help = "Mine jobs without an algorithm field with <ALGO>.")]
    pub(crate) algo: Option<Algorithm>,

    #[arg(long, short = 't', help = "Hash on <THREADS> threads. [default: all CPUs]")]
    pub(crate) threads: Option<usize>,

    #[arg(long, short = 'k', help = "Send keepalives even if the pool does not ask.")]
    pub(crate) keepalive: bool,

    #[arg(long, help = "Wait <RETRY_PAUSE> seconds between reconnects. [default: 5]")]
    pub(crate) retry_pause: Option<u64>,
}

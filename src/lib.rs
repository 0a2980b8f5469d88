use {
    algorithm::Algorithm,
    anyhow::{Context, Error, anyhow, ensure},
    arguments::Arguments,
    byteorder::{ByteOrder, LittleEndian},
    clap::Parser,
    client::{Client, ClientConfig},
    generation::Generation,
    hash_rate::HashRate,
    hasher::{Hasher, Sha256dHasher},
    job::Job,
    job_result::JobResult,
    miner::Miner,
    nonce::NonceAllocator,
    options::Options,
    parking_lot::Mutex,
    serde::{Deserialize, Serialize},
    serde_with::{DeserializeFromStr, SerializeDisplay},
    settings::Settings,
    snafu::Snafu,
    stats::{Snapshot, Stats},
    std::{
        collections::BTreeMap,
        env,
        fmt::{self, Display, Formatter},
        fs, io,
        path::PathBuf,
        process,
        str::FromStr,
        sync::{
            Arc,
            atomic::{AtomicBool, AtomicU64, Ordering},
        },
        thread,
        time::{Duration, Instant},
    },
    stratum::{JobParams, Submit},
    tokio::{
        runtime::Runtime,
        sync::mpsc,
        task::JoinSet,
        time::{MissedTickBehavior, interval},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
    worker::{Worker, WorkerSlot},
    worker_job::WorkerJob,
};

mod algorithm;
mod arguments;
mod client;
mod generation;
mod hash_rate;
mod hasher;
mod job;
mod job_result;
mod logs;
mod miner;
mod nonce;
mod options;
mod settings;
mod signal;
mod stats;
mod subcommand;
mod worker;
mod worker_job;

pub const USER_AGENT: &str = concat!("pickaxe/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_PORT: u16 = 3333;
/// Largest job template the pool may send, in bytes.
pub const MAX_BLOB_SIZE: usize = 408;
pub const SEED_SIZE: usize = 32;
pub const MAX_MESSAGE_SIZE: usize = 32 * 1024;
/// Nonces claimed from the shared allocator per reservation. Must be a power
/// of two.
pub const RESERVE_COUNT: u32 = 32768;
pub const JOB_QUEUE_CAPACITY: usize = 16;
pub const RESULT_QUEUE_CAPACITY: usize = 1024;
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);
pub const REPORT_INTERVAL: Duration = Duration::from_secs(10);
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_secs(5);

type Result<T = (), E = Error> = std::result::Result<T, E>;

fn stratum_endpoint(endpoint: &str) -> String {
    if endpoint.contains(':') {
        endpoint.to_string()
    } else {
        format!("{endpoint}:{DEFAULT_PORT}")
    }
}

pub fn main() {
    let args = Arguments::parse();

    let _guard = logs::init(args.options.log_level.as_deref());

    Runtime::new()
        .expect("Failed to create tokio runtime")
        .block_on(async {
            let cancel_token = signal::setup_signal_handler();

            match args.run(cancel_token).await {
                Err(err) => {
                    eprintln!("error: {err}");

                    for (i, cause) in err.chain().skip(1).enumerate() {
                        if i == 0 {
                            eprintln!();
                            eprintln!("because:");
                        }
                        eprintln!("- {cause}");
                    }

                    if env::var_os("RUST_BACKTRACE")
                        .map(|val| val == "1")
                        .unwrap_or_default()
                    {
                        eprintln!();
                        eprintln!("{}", err.backtrace());
                    }
                    process::exit(1);
                }
                Ok(_) => {
                    process::exit(0);
                }
            }
        });
}

use super::*;

/// Hands each new job to every worker slot, with one shared nonce allocator
/// per job.
pub struct Dispatcher {
    generation: Arc<Generation>,
    slots: Vec<Arc<WorkerSlot>>,
    stats: Arc<Stats>,
}

impl Dispatcher {
    pub fn new(
        generation: Arc<Generation>,
        slots: Vec<Arc<WorkerSlot>>,
        stats: Arc<Stats>,
    ) -> Self {
        Self {
            generation,
            slots,
            stats,
        }
    }

    /// Returns the number of workers that received the job.
    pub fn dispatch(&self, job: Job) -> usize {
        let job = Arc::new(job);

        let busy = self.slots.iter().filter(|slot| !slot.is_idle()).count();

        if busy > 0 {
            debug!("Replacing the job of {busy} busy workers");
        }

        let generation = self.generation.bump();
        let allocator = Arc::new(NonceAllocator::new());

        let mut assigned = 0;

        for slot in &self.slots {
            let Some(worker_job) =
                WorkerJob::new(job.clone(), generation, allocator.clone(), RESERVE_COUNT)
            else {
                warn!(
                    "Job {} has no nonce space left for {} of {} workers",
                    job.id,
                    self.slots.len() - assigned,
                    self.slots.len()
                );
                break;
            };

            slot.set_job(worker_job);
            assigned += 1;
        }

        self.stats.add_job();

        info!(
            "New job {} algo {} height {} target {:016x} diff {}",
            job.id, job.algorithm, job.height, job.target, job.diff
        );

        debug!(
            "Job {} blob size {} nicehash {} seed {}",
            job.id,
            job.size(),
            job.nicehash,
            job.seed.map(hex::encode).unwrap_or_default()
        );

        assigned
    }
}

/// Wires a pool client to a set of worker threads: jobs flow in through the
/// dispatcher, results flow out through the commit task, and a reporter logs
/// progress.
pub struct Miner {
    client: Arc<Client>,
    dispatcher: Dispatcher,
    workers: Vec<thread::JoinHandle<()>>,
    jobs: mpsc::Receiver<Job>,
    results: mpsc::Receiver<JobResult>,
    stats: Arc<Stats>,
    once: bool,
    cancel: CancellationToken,
}

impl Miner {
    pub fn new(
        config: ClientConfig,
        hasher: Arc<dyn Hasher>,
        threads: usize,
        once: bool,
        cancel: CancellationToken,
    ) -> Result<Self> {
        ensure!(threads > 0, "at least one worker thread is required");

        for algorithm in Algorithm::ALL {
            ensure!(
                hasher.self_test(algorithm),
                "hasher self-test failed for {algorithm}"
            );
        }

        let cancel = cancel.child_token();
        let stats = Arc::new(Stats::new());
        let generation = Arc::new(Generation::new());

        let (jobs_tx, jobs) = mpsc::channel(JOB_QUEUE_CAPACITY);
        let (results_tx, results) = mpsc::channel(RESULT_QUEUE_CAPACITY);

        let client = Arc::new(Client::new(
            config,
            jobs_tx,
            stats.clone(),
            cancel.clone(),
        ));

        let mut slots = Vec::with_capacity(threads);
        let mut workers = Vec::with_capacity(threads);

        for id in 0..threads {
            let slot = Arc::new(WorkerSlot::new());

            let handle = Worker {
                id,
                slot: slot.clone(),
                generation: generation.clone(),
                hasher: hasher.clone(),
                stats: stats.clone(),
                results: results_tx.clone(),
                cancel: cancel.clone(),
            }
            .spawn()
            .with_context(|| format!("failed to spawn worker thread {id}"))?;

            slots.push(slot);
            workers.push(handle);
        }

        info!("Started {threads} worker threads");

        Ok(Self {
            client,
            dispatcher: Dispatcher::new(generation, slots, stats.clone()),
            workers,
            jobs,
            results,
            stats,
            once,
            cancel,
        })
    }

    /// Mine until cancelled, or until the first accepted share with `once`.
    /// Returns lifetime totals.
    pub async fn run(self) -> Result<Snapshot> {
        let Self {
            client,
            dispatcher,
            workers,
            mut jobs,
            results,
            stats,
            once,
            cancel,
        } = self;

        let mut tasks = JoinSet::new();

        tasks.spawn(client.clone().run());
        tasks.spawn(commit(client.clone(), results, cancel.clone()));
        tasks.spawn(report(client.clone(), stats.clone(), cancel.clone()));

        let mut accepted = client.accepted();

        let first_share = async {
            if once {
                accepted.wait_for(|accepted| *accepted > 0).await.ok();
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::pin!(first_share);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Shutting down miner");
                    break;
                }
                _ = &mut first_share => {
                    info!("Share accepted, exiting");
                    break;
                }
                job = jobs.recv() => match job {
                    Some(job) => {
                        dispatcher.dispatch(job);
                    }
                    None => break,
                },
            }
        }

        cancel.cancel();

        drop(jobs);

        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                error!("Miner task failed: {err}");
            }
        }

        tokio::task::spawn_blocking(move || {
            for worker in workers {
                if worker.join().is_err() {
                    error!("Worker thread panicked");
                }
            }
        })
        .await
        .context("failed to join worker threads")?;

        let totals = stats.totals();

        info!(
            "Totals: {} hashes, {} jobs, {} submitted, {} accepted, {} failed",
            totals.hashes, totals.jobs, totals.submitted, totals.accepted, totals.failed
        );

        Ok(totals)
    }
}

async fn commit(
    client: Arc<Client>,
    mut results: mpsc::Receiver<JobResult>,
    cancel: CancellationToken,
) {
    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            result = results.recv() => match result {
                Some(result) => result,
                None => break,
            },
        };

        let job_id = result.job.id.clone();
        let nonce = result.nonce_hex();
        let found = result.found;

        match client.submit(result).await {
            Ok(()) => debug!(
                "Share for job {job_id} nonce {nonce} sent {}ms after it was found",
                found.elapsed().as_millis()
            ),
            Err(err) => warn!("Failed to submit share for job {job_id} nonce {nonce}: {err}"),
        }
    }
}

async fn report(client: Arc<Client>, stats: Arc<Stats>, cancel: CancellationToken) {
    let mut ticker = interval(REPORT_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut last = Instant::now();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let now = Instant::now();
        let sample = stats.sample_and_reset();

        info!(
            "speed {} | jobs {} | submitted {} | accepted {} | failed {}",
            HashRate::from_hashes(sample.hashes, now - last),
            sample.jobs,
            sample.submitted,
            sample.accepted,
            sample.failed
        );

        last = now;

        if client.wants_heartbeat()
            && let Err(err) = client.heartbeat().await
        {
            warn!("Failed to send keepalive: {err}");
        }

        let evicted = client.evict_expired(REQUEST_TIMEOUT);

        if evicted > 0 {
            warn!("Evicted {evicted} requests without reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        job::fixtures,
        tokio::{
            io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
            net::TcpListener,
            time::timeout,
        },
    };

    fn dispatcher(
        workers: usize,
    ) -> (
        Dispatcher,
        Vec<Arc<WorkerSlot>>,
        Arc<Generation>,
        Arc<Stats>,
    ) {
        let generation = Arc::new(Generation::new());
        let stats = Arc::new(Stats::new());
        let slots = (0..workers)
            .map(|_| Arc::new(WorkerSlot::new()))
            .collect::<Vec<_>>();

        (
            Dispatcher::new(generation.clone(), slots.clone(), stats.clone()),
            slots,
            generation,
            stats,
        )
    }

    #[test]
    fn dispatch_gives_each_worker_its_own_window() {
        let (dispatcher, slots, generation, stats) = dispatcher(4);

        assert_eq!(dispatcher.dispatch(fixtures::job("1", "cn/r", fixtures::TARGET)), 4);

        assert_eq!(generation.current(), 1);
        assert_eq!(stats.totals().jobs, 1);

        let nonces = slots
            .iter()
            .map(|slot| {
                let job = slot.take().unwrap();
                assert_eq!(job.generation(), 1);
                assert_eq!(job.job().id, "1");
                job.nonce()
            })
            .collect::<Vec<u64>>();

        let window = u64::from(RESERVE_COUNT);
        assert_eq!(nonces, vec![0, window, 2 * window, 3 * window]);
    }

    #[test]
    fn newer_job_overwrites_pending() {
        let (dispatcher, slots, generation, stats) = dispatcher(2);

        dispatcher.dispatch(fixtures::job("1", "cn/r", fixtures::TARGET));
        dispatcher.dispatch(fixtures::job("2", "cn/r", fixtures::TARGET));

        assert_eq!(generation.current(), 2);
        assert_eq!(stats.totals().jobs, 2);

        for slot in slots {
            let job = slot.take().unwrap();
            assert_eq!(job.job().id, "2");
            assert_eq!(job.generation(), 2);
            assert!(slot.take().is_none());
        }
    }

    #[test]
    fn nicehash_job_stays_inside_pool_byte() {
        let (dispatcher, slots, _, _) = dispatcher(2);

        let mut params = fixtures::params("1", "cn/r", fixtures::TARGET);
        let mut blob = hex::decode(fixtures::BLOB).unwrap();
        blob[42] = 0xAB;
        params.blob = hex::encode(&blob);

        dispatcher.dispatch(Job::parse(&params, None, false).unwrap());

        for slot in slots {
            let job = slot.take().unwrap();
            assert_eq!(job.nonce() >> 24, 0xAB);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn mines_until_first_accepted_share() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let pool = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();

            let mut submits = 0;

            while let Ok(Some(line)) = lines.next_line().await {
                let request = serde_json::from_str::<serde_json::Value>(&line).unwrap();

                let reply = match request["method"].as_str() {
                    Some("login") => serde_json::json!({
                        "id": request["id"],
                        "jsonrpc": "2.0",
                        "error": null,
                        "result": {
                            "id": "session",
                            "job": {
                                "job_id": "1",
                                "blob": fixtures::BLOB,
                                "target": "ffffffff",
                                "height": fixtures::HEIGHT,
                                "algo": "cn/r",
                            },
                            "extensions": ["algo"],
                            "status": "OK",
                        },
                    }),
                    Some("submit") => {
                        submits += 1;
                        assert_eq!(request["params"]["job_id"], "1");
                        assert_eq!(request["params"]["algo"], "cn/r");
                        serde_json::json!({
                            "id": request["id"],
                            "jsonrpc": "2.0",
                            "error": null,
                            "result": {"status": "OK"},
                        })
                    }
                    _ => continue,
                };

                if writer
                    .write_all(format!("{reply}\n").as_bytes())
                    .await
                    .is_err()
                {
                    break;
                }
            }

            submits
        });

        let miner = Miner::new(
            ClientConfig {
                address,
                username: "wallet".into(),
                password: "x".into(),
                rig_id: None,
                algorithm: None,
                keepalive: false,
                retry_pause: Duration::from_millis(50),
                timeout: Duration::from_secs(5),
            },
            Arc::new(Sha256dHasher),
            2,
            true,
            CancellationToken::new(),
        )
        .unwrap();

        let totals = timeout(Duration::from_secs(60), miner.run())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(totals.jobs, 1);
        assert!(totals.accepted >= 1);
        assert!(totals.hashes >= totals.submitted);
        assert!(pool.await.unwrap() >= 1);
    }

    #[test]
    fn zero_threads_is_an_error() {
        let config = ClientConfig {
            address: "127.0.0.1:1".into(),
            username: "wallet".into(),
            password: "x".into(),
            rig_id: None,
            algorithm: None,
            keepalive: false,
            retry_pause: DEFAULT_RETRY_PAUSE,
            timeout: CONNECT_TIMEOUT,
        };

        assert!(
            Miner::new(
                config,
                Arc::new(Sha256dHasher),
                0,
                false,
                CancellationToken::new()
            )
            .is_err()
        );
    }
}

use {
    crate::{Algorithm, Job, JobResult, MAX_MESSAGE_SIZE, Stats, USER_AGENT},
    dashmap::DashMap,
    error::DisconnectReason,
    futures::stream::StreamExt,
    parking_lot::Mutex,
    serde_json::Value,
    snafu::{ResultExt, Snafu},
    std::{
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        time::{Duration, Instant},
    },
    stratum::{
        Extension, Id, JobParams, JsonRpcError, Keepalive, LOGIN_ID, Login, LoginResult,
        METHOD_GET_VERSION, METHOD_JOB, METHOD_KEEPALIVED, METHOD_LOGIN, METHOD_RECONNECT,
        METHOD_SHOW_MESSAGE, METHOD_SUBMIT, Message, Reconnect,
    },
    tokio::{
        io::{AsyncWriteExt, BufWriter},
        net::{TcpStream, tcp::OwnedWriteHalf},
        sync::{mpsc, watch},
        time::{sleep, timeout},
    },
    tokio_util::{
        codec::{FramedRead, LinesCodec},
        sync::CancellationToken,
    },
    tracing::{debug, info, warn},
};

pub use error::ClientError;

mod error;

type Result<T = (), E = ClientError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Connecting,
    Authenticating,
    Active,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub address: String,
    pub username: String,
    pub password: String,
    pub rig_id: Option<String>,
    /// Used for jobs that do not name their algorithm.
    pub algorithm: Option<Algorithm>,
    /// Send keepalives even if the pool did not ask for them.
    pub keepalive: bool,
    pub retry_pause: Duration,
    /// Bounds both the TCP connect and the wait for the login reply.
    pub timeout: Duration,
}

#[derive(Debug, Default, Clone)]
struct Session {
    id: String,
    algo: bool,
    nicehash: bool,
    keepalive: bool,
}

#[derive(Debug)]
enum Request {
    Login,
    Submit(JobResult),
}

#[derive(Debug)]
struct Pending {
    request: Request,
    sent: Instant,
}

impl Pending {
    fn new(request: Request) -> Self {
        Self {
            request,
            sent: Instant::now(),
        }
    }
}

/// Connection to one pool. Reconnects on a flat delay until cancelled,
/// forwards every valid job to the miner and accounts for submitted shares.
pub struct Client {
    config: ClientConfig,
    address: Mutex<String>,
    reconnect_wait: Mutex<Option<Duration>>,
    state: watch::Sender<State>,
    accepted: watch::Sender<u64>,
    next_id: AtomicU64,
    pending: DashMap<u64, Pending>,
    session: Mutex<Session>,
    current_job: Mutex<Option<String>>,
    writer: tokio::sync::Mutex<Option<BufWriter<OwnedWriteHalf>>>,
    jobs: mpsc::Sender<Job>,
    stats: Arc<Stats>,
    cancel: CancellationToken,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        jobs: mpsc::Sender<Job>,
        stats: Arc<Stats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            address: Mutex::new(config.address.clone()),
            config,
            reconnect_wait: Mutex::new(None),
            state: watch::Sender::new(State::Disconnected),
            accepted: watch::Sender::new(0),
            next_id: AtomicU64::new(LOGIN_ID + 1),
            pending: DashMap::new(),
            session: Mutex::new(Session::default()),
            current_job: Mutex::new(None),
            writer: tokio::sync::Mutex::new(None),
            jobs,
            stats,
            cancel,
        }
    }

    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    /// Pool address used for the next connection. Starts as the configured
    /// address and follows `client.reconnect` redirects.
    pub fn address(&self) -> String {
        self.address.lock().clone()
    }

    /// Running count of shares the pool accepted.
    pub fn accepted(&self) -> watch::Receiver<u64> {
        self.accepted.subscribe()
    }

    pub fn session_id(&self) -> Option<String> {
        let session = self.session.lock();
        (!session.id.is_empty()).then(|| session.id.clone())
    }

    pub fn current_job(&self) -> Option<String> {
        self.current_job.lock().clone()
    }

    pub fn wants_heartbeat(&self) -> bool {
        self.state() == State::Active && (self.config.keepalive || self.session.lock().keepalive)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub async fn run(self: Arc<Self>) {
        while !self.cancel.is_cancelled() {
            match self.serve().await {
                Err(ClientError::Disconnected {
                    reason: DisconnectReason::Reconnect,
                }) => {}
                Err(err) if !self.cancel.is_cancelled() => {
                    warn!("Connection to {} failed: {err}", self.address());
                }
                _ => {}
            }

            self.teardown().await;

            if self.cancel.is_cancelled() {
                break;
            }

            let pause = self
                .reconnect_wait
                .lock()
                .take()
                .unwrap_or(self.config.retry_pause);

            info!("Reconnecting to {} in {}ms", self.address(), pause.as_millis());

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = sleep(pause) => {}
            }
        }

        debug!("Client for {} stopped", self.address());
    }

    async fn serve(&self) -> Result {
        self.state.send_replace(State::Connecting);

        let address = self.address();

        info!("Connecting to {address}");

        let stream = timeout(self.config.timeout, TcpStream::connect(&address))
            .await
            .context(error::TimeoutSnafu)?
            .context(error::IoSnafu)?;

        stream.set_nodelay(true).context(error::IoSnafu)?;

        let (reader, writer) = stream.into_split();

        *self.writer.lock().await = Some(BufWriter::new(writer));

        let mut reader = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MESSAGE_SIZE));

        self.state.send_replace(State::Authenticating);

        self.login().await?;

        let login_deadline = sleep(self.config.timeout);
        tokio::pin!(login_deadline);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(ClientError::Disconnected {
                        reason: DisconnectReason::Shutdown,
                    });
                }
                _ = &mut login_deadline, if self.state() != State::Active => {
                    return Err(ClientError::LoginTimeout);
                }
                line = reader.next() => match line {
                    Some(line) => self.handle_line(&line.context(error::FramingSnafu)?).await?,
                    None => {
                        return Err(ClientError::Disconnected {
                            reason: DisconnectReason::ServerClosed,
                        });
                    }
                },
            }
        }
    }

    async fn teardown(&self) {
        if let Some(mut writer) = self.writer.lock().await.take() {
            writer.shutdown().await.ok();
        }

        let ids = self
            .pending
            .iter()
            .map(|entry| *entry.key())
            .collect::<Vec<u64>>();

        for id in ids {
            if let Some((_, pending)) = self.pending.remove(&id)
                && let Request::Submit(result) = pending.request
            {
                self.stats.add_failed();
                warn!("Share for job {} lost on disconnect", result.job.id);
            }
        }

        *self.session.lock() = Session::default();

        self.state.send_replace(State::Disconnected);
    }

    async fn login(&self) -> Result {
        let params = serde_json::to_value(Login {
            login: self.config.username.clone(),
            pass: self.config.password.clone(),
            agent: USER_AGENT.into(),
            rigid: self.config.rig_id.clone(),
        })
        .context(error::SerializationSnafu)?;

        self.pending.insert(LOGIN_ID, Pending::new(Request::Login));

        self.send(&Message::Request {
            id: Id::Number(LOGIN_ID),
            method: METHOD_LOGIN.into(),
            params,
        })
        .await
    }

    async fn send(&self, message: &Message) -> Result {
        let frame = serde_json::to_string(message).context(error::SerializationSnafu)?;

        debug!("-> {frame}");

        let mut writer = self.writer.lock().await;
        let writer = writer.as_mut().ok_or(ClientError::NotConnected)?;

        writer
            .write_all(frame.as_bytes())
            .await
            .context(error::IoSnafu)?;
        writer.write_all(b"\n").await.context(error::IoSnafu)?;
        writer.flush().await.context(error::IoSnafu)?;

        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Result {
        debug!("<- {line}");

        let message = match serde_json::from_str::<Message>(line) {
            Ok(message) => message,
            Err(err) => {
                warn!("Invalid JSON message: {line:?} - {err}");
                return Ok(());
            }
        };

        match message {
            Message::Notification { method, params } => {
                self.handle_notification(&method, params).await
            }
            Message::Response { id, result, error } => {
                self.handle_response(id, result, error).await
            }
            Message::Request { id, method, params } => {
                self.handle_request(id, &method, params).await
            }
        }
    }

    async fn handle_request(&self, id: Id, method: &str, params: Value) -> Result {
        match method {
            METHOD_GET_VERSION => {
                debug!("Pool asked for our version");

                self.send(&Message::Response {
                    id,
                    result: Some(Value::String(USER_AGENT.into())),
                    error: None,
                })
                .await
            }
            _ => self.handle_notification(method, params).await,
        }
    }

    async fn handle_response(
        &self,
        id: Id,
        result: Option<Value>,
        error: Option<JsonRpcError>,
    ) -> Result {
        let Some((_, pending)) = id.as_number().and_then(|id| self.pending.remove(&id)) else {
            debug!("Ignoring response with no pending request: id={id}");
            return Ok(());
        };

        match pending.request {
            Request::Login => {
                if let Some(error) = error {
                    return Err(ClientError::LoginRejected { error });
                }

                let login = serde_json::from_value::<LoginResult>(result.unwrap_or_default())
                    .context(error::SerializationSnafu)?;

                self.establish(login).await;
            }
            Request::Submit(share) => match error {
                Some(error) => {
                    self.stats.add_failed();
                    warn!("Share for job {} rejected: {error}", share.job.id);
                }
                None => {
                    self.stats.add_accepted();
                    self.accepted.send_modify(|accepted| *accepted += 1);
                    info!(
                        "Share for job {} accepted in {}ms",
                        share.job.id,
                        pending.sent.elapsed().as_millis()
                    );
                }
            },
        }

        Ok(())
    }

    async fn establish(&self, login: LoginResult) {
        let extensions = login.known_extensions().collect::<Vec<Extension>>();

        {
            let mut session = self.session.lock();

            *session = Session {
                id: login.id.clone(),
                ..Session::default()
            };

            for extension in &extensions {
                match extension {
                    Extension::Algo => session.algo = true,
                    Extension::Nicehash => session.nicehash = true,
                    Extension::Keepalive => session.keepalive = true,
                    Extension::Connect => {}
                }
            }
        }

        self.state.send_replace(State::Active);

        info!(
            "Logged in to {} as {} with session {} and extensions [{}]",
            self.address(),
            self.config.username,
            login.id,
            extensions
                .iter()
                .map(Extension::to_string)
                .collect::<Vec<String>>()
                .join(", ")
        );

        if let Some(job) = login.job {
            self.handle_job(job).await;
        }
    }

    async fn handle_notification(&self, method: &str, params: Value) -> Result {
        match method {
            METHOD_JOB => match serde_json::from_value::<JobParams>(params) {
                Ok(params) => self.handle_job(params).await,
                Err(err) => warn!("Failed to parse job notification: {err}"),
            },
            METHOD_SHOW_MESSAGE => {
                let text = match &params {
                    Value::Array(values) => values.first().cloned().unwrap_or_default(),
                    other => other.clone(),
                };

                match text {
                    Value::String(text) => info!("Message from pool: {text}"),
                    other => info!("Message from pool: {other}"),
                }
            }
            METHOD_RECONNECT => return self.handle_reconnect(params),
            _ => warn!("Unhandled method from pool: {method}"),
        }

        Ok(())
    }

    /// Ends the current connection. The next one goes to the address the pool
    /// named, after the wait it asked for.
    fn handle_reconnect(&self, params: Value) -> Result {
        let reconnect = match serde_json::from_value::<Reconnect>(params) {
            Ok(reconnect) => reconnect,
            Err(err) => {
                warn!("Ignoring invalid reconnect request: {err}");
                return Ok(());
            }
        };

        if let Some(address) = reconnect.address() {
            *self.address.lock() = address;
        }

        *self.reconnect_wait.lock() = Some(Duration::from_secs(reconnect.wait));

        info!("Pool requested reconnect to {} in {}s", self.address(), reconnect.wait);

        Err(ClientError::Disconnected {
            reason: DisconnectReason::Reconnect,
        })
    }

    async fn handle_job(&self, params: JobParams) {
        let nicehash = self.session.lock().nicehash;

        let job = match Job::parse(&params, self.config.algorithm, nicehash) {
            Ok(job) => job,
            Err(err) => {
                warn!("Dropping job {:?}: {err}", params.job_id);
                return;
            }
        };

        if job.nicehash {
            self.session.lock().nicehash = true;
        }

        *self.current_job.lock() = Some(job.id.clone());

        tokio::select! {
            _ = self.cancel.cancelled() => {
                debug!("Job {} dropped: shutting down", params.job_id);
            }
            sent = self.jobs.send(job) => {
                if sent.is_err() {
                    debug!("Job {} dropped: miner stopped", params.job_id);
                }
            }
        }
    }

    /// Write a share to the pool. A share that cannot be written is counted
    /// as failed here.
    pub async fn submit(&self, result: JobResult) -> Result {
        let (session_id, algo) = {
            let session = self.session.lock();
            (session.id.clone(), session.algo)
        };

        if self.state() != State::Active || session_id.is_empty() {
            self.stats.add_failed();
            return Err(ClientError::NotConnected);
        }

        let params = serde_json::to_value(result.submit(&session_id, algo))
            .context(error::SerializationSnafu)?;

        let id = self.next_id();
        let job_id = result.job.id.clone();

        self.pending.insert(id, Pending::new(Request::Submit(result)));

        if let Err(err) = self
            .send(&Message::Request {
                id: Id::Number(id),
                method: METHOD_SUBMIT.into(),
                params,
            })
            .await
        {
            if self.pending.remove(&id).is_some() {
                self.stats.add_failed();
            }
            return Err(err);
        }

        self.stats.add_submitted();

        debug!("Submitted share for job {job_id} as request {id}");

        Ok(())
    }

    /// Send `keepalived`. Not tracked as pending: pools may never reply, and
    /// a reply that does arrive is dropped as unmatched.
    pub async fn heartbeat(&self) -> Result {
        let session_id = self.session.lock().id.clone();

        let params = serde_json::to_value(Keepalive { id: session_id })
            .context(error::SerializationSnafu)?;

        self.send(&Message::Request {
            id: Id::Number(self.next_id()),
            method: METHOD_KEEPALIVED.into(),
            params,
        })
        .await
    }

    /// Drop requests that have waited longer than `max_age`. Expired shares
    /// count as failed.
    pub fn evict_expired(&self, max_age: Duration) -> usize {
        let mut evicted = 0;

        self.pending.retain(|id, pending| {
            if pending.sent.elapsed() <= max_age {
                return true;
            }

            evicted += 1;

            if let Request::Submit(result) = &pending.request {
                self.stats.add_failed();
                warn!(
                    "Share for job {} expired without reply (request {id})",
                    result.job.id
                );
            }

            false
        });

        evicted
    }
}

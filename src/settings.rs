use {super::*, clap::Args};

pub(crate) use mine_options::MineOptions;

mod mine_options;

/// TOML config file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub config: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,

    pub mine: Option<MineSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MineSection {
    pub stratum_endpoint: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub rig_id: Option<String>,
    pub algo: Option<Algorithm>,
    pub threads: Option<usize>,
    pub keepalive: Option<bool>,
    pub retry_pause: Option<u64>,
}

/// Resolved configuration: CLI flags, then `PICKAXE_*` environment
/// variables, then the config file, then defaults.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Settings {
    pub config: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,

    pub mine_stratum_endpoint: Option<String>,
    pub mine_username: Option<String>,
    pub mine_password: Option<String>,
    pub mine_rig_id: Option<String>,
    pub mine_algo: Option<Algorithm>,
    pub mine_threads: Option<usize>,
    pub mine_keepalive: bool,
    pub mine_retry_pause: Option<u64>,
}

impl Settings {
    pub fn load(options: Options) -> Result<Self> {
        let mut env = BTreeMap::<String, String>::new();

        for (var, value) in env::vars_os() {
            let Some(var) = var.to_str() else {
                continue;
            };

            let Some(key) = var.strip_prefix("PICKAXE_") else {
                continue;
            };

            env.insert(
                key.into(),
                value.into_string().map_err(|value| {
                    anyhow!(
                        "environment variable `{var}` not valid unicode: `{}`",
                        value.to_string_lossy()
                    )
                })?,
            );
        }

        Self::merge(options, env)
    }

    pub fn merge(options: Options, env: BTreeMap<String, String>) -> Result<Self> {
        let settings = Self::from_options(&options).or(Self::from_env(&env)?);

        let config = match Self::find_config_path(&settings) {
            Some(path) => toml::from_str(
                &fs::read_to_string(&path)
                    .with_context(|| format!("failed to open config file `{}`", path.display()))?,
            )
            .with_context(|| format!("failed to deserialize config file `{}`", path.display()))?,
            None => Config::default(),
        };

        let settings = settings.or(Self::from_config(&config)).or_defaults();

        settings.validate()?;

        Ok(settings)
    }

    fn find_config_path(settings: &Self) -> Option<PathBuf> {
        if let Some(path) = &settings.config {
            return Some(path.clone());
        }

        if let Some(dir) = &settings.config_dir {
            let path = dir.join("pickaxe.toml");
            if path.exists() {
                return Some(path);
            }
        }

        let path = dirs::config_dir()?.join("pickaxe").join("pickaxe.toml");

        path.exists().then_some(path)
    }

    pub fn from_options(options: &Options) -> Self {
        Self {
            config: options.config.clone(),
            config_dir: options.config_dir.clone(),
            ..Default::default()
        }
    }

    pub(crate) fn from_mine_options(options: &MineOptions) -> Self {
        Self {
            mine_stratum_endpoint: options.stratum_endpoint.clone(),
            mine_username: options.username.clone(),
            mine_password: options.password.clone(),
            mine_rig_id: options.rig_id.clone(),
            mine_algo: options.algo,
            mine_threads: options.threads,
            mine_keepalive: options.keepalive,
            mine_retry_pause: options.retry_pause,
            ..Default::default()
        }
    }

    /// Layer `mine` flags over already loaded settings and validate the
    /// result.
    pub(crate) fn with_mine_options(self, options: &MineOptions) -> Result<Self> {
        let settings = Self::from_mine_options(options).or(self);

        settings.validate()?;

        Ok(settings)
    }

    pub fn from_env(env: &BTreeMap<String, String>) -> Result<Self> {
        let get_bool = |key: &str| {
            env.get(key)
                .map(|value| !value.is_empty() && value != "0" && value.to_lowercase() != "false")
                .unwrap_or_default()
        };

        let get_string = |key: &str| env.get(key).cloned();

        let get_path = |key: &str| env.get(key).map(PathBuf::from);

        let get_algorithm = |key: &str| -> Result<Option<Algorithm>> {
            env.get(key)
                .map(|algorithm| algorithm.parse::<Algorithm>())
                .transpose()
                .with_context(|| {
                    format!("failed to parse environment variable PICKAXE_{key} as algorithm")
                })
        };

        let get_u64 = |key: &str| -> Result<Option<u64>> {
            env.get(key)
                .map(|int| int.parse::<u64>())
                .transpose()
                .with_context(|| {
                    format!("failed to parse environment variable PICKAXE_{key} as u64")
                })
        };

        let get_usize = |key: &str| -> Result<Option<usize>> {
            env.get(key)
                .map(|int| int.parse::<usize>())
                .transpose()
                .with_context(|| {
                    format!("failed to parse environment variable PICKAXE_{key} as usize")
                })
        };

        Ok(Self {
            config: get_path("CONFIG"),
            config_dir: get_path("CONFIG_DIR"),

            mine_stratum_endpoint: get_string("MINE_STRATUM_ENDPOINT"),
            mine_username: get_string("MINE_USERNAME"),
            mine_password: get_string("MINE_PASSWORD"),
            mine_rig_id: get_string("MINE_RIG_ID"),
            mine_algo: get_algorithm("MINE_ALGO")?,
            mine_threads: get_usize("MINE_THREADS")?,
            mine_keepalive: get_bool("MINE_KEEPALIVE"),
            mine_retry_pause: get_u64("MINE_RETRY_PAUSE")?,
        })
    }

    pub fn from_config(config: &Config) -> Self {
        let mine = config.mine.as_ref();

        Self {
            config: config.config.clone(),
            config_dir: config.config_dir.clone(),

            mine_stratum_endpoint: mine.and_then(|m| m.stratum_endpoint.clone()),
            mine_username: mine.and_then(|m| m.username.clone()),
            mine_password: mine.and_then(|m| m.password.clone()),
            mine_rig_id: mine.and_then(|m| m.rig_id.clone()),
            mine_algo: mine.and_then(|m| m.algo),
            mine_threads: mine.and_then(|m| m.threads),
            mine_keepalive: mine.and_then(|m| m.keepalive).unwrap_or(false),
            mine_retry_pause: mine.and_then(|m| m.retry_pause),
        }
    }

    /// Merge self with another Settings, self takes priority
    pub fn or(self, other: Self) -> Self {
        Self {
            config: self.config.or(other.config),
            config_dir: self.config_dir.or(other.config_dir),

            mine_stratum_endpoint: self.mine_stratum_endpoint.or(other.mine_stratum_endpoint),
            mine_username: self.mine_username.or(other.mine_username),
            mine_password: self.mine_password.or(other.mine_password),
            mine_rig_id: self.mine_rig_id.or(other.mine_rig_id),
            mine_algo: self.mine_algo.or(other.mine_algo),
            mine_threads: self.mine_threads.or(other.mine_threads),
            mine_keepalive: self.mine_keepalive || other.mine_keepalive,
            mine_retry_pause: self.mine_retry_pause.or(other.mine_retry_pause),
        }
    }

    fn or_defaults(self) -> Self {
        Self {
            config: None,
            config_dir: None,

            mine_password: Some(self.mine_password.unwrap_or_else(|| "x".into())),
            mine_retry_pause: Some(
                self.mine_retry_pause
                    .unwrap_or(DEFAULT_RETRY_PAUSE.as_secs()),
            ),
            ..self
        }
    }

    fn validate(&self) -> Result {
        ensure!(self.mine_threads != Some(0), "threads must be at least 1");

        ensure!(self.mine_retry_pause != Some(0), "retry pause must be at least 1 second");

        if let Some(username) = &self.mine_username {
            ensure!(!username.is_empty(), "username must not be empty");
        }

        if let Some(endpoint) = &self.mine_stratum_endpoint {
            ensure!(!endpoint.is_empty(), "stratum endpoint must not be empty");
        }

        Ok(())
    }

    pub fn stratum_endpoint(&self) -> Result<String> {
        self.mine_stratum_endpoint
            .as_deref()
            .map(stratum_endpoint)
            .context("no stratum endpoint configured")
    }

    pub fn username(&self) -> Result<String> {
        self.mine_username
            .clone()
            .context("no username configured")
    }

    pub fn password(&self) -> String {
        self.mine_password.clone().unwrap_or_else(|| "x".into())
    }

    pub fn rig_id(&self) -> Option<String> {
        self.mine_rig_id.clone()
    }

    pub fn algo(&self) -> Option<Algorithm> {
        self.mine_algo
    }

    pub fn threads(&self) -> Option<usize> {
        self.mine_threads
    }

    pub fn keepalive(&self) -> bool {
        self.mine_keepalive
    }

    pub fn retry_pause(&self) -> Duration {
        self.mine_retry_pause
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_RETRY_PAUSE)
    }

    pub fn client_config(&self) -> Result<ClientConfig> {
        Ok(ClientConfig {
            address: self.stratum_endpoint()?,
            username: self.username()?,
            password: self.password(),
            rig_id: self.rig_id(),
            algorithm: self.algo(),
            keepalive: self.keepalive(),
            retry_pause: self.retry_pause(),
            timeout: CONNECT_TIMEOUT,
        })
    }
}

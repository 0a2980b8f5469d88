use {super::*, settings::MineOptions, sysinfo::System};

#[derive(Debug, Parser)]
pub(crate) struct Mine {
    #[command(flatten)]
    pub(crate) options: MineOptions,
    #[arg(long, help = "Exit <ONCE> a share is accepted.")]
    pub(crate) once: bool,
}

impl Mine {
    pub(crate) async fn run(self, settings: Settings, cancel_token: CancellationToken) -> Result {
        let settings = settings.with_mine_options(&self.options)?;

        let config = settings.client_config()?;

        let mut system = System::new();
        system.refresh_cpu_all();
        let available_cpu_cores = system.cpus().len().max(1);

        let threads = settings.threads().unwrap_or(available_cpu_cores);

        info!(
            "Mining on {} as {} with {threads} threads ({available_cpu_cores} CPUs available)",
            config.address, config.username
        );

        if let Some(algorithm) = config.algorithm {
            info!("Default algorithm: {algorithm}");
        }

        let miner = Miner::new(
            config,
            Arc::new(Sha256dHasher),
            threads,
            self.once,
            cancel_token,
        )?;

        let totals = miner.run().await?;

        println!("{}", serde_json::to_string_pretty(&totals)?);

        Ok(())
    }
}

use super::*;

mod algorithms;
mod mine;

#[derive(Debug, Parser)]
pub(crate) enum Subcommand {
    #[command(about = "List supported algorithms")]
    Algorithms,
    #[command(about = "Mine on a pool")]
    Mine(mine::Mine),
}

impl Subcommand {
    pub(crate) async fn run(self, settings: Settings, cancel_token: CancellationToken) -> Result {
        match self {
            Self::Algorithms => algorithms::run(),
            Self::Mine(mine) => mine.run(settings, cancel_token).await,
        }
    }
}

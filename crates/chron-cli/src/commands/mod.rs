use chron_config::ChronConfig;

use crate::cli::{Commands, GlobalFlags};

pub mod config;
pub mod history;
pub mod open;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, config: &ChronConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::History(args) => history::handle(&args, config, flags).await,
        Commands::Open(args) => open::handle(&args, config, flags),
        Commands::Config => config::handle(config, flags),
    }
}

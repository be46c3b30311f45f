use chron_config::ChronConfig;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `chron config`.
pub fn handle(config: &ChronConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let shown = ChronConfig {
        timeline: config.timeline.clone(),
        dataverse: config.dataverse.redacted(),
    };
    output(&shown, flags.format)
}

use anyhow::Context;
use chron_config::ChronConfig;
use chron_timeline::{Navigator, UrlNavigator};
use serde::Serialize;

use crate::cli::{GlobalFlags, OpenArgs};
use crate::output::output;

#[derive(Debug, Serialize)]
struct OpenResponse<'a> {
    entity: &'a str,
    id: &'a str,
    url: String,
}

/// Handle `chron open`.
pub fn handle(args: &OpenArgs, config: &ChronConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let base_url = config
        .dataverse
        .base_url()
        .context("opening a record needs dataverse.client_url")?;
    let navigator = UrlNavigator::new(base_url);
    let reference = &args.reference;

    navigator.open_record(&reference.entity, &reference.id);

    output(
        &OpenResponse {
            entity: &reference.entity,
            id: &reference.id,
            url: navigator.record_url(&reference.entity, &reference.id),
        },
        flags.format,
    )
}

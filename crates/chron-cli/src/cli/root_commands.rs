use chron_core::EntityRef;
use chron_timeline::SortColumn;
use chrono::NaiveDate;
use clap::{Args, Subcommand};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Show the audit history timeline of a record.
    History(HistoryArgs),
    /// Open a record reference (`<entity>,<guid>`) in the browser.
    Open(OpenArgs),
    /// Print the effective configuration.
    Config,
}

#[derive(Clone, Debug, Args)]
pub struct HistoryArgs {
    /// Record id (braces are accepted).
    pub record_id: String,

    /// Logical name of the record's entity; enables friendly field labels.
    #[arg(short, long)]
    pub entity: Option<String>,

    /// Number of pages to load (first page plus "load more").
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Records per page (overrides `timeline.page_size`).
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Only show these fields (by label). Repeatable.
    #[arg(long = "field")]
    pub fields: Vec<String>,

    /// Only changes on or after this day (YYYY-MM-DD).
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only changes on or before this day (YYYY-MM-DD).
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Sort column: operation, date, user, field, old, new.
    #[arg(long)]
    pub sort: Option<SortColumn>,

    /// Sort descending.
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

#[derive(Clone, Debug, Args)]
pub struct OpenArgs {
    /// Record reference, e.g. `contact,{3fa85f64-5717-4562-b3fc-2c963f66afa6}`.
    pub reference: EntityRef,
}

//! Timeline view model: filtering, sorting and value formatting over rows.
//!
//! Pure functions. Nothing here renders; the CLI and any other front end
//! build their output from what these return.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::str::FromStr;

use chron_core::AuditRow;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Number of selected fields listed by name before collapsing to `+N`.
const SUMMARY_PREVIEW: usize = 3;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Best-effort timestamp for a host-formatted date. Offsets are folded into
/// UTC; everything else is read as wall-clock time.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_utc());
    }
    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// Trim a value and drop a trailing midnight time (`T00:00`, ` 00:00:00.000Z`,
/// `T00:00:00+02:00`, …) so date-only values display as dates.
#[must_use]
pub fn format_audit_value(raw: &str) -> String {
    let trimmed = raw.trim();
    match strip_midnight(trimmed) {
        Some(date) if !date.trim().is_empty() => date.trim().to_string(),
        _ => trimmed.to_string(),
    }
}

fn strip_midnight(value: &str) -> Option<&str> {
    let mut rest = value.strip_suffix('Z').unwrap_or(value);
    if rest.len() == value.len() && has_offset_suffix(rest) {
        rest = &rest[..rest.len() - 6];
    }

    let mut with_fraction = false;
    if let Some((head, fraction)) = rest.rsplit_once('.')
        && !fraction.is_empty()
        && fraction.bytes().all(|b| b == b'0')
    {
        rest = head;
        with_fraction = true;
    }

    let candidates: &[&str] = if with_fraction {
        &["00:00:00"]
    } else {
        &["00:00:00", "00:00"]
    };
    candidates.iter().find_map(|time| {
        let head = rest.strip_suffix(time)?;
        let date = head
            .strip_suffix('T')
            .or_else(|| head.strip_suffix(char::is_whitespace))?;
        Some(date)
    })
}

/// `[+-]HH:MM` at the end of `value`.
fn has_offset_suffix(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() < 6 {
        return false;
    }
    let tail = &bytes[bytes.len() - 6..];
    matches!(tail[0], b'+' | b'-')
        && tail[1].is_ascii_digit()
        && tail[2].is_ascii_digit()
        && tail[3] == b':'
        && tail[4].is_ascii_digit()
        && tail[5].is_ascii_digit()
}

/// Distinct field labels across all rows, sorted case-insensitively.
#[must_use]
pub fn field_options(rows: &[AuditRow]) -> Vec<String> {
    let distinct: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| &row.changes)
        .map(|change| change.field.as_str())
        .filter(|field| !field.is_empty())
        .collect();
    let mut options: Vec<String> = distinct.into_iter().map(ToString::to_string).collect();
    options.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    options
}

/// Options containing `query`, case-insensitively. A blank query keeps all.
#[must_use]
pub fn filter_field_options(options: &[String], query: &str) -> Vec<String> {
    let query = query.trim().to_lowercase();
    options
        .iter()
        .filter(|option| query.is_empty() || option.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Field and date-range filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineFilter {
    /// Selected field labels; empty means all fields.
    pub fields: BTreeSet<String>,
    /// Inclusive lower bound, from the start of the day.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound, to the end of the day.
    pub to: Option<NaiveDate>,
}

impl TimelineFilter {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.from.is_none() && self.to.is_none()
    }

    fn admits_date(&self, created_on: &str) -> bool {
        if self.from.is_none() && self.to.is_none() {
            return true;
        }
        // Rows whose date cannot be read are never hidden by a date bound.
        let Some(at) = parse_timestamp(created_on) else {
            return true;
        };
        let after_start = self.from.is_none_or(|from| at >= from.and_time(NaiveTime::MIN));
        let before_end = self.to.is_none_or(|to| {
            to.and_hms_opt(23, 59, 59)
                .is_none_or(|end| at <= end)
        });
        after_start && before_end
    }
}

/// Apply `filter` to `rows`.
///
/// With fields selected, each row keeps only the matching change lines and
/// rows left without any are dropped.
#[must_use]
pub fn apply_filter(rows: &[AuditRow], filter: &TimelineFilter) -> Vec<AuditRow> {
    rows.iter()
        .filter_map(|row| {
            let mut row = row.clone();
            if !filter.fields.is_empty() {
                row.changes.retain(|c| filter.fields.contains(&c.field));
                if row.changes.is_empty() {
                    return None;
                }
            }
            filter.admits_date(&row.created_on).then_some(row)
        })
        .collect()
}

/// Short description of the field selection.
#[must_use]
pub fn selected_fields_summary(options: &[String], selected: &BTreeSet<String>) -> String {
    if selected.is_empty() {
        return "All fields".to_string();
    }
    let ordered: Vec<&str> = options
        .iter()
        .filter(|option| selected.contains(*option))
        .map(String::as_str)
        .collect();
    match ordered.len() {
        0 => "Filtered fields".to_string(),
        n if n <= SUMMARY_PREVIEW => ordered.join(", "),
        n => format!("{} +{}", ordered[..SUMMARY_PREVIEW].join(", "), n - SUMMARY_PREVIEW),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Operation,
    CreatedOn,
    User,
    Field,
    OldValue,
    NewValue,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "operation" | "op" => Ok(Self::Operation),
            "created-on" | "createdon" | "date" => Ok(Self::CreatedOn),
            "user" => Ok(Self::User),
            "field" => Ok(Self::Field),
            "old" | "old-value" => Ok(Self::OldValue),
            "new" | "new-value" => Ok(Self::NewValue),
            other => Err(format!(
                "unknown sort column '{other}' (expected operation, date, user, field, old or new)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Stable sort of `rows` by `column`. Empty or unreadable values sort last in
/// either direction.
pub fn sort_rows(rows: &mut [AuditRow], column: SortColumn, direction: SortDirection) {
    rows.sort_by(|a, b| compare_rows(a, b, column, direction));
}

fn compare_rows(a: &AuditRow, b: &AuditRow, column: SortColumn, direction: SortDirection) -> Ordering {
    match column {
        SortColumn::Operation => compare_text(&a.operation, &b.operation, direction),
        SortColumn::CreatedOn => compare_dates(&a.created_on, &b.created_on, direction),
        SortColumn::User => compare_text(&a.user, &b.user, direction),
        SortColumn::Field => compare_text(first_field(a), first_field(b), direction),
        SortColumn::OldValue => compare_text(
            &format_audit_value(a.changes.first().map_or("", |c| &c.old_value)),
            &format_audit_value(b.changes.first().map_or("", |c| &c.old_value)),
            direction,
        ),
        SortColumn::NewValue => compare_text(
            &format_audit_value(a.changes.first().map_or("", |c| &c.new_value)),
            &format_audit_value(b.changes.first().map_or("", |c| &c.new_value)),
            direction,
        ),
    }
}

fn first_field(row: &AuditRow) -> &str {
    row.changes.first().map_or("", |c| c.field.as_str())
}

fn directed(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

/// Missing values last, otherwise `present` in the requested direction.
fn compare_present<T>(a: Option<T>, b: Option<T>, direction: SortDirection, present: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => directed(present(a, b), direction),
    }
}

fn compare_text(a: &str, b: &str, direction: SortDirection) -> Ordering {
    let a = Some(a.trim()).filter(|s| !s.is_empty());
    let b = Some(b.trim()).filter(|s| !s.is_empty());
    compare_present(a, b, direction, natural_cmp)
}

fn compare_dates(a: &str, b: &str, direction: SortDirection) -> Ordering {
    compare_present(parse_timestamp(a), parse_timestamp(b), direction, |a, b| a.cmp(&b))
}

/// Case-insensitive comparison where digit runs compare by numeric value, so
/// `item 2` sorts before `item 10`.
#[must_use]
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ordering = compare_chunk(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

fn compare_chunk(a: &str, b: &str) -> Ordering {
    let a_digits = a.bytes().all(|c| c.is_ascii_digit());
    let b_digits = b.bytes().all(|c| c.is_ascii_digit());
    match (a_digits, b_digits) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Alternating runs of ASCII digits and everything else.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    const fn new(value: &'a str) -> Self {
        Self { rest: value }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map_or(self.rest.len(), |(i, _)| i);
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// Visual category of an operation label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationAccent {
    Create,
    Update,
    Delete,
    Other,
    None,
}

#[must_use]
pub fn operation_accent(operation: &str) -> OperationAccent {
    if operation.is_empty() {
        return OperationAccent::None;
    }
    let normalized = operation.to_lowercase();
    if normalized.contains("create") {
        OperationAccent::Create
    } else if normalized.contains("update") {
        OperationAccent::Update
    } else if normalized.contains("delete") {
        OperationAccent::Delete
    } else {
        OperationAccent::Other
    }
}

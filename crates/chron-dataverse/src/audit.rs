//! Audit log queries.

use chron_core::{AuditPage, AuditSource, RawAuditRecord, ToText};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{DataverseClient, error::DataverseError};

const FORMATTED_SUFFIX: &str = "@OData.Community.Display.V1.FormattedValue";

#[derive(Debug, Deserialize)]
struct ODataCollection {
    #[serde(default)]
    value: Vec<Map<String, Value>>,
    #[serde(rename = "@odata.nextLink", default)]
    next_link: Option<String>,
}

/// Formatted annotation for `field` when present, else the raw value.
fn formatted_or_raw<'a>(record: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    record
        .get(&format!("{field}{FORMATTED_SUFFIX}"))
        .filter(|v| !v.is_null())
        .or_else(|| record.get(field))
}

fn to_raw_record(mut record: Map<String, Value>) -> RawAuditRecord {
    RawAuditRecord {
        audit_id: record.get("auditid").to_text(),
        operation: formatted_or_raw(&record, "operation").to_text(),
        created_on: formatted_or_raw(&record, "createdon").to_text(),
        user: formatted_or_raw(&record, "_userid_value").to_text(),
        attribute_mask: record.get("attributemask").to_text(),
        change_data: record.remove("changedata"),
    }
}

fn to_page(collection: ODataCollection) -> AuditPage {
    AuditPage {
        records: collection.value.into_iter().map(to_raw_record).collect(),
        next_link: collection.next_link,
    }
}

impl AuditSource for DataverseClient {
    type Error = DataverseError;

    async fn retrieve_multiple(&self, entity: &str, query: &str) -> Result<AuditPage, DataverseError> {
        let set = self.entity_set_name(entity).await?;
        let collection: ODataCollection = self.get_json(&format!("/{set}{query}")).await?;
        let page = to_page(collection);
        tracing::debug!(
            entity,
            records = page.records.len(),
            has_more = page.next_link.is_some(),
            "audit page retrieved"
        );
        Ok(page)
    }
}

//! Single-field record lookups.

use chron_core::RecordSource;
use serde_json::{Map, Value};

use crate::{DataverseClient, error::DataverseError};

/// `/{set}({id})?$select={field}`
fn record_path(entity_set: &str, id: &str, field: &str) -> String {
    format!("/{entity_set}({id})?$select={}", urlencoding::encode(field))
}

fn field_value(mut record: Map<String, Value>, field: &str) -> Option<Value> {
    record.remove(field).filter(|v| !v.is_null())
}

impl RecordSource for DataverseClient {
    type Error = DataverseError;

    async fn retrieve_field(
        &self,
        entity: &str,
        id: &str,
        field: &str,
    ) -> Result<Option<Value>, DataverseError> {
        let set = self.entity_set_name(entity).await?;
        let record: Map<String, Value> = self.get_json(&record_path(&set, id, field)).await?;
        Ok(field_value(record, field))
    }
}

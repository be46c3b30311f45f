//! Entity metadata: primary name attributes, entity sets and attribute labels.

use std::collections::{BTreeSet, HashMap};

use chron_core::{MetadataSource, UNKNOWN_FIELD};
use serde::Deserialize;

use crate::{DataverseClient, error::DataverseError, odata_literal};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct EntityDefinition {
    #[serde(default)]
    pub entity_set_name: Option<String>,
    #[serde(default)]
    pub primary_name_attribute: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttributeList {
    #[serde(default)]
    value: Vec<AttributeMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AttributeMetadata {
    logical_name: Option<String>,
    display_name: Option<DisplayName>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DisplayName {
    user_localized_label: Option<LocalizedLabel>,
    #[serde(default)]
    localized_labels: Vec<LocalizedLabel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LocalizedLabel {
    label: Option<String>,
}

impl AttributeMetadata {
    /// User label, else first localized label, else the logical name.
    fn label(&self, logical: &str) -> String {
        self.display_name
            .as_ref()
            .and_then(|d| {
                d.user_localized_label
                    .as_ref()
                    .and_then(|l| l.label.clone())
                    .or_else(|| d.localized_labels.first().and_then(|l| l.label.clone()))
            })
            .unwrap_or_else(|| logical.to_string())
    }
}

/// `/EntityDefinitions(LogicalName='x')?$select=...`
pub(crate) fn entity_definition_path(entity: &str, select: &str) -> String {
    format!(
        "/EntityDefinitions(LogicalName={})?$select={select}",
        odata_literal(entity)
    )
}

/// Distinct, non-empty names without the unknown-field sentinel, sorted.
fn label_request_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|n| !n.is_empty() && n.as_str() != UNKNOWN_FIELD)
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Attribute metadata path filtered to `names` (must be non-empty).
fn attribute_labels_path(entity: &str, names: &[String]) -> String {
    let filter = names
        .iter()
        .map(|n| format!("LogicalName eq {}", odata_literal(n)))
        .collect::<Vec<_>>()
        .join(" or ");
    format!(
        "/EntityDefinitions(LogicalName={})/Attributes?$select=LogicalName,DisplayName&$filter={}",
        odata_literal(entity),
        urlencoding::encode(&filter)
    )
}

fn labels_from_response(list: AttributeList, requested: &[String]) -> HashMap<String, String> {
    let mut labels: HashMap<String, String> = list
        .value
        .into_iter()
        .filter_map(|a| {
            let logical = a.logical_name.clone()?;
            Some((logical.clone(), a.label(&logical)))
        })
        .collect();

    for name in requested {
        labels
            .entry(name.clone())
            .or_insert_with(|| name.clone());
    }
    labels
}

impl MetadataSource for DataverseClient {
    type Error = DataverseError;

    async fn primary_name_attribute(&self, entity: &str) -> Result<Option<String>, DataverseError> {
        let result: Result<EntityDefinition, _> = self
            .get_json(&entity_definition_path(entity, "PrimaryNameAttribute"))
            .await;

        match result {
            Ok(definition) => Ok(definition.primary_name_attribute.filter(|p| !p.is_empty())),
            // Entities without readable metadata simply have no display attribute.
            Err(DataverseError::Api { status, message }) => {
                tracing::debug!(entity, status, %message, "no primary name attribute");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn attribute_labels(
        &self,
        entity: &str,
        names: &[String],
    ) -> Result<HashMap<String, String>, DataverseError> {
        let requested = label_request_names(names);
        if requested.is_empty() {
            return Ok(HashMap::new());
        }

        let list: AttributeList = self
            .get_json(&attribute_labels_path(entity, &requested))
            .await?;
        Ok(labels_from_response(list, &requested))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const ATTRIBUTES_FIXTURE: &str = r#"{
        "@odata.context": "https://contoso.crm.dynamics.com/api/data/v9.2/$metadata#EntityDefinitions('account')/Attributes(LogicalName,DisplayName)",
        "value": [
            {
                "LogicalName": "name",
                "DisplayName": {
                    "LocalizedLabels": [{ "Label": "Account Name", "LanguageCode": 1033 }],
                    "UserLocalizedLabel": { "Label": "Account Name", "LanguageCode": 1033 }
                }
            },
            {
                "LogicalName": "telephone1",
                "DisplayName": {
                    "LocalizedLabels": [{ "Label": "Main Phone", "LanguageCode": 1033 }],
                    "UserLocalizedLabel": null
                }
            },
            {
                "LogicalName": "new_flag",
                "DisplayName": { "LocalizedLabels": [], "UserLocalizedLabel": null }
            }
        ]
    }"#;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn labels_prefer_user_label_then_localized_then_logical() {
        let list: AttributeList = serde_json::from_str(ATTRIBUTES_FIXTURE).unwrap();
        let requested = names(&["name", "new_flag", "telephone1", "missing"]);
        let labels = labels_from_response(list, &requested);

        assert_eq!(labels["name"], "Account Name");
        assert_eq!(labels["telephone1"], "Main Phone");
        assert_eq!(labels["new_flag"], "new_flag");
        assert_eq!(labels["missing"], "missing");
    }

    #[test]
    fn request_names_are_deduplicated_and_exclude_sentinel() {
        let requested = label_request_names(&names(&["b", "a", "", UNKNOWN_FIELD, "b"]));
        assert_eq!(requested, names(&["a", "b"]));
    }

    #[test]
    fn attribute_path_encodes_filter() {
        let path = attribute_labels_path("account", &names(&["name", "o'x"]));
        assert!(path.starts_with(
            "/EntityDefinitions(LogicalName='account')/Attributes?$select=LogicalName,DisplayName&$filter="
        ));
        assert!(path.ends_with("LogicalName%20eq%20%27name%27%20or%20LogicalName%20eq%20%27o%27%27x%27"));
    }

    #[test]
    fn entity_definition_parses() {
        let def: EntityDefinition = serde_json::from_str(
            r#"{"PrimaryNameAttribute":"fullname","EntitySetName":"contacts","MetadataId":"x"}"#,
        )
        .unwrap();
        assert_eq!(def.primary_name_attribute.as_deref(), Some("fullname"));
        assert_eq!(def.entity_set_name.as_deref(), Some("contacts"));
        assert_eq!(
            entity_definition_path("contact", "EntitySetName"),
            "/EntityDefinitions(LogicalName='contact')?$select=EntitySetName"
        );
    }
}

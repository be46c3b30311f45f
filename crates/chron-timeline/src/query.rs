//! Audit query strings.

use url::Url;

/// Logical name of the audit entity.
pub const AUDIT_ENTITY: &str = "audit";

const SELECT_WITH_CHANGES: &str = "auditid,changedata,_userid_value,createdon,attributemask,operation";
const SELECT_WITHOUT_CHANGES: &str = "auditid,_userid_value,createdon,attributemask,operation";

/// First-page audit query for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditQuery {
    pub record_id: String,
    pub page_size: u32,
    pub include_change_data: bool,
}

impl AuditQuery {
    /// `?$select=…&$filter=_objectid_value eq {id}&$orderby=createdon desc&$top={n}`
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let select = if self.include_change_data {
            SELECT_WITH_CHANGES
        } else {
            SELECT_WITHOUT_CHANGES
        };
        format!(
            "?$select={select}&$filter=_objectid_value eq {}&$orderby=createdon desc&$top={}",
            self.record_id, self.page_size
        )
    }
}

/// Query portion of a host continuation link.
///
/// Links that parse as absolute URLs yield their query string (empty when
/// there is none). Anything else yields the substring from the first `?`, or
/// the whole link when it has none.
#[must_use]
pub fn continuation_query(next_link: &str) -> String {
    if let Ok(url) = Url::parse(next_link) {
        return url
            .query()
            .filter(|query| !query.is_empty())
            .map(|query| format!("?{query}"))
            .unwrap_or_default();
    }
    next_link
        .find('?')
        .map_or_else(|| next_link.to_string(), |idx| next_link[idx..].to_string())
}

//! Navigation bridge: opening a referenced record.

/// Opens a record in the host application.
///
/// Implementations must not fail outward; errors are logged.
pub trait Navigator: Send + Sync {
    fn open_record(&self, entity: &str, id: &str);
}

/// Opens records in the system browser through the classic record form URL.
#[derive(Debug, Clone)]
pub struct UrlNavigator {
    client_url: String,
}

impl UrlNavigator {
    #[must_use]
    pub fn new(client_url: impl Into<String>) -> Self {
        let client_url: String = client_url.into();
        Self {
            client_url: client_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{client_url}/main.aspx?etn={entity}&id={id}&pagetype=entityrecord`
    #[must_use]
    pub fn record_url(&self, entity: &str, id: &str) -> String {
        format!(
            "{}/main.aspx?etn={}&id={}&pagetype=entityrecord",
            self.client_url,
            urlencoding::encode(entity),
            urlencoding::encode(id)
        )
    }
}

impl Navigator for UrlNavigator {
    fn open_record(&self, entity: &str, id: &str) {
        let url = self.record_url(entity, id);
        tracing::info!(entity, id, %url, "opening record");
        if let Err(error) = open::that(&url) {
            tracing::warn!(%url, %error, "failed to open browser");
        }
    }
}

/// Navigator used when no host URL is known: records the request only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn open_record(&self, entity: &str, id: &str) {
        tracing::warn!(entity, id, "no navigation target configured, record not opened");
    }
}

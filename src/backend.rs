use std::sync::Arc;

use crate::store::DocumentStore;

/// Document store kinds that can be selected via DSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    OpenSearch,
}

/// Store configuration parsed from a DSN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDsn {
    pub kind: StoreKind,
    /// HTTP base URL of the cluster.
    pub base_url: String,
    pub index: String,
}

/// Parse a store DSN.
///
/// Examples:
/// - "opensearch://127.0.0.1:9200/logs"
/// - "opensearch://https://search.internal:9200/audit"
pub fn parse_store_dsn(dsn: &str) -> Result<StoreDsn, DsnError> {
    let lower = dsn.to_ascii_lowercase();
    if !lower.starts_with("opensearch://") {
        return Err(DsnError::UnknownScheme);
    }

    let without_scheme = &dsn["opensearch://".len()..];
    let (base, index) = match without_scheme.rsplit_once('/') {
        Some((base, index)) if !base.ends_with(':') && !base.ends_with('/') => (base, index),
        _ => (without_scheme, ""),
    };
    if base.is_empty() {
        return Err(DsnError::MissingHost);
    }

    let base_url = if base.starts_with("http://") || base.starts_with("https://") {
        base.to_string()
    } else {
        format!("http://{}", base)
    };
    let index = if index.is_empty() { "logs" } else { index };

    Ok(StoreDsn {
        kind: StoreKind::OpenSearch,
        base_url,
        index: index.to_string(),
    })
}

/// Error type returned when parsing a DSN.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum DsnError {
    #[error("unknown or unsupported DSN scheme")]
    UnknownScheme,

    #[error("DSN has no host")]
    MissingHost,
}

/// Error type returned when building a store from a DSN.
#[derive(thiserror::Error, Debug)]
pub enum BackendBuildError {
    #[error(transparent)]
    Dsn(#[from] DsnError),

    #[error("transport feature is not enabled")]
    TransportFeatureDisabled,
}

/// Create a concrete [`DocumentStore`] from a DSN string.
pub fn make_store_from_dsn(dsn: &str) -> Result<Arc<dyn DocumentStore>, BackendBuildError> {
    let parsed = parse_store_dsn(dsn)?;
    match parsed.kind {
        StoreKind::OpenSearch => {
            #[cfg(feature = "transport")]
            {
                use crate::opensearch::OpenSearchStore;
                let store = OpenSearchStore::new(parsed.base_url, parsed.index);
                Ok(Arc::new(store) as Arc<dyn DocumentStore>)
            }

            #[cfg(not(feature = "transport"))]
            {
                let _ = parsed;
                Err(BackendBuildError::TransportFeatureDisabled)
            }
        }
    }
}

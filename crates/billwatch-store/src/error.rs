use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("bill store not found: {0}")]
    Missing(PathBuf),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to replace {path}: {source}")]
    Persist {
        path: PathBuf,
        source: std::io::Error,
    },
}

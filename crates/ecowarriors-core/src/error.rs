//! Error types surfaced at the API edges of the runtime.
//!
//! Inside the frame loop these are logged and swallowed; they only reach a
//! caller from config loading, store opening helpers and snapshot
//! import/export.

/// Failures reading or writing the persisted record or a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Valid JSON that is not a save record at all.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// Snapshot written by a different format version. No migration exists.
    #[error("save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// Failures loading a [`GameConfig`](crate::config::GameConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Rejected `update_setting` calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingError {
    #[error("unknown settings category: {0}")]
    UnknownCategory(String),

    #[error("unknown setting {category}.{key}")]
    UnknownKey { category: String, key: String },

    #[error("invalid value for {category}.{key}: {reason}")]
    TypeMismatch {
        category: String,
        key: String,
        reason: String,
    },
}

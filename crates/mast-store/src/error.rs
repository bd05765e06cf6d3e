use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("store mutex poisoned")]
    Poisoned,

    #[error("corrupt value in column {column}: {value}")]
    Corrupt {
        column: &'static str,
        value: String,
    },
}

impl StoreError {
    pub fn corrupt(column: &'static str, value: impl Into<String>) -> Self {
        StoreError::Corrupt {
            column,
            value: value.into(),
        }
    }
}

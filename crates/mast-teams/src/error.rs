use thiserror::Error;

#[derive(Error, Debug)]
pub enum TeamsError {
    #[error("exchange error: {0}")]
    Exchange(String),

    #[error("store error: {0}")]
    Store(#[from] mast_store::StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

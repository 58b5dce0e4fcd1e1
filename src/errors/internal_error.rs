use thiserror::Error;

#[derive(Error, Debug)]
pub enum InternalError {
    #[error("Refused to sign a storage URL for an empty object key")]
    EmptyObjectKeyError,

    #[error("Failed to reach object storage at {endpoint:?}")]
    StorageRequestError { endpoint: String },

    #[error("Failed to issue session token for user {user_id}")]
    IssueSessionError { user_id: i64 },
}

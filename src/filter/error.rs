use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid column name: {0}")]
    InvalidColumn(String),

    #[error("Invalid limit: {0}")]
    InvalidLimit(String),

    #[error("Invalid offset: {0}")]
    InvalidOffset(String),
}

impl From<FilterError> for crate::error::ApiError {
    fn from(err: FilterError) -> Self {
        match err {
            // Column names are fixed in code; a bad one is a programming error
            FilterError::InvalidColumn(_) => crate::error::ApiError::internal(err),
            FilterError::InvalidLimit(msg) => crate::error::ApiError::field_error("limit", msg),
            FilterError::InvalidOffset(msg) => crate::error::ApiError::field_error("offset", msg),
        }
    }
}

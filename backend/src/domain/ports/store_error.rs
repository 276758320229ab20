//! Error type shared by every persistence port.

use super::define_port_error;

define_port_error! {
    /// Failures surfaced by store adapters.
    pub enum StoreError {
        /// The store could not be reached or the checkout timed out.
        Connection { message: String } => "store connection failed: {message}",
        /// A query or mutation failed while executing.
        Query { message: String } => "store query failed: {message}",
        /// A unique constraint rejected the write.
        Conflict { constraint: String } => "unique constraint violated: {constraint}",
    }
}

impl StoreError {
    /// Whether the identical call may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl From<StoreError> for crate::domain::Error {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Connection { message } => {
                Self::service_unavailable(format!("store unavailable: {message}"))
            }
            StoreError::Query { message } => Self::internal(format!("store error: {message}")),
            StoreError::Conflict { constraint } => {
                Self::conflict(format!("conflicting write on {constraint}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(StoreError::connection("refused"), ErrorCode::ServiceUnavailable, true)]
    #[case(StoreError::query("syntax"), ErrorCode::InternalError, false)]
    #[case(StoreError::conflict("item_votes_pkey"), ErrorCode::Conflict, false)]
    fn maps_to_domain_codes(
        #[case] error: StoreError,
        #[case] expected: ErrorCode,
        #[case] transient: bool,
    ) {
        assert_eq!(error.is_transient(), transient);
        assert_eq!(crate::domain::Error::from(error).code(), expected);
    }
}

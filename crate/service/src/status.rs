use strum_macros::{Display, EnumIter};

use crate::error::{ServiceError, result::ServiceResult};

/// Result codes returned across the trust boundary.
///
/// The numeric values are part of the calling convention and must not be
/// reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[repr(u32)]
pub enum Status {
    Success = 0,
    ResourceExhausted = 1,
    InvalidHandle = 2,
    InvalidKeyId = 3,
    InvalidKeyType = 4,
    InvalidAlgorithm = 5,
    BufferTooSmall = 6,
    InvalidSignature = 7,
    BadState = 8,
    UnsupportedAlgorithm = 9,
    SlotInUse = 10,
    InvalidKeyData = 11,
    InvalidPadding = 12,
    NotPermitted = 13,
    BadParameters = 14,
    GenericError = 15,
}

impl Status {
    /// Collapse the result of an entry point into its boundary status.
    #[must_use]
    pub fn of<T>(result: &ServiceResult<T>) -> Self {
        result.as_ref().map_or_else(ServiceError::status, |_| Self::Success)
    }
}

impl From<Status> for u32 {
    fn from(status: Status) -> Self {
        status as Self
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use strum::IntoEnumIterator;

    use super::Status;
    use crate::error::ServiceError;

    #[test]
    fn test_status_codes_are_distinct() {
        let codes: HashSet<u32> = Status::iter().map(u32::from).collect();
        assert_eq!(codes.len(), Status::iter().count());
        assert_eq!(u32::from(Status::Success), 0);
    }

    #[test]
    fn test_status_of_result() {
        let ok: Result<usize, ServiceError> = Ok(3);
        assert_eq!(Status::of(&ok), Status::Success);
        let err: Result<(), ServiceError> = Err(ServiceError::InvalidHandle(0));
        assert_eq!(Status::of(&err), Status::InvalidHandle);
        assert_eq!(Status::InvalidSignature.to_string(), "InvalidSignature");
    }
}

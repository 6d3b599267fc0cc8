use std::fmt::Display;

use crate::error::ServiceError;

pub type ServiceResult<R> = Result<R, ServiceError>;

/// Attach a description of what was being configured to a foreign error.
///
/// The resulting error is always a [`ServiceError::Config`].
pub trait ServiceResultHelper<T> {
    fn config_context(self, context: &str) -> ServiceResult<T>;
    fn with_config_context<D, O>(self, op: O) -> ServiceResult<T>
    where
        D: Display,
        O: FnOnce() -> D;
}

impl<T, E> ServiceResultHelper<T> for Result<T, E>
where
    E: std::error::Error,
{
    fn config_context(self, context: &str) -> ServiceResult<T> {
        self.map_err(|e| ServiceError::Config(format!("{context}: {e}")))
    }

    fn with_config_context<D, O>(self, op: O) -> ServiceResult<T>
    where
        D: Display,
        O: FnOnce() -> D,
    {
        self.map_err(|e| ServiceError::Config(format!("{}: {e}", op())))
    }
}

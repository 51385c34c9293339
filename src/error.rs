use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed underlying-fault type carried as an error source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured error detail parsed from a service error body.
///
/// `None` at the call sites that produce it means the service returned no
/// structured body, or the injected parser could not find one.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedErrorInfo {
    pub error_code: String,
    pub details: BTreeMap<String, String>,
}

impl ExtendedErrorInfo {
    pub fn new(error_code: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_detail(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(name.into(), value.into());
        self
    }
}

/// The evolving result of one logical operation across physical attempts.
///
/// The translator mutates this in place each time a failure is observed, so
/// the final error reported to the caller always reflects the last attempt.
#[derive(Debug, Default)]
pub struct RequestContext {
    pub http_status_code: Option<u16>,
    pub extended_error_info: Option<ExtendedErrorInfo>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// The one error shape callers of the execution layer see, regardless of
/// which failure path produced it.
#[derive(Debug, Error)]
#[error("storage request failed (status {}): {message}", display_status(.http_status_code))]
pub struct StorageError {
    pub http_status_code: Option<u16>,
    pub message: String,
    pub extended_error_info: Option<ExtendedErrorInfo>,
    /// `false` only for client-contract violations, which recur identically
    /// on retry. Everything else is the retry policy's call.
    pub is_retryable: bool,
    #[source]
    pub source: Option<BoxError>,
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "unknown".to_owned(),
    }
}

impl StorageError {
    /// Builds a retryable error from the execution context's current state.
    pub fn from_context(
        context: &RequestContext,
        message: impl Into<String>,
        source: Option<BoxError>,
    ) -> Self {
        Self {
            http_status_code: context.http_status_code,
            message: message.into(),
            extended_error_info: context.extended_error_info.clone(),
            is_retryable: true,
            source,
        }
    }

    /// The parsed service error code when structured info was obtained,
    /// otherwise the underlying fault's message text.
    pub fn error_code(&self) -> &str {
        match &self.extended_error_info {
            Some(info) => &info.error_code,
            None => &self.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExtendedErrorInfo, RequestContext, StorageError};

    #[test]
    fn from_context_snapshots_status_and_extended_info() {
        let mut context = RequestContext::new();
        context.http_status_code = Some(409);
        context.extended_error_info =
            Some(ExtendedErrorInfo::new("EntityAlreadyExists").with_detail("message", "conflict"));

        let error = StorageError::from_context(&context, "operation failed", None);

        assert_eq!(error.http_status_code, Some(409));
        assert!(error.is_retryable);
        assert_eq!(error.error_code(), "EntityAlreadyExists");
    }

    #[test]
    fn error_code_falls_back_to_message_without_extended_info() {
        let error = StorageError::from_context(&RequestContext::new(), "boom", None);
        assert_eq!(error.error_code(), "boom");
    }

    #[test]
    fn display_includes_status_and_message() {
        let mut context = RequestContext::new();
        context.http_status_code = Some(404);
        let error = StorageError::from_context(&context, "not found", None);
        assert_eq!(
            error.to_string(),
            "storage request failed (status 404): not found"
        );
    }
}

use http::HeaderMap;
use thiserror::Error;
use tracing::warn;

use crate::error::{BoxError, ExtendedErrorInfo, RequestContext, StorageError};

/// One sub-operation's outcome inside a batch, or the sole outcome of a
/// single-item query.
#[derive(Clone, Debug)]
pub struct OperationResponse {
    pub http_status_code: u16,
    pub headers: HeaderMap,
}

impl OperationResponse {
    pub fn new(http_status_code: u16, headers: HeaderMap) -> Self {
        Self {
            http_status_code,
            headers,
        }
    }
}

/// A failed batch of operations executed as one atomic group.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BatchFault {
    pub batch_status_code: u16,
    /// Sub-operation outcomes in the batch's original order.
    pub operations: Vec<OperationResponse>,
    pub message: String,
    /// The extracted inner failure text, fed to the error-body parser as a
    /// fresh in-memory UTF-8 byte slice.
    pub error_body: String,
}

/// A failed single-item query.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SingleQueryFault {
    pub response: OperationResponse,
    pub message: String,
    pub error_body: String,
}

/// A client-side type/schema mismatch surfaced by the query-projection
/// layer. Recurs identically on retry, so it translates as non-retryable.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ContractViolation {
    pub message: String,
}

impl ContractViolation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure shapes the query/execution layer can surface, classified at that
/// boundary so translation is a total match instead of type probing.
#[derive(Debug, Error)]
pub enum QueryFault {
    #[error(transparent)]
    Batch(BatchFault),
    #[error(transparent)]
    Single(SingleQueryFault),
    #[error(transparent)]
    ContractViolation(ContractViolation),
    /// A shape this translator does not know. Handed back unchanged so an
    /// outer layer may apply another strategy or re-raise the original.
    #[error(transparent)]
    Unrecognized(BoxError),
}

/// Injected capability that knows the wire error-body format.
///
/// Receives the extracted failure text and the failing response's headers;
/// returns `Ok(None)` when the body carries no structured error.
pub type ErrorBodyParser<'a> =
    dyn Fn(&[u8], &HeaderMap) -> Result<Option<ExtendedErrorInfo>, BoxError> + Send + Sync + 'a;

/// Translates a classified query fault into one [`StorageError`], mutating
/// `context` so the final report reflects this attempt.
///
/// Every recognized shape produces an error; [`QueryFault::Unrecognized`] is
/// handed back unchanged via `Err`. A failure of the injected parser never
/// propagates: translation degrades to a minimal error built from the
/// fault's own message and the context's current status.
pub fn translate_query_fault(
    fault: QueryFault,
    context: &mut RequestContext,
    parse_error_body: &ErrorBodyParser<'_>,
) -> Result<StorageError, QueryFault> {
    match fault {
        QueryFault::Batch(fault) => Ok(translate_batch(fault, context, parse_error_body)),
        QueryFault::Single(fault) => Ok(translate_single(fault, context, parse_error_body)),
        QueryFault::ContractViolation(fault) => {
            let message = fault.message.clone();
            Ok(StorageError {
                http_status_code: context.http_status_code,
                message,
                extended_error_info: None,
                is_retryable: false,
                source: Some(Box::new(fault)),
            })
        }
        QueryFault::Unrecognized(original) => Err(QueryFault::Unrecognized(original)),
    }
}

fn translate_batch(
    fault: BatchFault,
    context: &mut RequestContext,
    parse_error_body: &ErrorBodyParser<'_>,
) -> StorageError {
    // Batch-level status first, in case the batch carries no responses.
    context.http_status_code = Some(fault.batch_status_code);

    // The reported failure is the first sub-operation that failed; later
    // failures in the same batch are not reported.
    let failed = fault
        .operations
        .iter()
        .find(|operation| operation.http_status_code >= 300);

    let parse_outcome = match failed {
        Some(operation) => {
            context.http_status_code = Some(operation.http_status_code);
            Some((parse_error_body)(
                fault.error_body.as_bytes(),
                &operation.headers,
            ))
        }
        None => None,
    };

    let message = fault.message.clone();
    match parse_outcome {
        Some(Ok(info)) => {
            context.extended_error_info = info.clone();
            normalized(context, info, message, Box::new(fault))
        }
        Some(Err(parse_failure)) => degraded(context, message, Box::new(fault), parse_failure),
        None => normalized(context, None, message, Box::new(fault)),
    }
}

fn translate_single(
    fault: SingleQueryFault,
    context: &mut RequestContext,
    parse_error_body: &ErrorBodyParser<'_>,
) -> StorageError {
    context.http_status_code = Some(fault.response.http_status_code);

    let parse_outcome = (parse_error_body)(fault.error_body.as_bytes(), &fault.response.headers);

    let message = fault.message.clone();
    match parse_outcome {
        Ok(info) => {
            context.extended_error_info = info.clone();
            normalized(context, info, message, Box::new(fault))
        }
        Err(parse_failure) => degraded(context, message, Box::new(fault), parse_failure),
    }
}

fn normalized(
    context: &RequestContext,
    info: Option<ExtendedErrorInfo>,
    fault_message: String,
    source: BoxError,
) -> StorageError {
    let message = match &info {
        Some(info) => info.error_code.clone(),
        None => fault_message,
    };
    StorageError {
        http_status_code: context.http_status_code,
        message,
        extended_error_info: info,
        is_retryable: true,
        source: Some(source),
    }
}

fn degraded(
    context: &RequestContext,
    fault_message: String,
    source: BoxError,
    parse_failure: BoxError,
) -> StorageError {
    warn!(
        parse_failure = %parse_failure,
        "error body parser failed; reporting the underlying fault without extended info"
    );
    StorageError {
        http_status_code: context.http_status_code,
        message: fault_message,
        extended_error_info: None,
        is_retryable: true,
        source: Some(source),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::HeaderMap;
    use http::header::HeaderValue;

    use super::{
        BatchFault, ContractViolation, OperationResponse, QueryFault, SingleQueryFault,
        translate_query_fault,
    };
    use crate::error::{BoxError, ExtendedErrorInfo, RequestContext};

    type ParseOutcome = Result<Option<ExtendedErrorInfo>, BoxError>;

    fn headers_with_marker(marker: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-test-marker", HeaderValue::from_static(marker));
        headers
    }

    fn batch_fault(statuses: &[u16]) -> QueryFault {
        let operations = statuses
            .iter()
            .enumerate()
            .map(|(index, status)| {
                let marker: &'static str = match index {
                    0 => "op-0",
                    1 => "op-1",
                    2 => "op-2",
                    _ => "op-n",
                };
                OperationResponse::new(*status, headers_with_marker(marker))
            })
            .collect();
        QueryFault::Batch(BatchFault {
            batch_status_code: 202,
            operations,
            message: "batch request failed".to_owned(),
            error_body: "ResourceNotFound".to_owned(),
        })
    }

    #[test]
    fn batch_reports_first_failing_operation_only() {
        let mut context = RequestContext::new();
        let parser_calls = AtomicUsize::new(0);
        let parser = |body: &[u8], headers: &HeaderMap| -> ParseOutcome {
            parser_calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(body, b"ResourceNotFound");
            assert_eq!(
                headers.get("x-test-marker").map(|value| value.as_bytes()),
                Some(b"op-2".as_slice())
            );
            Ok(Some(ExtendedErrorInfo::new("ResourceNotFound")))
        };

        let error = translate_query_fault(batch_fault(&[200, 200, 404, 500]), &mut context, &parser)
            .expect("batch fault translates");

        assert_eq!(error.http_status_code, Some(404));
        assert_eq!(error.message, "ResourceNotFound");
        assert_eq!(parser_calls.load(Ordering::SeqCst), 1);
        assert_eq!(context.http_status_code, Some(404));
        assert!(context.extended_error_info.is_some());
    }

    #[test]
    fn batch_without_failing_operation_keeps_batch_status() {
        let mut context = RequestContext::new();
        let parser = |_: &[u8], _: &HeaderMap| -> ParseOutcome {
            panic!("parser must not run for a clean batch")
        };

        let error = translate_query_fault(batch_fault(&[200, 204]), &mut context, &parser)
            .expect("batch fault translates");

        assert_eq!(error.http_status_code, Some(202));
        assert_eq!(error.message, "batch request failed");
        assert!(error.extended_error_info.is_none());
    }

    #[test]
    fn single_query_maps_status_and_parsed_info() {
        let mut context = RequestContext::new();
        let fault = QueryFault::Single(SingleQueryFault {
            response: OperationResponse::new(412, headers_with_marker("single")),
            message: "query failed".to_owned(),
            error_body: "UpdateConditionNotSatisfied".to_owned(),
        });
        let parser = |body: &[u8], _: &HeaderMap| -> ParseOutcome {
            Ok(Some(
                ExtendedErrorInfo::new(String::from_utf8_lossy(body).into_owned())
                    .with_detail("message", "the condition was not met"),
            ))
        };

        let error =
            translate_query_fault(fault, &mut context, &parser).expect("single fault translates");

        assert_eq!(error.http_status_code, Some(412));
        assert_eq!(error.message, "UpdateConditionNotSatisfied");
        assert_eq!(
            error
                .extended_error_info
                .as_ref()
                .and_then(|info| info.details.get("message"))
                .map(String::as_str),
            Some("the condition was not met")
        );
        assert!(error.is_retryable);
    }

    #[test]
    fn contract_violation_is_never_retryable() {
        let mut context = RequestContext::new();
        context.http_status_code = Some(200);
        let fault = QueryFault::ContractViolation(ContractViolation::new(
            "payload type is not compatible with the expected type",
        ));
        let parser = |_: &[u8], _: &HeaderMap| -> ParseOutcome { Ok(None) };

        let error =
            translate_query_fault(fault, &mut context, &parser).expect("violation translates");

        assert!(!error.is_retryable);
        assert!(error.extended_error_info.is_none());
        assert_eq!(error.http_status_code, Some(200));
    }

    #[test]
    fn parser_failure_degrades_to_fault_message() {
        let mut context = RequestContext::new();
        let fault = QueryFault::Single(SingleQueryFault {
            response: OperationResponse::new(500, HeaderMap::new()),
            message: "query failed".to_owned(),
            error_body: "<not an error body>".to_owned(),
        });
        let parser = |_: &[u8], _: &HeaderMap| -> ParseOutcome { Err("parser exploded".into()) };

        let error = translate_query_fault(fault, &mut context, &parser)
            .expect("degraded translation still produces an error");

        assert_eq!(error.http_status_code, Some(500));
        assert_eq!(error.message, "query failed");
        assert!(error.extended_error_info.is_none());
        assert!(error.source.is_some());
    }

    #[test]
    fn unrecognized_fault_is_handed_back_unchanged() {
        let mut context = RequestContext::new();
        let fault = QueryFault::Unrecognized("something else entirely".into());
        let parser = |_: &[u8], _: &HeaderMap| -> ParseOutcome { Ok(None) };

        let unhandled = translate_query_fault(fault, &mut context, &parser)
            .expect_err("unrecognized shapes are not translated");

        match unhandled {
            QueryFault::Unrecognized(original) => {
                assert_eq!(original.to_string(), "something else entirely");
            }
            other => panic!("unexpected fault variant: {other}"),
        }
        assert_eq!(context.http_status_code, None);
    }
}

//! `tablex` is the resilient-transport and continuation core for tabular
//! cloud storage SDKs: replay-safe request bodies for retried attempts,
//! continuation tokens for resuming partitioned scans, and a translator that
//! folds the query layer's failure shapes into one normalized error.
//!
//! # Quick Start
//!
//! ```no_run
//! use http::HeaderMap;
//! use tablex::prelude::*;
//!
//! #[derive(Clone)]
//! struct PageQuery {
//!     options: Vec<(String, String)>,
//!     top: Option<u64>,
//! }
//!
//! impl ContinuationQuery for PageQuery {
//!     fn with_query_option(mut self, name: &str, value: &str) -> Self {
//!         self.options.push((name.to_owned(), value.to_owned()));
//!         self
//!     }
//!
//!     fn take_count(&self) -> Option<u64> {
//!         self.top
//!     }
//! }
//!
//! // Issues one page request against the service; elided here.
//! fn fetch_page(query: &PageQuery) -> (HeaderMap, Vec<String>) {
//!     unimplemented!()
//! }
//!
//! fn scan_all() -> Vec<String> {
//!     let base = PageQuery {
//!         options: Vec::new(),
//!         top: Some(250),
//!     };
//!     let mut items = Vec::new();
//!     let mut token: Option<ContinuationToken> = None;
//!
//!     loop {
//!         let query = apply_continuation(token.as_ref(), base.clone());
//!         let (headers, page) = fetch_page(&query);
//!         items.extend(page);
//!
//!         token = ContinuationToken::from_response_headers(&headers);
//!         if token.is_none() {
//!             break;
//!         }
//!     }
//!     items
//! }
//! ```
//!
//! # Recommended Usage
//!
//! - Wrap any request payload that may be re-sent in a [`ReplayableBody`];
//!   mint one [`AttemptBody`] per physical attempt and let the transport
//!   drop it freely.
//! - Classify query-layer failures into a [`QueryFault`] at the execution
//!   boundary and run them through [`translate_query_fault`] with the
//!   error-body parser for your wire format ([`parse_odata_error`] for the
//!   JSON envelope).

mod body;
mod continuation;
mod copy_state;
mod error;
pub mod operators;
mod protocol;
mod translate;

pub use crate::body::{AttemptBody, DEFAULT_BODY_CHUNK_SIZE, ReplayableBody};
pub use crate::continuation::{
    ContinuationQuery, ContinuationToken, apply_continuation, effective_page_size,
};
pub use crate::copy_state::{CopyState, CopyStatus};
pub use crate::error::{BoxError, ExtendedErrorInfo, RequestContext, StorageError};
pub use crate::protocol::parse_odata_error;
pub use crate::translate::{
    BatchFault, ContractViolation, ErrorBodyParser, OperationResponse, QueryFault,
    SingleQueryFault, translate_query_fault,
};

pub mod prelude {
    pub use crate::{
        AttemptBody, BatchFault, BoxError, ContinuationQuery, ContinuationToken,
        ContractViolation, CopyState, CopyStatus, ErrorBodyParser, ExtendedErrorInfo,
        OperationResponse, QueryFault, ReplayableBody, RequestContext, SingleQueryFault,
        StorageError, apply_continuation, effective_page_size, parse_odata_error,
        translate_query_fault,
    };
}

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONTINUATION_HEADER_PREFIX: &str = "x-ms-continuation-";

const NEXT_PARTITION_KEY: &str = "NextPartitionKey";
const NEXT_ROW_KEY: &str = "NextRowKey";
const NEXT_TABLE_NAME: &str = "NextTableName";

/// Opaque cursor carrying partition/row/table scan position across
/// paginated query boundaries.
///
/// Produced by [`ContinuationToken::from_response_headers`]; callers feed it
/// back into the next request via [`apply_continuation`] and otherwise treat
/// it as opaque. Absence of further data is `None` at the API surface, never
/// a token with every part empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    next_partition_key: Option<String>,
    next_row_key: Option<String>,
    next_table_name: Option<String>,
}

impl ContinuationToken {
    /// Builds a token from its three optional parts. Empty strings count as
    /// absent; returns `None` when every part is absent.
    pub fn new(
        next_partition_key: Option<String>,
        next_row_key: Option<String>,
        next_table_name: Option<String>,
    ) -> Option<Self> {
        let token = Self {
            next_partition_key: normalize(next_partition_key),
            next_row_key: normalize(next_row_key),
            next_table_name: normalize(next_table_name),
        };
        if token.next_partition_key.is_none()
            && token.next_row_key.is_none()
            && token.next_table_name.is_none()
        {
            None
        } else {
            Some(token)
        }
    }

    /// Reads the continuation headers of a completed response.
    ///
    /// Returns `None` when all three headers are absent or empty, meaning
    /// the scan is complete. A part absent in the response is absent in the
    /// token; it is never carried forward from an earlier token.
    pub fn from_response_headers(headers: &HeaderMap) -> Option<Self> {
        let token = Self::new(
            continuation_header(headers, NEXT_PARTITION_KEY),
            continuation_header(headers, NEXT_ROW_KEY),
            continuation_header(headers, NEXT_TABLE_NAME),
        );
        match &token {
            Some(token) => debug!(?token, "continuation token extracted from response"),
            None => debug!("no continuation headers present; scan complete"),
        }
        token
    }

    pub fn next_partition_key(&self) -> Option<&str> {
        self.next_partition_key.as_deref()
    }

    pub fn next_row_key(&self) -> Option<&str> {
        self.next_row_key.as_deref()
    }

    pub fn next_table_name(&self) -> Option<&str> {
        self.next_table_name.as_deref()
    }
}

fn normalize(part: Option<String>) -> Option<String> {
    part.filter(|value| !value.is_empty())
}

fn continuation_header(headers: &HeaderMap, field_name: &str) -> Option<String> {
    let header_name = format!("{CONTINUATION_HEADER_PREFIX}{field_name}");
    headers
        .get(header_name.as_str())
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

/// The narrow surface this layer needs from the query-expression layer:
/// deriving a query with one more option, and inspecting its size-limiting
/// clause.
pub trait ContinuationQuery: Sized {
    /// Returns a derived query carrying the given option. Implementations
    /// must not mutate shared state; the original query value stays usable
    /// for re-derivation on later pages.
    fn with_query_option(self, name: &str, value: &str) -> Self;

    /// The limit the query's size-limiting clause specifies, if any.
    fn take_count(&self) -> Option<u64>;
}

/// Derives a query resuming from `token`, adding one query option per
/// populated token part. A `None` token returns the query unchanged.
pub fn apply_continuation<Q: ContinuationQuery>(
    token: Option<&ContinuationToken>,
    mut query: Q,
) -> Q {
    let Some(token) = token else {
        return query;
    };
    if let Some(next_partition_key) = token.next_partition_key() {
        query = query.with_query_option(NEXT_PARTITION_KEY, next_partition_key);
    }
    if let Some(next_row_key) = token.next_row_key() {
        query = query.with_query_option(NEXT_ROW_KEY, next_row_key);
    }
    if let Some(next_table_name) = token.next_table_name() {
        query = query.with_query_option(NEXT_TABLE_NAME, next_table_name);
    }
    query
}

/// The page size the query asks for, or `default_page_size` when it has no
/// size-limiting clause. Callers use this to track how many items they still
/// need, cumulative across pages, after server-side truncation.
pub fn effective_page_size<Q: ContinuationQuery>(query: &Q, default_page_size: u64) -> u64 {
    query.take_count().unwrap_or(default_page_size)
}

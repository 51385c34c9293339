use std::time::SystemTime;

use http::HeaderMap;
use url::Url;

const COPY_ID: &str = "x-ms-copy-id";
const COPY_STATUS: &str = "x-ms-copy-status";
const COPY_SOURCE: &str = "x-ms-copy-source";
const COPY_PROGRESS: &str = "x-ms-copy-progress";
const COPY_COMPLETION_TIME: &str = "x-ms-copy-completion-time";
const COPY_STATUS_DESCRIPTION: &str = "x-ms-copy-status-description";

/// Status of a blob copy operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CopyStatus {
    Pending,
    Success,
    Aborted,
    Failed,
    /// The service reported a status this client does not recognize.
    Invalid,
}

impl CopyStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
            Self::Invalid => "invalid",
        }
    }

    fn parse(value: &str) -> Self {
        match value {
            "pending" => Self::Pending,
            "success" => Self::Success,
            "aborted" => Self::Aborted,
            "failed" => Self::Failed,
            _ => Self::Invalid,
        }
    }
}

/// Attributes of a blob copy operation, as last reported by the service.
///
/// Populated from response headers by this crate; read-only to callers. The
/// polling workflow that refreshes it lives above this layer.
#[derive(Clone, Debug)]
pub struct CopyState {
    copy_id: String,
    completion_time: Option<SystemTime>,
    status: CopyStatus,
    source: Option<Url>,
    bytes_copied: Option<u64>,
    total_bytes: Option<u64>,
    status_description: Option<String>,
}

impl CopyState {
    /// Reads the copy attributes of a response, or `None` when the response
    /// carries no copy status. Malformed optional pieces degrade to absent
    /// fields; the status itself degrades to [`CopyStatus::Invalid`].
    pub fn from_response_headers(headers: &HeaderMap) -> Option<Self> {
        let status = CopyStatus::parse(header_str(headers, COPY_STATUS)?);

        let (bytes_copied, total_bytes) = header_str(headers, COPY_PROGRESS)
            .and_then(parse_progress)
            .map_or((None, None), |(copied, total)| (Some(copied), Some(total)));

        Some(Self {
            copy_id: header_str(headers, COPY_ID).unwrap_or_default().to_owned(),
            completion_time: header_str(headers, COPY_COMPLETION_TIME)
                .and_then(|value| httpdate::parse_http_date(value).ok()),
            status,
            source: header_str(headers, COPY_SOURCE).and_then(|value| Url::parse(value).ok()),
            bytes_copied,
            total_bytes,
            status_description: header_str(headers, COPY_STATUS_DESCRIPTION)
                .map(ToOwned::to_owned),
        })
    }

    pub fn copy_id(&self) -> &str {
        &self.copy_id
    }

    pub fn completion_time(&self) -> Option<SystemTime> {
        self.completion_time
    }

    pub fn status(&self) -> CopyStatus {
        self.status
    }

    pub fn source(&self) -> Option<&Url> {
        self.source.as_ref()
    }

    pub fn bytes_copied(&self) -> Option<u64> {
        self.bytes_copied
    }

    pub fn total_bytes(&self) -> Option<u64> {
        self.total_bytes
    }

    pub fn status_description(&self) -> Option<&str> {
        self.status_description.as_deref()
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
}

/// Copy progress is reported as `<bytes copied>/<total bytes>`.
fn parse_progress(value: &str) -> Option<(u64, u64)> {
    let (copied, total) = value.split_once('/')?;
    Some((copied.trim().parse().ok()?, total.trim().parse().ok()?))
}

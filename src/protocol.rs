use http::HeaderMap;
use serde::Deserialize;

use crate::error::{BoxError, ExtendedErrorInfo};

#[derive(Deserialize)]
struct ODataErrorEnvelope {
    #[serde(rename = "odata.error")]
    error: ODataErrorBody,
}

#[derive(Deserialize)]
struct ODataErrorBody {
    code: String,
    message: Option<ODataErrorMessage>,
}

#[derive(Deserialize)]
struct ODataErrorMessage {
    lang: Option<String>,
    value: Option<String>,
}

/// Parses the service's JSON error envelope into [`ExtendedErrorInfo`].
///
/// Fits the translator's error-body parser contract directly. A body that is
/// not an error envelope at all yields `Ok(None)` (no structured detail);
/// `Err` is reserved for JSON that claims to be an envelope but is
/// malformed.
///
/// ```
/// use tablex::parse_odata_error;
///
/// let body = br#"{"odata.error":{"code":"ResourceNotFound",
///     "message":{"lang":"en-US","value":"The specified resource does not exist."}}}"#;
/// let info = parse_odata_error(body, &http::HeaderMap::new())
///     .expect("well-formed envelope")
///     .expect("structured detail present");
/// assert_eq!(info.error_code, "ResourceNotFound");
/// ```
pub fn parse_odata_error(
    body: &[u8],
    _headers: &HeaderMap,
) -> Result<Option<ExtendedErrorInfo>, BoxError> {
    let text = std::str::from_utf8(body)?;
    let trimmed = text.trim_start();
    if !trimmed.starts_with('{') || !trimmed.contains("odata.error") {
        return Ok(None);
    }

    let envelope: ODataErrorEnvelope = serde_json::from_str(trimmed)?;

    let mut info = ExtendedErrorInfo::new(envelope.error.code);
    if let Some(message) = envelope.error.message {
        if let Some(value) = message.value {
            info = info.with_detail("message", value);
        }
        if let Some(lang) = message.lang {
            info = info.with_detail("lang", lang);
        }
    }
    Ok(Some(info))
}

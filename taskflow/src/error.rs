//! API error types and the message-extraction rule.
//!
//! Every error surfaced to a user goes through [`ApiError::message`], so a
//! backend failure reads the same whether it arrived via a cache snapshot
//! or a rejected mutation.

use serde_json::Value;

/// Fallback shown when no usable message can be extracted.
const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors produced by the API layer.
///
/// Variants are self-contained (no live handles to the transport) so they
/// can be stored in cache snapshots and cloned into views.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure with no parseable response body.
    #[error("network error: {0}")]
    Network(String),

    /// Non-success HTTP response, with the error envelope if one parsed.
    #[error("request failed with status {status}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Parsed error envelope, if the body was JSON.
        body: Option<Value>,
    },

    /// A success response whose body did not match the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// A local precondition was violated before dispatch.
    ///
    /// The UI layer is supposed to prevent these; when it does not, the
    /// operation fails here instead of reaching the wire.
    #[error("{0}")]
    Guard(String),
}

impl ApiError {
    /// Extracts a human-readable message.
    ///
    /// The rule, applied identically everywhere: no structured body means
    /// the transport-level text; a string body is used verbatim; a `detail`
    /// string is used as-is; otherwise the first key of the object is
    /// formatted as `"<field>: <first element>"` for non-empty sequence
    /// values and `"<field>: <stringified value>"` for anything else.
    /// Unrecognized shapes fall back to a generic message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Network(msg) | Self::Decode(msg) | Self::Guard(msg) => msg.clone(),
            Self::Api { body, .. } => body
                .as_ref()
                .and_then(extract_from_body)
                .unwrap_or_else(|| match body {
                    Some(_) => GENERIC_MESSAGE.to_string(),
                    None => self.to_string(),
                }),
        }
    }
}

/// Pulls a displayable message out of an error envelope, if possible.
fn extract_from_body(body: &Value) -> Option<String> {
    match body {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => {
            if let Some(Value::String(detail)) = map.get("detail") {
                return Some(detail.clone());
            }
            let (field, value) = map.iter().next()?;
            let rendered = match value {
                Value::Array(items) if !items.is_empty() => render_scalar(&items[0]),
                other => render_scalar(other),
            };
            Some(format!("{field}: {rendered}"))
        }
        _ => None,
    }
}

/// Renders a JSON value without the surrounding quotes strings would get.
fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

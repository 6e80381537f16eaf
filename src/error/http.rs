use thiserror::Error;

/// Failures while serving an incoming log request.
///
/// Request-level variants carry the status code that is written back to
/// the client; listener-level variants abort the server.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Failed to read request: {source}")]
    ReadRequest {
        #[source]
        source: std::io::Error,
    },
    #[error("Empty request")]
    EmptyRequest,
    #[error("Connection closed before the request was complete")]
    IncompleteRequest,
    #[error("Timed out waiting for the request after {timeout_ms} ms")]
    ReadTimeout { timeout_ms: u128 },
    #[error("Request too large")]
    RequestTooLarge,
    #[error("Malformed request headers")]
    MalformedHeaders,
    #[error("Invalid request encoding: {source}")]
    InvalidEncoding {
        #[source]
        source: std::str::Utf8Error,
    },
    #[error("Missing request line")]
    MissingRequestLine,
    #[error("Missing HTTP method")]
    MissingMethod,
    #[error("Missing request path")]
    MissingPath,
    #[error("Malformed header")]
    MalformedHeader,
    #[error("Invalid chunk size: {source}")]
    InvalidChunkSize {
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("Malformed chunked body")]
    MalformedChunk,
    #[error("Unsupported transfer encoding: {encoding}")]
    UnsupportedTransferEncoding { encoding: String },
    #[error("Not Found")]
    NotFound,
    #[error("Invalid log payload: {source}")]
    InvalidPayload {
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error during {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

impl HttpError {
    /// Status code reported to the client for this failure.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::ReadRequest { .. }
            | Self::EmptyRequest
            | Self::IncompleteRequest
            | Self::MalformedHeaders
            | Self::InvalidEncoding { .. }
            | Self::MissingRequestLine
            | Self::MissingMethod
            | Self::MissingPath
            | Self::MalformedHeader
            | Self::InvalidChunkSize { .. }
            | Self::MalformedChunk => 400,
            Self::ReadTimeout { .. } => 408,
            Self::RequestTooLarge => 413,
            Self::UnsupportedTransferEncoding { .. } => 501,
            Self::NotFound => 404,
            Self::InvalidPayload { .. } | Self::Io { .. } | Self::Bind { .. } => 500,
        }
    }
}

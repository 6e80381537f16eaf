use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to build HTTP client: {source}")]
    BuildClient {
        #[source]
        source: reqwest::Error,
    },
    #[error("Invalid host '{url}': {source}")]
    InvalidHost {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to join '{path}' onto host: {source}")]
    JoinUrl {
        path: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Session login failed: {source}")]
    Login {
        #[source]
        source: reqwest::Error,
    },
    #[error("Session login returned {status} without a '{cookie}' cookie")]
    MissingSessionCookie { status: u16, cookie: &'static str },
    #[error("{method} {url} failed: {source}")]
    Request {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} {status}: status code was not 200, 202 or 204")]
    UnexpectedStatus {
        method: &'static str,
        url: String,
        status: u16,
    },
    #[error("Virtual user task failed: {source}")]
    VirtualUser {
        #[source]
        source: tokio::task::JoinError,
    },
}

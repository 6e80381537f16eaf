use std::time::Duration;

use url::Url;

use crate::args::LoadArgs;
use crate::error::{AppError, AppResult, LoadError, ValidationError};

/// Statuses a checked request may answer with.
pub const ACCEPTED_STATUSES: [u16; 3] = [200, 202, 204];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestStep {
    pub path: String,
    /// Whether the response status is verified.
    pub checked: bool,
}

impl RequestStep {
    fn checked(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            checked: true,
        }
    }

    fn unchecked(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            checked: false,
        }
    }
}

/// The requests issued by one iteration, in order.
#[must_use]
pub fn iteration_steps(dashboard_id: u64, dashboard_param: &str) -> Vec<RequestStep> {
    vec![
        RequestStep::checked("/api/user/current"),
        RequestStep::checked("/api/session/properties"),
        RequestStep::checked("/api/collection/root"),
        RequestStep::checked("/api/search"),
        RequestStep::checked("/api/database"),
        RequestStep::checked("/api/collection/tree"),
        RequestStep::checked("/api/bookmark"),
        RequestStep::checked(format!("/api/dashboard/{}", dashboard_id)),
        RequestStep::unchecked(format!(
            "/api/dashboard/{}/params/{}/values",
            dashboard_id, dashboard_param
        )),
        RequestStep::unchecked(format!("/api/dashboard/{}/query_metadata", dashboard_id)),
    ]
}

#[derive(Debug, Clone)]
pub struct LoadPlan {
    /// Base URL without a trailing slash.
    pub host: String,
    pub user: String,
    pub password: String,
    pub vus: usize,
    pub iterations: Option<u64>,
    pub duration: Option<Duration>,
    pub think_time: Duration,
    pub request_timeout: Duration,
    pub steps: Vec<RequestStep>,
}

impl LoadPlan {
    /// # Errors
    ///
    /// Returns an error when the host or the credentials are missing, or the
    /// host is not a valid URL.
    pub fn from_args(args: &LoadArgs) -> AppResult<Self> {
        let host = args
            .host
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or_else(|| AppError::validation(ValidationError::MissingHost))?;
        Url::parse(host).map_err(|err| {
            AppError::load(LoadError::InvalidHost {
                url: host.to_owned(),
                source: err,
            })
        })?;

        let (Some(user), Some(password)) = (args.user.as_ref(), args.password.as_ref()) else {
            return Err(AppError::validation(ValidationError::MissingCredentials));
        };

        Ok(Self {
            host: host.trim_end_matches('/').to_owned(),
            user: user.clone(),
            password: password.clone(),
            vus: args.vus.get(),
            iterations: args.iterations.map(|iterations| iterations.get()),
            duration: args.duration,
            think_time: args.think_time,
            request_timeout: args.request_timeout,
            steps: iteration_steps(args.dashboard_id, &args.dashboard_param),
        })
    }

    /// Appends `path` to the host the same way a string template would, so
    /// a host with a path prefix keeps it.
    ///
    /// # Errors
    ///
    /// Returns an error when the result is not a valid URL.
    pub fn url(&self, path: &str) -> AppResult<Url> {
        let raw = format!("{}{}", self.host, path);
        Url::parse(&raw).map_err(|err| {
            AppError::load(LoadError::JoinUrl {
                path: path.to_owned(),
                source: err,
            })
        })
    }
}

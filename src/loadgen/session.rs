use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::Serialize;

use super::plan::LoadPlan;
use crate::error::{AppError, AppResult, LoadError};

/// Name of the session cookie issued by the login endpoint.
pub const SESSION_COOKIE: &str = "metabase.SESSION";

#[derive(Debug, Serialize)]
struct Credentials<'plan> {
    username: &'plan str,
    password: &'plan str,
}

/// Logs in and returns the session cookie value.
///
/// # Errors
///
/// Returns an error when the request fails or the response does not set
/// the session cookie.
pub async fn login(client: &Client, plan: &LoadPlan) -> AppResult<String> {
    let url = plan.url("/api/session")?;
    let response = client
        .post(url)
        .json(&Credentials {
            username: &plan.user,
            password: &plan.password,
        })
        .send()
        .await
        .map_err(|err| AppError::load(LoadError::Login { source: err }))?;

    let status = response.status().as_u16();
    let cookie = session_cookie(response.headers());

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        if let Err(err) = chunk {
            tracing::debug!("Failed to read login response body: {}", err);
            break;
        }
    }

    cookie.ok_or_else(|| {
        AppError::load(LoadError::MissingSessionCookie {
            status,
            cookie: SESSION_COOKIE,
        })
    })
}

/// Extracts the session cookie from `Set-Cookie` headers.
#[must_use]
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| {
            let pair = value.split(';').next()?;
            let (name, cookie) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE).then(|| cookie.trim().to_owned())
        })
}

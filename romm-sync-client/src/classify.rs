//! Connection checks with protocol auto-detection.
//!
//! Both the pre-flight check and login treat an ambiguous failure as a hint
//! that the user typed the wrong scheme: the same endpoint is retried on the
//! opposite scheme, and a success there becomes `WrongProtocol`.

use std::time::Duration;

use crate::error::ConnectionErrorKind;
use crate::transport::{BasicAuth, Method, ProbeResponse, ReqwestTransport, Transport};
use crate::types::{Host, Scheme};

pub const HEARTBEAT_PATH: &str = "/api/heartbeat";
pub const LOGIN_PATH: &str = "/api/login";

pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);

/// Swap `http://` and `https://`. Returns `None` for any other scheme.
pub fn switch_scheme(url: &str) -> Option<String> {
    if let Some(rest) = url.strip_prefix("https://") {
        Some(format!("http://{rest}"))
    } else {
        url.strip_prefix("http://")
            .map(|rest| format!("https://{rest}"))
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// A redirect onto the other scheme means the configured one is wrong.
fn redirected_scheme(requested: Option<Scheme>, resp: &ProbeResponse) -> Option<ConnectionErrorKind> {
    let landed = Scheme::of_url(&resp.final_url)?;
    if Some(landed) != requested {
        log::debug!("Request was redirected to {}", resp.final_url);
        return Some(ConnectionErrorKind::WrongProtocol {
            correct_scheme: landed,
        });
    }
    None
}

async fn probe_opposite<T: Transport>(
    transport: &T,
    method: Method,
    url: &str,
    auth: Option<BasicAuth<'_>>,
    accept: fn(u16) -> bool,
) -> Option<ConnectionErrorKind> {
    let switched = switch_scheme(url)?;
    let scheme = Scheme::of_url(&switched)?;
    log::debug!("Probing {}", switched);
    match transport.send(method, &switched, auth).await {
        Ok(resp) if accept(resp.status) => {
            log::debug!("{} answered {}, wrong protocol", switched, resp.status);
            Some(ConnectionErrorKind::WrongProtocol {
                correct_scheme: scheme,
            })
        }
        Ok(resp) => {
            log::debug!("{} answered {}", switched, resp.status);
            None
        }
        Err(kind) => {
            log::debug!("{} failed: {}", switched, kind);
            None
        }
    }
}

/// Check that a RomM server is reachable on the configured URL.
pub async fn validate_connection<T: Transport>(
    transport: &T,
    base_url: &str,
) -> Result<(), ConnectionErrorKind> {
    let url = endpoint(base_url, HEARTBEAT_PATH);
    let requested = Scheme::of_url(&url);

    let resp = match transport.send(Method::Get, &url, None).await {
        Ok(resp) => resp,
        Err(kind) if kind.is_decisive() => return Err(kind),
        Err(kind) => {
            return Err(probe_opposite(transport, Method::Get, &url, None, is_success)
                .await
                .unwrap_or(kind));
        }
    };

    if let Some(kind) = redirected_scheme(requested, &resp) {
        return Err(kind);
    }
    if is_success(resp.status) {
        return Ok(());
    }
    if let Some(kind) = ConnectionErrorKind::from_status(resp.status) {
        return Err(kind);
    }
    Err(probe_opposite(transport, Method::Get, &url, None, is_success)
        .await
        .unwrap_or(ConnectionErrorKind::Unclassified))
}

/// Log in with basic auth.
pub async fn login<T: Transport>(
    transport: &T,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<(), ConnectionErrorKind> {
    let url = endpoint(base_url, LOGIN_PATH);
    let requested = Scheme::of_url(&url);
    let auth = Some(BasicAuth { username, password });

    let resp = match transport.send(Method::Post, &url, auth).await {
        Ok(resp) => resp,
        Err(kind) if kind.is_decisive() => return Err(kind),
        Err(kind) => {
            return Err(probe_opposite(transport, Method::Post, &url, auth, is_success)
                .await
                .unwrap_or(kind));
        }
    };

    if let Some(kind) = redirected_scheme(requested, &resp) {
        return Err(kind);
    }
    match resp.status {
        s if is_success(s) => Ok(()),
        // Any non-405 client-range answer on the other scheme marks it as
        // the real login endpoint.
        405 => Err(probe_opposite(transport, Method::Post, &url, auth, |s| {
            s != 405 && s < 500
        })
        .await
        .unwrap_or(ConnectionErrorKind::Unclassified)),
        s => match ConnectionErrorKind::from_status(s) {
            Some(kind) => Err(kind),
            None => Err(probe_opposite(transport, Method::Post, &url, auth, is_success)
                .await
                .unwrap_or(ConnectionErrorKind::Unclassified)),
        },
    }
}

/// Fast reachability check for a configured host.
pub async fn preflight(host: &Host) -> Result<(), ConnectionErrorKind> {
    let transport = ReqwestTransport::new(VALIDATION_TIMEOUT).map_err(|e| e.kind())?;
    validate_connection(&transport, &host.base_url()).await
}

/// Pre-flight check followed by a credentialed login.
pub async fn authenticate(host: &Host) -> Result<(), ConnectionErrorKind> {
    preflight(host).await?;
    let transport = ReqwestTransport::new(LOGIN_TIMEOUT).map_err(|e| e.kind())?;
    login(&transport, &host.base_url(), &host.username, &host.password).await
}

#[cfg(test)]
#[path = "tests/classify_tests.rs"]
mod tests;

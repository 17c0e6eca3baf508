//! Minimal request seam used by connection classification.
//!
//! The classifier only needs a status code and the URL the request finally
//! landed on, so it talks to this trait instead of reqwest directly.

use std::error::Error as _;
use std::future::Future;
use std::time::Duration;

use crate::error::{ClientError, ConnectionErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

#[derive(Clone, Copy)]
pub struct BasicAuth<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    /// URL after following redirects.
    pub final_url: String,
}

pub trait Transport: Send + Sync {
    /// Send a request. Transport failures come back already classified.
    fn send(
        &self,
        method: Method,
        url: &str,
        auth: Option<BasicAuth<'_>>,
    ) -> impl Future<Output = Result<ProbeResponse, ConnectionErrorKind>> + Send;
}

/// `Transport` backed by a reqwest client with a fixed timeout.
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

impl Transport for ReqwestTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        auth: Option<BasicAuth<'_>>,
    ) -> Result<ProbeResponse, ConnectionErrorKind> {
        let mut req = match method {
            Method::Get => self.http.get(url),
            Method::Post => self.http.post(url),
        };
        if let Some(auth) = auth {
            req = req.basic_auth(auth.username, Some(auth.password));
        }
        let resp = req.send().await.map_err(|e| {
            log::debug!("Request to {} failed: {}", url, e);
            classify_reqwest(&e)
        })?;
        Ok(ProbeResponse {
            status: resp.status().as_u16(),
            final_url: resp.url().to_string(),
        })
    }
}

/// Classify a reqwest failure by walking its source chain.
pub fn classify_reqwest(err: &reqwest::Error) -> ConnectionErrorKind {
    if err.is_timeout() {
        return ConnectionErrorKind::Timeout;
    }

    let mut source: Option<&(dyn std::error::Error + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    return ConnectionErrorKind::ConnectionRefused;
                }
                std::io::ErrorKind::TimedOut => return ConnectionErrorKind::Timeout,
                _ => {}
            }
        }
        if is_dns_message(&cause.to_string()) {
            return ConnectionErrorKind::InvalidHostname;
        }
        source = cause.source();
    }

    if err.is_builder() {
        return ConnectionErrorKind::InvalidHostname;
    }
    ConnectionErrorKind::Unclassified
}

fn is_dns_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("dns error")
        || msg.contains("failed to lookup address")
        || msg.contains("name or service not known")
        || msg.contains("no such host")
        || msg.contains("nodename nor servname")
}

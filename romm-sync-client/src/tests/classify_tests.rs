use std::collections::HashMap;
use std::sync::Mutex;

use super::*;

/// Canned responses keyed by method and URL; anything else is refused.
#[derive(Default)]
struct FakeTransport {
    routes: HashMap<(Method, String), Result<ProbeResponse, ConnectionErrorKind>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    fn respond(mut self, method: Method, url: &str, status: u16) -> Self {
        self.routes.insert(
            (method, url.to_string()),
            Ok(ProbeResponse {
                status,
                final_url: url.to_string(),
            }),
        );
        self
    }

    fn redirect(mut self, method: Method, url: &str, final_url: &str, status: u16) -> Self {
        self.routes.insert(
            (method, url.to_string()),
            Ok(ProbeResponse {
                status,
                final_url: final_url.to_string(),
            }),
        );
        self
    }

    fn fail(mut self, method: Method, url: &str, kind: ConnectionErrorKind) -> Self {
        self.routes.insert((method, url.to_string()), Err(kind));
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    async fn send(
        &self,
        method: Method,
        url: &str,
        _auth: Option<BasicAuth<'_>>,
    ) -> Result<ProbeResponse, ConnectionErrorKind> {
        self.calls.lock().unwrap().push(url.to_string());
        self.routes
            .get(&(method, url.to_string()))
            .cloned()
            .unwrap_or(Err(ConnectionErrorKind::ConnectionRefused))
    }
}

const HTTP_HEARTBEAT: &str = "http://host/api/heartbeat";
const HTTPS_HEARTBEAT: &str = "https://host/api/heartbeat";
const HTTP_LOGIN: &str = "http://host/api/login";
const HTTPS_LOGIN: &str = "https://host/api/login";

#[test]
fn switch_scheme_swaps_both_ways() {
    assert_eq!(switch_scheme("http://a/b").as_deref(), Some("https://a/b"));
    assert_eq!(switch_scheme("https://a/b").as_deref(), Some("http://a/b"));
    assert_eq!(switch_scheme("ftp://a"), None);
}

#[tokio::test]
async fn healthy_server_validates() {
    let t = FakeTransport::default().respond(Method::Get, HTTP_HEARTBEAT, 200);
    assert_eq!(validate_connection(&t, "http://host/").await, Ok(()));
    assert_eq!(t.calls(), vec![HTTP_HEARTBEAT]);
}

#[tokio::test]
async fn non_decisive_status_probes_opposite_scheme() {
    let t = FakeTransport::default()
        .respond(Method::Get, HTTP_HEARTBEAT, 400)
        .respond(Method::Get, HTTPS_HEARTBEAT, 200);
    let result = validate_connection(&t, "http://host").await;
    assert_eq!(
        result,
        Err(ConnectionErrorKind::WrongProtocol {
            correct_scheme: Scheme::Https
        })
    );
}

#[tokio::test]
async fn non_decisive_transport_failure_probes_opposite_scheme() {
    let t = FakeTransport::default()
        .fail(Method::Get, HTTPS_HEARTBEAT, ConnectionErrorKind::Unclassified)
        .respond(Method::Get, HTTP_HEARTBEAT, 204);
    let result = validate_connection(&t, "https://host").await;
    assert_eq!(
        result,
        Err(ConnectionErrorKind::WrongProtocol {
            correct_scheme: Scheme::Http
        })
    );
}

#[tokio::test]
async fn decisive_failures_skip_the_probe() {
    for kind in [
        ConnectionErrorKind::InvalidHostname,
        ConnectionErrorKind::ConnectionRefused,
        ConnectionErrorKind::Timeout,
    ] {
        let t = FakeTransport::default()
            .fail(Method::Get, HTTP_HEARTBEAT, kind)
            .respond(Method::Get, HTTPS_HEARTBEAT, 200);
        assert_eq!(validate_connection(&t, "http://host").await, Err(kind));
        assert_eq!(t.calls().len(), 1);
    }
}

#[tokio::test]
async fn failed_probe_keeps_original_classification() {
    let t = FakeTransport::default()
        .respond(Method::Get, HTTP_HEARTBEAT, 404)
        .respond(Method::Get, HTTPS_HEARTBEAT, 404);
    assert_eq!(
        validate_connection(&t, "http://host").await,
        Err(ConnectionErrorKind::Unclassified)
    );
}

#[tokio::test]
async fn server_errors_are_not_probed() {
    let t = FakeTransport::default().respond(Method::Get, HTTP_HEARTBEAT, 502);
    assert_eq!(
        validate_connection(&t, "http://host").await,
        Err(ConnectionErrorKind::ServerError)
    );
    assert_eq!(t.calls().len(), 1);
}

#[tokio::test]
async fn redirect_to_other_scheme_is_wrong_protocol() {
    let t = FakeTransport::default().redirect(Method::Get, HTTP_HEARTBEAT, HTTPS_HEARTBEAT, 200);
    assert_eq!(
        validate_connection(&t, "http://host").await,
        Err(ConnectionErrorKind::WrongProtocol {
            correct_scheme: Scheme::Https
        })
    );
}

#[tokio::test]
async fn login_maps_auth_statuses() {
    let cases = [
        (401, ConnectionErrorKind::Unauthorized),
        (403, ConnectionErrorKind::Forbidden),
        (500, ConnectionErrorKind::ServerError),
    ];
    for (status, expected) in cases {
        let t = FakeTransport::default().respond(Method::Post, HTTP_LOGIN, status);
        assert_eq!(login(&t, "http://host", "u", "p").await, Err(expected));
    }
}

#[tokio::test]
async fn login_succeeds_on_2xx() {
    let t = FakeTransport::default().respond(Method::Post, HTTPS_LOGIN, 200);
    assert_eq!(login(&t, "https://host", "u", "p").await, Ok(()));
}

#[tokio::test]
async fn login_405_probes_other_scheme() {
    // The other scheme rejects the credentials, which still proves it is
    // the real endpoint.
    let t = FakeTransport::default()
        .respond(Method::Post, HTTP_LOGIN, 405)
        .respond(Method::Post, HTTPS_LOGIN, 401);
    assert_eq!(
        login(&t, "http://host", "u", "p").await,
        Err(ConnectionErrorKind::WrongProtocol {
            correct_scheme: Scheme::Https
        })
    );
}

#[tokio::test]
async fn login_405_on_both_schemes_is_unclassified() {
    let t = FakeTransport::default()
        .respond(Method::Post, HTTP_LOGIN, 405)
        .respond(Method::Post, HTTPS_LOGIN, 405);
    assert_eq!(
        login(&t, "http://host", "u", "p").await,
        Err(ConnectionErrorKind::Unclassified)
    );
}

#[tokio::test]
async fn login_405_with_unreachable_probe_is_unclassified() {
    let t = FakeTransport::default().respond(Method::Post, HTTP_LOGIN, 405);
    assert_eq!(
        login(&t, "http://host", "u", "p").await,
        Err(ConnectionErrorKind::Unclassified)
    );
    assert_eq!(t.calls(), vec![HTTP_LOGIN, HTTPS_LOGIN]);
}

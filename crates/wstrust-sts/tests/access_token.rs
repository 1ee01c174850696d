use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use parking_lot::Mutex;
use tracing_test::traced_test;
use wstrust_core::Error;
use wstrust_sts::{
    AccessTokenClient, AccessTokenConfig, Clock, FixedClock, HttpRequest, HttpResponse, MemoryCache,
    TokenCache, Transport,
};

const ISSUED: &str = r#"{"access_token":"at-1","refresh_token":"rt-1","token_type":"bearer","expires_in":3600}"#;
const REFRESHED: &str = r#"{"access_token":"at-2","refresh_token":"rt-2","token_type":"bearer","expires_in":3600}"#;
const INVALID_GRANT: &str = r#"{"error":"invalid_grant","error_description":"Authorization code expired"}"#;

#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(responses: impl IntoIterator<Item = (u16, &'static str)>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(status, body)| HttpResponse {
                        status,
                        body: body.to_owned(),
                    })
                    .collect(),
            ),
            requests: Mutex::default(),
        })
    }

    fn bodies(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.body.clone()).collect()
    }
}

impl Transport for ScriptedTransport {
    fn post(&self, request: &HttpRequest) -> Result<HttpResponse, Error> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| Error::Transport("no scripted response left".into()))
    }
}

fn config() -> AccessTokenConfig {
    AccessTokenConfig::builder()
        .url("https://oauth.example/authorization/ws/oauth/v2/token")
        .client_id("client")
        .client_secret("s3cret")
        .redirect_uri("https://app.example/callback")
        .code("c0de")
        .cache_id("oauth")
        .build()
        .unwrap()
}

struct Fixture {
    client: AccessTokenClient,
    transport: Arc<ScriptedTransport>,
    cache: Arc<MemoryCache>,
    clock: Arc<FixedClock>,
}

fn fixture(config: AccessTokenConfig, responses: impl IntoIterator<Item = (u16, &'static str)>) -> Fixture {
    let transport = ScriptedTransport::new(responses);
    let cache = Arc::new(MemoryCache::new());
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()));
    let client = AccessTokenClient::new(config, transport.clone(), cache.clone()).with_clock(clock.clone());
    Fixture {
        client,
        transport,
        cache,
        clock,
    }
}

#[test]
fn first_token_uses_the_authorization_code() {
    let f = fixture(config(), [(200, ISSUED)]);
    let token = f.client.access_token(false, false).unwrap();
    assert_eq!(token.access_token(), "at-1");

    let requests = f.transport.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].content_type, "application/x-www-form-urlencoded");
    assert_eq!(
        requests[0].body,
        "grant_type=authorization_code&code=c0de&client_id=client&client_secret=s3cret\
         &redirect_uri=https%3A%2F%2Fapp.example%2Fcallback"
    );

    let stored = f.cache.get("oauth").unwrap().unwrap();
    assert_eq!(stored.lifetime.expires, f.clock.now() + Duration::hours(1));
}

#[traced_test]
#[test]
fn cached_token_is_reused_until_expiry() {
    let f = fixture(config(), [(200, ISSUED)]);
    f.client.access_token(false, false).unwrap();
    f.clock.advance(Duration::minutes(59));
    let token = f.client.access_token(false, false).unwrap();
    assert_eq!(token.access_token(), "at-1");
    assert_eq!(f.transport.bodies().len(), 1);
    assert!(logs_contain("using cached access token"));
}

#[test]
fn expired_token_is_renewed_with_the_refresh_token() {
    let f = fixture(config(), [(200, ISSUED), (200, REFRESHED)]);
    f.client.access_token(false, false).unwrap();
    f.clock.advance(Duration::minutes(61));
    let token = f.client.access_token(false, false).unwrap();
    assert_eq!(token.access_token(), "at-2");
    assert_eq!(
        f.transport.bodies()[1],
        "grant_type=refresh_token&refresh_token=rt-1&client_id=client&client_secret=s3cret"
    );
    assert_eq!(f.cache.get("oauth").unwrap().unwrap().lifetime.created, f.clock.now());
}

#[test]
fn force_refresh_skips_a_valid_token() {
    let f = fixture(config(), [(200, ISSUED), (200, REFRESHED)]);
    f.client.access_token(false, false).unwrap();
    let token = f.client.access_token(false, true).unwrap();
    assert_eq!(token.refresh_token(), Some("rt-2"));
    assert!(f.transport.bodies()[1].starts_with("grant_type=refresh_token&refresh_token=rt-1&"));
}

#[test]
fn no_cache_goes_back_to_the_authorization_code() {
    let f = fixture(config(), [(200, ISSUED), (200, REFRESHED)]);
    f.client.access_token(false, false).unwrap();
    f.client.access_token(true, false).unwrap();
    assert!(f.transport.bodies()[1].starts_with("grant_type=authorization_code&code=c0de&"));
    assert!(f.cache.get("oauth").unwrap().unwrap().payload.contains("at-2"));
}

#[test]
fn error_response_maps_to_access_token_error() {
    let f = fixture(config(), [(400, INVALID_GRANT)]);
    let err = f.client.access_token(false, false).unwrap_err();
    match err {
        Error::AccessToken { error, description } => {
            assert_eq!(error, "invalid_grant");
            assert_eq!(description, "Authorization code expired");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(f.cache.is_empty());
}

#[test]
fn missing_code_is_a_configuration_error() {
    let config = AccessTokenConfig::from_settings([
        ("url", "https://oauth.example/token"),
        ("client_id", "client"),
        ("client_secret", "s3cret"),
        ("redirect_uri", "https://app.example/callback"),
    ])
    .unwrap();
    let f = fixture(config, []);
    let err = f.client.access_token(false, false).unwrap_err();
    assert!(matches!(err, Error::Configuration { ref missing, .. } if missing == &["code"]));
    assert!(f.transport.bodies().is_empty());
}

//! Purpose: Run the single-pass, fire-and-forget identifier tracking flow.
//! Exports: `TrackingFlow`, `TrackingTransport`, `HttpTransport`,
//! `TrackingOutcome`, parameter/cookie key constants.
//! Role: Resolve a player id (SDK, then cookie), persist it, POST the
//! caller's tag parameters form-urlencoded to the extracted tracking URL.
//! Invariants: Precondition failures are fatal and precede any SDK or
//! network interaction.
//! Invariants: An unresolvable identifier is a silent no-op, not an error.
//! Invariants: The tracking response is never inspected.
#![allow(clippy::result_large_err)]

use super::cookie::CookieStore;
use super::sdk::PushSdk;
use crate::core::error::{Error, ErrorKind};
use serde_json::Value;
use std::collections::BTreeMap;
use time::Duration;
use tracing::debug;
use url::{Url, form_urlencoded};

pub const PLAYER_ID_COOKIE: &str = "OneSignalPlayerId";
pub const TRACKING_URL_KEY: &str = "trackingUrl";
pub const PLAYER_ID_KEY: &str = "playerId";

const COOKIE_TTL: Duration = Duration::days(30);

/// Caller-owned tag parameters. Must contain a `trackingUrl` key.
pub type TagParams = BTreeMap<String, String>;

pub trait TrackingTransport {
    fn post_form(&self, url: &Url, body: &str) -> Result<(), Error>;
}

impl<T: TrackingTransport + ?Sized> TrackingTransport for &T {
    fn post_form(&self, url: &Url, body: &str) -> Result<(), Error> {
        (**self).post_form(url, body)
    }
}

/// Production transport: one POST, response ignored by design.
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackingTransport for HttpTransport {
    fn post_form(&self, url: &Url, body: &str) -> Result<(), Error> {
        let response = self
            .agent
            .post(url.as_str())
            .set("Content-Type", "application/x-www-form-urlencoded")
            .send_string(body);
        match response {
            Ok(_resp) => Ok(()),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(Error::new(ErrorKind::Transport)
                    .with_message(format!("tracking endpoint returned status {code}"))
                    .with_status(code)
                    .with_body(body))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("tracking request failed")
                .with_source(err)),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TrackingOutcome {
    Sent { player_id: String },
    /// No identifier could be resolved; nothing was transmitted.
    Skipped,
}

pub struct TrackingFlow<S, C, T> {
    sdk: S,
    cookies: C,
    transport: T,
}

impl<S, C, T> TrackingFlow<S, C, T>
where
    S: PushSdk,
    C: CookieStore,
    T: TrackingTransport,
{
    pub fn new(sdk: S, cookies: C, transport: T) -> Self {
        Self {
            sdk,
            cookies,
            transport,
        }
    }

    /// Forwards SDK bootstrapping to the injected capability.
    pub fn initialize(&self, config: &Value) -> Result<(), Error> {
        self.sdk.initialize(config)
    }

    /// One pass: preconditions, identifier resolution, transmission.
    pub fn run(&self, params: &TagParams) -> Result<TrackingOutcome, Error> {
        let tracking_url = check_preconditions(params)?;

        let Some(player_id) = self.resolve_player_id()? else {
            debug!("no player id from sdk or cookie, skipping tracking");
            return Ok(TrackingOutcome::Skipped);
        };

        let mut form = form_urlencoded::Serializer::new(String::new());
        for (key, value) in params {
            if key == TRACKING_URL_KEY {
                continue;
            }
            form.append_pair(key, value);
        }
        form.append_pair(PLAYER_ID_KEY, &player_id);

        debug!(url = %tracking_url, "sending tracking request");
        self.transport.post_form(&tracking_url, &form.finish())?;
        Ok(TrackingOutcome::Sent { player_id })
    }

    fn resolve_player_id(&self) -> Result<Option<String>, Error> {
        if let Some(id) = self.sdk.resolve_identifier()? {
            if !id.is_empty() {
                self.cookies.set(PLAYER_ID_COOKIE, &id, COOKIE_TTL);
                return Ok(Some(id));
            }
        }
        Ok(self.cookies.get(PLAYER_ID_COOKIE).filter(|id| !id.is_empty()))
    }
}

fn check_preconditions(params: &TagParams) -> Result<Url, Error> {
    if params.is_empty() {
        return Err(Error::new(ErrorKind::Validation)
            .with_message("missing tag parameters")
            .with_field("tag_params"));
    }
    let raw = params
        .get(TRACKING_URL_KEY)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| {
            Error::new(ErrorKind::Validation)
                .with_message("missing trackingUrl in tag parameters")
                .with_field(TRACKING_URL_KEY)
        })?;
    Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Validation)
            .with_message("trackingUrl is not a valid url")
            .with_field(TRACKING_URL_KEY)
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::{
        PLAYER_ID_COOKIE, TRACKING_URL_KEY, TagParams, TrackingFlow, TrackingOutcome,
        TrackingTransport,
    };
    use crate::core::error::{Error, ErrorKind};
    use crate::tracking::cookie::{CookieStore, MemoryCookieStore};
    use crate::tracking::sdk::PushSdk;
    use serde_json::Value;
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use time::Duration;
    use url::Url;

    struct FakeSdk {
        identifier: Option<String>,
        initialized: Mutex<bool>,
        resolved: Mutex<u32>,
    }

    impl FakeSdk {
        fn with_identifier(id: &str) -> Self {
            Self {
                identifier: Some(id.to_string()),
                initialized: Mutex::new(false),
                resolved: Mutex::new(0),
            }
        }

        fn without_identifier() -> Self {
            Self {
                identifier: None,
                initialized: Mutex::new(false),
                resolved: Mutex::new(0),
            }
        }
    }

    impl PushSdk for FakeSdk {
        fn initialize(&self, _config: &Value) -> Result<(), Error> {
            *self.initialized.lock().unwrap() = true;
            Ok(())
        }

        fn resolve_identifier(&self) -> Result<Option<String>, Error> {
            *self.resolved.lock().unwrap() += 1;
            Ok(self.identifier.clone())
        }
    }

    #[derive(Default)]
    struct RecordingTransport {
        posts: Mutex<Vec<(Url, String)>>,
    }

    impl TrackingTransport for RecordingTransport {
        fn post_form(&self, url: &Url, body: &str) -> Result<(), Error> {
            self.posts.lock().unwrap().push((url.clone(), body.to_string()));
            Ok(())
        }
    }

    fn params() -> TagParams {
        let mut params = BTreeMap::new();
        params.insert(TRACKING_URL_KEY.to_string(), "https://t.example/x".to_string());
        params.insert("foo".to_string(), "bar".to_string());
        params
    }

    fn form_pairs(body: &str) -> BTreeMap<String, String> {
        url::form_urlencoded::parse(body.as_bytes())
            .into_owned()
            .collect()
    }

    #[test]
    fn sdk_identifier_is_persisted_and_sent() {
        let transport = RecordingTransport::default();
        let cookies = MemoryCookieStore::new();
        let flow = TrackingFlow::new(FakeSdk::with_identifier("abc123"), &cookies, &transport);

        let outcome = flow.run(&params()).expect("outcome");
        assert_eq!(
            outcome,
            TrackingOutcome::Sent {
                player_id: "abc123".to_string()
            }
        );
        assert_eq!(cookies.get(PLAYER_ID_COOKIE), Some("abc123".to_string()));

        let posts = transport.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        let (url, body) = &posts[0];
        assert_eq!(url.as_str(), "https://t.example/x");
        let pairs = form_pairs(body);
        assert_eq!(pairs.get("foo"), Some(&"bar".to_string()));
        assert_eq!(pairs.get("playerId"), Some(&"abc123".to_string()));
        assert!(!pairs.contains_key(TRACKING_URL_KEY));
    }

    #[test]
    fn cookie_fallback_when_sdk_has_no_identifier() {
        let transport = RecordingTransport::default();
        let cookies = MemoryCookieStore::new();
        cookies.set(PLAYER_ID_COOKIE, "cookie-id", Duration::days(30));
        let flow = TrackingFlow::new(FakeSdk::without_identifier(), &cookies, &transport);

        let outcome = flow.run(&params()).expect("outcome");
        assert_eq!(
            outcome,
            TrackingOutcome::Sent {
                player_id: "cookie-id".to_string()
            }
        );
    }

    #[test]
    fn no_identifier_anywhere_is_a_silent_no_op() {
        let transport = RecordingTransport::default();
        let flow = TrackingFlow::new(
            FakeSdk::without_identifier(),
            MemoryCookieStore::new(),
            &transport,
        );

        let outcome = flow.run(&params()).expect("outcome");
        assert_eq!(outcome, TrackingOutcome::Skipped);
        assert!(transport.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn empty_sdk_identifier_falls_back_to_cookie() {
        let transport = RecordingTransport::default();
        let cookies = MemoryCookieStore::new();
        cookies.set(PLAYER_ID_COOKIE, "stored", Duration::days(30));
        let flow = TrackingFlow::new(FakeSdk::with_identifier(""), &cookies, &transport);

        let outcome = flow.run(&params()).expect("outcome");
        assert_eq!(
            outcome,
            TrackingOutcome::Sent {
                player_id: "stored".to_string()
            }
        );
    }

    #[test]
    fn preconditions_fail_before_sdk_interaction() {
        let transport = RecordingTransport::default();
        let sdk = FakeSdk::with_identifier("abc123");
        let flow = TrackingFlow::new(&sdk, MemoryCookieStore::new(), &transport);

        let err = flow.run(&BTreeMap::new()).expect_err("empty params");
        assert_eq!(err.kind(), ErrorKind::Validation);

        let mut params = BTreeMap::new();
        params.insert("foo".to_string(), "bar".to_string());
        let err = flow.run(&params).expect_err("missing trackingUrl");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.field(), Some(TRACKING_URL_KEY));

        params.insert(TRACKING_URL_KEY.to_string(), "not-a-url".to_string());
        let err = flow.run(&params).expect_err("invalid trackingUrl");
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(*sdk.resolved.lock().unwrap(), 0);
        assert!(transport.posts.lock().unwrap().is_empty());
    }

    #[test]
    fn initialize_delegates_to_the_sdk() {
        let sdk = FakeSdk::without_identifier();
        let transport = RecordingTransport::default();
        let flow = TrackingFlow::new(&sdk, MemoryCookieStore::new(), &transport);
        flow.initialize(&serde_json::json!({"appId": "app-id"}))
            .expect("initialize");
        assert!(*sdk.initialized.lock().unwrap());
    }

    #[test]
    fn form_values_are_url_encoded() {
        let transport = RecordingTransport::default();
        let mut params = params();
        params.insert("label".to_string(), "a b&c".to_string());
        let flow = TrackingFlow::new(
            FakeSdk::with_identifier("abc123"),
            MemoryCookieStore::new(),
            &transport,
        );
        flow.run(&params).expect("outcome");

        let posts = transport.posts.lock().unwrap();
        let (_, body) = &posts[0];
        assert!(body.contains("label=a+b%26c"), "{body}");
    }
}

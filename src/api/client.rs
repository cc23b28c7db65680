//! Purpose: Provide the synchronous HTTP client for the OneSignal REST API.
//! Exports: `Client`, `Config`, `DevicePage`, `NotificationPage`.
//! Role: One method per remote endpoint; stateless beyond immutable config.
//! Invariants: Required inputs are validated before any network call.
//! Invariants: Responses are returned as raw bodies, never parsed or retried.
//! Invariants: add/edit device, new-session, track-open, and view-device omit
//! the Authorization header, matching the vendor integration contract.
#![allow(clippy::result_large_err)]

use super::notification::NotificationRequest;
use crate::core::error::{Error, ErrorKind};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub type ApiResult<T> = Result<T, Error>;

pub const DEFAULT_BASE_URL: &str = "https://onesignal.com/api/v1/";

/// Immutable client configuration. `auth_key` is the user-level key and is
/// only required by the app-management operations.
#[derive(Clone, Debug)]
pub struct Config {
    pub app_id: String,
    pub api_key: String,
    pub auth_key: Option<String>,
}

impl Config {
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            auth_key: None,
        }
    }

    pub fn with_auth_key(mut self, auth_key: impl Into<String>) -> Self {
        self.auth_key = Some(auth_key.into());
        self
    }
}

/// Pagination for the device-list endpoint. Passed through verbatim.
#[derive(Clone, Debug)]
pub struct DevicePage {
    pub app_id: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl DevicePage {
    pub fn new() -> Self {
        Self {
            app_id: None,
            limit: 300,
            offset: 0,
        }
    }
}

impl Default for DevicePage {
    fn default() -> Self {
        Self::new()
    }
}

/// Pagination for the notification-list endpoint. `kind` 3 selects
/// automated notifications, the vendor's documented default for this call.
#[derive(Clone, Debug)]
pub struct NotificationPage {
    pub app_id: Option<String>,
    pub limit: u32,
    pub offset: u32,
    pub kind: u32,
}

impl NotificationPage {
    pub fn new() -> Self {
        Self {
            app_id: None,
            limit: 50,
            offset: 0,
            kind: 3,
        }
    }
}

impl Default for NotificationPage {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    base_url: Url,
    config: Config,
    agent: ureq::Agent,
}

enum Auth<'a> {
    Basic(&'a str),
    None,
}

#[derive(Serialize)]
struct TrackOpenRequest<'a> {
    app_id: &'a str,
    opened: bool,
}

impl Client {
    pub fn new(config: Config) -> ApiResult<Self> {
        if config.app_id.is_empty() || config.api_key.is_empty() {
            return Err(Error::new(ErrorKind::Configuration)
                .with_message("missing app id or rest api key")
                .with_field("app_id/api_key"));
        }
        let base_url = parse_base_url(DEFAULT_BASE_URL)?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                config,
                agent,
            }),
        })
    }

    /// Points the client at a different API root, e.g. a test server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> ApiResult<Self> {
        let base_url = parse_base_url(&base_url.into())?;
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.base_url = base_url;
        } else {
            self.inner = Arc::new(ClientInner {
                base_url,
                config: self.inner.config.clone(),
                agent: self.inner.agent.clone(),
            });
        }
        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    // --- notifications ---

    pub fn create_notification(&self, request: &NotificationRequest) -> ApiResult<String> {
        let body = request.body(&self.inner.config.app_id)?;
        let url = self.endpoint_url(&["notifications"])?;
        self.request("POST", &url, self.api_key_auth(), Some(&body))
    }

    /// Cancels a scheduled notification that has not been delivered yet.
    pub fn delete_notification(&self, notification_id: &str) -> ApiResult<String> {
        ensure_id(notification_id, "notification_id")?;
        let mut url = self.endpoint_url(&["notifications", notification_id])?;
        self.append_app_id(&mut url, None);
        self.request("DELETE", &url, self.api_key_auth(), None::<&Value>)
    }

    pub fn view_notification(&self, notification_id: &str) -> ApiResult<String> {
        ensure_id(notification_id, "notification_id")?;
        let mut url = self.endpoint_url(&["notifications", notification_id])?;
        self.append_app_id(&mut url, None);
        self.request("GET", &url, self.api_key_auth(), None::<&Value>)
    }

    pub fn list_notifications(&self, page: &NotificationPage) -> ApiResult<String> {
        let mut url = self.endpoint_url(&["notifications"])?;
        self.append_app_id(&mut url, page.app_id.as_deref());
        url.query_pairs_mut()
            .append_pair("limit", &page.limit.to_string())
            .append_pair("offset", &page.offset.to_string())
            .append_pair("kind", &page.kind.to_string());
        self.request("GET", &url, self.api_key_auth(), None::<&Value>)
    }

    /// Reports a notification as opened. Unauthenticated by contract.
    pub fn track_open(&self, notification_id: &str) -> ApiResult<String> {
        ensure_id(notification_id, "notification_id")?;
        let body = TrackOpenRequest {
            app_id: &self.inner.config.app_id,
            opened: true,
        };
        let url = self.endpoint_url(&["notifications", notification_id])?;
        self.request("PUT", &url, Auth::None, Some(&body))
    }

    // --- apps (auth_key gated) ---

    pub fn view_apps(&self) -> ApiResult<String> {
        let auth = self.auth_key_auth()?;
        let url = self.endpoint_url(&["apps"])?;
        self.request("GET", &url, auth, None::<&Value>)
    }

    pub fn view_app(&self, app_id: Option<&str>) -> ApiResult<String> {
        let auth = self.auth_key_auth()?;
        let app_id = app_id.unwrap_or(&self.inner.config.app_id);
        let url = self.endpoint_url(&["apps", app_id])?;
        self.request("GET", &url, auth, None::<&Value>)
    }

    pub fn create_app(&self, params: &Value) -> ApiResult<String> {
        let auth = self.auth_key_auth()?;
        let map = ensure_object(params, "params")?;
        if !map.contains_key("name") || !map.contains_key("chrome_web_origin") {
            return Err(Error::new(ErrorKind::Validation)
                .with_message("missing app name or chrome_web_origin")
                .with_field("name/chrome_web_origin"));
        }
        let url = self.endpoint_url(&["apps"])?;
        self.request("POST", &url, auth, Some(params))
    }

    pub fn update_app(&self, app_id: Option<&str>, params: &Value) -> ApiResult<String> {
        let auth = self.auth_key_auth()?;
        ensure_object(params, "params")?;
        let app_id = app_id.unwrap_or(&self.inner.config.app_id);
        let url = self.endpoint_url(&["apps", app_id])?;
        self.request("PUT", &url, auth, Some(params))
    }

    // --- devices ---

    pub fn list_devices(&self, page: &DevicePage) -> ApiResult<String> {
        let mut url = self.endpoint_url(&["players"])?;
        self.append_app_id(&mut url, page.app_id.as_deref());
        url.query_pairs_mut()
            .append_pair("limit", &page.limit.to_string())
            .append_pair("offset", &page.offset.to_string());
        self.request("GET", &url, self.api_key_auth(), None::<&Value>)
    }

    pub fn view_device(&self, player_id: &str) -> ApiResult<String> {
        ensure_id(player_id, "player_id")?;
        let mut url = self.endpoint_url(&["players", player_id])?;
        self.append_app_id(&mut url, None);
        self.request("GET", &url, Auth::None, None::<&Value>)
    }

    /// Registers a new device. The caller-supplied options pass through
    /// verbatim; `app_id` is injected when absent.
    pub fn add_device(&self, options: &Value) -> ApiResult<String> {
        ensure_object(options, "options")?;
        let body = self.with_app_id(options);
        let url = self.endpoint_url(&["players"])?;
        self.request("POST", &url, Auth::None, Some(&body))
    }

    pub fn edit_device(&self, player_id: &str, options: &Value) -> ApiResult<String> {
        ensure_id(player_id, "player_id")?;
        ensure_object(options, "options")?;
        let body = self.with_app_id(options);
        let url = self.endpoint_url(&["players", player_id])?;
        self.request("PUT", &url, Auth::None, Some(&body))
    }

    pub fn new_session(&self, player_id: &str, options: &Value) -> ApiResult<String> {
        ensure_id(player_id, "player_id")?;
        ensure_object(options, "options")?;
        let url = self.endpoint_url(&["players", player_id, "on_session"])?;
        self.request("POST", &url, Auth::None, Some(options))
    }

    /// Requests a compressed CSV export of user data. Extra export options
    /// (e.g. `extra_fields`) are forwarded as a JSON body when supplied.
    pub fn csv_export(&self, app_id: Option<&str>, options: &Value) -> ApiResult<String> {
        let mut url = self.endpoint_url(&["players", "csv_export"])?;
        self.append_app_id(&mut url, app_id);
        let body = match options {
            Value::Object(map) if !map.is_empty() => Some(options),
            _ => None,
        };
        self.request("GET", &url, self.api_key_auth(), body)
    }

    // --- internals ---

    fn api_key_auth(&self) -> Auth<'_> {
        Auth::Basic(&self.inner.config.api_key)
    }

    fn auth_key_auth(&self) -> ApiResult<Auth<'_>> {
        match self.inner.config.auth_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(Auth::Basic(key)),
            _ => Err(Error::new(ErrorKind::Configuration)
                .with_message("missing user auth key for app management")
                .with_field("auth_key")),
        }
    }

    fn endpoint_url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.inner.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                Error::new(ErrorKind::Configuration)
                    .with_message("base url cannot be a base")
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    fn append_app_id(&self, url: &mut Url, app_id: Option<&str>) {
        let app_id = match app_id {
            Some(app_id) if !app_id.is_empty() => app_id,
            _ => &self.inner.config.app_id,
        };
        url.query_pairs_mut().append_pair("app_id", app_id);
    }

    fn with_app_id(&self, options: &Value) -> Value {
        let mut body = options.clone();
        if let Value::Object(map) = &mut body {
            map.entry("app_id")
                .or_insert_with(|| Value::String(self.inner.config.app_id.clone()));
        }
        body
    }

    fn request<T: Serialize>(
        &self,
        method: &str,
        url: &Url,
        auth: Auth<'_>,
        body: Option<&T>,
    ) -> ApiResult<String> {
        debug!(method, path = url.path(), "onesignal api request");
        let mut request = self.inner.agent.request(method, url.as_str());
        if let Auth::Basic(key) = auth {
            request = request.set("Authorization", &format!("Basic {key}"));
        }
        let response = match body {
            Some(body) => {
                let payload = serde_json::to_string(body).map_err(|err| {
                    Error::new(ErrorKind::Validation)
                        .with_message("failed to encode request json")
                        .with_source(err)
                })?;
                request
                    .set("Content-Type", "application/json; charset=utf-8")
                    .send_string(&payload)
            }
            None => request.call(),
        };

        match response {
            Ok(resp) => resp.into_string().map_err(|err| {
                Error::new(ErrorKind::Transport)
                    .with_message("failed to read response body")
                    .with_source(err)
            }),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(Error::new(ErrorKind::Transport)
                    .with_message(format!("remote error status {code}"))
                    .with_status(code)
                    .with_body(body))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Transport)
                .with_message("request failed")
                .with_source(err)),
        }
    }
}

fn parse_base_url(raw: &str) -> ApiResult<Url> {
    let url = Url::parse(raw).map_err(|err| {
        Error::new(ErrorKind::Configuration)
            .with_message("invalid api base url")
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Configuration)
            .with_message("api base url must use http or https scheme"));
    }
    Ok(url)
}

fn ensure_id(id: &str, field: &str) -> ApiResult<()> {
    if id.is_empty() {
        return Err(Error::new(ErrorKind::Validation)
            .with_message(format!("missing {field}"))
            .with_field(field));
    }
    Ok(())
}

fn ensure_object<'a>(
    value: &'a Value,
    field: &str,
) -> ApiResult<&'a serde_json::Map<String, Value>> {
    match value {
        Value::Object(map) if !map.is_empty() => Ok(map),
        _ => Err(Error::new(ErrorKind::Validation)
            .with_message(format!("{field} must be a non-empty object"))
            .with_field(field)),
    }
}

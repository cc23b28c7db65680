//! Purpose: Model create-notification payloads for the push and email channels.
//! Exports: `NotificationRequest`, `PushNotification`, `EmailNotification`.
//! Role: Validated request-body assembly; the client sends the result verbatim.
//! Invariants: Validation happens entirely before any network I/O.
//! Invariants: `Raw` bypasses variant validation by explicit caller choice.

use crate::core::error::{Error, ErrorKind};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use url::Url;

type ApiResult<T> = Result<T, Error>;

/// Hard cap on `include_email_tokens`, per the vendor contract.
pub const EMAIL_RECIPIENT_LIMIT: usize = 2000;

const ALL_SEGMENTS: &str = "All";

/// One create-notification request. Exactly one variant is sent per call.
#[derive(Clone, Debug)]
pub enum NotificationRequest {
    Push(PushNotification),
    Email(EmailNotification),
    /// Escape hatch: a fully caller-built field mapping, sent as-is.
    Raw(Value),
}

/// A web/mobile push. Title and content are localized maps keyed by
/// language code (`en` at minimum); `subtitle` mirrors the title map.
#[derive(Clone, Debug, Default)]
pub struct PushNotification {
    pub title: BTreeMap<String, String>,
    pub content: BTreeMap<String, String>,
    pub url: String,
    /// Explicit player ids. When empty, targeting falls back to segments.
    pub recipients: Vec<String>,
    /// Segment names used when no recipients are given; empty means "All".
    pub segments: Vec<String>,
    pub filters: Option<Value>,
}

impl PushNotification {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_text(
        mut self,
        lang: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let lang = lang.into();
        self.title.insert(lang.clone(), title.into());
        self.content.insert(lang, content.into());
        self
    }

    pub fn with_recipient(mut self, player_id: impl Into<String>) -> Self {
        self.recipients.push(player_id.into());
        self
    }

    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn with_filters(mut self, filters: Value) -> Self {
        self.filters = Some(filters);
        self
    }

    fn body(&self, app_id: &str) -> ApiResult<Value> {
        if self.title.is_empty() || self.content.is_empty() {
            return Err(Error::new(ErrorKind::Validation)
                .with_message("missing push title or content")
                .with_field("title/content"));
        }
        Url::parse(&self.url).map_err(|err| {
            Error::new(ErrorKind::Validation)
                .with_message("push url is not a valid url")
                .with_field("url")
                .with_source(err)
        })?;

        let mut fields = Map::new();
        fields.insert("app_id".into(), json!(app_id));
        fields.insert("url".into(), json!(self.url));
        fields.insert("contents".into(), json!(self.content));
        fields.insert("headings".into(), json!(self.title));
        fields.insert("subtitle".into(), json!(self.title));

        if self.recipients.is_empty() {
            let segments = if self.segments.is_empty() {
                vec![ALL_SEGMENTS.to_string()]
            } else {
                self.segments.clone()
            };
            fields.insert("included_segments".into(), json!(segments));
        } else {
            fields.insert("include_player_ids".into(), json!(self.recipients));
        }

        if let Some(filters) = &self.filters {
            fields.insert("filters".into(), filters.clone());
        }
        Ok(Value::Object(fields))
    }
}

/// An email notification addressed to explicit recipient tokens.
#[derive(Clone, Debug, Default)]
pub struct EmailNotification {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub from_name: Option<String>,
    pub from_address: Option<String>,
}

impl EmailNotification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_recipient(mut self, address: impl Into<String>) -> Self {
        self.recipients.push(address.into());
        self
    }

    pub fn with_from(
        mut self,
        name: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        self.from_name = Some(name.into());
        self.from_address = Some(address.into());
        self
    }

    fn body(&self, app_id: &str) -> ApiResult<Value> {
        if self.subject.is_empty() || self.body.is_empty() || self.recipients.is_empty() {
            return Err(Error::new(ErrorKind::Validation)
                .with_message("missing email subject, body, or recipients")
                .with_field("subject/body/to"));
        }
        if self.recipients.len() > EMAIL_RECIPIENT_LIMIT {
            return Err(Error::new(ErrorKind::Validation)
                .with_message(format!(
                    "email recipients exceed the limit of {EMAIL_RECIPIENT_LIMIT}"
                ))
                .with_field("to"));
        }

        let mut fields = Map::new();
        fields.insert("app_id".into(), json!(app_id));
        fields.insert("email_subject".into(), json!(self.subject));
        fields.insert("email_body".into(), json!(self.body));
        fields.insert("include_email_tokens".into(), json!(self.recipients));

        if let Some(name) = self.from_name.as_deref().filter(|name| !name.is_empty()) {
            fields.insert("email_from_name".into(), json!(name));
        }
        if let Some(address) = self
            .from_address
            .as_deref()
            .filter(|address| !address.is_empty())
        {
            fields.insert("email_from_address".into(), json!(address));
        }
        Ok(Value::Object(fields))
    }
}

impl NotificationRequest {
    /// Builds the JSON body sent to the create-notification endpoint.
    pub fn body(&self, app_id: &str) -> ApiResult<Value> {
        match self {
            NotificationRequest::Push(push) => push.body(app_id),
            NotificationRequest::Email(email) => email.body(app_id),
            NotificationRequest::Raw(fields) => match fields {
                Value::Object(map) if !map.is_empty() => Ok(fields.clone()),
                _ => Err(Error::new(ErrorKind::Validation)
                    .with_message("raw notification fields must be a non-empty object")
                    .with_field("options")),
            },
        }
    }
}

impl From<PushNotification> for NotificationRequest {
    fn from(push: PushNotification) -> Self {
        NotificationRequest::Push(push)
    }
}

impl From<EmailNotification> for NotificationRequest {
    fn from(email: EmailNotification) -> Self {
        NotificationRequest::Email(email)
    }
}

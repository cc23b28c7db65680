//! Purpose: Define the public API-client surface for the OneSignal wrapper.
//! Exports: Client construction, per-endpoint operations, request models.
//! Role: Stable boundary for embedding applications; hides request plumbing.
//! Invariants: Operations are stateless per call beyond the immutable config.

mod client;
mod notification;

pub use crate::core::error::{Error, ErrorKind};
pub use client::{
    ApiResult, Client, Config, DEFAULT_BASE_URL, DevicePage, NotificationPage,
};
pub use notification::{
    EMAIL_RECIPIENT_LIMIT, EmailNotification, NotificationRequest, PushNotification,
};

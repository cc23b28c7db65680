//! Purpose: Expose the page-load tracking flow and its injected capabilities.
//! Exports: `TrackingFlow`, `PushSdk`, `CookieStore`, `MemoryCookieStore`,
//! `TrackingTransport`, `HttpTransport`, `TrackingOutcome`.
//! Role: Stable boundary for embedding applications; one pass per page load.
//! Invariants: No retries, no response handling; tracking is best-effort.

mod cookie;
mod flow;
mod sdk;

pub use cookie::{CookieStore, MemoryCookieStore};
pub use flow::{
    HttpTransport, PLAYER_ID_COOKIE, PLAYER_ID_KEY, TRACKING_URL_KEY, TagParams,
    TrackingFlow, TrackingOutcome, TrackingTransport,
};
pub use sdk::PushSdk;

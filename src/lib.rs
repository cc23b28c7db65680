//! Purpose: Client wrapper for the OneSignal REST API plus a cookie-backed
//! player-identifier tracking flow.
//! Exports: `api` (client, request models, errors), `tracking` (flow and
//! injected capabilities), `core` (error types).
//! Role: Library crate embedded by host applications; no binaries.
//! Invariants: Both components are independent and share no runtime state.
pub mod api;
pub mod core;
pub mod tracking;

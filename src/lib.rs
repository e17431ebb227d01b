//! Bulk email sender: a recipient list, an SMTP profile, and a draft, sent
//! one message per recipient from a background worker.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod send;
pub mod store;
pub mod ui;

//! # Rekur - recurring tasks and reminders
//!
//! A command-line todo list whose tasks repeat daily, weekly or monthly and
//! can remind their owner before they are due.
//!
//! ## Features
//!
//! - **Recurrence**: `daily`, `every 2 weeks`, `monthly` and friends, with
//!   month-end clipping (Jan 31 is followed by Feb 28)
//! - **Reminders**: `1 hour before`, `30 minutes before`, `2 days before`
//! - **Next instances**: completing a recurring task creates the next one
//!   exactly once, even when the completion event is delivered twice
//! - **Sidecar integration**: task events and reminder jobs go to a Dapr
//!   sidecar when one is configured
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rekur::commands::Cli;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Cli::menu().await
//! }
//! ```

pub mod api;
pub mod commands;
pub mod db;
pub mod libs;

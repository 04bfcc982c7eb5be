//! adb_session: automation sessions over the Android Debug Bridge
//!
//! This library wraps the external `adb` binary with a stateful
//! [`DeviceSession`] bound to one device or emulator:
//! - UI snapshots: dump, pull and parse the on-screen hierarchy, then
//!   query it with XPath-subset selectors
//! - Gestures: taps (by point, bounds or selector), swipes, key presses
//! - Text entry: bulk and chunked input, input-field clearing
//! - App lifecycle: install, uninstall, clear data, permissions, launch
//! - Transfer: screenshots and device-to-host file pulls
//!
//! Everything shells out to `adb`; there is no adb protocol implementation
//! here. Sessions are sequential: operations take `&mut self` and block
//! until the underlying command finishes or times out.
//!
//! # Example
//!
//! ```no_run
//! use adb_session::{DeviceSession, Selector};
//!
//! #[tokio::main]
//! async fn main() -> adb_session::Result<()> {
//!     let mut session = DeviceSession::open("localhost", Some(5555)).await?;
//!
//!     session.refresh_snapshot().await?;
//!     if session.exists(&Selector::text("Sign in")) {
//!         session.tap_selector(&Selector::text("Sign in")).await?;
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;

// Configuration module
pub mod config;

// Process invocation
pub mod runner;

// Session and operation groups
pub mod apps;
pub mod gestures;
pub mod input;
pub mod session;
pub mod transfer;

// UI snapshot model
pub mod ui;

// Re-export commonly used types
pub use error::{AdbError, Result};

// Config re-exports
pub use config::{
    InputTimingConfig, LifecycleTimingConfig, SnapshotTimingConfig, TimingConfig, TIMING_CONFIG,
};

// Runner re-exports
pub use runner::{AdbRunner, CommandResult};

// Session re-exports
pub use gestures::GestureProfile;
pub use session::DeviceSession;

// UI re-exports
pub use ui::{Bounds, Selector, SelectorAttr, UiNode, UiSnapshot};

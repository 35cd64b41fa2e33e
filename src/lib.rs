//! sprig - Google Tasks in the terminal
//!
//! A read-only Google Tasks client: one interactive sign-in, then a durable
//! session that renews itself silently. The task list is fetched as a flat
//! snapshot and rebuilt into an ordered tree on every refresh; a failed
//! refresh never blanks the screen, it keeps the last good tree and raises
//! a banner.
//!
//! # Module Organization
//!
//! - `model`: task records, the tree builder, and configuration
//! - `auth`: credential storage, the OAuth authorizer, and the session
//!   state machine
//! - `remote`: the Google Tasks list endpoint
//! - `sync`: the refresh controller (stale-while-revalidate)
//! - `io`: config directory, persisted UI state, credential file watcher
//! - `cli`: command-line interface using clap
//! - `tui`: the interactive terminal UI

pub mod auth;
pub mod cli;
pub mod io;
pub mod model;
pub mod remote;
pub mod sync;
pub mod tui;
pub mod util;

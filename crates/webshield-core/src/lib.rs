// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Webshield — Core types shared across the bridge crates.
//
// This crate holds everything the bridge needs from the engine side of the
// boundary: the platform and its builder, the asynchronous set-up protocol
// for the scripting and filtering engines, the work scheduler, and the
// collaborator contracts (log sink, network sink, isolate provider). The
// filtering algorithms themselves live behind these contracts and are not
// part of this workspace.

pub mod config;
pub mod error;
pub mod platform;
pub mod scheduler;
pub mod types;

pub use config::PlatformConfig;
pub use error::{Result, WebshieldError};
pub use platform::{FilterEngine, FilterEngineParams, JsEngine, Platform, PlatformBuilder};
pub use scheduler::{Scheduler, Task, WorkerScheduler};
pub use types::*;

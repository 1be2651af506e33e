// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine-boundary value types and collaborator contracts.
//
// The sinks and the isolate provider are the surfaces the embedder plugs
// into; the engine consumes them and never inspects their implementations.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Result;

/// Application metadata handed to the scripting engine at set-up time.
///
/// Built once per set-up call from embedder-side fields and passed by value;
/// the engine keeps its own copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub application: String,
    pub application_version: String,
    pub locale: String,
    pub name: String,
    pub version: String,
    pub development_build: bool,
}

/// Severity levels accepted by a [`LogSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Log,
    Info,
    Warn,
    Error,
}

/// Embedder-supplied target for engine log output.
///
/// When a sink is installed at construction time the engine's own logging is
/// redirected to it; the crate's `tracing` instrumentation is separate and
/// unaffected.
pub trait LogSink: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, source: &str);
}

/// Request description handed to a [`NetworkSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// Response produced by a [`NetworkSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Embedder-supplied network fetcher.
///
/// The engine routes subscription downloads through this sink when one is
/// installed; whether a fetch runs synchronously or hops to another context
/// is the implementation's business.
pub trait NetworkSink: Send + Sync {
    fn fetch(&self, request: &NetworkRequest) -> Result<NetworkResponse>;
}

/// An externally managed scripting execution context.
///
/// Opaque to the bridge. The engine either creates and owns one, or borrows
/// one supplied by the embedder through an [`IsolateProvider`].
#[derive(Debug)]
pub struct Isolate {
    id: u64,
}

impl Isolate {
    pub fn new() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Process-unique identity of this context.
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for Isolate {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning access to an embedder-managed [`Isolate`].
///
/// `isolate()` must return the same context for the provider's whole
/// lifetime. Implementations never tear the context down — ownership stays
/// with whoever created it, and it has to outlive every engine that borrows
/// it.
pub trait IsolateProvider: Send + Sync {
    fn isolate(&self) -> &Isolate;
}

/// Opaque integral reference to a set-up script engine.
///
/// Stable for the lifetime of the owning platform; used by follow-up bridge
/// calls that address the script engine directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptEngineRef(pub u64);

impl std::fmt::Display for ScriptEngineRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

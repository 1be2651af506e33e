// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Webshield.

use thiserror::Error;

/// Top-level error type for all Webshield operations.
///
/// Every boundary operation returns `Result<T>`; an embedder converts these
/// into its own runtime's failure mechanism at the outermost call. No failure
/// is signalled by panicking across the boundary in either direction.
#[derive(Debug, Error)]
pub enum WebshieldError {
    // -- Platform construction --
    #[error("platform construction failed: {0}")]
    Construction(String),

    #[error("scheduler error: {0}")]
    Scheduler(String),

    // -- Engine set-up ordering --
    #[error("script engine is not set up")]
    ScriptEngineNotSetUp,

    #[error("script engine is already set up")]
    ScriptEngineAlreadySetUp,

    #[error("filter engine creation was never requested")]
    FilterEngineNotRequested,

    #[error("filter engine creation was already requested")]
    FilterEngineAlreadyRequested,

    // -- Bridge misuse --
    #[error("invalid or destroyed platform handle: {0}")]
    InvalidHandle(u64),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WebshieldError>;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Webshield — Managed-runtime boundary for the native filtering platform.
//
// An embedding runtime drives the engine through integral handles instead of
// raw pointers: `construct` registers a platform and returns its handle, the
// remaining operations look the handle up, and `destruct` retires it. The
// permission-callback marshaler keeps embedder code off the engine's own
// calling context by hopping through the platform's scheduler.
//
// Every operation returns `Result`; converting that into the embedding
// runtime's failure mechanism (exceptions, error codes) is the embedder's
// last step and never happens inside the engine.

pub mod api;
pub mod marshal;
pub mod registry;

pub use api::{
    ConstructOptions, SharedIsolate, construct, create_filter_engine, destruct,
    ensure_filter_engine, script_engine_ptr, set_up_script_engine,
};
pub use marshal::PermissionCallback;
pub use registry::PlatformHandle;

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Boundary operations.
//
// One function per boundary entry point. Each looks its handle up in the
// global registry, so a destroyed or never-issued handle fails with
// `InvalidHandle` at the offending call instead of corrupting state.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, instrument};

use webshield_core::error::Result;
use webshield_core::platform::FilterEngineParams;
use webshield_core::{
    AppInfo, Isolate, IsolateProvider, LogSink, NetworkSink, Platform, PlatformConfig,
    ScriptEngineRef,
};

use crate::marshal::{PermissionCallback, marshal_permission};
use crate::registry::{self, PlatformHandle, PlatformInstance};

/// Optional construction overrides, mirroring the `construct` arguments.
#[derive(Default)]
pub struct ConstructOptions {
    /// Redirect engine logging to this sink.
    pub log_sink: Option<Arc<dyn LogSink>>,
    /// Route engine network fetches through this sink.
    pub network_sink: Option<Arc<dyn NetworkSink>>,
    /// Root persistent engine state here.
    pub base_path: Option<PathBuf>,
    /// Engine-side settings travelling with the platform.
    pub config: PlatformConfig,
}

/// Non-owning holder handing an embedder-managed isolate to the engine.
///
/// The single accessor returns the borrowed context; dropping the holder
/// leaves the context untouched. Deliberately not `Clone`, so the reference
/// cannot be duplicated by accident.
pub struct SharedIsolate {
    isolate: Arc<Isolate>,
}

impl SharedIsolate {
    pub fn new(isolate: Arc<Isolate>) -> Self {
        Self { isolate }
    }
}

impl IsolateProvider for SharedIsolate {
    fn isolate(&self) -> &Isolate {
        &self.isolate
    }
}

/// Build a platform and register it, returning its handle.
///
/// Atomic: on any construction failure no handle is issued and nothing is
/// registered. The platform's scheduler is retained next to it; every
/// marshaled callback clones that reference.
#[instrument(skip_all, fields(base_path = ?options.base_path))]
pub fn construct(options: ConstructOptions) -> Result<PlatformHandle> {
    let mut builder = Platform::builder().config(options.config);
    if let Some(sink) = options.log_sink {
        builder = builder.log_sink(sink);
    }
    if let Some(sink) = options.network_sink {
        builder = builder.network_sink(sink);
    }
    if let Some(path) = options.base_path {
        builder = builder.base_path(path);
    }
    let platform = builder.build()?;
    let scheduler = platform.scheduler().clone();
    let handle = registry::global().insert(PlatformInstance { platform, scheduler });
    info!(%handle, "platform constructed");
    Ok(handle)
}

/// Destroy the platform behind `handle`.
///
/// Retires the handle and drops the platform, releasing the engines it owns
/// and its scheduler retention. Outstanding asynchronous work must have
/// drained first — that ordering is the caller's contract.
#[instrument]
pub fn destruct(handle: PlatformHandle) -> Result<()> {
    registry::global().remove(handle)?;
    info!(%handle, "platform destroyed");
    Ok(())
}

/// Set up the scripting engine, optionally binding an embedder-managed
/// isolate through a [`SharedIsolate`] holder.
#[instrument(skip(app_info, isolate), fields(shared_isolate = isolate.is_some()))]
pub fn set_up_script_engine(
    handle: PlatformHandle,
    app_info: AppInfo,
    isolate: Option<Arc<Isolate>>,
) -> Result<()> {
    let instance = registry::global().get(handle)?;
    let provider = isolate
        .map(|isolate| Box::new(SharedIsolate::new(isolate)) as Box<dyn IsolateProvider>);
    instance.platform.set_up_js_engine(app_info, provider)
}

/// Integral reference to the set-up script engine.
///
/// Fails with `ScriptEngineNotSetUp` when set-up has not happened yet.
pub fn script_engine_ptr(handle: PlatformHandle) -> Result<ScriptEngineRef> {
    let instance = registry::global().get(handle)?;
    Ok(instance.platform.js_engine()?.reference())
}

/// Request asynchronous filtering-engine creation.
///
/// A supplied permission callback is marshaled with the handle's scheduler
/// so it only ever runs on the scheduler's worker context; without one the
/// engine applies its default-allow policy. Returns once the request is
/// issued — `ensure_filter_engine` is the completion point.
#[instrument(skip(permission), fields(gated = permission.is_some()))]
pub fn create_filter_engine(
    handle: PlatformHandle,
    permission: Option<PermissionCallback>,
) -> Result<()> {
    let instance = registry::global().get(handle)?;
    let mut params = FilterEngineParams::default();
    if let Some(callback) = permission {
        params.permission_hook = Some(marshal_permission(instance.scheduler.clone(), callback));
    }
    instance.platform.create_filter_engine_async(params)
}

/// Block until the filtering-engine creation requested earlier completes.
#[instrument]
pub fn ensure_filter_engine(handle: PlatformHandle) -> Result<()> {
    let instance = registry::global().get(handle)?;
    instance.platform.filter_engine()?;
    Ok(())
}

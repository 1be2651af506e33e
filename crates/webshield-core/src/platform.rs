// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform lifecycle and asynchronous engine set-up.
//
// A platform is either fully constructed or not constructed at all: the
// builder validates everything fallible before assembling the value, so a
// failed `build()` leaves nothing behind for the caller to misuse.
//
// Filtering-engine creation is asynchronous. `create_filter_engine_async`
// issues the request on the platform's scheduler and returns; the blocking
// getter `filter_engine` is the synchronization point for callers that need
// the engine ready now. Script-engine set-up must precede the creation
// request.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use tracing::{debug, info, instrument};

use crate::config::PlatformConfig;
use crate::error::{Result, WebshieldError};
use crate::scheduler::{Scheduler, Task, WorkerScheduler};
use crate::types::{
    AppInfo, Isolate, IsolateProvider, LogLevel, LogSink, NetworkSink, ScriptEngineRef,
};

/// Completion continuation for one permission query. Invoked exactly once.
pub type Done = Box<dyn FnOnce(bool) + Send + 'static>;

/// Asynchronous permission check consulted during filtering-engine creation.
///
/// Receives the configured allowed-connection-type descriptor (possibly
/// absent) and a continuation that must eventually receive the decision.
/// The hook must not block the engine's calling context.
pub type PermissionHook = Arc<dyn Fn(Option<&str>, Done) + Send + Sync>;

/// Parameters for asynchronous filtering-engine creation.
#[derive(Default)]
pub struct FilterEngineParams {
    /// Consulted for the subscription-download decision during creation.
    /// Absent means default-allow.
    pub permission_hook: Option<PermissionHook>,
}

/// How a script engine is bound to its execution context.
enum IsolateBinding {
    /// Created here, torn down with the engine.
    Owned(Isolate),
    /// Borrowed from the embedder; never torn down by the engine.
    Shared(Box<dyn IsolateProvider>),
}

/// The scripting engine, opaque beyond its identity and its set-up inputs.
pub struct JsEngine {
    id: u64,
    app_info: AppInfo,
    isolate: IsolateBinding,
}

impl JsEngine {
    /// Stable integral reference for follow-up bridge calls.
    pub fn reference(&self) -> ScriptEngineRef {
        ScriptEngineRef(self.id)
    }

    pub fn app_info(&self) -> &AppInfo {
        &self.app_info
    }

    /// Identity of the execution context this engine runs in.
    pub fn isolate_id(&self) -> u64 {
        match &self.isolate {
            IsolateBinding::Owned(isolate) => isolate.id(),
            IsolateBinding::Shared(provider) => provider.isolate().id(),
        }
    }

    /// Whether the execution context is borrowed from the embedder.
    pub fn uses_shared_isolate(&self) -> bool {
        matches!(self.isolate, IsolateBinding::Shared(_))
    }
}

/// The filtering engine, opaque beyond what creation decided.
pub struct FilterEngine {
    downloads_allowed: bool,
}

impl FilterEngine {
    /// Outcome of the permission query raised during creation
    /// (`true` when no permission hook was installed).
    pub fn downloads_allowed(&self) -> bool {
        self.downloads_allowed
    }
}

enum FilterEngineState {
    NotRequested,
    Pending,
    Ready(Arc<FilterEngine>),
}

struct FilterSlot {
    state: Mutex<FilterEngineState>,
    ready: Condvar,
}

impl FilterSlot {
    fn complete(&self, engine: FilterEngine) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = FilterEngineState::Ready(Arc::new(engine));
        self.ready.notify_all();
    }
}

/// Builder for [`Platform`].
///
/// A scheduler is always retained: either the one injected by the caller or
/// a freshly spawned [`WorkerScheduler`]. The three overrides mirror the
/// boundary's `construct` arguments.
#[derive(Default)]
pub struct PlatformBuilder {
    scheduler: Option<Scheduler>,
    log_sink: Option<Arc<dyn LogSink>>,
    network_sink: Option<Arc<dyn NetworkSink>>,
    base_path: Option<PathBuf>,
    config: PlatformConfig,
}

impl PlatformBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing scheduler instead of spawning a default worker.
    pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Redirect engine logging to the given sink.
    pub fn log_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = Some(sink);
        self
    }

    /// Route engine network fetches through the given sink.
    pub fn network_sink(mut self, sink: Arc<dyn NetworkSink>) -> Self {
        self.network_sink = Some(sink);
        self
    }

    /// Root persistent engine state at the given path.
    pub fn base_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    pub fn config(mut self, config: PlatformConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the platform.
    ///
    /// Fallible steps run before anything observable is assembled, in
    /// particular before the default worker thread is spawned, so a failure
    /// leaves no partial platform and no stray worker.
    #[instrument(skip_all, fields(base_path = ?self.base_path))]
    pub fn build(self) -> Result<Platform> {
        let base_path = match self.base_path.or_else(|| self.config.base_path.clone()) {
            Some(path) => {
                std::fs::create_dir_all(&path).map_err(|e| {
                    WebshieldError::Construction(format!(
                        "storage root {}: {e}",
                        path.display()
                    ))
                })?;
                Some(path)
            }
            None => None,
        };

        let scheduler = match self.scheduler {
            Some(scheduler) => scheduler,
            None => WorkerScheduler::spawn()?.handle(),
        };

        info!("platform constructed");
        if let Some(sink) = &self.log_sink {
            sink.log(LogLevel::Info, "platform constructed", "core");
        }

        Ok(Platform {
            scheduler,
            log_sink: self.log_sink,
            network_sink: self.network_sink,
            base_path,
            config: self.config,
            js_engine: Mutex::new(None),
            filter: Arc::new(FilterSlot {
                state: Mutex::new(FilterEngineState::NotRequested),
                ready: Condvar::new(),
            }),
        })
    }
}

/// One native platform instance: owns its engines, retains its scheduler.
pub struct Platform {
    scheduler: Scheduler,
    log_sink: Option<Arc<dyn LogSink>>,
    network_sink: Option<Arc<dyn NetworkSink>>,
    base_path: Option<PathBuf>,
    config: PlatformConfig,
    js_engine: Mutex<Option<Arc<JsEngine>>>,
    filter: Arc<FilterSlot>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

impl Platform {
    pub fn builder() -> PlatformBuilder {
        PlatformBuilder::new()
    }

    /// The scheduler retained at construction time.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Network override installed at construction time, if any.
    pub fn network_sink(&self) -> Option<&Arc<dyn NetworkSink>> {
        self.network_sink.as_ref()
    }

    /// Storage root, if persistent state was configured.
    pub fn base_path(&self) -> Option<&PathBuf> {
        self.base_path.as_ref()
    }

    /// Set up the scripting engine.
    ///
    /// With a provider the engine runs in the embedder's execution context
    /// and never tears it down; without one it creates and owns its own.
    /// A second call is rejected with `ScriptEngineAlreadySetUp`.
    #[instrument(skip_all, fields(application = %app_info.application))]
    pub fn set_up_js_engine(
        &self,
        app_info: AppInfo,
        isolate: Option<Box<dyn IsolateProvider>>,
    ) -> Result<()> {
        static NEXT_ENGINE_ID: AtomicU64 = AtomicU64::new(1);

        let mut slot = self.js_engine.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Err(WebshieldError::ScriptEngineAlreadySetUp);
        }

        let binding = match isolate {
            Some(provider) => IsolateBinding::Shared(provider),
            None => IsolateBinding::Owned(Isolate::new()),
        };
        let engine = JsEngine {
            id: NEXT_ENGINE_ID.fetch_add(1, Ordering::Relaxed),
            app_info,
            isolate: binding,
        };
        info!(
            engine = engine.id,
            shared_isolate = engine.uses_shared_isolate(),
            "script engine set up"
        );
        if let Some(sink) = &self.log_sink {
            sink.log(LogLevel::Info, "script engine set up", "core");
        }
        *slot = Some(Arc::new(engine));
        Ok(())
    }

    /// The set-up scripting engine, or `ScriptEngineNotSetUp`.
    pub fn js_engine(&self) -> Result<Arc<JsEngine>> {
        self.js_engine
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(WebshieldError::ScriptEngineNotSetUp)
    }

    /// Request asynchronous filtering-engine creation.
    ///
    /// Returns once the request is issued on the scheduler, not once
    /// creation completes. Requires a set-up script engine; at most one
    /// creation per platform. When a permission hook is installed, creation
    /// raises one query with the configured allowed-connection-type and
    /// completes when the continuation fires; otherwise it completes with
    /// downloads allowed.
    #[instrument(skip_all)]
    pub fn create_filter_engine_async(&self, params: FilterEngineParams) -> Result<()> {
        // Ordering precondition: the script engine must exist first.
        self.js_engine()?;

        {
            let mut state = self.filter.state.lock().unwrap_or_else(PoisonError::into_inner);
            match *state {
                FilterEngineState::NotRequested => *state = FilterEngineState::Pending,
                _ => return Err(WebshieldError::FilterEngineAlreadyRequested),
            }
        }

        let slot = self.filter.clone();
        let hook = params.permission_hook;
        let connection_type = self.config.allowed_connection_type.clone();
        let log_sink = self.log_sink.clone();

        let task: Task = Box::new(move || {
            let done: Done = Box::new(move |allowed: bool| {
                debug!(allowed, "filter engine creation completed");
                if let Some(sink) = &log_sink {
                    sink.log(LogLevel::Info, "filter engine ready", "core");
                }
                slot.complete(FilterEngine {
                    downloads_allowed: allowed,
                });
            });
            match hook {
                Some(hook) => hook(connection_type.as_deref(), done),
                None => done(true),
            }
        });
        (self.scheduler)(task);
        debug!("filter engine creation requested");
        Ok(())
    }

    /// Block until the filtering engine requested earlier is ready.
    ///
    /// Errors with `FilterEngineNotRequested` instead of waiting forever
    /// when no creation request was ever issued.
    pub fn filter_engine(&self) -> Result<Arc<FilterEngine>> {
        let mut state = self.filter.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*state {
                FilterEngineState::NotRequested => {
                    return Err(WebshieldError::FilterEngineNotRequested);
                }
                FilterEngineState::Ready(engine) => return Ok(engine.clone()),
                FilterEngineState::Pending => {
                    state = self
                        .filter
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }
}

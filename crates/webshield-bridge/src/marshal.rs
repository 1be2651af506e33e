// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Permission-callback marshaling.
//
// The engine raises permission queries on its own calling context, where
// embedder code must not run. The marshaler copies the query's argument,
// hops through the platform's scheduler, and delivers the predicate's answer
// to the engine's continuation from inside that single scheduled task.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::warn;

use webshield_core::Scheduler;
use webshield_core::platform::{Done, PermissionHook};

/// Embedder-side predicate deciding whether a subscription download may
/// proceed for the given connection type.
pub type PermissionCallback = Arc<dyn Fn(Option<&str>) -> bool + Send + Sync>;

/// Adapt an embedder predicate to the engine's asynchronous permission
/// signature.
///
/// Guarantees, per query:
/// - the optional argument is copied into a shared buffer before the hook
///   returns — the engine's storage need not outlive the raising call;
/// - the predicate runs inside one task on the scheduler's worker context,
///   never inline on the engine's calling context;
/// - the continuation fires exactly once. A panicking predicate is caught
///   and delivered as a deny rather than crossing into the engine.
pub fn marshal_permission(scheduler: Scheduler, callback: PermissionCallback) -> PermissionHook {
    Arc::new(move |connection_type: Option<&str>, done: Done| {
        let connection_type: Option<Arc<str>> = connection_type.map(Arc::from);
        let callback = callback.clone();
        scheduler(Box::new(move || {
            let decision = catch_unwind(AssertUnwindSafe(|| {
                callback(connection_type.as_deref())
            }))
            .unwrap_or_else(|_| {
                warn!("permission callback panicked; denying download");
                false
            });
            done(decision);
        }));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use webshield_core::WorkerScheduler;

    fn scheduler() -> Scheduler {
        WorkerScheduler::spawn().expect("spawn").handle()
    }

    /// Drive one query through the marshaler and collect the delivered result.
    fn run_query(hook: &PermissionHook, arg: Option<&str>) -> bool {
        let (tx, rx) = mpsc::channel();
        let tx = Mutex::new(tx);
        hook(
            arg,
            Box::new(move |decision| {
                tx.lock().expect("lock").send(decision).expect("send");
            }),
        );
        rx.recv_timeout(Duration::from_secs(5)).expect("completed")
    }

    #[test]
    fn present_absent_and_empty_arguments_propagate() {
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let callback: PermissionCallback = {
            let seen = seen.clone();
            Arc::new(move |arg| {
                seen.lock().expect("lock").push(arg.map(str::to_owned));
                true
            })
        };
        let hook = marshal_permission(scheduler(), callback);

        assert!(run_query(&hook, Some("wifi")));
        assert!(run_query(&hook, None));
        assert!(run_query(&hook, Some("")));

        let seen = seen.lock().expect("lock").clone();
        assert_eq!(
            seen,
            vec![Some("wifi".into()), None, Some(String::new())],
            "empty string is a present value, distinct from an absent one"
        );
    }

    #[test]
    fn predicate_runs_on_the_scheduler_context() {
        let caller = thread::current().id();
        let observer: PermissionCallback = Arc::new(move |_| thread::current().id() != caller);
        let hook = marshal_permission(scheduler(), observer);
        assert!(
            run_query(&hook, None),
            "predicate must not run inline on the raising thread"
        );
    }

    #[test]
    fn every_concurrent_query_completes_exactly_once() {
        const QUERIES: usize = 32;
        let callback: PermissionCallback = Arc::new(|arg| arg == Some("allowed"));
        let hook = marshal_permission(scheduler(), callback);

        let completions = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let raisers: Vec<_> = (0..QUERIES)
            .map(|i| {
                let hook = hook.clone();
                let completions = completions.clone();
                let tx = Mutex::new(tx.clone());
                thread::spawn(move || {
                    let arg = if i % 2 == 0 { Some("allowed") } else { Some("metered") };
                    hook(
                        arg,
                        Box::new(move |decision| {
                            completions.fetch_add(1, Ordering::SeqCst);
                            tx.lock().expect("lock").send(decision).expect("send");
                        }),
                    );
                })
            })
            .collect();
        for raiser in raisers {
            raiser.join().expect("join");
        }

        let mut allowed = 0;
        for _ in 0..QUERIES {
            if rx.recv_timeout(Duration::from_secs(5)).expect("completion") {
                allowed += 1;
            }
        }
        assert_eq!(completions.load(Ordering::SeqCst), QUERIES);
        assert_eq!(allowed, QUERIES / 2);
        assert!(
            rx.recv_timeout(Duration::from_millis(100)).is_err(),
            "no continuation may fire twice"
        );
    }

    #[test]
    fn panicking_predicate_still_completes_with_deny() {
        let callback: PermissionCallback = Arc::new(|_| panic!("embedder bug"));
        let hook = marshal_permission(scheduler(), callback);
        assert!(!run_query(&hook, Some("wifi")));
    }
}

//! Lifecycle callbacks.
//!
//! | List | Runs | Signature |
//! |---|---|---|
//! | boot | once per callback, on the next [`CallbackManager::on_boot`] | `Fn()` |
//! | before | before the target is invoked | `Fn(&Target, &RequestScope) -> Result<HookResult, BoxError>` |
//! | after | after the target returned | `Fn(&Target, bool, &RequestScope) -> Result<HookResult, BoxError>` |
//! | invalid | when the request cannot be honored | `Fn(&RequestError, &RequestScope) -> Result<(), BoxError>` |
//! | error | when the call failed | `Fn(&Error, &RequestScope) -> Result<(), BoxError>` |
//! | init | after a callable instance is constructed | `Fn(&mut dyn AnyCallable, &Context) -> Result<(), BoxError>` |
//!
//! Lists run in registration order. A before-callback returning
//! [`HookResult::Stop`] ends the request: the remaining before-callbacks are
//! skipped, the target is not invoked and no after-callback runs. After-callbacks receive the end flag, set once any
//! previous after-callback returned `Stop`.

use crate::scope::RequestScope;
use domwire_core::{
    AnyCallable, BoxError, Context, Error, HookResult, RequestError, Target,
};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::debug;

/// A boot callback.
pub type BootCallback = Arc<dyn Fn() + Send + Sync>;
/// A before-request callback.
pub type BeforeCallback =
    Arc<dyn Fn(&Target, &RequestScope<'_>) -> Result<HookResult, BoxError> + Send + Sync>;
/// An after-request callback.
pub type AfterCallback =
    Arc<dyn Fn(&Target, bool, &RequestScope<'_>) -> Result<HookResult, BoxError> + Send + Sync>;
/// An invalid-request callback.
pub type InvalidCallback =
    Arc<dyn Fn(&RequestError, &RequestScope<'_>) -> Result<(), BoxError> + Send + Sync>;
/// An error callback.
pub type ErrorCallback = Arc<dyn Fn(&Error, &RequestScope<'_>) -> Result<(), BoxError> + Send + Sync>;
/// An instance initialization callback.
pub type InitCallback =
    Arc<dyn Fn(&mut dyn AnyCallable, &Context) -> Result<(), BoxError> + Send + Sync>;

fn snapshot<T: Clone>(list: &RwLock<Vec<T>>) -> Vec<T> {
    list.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn push<T>(list: &RwLock<Vec<T>>, item: T) {
    list.write().unwrap_or_else(PoisonError::into_inner).push(item);
}

/// Ordered lists of lifecycle callbacks.
#[derive(Default)]
pub struct CallbackManager {
    boot: RwLock<Vec<BootCallback>>,
    boot_cursor: Mutex<usize>,
    before: RwLock<Vec<BeforeCallback>>,
    after: RwLock<Vec<AfterCallback>>,
    invalid: RwLock<Vec<InvalidCallback>>,
    error: RwLock<Vec<ErrorCallback>>,
    init: RwLock<Vec<InitCallback>>,
}

impl std::fmt::Debug for CallbackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackManager")
            .field("boot", &snapshot(&self.boot).len())
            .field("before", &snapshot(&self.before).len())
            .field("after", &snapshot(&self.after).len())
            .finish_non_exhaustive()
    }
}

impl CallbackManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Add a boot callback.
    pub fn boot<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        push(&self.boot, Arc::new(callback));
    }

    /// Add a before-request callback.
    pub fn before<F>(&self, callback: F)
    where
        F: Fn(&Target, &RequestScope<'_>) -> Result<HookResult, BoxError> + Send + Sync + 'static,
    {
        push(&self.before, Arc::new(callback));
    }

    /// Add an after-request callback.
    pub fn after<F>(&self, callback: F)
    where
        F: Fn(&Target, bool, &RequestScope<'_>) -> Result<HookResult, BoxError>
            + Send
            + Sync
            + 'static,
    {
        push(&self.after, Arc::new(callback));
    }

    /// Add an invalid-request callback.
    pub fn invalid<F>(&self, callback: F)
    where
        F: Fn(&RequestError, &RequestScope<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        push(&self.invalid, Arc::new(callback));
    }

    /// Add an error callback.
    pub fn error<F>(&self, callback: F)
    where
        F: Fn(&Error, &RequestScope<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        push(&self.error, Arc::new(callback));
    }

    /// Add an instance initialization callback.
    pub fn init<F>(&self, callback: F)
    where
        F: Fn(&mut dyn AnyCallable, &Context) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        push(&self.init, Arc::new(callback));
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Run the boot callbacks added since the previous call.
    pub fn on_boot(&self) {
        let pending = {
            let mut cursor = self.boot_cursor.lock().unwrap_or_else(PoisonError::into_inner);
            let boot = self.boot.read().unwrap_or_else(PoisonError::into_inner);
            let pending: Vec<BootCallback> = boot[(*cursor).min(boot.len())..].to_vec();
            *cursor = boot.len();
            pending
        };
        if !pending.is_empty() {
            debug!(count = pending.len(), "running boot callbacks");
        }
        for callback in pending {
            callback();
        }
    }

    /// Run the before-request callbacks.
    ///
    /// The first callback returning `Stop` ends the request: the callbacks
    /// after it do not run.
    pub fn on_before(&self, target: &Target, scope: &RequestScope<'_>) -> Result<HookResult, Error> {
        for callback in snapshot(&self.before) {
            if callback(target, scope)?.is_stop() {
                return Ok(HookResult::Stop);
            }
        }
        Ok(HookResult::Next)
    }

    /// Run the after-request callbacks.
    ///
    /// Returns `true` if one of them ended the request.
    pub fn on_after(&self, target: &Target, scope: &RequestScope<'_>) -> Result<bool, Error> {
        let mut ended = false;
        for callback in snapshot(&self.after) {
            if callback(target, ended, scope)?.is_stop() {
                ended = true;
            }
        }
        Ok(ended)
    }

    /// Run the invalid-request callbacks.
    ///
    /// Returns `false` if none is registered, in which case the caller
    /// propagates the error.
    pub fn on_invalid(&self, err: &RequestError, scope: &RequestScope<'_>) -> Result<bool, Error> {
        let callbacks = snapshot(&self.invalid);
        for callback in &callbacks {
            callback(err, scope)?;
        }
        Ok(!callbacks.is_empty())
    }

    /// Run the error callbacks.
    ///
    /// Returns `false` if none is registered, in which case the caller
    /// propagates the error.
    pub fn on_error(&self, err: &Error, scope: &RequestScope<'_>) -> Result<bool, Error> {
        let callbacks = snapshot(&self.error);
        for callback in &callbacks {
            callback(err, scope)?;
        }
        Ok(!callbacks.is_empty())
    }

    /// Run the initialization callbacks on a new instance.
    pub fn on_init(&self, instance: &mut dyn AnyCallable, context: &Context) -> Result<(), Error> {
        for callback in snapshot(&self.init) {
            callback(&mut *instance, context)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, container::Container, testing::CallRecorder};
    use domwire_core::Services;

    #[test]
    fn test_boot_cursor_is_monotonic() {
        let manager = CallbackManager::new();
        let recorder = CallRecorder::new();

        let r = recorder.clone();
        manager.boot(move || r.record("a"));
        manager.on_boot();
        manager.on_boot();

        let r = recorder.clone();
        manager.boot(move || r.record("b"));
        manager.on_boot();
        manager.on_boot();

        assert_eq!(recorder.calls(), ["a", "b"]);
    }

    #[test]
    fn test_before_stop_skips_later_callbacks() {
        let manager = CallbackManager::new();
        let recorder = CallRecorder::new();

        let r = recorder.clone();
        manager.before(move |_, _| {
            r.record("first");
            Ok(HookResult::Stop)
        });
        let r = recorder.clone();
        manager.before(move |_, scope| {
            r.record("second");
            scope.response().script("late()");
            Ok(HookResult::Next)
        });

        let services = Services::default();
        let container = Container::new();
        let scope = RequestScope::new(&Config::default(), &services, &container, &manager);
        let target = Target::Function {
            name: "run".into(),
            args: Vec::new(),
        };
        assert!(manager.on_before(&target, &scope).unwrap().is_stop());
        assert_eq!(recorder.calls(), ["first"]);
        assert!(scope.response().is_empty());
    }
}

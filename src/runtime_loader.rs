//! Load-once access to the external runtime.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared};

use crate::error::SessionError;
use crate::host::HostResult;
use crate::runtime::{Capabilities, SkeletalRuntime};

type PendingLoad<R> = Shared<LocalBoxFuture<'static, HostResult<Rc<R>>>>;

enum LoadSlot<R> {
    Empty,
    Pending(PendingLoad<R>),
    Loaded(Rc<R>, Capabilities),
}

/// A loaded runtime with its capability descriptor.
pub struct LoadedRuntime<R> {
    pub runtime: Rc<R>,
    pub capabilities: Capabilities,
    /// `true` only for the requester that resolved the first load
    pub fresh: bool,
}

/// Loads the runtime at most once.
///
/// Concurrent requesters during a load await the same shared future, and
/// later requesters get the cached handle immediately. A failed load empties
/// the slot so an explicit retry can try again.
pub struct RuntimeLoader<R> {
    slot: RefCell<LoadSlot<R>>,
}

impl<R> Default for RuntimeLoader<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> RuntimeLoader<R> {
    pub fn new() -> Self {
        Self {
            slot: RefCell::new(LoadSlot::Empty),
        }
    }

    /// Check whether the runtime has finished loading.
    pub fn is_loaded(&self) -> bool {
        matches!(*self.slot.borrow(), LoadSlot::Loaded(..))
    }

    /// Capabilities of the loaded runtime, if any.
    pub fn capabilities(&self) -> Option<Capabilities> {
        match &*self.slot.borrow() {
            LoadSlot::Loaded(_, caps) => Some(*caps),
            _ => None,
        }
    }
}

impl<R: SkeletalRuntime + 'static> RuntimeLoader<R> {
    /// Return the runtime, starting a load with `start` only when none is
    /// loaded or in flight.
    pub async fn ensure_loaded<F>(&self, start: F) -> Result<LoadedRuntime<R>, SessionError>
    where
        F: FnOnce() -> LocalBoxFuture<'static, HostResult<Rc<R>>>,
    {
        let pending = {
            let mut slot = self.slot.borrow_mut();
            match &*slot {
                LoadSlot::Loaded(runtime, caps) => {
                    log::debug!(target: "skelview", "runtime already loaded");
                    return Ok(LoadedRuntime {
                        runtime: runtime.clone(),
                        capabilities: *caps,
                        fresh: false,
                    });
                }
                LoadSlot::Pending(pending) => pending.clone(),
                LoadSlot::Empty => {
                    let pending = start().shared();
                    *slot = LoadSlot::Pending(pending.clone());
                    pending
                }
            }
        };

        let outcome = pending.await;

        let mut slot = self.slot.borrow_mut();
        match outcome {
            Ok(runtime) => {
                if let LoadSlot::Loaded(loaded, caps) = &*slot {
                    return Ok(LoadedRuntime {
                        runtime: loaded.clone(),
                        capabilities: *caps,
                        fresh: false,
                    });
                }
                let capabilities = Capabilities::probe(runtime.as_ref());
                *slot = LoadSlot::Loaded(runtime.clone(), capabilities);
                Ok(LoadedRuntime {
                    runtime,
                    capabilities,
                    fresh: true,
                })
            }
            Err(message) => {
                if matches!(*slot, LoadSlot::Pending(_)) {
                    *slot = LoadSlot::Empty;
                }
                Err(SessionError::RuntimeLoad(message))
            }
        }
    }
}

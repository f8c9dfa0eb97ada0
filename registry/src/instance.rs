//! Delivery of mounted component instances.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Opaque handle to whatever the binding layer mounted for a field.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Receives the instance bound to a field, or `None` when it goes away.
pub trait InstanceSink: Send + Sync {
    fn attach(&self, instance: Option<Instance>);
}

/// Forwards instances to a callback.
pub struct CallbackSink {
    callback: Box<dyn Fn(Option<Instance>) + Send + Sync>,
}

impl CallbackSink {
    pub fn new(callback: impl Fn(Option<Instance>) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl InstanceSink for CallbackSink {
    fn attach(&self, instance: Option<Instance>) {
        (self.callback)(instance);
    }
}

impl fmt::Debug for CallbackSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSink").finish_non_exhaustive()
    }
}

/// Stores the latest instance in a cell.
#[derive(Default)]
pub struct CellSink {
    current: Mutex<Option<Instance>>,
}

impl CellSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The instance currently held, if any.
    pub fn current(&self) -> Option<Instance> {
        self.current.lock().clone()
    }
}

impl InstanceSink for CellSink {
    fn attach(&self, instance: Option<Instance>) {
        *self.current.lock() = instance;
    }
}

impl fmt::Debug for CellSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellSink")
            .field("attached", &self.current.lock().is_some())
            .finish()
    }
}

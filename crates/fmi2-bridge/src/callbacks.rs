//! The `fmi2CallbackFunctions` record supplied at instantiation time.
//!
//! One record per bridge, heap-pinned so its address stays stable for
//! the life of the bridge; every component instantiated through that
//! bridge shares it. The record is built from an injectable
//! [`CallbackConfig`] (logger sink, allocator hooks) so tests can
//! substitute deterministic stubs.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::status::Fmi2Status;

/// `fmi2CallbackLogger`
///
/// The C declaration is printf-variadic; stable Rust cannot define a
/// variadic function, so the trampoline binds the fixed prefix and
/// forwards the message without expanding format arguments.
pub type Fmi2CallbackLogger = unsafe extern "C" fn(
    component_environment: *mut c_void,
    instance_name: *const c_char,
    status: c_int,
    category: *const c_char,
    message: *const c_char,
);

/// `fmi2CallbackAllocateMemory`
pub type Fmi2CallbackAllocateMemory =
    unsafe extern "C" fn(nobj: usize, size: usize) -> *mut c_void;

/// `fmi2CallbackFreeMemory`
pub type Fmi2CallbackFreeMemory = unsafe extern "C" fn(obj: *mut c_void);

/// `fmi2StepFinished`
pub type Fmi2StepFinished =
    unsafe extern "C" fn(component_environment: *mut c_void, status: c_int);

/// Field-for-field layout of the standard's callback struct
#[repr(C)]
pub struct Fmi2CallbackFunctions {
    pub logger: Option<Fmi2CallbackLogger>,
    pub allocate_memory: Option<Fmi2CallbackAllocateMemory>,
    pub free_memory: Option<Fmi2CallbackFreeMemory>,
    pub step_finished: Option<Fmi2StepFinished>,
    pub component_environment: *mut c_void,
}

/// Destination for log lines emitted by the native library
pub trait LogSink: Send + Sync {
    fn log(&self, instance_name: &str, status: Fmi2Status, category: &str, message: &str);
}

/// Default sink: forwards log lines as `tracing` events
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, instance_name: &str, status: Fmi2Status, category: &str, message: &str) {
        tracing::info!(
            target: "fmi2",
            instance = instance_name,
            category,
            status = %status,
            "{}",
            message
        );
    }
}

/// Configuration for the callback record handed to `fmi2Instantiate`
pub struct CallbackConfig {
    logger: Arc<dyn LogSink>,
    allocate_memory: Fmi2CallbackAllocateMemory,
    free_memory: Fmi2CallbackFreeMemory,
}

impl CallbackConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the logger sink
    pub fn with_logger(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.logger = sink;
        self
    }

    /// Replace the allocator hooks
    ///
    /// The pair must behave like `calloc`/`free`: zero-initialized
    /// allocation, and `free` accepting every pointer `allocate`
    /// returned.
    pub fn with_allocator(
        mut self,
        allocate_memory: Fmi2CallbackAllocateMemory,
        free_memory: Fmi2CallbackFreeMemory,
    ) -> Self {
        self.allocate_memory = allocate_memory;
        self.free_memory = free_memory;
        self
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            logger: Arc::new(TracingSink),
            allocate_memory: libc::calloc,
            free_memory: libc::free,
        }
    }
}

struct SinkHolder {
    sink: Arc<dyn LogSink>,
}

/// Heap-pinned callback record plus the sink it routes to
///
/// `component_environment` points at the pinned [`SinkHolder`], so the
/// block must outlive every component instantiated with it.
pub(crate) struct CallbackBlock {
    functions: Box<Fmi2CallbackFunctions>,
    _holder: Box<SinkHolder>,
}

// Safety: the environment pointer targets the holder the block itself
// owns, and the sink behind it is Send + Sync
unsafe impl Send for CallbackBlock {}

impl CallbackBlock {
    pub fn new(config: CallbackConfig) -> Self {
        let holder = Box::new(SinkHolder {
            sink: config.logger,
        });
        let functions = Box::new(Fmi2CallbackFunctions {
            logger: Some(logger_trampoline),
            allocate_memory: Some(config.allocate_memory),
            free_memory: Some(config.free_memory),
            step_finished: None,
            component_environment: &*holder as *const SinkHolder as *mut c_void,
        });
        Self {
            functions,
            _holder: holder,
        }
    }

    /// Stable address of the record, valid while `self` is alive
    pub fn as_ptr(&self) -> *const Fmi2CallbackFunctions {
        &*self.functions
    }
}

unsafe extern "C" fn logger_trampoline(
    component_environment: *mut c_void,
    instance_name: *const c_char,
    status: c_int,
    category: *const c_char,
    message: *const c_char,
) {
    if component_environment.is_null() {
        return;
    }
    let holder = &*(component_environment as *const SinkHolder);
    let instance_name = lossy(instance_name);
    let category = lossy(category);
    let message = lossy(message);
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        holder.sink.log(
            &instance_name,
            Fmi2Status::from_raw(status),
            &category,
            &message,
        );
    }));
}

unsafe fn lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}

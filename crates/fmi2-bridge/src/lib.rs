//! fmi2-bridge - dynamic loader and call marshaler for FMI 2.0
//!
//! This library binds the FMI 2.0 co-simulation C interface at runtime:
//! - Dynamic library loading with explicit, per-library handles
//! - Symbol resolution by exported `fmi2*` name, surfaced as `Result`
//! - Argument/result marshaling for scalar, string, and array calls
//! - Verbatim pass-through of the standard's status codes
//!
//! The bridge performs no simulation work and enforces no lifecycle
//! ordering; it is argument translation and pointer lifetime management
//! around a library the caller chose to trust.
//!
//! # Example
//!
//! ```no_run
//! use fmi2_bridge::{Fmi2Bridge, Fmi2Type};
//!
//! # fn main() -> Result<(), fmi2_bridge::Fmi2Error> {
//! let bridge = Fmi2Bridge::open("model/binaries/linux64/model.so")?;
//! let component = bridge.instantiate("inst1", Fmi2Type::CoSimulation,
//!     "guid", "resources/", false, false)?;
//! let status = bridge.setup_experiment(&component, None, 0.0, Some(10.0))?;
//! assert!(status.is_ok());
//! let (_, values) = bridge.get_real(&component, &[0, 1])?;
//! assert_eq!(values.len(), 2);
//! bridge.terminate(&component)?;
//! bridge.free_instance(component)?;
//! bridge.close()?;
//! # Ok(())
//! # }
//! ```

/// Bridge version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod bridge;
pub mod callbacks;
pub mod error;
pub mod loader;
pub mod status;
pub mod types;

mod marshal;

// Re-export commonly used types
pub use bridge::Fmi2Bridge;
pub use callbacks::{
    CallbackConfig, Fmi2CallbackAllocateMemory, Fmi2CallbackFreeMemory, Fmi2CallbackFunctions,
    Fmi2CallbackLogger, Fmi2StepFinished, LogSink, TracingSink,
};
pub use error::Fmi2Error;
pub use loader::Fmi2Library;
pub use status::Fmi2Status;
pub use types::{Fmi2Component, Fmi2StatusKind, Fmi2Type, FmuState, ValueReference};

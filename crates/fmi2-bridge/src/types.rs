//! C-compatible types for the FMI boundary.
//!
//! Type mapping, following the standard headers:
//! - `fmi2Real` → `f64`
//! - `fmi2Integer` → `c_int`
//! - `fmi2Boolean` → `c_int` (0 or 1)
//! - `fmi2String` → `*const c_char` (null-terminated)
//! - `fmi2ValueReference` → `c_uint`
//! - `fmi2Component` / `fmi2FMUstate` → opaque pointers
//!
//! The two pointer kinds are wrapped in non-dereferenceable token types:
//! the native library owns the memory behind them, and the bridge only
//! passes the pointer values through.

use std::fmt;
use std::os::raw::{c_char, c_double, c_int, c_uint, c_void};

pub(crate) type Fmi2Real = c_double;
pub(crate) type Fmi2Integer = c_int;
pub(crate) type Fmi2Boolean = c_int;
pub(crate) type Fmi2String = *const c_char;
pub(crate) type Fmi2ValueReference = c_uint;

/// Integer identifier naming one variable exposed by the native library
pub type ValueReference = u32;

/// The kind of FMU a library implements, as passed to `fmi2Instantiate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fmi2Type {
    ModelExchange,
    CoSimulation,
}

impl Fmi2Type {
    pub(crate) fn as_raw(self) -> c_int {
        match self {
            Fmi2Type::ModelExchange => 0,
            Fmi2Type::CoSimulation => 1,
        }
    }
}

/// Status kind selector for the `fmi2Get*Status` query family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fmi2StatusKind {
    DoStepStatus,
    PendingStatus,
    LastSuccessfulTime,
    Terminated,
}

impl Fmi2StatusKind {
    pub(crate) fn as_raw(self) -> c_int {
        match self {
            Fmi2StatusKind::DoStepStatus => 0,
            Fmi2StatusKind::PendingStatus => 1,
            Fmi2StatusKind::LastSuccessfulTime => 2,
            Fmi2StatusKind::Terminated => 3,
        }
    }
}

/// Opaque token for one instantiated simulation unit
///
/// Returned by [`Fmi2Bridge::instantiate`](crate::Fmi2Bridge::instantiate)
/// and threaded through every subsequent call. The wrapped pointer is
/// owned by the native library; the bridge never dereferences it and the
/// raw address is not exposed.
pub struct Fmi2Component {
    pub(crate) raw: *mut c_void,
}

impl fmt::Debug for Fmi2Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fmi2Component(..)")
    }
}

/// Opaque token for one library-internal state snapshot
///
/// Obtained from [`Fmi2Bridge::get_fmu_state`](crate::Fmi2Bridge::get_fmu_state);
/// the bridge does not interpret its contents.
pub struct FmuState {
    pub(crate) raw: *mut c_void,
}

impl fmt::Debug for FmuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FmuState(..)")
    }
}

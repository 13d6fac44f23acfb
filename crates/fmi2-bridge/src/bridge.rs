//! Call forwarding to the `fmi2*` entry points.
//!
//! One [`Fmi2Bridge`] per loaded library. Every method follows the same
//! shape: resolve the exported symbol by name, build temporary native
//! buffers for array/string arguments, invoke the function pointer, copy
//! outputs back into owned Rust containers, and return the native status
//! code verbatim. Symbols are re-resolved on each call; nothing is
//! cached.
//!
//! The bridge enforces no lifecycle ordering. Callers sequence
//! `instantiate`, `setup_experiment`, `do_step` and `terminate`
//! themselves, exactly as the standard requires of an importer.
//!
//! # Safety
//!
//! All methods trust the loaded library to implement the standard's
//! signatures. A hang or crash inside a native call propagates directly
//! to the calling thread; calls are synchronous and blocking with no
//! cancellation or timeout.

use std::os::raw::{c_int, c_void};
use std::path::Path;
use std::ptr;

use crate::callbacks::{CallbackBlock, CallbackConfig, Fmi2CallbackFunctions};
use crate::error::Fmi2Error;
use crate::loader::Fmi2Library;
use crate::marshal::{
    cstring, from_fmi2_boolean, string_from_native, to_fmi2_boolean, CStringArray,
};
use crate::status::Fmi2Status;
use crate::types::{
    Fmi2Boolean, Fmi2Component, Fmi2Integer, Fmi2Real, Fmi2StatusKind, Fmi2String, Fmi2Type,
    Fmi2ValueReference, FmuState, ValueReference,
};

/// Call marshaler for one loaded FMU shared library
///
/// Owns the library handle and the pinned callback record shared by all
/// components instantiated through it. Components must be freed before
/// the bridge is closed or dropped.
///
/// A bridge can move between threads, but it is not `Sync`: sharing one
/// across threads is only sound if the wrapped library is reentrant.
pub struct Fmi2Bridge {
    library: Fmi2Library,
    callbacks: CallbackBlock,
}

impl Fmi2Bridge {
    /// Open a shared library with the default callback configuration
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Fmi2Error> {
        Self::open_with(path, CallbackConfig::default())
    }

    /// Open a shared library with an explicit callback configuration
    pub fn open_with(path: impl AsRef<Path>, config: CallbackConfig) -> Result<Self, Fmi2Error> {
        let library = Fmi2Library::open(path)?;
        Ok(Self {
            library,
            callbacks: CallbackBlock::new(config),
        })
    }

    /// The underlying library handle
    pub fn library(&self) -> &Fmi2Library {
        &self.library
    }

    /// Release the library handle
    pub fn close(self) -> Result<(), Fmi2Error> {
        self.library.close()
    }

    /// `fmi2GetVersion`
    pub fn version(&self) -> Result<String, Fmi2Error> {
        type GetVersion = unsafe extern "C" fn() -> Fmi2String;
        let f = unsafe { self.library.symbol::<GetVersion>("fmi2GetVersion")? };
        unsafe { string_from_native(f()) }
    }

    /// `fmi2GetTypesPlatform`
    pub fn types_platform(&self) -> Result<String, Fmi2Error> {
        type GetTypesPlatform = unsafe extern "C" fn() -> Fmi2String;
        let f = unsafe {
            self.library
                .symbol::<GetTypesPlatform>("fmi2GetTypesPlatform")?
        };
        unsafe { string_from_native(f()) }
    }

    /// `fmi2Instantiate`
    ///
    /// String arguments are converted to temporary C strings released
    /// when this call returns, whatever the outcome. A null component
    /// pointer from the library is reported as
    /// [`Fmi2Error::InstantiationFailed`].
    pub fn instantiate(
        &self,
        instance_name: &str,
        fmu_type: Fmi2Type,
        guid: &str,
        resource_location: &str,
        visible: bool,
        logging_on: bool,
    ) -> Result<Fmi2Component, Fmi2Error> {
        type Instantiate = unsafe extern "C" fn(
            Fmi2String,
            c_int,
            Fmi2String,
            Fmi2String,
            *const Fmi2CallbackFunctions,
            Fmi2Boolean,
            Fmi2Boolean,
        ) -> *mut c_void;

        let c_instance_name = cstring(instance_name)?;
        let c_guid = cstring(guid)?;
        let c_resource_location = cstring(resource_location)?;

        let f = unsafe { self.library.symbol::<Instantiate>("fmi2Instantiate")? };
        let raw = unsafe {
            f(
                c_instance_name.as_ptr(),
                fmu_type.as_raw(),
                c_guid.as_ptr(),
                c_resource_location.as_ptr(),
                self.callbacks.as_ptr(),
                to_fmi2_boolean(visible),
                to_fmi2_boolean(logging_on),
            )
        };

        if raw.is_null() {
            return Err(Fmi2Error::InstantiationFailed {
                instance_name: instance_name.to_string(),
            });
        }
        Ok(Fmi2Component { raw })
    }

    /// `fmi2FreeInstance`
    ///
    /// Consumes the component token; the native library releases the
    /// instance behind it.
    pub fn free_instance(&self, component: Fmi2Component) -> Result<(), Fmi2Error> {
        type FreeInstance = unsafe extern "C" fn(*mut c_void);
        let f = unsafe { self.library.symbol::<FreeInstance>("fmi2FreeInstance")? };
        unsafe { f(component.raw) };
        Ok(())
    }

    /// `fmi2SetDebugLogging`
    pub fn set_debug_logging(
        &self,
        component: &Fmi2Component,
        logging_on: bool,
        categories: &[&str],
    ) -> Result<Fmi2Status, Fmi2Error> {
        type SetDebugLogging =
            unsafe extern "C" fn(*mut c_void, Fmi2Boolean, usize, *const Fmi2String) -> c_int;

        let c_categories = CStringArray::new(categories)?;
        let f = unsafe {
            self.library
                .symbol::<SetDebugLogging>("fmi2SetDebugLogging")?
        };
        let status = unsafe {
            f(
                component.raw,
                to_fmi2_boolean(logging_on),
                c_categories.len(),
                c_categories.as_ptr(),
            )
        };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2SetupExperiment`
    ///
    /// `tolerance` and `stop_time` map to the standard's
    /// defined-flag/value argument pairs.
    pub fn setup_experiment(
        &self,
        component: &Fmi2Component,
        tolerance: Option<f64>,
        start_time: f64,
        stop_time: Option<f64>,
    ) -> Result<Fmi2Status, Fmi2Error> {
        type SetupExperiment = unsafe extern "C" fn(
            *mut c_void,
            Fmi2Boolean,
            Fmi2Real,
            Fmi2Real,
            Fmi2Boolean,
            Fmi2Real,
        ) -> c_int;

        let f = unsafe {
            self.library
                .symbol::<SetupExperiment>("fmi2SetupExperiment")?
        };
        let status = unsafe {
            f(
                component.raw,
                to_fmi2_boolean(tolerance.is_some()),
                tolerance.unwrap_or(0.0),
                start_time,
                to_fmi2_boolean(stop_time.is_some()),
                stop_time.unwrap_or(0.0),
            )
        };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2EnterInitializationMode`
    pub fn enter_initialization_mode(
        &self,
        component: &Fmi2Component,
    ) -> Result<Fmi2Status, Fmi2Error> {
        self.component_only_call(component, "fmi2EnterInitializationMode")
    }

    /// `fmi2ExitInitializationMode`
    pub fn exit_initialization_mode(
        &self,
        component: &Fmi2Component,
    ) -> Result<Fmi2Status, Fmi2Error> {
        self.component_only_call(component, "fmi2ExitInitializationMode")
    }

    /// `fmi2DoStep`
    pub fn do_step(
        &self,
        component: &Fmi2Component,
        current_communication_point: f64,
        communication_step_size: f64,
        no_set_fmu_state_prior_to_current_point: bool,
    ) -> Result<Fmi2Status, Fmi2Error> {
        type DoStep =
            unsafe extern "C" fn(*mut c_void, Fmi2Real, Fmi2Real, Fmi2Boolean) -> c_int;
        let f = unsafe { self.library.symbol::<DoStep>("fmi2DoStep")? };
        let status = unsafe {
            f(
                component.raw,
                current_communication_point,
                communication_step_size,
                to_fmi2_boolean(no_set_fmu_state_prior_to_current_point),
            )
        };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2CancelStep`
    pub fn cancel_step(&self, component: &Fmi2Component) -> Result<Fmi2Status, Fmi2Error> {
        self.component_only_call(component, "fmi2CancelStep")
    }

    /// `fmi2Terminate`
    pub fn terminate(&self, component: &Fmi2Component) -> Result<Fmi2Status, Fmi2Error> {
        self.component_only_call(component, "fmi2Terminate")
    }

    /// `fmi2Reset`
    pub fn reset(&self, component: &Fmi2Component) -> Result<Fmi2Status, Fmi2Error> {
        self.component_only_call(component, "fmi2Reset")
    }

    /// `fmi2GetInteger`
    ///
    /// The output vector always has one entry per value reference, in
    /// the same order. Whether the identifiers are valid for the loaded
    /// model is not validated.
    pub fn get_integer(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
    ) -> Result<(Fmi2Status, Vec<i32>), Fmi2Error> {
        type GetInteger = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *mut Fmi2Integer,
        ) -> c_int;

        let f = unsafe { self.library.symbol::<GetInteger>("fmi2GetInteger")? };
        let mut values = vec![0 as Fmi2Integer; value_references.len()];
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                values.as_mut_ptr(),
            )
        };
        Ok((Fmi2Status::from_raw(status), values))
    }

    /// `fmi2GetReal`
    pub fn get_real(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
    ) -> Result<(Fmi2Status, Vec<f64>), Fmi2Error> {
        type GetReal = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *mut Fmi2Real,
        ) -> c_int;

        let f = unsafe { self.library.symbol::<GetReal>("fmi2GetReal")? };
        let mut values = vec![0.0 as Fmi2Real; value_references.len()];
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                values.as_mut_ptr(),
            )
        };
        Ok((Fmi2Status::from_raw(status), values))
    }

    /// `fmi2GetBoolean`
    pub fn get_boolean(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
    ) -> Result<(Fmi2Status, Vec<bool>), Fmi2Error> {
        type GetBoolean = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *mut Fmi2Boolean,
        ) -> c_int;

        let f = unsafe { self.library.symbol::<GetBoolean>("fmi2GetBoolean")? };
        let mut buffer = vec![0 as Fmi2Boolean; value_references.len()];
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                buffer.as_mut_ptr(),
            )
        };
        let values = buffer.into_iter().map(from_fmi2_boolean).collect();
        Ok((Fmi2Status::from_raw(status), values))
    }

    /// `fmi2GetString`
    ///
    /// The strings the library writes into the output buffer are copied
    /// into owned `String`s before this call returns; a null or
    /// non-UTF-8 entry is reported as [`Fmi2Error::InvalidString`].
    pub fn get_string(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
    ) -> Result<(Fmi2Status, Vec<String>), Fmi2Error> {
        type GetString = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *mut Fmi2String,
        ) -> c_int;

        let f = unsafe { self.library.symbol::<GetString>("fmi2GetString")? };
        let mut buffer: Vec<Fmi2String> = vec![ptr::null(); value_references.len()];
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                buffer.as_mut_ptr(),
            )
        };
        let values = buffer
            .into_iter()
            .map(|ptr| unsafe { string_from_native(ptr) })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((Fmi2Status::from_raw(status), values))
    }

    /// `fmi2SetInteger`
    ///
    /// `values` must contain one entry per value reference; the array
    /// length forwarded to the library is derived from
    /// `value_references`.
    pub fn set_integer(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
        values: &[i32],
    ) -> Result<Fmi2Status, Fmi2Error> {
        type SetInteger = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *const Fmi2Integer,
        ) -> c_int;

        let f = unsafe { self.library.symbol::<SetInteger>("fmi2SetInteger")? };
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                values.as_ptr(),
            )
        };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2SetReal`
    pub fn set_real(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
        values: &[f64],
    ) -> Result<Fmi2Status, Fmi2Error> {
        type SetReal = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *const Fmi2Real,
        ) -> c_int;

        let f = unsafe { self.library.symbol::<SetReal>("fmi2SetReal")? };
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                values.as_ptr(),
            )
        };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2SetBoolean`
    pub fn set_boolean(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
        values: &[bool],
    ) -> Result<Fmi2Status, Fmi2Error> {
        type SetBoolean = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *const Fmi2Boolean,
        ) -> c_int;

        let buffer: Vec<Fmi2Boolean> = values.iter().copied().map(to_fmi2_boolean).collect();
        let f = unsafe { self.library.symbol::<SetBoolean>("fmi2SetBoolean")? };
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                buffer.as_ptr(),
            )
        };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2SetString`
    pub fn set_string(
        &self,
        component: &Fmi2Component,
        value_references: &[ValueReference],
        values: &[&str],
    ) -> Result<Fmi2Status, Fmi2Error> {
        type SetString = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *const Fmi2String,
        ) -> c_int;

        let buffer = CStringArray::new(values)?;
        let f = unsafe { self.library.symbol::<SetString>("fmi2SetString")? };
        let status = unsafe {
            f(
                component.raw,
                value_references.as_ptr(),
                value_references.len(),
                buffer.as_ptr(),
            )
        };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2GetFMUstate`
    ///
    /// The returned token is opaque; the bridge does not interpret its
    /// contents and only passes the pointer value through.
    pub fn get_fmu_state(
        &self,
        component: &Fmi2Component,
    ) -> Result<(Fmi2Status, FmuState), Fmi2Error> {
        type GetFmuState = unsafe extern "C" fn(*mut c_void, *mut *mut c_void) -> c_int;

        let f = unsafe { self.library.symbol::<GetFmuState>("fmi2GetFMUstate")? };
        let mut raw: *mut c_void = ptr::null_mut();
        let status = unsafe { f(component.raw, &mut raw) };
        Ok((Fmi2Status::from_raw(status), FmuState { raw }))
    }

    /// `fmi2SetFMUstate`
    pub fn set_fmu_state(
        &self,
        component: &Fmi2Component,
        state: &FmuState,
    ) -> Result<Fmi2Status, Fmi2Error> {
        type SetFmuState = unsafe extern "C" fn(*mut c_void, *mut c_void) -> c_int;

        let f = unsafe { self.library.symbol::<SetFmuState>("fmi2SetFMUstate")? };
        let status = unsafe { f(component.raw, state.raw) };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2FreeFMUstate`
    ///
    /// Consumes the token; the native library releases the snapshot
    /// behind it.
    pub fn free_fmu_state(
        &self,
        component: &Fmi2Component,
        state: FmuState,
    ) -> Result<Fmi2Status, Fmi2Error> {
        type FreeFmuState = unsafe extern "C" fn(*mut c_void, *mut *mut c_void) -> c_int;

        let f = unsafe { self.library.symbol::<FreeFmuState>("fmi2FreeFMUstate")? };
        let mut raw = state.raw;
        let status = unsafe { f(component.raw, &mut raw) };
        Ok(Fmi2Status::from_raw(status))
    }

    /// `fmi2GetDirectionalDerivative`
    ///
    /// Each identifier array is forwarded with its own length; agreement
    /// between the known and unknown sets is not validated. The output
    /// vector has one entry per unknown reference.
    pub fn get_directional_derivative(
        &self,
        component: &Fmi2Component,
        unknown_references: &[ValueReference],
        known_references: &[ValueReference],
        known_values: &[f64],
    ) -> Result<(Fmi2Status, Vec<f64>), Fmi2Error> {
        type GetDirectionalDerivative = unsafe extern "C" fn(
            *mut c_void,
            *const Fmi2ValueReference,
            usize,
            *const Fmi2ValueReference,
            usize,
            *const Fmi2Real,
            *mut Fmi2Real,
        ) -> c_int;

        let f = unsafe {
            self.library
                .symbol::<GetDirectionalDerivative>("fmi2GetDirectionalDerivative")?
        };
        let mut unknown_values = vec![0.0 as Fmi2Real; unknown_references.len()];
        let status = unsafe {
            f(
                component.raw,
                unknown_references.as_ptr(),
                unknown_references.len(),
                known_references.as_ptr(),
                known_references.len(),
                known_values.as_ptr(),
                unknown_values.as_mut_ptr(),
            )
        };
        Ok((Fmi2Status::from_raw(status), unknown_values))
    }

    /// `fmi2GetStatus`
    pub fn get_status(
        &self,
        component: &Fmi2Component,
        kind: Fmi2StatusKind,
    ) -> Result<(Fmi2Status, Fmi2Status), Fmi2Error> {
        type GetStatus = unsafe extern "C" fn(*mut c_void, c_int, *mut c_int) -> c_int;

        let f = unsafe { self.library.symbol::<GetStatus>("fmi2GetStatus")? };
        let mut value: c_int = 0;
        let status = unsafe { f(component.raw, kind.as_raw(), &mut value) };
        Ok((Fmi2Status::from_raw(status), Fmi2Status::from_raw(value)))
    }

    /// `fmi2GetRealStatus`
    pub fn get_real_status(
        &self,
        component: &Fmi2Component,
        kind: Fmi2StatusKind,
    ) -> Result<(Fmi2Status, f64), Fmi2Error> {
        type GetRealStatus = unsafe extern "C" fn(*mut c_void, c_int, *mut Fmi2Real) -> c_int;

        let f = unsafe { self.library.symbol::<GetRealStatus>("fmi2GetRealStatus")? };
        let mut value: Fmi2Real = 0.0;
        let status = unsafe { f(component.raw, kind.as_raw(), &mut value) };
        Ok((Fmi2Status::from_raw(status), value))
    }

    /// `fmi2GetIntegerStatus`
    pub fn get_integer_status(
        &self,
        component: &Fmi2Component,
        kind: Fmi2StatusKind,
    ) -> Result<(Fmi2Status, i32), Fmi2Error> {
        type GetIntegerStatus =
            unsafe extern "C" fn(*mut c_void, c_int, *mut Fmi2Integer) -> c_int;

        let f = unsafe {
            self.library
                .symbol::<GetIntegerStatus>("fmi2GetIntegerStatus")?
        };
        let mut value: Fmi2Integer = 0;
        let status = unsafe { f(component.raw, kind.as_raw(), &mut value) };
        Ok((Fmi2Status::from_raw(status), value))
    }

    /// `fmi2GetBooleanStatus`
    pub fn get_boolean_status(
        &self,
        component: &Fmi2Component,
        kind: Fmi2StatusKind,
    ) -> Result<(Fmi2Status, bool), Fmi2Error> {
        type GetBooleanStatus =
            unsafe extern "C" fn(*mut c_void, c_int, *mut Fmi2Boolean) -> c_int;

        let f = unsafe {
            self.library
                .symbol::<GetBooleanStatus>("fmi2GetBooleanStatus")?
        };
        let mut value: Fmi2Boolean = 0;
        let status = unsafe { f(component.raw, kind.as_raw(), &mut value) };
        Ok((Fmi2Status::from_raw(status), from_fmi2_boolean(value)))
    }

    /// `fmi2GetStringStatus`
    pub fn get_string_status(
        &self,
        component: &Fmi2Component,
        kind: Fmi2StatusKind,
    ) -> Result<(Fmi2Status, String), Fmi2Error> {
        type GetStringStatus = unsafe extern "C" fn(*mut c_void, c_int, *mut Fmi2String) -> c_int;

        let f = unsafe {
            self.library
                .symbol::<GetStringStatus>("fmi2GetStringStatus")?
        };
        let mut value: Fmi2String = ptr::null();
        let status = unsafe { f(component.raw, kind.as_raw(), &mut value) };
        let value = unsafe { string_from_native(value) }?;
        Ok((Fmi2Status::from_raw(status), value))
    }

    // The lifecycle transitions share one shape: a single component
    // argument and a status return.
    fn component_only_call(
        &self,
        component: &Fmi2Component,
        symbol: &str,
    ) -> Result<Fmi2Status, Fmi2Error> {
        type ComponentOnly = unsafe extern "C" fn(*mut c_void) -> c_int;
        let f = unsafe { self.library.symbol::<ComponentOnly>(symbol)? };
        let status = unsafe { f(component.raw) };
        Ok(Fmi2Status::from_raw(status))
    }
}

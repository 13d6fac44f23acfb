//! Stub FMU used by the integration suite.
//!
//! Compiled on the fly with `rustc --crate-type cdylib` (no
//! dependencies), then loaded through the bridge like any vendor FMU.
//! Behavior is deterministic:
//! - unset variables read as `vr + 0.5` (real), `vr * 10` (integer),
//!   `vr % 2 == 0` (boolean), `"value-<vr>"` (string)
//! - set values are stored per instance and read back verbatim
//! - writing integer variable 9999 arms the status code that the next
//!   `fmi2DoStep` returns
//! - instantiation fails (returns NULL) when the GUID is empty
//! - when logging is enabled, instantiation emits one line through the
//!   callback logger (category "info")

#![allow(non_snake_case)]

use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};

type Logger = unsafe extern "C" fn(*mut c_void, *const c_char, c_int, *const c_char, *const c_char);
type AllocateMemory = unsafe extern "C" fn(usize, usize) -> *mut c_void;
type FreeMemory = unsafe extern "C" fn(*mut c_void);
type StepFinished = unsafe extern "C" fn(*mut c_void, c_int);

#[repr(C)]
struct CallbackFunctions {
    logger: Option<Logger>,
    allocate_memory: Option<AllocateMemory>,
    free_memory: Option<FreeMemory>,
    step_finished: Option<StepFinished>,
    component_environment: *mut c_void,
}

const STATUS_OK: c_int = 0;
const STATUS_FATAL: c_int = 4;

/// Integer variable that arms the status returned by fmi2DoStep
const STATUS_SWITCH_VR: u32 = 9999;

struct Instance {
    #[allow(dead_code)]
    name: CString,
    reals: HashMap<u32, f64>,
    integers: HashMap<u32, c_int>,
    booleans: HashMap<u32, c_int>,
    strings: HashMap<u32, CString>,
}

struct Snapshot {
    reals: HashMap<u32, f64>,
    integers: HashMap<u32, c_int>,
    booleans: HashMap<u32, c_int>,
    strings: HashMap<u32, CString>,
}

fn default_real(vr: u32) -> f64 {
    vr as f64 + 0.5
}

fn default_integer(vr: u32) -> c_int {
    (vr as c_int) * 10
}

fn default_boolean(vr: u32) -> c_int {
    if vr % 2 == 0 {
        1
    } else {
        0
    }
}

fn default_string(vr: u32) -> CString {
    CString::new(format!("value-{}", vr)).expect("no interior NUL")
}

unsafe fn instance<'a>(c: *mut c_void) -> Option<&'a mut Instance> {
    (c as *mut Instance).as_mut()
}

unsafe fn refs<'a>(vr: *const u32, nvr: usize) -> &'a [u32] {
    if vr.is_null() || nvr == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(vr, nvr)
    }
}

#[no_mangle]
pub extern "C" fn fmi2GetVersion() -> *const c_char {
    b"2.0\0".as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn fmi2GetTypesPlatform() -> *const c_char {
    b"default\0".as_ptr() as *const c_char
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Instantiate(
    instance_name: *const c_char,
    _fmu_type: c_int,
    guid: *const c_char,
    _resource_location: *const c_char,
    callbacks: *const CallbackFunctions,
    _visible: c_int,
    logging_on: c_int,
) -> *mut c_void {
    if instance_name.is_null() || guid.is_null() {
        return std::ptr::null_mut();
    }
    if CStr::from_ptr(guid).to_bytes().is_empty() {
        return std::ptr::null_mut();
    }

    let name = CStr::from_ptr(instance_name).to_owned();

    if logging_on != 0 {
        if let Some(functions) = callbacks.as_ref() {
            if let Some(logger) = functions.logger {
                let category = b"info\0".as_ptr() as *const c_char;
                let message = b"instantiated\0".as_ptr() as *const c_char;
                logger(
                    functions.component_environment,
                    name.as_ptr(),
                    STATUS_OK,
                    category,
                    message,
                );
            }
        }
    }

    let instance = Box::new(Instance {
        name,
        reals: HashMap::new(),
        integers: HashMap::new(),
        booleans: HashMap::new(),
        strings: HashMap::new(),
    });
    Box::into_raw(instance) as *mut c_void
}

#[no_mangle]
pub unsafe extern "C" fn fmi2FreeInstance(c: *mut c_void) {
    if !c.is_null() {
        drop(Box::from_raw(c as *mut Instance));
    }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetDebugLogging(
    c: *mut c_void,
    _logging_on: c_int,
    _n_categories: usize,
    _categories: *const *const c_char,
) -> c_int {
    if instance(c).is_none() {
        return STATUS_FATAL;
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetupExperiment(
    c: *mut c_void,
    _tolerance_defined: c_int,
    _tolerance: f64,
    _start_time: f64,
    _stop_time_defined: c_int,
    _stop_time: f64,
) -> c_int {
    if instance(c).is_none() {
        return STATUS_FATAL;
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2EnterInitializationMode(c: *mut c_void) -> c_int {
    if instance(c).is_none() {
        return STATUS_FATAL;
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2ExitInitializationMode(c: *mut c_void) -> c_int {
    if instance(c).is_none() {
        return STATUS_FATAL;
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2DoStep(
    c: *mut c_void,
    _current_communication_point: f64,
    _communication_step_size: f64,
    _no_set_fmu_state_prior: c_int,
) -> c_int {
    match instance(c) {
        Some(instance) => instance
            .integers
            .get(&STATUS_SWITCH_VR)
            .copied()
            .unwrap_or(STATUS_OK),
        None => STATUS_FATAL,
    }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2CancelStep(c: *mut c_void) -> c_int {
    if instance(c).is_none() {
        return STATUS_FATAL;
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Terminate(c: *mut c_void) -> c_int {
    if instance(c).is_none() {
        return STATUS_FATAL;
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2Reset(c: *mut c_void) -> c_int {
    match instance(c) {
        Some(instance) => {
            instance.reals.clear();
            instance.integers.clear();
            instance.booleans.clear();
            instance.strings.clear();
            STATUS_OK
        }
        None => STATUS_FATAL,
    }
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetReal(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *mut f64,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        *value.add(i) = instance.reals.get(&r).copied().unwrap_or_else(|| default_real(r));
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetInteger(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *mut c_int,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        *value.add(i) = instance
            .integers
            .get(&r)
            .copied()
            .unwrap_or_else(|| default_integer(r));
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetBoolean(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *mut c_int,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        *value.add(i) = instance
            .booleans
            .get(&r)
            .copied()
            .unwrap_or_else(|| default_boolean(r));
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetString(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *mut *const c_char,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        let stored = instance
            .strings
            .entry(r)
            .or_insert_with(|| default_string(r));
        *value.add(i) = stored.as_ptr();
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetReal(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *const f64,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        instance.reals.insert(r, *value.add(i));
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetInteger(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *const c_int,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        instance.integers.insert(r, *value.add(i));
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetBoolean(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *const c_int,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        instance.booleans.insert(r, *value.add(i));
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetString(
    c: *mut c_void,
    vr: *const u32,
    nvr: usize,
    value: *const *const c_char,
) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    for (i, &r) in refs(vr, nvr).iter().enumerate() {
        let ptr = *value.add(i);
        if ptr.is_null() {
            return STATUS_FATAL;
        }
        instance.strings.insert(r, CStr::from_ptr(ptr).to_owned());
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetFMUstate(c: *mut c_void, state: *mut *mut c_void) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    if state.is_null() {
        return STATUS_FATAL;
    }
    let snapshot = Box::new(Snapshot {
        reals: instance.reals.clone(),
        integers: instance.integers.clone(),
        booleans: instance.booleans.clone(),
        strings: instance.strings.clone(),
    });
    *state = Box::into_raw(snapshot) as *mut c_void;
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2SetFMUstate(c: *mut c_void, state: *mut c_void) -> c_int {
    let Some(instance) = instance(c) else {
        return STATUS_FATAL;
    };
    let Some(snapshot) = (state as *mut Snapshot).as_ref() else {
        return STATUS_FATAL;
    };
    instance.reals = snapshot.reals.clone();
    instance.integers = snapshot.integers.clone();
    instance.booleans = snapshot.booleans.clone();
    instance.strings = snapshot.strings.clone();
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2FreeFMUstate(c: *mut c_void, state: *mut *mut c_void) -> c_int {
    if instance(c).is_none() || state.is_null() {
        return STATUS_FATAL;
    }
    if !(*state).is_null() {
        drop(Box::from_raw(*state as *mut Snapshot));
        *state = std::ptr::null_mut();
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetDirectionalDerivative(
    c: *mut c_void,
    v_unknown: *const u32,
    n_unknown: usize,
    _v_known: *const u32,
    n_known: usize,
    dv_known: *const f64,
    dv_unknown: *mut f64,
) -> c_int {
    if instance(c).is_none() {
        return STATUS_FATAL;
    }
    let unknown = refs(v_unknown, n_unknown);
    for i in 0..unknown.len() {
        *dv_unknown.add(i) = if i < n_known {
            2.0 * *dv_known.add(i)
        } else {
            0.0
        };
    }
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetStatus(
    c: *mut c_void,
    _kind: c_int,
    value: *mut c_int,
) -> c_int {
    if instance(c).is_none() || value.is_null() {
        return STATUS_FATAL;
    }
    *value = STATUS_OK;
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetRealStatus(
    c: *mut c_void,
    _kind: c_int,
    value: *mut f64,
) -> c_int {
    if instance(c).is_none() || value.is_null() {
        return STATUS_FATAL;
    }
    *value = 12.5;
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetIntegerStatus(
    c: *mut c_void,
    _kind: c_int,
    value: *mut c_int,
) -> c_int {
    if instance(c).is_none() || value.is_null() {
        return STATUS_FATAL;
    }
    *value = 7;
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetBooleanStatus(
    c: *mut c_void,
    _kind: c_int,
    value: *mut c_int,
) -> c_int {
    if instance(c).is_none() || value.is_null() {
        return STATUS_FATAL;
    }
    *value = 1;
    STATUS_OK
}

#[no_mangle]
pub unsafe extern "C" fn fmi2GetStringStatus(
    c: *mut c_void,
    _kind: c_int,
    value: *mut *const c_char,
) -> c_int {
    if instance(c).is_none() || value.is_null() {
        return STATUS_FATAL;
    }
    *value = b"step complete\0".as_ptr() as *const c_char;
    STATUS_OK
}

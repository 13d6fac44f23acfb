//! Temporary native buffers for the duration of one call.
//!
//! All temporaries are RAII values (`CString`, `Vec`, [`CStringArray`])
//! scoped to the forwarding method that builds them, so release happens
//! on the normal and early-error exit paths alike. A native call that
//! aborts the process is out of the bridge's fault domain.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::error::Fmi2Error;
use crate::types::Fmi2Boolean;

/// Build a null-terminated C string from a Rust string
pub(crate) fn cstring(s: &str) -> Result<CString, Fmi2Error> {
    Ok(CString::new(s)?)
}

/// Copy a null-terminated native string into an owned `String`
///
/// # Safety
///
/// `ptr` must be null or point to a valid null-terminated string that
/// stays alive for the duration of the call.
pub(crate) unsafe fn string_from_native(ptr: *const c_char) -> Result<String, Fmi2Error> {
    if ptr.is_null() {
        return Err(Fmi2Error::InvalidString(
            "native library returned a null string".to_string(),
        ));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_owned)
        .map_err(|e| Fmi2Error::InvalidString(format!("invalid UTF-8: {}", e)))
}

pub(crate) fn to_fmi2_boolean(value: bool) -> Fmi2Boolean {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn from_fmi2_boolean(value: Fmi2Boolean) -> bool {
    value != 0
}

/// An array of C strings built from Rust strings for one native call
///
/// The owned `CString`s keep the pointers in the array alive; everything
/// is released when the value drops.
pub(crate) struct CStringArray {
    _strings: Vec<CString>,
    ptrs: Vec<*const c_char>,
}

impl CStringArray {
    pub fn new<S: AsRef<str>>(items: &[S]) -> Result<Self, Fmi2Error> {
        let strings = items
            .iter()
            .map(|s| cstring(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let ptrs = strings.iter().map(|s| s.as_ptr()).collect();
        Ok(Self {
            _strings: strings,
            ptrs,
        })
    }

    pub fn as_ptr(&self) -> *const *const c_char {
        self.ptrs.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.ptrs.len()
    }
}

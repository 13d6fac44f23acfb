//! Dynamic library loading.
//!
//! Cross-platform loading via `libloading`, with one explicit handle
//! object per loaded library. There is no process-wide state: several
//! libraries can be open at the same time, each owned by its own
//! [`Fmi2Library`].
//!
//! # Safety
//!
//! Loading a dynamic library executes its initialization code and makes
//! its symbols available in-process. The caller must ensure the library
//! is trusted.

use std::path::{Path, PathBuf};

use libloading::{Library, Symbol};
use tracing::debug;

use crate::error::Fmi2Error;

/// Handle to one loaded FMU shared library
///
/// Created by [`Fmi2Library::open`], destroyed by [`Fmi2Library::close`]
/// or by dropping the value. Symbol lookups are not cached; callers
/// re-resolve by name on every call.
pub struct Fmi2Library {
    path: PathBuf,
    library: Library,
}

impl Fmi2Library {
    /// Open a shared library by path
    ///
    /// Fails with [`Fmi2Error::LoadFailed`] if the file is missing or the
    /// platform loader cannot resolve its dependencies; the loader's
    /// reason string is preserved in the error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Fmi2Error> {
        let path = path.as_ref().to_path_buf();

        let library = unsafe {
            Library::new(&path).map_err(|e| Fmi2Error::LoadFailed {
                path: path.clone(),
                reason: e.to_string(),
            })?
        };

        debug!(path = %path.display(), "loaded shared library");
        Ok(Self { path, library })
    }

    /// Path this library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an exported symbol by exact name
    ///
    /// Returns [`Fmi2Error::SymbolNotFound`] if the name is absent, so a
    /// missing export is a reportable error rather than a null-pointer
    /// call.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - The symbol's actual type matches `T`
    /// - The library remains loaded while the symbol is in use
    pub unsafe fn symbol<T>(&self, name: &str) -> Result<Symbol<'_, T>, Fmi2Error> {
        self.library
            .get(name.as_bytes())
            .map_err(|_| Fmi2Error::SymbolNotFound {
                symbol: name.to_string(),
            })
    }

    /// Release the library handle, reporting the real outcome
    pub fn close(self) -> Result<(), Fmi2Error> {
        let path = self.path;
        self.library
            .close()
            .map_err(|e| Fmi2Error::CloseFailed {
                reason: e.to_string(),
            })?;
        debug!(path = %path.display(), "closed shared library");
        Ok(())
    }
}

//! Bindings to the vendor `baf2sql_c` shared library.
//!
//! The library is loaded at runtime with `libloading`, so the crate builds
//! without the vendor SDK present. All strings crossing the boundary are
//! UTF-8 encoded, NUL-terminated C strings.
//!
//! # Example
//!
//! ```no_run
//! use swimcube::storage::{ArrayStorage, Baf2SqlLibrary, CalibrationMode};
//!
//! let library = Baf2SqlLibrary::load("libbaf2sql_c.so")?;
//! let cache = library.sqlite_cache_filename("run.d/analysis.baf", false)?;
//! let storage = library.open_storage("run.d/analysis.baf", CalibrationMode::Recalibrated)?;
//! let mass_axis = storage.read_doubles(1)?;
//! # let _ = (cache, mass_axis);
//! // `storage` is closed when it goes out of scope
//! # Ok::<(), swimcube::storage::StorageError>(())
//! ```

use std::ffi::{c_char, c_int, CStr, CString};
use std::path::{Path, PathBuf};
use std::ptr;

use libloading::Library;
use log::debug;

use super::{ArrayStorage, CalibrationMode, StorageError};

/// Platform file name of the vendor library
#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY_NAME: &str = "baf2sql_c.dll";
/// Platform file name of the vendor library
#[cfg(not(target_os = "windows"))]
pub const DEFAULT_LIBRARY_NAME: &str = "libbaf2sql_c.so";

type GetSqliteCacheFilenameFn = unsafe extern "C" fn(*mut c_char, u32, *const c_char, c_int) -> u32;
type ArrayOpenStorageFn = unsafe extern "C" fn(c_int, *const c_char) -> u64;
type ArrayCloseStorageFn = unsafe extern "C" fn(u64);
type GetLastErrorStringFn = unsafe extern "C" fn(*mut c_char, u32) -> u32;
type ArrayGetNumElementsFn = unsafe extern "C" fn(u64, u64, *mut u64) -> c_int;
type ArrayReadDoubleFn = unsafe extern "C" fn(u64, u64, *mut f64) -> c_int;

/// Entry points resolved once at load time.
///
/// The function pointers stay valid for as long as the owning [`Library`]
/// is alive, which [`Baf2SqlLibrary`] guarantees by holding both.
struct Baf2SqlApi {
    get_sqlite_cache_filename: GetSqliteCacheFilenameFn,
    array_open_storage: ArrayOpenStorageFn,
    array_close_storage: ArrayCloseStorageFn,
    get_last_error_string: GetLastErrorStringFn,
    array_get_num_elements: ArrayGetNumElementsFn,
    array_read_double: ArrayReadDoubleFn,
}

/// A loaded instance of the vendor library.
pub struct Baf2SqlLibrary {
    api: Baf2SqlApi,
    path: PathBuf,
    _library: Library,
}

impl std::fmt::Debug for Baf2SqlLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Baf2SqlLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Resolve a symbol and copy the function pointer out of it.
///
/// # Safety
///
/// `T` must match the C signature of the exported symbol.
unsafe fn resolve<T: Copy>(library: &Library, name: &str) -> Result<T, StorageError> {
    let mut symbol_name = name.as_bytes().to_vec();
    symbol_name.push(0);
    library
        .get::<T>(&symbol_name)
        .map(|symbol| *symbol)
        .map_err(|_| StorageError::MissingSymbol(name.to_string()))
}

/// Convert a path into a UTF-8 C string for the library
fn to_c_path(path: &Path) -> Result<CString, StorageError> {
    let utf8 = path
        .to_str()
        .ok_or_else(|| StorageError::InvalidPath(path.to_path_buf()))?;
    CString::new(utf8).map_err(|_| StorageError::InvalidPath(path.to_path_buf()))
}

fn c_buffer_to_string(buffer: &[u8]) -> String {
    match CStr::from_bytes_until_nul(buffer) {
        Ok(value) => value.to_string_lossy().into_owned(),
        Err(_) => String::from_utf8_lossy(buffer).into_owned(),
    }
}

impl Baf2SqlLibrary {
    /// Load the library from `path` and resolve every entry point used by
    /// this crate.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();

        // SAFETY: loading runs the library's initialisers; the vendor library
        // has no initialisation side effects beyond its own globals.
        let library = unsafe { Library::new(&path) }.map_err(|e| StorageError::LibraryLoad {
            path: path.clone(),
            message: e.to_string(),
        })?;

        // SAFETY: the signatures below follow the vendor C header.
        let api = unsafe {
            Baf2SqlApi {
                get_sqlite_cache_filename: resolve(
                    &library,
                    "baf2sql_get_sqlite_cache_filename_v2",
                )?,
                array_open_storage: resolve(&library, "baf2sql_array_open_storage")?,
                array_close_storage: resolve(&library, "baf2sql_array_close_storage")?,
                get_last_error_string: resolve(&library, "baf2sql_get_last_error_string")?,
                array_get_num_elements: resolve(&library, "baf2sql_array_get_num_elements")?,
                array_read_double: resolve(&library, "baf2sql_array_read_double")?,
            }
        };

        debug!("Loaded baf2sql library from {}", path.display());

        Ok(Self {
            api,
            path,
            _library: library,
        })
    }

    /// Path the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last error message recorded by the library
    pub fn last_error(&self) -> String {
        // SAFETY: a null buffer with zero length only queries the size.
        let len = unsafe { (self.api.get_last_error_string)(ptr::null_mut(), 0) };
        if len == 0 {
            return "unknown baf2sql error".to_string();
        }

        let mut buffer = vec![0u8; len as usize];
        // SAFETY: the buffer is exactly `len` bytes long.
        unsafe {
            (self.api.get_last_error_string)(buffer.as_mut_ptr().cast::<c_char>(), len);
        }
        c_buffer_to_string(&buffer)
    }

    /// Locate the SQLite cache holding the acquisition metadata of a BAF
    /// file. The library creates the cache on first access.
    pub fn sqlite_cache_filename<P: AsRef<Path>>(
        &self,
        baf_path: P,
        all_variables: bool,
    ) -> Result<PathBuf, StorageError> {
        let baf_path = baf_path.as_ref();
        let c_path = to_c_path(baf_path)?;
        let all_variables = c_int::from(all_variables);

        // SAFETY: size query with a null output buffer.
        let len = unsafe {
            (self.api.get_sqlite_cache_filename)(ptr::null_mut(), 0, c_path.as_ptr(), all_variables)
        };
        if len == 0 {
            return Err(StorageError::SqliteCache {
                path: baf_path.to_path_buf(),
                message: self.last_error(),
            });
        }

        let mut buffer = vec![0u8; len as usize];
        // SAFETY: the buffer is exactly `len` bytes long.
        let written = unsafe {
            (self.api.get_sqlite_cache_filename)(
                buffer.as_mut_ptr().cast::<c_char>(),
                len,
                c_path.as_ptr(),
                all_variables,
            )
        };
        if written == 0 {
            return Err(StorageError::SqliteCache {
                path: baf_path.to_path_buf(),
                message: self.last_error(),
            });
        }

        Ok(PathBuf::from(c_buffer_to_string(&buffer)))
    }

    /// Open the array storage behind a BAF file.
    ///
    /// The returned handle borrows the library and is closed on drop.
    pub fn open_storage<P: AsRef<Path>>(
        &self,
        baf_path: P,
        calibration: CalibrationMode,
    ) -> Result<BinaryStorage<'_>, StorageError> {
        let baf_path = baf_path.as_ref();
        let c_path = to_c_path(baf_path)?;

        // SAFETY: c_path is a valid NUL-terminated string.
        let handle = unsafe { (self.api.array_open_storage)(calibration.as_flag(), c_path.as_ptr()) };
        if handle == 0 {
            return Err(StorageError::Open {
                path: baf_path.to_path_buf(),
                message: self.last_error(),
            });
        }

        debug!(
            "Opened array storage for {} (handle {}, {:?} calibration)",
            baf_path.display(),
            handle,
            calibration
        );

        Ok(BinaryStorage {
            library: self,
            handle,
        })
    }
}

/// An open array storage handle.
///
/// Owned by a single extraction run; the handle is released exactly once,
/// when this value is dropped, on success and error paths alike.
pub struct BinaryStorage<'lib> {
    library: &'lib Baf2SqlLibrary,
    handle: u64,
}

impl std::fmt::Debug for BinaryStorage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryStorage")
            .field("handle", &self.handle)
            .finish()
    }
}

impl ArrayStorage for BinaryStorage<'_> {
    fn element_count(&self, array_id: u64) -> Result<u64, StorageError> {
        let mut count = 0u64;
        // SAFETY: `count` outlives the call and the handle is open.
        let ok = unsafe {
            (self.library.api.array_get_num_elements)(self.handle, array_id, &mut count)
        };
        if ok == 0 {
            return Err(StorageError::Read {
                array_id,
                message: self.library.last_error(),
            });
        }
        Ok(count)
    }

    fn read_doubles(&self, array_id: u64) -> Result<Vec<f64>, StorageError> {
        let count = self.element_count(array_id)?;
        let len = usize::try_from(count).map_err(|_| StorageError::TooLarge { array_id, count })?;

        let mut buffer = vec![0.0f64; len];
        // SAFETY: the buffer holds exactly `count` doubles as reported by
        // the library for this array id.
        let ok = unsafe {
            (self.library.api.array_read_double)(self.handle, array_id, buffer.as_mut_ptr())
        };
        if ok == 0 {
            return Err(StorageError::Read {
                array_id,
                message: self.library.last_error(),
            });
        }
        Ok(buffer)
    }
}

impl Drop for BinaryStorage<'_> {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by open_storage and is closed once.
        unsafe { (self.library.api.array_close_storage)(self.handle) };
        debug!("Closed array storage handle {}", self.handle);
    }
}

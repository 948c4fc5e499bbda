//! Dynamic Library Loader
//!
//! Reaches a buffer runtime that lives in a shared library exporting the
//! `sbuf_*` entry points. Every symbol is resolved once, when the library is
//! opened, and the library refuses to load if its ABI version differs from
//! the one this crate was built against.

use std::env;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use log::debug;

use super::abi::ABI_VERSION;
use super::{NativeRuntime, RawView};
use crate::error::{BufferError, BufferResult};
use crate::runtime::{RawHandle, NULL_HANDLE};

type NewBufferFn = unsafe extern "C" fn(u8, u8, u16, *const i32, usize) -> u64;
type DeleteBufferFn = unsafe extern "C" fn(u64) -> bool;
type HandleQueryFn = unsafe extern "C" fn(u64) -> i32;
type DimensionQueryFn = unsafe extern "C" fn(u64, i32) -> i32;
type DataFn = unsafe extern "C" fn(u64, *mut usize) -> *mut u8;
type LastErrorFn = unsafe extern "C" fn() -> *const c_char;
type AbiVersionFn = unsafe extern "C" fn() -> u32;

/// Function pointers resolved once at load time
#[derive(Clone, Copy)]
struct EntryPoints {
    new_buffer: NewBufferFn,
    delete_buffer: DeleteBufferFn,
    dimensions: HandleQueryFn,
    min: DimensionQueryFn,
    extent: DimensionQueryFn,
    stride: DimensionQueryFn,
    width: HandleQueryFn,
    height: HandleQueryFn,
    channels: HandleQueryFn,
    data: DataFn,
    last_error: LastErrorFn,
}

/// A buffer runtime loaded from a shared library
pub struct DynamicRuntime {
    path: PathBuf,
    name: String,
    entry: EntryPoints,
    /// Keeps the resolved symbols alive; must outlive `entry`
    _library: Library,
}

/// Refuse a library built against a different set of entry points.
pub(crate) fn check_abi_version(path: &Path, found: u32) -> BufferResult<()> {
    if found == ABI_VERSION {
        return Ok(());
    }
    Err(BufferError::Library(format!(
        "'{}' exports sbuf ABI v{}, expected v{}",
        path.display(),
        found,
        ABI_VERSION
    )))
}

impl DynamicRuntime {
    /// Open the library at `path`, check its ABI version, then resolve the
    /// remaining entry points.
    pub fn load(path: impl AsRef<Path>) -> BufferResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading a library runs its initialisers. The caller vouches
        // for the path.
        let library = unsafe { Library::new(&path) }.map_err(|e| {
            BufferError::Library(format!("cannot open '{}': {}", path.display(), e))
        })?;

        // Safety: the symbol types mirror the exported signatures in `abi`,
        // and `sbuf_abi_version` takes no arguments.
        let version: AbiVersionFn = unsafe { resolve(&library, &path, "sbuf_abi_version")? };
        check_abi_version(&path, unsafe { version() })?;

        // Safety: as above; the version check pins the signatures.
        let entry = unsafe {
            EntryPoints {
                new_buffer: resolve(&library, &path, "sbuf_new_buffer")?,
                delete_buffer: resolve(&library, &path, "sbuf_delete_buffer")?,
                dimensions: resolve(&library, &path, "sbuf_dimensions")?,
                min: resolve(&library, &path, "sbuf_min")?,
                extent: resolve(&library, &path, "sbuf_extent")?,
                stride: resolve(&library, &path, "sbuf_stride")?,
                width: resolve(&library, &path, "sbuf_width")?,
                height: resolve(&library, &path, "sbuf_height")?,
                channels: resolve(&library, &path, "sbuf_channels")?,
                data: resolve(&library, &path, "sbuf_data")?,
                last_error: resolve(&library, &path, "sbuf_last_error")?,
            }
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("loaded buffer runtime '{}' from {}", name, path.display());

        Ok(Self {
            path,
            name,
            entry,
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn last_error(&self) -> Option<String> {
        // Safety: `sbuf_last_error` takes no arguments. A non-null result is
        // a NUL-terminated string valid until the next call on this thread.
        unsafe {
            let msg = (self.entry.last_error)();
            if msg.is_null() {
                return None;
            }
            Some(CStr::from_ptr(msg).to_string_lossy().into_owned())
        }
    }
}

unsafe fn resolve<T: Copy>(library: &Library, path: &Path, name: &str) -> BufferResult<T> {
    let symbol = library.get::<T>(name.as_bytes()).map_err(|e| {
        BufferError::Library(format!(
            "missing symbol '{}' in '{}': {}",
            name,
            path.display(),
            e
        ))
    })?;
    Ok(*symbol)
}

// Safety: a library that reports the current ABI version promises the
// contract documented on the `sbuf_*` entry points, which is the contract of
// `NativeRuntime`.
unsafe impl NativeRuntime for DynamicRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn allocate(
        &self,
        type_code: u8,
        bits: u8,
        lanes: u16,
        sizes: &[i32],
    ) -> Result<RawHandle, String> {
        // Safety: the slice is valid for `sizes.len()` reads.
        let handle = unsafe {
            (self.entry.new_buffer)(type_code, bits, lanes, sizes.as_ptr(), sizes.len())
        };
        if handle == NULL_HANDLE {
            return Err(self
                .last_error()
                .unwrap_or_else(|| "native allocation failed".to_string()));
        }
        Ok(handle)
    }

    unsafe fn deallocate(&self, handle: RawHandle) -> bool {
        unsafe { (self.entry.delete_buffer)(handle) }
    }

    fn dimensions(&self, handle: RawHandle) -> i32 {
        unsafe { (self.entry.dimensions)(handle) }
    }

    fn min(&self, handle: RawHandle, i: i32) -> i32 {
        unsafe { (self.entry.min)(handle, i) }
    }

    fn extent(&self, handle: RawHandle, i: i32) -> i32 {
        unsafe { (self.entry.extent)(handle, i) }
    }

    fn stride(&self, handle: RawHandle, i: i32) -> i32 {
        unsafe { (self.entry.stride)(handle, i) }
    }

    fn width(&self, handle: RawHandle) -> i32 {
        unsafe { (self.entry.width)(handle) }
    }

    fn height(&self, handle: RawHandle) -> i32 {
        unsafe { (self.entry.height)(handle) }
    }

    fn channels(&self, handle: RawHandle) -> i32 {
        unsafe { (self.entry.channels)(handle) }
    }

    fn data(&self, handle: RawHandle) -> RawView {
        let mut len = 0usize;
        // Safety: `len` is a valid out-parameter.
        let ptr = unsafe { (self.entry.data)(handle, &mut len) };
        RawView { ptr, len }
    }
}

/// Resolves runtime names to library files
pub struct LibraryLoader {
    search_paths: Vec<PathBuf>,
}

impl LibraryLoader {
    pub fn new() -> Self {
        Self {
            search_paths: default_search_paths(),
        }
    }

    /// Add a search path; later paths are searched first
    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.insert(0, path.as_ref().to_path_buf());
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// An existing path is used as is; otherwise `name` is expanded to the
    /// platform filename and looked up in the search paths.
    pub fn find_library(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        let file = library_filename(name);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file))
            .find(|candidate| candidate.is_file())
    }

    /// Find and open a runtime by name or path
    pub fn load(&self, name: &str) -> BufferResult<Arc<DynamicRuntime>> {
        let path = self.find_library(name).ok_or_else(|| {
            BufferError::Library(format!(
                "runtime library '{}' not found in {} search paths",
                name,
                self.search_paths.len()
            ))
        })?;
        Ok(Arc::new(DynamicRuntime::load(path)?))
    }
}

impl Default for LibraryLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Working directory first, then the platform's dynamic-loader variable
fn default_search_paths() -> Vec<PathBuf> {
    let var = if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    };

    let mut paths: Vec<PathBuf> = env::current_dir().into_iter().collect();
    if let Some(value) = env::var_os(var) {
        paths.extend(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
    }
    paths
}

/// `stridebuf` becomes `libstridebuf.so`, `libstridebuf.dylib` or
/// `stridebuf.dll`; a name that already carries the suffix is kept.
pub(crate) fn library_filename(name: &str) -> String {
    if name.ends_with(DLL_SUFFIX) {
        name.to_string()
    } else {
        format!("{DLL_PREFIX}{name}{DLL_SUFFIX}")
    }
}

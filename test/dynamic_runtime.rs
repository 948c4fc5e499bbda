//! Dynamic Runtime Tests
//!
//! Loads the cdylib cargo builds from this crate and drives it through
//! `DynamicRuntime`, the same way a separately shipped runtime would be used.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::PathBuf;
use std::sync::Arc;

use stridebuf::{
    Buffer, BufferError, DimensionQuery, DynamicRuntime, ElementType, LibraryLoader,
    NativeRuntime,
};

/// Directory holding the built cdylib: the test binary lives in `deps/`,
/// and cargo also copies the library one level up.
fn cdylib_dir() -> PathBuf {
    let file = format!("{DLL_PREFIX}stridebuf{DLL_SUFFIX}");
    let exe = std::env::current_exe().expect("test binary path");
    let deps = exe.parent().expect("deps directory").to_path_buf();
    let candidates = [deps.clone(), deps.parent().map(PathBuf::from).unwrap_or_default()];

    candidates
        .iter()
        .find(|dir| dir.join(&file).is_file())
        .cloned()
        .unwrap_or_else(|| panic!("{} not built next to {}", file, exe.display()))
}

fn load_runtime() -> Arc<DynamicRuntime> {
    let mut loader = LibraryLoader::new();
    loader.add_search_path(cdylib_dir());
    loader.load("stridebuf").expect("load built cdylib")
}

#[test]
fn test_loader_resolves_built_cdylib() {
    let rt = load_runtime();
    assert_eq!(rt.name(), format!("{DLL_PREFIX}stridebuf"));
    assert!(rt.path().is_file());
}

#[test]
fn test_dynamic_runtime_entry_points() {
    let rt = load_runtime();

    let handle = rt.allocate(2, 32, 1, &[8, 4, 3]).expect("allocate");
    assert_eq!(rt.dimensions(handle), 3);
    assert_eq!(rt.stride(handle, 2), 32);
    assert_eq!(rt.channels(handle), 3);
    assert_eq!(rt.data(handle).len, 8 * 4 * 3 * 4);
    unsafe {
        assert!(rt.deallocate(handle));
        assert!(!rt.deallocate(handle));
    }
    assert!(rt.data(handle).is_empty());
}

#[test]
fn test_dynamic_runtime_reports_native_failure() {
    let rt = load_runtime();
    let err = rt.allocate(2, 8, 1, &[1]).unwrap_err();
    assert_eq!(err, "unsupported element type float8");
}

#[test]
fn test_buffer_over_dynamic_runtime() {
    let rt: Arc<dyn NativeRuntime> = load_runtime();
    let mut buf = Buffer::with_runtime(rt, ElementType::UINT8, &[640, 480]).unwrap();

    assert_eq!(buf.shape(), vec![640, 480]);
    assert_eq!(buf.stride(1), Ok(640));
    assert_eq!(
        buf.extent(2),
        Err(BufferError::DimensionOutOfBounds {
            query: DimensionQuery::Extent,
            index: 2,
            dimensions: 2,
        })
    );

    buf.data()[1000] = 7;
    assert_eq!(buf.read_only_data()[1000], 7);
    assert_eq!(buf.read_only_data().len(), 640 * 480);

    buf.release();
    assert!(buf.is_released());
    assert_eq!(buf.dimensions(), 0);
}

#[test]
fn test_allocation_error_crosses_the_library_boundary() {
    let rt: Arc<dyn NativeRuntime> = load_runtime();
    let err = Buffer::with_runtime(rt, ElementType::UINT8, &[2, -1]).unwrap_err();
    assert_eq!(
        err,
        BufferError::Allocation("negative extent -1 in dimension 1".to_string())
    );
}

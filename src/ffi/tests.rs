//! FFI Module Tests

use std::path::{Path, PathBuf};

use super::loader::{check_abi_version, library_filename};
use super::*;
use crate::error::BufferError;

#[test]
fn test_host_runtime_round_trip() {
    let rt = HostRuntime;
    let handle = rt.allocate(1, 8, 1, &[640, 480]).expect("allocate");

    assert_eq!(rt.dimensions(handle), 2);
    assert_eq!(rt.extent(handle, 0), 640);
    assert_eq!(rt.extent(handle, 1), 480);
    assert_eq!(rt.stride(handle, 1), 640);
    assert_eq!(rt.width(handle), 640);
    assert_eq!(rt.height(handle), 480);
    assert_eq!(rt.channels(handle), 1);

    let view = rt.data(handle);
    assert!(!view.is_empty());
    assert_eq!(view.len, 640 * 480);

    unsafe {
        assert!(rt.deallocate(handle));
        assert!(!rt.deallocate(handle));
    }
    assert!(rt.data(handle).is_empty());
}

#[test]
fn test_host_runtime_reports_native_failure() {
    let err = HostRuntime.allocate(3, 8, 1, &[4]).unwrap_err();
    assert_eq!(err, "unsupported element type handle");

    let err = HostRuntime.allocate(1, 8, 1, &[4, -2]).unwrap_err();
    assert!(err.contains("negative extent -2"));
}

#[test]
fn test_raw_view_empty() {
    assert!(RawView::empty().is_empty());
}

#[test]
fn test_library_filename() {
    #[cfg(target_os = "linux")]
    {
        assert_eq!(library_filename("stridebuf"), "libstridebuf.so");
        assert_eq!(library_filename("libstridebuf.so"), "libstridebuf.so");
    }
    #[cfg(target_os = "macos")]
    assert_eq!(library_filename("stridebuf"), "libstridebuf.dylib");
    #[cfg(target_os = "windows")]
    assert_eq!(library_filename("stridebuf"), "stridebuf.dll");
}

#[test]
fn test_loader_search_path_precedence() {
    let mut loader = LibraryLoader::new();
    loader.add_search_path("/opt/first");
    loader.add_search_path("/opt/second");
    assert_eq!(loader.search_paths()[0], PathBuf::from("/opt/second"));
    assert_eq!(loader.search_paths()[1], PathBuf::from("/opt/first"));
}

#[test]
fn test_loader_finds_file_in_search_path() {
    let dir = std::env::temp_dir().join("stridebuf_loader_lookup");
    std::fs::create_dir_all(&dir).unwrap();
    let file = dir.join(library_filename("lookup_only"));
    std::fs::write(&file, b"").unwrap();

    let mut loader = LibraryLoader::new();
    assert_eq!(loader.find_library("lookup_only"), None);
    loader.add_search_path(&dir);
    assert_eq!(loader.find_library("lookup_only"), Some(file.clone()));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_loader_missing_library() {
    let loader = LibraryLoader::new();
    let err = loader.load("definitely_not_a_buffer_runtime").err().unwrap();
    assert!(matches!(err, BufferError::Library(_)));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_dynamic_load_rejects_non_library() {
    let path = std::env::temp_dir().join("stridebuf_test_not_a_library.so");
    std::fs::write(&path, b"not an object file").unwrap();
    let err = DynamicRuntime::load(&path).err().unwrap();
    assert!(err.to_string().contains("cannot open"));
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_abi_version_check() {
    let path = Path::new("libother.so");
    assert!(check_abi_version(path, abi::ABI_VERSION).is_ok());

    let err = check_abi_version(path, abi::ABI_VERSION + 1).unwrap_err();
    assert!(matches!(err, BufferError::Library(_)));
    assert_eq!(
        err.to_string(),
        format!(
            "Native library error: 'libother.so' exports sbuf ABI v{}, expected v{}",
            abi::ABI_VERSION + 1,
            abi::ABI_VERSION
        )
    );
}

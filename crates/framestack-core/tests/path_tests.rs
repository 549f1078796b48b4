use framestack_core::*;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_project_id_from_root() {
    let root = "/home/user/project";
    let id = project_id_from_root(root);

    assert_eq!(id.as_str().len(), 64);

    let id2 = project_id_from_root(root);
    assert_eq!(id, id2);

    let id3 = project_id_from_root("/different/path");
    assert_ne!(id, id3);
}

#[test]
fn test_discover_project_root_with_explicit() {
    let explicit_root = "/explicit/project/root";
    let result = discover_project_root(Some(explicit_root)).unwrap();
    assert_eq!(result, PathBuf::from(explicit_root));
}

#[test]
fn test_discover_project_root_priority() {
    unsafe {
        env::set_var("FRAMESTACK_PROJECT_ROOT", "/env/project/root");
    }

    let result = discover_project_root(Some("/explicit/root")).unwrap();
    assert_eq!(result, PathBuf::from("/explicit/root"));

    unsafe {
        env::remove_var("FRAMESTACK_PROJECT_ROOT");
    }
}

#[test]
fn test_discover_project_root_falls_back_to_cwd() {
    unsafe {
        env::remove_var("FRAMESTACK_PROJECT_ROOT");
    }

    let result = discover_project_root(None).unwrap();
    assert!(result.is_absolute() || result == PathBuf::from("."));
}

#[test]
fn test_normalize_path() {
    let temp_dir = TempDir::new().unwrap();
    let normalized = normalize_path(temp_dir.path());
    assert!(normalized.is_absolute());
}

#[test]
fn test_paths_equal() {
    let temp_dir = TempDir::new().unwrap();
    let path1 = temp_dir.path();
    let path2 = temp_dir.path();
    assert!(paths_equal(path1, path2));
}

#[test]
fn test_resolve_effective_project_id_uses_explicit_when_given() {
    let explicit = framestack_types::ProjectId::from_source("/explicit/repo");
    let resolved = resolve_effective_project_id(Some(&explicit)).unwrap();
    assert_eq!(resolved, explicit);
}

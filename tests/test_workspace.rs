//! Integration tests for scratch directory clearing.

use std::fs;

use traffic_sign_detector::workspace::clear_folder;

#[test]
fn test_clear_removes_only_direct_files() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    fs::write(dir.path().join("frame_000.png"), b"a")?;
    fs::write(dir.path().join("notes.txt"), b"b")?;
    fs::create_dir(dir.path().join("nested"))?;
    fs::write(dir.path().join("nested").join("keep.png"), b"c")?;

    assert_eq!(clear_folder(dir.path()), 2);

    assert!(!dir.path().join("frame_000.png").exists());
    assert!(!dir.path().join("notes.txt").exists());
    assert!(dir.path().join("nested").join("keep.png").is_file());
    Ok(())
}

#[test]
fn test_clear_empty_folder() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    assert_eq!(clear_folder(dir.path()), 0);
    assert!(dir.path().is_dir());
    Ok(())
}

#[test]
fn test_clear_missing_folder_is_noop() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let missing = dir.path().join("frames");

    assert_eq!(clear_folder(&missing), 0);
    assert!(!missing.exists());
    Ok(())
}

#[test]
fn test_clear_on_regular_file_leaves_it_alone() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let file = dir.path().join("frames");
    fs::write(&file, b"not a directory")?;

    assert_eq!(clear_folder(&file), 0);
    assert_eq!(fs::read(&file)?, b"not a directory");
    Ok(())
}

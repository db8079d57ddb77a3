mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::{TestResult, init_tracing, task};
use tempfile::TempDir;
use wfexec::exec::{FileRole, NOT_FOUND_SIZE, audit_files};
use wfexec::fs::RealFileSystem;
use wfexec::fs::mock::MockFileSystem;
use wfexec_test_utils::builders::JobDescriptorBuilder;

#[test]
fn sizes_and_missing_sentinel() {
    init_tracing();
    let fs = MockFileSystem::new();
    fs.add_file("/in/a.fits", "12345");
    fs.add_file("/out/b.fits", "");
    fs.break_path("/out/locked");
    let job = JobDescriptorBuilder::new("mAdd")
        .input("a.fits")
        .input("gone.fits")
        .output("b.fits")
        .output("locked")
        .build();

    let audit = audit_files(&fs, &task("task:wf:0"), &job, Path::new("/in"), Path::new("/out"));

    let summary: Vec<(FileRole, PathBuf, i64)> = audit
        .into_iter()
        .map(|a| (a.role, a.path, a.size))
        .collect();
    assert_eq!(
        summary,
        vec![
            (FileRole::Input, PathBuf::from("/in/a.fits"), 5),
            (FileRole::Input, PathBuf::from("/in/gone.fits"), NOT_FOUND_SIZE),
            (FileRole::Output, PathBuf::from("/out/b.fits"), 0),
            (FileRole::Output, PathBuf::from("/out/locked"), NOT_FOUND_SIZE),
        ]
    );
}

#[test]
fn real_filesystem_reports_sizes() -> TestResult {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("data.bin"), vec![0u8; 42])?;
    let job = JobDescriptorBuilder::new("x")
        .output("data.bin")
        .output("missing.bin")
        .build();

    let audit = audit_files(
        &RealFileSystem,
        &task("task:wf:1"),
        &job,
        dir.path(),
        dir.path(),
    );

    assert_eq!(audit[0].size, 42);
    assert_eq!(audit[1].size, NOT_FOUND_SIZE);
    Ok(())
}

use std::path::PathBuf;

use wfexec::errors::WorkerError;
use wfexec::job::{JobDescriptor, OutputTarget};
use wfexec::types::TaskId;

#[test]
fn task_id_parts() {
    let t: TaskId = "task:montage-17:42".parse().unwrap();
    assert_eq!(t.workflow().as_str(), "montage-17");
    assert_eq!(t.index(), 42);
    assert_eq!(t.to_string(), "task:montage-17:42");
    assert_eq!(t.file_stem(), "task_montage-17_42");
}

#[test]
fn workflow_id_may_contain_colons() {
    let t: TaskId = "task:a:b:3".parse().unwrap();
    assert_eq!(t.workflow().as_str(), "a:b");
    assert_eq!(t.index(), 3);
}

#[test]
fn malformed_task_ids_are_rejected() {
    for bad in ["", "task:", "task:wf", "task::1", "job:wf:1", "task:wf:x", "task:wf:-1"] {
        let err = bad.parse::<TaskId>().unwrap_err();
        assert!(matches!(err, WorkerError::InvalidTaskId(_)), "{bad:?}");
    }
}

#[test]
fn full_descriptor_parses() {
    let job = JobDescriptor::parse(
        r#"{
            "name": "mProject",
            "executable": "mProject",
            "args": ["-X", "in.fits", "out.fits"],
            "stdout": "mProject.out",
            "stderrAppend": "mProject.err",
            "inputs": [{"name": "in.fits"}],
            "outputs": [{"name": "out.fits"}],
            "somethingElse": true
        }"#,
    )
    .unwrap();

    assert_eq!(job.name, "mProject");
    assert_eq!(job.args, vec!["-X", "in.fits", "out.fits"]);
    assert_eq!(job.stdout, Some(OutputTarget::Truncate(PathBuf::from("mProject.out"))));
    assert_eq!(job.stderr, Some(OutputTarget::Append(PathBuf::from("mProject.err"))));
    assert_eq!(job.input_paths().collect::<Vec<_>>(), vec![&PathBuf::from("in.fits")]);
    assert_eq!(job.output_paths().collect::<Vec<_>>(), vec![&PathBuf::from("out.fits")]);
}

#[test]
fn name_defaults_to_executable() {
    let job = JobDescriptor::parse(r#"{"executable": "echo"}"#).unwrap();
    assert_eq!(job.name, "echo");
    assert!(job.args.is_empty());
    assert!(job.stdout.is_none());
    assert!(job.inputs.is_empty());
}

#[test]
fn invalid_descriptors_are_rejected() {
    let cases = [
        "not json",
        r#"{"args": []}"#,
        r#"{"executable": "  "}"#,
        r#"{"executable": "x", "stdout": "a", "stdoutAppend": "b"}"#,
        r#"{"executable": "x", "stderr": "a", "stderrAppend": "b"}"#,
        r#"{"executable": "x", "inputs": [{"name": ""}]}"#,
    ];
    for payload in cases {
        let err = JobDescriptor::parse(payload).unwrap_err();
        assert!(matches!(err, WorkerError::InvalidDescriptor(_)), "{payload}");
    }
}

use std::process::Command;

#[test]
fn test_ros_and_no_ros_conflict_is_a_usage_error() {
    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args(["start", "--ros", "--no-ros"])
        .output()
        .expect("failed to run simdock start");
    assert_eq!(out.status.code(), Some(2), "clap usage errors exit 2");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("cannot be used with"),
        "expected a conflict diagnostic, got:\n{}",
        stderr
    );
}

#[test]
fn test_unknown_gui_value_is_rejected() {
    let bin = env!("CARGO_BIN_EXE_simdock");
    let out = Command::new(bin)
        .args(["start", "--gui", "vnc"])
        .output()
        .expect("failed to run simdock start");
    assert_eq!(out.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(
        stderr.contains("invalid value"),
        "expected an invalid-value diagnostic, got:\n{}",
        stderr
    );
}

/* CLI Tests
 *
 * These tests drive the `ksrp` binary end to end: flags, config file,
 * library copy and the guarantee that a failing compilation writes nothing.
 */

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const POWER: &str = r#"
protocol:
  subsystem: power
  subsystem_id: 3
  frames:
    - name: status
      frame_id: 1
      fields:
        - name: voltage
          type: float
        - name: ok
          type: bool
"#;

fn ksrp(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ksrp"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("failed to run ksrp")
}

fn source_dir(root: &Path, power: &str) -> std::path::PathBuf {
    let dir = root.join("specs");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("power.yaml"), power).unwrap();
    dir
}

#[test]
fn test_codegen_writes_headers_and_library() {
    let work = tempfile::tempdir().unwrap();
    let specs = source_dir(work.path(), POWER);
    let library = work.path().join("skeleton/kalman-status-report-protocol");
    fs::create_dir_all(&library).unwrap();
    fs::write(library.join("frames.h"), "/* frames */\n").unwrap();
    let out = work.path().join("out");

    let output = ksrp(
        &[
            "codegen",
            "-s",
            specs.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
            "--library",
            work.path().join("skeleton").to_str().unwrap(),
        ],
        work.path(),
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("[✓] Wrote 4 header(s)"));

    let root = out.join("kalman-status-report-protocol");
    assert!(root.join("frames.h").is_file());
    let header = fs::read_to_string(root.join("protocols/subsystems/power_protocol.h")).unwrap();
    assert!(header.contains("#define KSRP_POWER_STATUS_FRAME_SIZE 5"), "{}", header);
    assert!(root.join("instances/power_instance.h").is_file());
    assert!(root.join("protocols/protocol_utils.h").is_file());
}

#[test]
fn test_config_file_supplies_settings() {
    let work = tempfile::tempdir().unwrap();
    source_dir(work.path(), POWER);
    fs::write(
        work.path().join("ksrp.yaml"),
        "source_dir: specs\noutput_dir: out\nprefix: ACME\nemitter: construct\ninclude_root: acme\n",
    )
    .unwrap();

    let output = ksrp(&["codegen", "--no-library"], work.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let header = fs::read_to_string(work.path().join("out/acme/protocols/subsystems/power_protocol.h")).unwrap();
    assert!(header.contains("} ACME_Power_Status_Frame;"), "{}", header);
    assert!(header.contains("#include \"acme/frames.h\""), "{}", header);
}

#[test]
fn test_failed_compilation_writes_nothing() {
    let work = tempfile::tempdir().unwrap();
    let specs = source_dir(work.path(), &POWER.replace("type: float", "type: uint24_t"));
    let out = work.path().join("out");

    let output = ksrp(
        &["codegen", "-s", specs.to_str().unwrap(), "-o", out.to_str().unwrap(), "--no-library"],
        work.path(),
    );
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown type 'uint24_t'"), "{}", stderr);
    assert!(stderr.contains("field 'voltage'"), "{}", stderr);
    assert!(!out.exists());
}

#[test]
fn test_analyze_prints_layout_and_ir() {
    let work = tempfile::tempdir().unwrap();
    let specs = source_dir(work.path(), POWER);

    let output = ksrp(&["analyze", "-s", specs.to_str().unwrap(), "--print-ir"], work.path());
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Frame 'status' (id 1, 5 bytes)"), "{}", stdout);
    assert!(stdout.contains("\"storage_type\": \"uint8_t\""), "{}", stdout);
    assert!(stdout.contains("\"kind\": \"bool_cast\""), "{}", stdout);
}

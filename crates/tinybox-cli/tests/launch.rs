//! End-to-end tests for the `tinybox` binary.
//!
//! Tests marked `#[ignore]` create user and mount namespaces and need a
//! kernel that allows unprivileged user namespaces. Run them with
//! `cargo test -p tinybox-cli -- --ignored`.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};

use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tempfile::TempDir;

const TINYBOX: &str = env!("CARGO_BIN_EXE_tinybox");

fn tinybox(args: &[&str]) -> Output {
    Command::new(TINYBOX)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("tinybox should start")
}

// ── Usage ────────────────────────────────────────────────────────────

#[test]
fn no_arguments_prints_usage_and_fails() {
    let output = tinybox(&[]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--root"), "stderr: {stderr}");
    assert!(stderr.contains("--shell"), "stderr: {stderr}");
}

#[test]
fn missing_shell_touches_nothing_under_root() {
    let root = TempDir::new().unwrap();
    let arg = format!("--root={}", root.path().display());
    let output = tinybox(&[arg.as_str()]);
    assert!(!output.status.success());
    assert!(!root.path().join(".pivot_root").exists());
    assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
}

#[test]
fn nonexistent_root_is_rejected() {
    let root = TempDir::new().unwrap();
    let missing = root.path().join("absent");
    let arg = format!("--root={}", missing.display());
    let output = tinybox(&[arg.as_str(), "--shell=/bin/true"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!missing.exists());
}

// ── Full launch ──────────────────────────────────────────────────────

/// Builds a root filesystem holding the named host programs under `/bin`
/// plus the shared libraries `ldd` reports for them.
fn fakeroot(programs: &[&str]) -> TempDir {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("bin")).unwrap();
    for name in programs {
        let host = which::which(name).unwrap_or_else(|e| panic!("{name} not found: {e}"));
        let _ = fs::copy(&host, root.path().join("bin").join(name)).unwrap();
        for lib in shared_libraries(&host) {
            copy_preserving_path(&lib, root.path());
        }
    }
    root
}

fn shared_libraries(binary: &Path) -> Vec<PathBuf> {
    let output = Command::new("ldd").arg(binary).output().unwrap();
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| line.split_whitespace().find(|t| t.starts_with('/')))
        .map(PathBuf::from)
        .collect()
}

fn copy_preserving_path(host: &Path, root: &Path) {
    let dest = root.join(host.strip_prefix("/").unwrap());
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    let _ = fs::copy(host, dest).unwrap();
}

fn launch(root: &TempDir, shell: &str, extra: &[&str]) -> Output {
    let root_arg = format!("--root={}", root.path().display());
    let shell_arg = format!("--shell={shell}");
    let mut args = vec![root_arg.as_str(), shell_arg.as_str()];
    args.extend_from_slice(extra);
    tinybox(&args)
}

fn is_mounted(path: &Path) -> bool {
    let canonical = fs::canonicalize(path).unwrap();
    fs::read_to_string("/proc/self/mountinfo")
        .unwrap()
        .lines()
        .any(|line| line.split_whitespace().nth(4) == canonical.to_str())
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn true_exits_zero_and_leaves_no_residue() {
    let root = fakeroot(&["true"]);
    let output = launch(&root, "/bin/true", &[]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(!root.path().join(".pivot_root").exists());
    assert!(!is_mounted(root.path()));
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn target_exit_status_becomes_launcher_status() {
    let root = fakeroot(&["sh"]);
    let output = launch(&root, "/bin/sh", &["--", "-c", "exit 7"]);
    assert_eq!(output.status.code(), Some(7));
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn target_runs_at_container_root() {
    let root = fakeroot(&["sh"]);
    let output = launch(&root, "/bin/sh", &["--", "-c", "pwd"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "/\n");
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn leftover_staging_directory_is_tolerated() {
    let root = fakeroot(&["true"]);
    fs::create_dir(root.path().join(".pivot_root")).unwrap();
    let output = launch(&root, "/bin/true", &[]);
    assert!(output.status.success());
    assert!(!root.path().join(".pivot_root").exists());
}

/// Host UID outside the one-entry map when the suite itself runs as root.
const UNMAPPED_UID: u32 = 4242;

/// What the kernel shows for IDs that have no mapping in a user namespace.
const OVERFLOW_ID: &str = "65534";

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn container_user_is_root() {
    let root = fakeroot(&["sh", "id"]);
    let output = launch(&root, "/bin/sh", &["--", "-c", "id -u; id -g"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "0\n0\n");
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn only_the_invoking_user_is_mapped() {
    let root = fakeroot(&["sh", "stat"]);
    let marker = root.path().join("marker");
    fs::write(&marker, b"").unwrap();

    // The invoking user must appear as root; anything else as unmapped.
    let expected = if fs::metadata(&marker).unwrap().uid() == 0 {
        std::os::unix::fs::chown(&marker, Some(UNMAPPED_UID), Some(UNMAPPED_UID)).unwrap();
        format!("{OVERFLOW_ID} {OVERFLOW_ID}\n")
    } else {
        "0 0\n".to_string()
    };

    let output = launch(&root, "/bin/sh", &["--", "-c", "stat -c '%u %g' /marker"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), expected);
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn target_is_not_the_namespace_init() {
    let root = fakeroot(&["sh"]);
    let output = launch(&root, "/bin/sh", &["--", "-c", "echo $$"]);
    assert!(output.status.success());
    let pid: u32 = String::from_utf8_lossy(&output.stdout).trim().parse().unwrap();
    assert!(pid > 1, "target ran as pid {pid}");
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn interrupt_to_process_group_stops_the_container() {
    let root = fakeroot(&["sleep"]);
    let mut child = Command::new(TINYBOX)
        .arg(format!("--root={}", root.path().display()))
        .args(["--shell=/bin/sleep", "--", "30"])
        .env("RUST_LOG", "warn")
        .process_group(0)
        .spawn()
        .unwrap();
    thread::sleep(Duration::from_millis(800));

    let group = Pid::from_raw(i32::try_from(child.id()).unwrap());
    killpg(group, Signal::SIGINT).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = killpg(group, Signal::SIGKILL);
            panic!("container still running 5s after an interrupt");
        }
        thread::sleep(Duration::from_millis(50));
    };
    assert_eq!(status.code(), Some(130));
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn hostname_and_environment_follow_policy() {
    let root = fakeroot(&["sh", "uname"]);
    let output = launch(
        &root,
        "/bin/sh",
        &[
            "--hostname=probe",
            "--env=PATH=/bin",
            "--env=GREETING=hi",
            "--",
            "-c",
            r#"uname -n; echo "$GREETING:${HOME:-unset}""#,
        ],
    );
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "probe\nhi:unset\n");
}

#[test]
#[ignore = "requires unprivileged user namespaces"]
fn missing_target_fails_after_pivot() {
    let root = fakeroot(&[]);
    let output = launch(&root, "/bin/absent", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(!root.path().join(".pivot_root").exists());
}

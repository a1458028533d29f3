//! The built-in action handler on real directories, and full runs through
//! the `cyclekeeper` binary.

use cyclekeeper_cli::commands::action::{copy_entry, delete_entry, move_entry};
use cyclekeeper_cli::CliError;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn cyclekeeper() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cyclekeeper"));
    cmd.env_remove("RUST_LOG").env_remove("CYCLEKEEPER_SETTINGS");
    cmd
}

fn tree(root: &Path) {
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("a.grb"), b"a").unwrap();
    fs::write(root.join("sub").join("b.grb"), b"b").unwrap();
}

#[test]
fn test_copy_file_into_new_directory() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("nwp_2008080600.nc");
    fs::write(&source, b"fields").unwrap();

    let dest = dir.path().join("arch").join("2008").join("08");
    let target = copy_entry(&source, &dest, false).unwrap();

    assert_eq!(target, dest.join("nwp_2008080600.nc"));
    assert_eq!(fs::read(&target).unwrap(), b"fields");
    assert!(source.exists());
}

#[test]
fn test_copy_directory_tree() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("2008080600");
    tree(&source);

    let target = copy_entry(&source, &dir.path().join("arch"), false).unwrap();
    assert_eq!(fs::read(target.join("a.grb")).unwrap(), b"a");
    assert_eq!(fs::read(target.join("sub").join("b.grb")).unwrap(), b"b");
}

#[cfg(unix)]
#[test]
fn test_cheap_copy_hard_links() {
    use std::os::unix::fs::MetadataExt;

    let dir = TempDir::new().unwrap();
    let source = dir.path().join("2008080600");
    fs::write(&source, b"x").unwrap();

    let target = copy_entry(&source, &dir.path().join("arch"), true).unwrap();
    assert_eq!(
        fs::metadata(&source).unwrap().ino(),
        fs::metadata(&target).unwrap().ino()
    );
}

#[test]
fn test_move_directory_tree() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("2008080600");
    tree(&source);

    let target = move_entry(&source, &dir.path().join("arch")).unwrap();
    assert!(!source.exists());
    assert_eq!(fs::read(target.join("sub").join("b.grb")).unwrap(), b"b");
}

#[test]
fn test_move_onto_different_target_fails_and_keeps_source() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("2008080600");
    fs::write(&source, b"new").unwrap();
    let dest = dir.path().join("arch");
    fs::create_dir(&dest).unwrap();
    fs::write(dest.join("2008080600"), b"old").unwrap();

    let err = move_entry(&source, &dest).unwrap_err();
    assert!(matches!(err, CliError::NonIdenticalTarget(_)));
    assert!(source.exists());
}

#[test]
fn test_move_onto_identical_target_removes_source() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("2008080600");
    fs::write(&source, b"same").unwrap();
    let dest = dir.path().join("arch");
    fs::create_dir(&dest).unwrap();
    fs::write(dest.join("2008080600"), b"same").unwrap();

    move_entry(&source, &dest).unwrap();
    assert!(!source.exists());
}

#[test]
fn test_delete_file_and_tree() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("2008080600");
    fs::write(&file, b"x").unwrap();
    let tree_root = dir.path().join("2008080700");
    tree(&tree_root);

    delete_entry(&file).unwrap();
    delete_entry(&tree_root).unwrap();
    assert!(!file.exists());
    assert!(!tree_root.exists());

    assert!(delete_entry(&file).is_err());
}

#[test]
fn test_action_exit_status() {
    let dir = TempDir::new().unwrap();
    let entry = dir.path().join("2008080600");
    fs::write(&entry, b"x").unwrap();

    let ok = cyclekeeper()
        .args(["action", "delete"])
        .arg(&entry)
        .arg("")
        .status()
        .unwrap();
    assert!(ok.success());
    assert!(!entry.exists());

    let failed = cyclekeeper()
        .args(["action", "delete"])
        .arg(&entry)
        .arg("")
        .status()
        .unwrap();
    assert_eq!(failed.code(), Some(1));
}

#[test]
fn test_run_with_built_in_handler() {
    let data = TempDir::new().unwrap();
    for name in ["2008080600", "2008080700", "2008080718", "2008080800"] {
        fs::write(data.path().join(name), name).unwrap();
    }
    let archive = TempDir::new().unwrap();

    let conf = TempDir::new().unwrap();
    let rules = conf.path().join("housekeeping.conf");
    fs::write(
        &rules,
        format!(
            "ARCHIVE={}\n{} (\\d{{10}}) move 24 $ARCHIVE/YYYYMMDD\n",
            archive.path().display(),
            data.path().display()
        ),
    )
    .unwrap();

    let output = cyclekeeper()
        .args(["--format", "json", "run"])
        .arg(&rules)
        .arg("2008080800")
        .args(["--batch-size", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["rules"][0]["scanned"], 4);
    assert_eq!(report["rules"][0]["matched"], 4);
    assert_eq!(report["rules"][0]["actioned"], 2);

    assert!(archive.path().join("20080806").join("2008080600").exists());
    assert!(archive.path().join("20080807").join("2008080700").exists());
    assert!(data.path().join("2008080718").exists());
    assert!(!data.path().join("2008080600").exists());
}

#[test]
fn test_verbose_run_keeps_json_on_stdout() {
    let data = TempDir::new().unwrap();
    for name in ["2008080600", "2008080800"] {
        fs::write(data.path().join(name), name).unwrap();
    }

    let conf = TempDir::new().unwrap();
    let rules = conf.path().join("housekeeping.conf");
    fs::write(&rules, format!("{} (\\d{{10}}) delete 24\n", data.path().display())).unwrap();

    let output = cyclekeeper()
        .args(["--verbose", "--format", "json", "run"])
        .arg(&rules)
        .arg("2008080800")
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["rules"][0]["actioned"], 1);
    assert!(!data.path().join("2008080600").exists());

    // the handler's own notes end up with the logs
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("deleted "), "{}", stderr);
}

#[test]
fn test_run_rejects_bad_cycle_time() {
    let conf = TempDir::new().unwrap();
    let rules = conf.path().join("housekeeping.conf");
    fs::write(&rules, "").unwrap();

    let output = cyclekeeper()
        .arg("run")
        .arg(&rules)
        .arg("20080808")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Bad cycle time: 20080808"));
}

#[test]
fn test_run_missing_rule_file() {
    let output = cyclekeeper()
        .args(["run", "/nonexistent/housekeeping.conf", "2008080800"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("file not found"));
}

//! Integration tests for CLI behavior
//!
//! These tests verify the external behavior of the tzfmt binary: exit codes,
//! emitted text and files written.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_fs::prelude::*;
use predicates::prelude::*;

const UNFORMATTED: &str = "fn main() {\n\tlet x = 1;   \n\n\n}\n";
const FORMATTED: &str = "fn main() {\n    let x = 1;\n\n}\n";

/// Helper to create a command for the tzfmt CLI
fn tzfmt_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("tzfmt");
    cmd.env_remove("RUST_LOG");
    cmd
}

mod help_command {
    use super::*;

    #[test]
    fn shows_help_with_flag() {
        tzfmt_cmd()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Usage:"));
    }

    #[test]
    fn shows_version_with_flag() {
        tzfmt_cmd()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }
}

mod format_command {
    use super::*;

    #[test]
    fn formats_stdin_to_stdout() {
        let temp = assert_fs::TempDir::new().unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .arg("format")
            .write_stdin(UNFORMATTED)
            .assert()
            .success()
            .stdout(FORMATTED);
    }

    #[test]
    fn labelled_stdin_is_not_written_to_disk() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("named.src");
        file.write_str("original\n").unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["format", "--stdin-name", "named.src"])
            .write_stdin(UNFORMATTED)
            .assert()
            .success()
            .stdout(FORMATTED);

        file.assert("original\n");
    }

    #[test]
    fn rewrites_files_in_place() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("main.src");
        file.write_str(UNFORMATTED).unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["format", "main.src"])
            .assert()
            .success();

        file.assert(FORMATTED);
    }

    #[test]
    fn check_reports_files_that_would_change() {
        let temp = assert_fs::TempDir::new().unwrap();
        let dirty = temp.child("dirty.src");
        let clean = temp.child("clean.src");
        dirty.write_str(UNFORMATTED).unwrap();
        clean.write_str(FORMATTED).unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["format", "--check", "dirty.src", "clean.src"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("dirty.src"))
            .stdout(predicate::str::contains("clean.src").not());

        dirty.assert(UNFORMATTED);
    }

    #[test]
    fn check_succeeds_when_formatted() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("clean.src").write_str(FORMATTED).unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["format", "--check", "clean.src"])
            .assert()
            .success()
            .stdout("");
    }

    #[test]
    fn emits_diff() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("main.src").write_str(UNFORMATTED).unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["format", "--emit", "diff", "--color", "never", "main.src"])
            .assert()
            .code(1)
            .stdout(predicate::str::contains("Diff in main.src at line 2:"))
            .stdout(predicate::str::contains("+    let x = 1;"));
    }

    #[test]
    fn emits_modified_lines() {
        let temp = assert_fs::TempDir::new().unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["format", "--emit", "modified-lines"])
            .write_stdin("a\n  b  \nc\n")
            .assert()
            .code(1)
            .stdout("2 1 1\n  b\n");
    }

    #[test]
    fn file_lines_restrict_changes() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("main.src");
        file.write_str("a   \nb   \nc   \n").unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args([
                "format",
                "--file-lines",
                r#"[{"file":"main.src","range":[2,2]}]"#,
                "main.src",
            ])
            .assert()
            .success();

        file.assert("a   \nb\nc   \n");
    }

    #[test]
    fn file_lines_match_dotted_path() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("main.src");
        file.write_str("a   \r\nb   \nc   ").unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args([
                "format",
                "--file-lines",
                r#"[{"file":"main.src","range":[2,2]}]"#,
                "./main.src",
            ])
            .assert()
            .success();

        file.assert("a   \r\nb\r\nc   ");
    }

    #[test]
    fn unlisted_files_are_skipped_by_default() {
        let temp = assert_fs::TempDir::new().unwrap();
        let listed = temp.child("listed.src");
        let other = temp.child("other.src");
        listed.write_str("x  \n").unwrap();
        other.write_str("y  \n").unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args([
                "format",
                "--file-lines",
                r#"[{"file":"listed.src","range":[1,1]}]"#,
                "listed.src",
                "other.src",
            ])
            .assert()
            .success();

        listed.assert("x\n");
        other.assert("y  \n");
    }

    #[test]
    fn parse_error_fails_with_report() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("broken.src");
        file.write_str("fn main() {\n  x  \n").unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["format", "--color", "never", "broken.src"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("broken.src:"))
            .stderr(predicate::str::contains("unclosed delimiter"));

        file.assert("fn main() {\n  x  \n");
    }

    #[test]
    fn json_report() {
        let temp = assert_fs::TempDir::new().unwrap();

        let output = tzfmt_cmd()
            .current_dir(temp.path())
            .args(["-q", "format", "--report", "json"])
            .write_stdin("#![feature(x)]\n")
            .assert()
            .code(2)
            .get_output()
            .clone();

        let report: serde_json::Value = serde_json::from_slice(&output.stderr).unwrap();
        assert_eq!(report["errors"], 1);
        assert_eq!(report["files"][0]["name"], "<stdin>");
        assert_eq!(
            report["files"][0]["diagnostics"][0]["kind"],
            "feature-gate"
        );
    }

    #[test]
    fn unknown_override_is_fatal() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("main.src");
        file.write_str(UNFORMATTED).unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["--set", "fooBarBaz=1", "format", "main.src"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("fooBarBaz"));

        file.assert(UNFORMATTED);
    }

    #[test]
    fn uses_discovered_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".tsuzufmt.jsonc")
            .write_str("{\n  // two-space indents\n  \"tab_spaces\": 2\n}\n")
            .unwrap();
        let nested = temp.child("src");
        nested.create_dir_all().unwrap();

        tzfmt_cmd()
            .current_dir(nested.path())
            .arg("format")
            .write_stdin("{\n\tx\n}\n")
            .assert()
            .success()
            .stdout("{\n  x\n}\n");
    }
}

mod config_command {
    use super::*;

    #[test]
    fn prints_resolved_config_with_origins() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".tsuzufmt.json")
            .write_str(r#"{ "max_width": 80 }"#)
            .unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["--set", "hard_tabs=true", "config"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"max_width\": 80, // from config file"))
            .stdout(predicate::str::contains("\"hard_tabs\": true, // from overrides"))
            .stdout(predicate::str::contains("\"tab_spaces\": 4,"));
    }

    #[test]
    fn prints_defaults() {
        tzfmt_cmd()
            .args(["config", "--default"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"max_width\": 100,"))
            .stdout(predicate::str::contains("blank_lines_upper_bound"));
    }

    #[test]
    fn rejects_invalid_config_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".tsuzufmt.json")
            .write_str(r#"{ "max_width": "wide" }"#)
            .unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .arg("config")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("max_width"));
    }
}

mod init_command {
    use super::*;

    #[test]
    fn creates_new_config_file() {
        let temp = assert_fs::TempDir::new().unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .arg("init")
            .assert()
            .success()
            .stderr(predicate::str::contains("Created"));

        temp.child(".tsuzufmt.jsonc")
            .assert(predicate::str::contains("\"max_width\": 100"));
    }

    #[test]
    fn fails_when_config_exists_without_force() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = temp.child(".tsuzufmt.jsonc");
        config.write_str("{}").unwrap();

        tzfmt_cmd()
            .current_dir(temp.path())
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));

        config.assert("{}");

        tzfmt_cmd()
            .current_dir(temp.path())
            .args(["init", "--force"])
            .assert()
            .success();

        config.assert(predicate::str::contains("tab_spaces"));
    }
}

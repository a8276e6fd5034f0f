//! Integration tests for CLI commands

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Helper to run teardown command
fn teardown(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_teardown"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute teardown")
}

/// Get the fixtures path
fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

mod validate_command {
    use super::*;

    #[test]
    fn test_validate_valid_request() {
        let output = teardown(&["validate", "-f", &fixture("valid-request.yaml")]);

        assert!(output.status.success(), "Expected success for valid request");
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("4 item(s), dry run"));
        assert!(stdout.contains("Validation passed"));
    }

    #[test]
    fn test_validate_reports_every_invalid_item() {
        let output = teardown(&["validate", "-f", &fixture("invalid-request.yaml")]);

        assert_eq!(output.status.code(), Some(2));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Invalid item #0: kind must be specified"));
        assert!(stdout.contains("Invalid item #1: action must be specified"));
        assert!(stdout.contains("Invalid item #2: unsupported action"));
        assert!(!stdout.contains("Invalid item #3"));

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("3 invalid item(s)"));
    }

    #[test]
    fn test_validate_bare_spec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("spec.yaml");
        fs::write(
            &path,
            "resources:\n  - kind: Deployment.apps\n    action: scaleToZero\n",
        )
        .unwrap();

        let output = teardown(&["validate", "-f", path.to_str().unwrap()]);
        assert!(output.status.success());
    }

    #[test]
    fn test_validate_malformed_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "resources: [\n").unwrap();

        let output = teardown(&["validate", "-f", path.to_str().unwrap()]);
        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_validate_missing_file() {
        let output = teardown(&["validate", "-f", "/nonexistent/request.yaml"]);

        assert_eq!(output.status.code(), Some(5));
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("IO error"));
    }
}

mod crd_command {
    use super::*;

    #[test]
    fn test_crd_prints_definition() {
        let output = teardown(&["crd"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("kind: CustomResourceDefinition"));
        assert!(stdout.contains("name: cleanuprequests.cleanup.teardown.dev"));
        assert!(stdout.contains("dryRun"));
    }
}

mod apply_command {
    use super::*;

    #[test]
    fn test_apply_missing_file_fails_before_cluster() {
        let output = teardown(&["apply", "-f", "/nonexistent/request.yaml", "--dry-run"]);
        assert_eq!(output.status.code(), Some(5));
    }
}

mod general {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let output = teardown(&["--help"]);

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        for command in ["run", "crd", "validate", "apply"] {
            assert!(stdout.contains(command), "missing {}", command);
        }
    }

    #[test]
    fn test_unknown_command_fails() {
        let output = teardown(&["destroy-everything"]);
        assert!(!output.status.success());
    }
}

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const POLICY: &str = r#"
[config]
resource_operations = ["read", "write"]
log_level = "error"

[[nodes]]
name = "pc1"
type = "PC"

[[nodes]]
name = "ua1"
type = "UA"
parents = ["pc1"]

[[nodes]]
name = "u1"
type = "U"
parents = ["ua1"]

[[nodes]]
name = "u2"
type = "U"
parents = ["ua1"]

[[nodes]]
name = "oa1"
type = "OA"
parents = ["pc1"]

[[nodes]]
name = "o1"
type = "O"
parents = ["oa1"]

[[associations]]
source = "ua1"
target = "oa1"
operations = ["read", "write"]

[[prohibitions]]
name = "u2-no-write"
subject = { kind = "node", value = "u2" }
operations = ["write"]
containers = { oa1 = false }
"#;

fn policy_file(suffix: &str, content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create policy file");
    file.write_all(content.as_bytes())
        .expect("Failed to write policy file");
    file
}

fn ngac(policy: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("ngac").unwrap();
    cmd.arg("--policy").arg(policy.path());
    cmd
}

#[test]
fn test_check_allowed() {
    let policy = policy_file(".toml", POLICY);
    ngac(&policy)
        .args(["check", "--user", "u1", "--target", "o1", "--ops", "read,write"])
        .assert()
        .success()
        .stdout(predicate::str::diff("allowed\n"));
}

#[test]
fn test_check_denied_by_prohibition() {
    let policy = policy_file(".toml", POLICY);
    ngac(&policy)
        .args(["check", "--user", "u2", "--target", "o1", "--ops", "read,write"])
        .assert()
        .code(1)
        .stdout(predicate::str::diff("denied\n"));

    ngac(&policy)
        .args(["check", "--user", "u2", "--target", "o1", "--ops", "read"])
        .assert()
        .success();
}

#[test]
fn test_list() {
    let policy = policy_file(".toml", POLICY);
    ngac(&policy)
        .args(["list", "--user", "u1", "--target", "o1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[read, write]\n"));

    ngac(&policy)
        .args(["--json", "list", "--user", "u2", "--target", "o1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"read\"").and(predicate::str::contains("write").not()));
}

#[test]
fn test_explain() {
    let policy = policy_file(".toml", POLICY);
    ngac(&policy)
        .args(["explain", "--user", "u2", "--target", "o1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("permissions: [read]")
                .and(predicate::str::contains("u2-ua1-oa1-o1"))
                .and(predicate::str::contains("prohibitions: u2-no-write")),
        );
}

#[test]
fn test_acl_json() {
    let policy = policy_file(".toml", POLICY);
    let output = ngac(&policy)
        .args(["acl", "--target", "o1", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let acl: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(acl["u1"], serde_json::json!(["read", "write"]));
    assert_eq!(acl["u2"], serde_json::json!(["read"]));
}

#[test]
fn test_capabilities() {
    let policy = policy_file(".toml", POLICY);
    ngac(&policy)
        .args(["capabilities", "--user", "u2"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("o1: [read]\n")
                .and(predicate::str::contains("oa1: [read]\n"))
                .and(predicate::str::contains("pc1").not()),
        );
}

#[test]
fn test_json_policy_file() {
    let json = r#"{
        "config": { "resource_operations": ["read"] },
        "nodes": [
            { "name": "pc1", "type": "PC" },
            { "name": "ua1", "type": "UA", "parents": ["pc1"] },
            { "name": "u1", "type": "U", "parents": ["ua1"] },
            { "name": "oa1", "type": "OA", "parents": ["pc1"] },
            { "name": "o1", "type": "O", "parents": ["oa1"] }
        ],
        "associations": [
            { "source": "ua1", "target": "oa1", "operations": ["*r"] }
        ]
    }"#;
    let policy = policy_file(".json", json);
    ngac(&policy)
        .args(["list", "--user", "u1", "--target", "o1"])
        .assert()
        .success()
        .stdout(predicate::str::diff("[read]\n"));
}

#[test]
fn test_missing_policy_file() {
    Command::cargo_bin("ngac")
        .unwrap()
        .args(["--policy", "/nonexistent/policy.toml", "list", "--user", "u1", "--target", "o1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn test_invalid_policy_is_rejected() {
    let broken = format!(
        "{}\n[[nodes]]\nname = \"o2\"\ntype = \"O\"\nparents = [\"nowhere\"]\n",
        POLICY
    );
    let policy = policy_file(".toml", &broken);
    ngac(&policy)
        .args(["list", "--user", "u1", "--target", "o1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load policy"));
}

#[test]
fn test_unknown_user() {
    let policy = policy_file(".toml", POLICY);
    ngac(&policy)
        .args(["check", "--user", "ghost", "--target", "o1", "--ops", "read"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cannot check ghost on o1"));
}

// Tests for the command-line binary.

use std::process::Command;

fn sitekit() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sitekit"));
    for var in [
        "DATABASE_URL",
        "DATABASE_USER",
        "DATABASE_PASSWORD",
        "DATABASE_PREFIX",
        "MYSQLDUMP_BIN",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_backup_with_unknown_kind_fails_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("backups");
    // Port 1 on loopback refuses connections; reaching it would change the error
    let output = sitekit()
        .current_dir(dir.path())
        .args(["--dsn", "mysql://127.0.0.1:1/shop", "backup", "--kind", "Oracle", "--path"])
        .arg(&out)
        .output()
        .expect("Failed to run sitekit");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("The backup kind \"Oracle\" is invalid"),
        "stderr: {stderr}"
    );
    assert!(!stderr.contains("Failed to connect"), "stderr: {stderr}");
    assert!(!out.exists());
}

#[test]
fn test_ip_command_prints_address_and_lookup_url() {
    let output = sitekit()
        .args(["ip", "--forwarded-for", "203.0.113.5", "--client-ip", "198.51.100.7"])
        .output()
        .expect("Failed to run sitekit");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(lines.next(), Some("203.0.113.5"));
    assert_eq!(
        lines.next(),
        Some("http://whatismyipaddress.com/ip/203.0.113.5")
    );
}

#[test]
fn test_query_on_sqlite_file_prints_json_rows() {
    let dir = tempfile::tempdir().unwrap();
    let dsn = format!("sqlite:{}?mode=rwc", dir.path().join("cli.db").display());

    let created = sitekit()
        .current_dir(dir.path())
        .args(["--dsn", &dsn, "exec", "CREATE TABLE t (id INTEGER, label TEXT)"])
        .output()
        .expect("Failed to run sitekit");
    assert!(created.status.success());

    let inserted = sitekit()
        .current_dir(dir.path())
        .args(["--dsn", &dsn, "exec", "INSERT INTO t VALUES (1, 'one'), (2, 'two')"])
        .output()
        .expect("Failed to run sitekit");
    assert_eq!(String::from_utf8_lossy(&inserted.stdout).trim(), "2 rows affected");

    let queried = sitekit()
        .current_dir(dir.path())
        .args(["--dsn", &dsn, "query", "SELECT id, label FROM t ORDER BY id"])
        .output()
        .expect("Failed to run sitekit");
    assert!(queried.status.success());
    let rows: serde_json::Value = serde_json::from_slice(&queried.stdout).unwrap();
    assert_eq!(rows, serde_json::json!([{"id": 1, "label": "one"}, {"id": 2, "label": "two"}]));
}

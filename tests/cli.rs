use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn td(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("td").unwrap();
    cmd.arg("--data-dir").arg(dir.path()).env_remove("TASKDECK_DIR").env("RUST_LOG", "debug");
    cmd
}

fn signed_in() -> TempDir {
    let dir = TempDir::new().unwrap();
    td(&dir)
        .args(["register", "--name", "Ada Lovelace", "--email", "ada@example.com", "--password", "secret1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered and signed in as ada@example.com"));
    dir
}

#[test]
fn commands_require_sign_in() {
    let dir = TempDir::new().unwrap();
    td(&dir)
        .arg("list")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not signed in"));
}

#[test]
fn mismatched_passwords_are_rejected() {
    let dir = TempDir::new().unwrap();
    td(&dir)
        .args(["register", "--name", "Ada", "--email", "ada@example.com", "--password", "secret1"])
        .args(["--confirm", "secret2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Passwords do not match!"));
}

#[test]
fn add_then_list() {
    let dir = signed_in();
    td(&dir)
        .args(["add", "Buy milk", "--deadline", "2030-01-01 09:00", "--priority", "high"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task created successfully!"));

    td(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"))
        .stdout(predicate::str::contains("Jan 1, 2030 09:00"))
        .stdout(predicate::str::contains("High"));
}

#[test]
fn empty_title_is_a_user_error() {
    let dir = signed_in();
    td(&dir)
        .args(["add", "   "])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Task title is required"));
}

#[test]
fn unreachable_deadline_is_a_user_error() {
    let dir = signed_in();
    td(&dir)
        .args(["add", "Someday", "--deadline", "in 99999999999d"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Could not understand deadline"));
}

#[test]
fn completing_a_recurring_task_schedules_the_next_one() {
    let dir = signed_in();
    td(&dir)
        .args(["add", "Water plants", "--deadline", "2030-01-01 09:00", "--recurring", "daily"])
        .assert()
        .success();

    td(&dir)
        .args(["toggle", "Water plants"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task completed!"));

    td(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Jan 1, 2030 09:00"))
        .stdout(predicate::str::contains("Jan 2, 2030 09:00"));

    td(&dir)
        .args(["list", "--status", "active"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Jan 2, 2030 09:00"))
        .stdout(predicate::str::contains("Jan 1, 2030 09:00").not());
}

#[test]
fn archive_moves_task_out_of_the_list() {
    let dir = signed_in();
    td(&dir).args(["add", "Old report", "--deadline", "2030-01-01 09:00"]).assert().success();

    td(&dir)
        .args(["archive", "old report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task archived successfully!"));

    td(&dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No tasks found"));

    td(&dir)
        .arg("archived")
        .assert()
        .success()
        .stdout(predicate::str::contains("Old report"));

    td(&dir)
        .args(["unarchive", "Old report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Task restored successfully!"));
}

#[test]
fn move_reorders_the_list() {
    let dir = signed_in();
    for title in ["First", "Second", "Third"] {
        td(&dir).args(["add", title, "--deadline", "2030-01-01 09:00"]).assert().success();
    }

    td(&dir)
        .args(["move", "Third", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved to position 1."));

    let output = td(&dir).arg("list").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    let third = stdout.find("Third").unwrap();
    let first = stdout.find("First").unwrap();
    assert!(third < first, "unexpected order:\n{stdout}");

    td(&dir)
        .args(["move", "Third", "9"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Position must be between 1 and 3"));
}

#[test]
fn dashboard_counts_tasks() {
    let dir = signed_in();
    td(&dir).args(["add", "Report", "--deadline", "2030-01-01 09:00", "--category", "work"]).assert().success();
    td(&dir).args(["add", "Gym", "--deadline", "2030-01-01 18:00", "--category", "health"]).assert().success();
    td(&dir).args(["toggle", "Gym"]).assert().success();

    td(&dir)
        .arg("dashboard")
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome back, Ada Lovelace!"))
        .stdout(predicate::str::is_match(r"Completed\s+1").unwrap())
        .stdout(predicate::str::is_match(r"Pending\s+1").unwrap())
        .stdout(predicate::str::contains("Work"))
        .stdout(predicate::str::contains("Health"));
}

#[test]
fn reminder_is_shown_once_per_day() {
    let dir = signed_in();
    td(&dir).arg("remind").assert().success();
    td(&dir)
        .arg("remind")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reminder already shown today."));
    td(&dir)
        .args(["remind", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reminder already shown today.").not());
}

#[test]
fn logout_signs_out() {
    let dir = signed_in();
    td(&dir).arg("logout").assert().success().stdout(predicate::str::contains("Signed out."));
    td(&dir).arg("whoami").assert().code(3);

    td(&dir)
        .args(["login", "--email", "ada@example.com", "--password", "secret1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome back, Ada Lovelace!"));
}

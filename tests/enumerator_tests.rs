//! Task enumeration against a stubbed engine.

mod common;

use playtest::config::EngineConfig;
use playtest::context::PlaybookContext;
use playtest::error::Error;
use playtest::tasks::list_test_tasks;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

use common::write_stub;

async fn context_with_playbook_bin(
    temp: &TempDir,
    playbook_bin: std::path::PathBuf,
) -> PlaybookContext {
    let playbook = temp.path().join("test_playbook.yml");
    std::fs::write(&playbook, "- hosts: 127.0.0.1\n  tasks: []\n").unwrap();
    let inventory = temp.path().join("inventory");
    std::fs::write(&inventory, "127.0.0.1 ansible_connection=local\n").unwrap();

    PlaybookContext::prepare(&playbook, &inventory, None, EngineConfig::new(playbook_bin, "sh"))
        .await
        .unwrap()
}

#[tokio::test]
async fn lists_only_test_tagged_tasks_in_order() {
    let temp = TempDir::new().unwrap();
    let stub = write_stub(
        temp.path(),
        "stub-playbook",
        r#"printf 'playbook: test_playbook.yml\n\n'
printf '  play #1 (127.0.0.1): 127.0.0.1\tTAGS: []\n'
printf '    tasks:\n'
printf '      touch marker\tTAGS: [setup]\n'
printf '      assert marker\tTAGS: [test]\n'
printf '      assert cleanup\tTAGS: [cleanup, test]\n'"#,
    );
    let ctx = context_with_playbook_bin(&temp, stub).await;

    let tasks = list_test_tasks(&ctx).await.unwrap();
    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["assert marker", "assert cleanup"]);
}

#[tokio::test]
async fn enumeration_is_idempotent() {
    let temp = TempDir::new().unwrap();
    let stub = write_stub(
        temp.path(),
        "stub-playbook",
        r#"printf '      assert marker\tTAGS: [test]\n'"#,
    );
    let ctx = context_with_playbook_bin(&temp, stub).await;

    let first = list_test_tasks(&ctx).await.unwrap();
    let second = list_test_tasks(&ctx).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn duplicate_test_task_names_fail_before_execution() {
    let temp = TempDir::new().unwrap();
    let stub = write_stub(
        temp.path(),
        "stub-playbook",
        r#"printf '      assert marker\tTAGS: [test]\n'
printf '      assert marker\tTAGS: [test]\n'"#,
    );
    let ctx = context_with_playbook_bin(&temp, stub).await;

    let err = list_test_tasks(&ctx).await.unwrap_err();
    match err {
        Error::DuplicateTaskName { playbook, name } => {
            assert!(playbook.ends_with("test_playbook.yml"));
            assert_eq!(name, "assert marker");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn nonzero_listing_exit_surfaces_stderr_verbatim() {
    let temp = TempDir::new().unwrap();
    let stub = write_stub(
        temp.path(),
        "stub-playbook",
        "echo 'ERROR! the playbook could not be found' >&2; exit 1",
    );
    let ctx = context_with_playbook_bin(&temp, stub).await;

    let err = list_test_tasks(&ctx).await.unwrap_err();
    match err {
        Error::Enumeration { stderr, .. } => {
            assert!(stderr.contains("ERROR! the playbook could not be found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn listing_receives_roles_path_environment() {
    let temp = TempDir::new().unwrap();
    // The stub reflects ANSIBLE_ROLES_PATH back as a task name, proving the
    // context environment reaches the engine invocation.
    let stub = write_stub(
        temp.path(),
        "stub-playbook",
        r#"printf '      %s\tTAGS: [test]\n' "$ANSIBLE_ROLES_PATH""#,
    );
    let ctx = context_with_playbook_bin(&temp, stub).await;

    let tasks = list_test_tasks(&ctx).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(
        tasks[0].name,
        ctx.installed_roles_path().display().to_string()
    );
}

//! Integration tests for the task registry store

use std::fs;
use tempfile::TempDir;

use forkterm::domain::{ForkType, TaskStatus};
use forkterm::registry::{NewTask, TaskStore, TaskUpdate};

fn store_in(dir: &TempDir) -> TaskStore {
    TaskStore::new(dir.path().join("data").join("forked-tasks.json"))
}

fn new_task(task: &str) -> NewTask {
    NewTask {
        task: task.to_string(),
        fork_type: ForkType::Claude,
        model: Some("sonnet".to_string()),
        cwd: "/tmp/project".to_string(),
        ..Default::default()
    }
}

#[test]
fn test_registry_survives_across_store_instances() {
    let dir = TempDir::new().unwrap();

    let record = store_in(&dir).add(new_task("persisted task")).unwrap();

    // A fresh store over the same path sees the same document
    let reopened = store_in(&dir);
    let fetched = reopened.get(&record.id).unwrap();
    assert_eq!(fetched.task, "persisted task");
    assert_eq!(fetched.model.as_deref(), Some("sonnet"));
}

#[test]
fn test_on_disk_document_shape() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.add(new_task("shape check")).unwrap();

    let content = fs::read_to_string(store.path()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();

    assert!(value["tasks"].is_array());
    assert_eq!(value["metadata"]["version"], "1.0");
    assert!(value["metadata"]["created"].is_string());
    assert!(value["metadata"]["updated"].is_string());

    let task = &value["tasks"][0];
    assert_eq!(task["type"], "claude");
    assert_eq!(task["status"], "running");
    assert!(task["completed_at"].is_null());
    assert!(task["started_at"].is_string());
}

#[test]
fn test_no_temp_file_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.add(new_task("atomic write")).unwrap();

    let data_dir = store.path().parent().unwrap();
    let names: Vec<String> = fs::read_dir(data_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();

    assert!(names.contains(&"forked-tasks.json".to_string()));
    assert!(!names.iter().any(|n| n.ends_with(".tmp")));
}

#[test]
fn test_full_lifecycle_running_to_completed() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let record = store.add(new_task("lifecycle")).unwrap();
    assert_eq!(record.status, TaskStatus::Running);
    assert!(record.completed_at.is_none());

    let updated = store
        .update(
            &record.id,
            TaskUpdate {
                status: Some(TaskStatus::Completed),
                exit_code: Some(0),
                notes: Some("all green".to_string()),
            },
        )
        .unwrap();

    assert_eq!(updated.status, TaskStatus::Completed);
    assert!(updated.completed_at.is_some());
    assert_eq!(updated.exit_code, Some(0));
    assert_eq!(updated.notes.as_deref(), Some("all green"));
    assert_eq!(updated.started_at, record.started_at);
}

#[test]
fn test_remove_unknown_id_fails_without_touching_others() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.add(new_task("keeper")).unwrap();

    assert!(store.remove("missing0").is_err());
    assert_eq!(store.count(), 1);
}

#[test]
fn test_clear_partition_property() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    for i in 0..4 {
        let record = store.add(new_task(&format!("task {}", i))).unwrap();
        if i % 2 == 0 {
            store
                .update(
                    &record.id,
                    TaskUpdate {
                        status: Some(TaskStatus::Completed),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
    }

    let original = store.count();
    let outcome = store.clear(Some(Some(TaskStatus::Completed))).unwrap();
    assert_eq!(outcome.removed_count, 2);
    assert_eq!(outcome.removed_count + outcome.remaining_count, original);
    let (tasks, _) = store.list(None, 50);
    assert!(tasks.iter().all(|t| t.status != TaskStatus::Completed));
}

#[test]
fn test_missing_file_is_empty_registry() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    assert_eq!(store.count(), 0);
    let (tasks, total) = store.list(None, 50);
    assert!(tasks.is_empty());
    assert_eq!(total, 0);
    assert!(store.get("anything").is_err());
}

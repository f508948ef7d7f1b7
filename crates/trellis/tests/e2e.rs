//! End-to-end flows through a real session manager and table engine.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use trellis_engine::TableEngine;
use trellis_runtime::{SessionManager, SessionOptions};

fn manager_with_table(dir: &Path, table: &str) -> Arc<SessionManager> {
    std::fs::write(dir.join("phrase_table.txt"), table).unwrap();
    let engine = TableEngine::load(dir, dir).unwrap();
    Arc::new(SessionManager::new(
        Arc::new(engine),
        SessionOptions {
            decode_timeout: Duration::from_secs(5),
            ..SessionOptions::default()
        },
    ))
}

#[tokio::test]
async fn basic_decode_returns_hypothesis() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager_with_table(dir.path(), "hello ||| bonjour\nworld ||| monde\n");

    let out = mgr.handle_line("hello world", None).await.unwrap();
    assert_eq!(out, Some("bonjour monde".to_owned()));
}

#[tokio::test]
async fn reference_feedback_adapts_one_context_only() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager_with_table(dir.path(), "");

    // Commands produce no output line
    let fed = mgr
        .handle_line("add-reference ||| hello ||| bonjour", Some("2"))
        .await
        .unwrap();
    assert_eq!(fed, None);

    let adapted = mgr.handle_line("hello", Some("2")).await.unwrap().unwrap();
    let untouched = mgr.handle_line("hello", Some("3")).await.unwrap().unwrap();
    assert_eq!(adapted, "bonjour");
    assert_eq!(untouched, "hello");
    assert_ne!(adapted, untouched);
}

#[tokio::test]
async fn fresh_contexts_translate_identically() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager_with_table(dir.path(), "hello ||| bonjour ||| 0.9\nhello ||| salut ||| 0.1\n");

    let handles: Vec<_> = ["a", "b", "c", "d"]
        .into_iter()
        .map(|name| {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move { mgr.handle_line("hello friend", Some(name)).await })
        })
        .collect();

    let mut outputs = Vec::new();
    for handle in handles {
        outputs.push(handle.await.unwrap().unwrap().unwrap());
    }
    assert!(outputs.iter().all(|o| o == &outputs[0]));
    assert_eq!(outputs[0], "bonjour friend");
}

#[tokio::test]
async fn concurrent_decodes_each_produce_one_line() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager_with_table(dir.path(), "");
    let n = 32;

    let handles: Vec<_> = (0..n)
        .map(|i| {
            let mgr = Arc::clone(&mgr);
            tokio::spawn(async move { mgr.handle_line(&format!("sentence {i}"), None).await })
        })
        .collect();

    let mut outputs = Vec::new();
    for handle in handles {
        outputs.push(handle.await.unwrap().unwrap().unwrap());
    }
    assert_eq!(outputs.len(), n);
    assert!(outputs.iter().all(|o| !o.is_empty() && !o.contains('\n')));
}

#[tokio::test]
async fn save_and_load_across_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let state_path = dir.path().join("state.json");

    {
        let mgr = manager_with_table(dir.path(), "");
        let _ = mgr
            .handle_line("learn ||| hello ||| bonjour", Some("doc"))
            .await
            .unwrap();
        let _ = mgr
            .handle_line(
                &format!("save ||| {}", state_path.display()),
                Some("doc"),
            )
            .await
            .unwrap();
    }

    let mgr = manager_with_table(dir.path(), "");
    let _ = mgr
        .handle_line(&format!("load ||| {}", state_path.display()), Some("doc"))
        .await
        .unwrap();
    let out = mgr.handle_line("hello", Some("doc")).await.unwrap();
    assert_eq!(out, Some("bonjour".to_owned()));
}

#[tokio::test]
async fn reset_discards_adaptation() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager_with_table(dir.path(), "");

    let _ = mgr
        .handle_line("learn ||| hello ||| bonjour", None)
        .await
        .unwrap();
    assert_eq!(
        mgr.handle_line("hello", None).await.unwrap(),
        Some("bonjour".to_owned())
    );

    let _ = mgr.handle_line("reset |||", None).await.unwrap();
    assert_eq!(
        mgr.handle_line("hello", None).await.unwrap(),
        Some("hello".to_owned())
    );
}

#[tokio::test]
async fn malformed_lines_never_end_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let mgr = manager_with_table(dir.path(), "");

    assert!(mgr.handle_line("frobnicate ||| x", None).await.is_err());
    assert!(mgr.handle_line("learn ||| only-source", None).await.is_err());
    assert!(mgr.handle_line("weights ||| lm=abc", None).await.is_err());

    let out = mgr.handle_line("still here", None).await.unwrap();
    assert_eq!(out, Some("still here".to_owned()));
}

// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::sync::Arc;

use recall_agent::SessionPool;
use recall_test_utils::TestHarness;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn sessions_are_isolated_and_reused() {
    let harness = TestHarness::builder().build().await.unwrap();
    let pool = SessionPool::new(harness.deps.clone(), "Today is {date}.");

    let a = pool.session("alice").await;
    let a_again = pool.session("alice").await;
    let b = pool.session("bob").await;
    assert!(Arc::ptr_eq(&a, &a_again));
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(pool.len().await, 2);

    let cancel = CancellationToken::new();
    a.lock()
        .await
        .handle_turn("hello", &cancel, &mut |_: &str| {})
        .await
        .unwrap();

    assert_eq!(a.lock().await.history().len(), 3);
    assert_eq!(b.lock().await.history().len(), 1);
}

#[tokio::test]
async fn system_prompt_is_rendered_with_a_date() {
    let harness = TestHarness::builder().build().await.unwrap();
    let pool = SessionPool::new(harness.deps.clone(), "Today is {date}.");

    let session = pool.session("s").await;
    let prompt = session.lock().await.session().system_prompt().to_string();

    assert!(!prompt.contains("{date}"));
    assert!(prompt.starts_with("Today is 2"));
}

#[tokio::test]
async fn removed_session_starts_fresh() {
    let harness = TestHarness::builder().build().await.unwrap();
    let pool = SessionPool::new(harness.deps.clone(), "prompt");

    let first = pool.session("s").await;
    assert!(pool.remove("s").await);
    assert!(!pool.remove("s").await);
    assert!(pool.is_empty().await);

    let second = pool.session("s").await;
    assert!(!Arc::ptr_eq(&first, &second));
}

use taskwright::store::{RedisWorkflowStore, WorkflowStore};
use taskwright::workflow::builder::WorkflowBuilder;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379/6".to_string())
}

#[tokio::test]
#[ignore] // Ignored by default, run explicitly if redis is available
async fn test_redis_store_round_trip() {
    // 1. Setup Redis & Clean DB
    let client = redis::Client::open(redis_url()).expect("Invalid Redis URL");
    let mut conn = client
        .get_multiplexed_async_connection()
        .await
        .expect("Failed to connect to Redis");
    let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await.expect("Failed to flush db");

    let store = RedisWorkflowStore::new(client, "taskwright:test".to_string());

    // 2. Save two records
    let first = WorkflowBuilder::new("First")
        .node("Hook", "n8n-nodes-base.webhook").build()
        .build();
    let second = WorkflowBuilder::new("Second").build();
    let saved_first = store.save(&first, "first prompt").await.expect("save failed");
    let saved_second = store.save(&second, "second prompt").await.expect("save failed");

    // 3. Read back
    let fetched = store.get(saved_first.id).await.expect("get failed");
    assert_eq!(fetched, Some(saved_first.clone()));

    let listed = store.list(10).await.expect("list failed");
    assert_eq!(listed, vec![saved_second.clone(), saved_first.clone()]);

    // 4. Stray index entries are skipped
    let _: () = redis::cmd("LPUSH")
        .arg("taskwright:test:workflows")
        .arg("not-a-uuid")
        .arg(uuid::Uuid::new_v4().to_string())
        .query_async(&mut conn)
        .await
        .expect("Failed to push stray entries");
    let listed = store.list(10).await.expect("list failed");
    assert_eq!(listed, vec![saved_second, saved_first]);
}

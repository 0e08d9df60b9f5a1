use crate::db::{Database, DedupStore};
use crate::types::{DedupKey, Scope};
use serde_json::json;
use tempfile::TempDir;

async fn open_temp_db() -> (TempDir, Database) {
    let dir = TempDir::new().unwrap();
    let db = Database::new(&dir.path().join("dedup.db")).await.unwrap();
    (dir, db)
}

fn key<'a>(scope: Scope, owner: &'a str, item: &'a str) -> DedupKey<'a> {
    DedupKey {
        scope,
        owner_id: owner,
        item_id: item,
    }
}

#[tokio::test]
async fn mark_done_makes_is_done_true() {
    let (_dir, db) = open_temp_db().await;
    let k = key(Scope::Post, "MS4wLjABAAAAtest", "7123456789012345678");

    assert!(!db.is_done(&k).await.unwrap());
    db.mark_done(&k, &json!({"aweme_id": "7123456789012345678"}))
        .await
        .unwrap();
    assert!(db.is_done(&k).await.unwrap());

    db.close().await;
}

#[tokio::test]
async fn marking_twice_is_idempotent() {
    let (_dir, db) = open_temp_db().await;
    let k = key(Scope::Like, "MS4wLjABAAAAtest", "42");

    db.mark_done(&k, &json!({})).await.unwrap();
    db.mark_done(&k, &json!({})).await.unwrap();

    assert!(db.is_done(&k).await.unwrap());
    assert_eq!(db.count_scope(Scope::Like, "MS4wLjABAAAAtest").await.unwrap(), 1);

    db.close().await;
}

#[tokio::test]
async fn scopes_are_independent_namespaces() {
    let (_dir, db) = open_temp_db().await;

    db.mark_done(&key(Scope::Post, "owner", "1"), &json!({}))
        .await
        .unwrap();

    // same owner and item under a different scope is a different key
    assert!(!db.is_done(&key(Scope::Like, "owner", "1")).await.unwrap());
    // same scope and item under a different owner is a different key
    assert!(!db.is_done(&key(Scope::Post, "other", "1")).await.unwrap());

    db.close().await;
}

#[tokio::test]
async fn records_survive_reopening() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dedup.db");
    let k = key(Scope::Music, "7200000000000000000", "7");

    {
        let db = Database::new(&path).await.unwrap();
        db.mark_done(&k, &json!({"aweme_id": "7"})).await.unwrap();
        db.close().await;
    }

    let db = Database::new(&path).await.unwrap();
    assert!(db.is_done(&k).await.unwrap());
    db.close().await;
}

#[tokio::test]
async fn clear_scope_forgets_only_that_owner() {
    let (_dir, db) = open_temp_db().await;

    for item in ["1", "2", "3"] {
        db.mark_done(&key(Scope::Mix, "mix-a", item), &json!({}))
            .await
            .unwrap();
    }
    db.mark_done(&key(Scope::Mix, "mix-b", "1"), &json!({}))
        .await
        .unwrap();

    let removed = db.clear_scope(Scope::Mix, "mix-a").await.unwrap();
    assert_eq!(removed, 3);
    assert!(!db.is_done(&key(Scope::Mix, "mix-a", "1")).await.unwrap());
    assert!(db.is_done(&key(Scope::Mix, "mix-b", "1")).await.unwrap());
    assert_eq!(db.count_scope(Scope::Mix, "mix-a").await.unwrap(), 0);

    db.close().await;
}

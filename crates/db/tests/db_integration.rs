//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `community_test`)
//!   `TEST_DB_PASSWORD` (default: `community_test`)
//!   `TEST_DB_NAME` (default: `community_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use community_common::AppError;
use community_db::repositories::{
    CommunityMessageRepository, CreateMessageInput, ListMessagesQuery, ReportMessageInput,
};
use community_db::entities::User;
use community_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::{EntityTrait, PaginatorTrait, SqlxPostgresConnector};

async fn setup() -> (TestDatabase, CommunityMessageRepository) {
    let db = TestDatabase::create_unique()
        .await
        .expect("Failed to create test database");
    // `DatabaseConnection` is not `Clone` with sea-orm's `mock` feature, so
    // share the underlying pool instead.
    let pool = db.connection().get_postgres_connection_pool().clone();
    let conn = SqlxPostgresConnector::from_sqlx_postgres_pool(pool);
    let repo = CommunityMessageRepository::new(Arc::new(conn));
    (db, repo)
}

fn root(content: &str, author_id: i32) -> CreateMessageInput {
    CreateMessageInput {
        content: content.to_string(),
        author_id,
        parent_id: None,
    }
}

fn reply(content: &str, author_id: i32, parent_id: i32) -> CreateMessageInput {
    CreateMessageInput {
        content: content.to_string(),
        author_id,
        parent_id: Some(parent_id),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_first_page_is_newest_roots_first() {
    let (db, repo) = setup().await;
    let alice = db.insert_user("alice").await.unwrap();

    let mut created = Vec::new();
    for i in 0..5 {
        let message = repo
            .create_message(root(&format!("root {i}"), alice.id))
            .await
            .unwrap();
        created.push(message.id);
    }
    repo.create_message(reply("not a root", alice.id, created[0]))
        .await
        .unwrap();

    let page = repo
        .list_messages(ListMessagesQuery::roots(1, 3))
        .await
        .unwrap();

    let ids: Vec<i32> = page.messages.iter().map(|m| m.message.id).collect();
    assert_eq!(ids, vec![created[4], created[3], created[2]]);
    assert_eq!(page.total_count, 5);
    assert_eq!(page.messages[0].author.username.as_deref(), Some("alice"));

    let second = repo
        .list_messages(ListMessagesQuery::roots(2, 3))
        .await
        .unwrap();
    let ids: Vec<i32> = second.messages.iter().map(|m| m.message.id).collect();
    assert_eq!(ids, vec![created[1], created[0]]);
    assert_eq!(second.messages[1].reply_count, 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_reply_listing_skips_deleted_and_counts_exactly() {
    let (db, repo) = setup().await;
    let alice = db.insert_user("alice").await.unwrap();
    let parent = repo.create_message(root("parent", alice.id)).await.unwrap();

    let kept = repo
        .create_message(reply("kept", alice.id, parent.id))
        .await
        .unwrap();
    let gone = repo
        .create_message(reply("gone", alice.id, parent.id))
        .await
        .unwrap();
    repo.delete_message(gone.id).await.unwrap();

    let page = repo
        .list_messages(ListMessagesQuery::replies(parent.id, 1, 20))
        .await
        .unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(page.messages.len(), 1);
    assert_eq!(page.messages[0].message.id, kept.id);
    assert!(page.messages.iter().all(|m| !m.message.is_deleted));

    let roots = repo
        .list_messages(ListMessagesQuery::roots(1, 20))
        .await
        .unwrap();
    assert_eq!(roots.messages[0].reply_count, 1);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_created_message_reads_back() {
    let (db, repo) = setup().await;
    let alice = db.insert_user("alice").await.unwrap();

    let created = repo.create_message(root("hi", alice.id)).await.unwrap();
    let thread = repo
        .get_message_with_replies(created.id)
        .await
        .unwrap()
        .expect("message should exist");

    assert_eq!(thread.message.content, "hi");
    assert_eq!(thread.message.author_id, alice.id);
    assert_eq!(thread.message.parent_id, None);
    assert!(!thread.message.is_deleted);
    assert!(thread.replies.is_empty());
    assert_eq!(thread.author, alice);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_deleted_message_disappears_from_reads() {
    let (db, repo) = setup().await;
    let alice = db.insert_user("alice").await.unwrap();

    let parent = repo.create_message(root("parent", alice.id)).await.unwrap();
    let child = repo
        .create_message(reply("child", alice.id, parent.id))
        .await
        .unwrap();

    let deleted = repo.delete_message(parent.id).await.unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.updated_at >= parent.updated_at);

    // Deleting again is not an error
    assert!(repo.delete_message(parent.id).await.unwrap().is_deleted);

    assert!(repo.get_message_with_replies(parent.id).await.unwrap().is_none());
    let roots = repo
        .list_messages(ListMessagesQuery::roots(1, 20))
        .await
        .unwrap();
    assert!(roots.messages.iter().all(|m| m.message.id != parent.id));
    assert_eq!(roots.total_count, 0);

    // A live reply under a deleted parent is still readable on its own
    let orphan = repo
        .get_message_with_replies(child.id)
        .await
        .unwrap()
        .expect("reply should still be visible");
    assert_eq!(orphan.message.parent_id, Some(parent.id));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_delete_unknown_message_is_not_found() {
    let (db, repo) = setup().await;

    let result = repo.delete_message(123_456).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_report_reason_fallback() {
    let (db, repo) = setup().await;
    let alice = db.insert_user("alice").await.unwrap();
    let bob = db.insert_user("bob").await.unwrap();
    let message = repo.create_message(root("rude", alice.id)).await.unwrap();

    let silent = repo
        .report_message(ReportMessageInput {
            message_id: message.id,
            reporter_id: bob.id,
            reason: None,
        })
        .await
        .unwrap();
    assert_eq!(silent.reason, "No reason provided");

    let spam = repo
        .report_message(ReportMessageInput {
            message_id: message.id,
            reporter_id: bob.id,
            reason: Some("spam".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(spam.reason, "spam");

    // Reports are not deduplicated and deleted targets are still reportable
    repo.delete_message(message.id).await.unwrap();
    repo.report_message(ReportMessageInput {
        message_id: message.id,
        reporter_id: bob.id,
        reason: Some("spam".to_string()),
    })
    .await
    .unwrap();

    assert_eq!(repo.count_reports(message.id).await.unwrap(), 3);
    let reports = repo.list_reports(message.id, 10, 0).await.unwrap();
    assert_eq!(reports.len(), 3);
    assert_eq!(reports[2].id, silent.id);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_replies_are_oldest_first() {
    let (db, repo) = setup().await;
    let alice = db.insert_user("alice").await.unwrap();
    let bob = db.insert_user("bob").await.unwrap();

    let parent = repo.create_message(root("parent", alice.id)).await.unwrap();
    let first = repo
        .create_message(reply("first", bob.id, parent.id))
        .await
        .unwrap();
    let second = repo
        .create_message(reply("second", alice.id, parent.id))
        .await
        .unwrap();
    repo.create_message(reply("nested", bob.id, first.id))
        .await
        .unwrap();

    let thread = repo
        .get_message_with_replies(parent.id)
        .await
        .unwrap()
        .unwrap();

    let ids: Vec<i32> = thread.replies.iter().map(|r| r.message.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert_eq!(thread.replies[0].author, bob);

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_missing_references_are_rejected() {
    let (db, repo) = setup().await;
    let alice = db.insert_user("alice").await.unwrap();

    let no_author = repo.create_message(root("ghost", 9_999)).await;
    assert!(matches!(no_author, Err(AppError::ReferenceViolation(_))));

    let no_parent = repo.create_message(reply("lost", alice.id, 9_999)).await;
    assert!(matches!(no_parent, Err(AppError::ReferenceViolation(_))));

    let no_message = repo
        .report_message(ReportMessageInput {
            message_id: 9_999,
            reporter_id: alice.id,
            reason: None,
        })
        .await;
    assert!(matches!(no_message, Err(AppError::ReferenceViolation(_))));

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_full_rollback_keeps_existing_users() {
    let (db, _repo) = setup().await;
    db.insert_user("alice").await.unwrap();

    for _ in 0..3 {
        community_db::rollback(db.connection()).await.unwrap();
    }
    assert_eq!(
        community_db::pending_migrations(db.connection())
            .await
            .unwrap()
            .len(),
        3
    );

    let users = User::find().count(db.connection()).await.unwrap();
    assert_eq!(users, 1);

    // Re-applying tolerates the surviving table
    community_db::migrate(db.connection()).await.unwrap();

    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_huge_page_is_rejected() {
    let (db, repo) = setup().await;

    let result = repo
        .list_messages(ListMessagesQuery::roots((1 << 62) + 2, 2))
        .await;
    assert!(matches!(result, Err(AppError::InvalidArgument(_))));

    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;
use userbook_core::model::{User, UserFields};
use userbook_engine::{Subscription, UserRepository};
use userbook_store::UserStore;

fn repository() -> UserRepository {
    let store = Arc::new(UserStore::open_in_memory().unwrap());
    UserRepository::new(store).unwrap()
}

async fn next<T>(subscription: &mut Subscription<T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), subscription.recv())
        .await
        .expect("timed out waiting for a snapshot")
        .expect("subscription closed")
}

fn first_names(users: &[User]) -> Vec<String> {
    users
        .iter()
        .map(|u| u.fields.first_name.clone().unwrap_or_default())
        .collect()
}

#[tokio::test]
async fn test_observe_all_starts_with_current_state() {
    let repo = repository();
    repo.insert(UserFields::new("John", "Doe", 30)).await.unwrap();

    let mut all = repo.observe_all();
    let initial = next(&mut all).await;

    assert_eq!(first_names(&initial), vec!["John"]);
}

#[tokio::test]
async fn test_observe_all_emits_after_each_mutation() {
    let repo = repository();
    let mut all = repo.observe_all();
    assert!(next(&mut all).await.is_empty());

    let bob = repo.insert(UserFields::new("Bob", "B", 40)).await.unwrap();
    assert_eq!(first_names(&next(&mut all).await), vec!["Bob"]);

    repo.insert(UserFields::new("Alice", "A", 25)).await.unwrap();
    assert_eq!(first_names(&next(&mut all).await), vec!["Alice", "Bob"]);

    let mut updated = repo.get_by_id(bob).await.unwrap().unwrap();
    updated.fields.age = 41;
    assert!(repo.update(updated).await.unwrap());
    let snapshot = next(&mut all).await;
    assert_eq!(snapshot[1].fields.age, 41);

    assert!(repo.delete(bob).await.unwrap());
    assert_eq!(first_names(&next(&mut all).await), vec!["Alice"]);
}

#[tokio::test]
async fn test_no_snapshot_for_ineffective_mutations() {
    let repo = repository();
    let id = repo.insert(UserFields::new("John", "Doe", 30)).await.unwrap();

    let mut all = repo.observe_all();
    next(&mut all).await;

    let ghost = User::new(999, UserFields::new("Ghost", "", 1));
    assert!(!repo.update(ghost).await.unwrap());
    assert!(!repo.delete(999).await.unwrap());
    let duplicate = User::new(id, UserFields::new("Other", "", 2));
    assert_eq!(repo.insert_with_id(duplicate).await.unwrap(), None);

    // Publication happens before the reply, so anything sent is already buffered
    assert!(all.try_recv().is_none());
}

#[tokio::test]
async fn test_observe_adults_tracks_age_threshold() {
    let repo = repository();
    let mut adults = repo.observe_adults();
    assert!(next(&mut adults).await.is_empty());

    let minor = repo.insert(UserFields::new("Kid", "K", 17)).await.unwrap();
    assert!(next(&mut adults).await.is_empty());

    repo.insert(UserFields::new("Grown", "G", 18)).await.unwrap();
    assert_eq!(first_names(&next(&mut adults).await), vec!["Grown"]);

    let mut birthday = repo.get_by_id(minor).await.unwrap().unwrap();
    birthday.fields.age = 18;
    repo.update(birthday).await.unwrap();
    assert_eq!(first_names(&next(&mut adults).await), vec!["Grown", "Kid"]);
}

#[tokio::test]
async fn test_observe_by_id_follows_record_lifecycle() {
    let repo = repository();
    let mut watched = repo.observe_by_id(5);
    assert_eq!(next(&mut watched).await, None);

    let user = User::new(5, UserFields::new("Eve", "E", 22));
    assert_eq!(repo.insert_with_id(user.clone()).await.unwrap(), Some(5));
    assert_eq!(next(&mut watched).await, Some(user.clone()));

    let mut older = user.clone();
    older.fields.age = 23;
    repo.update(older.clone()).await.unwrap();
    assert_eq!(next(&mut watched).await, Some(older));

    repo.delete(5).await.unwrap();
    assert_eq!(next(&mut watched).await, None);

    // Still open after the delete
    repo.insert_with_id(user.clone()).await.unwrap();
    assert_eq!(next(&mut watched).await, Some(user));
}

#[tokio::test]
async fn test_observe_by_id_ignores_other_records() {
    let repo = repository();
    let first = repo.insert(UserFields::new("Ann", "A", 30)).await.unwrap();

    let mut watched = repo.observe_by_id(first);
    assert!(next(&mut watched).await.is_some());

    repo.insert(UserFields::new("Ben", "B", 31)).await.unwrap();
    assert!(watched.try_recv().is_none());
}

#[tokio::test]
async fn test_cancel_removes_subscription() {
    let repo = repository();
    let mut all = repo.observe_all();
    let mut one = repo.observe_by_id(1);
    next(&mut all).await;
    next(&mut one).await;
    assert_eq!(repo.subscriber_count(), 2);

    all.cancel();
    drop(one);
    assert_eq!(repo.subscriber_count(), 0);

    repo.insert(UserFields::new("John", "Doe", 30)).await.unwrap();
    assert_eq!(repo.subscriber_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_immediately_after_initial_snapshot_never_leaks() {
    let repo = repository();
    repo.insert(UserFields::new("John", "Doe", 30)).await.unwrap();

    for _ in 0..200 {
        let mut all = repo.observe_all();
        next(&mut all).await;
        drop(all);

        let mut one = repo.observe_by_id(1);
        next(&mut one).await;
        one.cancel();

        // Queued behind both attach jobs
        repo.get_all().await.unwrap();
        assert_eq!(repo.subscriber_count(), 0);
    }
}

#[tokio::test]
async fn test_subscription_dropped_before_attach_never_registers() {
    let repo = repository();
    drop(repo.observe_all());

    // Any later job runs after the attach job
    repo.get_all().await.unwrap();
    assert_eq!(repo.subscriber_count(), 0);
}

#[tokio::test]
async fn test_submissions_apply_in_order() {
    let repo = repository();
    let id = repo.insert(UserFields::new("Counter", "C", 0)).await.unwrap();

    let pendings: Vec<_> = (1..=50)
        .map(|age| repo.submit_update(User::new(id, UserFields::new("Counter", "C", age))))
        .collect();
    let last = repo.get_by_id(id).await.unwrap().unwrap();
    for pending in pendings {
        assert!(pending.await.unwrap());
    }

    assert_eq!(last.fields.age, 50);
}

#[tokio::test]
async fn test_dropped_pending_still_commits() {
    let repo = repository();
    drop(repo.submit_insert(UserFields::new("Fire", "Forget", 30)));

    let all = repo.get_all().await.unwrap();
    assert_eq!(first_names(&all), vec!["Fire"]);
}

#[tokio::test]
async fn test_clones_share_queue_and_subscribers() {
    let repo = repository();
    let other = repo.clone();
    let mut all = repo.observe_all();
    next(&mut all).await;

    other.insert(UserFields::new("Shared", "S", 20)).await.unwrap();

    assert_eq!(first_names(&next(&mut all).await), vec!["Shared"]);
    assert_eq!(other.subscriber_count(), 1);
}

#[tokio::test]
async fn test_subscription_ends_when_repository_dropped() {
    let repo = repository();
    let mut all = repo.observe_all();
    next(&mut all).await;

    drop(repo);

    let end = tokio::time::timeout(Duration::from_secs(5), all.recv())
        .await
        .expect("timed out waiting for close");
    assert!(end.is_none());
}

#[tokio::test]
async fn test_repository_over_file_store_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.db");

    {
        let repo = UserRepository::new(Arc::new(UserStore::open(&path).unwrap())).unwrap();
        repo.insert(UserFields::new("John", "Doe", 30).with_email("john@example.com"))
            .await
            .unwrap();
    }

    let repo = UserRepository::new(Arc::new(UserStore::open(&path).unwrap())).unwrap();
    let users = repo.get_all().await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].fields.email.as_deref(), Some("john@example.com"));
}

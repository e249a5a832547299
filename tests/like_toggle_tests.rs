//! Like toggling: optimistic display, rollback and in-flight guarding.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use feedline::engagement::Engagement;
use feedline::error::FeedError;
use feedline::like_toggle::{IgnoreReason, LikeController, LikeState, ToggleOutcome};
use feedline::lookup::LookupPolicy;
use feedline::notice::Notice;

use common::{add_like, add_post, like_count, memory_store, FlakyStore};

async fn flaky_with_post() -> Arc<FlakyStore> {
    let store = FlakyStore::new(memory_store());
    add_post(store.inner(), "p1", "alice", 10).await;
    Arc::new(store)
}

fn settled(outcome: ToggleOutcome) -> feedline::like_toggle::LikeSnapshot {
    match outcome {
        ToggleOutcome::Settled(snapshot) => snapshot,
        other => panic!("expected settled toggle, got {other:?}"),
    }
}

#[tokio::test]
async fn like_then_unlike_restores_original_state() {
    let store = flaky_with_post().await;
    add_like(store.inner(), "p1", "carol").await;
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    let liked = settled(likes.toggle_like("p1", Some("bob")).await.unwrap());
    assert_eq!(liked.state, LikeState::Liked);
    assert!(liked.liked);
    assert_eq!(liked.like_count, 2);
    assert_eq!(like_count(store.inner(), "p1").await, 2);

    let unliked = settled(likes.toggle_like("p1", Some("bob")).await.unwrap());
    assert_eq!(unliked.state, LikeState::Unliked);
    assert!(!unliked.liked);
    assert_eq!(unliked.like_count, 1);
    assert_eq!(like_count(store.inner(), "p1").await, 1);
}

#[tokio::test]
async fn repeated_toggles_never_create_a_second_like() {
    let store = flaky_with_post().await;
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    for round in 0..7 {
        let snapshot = settled(likes.toggle_like("p1", Some("bob")).await.unwrap());
        let stored = like_count(store.inner(), "p1").await;
        assert!(stored <= 1);
        assert_eq!(snapshot.like_count, stored);
        assert_eq!(snapshot.liked, round % 2 == 0);
    }
}

#[tokio::test]
async fn toggle_while_pending_is_ignored() {
    let store = flaky_with_post().await;
    store.hold_likes();
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    let first = likes.toggle_like("p1", Some("bob"));
    let second = async {
        while store.insert_like_calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let during = likes.snapshot("p1", "bob").await.unwrap();
        let outcome = likes.toggle_like("p1", Some("bob")).await.unwrap();
        store.release_likes(1);
        (during, outcome)
    };

    let (first, (during, second)) = tokio::join!(first, second);

    assert_eq!(during.state, LikeState::Pending);
    assert!(during.liked);
    assert_eq!(during.like_count, 1);
    assert_eq!(second, ToggleOutcome::Ignored(IgnoreReason::Pending));

    let first = settled(first.unwrap());
    assert_eq!(first.state, LikeState::Liked);
    assert_eq!(first.like_count, 1);
    assert_eq!(store.insert_like_calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.delete_like_calls.load(Ordering::SeqCst), 0);
    assert_eq!(like_count(store.inner(), "p1").await, 1);
}

#[tokio::test]
async fn failed_like_reverts_to_previous_display() {
    let store = flaky_with_post().await;
    add_like(store.inner(), "p1", "carol").await;
    add_like(store.inner(), "p1", "dave").await;
    store.fail_insert_like.store(true, Ordering::SeqCst);
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    let outcome = likes.toggle_like("p1", Some("bob")).await.unwrap();
    let ToggleOutcome::Reverted { snapshot, notice } = outcome else {
        panic!("expected revert, got {outcome:?}");
    };
    assert_eq!(snapshot.state, LikeState::Unliked);
    assert!(!snapshot.liked);
    assert_eq!(snapshot.like_count, 2);
    assert_eq!(notice, Notice::action_failed());
    assert_eq!(like_count(store.inner(), "p1").await, 2);
}

#[tokio::test]
async fn duplicate_like_reverts_cleanly() {
    let store = flaky_with_post().await;
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());
    // Displayed state says "not liked" while the store already has the like.
    likes
        .seed("p1", "bob", &Engagement::default(), likes.epoch())
        .await;
    add_like(store.inner(), "p1", "bob").await;

    let outcome = likes.toggle_like("p1", Some("bob")).await.unwrap();
    let ToggleOutcome::Reverted { snapshot, .. } = outcome else {
        panic!("expected revert, got {outcome:?}");
    };
    assert_eq!(snapshot.state, LikeState::Unliked);
    assert_eq!(snapshot.like_count, 0);
    assert_eq!(like_count(store.inner(), "p1").await, 1);
}

#[tokio::test]
async fn failed_unlike_reverts_to_liked() {
    let store = flaky_with_post().await;
    add_like(store.inner(), "p1", "bob").await;
    store.fail_delete_like.store(true, Ordering::SeqCst);
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    let outcome = likes.toggle_like("p1", Some("bob")).await.unwrap();
    let ToggleOutcome::Reverted { snapshot, .. } = outcome else {
        panic!("expected revert, got {outcome:?}");
    };
    assert_eq!(snapshot.state, LikeState::Liked);
    assert!(snapshot.liked);
    assert_eq!(snapshot.like_count, 1);
    assert_eq!(like_count(store.inner(), "p1").await, 1);
}

#[tokio::test]
async fn anonymous_toggle_does_nothing() {
    let store = flaky_with_post().await;
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    let outcome = likes.toggle_like("p1", None).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Ignored(IgnoreReason::NoViewer));
    assert_eq!(store.insert_like_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.delete_like_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn seeding_skips_pending_toggles() {
    let store = flaky_with_post().await;
    store.hold_likes();
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());
    likes
        .seed("p1", "bob", &Engagement::default(), likes.epoch())
        .await;

    let toggle = likes.toggle_like("p1", Some("bob"));
    let reseed = async {
        while store.insert_like_calls.load(Ordering::SeqCst) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let applied = likes
            .seed(
                "p1",
                "bob",
                &Engagement {
                    like_count: 40,
                    comment_count: 0,
                    liked_by_viewer: false,
                },
                likes.epoch(),
            )
            .await;
        store.release_likes(1);
        applied
    };

    let (outcome, applied) = tokio::join!(toggle, reseed);
    assert!(!applied);
    let snapshot = settled(outcome.unwrap());
    assert_eq!(snapshot.like_count, 1);
    assert!(snapshot.liked);
}

#[tokio::test]
async fn seed_read_before_a_settled_toggle_is_ignored() {
    let store = flaky_with_post().await;
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    let read_epoch = likes.epoch();
    let stale = Engagement::default();
    settled(likes.toggle_like("p1", Some("bob")).await.unwrap());

    assert!(!likes.seed("p1", "bob", &stale, read_epoch).await);
    let snapshot = likes.snapshot("p1", "bob").await.unwrap();
    assert!(snapshot.liked);
    assert_eq!(snapshot.like_count, 1);

    // A read taken after the toggle settled applies.
    let fresh = Engagement {
        like_count: 5,
        comment_count: 0,
        liked_by_viewer: true,
    };
    assert!(likes.seed("p1", "bob", &fresh, likes.epoch()).await);
    assert_eq!(likes.snapshot("p1", "bob").await.unwrap().like_count, 5);
}

#[tokio::test]
async fn unreadable_engagement_fails_first_toggle_without_writing() {
    let store = flaky_with_post().await;
    store
        .failing_counts
        .lock()
        .unwrap()
        .insert("p1".to_string());
    let likes = LikeController::new(Arc::clone(&store), LookupPolicy::default());

    let result = likes.toggle_like("p1", Some("bob")).await;
    assert!(matches!(result, Err(FeedError::StoreUnavailable(_))));
    assert!(likes.snapshot("p1", "bob").await.is_none());
    assert_eq!(store.insert_like_calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.delete_like_calls.load(Ordering::SeqCst), 0);
    assert_eq!(like_count(store.inner(), "p1").await, 0);

    // Once the store recovers the pair is seeded and toggles normally.
    store.failing_counts.lock().unwrap().clear();
    let snapshot = settled(likes.toggle_like("p1", Some("bob")).await.unwrap());
    assert!(snapshot.liked);
    assert_eq!(snapshot.like_count, 1);
}

mod common;

use common::*;
use slotbot::engine::{AuthSession, BookingExecutor};
use slotbot::error::{AuthenticationError, BookingError};
use slotbot::notify::NotificationKind;
use slotbot::types::{AuthHandle, SessionStatus};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn booking_retries_with_doubling_backoff_until_success() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    provider.queue_book(Err(BookingError::Generic("502 from upstream".into())));
    provider.queue_book(Ok(false));
    let notifier = Arc::new(RecordingNotifier::default());
    let chain = chain(provider.clone());
    let class = class("c-1", YOGA, GLOSHAUGEN, "2026-10-21T18:00:00+02:00");

    BookingExecutor::new(5, notifier.clone())
        .book(&chain, USER, &AuthHandle::new("t"), &class)
        .await
        .expect("third attempt books");

    assert_eq!(FakeProvider::calls(&provider.book_calls), 3);
    let times = provider.book_times.lock().unwrap().clone();
    assert_eq!(times[1] - times[0], Duration::from_secs(2));
    assert_eq!(times[2] - times[1], Duration::from_secs(4));
    assert_eq!(notifier.kinds(), vec![NotificationKind::Booked]);
}

#[tokio::test(start_paused = true)]
async fn booking_gives_up_after_max_attempts() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    for _ in 0..3 {
        provider.queue_book(Ok(false));
    }
    let notifier = Arc::new(RecordingNotifier::default());
    let chain = chain(provider.clone());
    let class = class("full", YOGA, GLOSHAUGEN, "2026-10-21T18:00:00+02:00");

    let err = BookingExecutor::new(3, notifier.clone())
        .book(&chain, USER, &AuthHandle::new("t"), &class)
        .await
        .expect_err("class stays full");

    assert!(matches!(err, BookingError::Generic(_)));
    assert_eq!(FakeProvider::calls(&provider.book_calls), 3);
    assert!(notifier.kinds().is_empty());
}

#[tokio::test]
async fn zero_attempts_is_an_invalid_config() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    let chain = chain(provider.clone());
    let class = class("c-1", YOGA, GLOSHAUGEN, "2026-10-21T18:00:00+02:00");

    let err = BookingExecutor::new(0, Arc::new(RecordingNotifier::default()))
        .book(&chain, USER, &AuthHandle::new("t"), &class)
        .await
        .expect_err("no attempts allowed");
    assert!(matches!(err, BookingError::InvalidConfig(_)));
    assert_eq!(FakeProvider::calls(&provider.book_calls), 0);
}

#[tokio::test]
async fn cancelling_an_unbooked_class_never_calls_the_provider() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    let chain = chain(provider.clone());
    let class = class("c-1", YOGA, GLOSHAUGEN, "2026-10-21T18:00:00+02:00");

    let err = BookingExecutor::new(5, Arc::new(RecordingNotifier::default()))
        .cancel(&chain, USER, &AuthHandle::new("t"), &class)
        .await
        .expect_err("nothing to cancel");
    assert_eq!(err, BookingError::CancellingWithoutBooking);
    assert_eq!(FakeProvider::calls(&provider.cancel_calls), 0);
}

#[tokio::test]
async fn cancelling_a_waitlist_entry_notifies() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    let notifier = Arc::new(RecordingNotifier::default());
    let chain = chain(provider.clone());
    let mut class = class("c-1", YOGA, GLOSHAUGEN, "2026-10-21T18:00:00+02:00");
    class.user_status = Some(SessionStatus::Waitlist);

    BookingExecutor::new(5, notifier.clone())
        .cancel(&chain, USER, &AuthHandle::new("t"), &class)
        .await
        .expect("cancelled");
    assert_eq!(FakeProvider::calls(&provider.cancel_calls), 1);
    assert_eq!(notifier.kinds(), vec![NotificationKind::Cancelled]);
}

#[tokio::test]
async fn auth_handle_is_reused_while_valid() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    let store = Arc::new(InMemoryStore::default());
    let chain = chain(provider.clone());
    let session = AuthSession::new(store.clone(), 3);

    let first = session
        .handle(&chain, USER, &credentials())
        .await
        .expect("first login");
    let second = session
        .handle(&chain, USER, &credentials())
        .await
        .expect("cached handle");

    assert_eq!(first.token, second.token);
    assert_eq!(FakeProvider::calls(&provider.auth_calls), 1);
    assert_eq!(FakeProvider::calls(&provider.validate_calls), 1);
}

#[tokio::test]
async fn persisted_handle_survives_a_new_session() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    let store = Arc::new(InMemoryStore::default());
    let chain = chain(provider.clone());

    let first = AuthSession::new(store.clone(), 3)
        .handle(&chain, USER, &credentials())
        .await
        .expect("login");
    let reused = AuthSession::new(store.clone(), 3)
        .handle(&chain, USER, &credentials())
        .await
        .expect("persisted handle");

    assert_eq!(first.token, reused.token);
    assert_eq!(FakeProvider::calls(&provider.auth_calls), 1);
}

#[tokio::test]
async fn rejected_handle_triggers_exactly_one_reauthentication() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    let store = Arc::new(InMemoryStore::default());
    let chain = chain(provider.clone());
    let session = AuthSession::new(store.clone(), 3);

    session
        .handle(&chain, USER, &credentials())
        .await
        .expect("first login");
    provider.set_handle_valid(false);
    let fresh = session
        .handle(&chain, USER, &credentials())
        .await
        .expect("re-authenticated");

    assert_eq!(fresh.token, "token-1");
    assert_eq!(FakeProvider::calls(&provider.auth_calls), 2);
}

#[tokio::test(start_paused = true)]
async fn bad_credentials_are_not_retried() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    provider.queue_auth(Err(AuthenticationError::InvalidCredentials));
    let chain = chain(provider.clone());
    let session = AuthSession::new(Arc::new(InMemoryStore::default()), 5);

    let err = session
        .handle(&chain, USER, &credentials())
        .await
        .expect_err("rejected");
    assert_eq!(err, AuthenticationError::InvalidCredentials);
    assert_eq!(FakeProvider::calls(&provider.auth_calls), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_auth_failures_are_retried() {
    let provider = Arc::new(FakeProvider::new(Vec::new()));
    provider.queue_auth(Err(AuthenticationError::TokenExtractionFailed(
        "empty body".into(),
    )));
    provider.queue_auth(Err(AuthenticationError::Generic("timeout".into())));
    let chain = chain(provider.clone());
    let session = AuthSession::new(Arc::new(InMemoryStore::default()), 3);

    let handle = session
        .handle(&chain, USER, &credentials())
        .await
        .expect("third attempt succeeds");
    assert_eq!(handle.token, "token-2");
    assert_eq!(FakeProvider::calls(&provider.auth_calls), 3);
}

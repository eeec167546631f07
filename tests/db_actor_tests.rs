mod common;

use common::*;
use slotbot::db::Store;
use slotbot::types::{AuthHandle, ChainId, ChainUser, Credentials, Session, SessionStatus};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_sqlite_path(prefix: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_nanos();

    let mut temp_path = std::env::temp_dir();
    temp_path.push(format!(
        "slotbot-{prefix}-{}-{}.sqlite",
        std::process::id(),
        nanos
    ));
    temp_path
}

// The actor registers under a fixed name, so one spawn per test binary.
#[tokio::test]
async fn db_actor_round_trips_users_configs_sessions_and_auth() {
    let db_path = unique_sqlite_path("db");
    let database_url = format!("sqlite:{}", db_path.display());
    let store = slotbot::db::spawn(&database_url).await.expect("spawn db actor");
    let sit = ChainId::new(CHAIN);
    let three_t = ChainId::new("3t");

    // 1. Memberships
    assert!(store.chain_users(None, None).await.unwrap().is_empty());
    for (user_id, chain) in [(USER, &sit), (USER, &three_t), (8, &sit)] {
        store
            .add_chain_user(ChainUser {
                user_id,
                chain: chain.clone(),
                credentials: credentials(),
            })
            .await
            .unwrap();
    }
    assert_eq!(store.chain_users(None, None).await.unwrap().len(), 3);
    assert_eq!(store.chain_users(Some(sit.clone()), None).await.unwrap().len(), 2);
    assert_eq!(store.chain_users(None, Some(USER)).await.unwrap().len(), 2);
    assert_eq!(
        store
            .chain_users(Some(three_t.clone()), Some(8))
            .await
            .unwrap()
            .len(),
        0
    );

    // Re-adding replaces the credentials
    store
        .add_chain_user(ChainUser {
            user_id: USER,
            chain: sit.clone(),
            credentials: Credentials {
                username: "ola@example.com".into(),
                password: "changed".into(),
            },
        })
        .await
        .unwrap();
    let creds = store.credentials(USER, &sit).await.unwrap().expect("stored");
    assert_eq!(creds.password, "changed");
    assert!(store.credentials(99, &sit).await.unwrap().is_none());

    // 2. Recurring configs
    let id = store.add_recurring_config(recurring(0)).await.unwrap();
    assert!(id > 0);
    let config = store.recurring_config(id).await.unwrap().expect("config");
    assert_eq!(config.id, id);
    assert_eq!(config.weekday, 2);
    assert_eq!(config.activity_id, recurring(0).activity_id);
    assert_eq!(store.recurring_configs(USER, &sit).await.unwrap(), vec![config]);
    assert!(store.recurring_config(id + 100).await.unwrap().is_none());

    // 3. Cached auth
    assert!(store.cached_auth(USER, &sit).await.unwrap().is_none());
    let handle = AuthHandle::new("tok").with_subject("member-1");
    store
        .set_cached_auth(USER, &sit, Some(handle.clone()))
        .await
        .unwrap();
    assert_eq!(store.cached_auth(USER, &sit).await.unwrap(), Some(handle));
    store.set_cached_auth(USER, &sit, None).await.unwrap();
    assert!(store.cached_auth(USER, &sit).await.unwrap().is_none());

    // 4. Sessions: CONFIRMED rows survive a replacement, others are replaced
    let attended = Session::new(
        sit.clone(),
        USER,
        SessionStatus::Confirmed,
        class("attended", YOGA, GLOSHAUGEN, "2026-10-14T18:00:00+02:00"),
    );
    let planned = Session::new(
        sit.clone(),
        USER,
        SessionStatus::Planned,
        class("planned", YOGA, GLOSHAUGEN, "2026-10-21T18:00:00+02:00"),
    );
    store
        .upsert_sessions(USER, &sit, vec![attended.clone(), planned.clone()])
        .await
        .unwrap();

    let booked = Session::new(
        sit.clone(),
        USER,
        SessionStatus::Booked,
        class("booked", YOGA, GLOSHAUGEN, "2026-10-28T18:00:00+01:00"),
    );
    store
        .upsert_sessions(USER, &sit, vec![booked.clone()])
        .await
        .unwrap();

    let stored = store.sessions(USER, &sit).await.unwrap();
    assert_eq!(stored, vec![attended.clone(), booked.clone()]);
    assert!(store.sessions(USER, &three_t).await.unwrap().is_empty());

    // 5. Reminder window is half-open on start time
    let upcoming = store
        .pending_reminders(
            utc("2026-10-28T17:00:00Z"),
            utc("2026-10-28T18:00:00Z"),
        )
        .await
        .unwrap();
    assert_eq!(upcoming, vec![booked.clone()]);
    let none = store
        .pending_reminders(
            utc("2026-10-28T17:00:01Z"),
            utc("2026-10-29T00:00:00Z"),
        )
        .await
        .unwrap();
    assert!(none.is_empty());

    // 6. A reminded session stays marked across a later pull
    store
        .mark_reminded(&booked, utc("2026-10-28T16:00:00Z"))
        .await
        .unwrap();
    store
        .upsert_sessions(USER, &sit, vec![booked.clone()])
        .await
        .unwrap();
    assert_eq!(store.sessions(USER, &sit).await.unwrap(), vec![attended, booked]);
    let after_mark = store
        .pending_reminders(
            utc("2026-10-28T17:00:00Z"),
            utc("2026-10-28T18:00:00Z"),
        )
        .await
        .unwrap();
    assert!(after_mark.is_empty());

    // Cleanup
    let _ = tokio::fs::remove_file(&db_path).await;
    for suffix in ["-wal", "-shm"] {
        let mut side = db_path.clone().into_os_string();
        side.push(suffix);
        let _ = tokio::fs::remove_file(side).await;
    }
}

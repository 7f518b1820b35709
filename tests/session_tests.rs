// ABOUTME: Tests for the session membership store
// ABOUTME: Covers create-or-adopt, idempotent joins, validation, and concurrent mutation

use burpla::session::{SessionStore, StoreError};

#[test]
fn test_create_makes_creator_sole_member() {
    let store = SessionStore::new();
    let session = store.create("dinner-crew", "u1", "Alice").unwrap();
    assert_eq!(session.id, "dinner-crew");
    assert_eq!(session.name, "New Session");
    assert_eq!(session.members.len(), 1);
    assert_eq!(session.members[0].id, "u1");
    assert_eq!(session.members[0].name, "Alice");
}

#[test]
fn test_create_is_create_or_adopt_not_overwrite() {
    let store = SessionStore::new();
    let first = store.create("dinner-crew", "u1", "Alice").unwrap();
    let second = store.create("dinner-crew", "u2", "Bob").unwrap();

    // Original member and creation time preserved; caller adopted in.
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.members.len(), 2);
    assert_eq!(second.members[0].id, "u1");
    assert_eq!(second.members[1].id, "u2");
}

#[test]
fn test_create_idempotent_for_same_user() {
    let store = SessionStore::new();
    store.create("dinner-crew", "u1", "Alice").unwrap();
    let again = store.create("dinner-crew", "u1", "Alice").unwrap();
    assert_eq!(again.members.len(), 1);
}

#[test]
fn test_join_appends_in_order() {
    let store = SessionStore::new();
    store.create("dinner-crew", "u1", "Alice").unwrap();
    store.join("dinner-crew", "u2", "Bob").unwrap();
    let session = store.join("dinner-crew", "u3", "Carol").unwrap();

    let ids: Vec<&str> = session.members.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["u1", "u2", "u3"]);
}

#[test]
fn test_join_is_idempotent_and_preserves_joined_at() {
    let store = SessionStore::new();
    store.create("dinner-crew", "u1", "Alice").unwrap();
    let first = store.join("dinner-crew", "u2", "Bob").unwrap();
    let first_joined_at = first.members[1].joined_at.clone();

    std::thread::sleep(std::time::Duration::from_millis(5));
    let second = store.join("dinner-crew", "u2", "Bob").unwrap();

    let bobs: Vec<_> = second.members.iter().filter(|m| m.id == "u2").collect();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].joined_at, first_joined_at);
}

#[test]
fn test_join_unknown_session_errors() {
    let store = SessionStore::new();
    let err = store.join("nope", "u1", "Alice").unwrap_err();
    assert!(matches!(err, StoreError::SessionNotFound(_)));
}

#[test]
fn test_get_unknown_session_errors_never_defaults() {
    let store = SessionStore::new();
    let err = store.get("unknown-session").unwrap_err();
    assert!(matches!(err, StoreError::SessionNotFound(_)));
}

#[test]
fn test_get_reflects_latest_join() {
    let store = SessionStore::new();
    store.create("dinner-crew", "u1", "Alice").unwrap();
    store.join("dinner-crew", "u2", "Bob").unwrap();
    let session = store.get("dinner-crew").unwrap();
    assert_eq!(session.members.len(), 2);
}

#[test]
fn test_invalid_session_ids_rejected() {
    let store = SessionStore::new();
    assert!(matches!(
        store.create("", "u1", "Alice").unwrap_err(),
        StoreError::InvalidSessionId(_)
    ));
    assert!(matches!(
        store.create("has spaces", "u1", "Alice").unwrap_err(),
        StoreError::InvalidSessionId(_)
    ));
    assert!(matches!(
        store.create(&"x".repeat(65), "u1", "Alice").unwrap_err(),
        StoreError::InvalidSessionId(_)
    ));
}

#[test]
fn test_invalid_users_rejected() {
    let store = SessionStore::new();
    assert!(matches!(
        store.create("dinner-crew", "", "Alice").unwrap_err(),
        StoreError::InvalidUser(_)
    ));
    assert!(matches!(
        store.create("dinner-crew", "u1", " ").unwrap_err(),
        StoreError::InvalidUser(_)
    ));
}

#[test]
fn test_concurrent_joins_no_duplicates_no_lost_updates() {
    let store = SessionStore::new();
    store.create("busy-session", "creator", "Creator").unwrap();

    let mut handles = Vec::new();
    for i in 0..50 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            store
                .join("busy-session", &format!("user-{}", i), &format!("User {}", i))
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let session = store.get("busy-session").unwrap();
    assert_eq!(session.members.len(), 51);

    let mut ids: Vec<&str> = session.members.iter().map(|m| m.id.as_str()).collect();
    let before = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), before);
}

#[test]
fn test_concurrent_create_or_adopt_single_session() {
    let store = SessionStore::new();

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(std::thread::spawn(move || {
            store
                .create("race-session", &format!("user-{}", i), &format!("User {}", i))
                .unwrap();
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let session = store.get("race-session").unwrap();
    assert_eq!(session.members.len(), 10);
}

#[test]
fn test_sessions_are_independent() {
    let store = SessionStore::new();
    store.create("session-a", "u1", "Alice").unwrap();
    store.create("session-b", "u2", "Bob").unwrap();

    let a = store.get("session-a").unwrap();
    let b = store.get("session-b").unwrap();
    assert_eq!(a.members.len(), 1);
    assert_eq!(b.members.len(), 1);
    assert_ne!(a.members[0].id, b.members[0].id);
}

#[test]
fn test_rename_session() {
    let store = SessionStore::new();
    store.create("dinner-crew", "u1", "Alice").unwrap();
    let session = store.rename("dinner-crew", "Friday Tacos").unwrap();
    assert_eq!(session.name, "Friday Tacos");
    assert_eq!(store.get("dinner-crew").unwrap().name, "Friday Tacos");
}

#[test]
fn test_rename_unknown_session_errors() {
    let store = SessionStore::new();
    assert!(matches!(
        store.rename("nope", "Anything").unwrap_err(),
        StoreError::SessionNotFound(_)
    ));
}

#[test]
fn test_sessions_for_user() {
    let store = SessionStore::new();
    store.create("session-a", "u1", "Alice").unwrap();
    store.create("session-b", "u2", "Bob").unwrap();
    store.join("session-b", "u1", "Alice").unwrap();

    let sessions = store.sessions_for_user("u1").unwrap();
    assert_eq!(sessions.len(), 2);

    let sessions = store.sessions_for_user("u2").unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, "session-b");

    assert!(store.sessions_for_user("nobody").unwrap().is_empty());
}

#[test]
fn test_member_wire_format() {
    let store = SessionStore::new();
    let session = store.create("dinner-crew", "u1", "Alice").unwrap();
    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["id"], "dinner-crew");
    assert!(json["createdAt"].is_string());
    assert!(json["members"][0]["joinedAt"].is_string());
}

use std::sync::{Arc, atomic::Ordering};

use lavlus_shell::{
    AuthError, SessionStore,
    identity::MockIdentityProvider,
    models::{Identity, Session, SessionState},
};
use parking_lot::Mutex;

// --- Helper Functions ---

fn store_with(provider: MockIdentityProvider) -> (SessionStore, Arc<MockIdentityProvider>) {
    let provider = Arc::new(provider);
    (SessionStore::new(provider.clone()), provider)
}

/// Records the session every listener sees, in notification order.
fn record(store: &SessionStore) -> Arc<Mutex<Vec<Session>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    // Listener stays registered for the lifetime of the store.
    let _subscription = store.subscribe(move |session| sink.lock().push(session.clone()));
    seen
}

// --- Tests ---

#[tokio::test]
async fn test_sign_in_notifies_every_subscriber_before_returning() {
    let (store, _) = store_with(MockIdentityProvider::signing_in_as("t1", "alice"));
    let first = record(&store);
    let second = record(&store);

    let session = store.sign_in().await.unwrap();

    let expected = Session::Authenticated {
        token: "t1".to_string(),
        identity: Identity { display_name: "alice".to_string(), uid: "uid-alice".to_string() },
    };
    assert_eq!(session, expected);
    assert_eq!(store.get_state(), expected);
    // Both listeners already ran by the time sign_in returned.
    assert_eq!(*first.lock(), vec![expected.clone()]);
    assert_eq!(*second.lock(), vec![expected]);
}

#[tokio::test]
async fn test_sign_out_always_ends_unauthenticated() {
    // From Unknown
    let (store, provider) = store_with(MockIdentityProvider::default());
    store.sign_out().await.unwrap();
    assert_eq!(store.get_state(), Session::Unauthenticated);
    assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 1);

    // From Authenticated
    let (store, _) = store_with(MockIdentityProvider::signing_in_as("t1", "alice"));
    store.sign_in().await.unwrap();
    store.sign_out().await.unwrap();
    let state = store.get_state();
    assert_eq!(state.state(), SessionState::Unauthenticated);
    assert!(state.token().is_none());
    assert!(state.identity().is_none());

    // From Unauthenticated
    store.sign_out().await.unwrap();
    assert_eq!(store.get_state(), Session::Unauthenticated);
}

#[tokio::test]
async fn test_remote_sign_out_failure_still_clears_local_session() {
    let provider = MockIdentityProvider {
        sign_out_error: Some(AuthError::NetworkFailure("offline".to_string())),
        ..MockIdentityProvider::signing_in_as("t1", "alice")
    };
    let (store, _) = store_with(provider);
    store.sign_in().await.unwrap();
    let seen = record(&store);

    let result = store.sign_out().await;

    assert_eq!(result, Err(AuthError::NetworkFailure("offline".to_string())));
    assert_eq!(store.get_state(), Session::Unauthenticated);
    assert_eq!(*seen.lock(), vec![Session::Unauthenticated]);
}

#[tokio::test]
async fn test_sign_in_errors_are_returned_and_state_kept() {
    for error in [
        AuthError::PopupClosed,
        AuthError::NetworkFailure("dns".to_string()),
        AuthError::ProviderRejected("disabled".to_string()),
    ] {
        let (store, provider) = store_with(MockIdentityProvider::failing(error.clone()));
        store.expire();

        assert_eq!(store.sign_in().await, Err(error));
        assert_eq!(store.get_state(), Session::Unauthenticated);
        assert_eq!(provider.sign_in_calls.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn test_restore_resolves_unknown_once() {
    let (store, provider) =
        store_with(MockIdentityProvider::signing_in_as("t9", "bob").restorable());
    assert_eq!(store.get_state().state(), SessionState::Unknown);

    let session = store.restore().await;

    assert_eq!(session.token(), Some("t9"));
    assert_eq!(store.token().as_deref(), Some("t9"));
    // Restoring never goes through the interactive flow.
    assert_eq!(provider.sign_in_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_expire_skips_the_provider() {
    let (store, provider) = store_with(MockIdentityProvider::signing_in_as("t1", "alice"));
    store.sign_in().await.unwrap();

    store.expire();

    assert_eq!(store.get_state(), Session::Unauthenticated);
    assert_eq!(provider.sign_out_calls.load(Ordering::SeqCst), 0);
}

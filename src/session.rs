use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use crate::{error::AuthError, identity::IdentityState, models::Session};

type Listener = Arc<dyn Fn(&Session) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// SessionStore
///
/// Single owner of the process-wide [`Session`]. Pages and forms receive an
/// `Arc<SessionStore>` and only read it; the sole writers are `sign_in`, `sign_out`,
/// `restore` and `expire`.
///
/// Every write replaces the whole session value and then notifies all subscribers
/// synchronously, in subscription order, before the writing call returns.
pub struct SessionStore {
    session: RwLock<Session>,
    listeners: Arc<Mutex<Listeners>>,
    provider: IdentityState,
}

/// Subscription
///
/// Handle returned by [`SessionStore::subscribe`]. Dropping it keeps the listener
/// registered; call [`Subscription::unsubscribe`] to remove it.
#[must_use = "keep the handle to be able to unsubscribe"]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl SessionStore {
    /// Creates a store in the `Unknown` state.
    pub fn new(provider: IdentityState) -> Self {
        Self {
            session: RwLock::new(Session::Unknown),
            listeners: Arc::new(Mutex::new(Listeners::default())),
            provider,
        }
    }

    /// Snapshot of the current session.
    pub fn get_state(&self) -> Session {
        self.session.read().clone()
    }

    /// Current bearer token, if authenticated.
    pub fn token(&self) -> Option<String> {
        self.session.read().token().map(str::to_string)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Session) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Subscription { id, listeners: Arc::downgrade(&self.listeners) }
    }

    /// sign_in
    ///
    /// Runs the provider's interactive sign-in. On success the session becomes
    /// `Authenticated` and subscribers are notified before this returns. On failure the
    /// session is left exactly as it was.
    pub async fn sign_in(&self) -> Result<Session, AuthError> {
        match self.provider.sign_in_interactive().await {
            Ok(credential) => {
                tracing::info!(uid = %credential.identity.uid, "sign-in succeeded");
                let session = Session::from(credential);
                self.transition(session.clone());
                Ok(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, "sign-in failed");
                Err(e)
            }
        }
    }

    /// sign_out
    ///
    /// Always ends in `Unauthenticated`, whatever the prior state. The provider is asked
    /// to end the remote session too; if that fails the local transition still happens
    /// and the provider error is returned afterwards.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let token = self.token();
        let remote = self.provider.sign_out_remote(token.as_deref()).await;

        self.transition(Session::Unauthenticated);

        if let Err(e) = &remote {
            tracing::warn!(error = %e, "remote sign-out failed, local session cleared anyway");
        }
        remote
    }

    /// restore
    ///
    /// Resolves the startup `Unknown` state from a credential the provider already holds.
    /// A provider failure counts as "not signed in" so the gate never waits forever.
    pub async fn restore(&self) -> Session {
        let session = match self.provider.current_credential().await {
            Ok(Some(credential)) => Session::from(credential),
            Ok(None) => Session::Unauthenticated,
            Err(e) => {
                tracing::warn!(error = %e, "could not restore session");
                Session::Unauthenticated
            }
        };
        self.transition(session.clone());
        session
    }

    /// expire
    ///
    /// Local-only transition to `Unauthenticated`, used when the API reports the token
    /// as no longer valid. The provider is not contacted.
    pub fn expire(&self) {
        tracing::info!("session expired by API");
        self.transition(Session::Unauthenticated);
    }

    fn transition(&self, next: Session) {
        {
            let mut session = self.session.write();
            tracing::debug!(from = %session.state(), to = %next.state(), "session transition");
            *session = next.clone();
        }

        // Listeners run without any store lock held so they may read the store or
        // (un)subscribe.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener(&next);
        }
    }
}

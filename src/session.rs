// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Session lifecycle: whether, and as whom, this client is signed in.
//!
//! The [`Manager`] is the only writer of the credential store and of the
//! shared client's authorization header. Every mutation takes the same lock
//! and leaves the in-memory fields, the store and the header consistent with
//! each other before releasing it.

use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use futures_util::lock::Mutex;
use log::{debug, info, warn};
use secrecy::SecretString;
use tokio::sync::watch;

use crate::{
    api::{self, Executor as _},
    credentials,
    error::{self, Result},
    http,
    model::UserProfile,
    storage::Storage,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Phase {
    /// A stored token is being verified. Consumers must not assume either
    /// outcome.
    Initializing,
    Unauthenticated,
    Authenticated,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Initializing => "initializing",
            Self::Unauthenticated => "signed out",
            Self::Authenticated => "signed in",
        })
    }
}

/// Resolves the profile that the current bearer token belongs to.
#[async_trait]
pub(crate) trait Identity: Send + Sync {
    async fn who_am_i(&self) -> Result<UserProfile>;
}

#[async_trait]
impl Identity for http::Client {
    async fn who_am_i(&self) -> Result<UserProfile> {
        api::Me.execute(self).await
    }
}

/// A restored session whose token the server has not confirmed yet.
#[must_use]
pub(crate) struct Unverified {
    epoch: u64,
}

/// A consistent view of the session at one instant.
#[derive(Clone, Debug)]
pub(crate) struct Snapshot {
    pub(crate) phase: Phase,
    pub(crate) token: Option<SecretString>,
    pub(crate) user: Option<UserProfile>,
}

struct Inner {
    token: Option<SecretString>,
    user: Option<UserProfile>,
    /// Advanced by every login and logout. A verification that started under
    /// an older epoch has been superseded and its result is dropped.
    epoch: u64,
    store: credentials::Store<Box<dyn Storage>>,
}

pub(crate) struct Manager {
    inner: Mutex<Inner>,
    client: Arc<http::Client>,
    identity: Arc<dyn Identity>,
    phase: watch::Sender<Phase>,
}

impl Manager {
    pub(crate) fn new(
        storage: Box<dyn Storage>,
        client: Arc<http::Client>,
        identity: Arc<dyn Identity>,
    ) -> Self {
        let (phase, _) = watch::channel(Phase::Initializing);
        Self {
            inner: Mutex::new(Inner {
                token: None,
                user: None,
                epoch: 0,
                store: credentials::Store::new(storage),
            }),
            client,
            identity,
            phase,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub(crate) async fn snapshot(&self) -> Snapshot {
        let inner = self.inner.lock().await;
        Snapshot {
            phase: self.phase(),
            token: inner.token.clone(),
            user: inner.user.clone(),
        }
    }

    pub(crate) async fn user(&self) -> Option<UserProfile> {
        self.inner.lock().await.user.clone()
    }

    /// Wait for start-up verification to finish. Returns immediately if it
    /// already has.
    pub(crate) async fn wait_until_settled(&self) -> Phase {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(|phase| *phase != Phase::Initializing)
            .await
            .map(|phase| *phase);
        settled.unwrap_or_else(|_| self.phase())
    }

    fn publish(&self, phase: Phase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            debug!("Session changed from {} to {}", previous, phase);
        }
    }

    /// Restore the session from the credential store. Only the first call
    /// does anything.
    ///
    /// An empty or unusable store settles the session as signed out before
    /// this returns. A stored session is adopted, header included, and the
    /// returned [`Unverified`] must be passed to [`Manager::verify`] to leave
    /// [`Phase::Initializing`].
    pub(crate) async fn restore(&self) -> Option<Unverified> {
        let mut inner = self.inner.lock().await;
        if self.phase() != Phase::Initializing || inner.epoch != 0 {
            debug!("Session is already initialized");
            return None;
        }

        let Some(stored) = inner.store.read().await else {
            debug!("No stored session found");
            let _cleared = self.reset(&mut inner).await;
            return None;
        };

        let header = match http::bearer(&stored.token) {
            Ok(header) => header,
            Err(e) => {
                warn!("The stored token cannot be sent, so we discard it: {}", e);
                let _cleared = self.reset(&mut inner).await;
                return None;
            }
        };

        inner.token = Some(stored.token);
        inner.user = Some(stored.user);
        self.client.set_authorization(header);
        info!("Restored a stored session, verifying it with the server");
        Some(Unverified { epoch: inner.epoch })
    }

    /// Ask the server who the restored token belongs to and settle the
    /// session accordingly. The lock is not held during the call.
    pub(crate) async fn verify(&self, unverified: Unverified) -> Phase {
        let verified = self.identity.who_am_i().await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != unverified.epoch {
            debug!("Ignoring a verification result superseded by a later login or logout");
            return self.phase();
        }

        match verified {
            Ok(user) => {
                // The token is unchanged; only the profile is rewritten.
                if let Err(e) = inner.store.write_user(&user).await {
                    warn!(
                        "Could not store the refreshed profile, so you have been signed out: {}",
                        e
                    );
                    let _cleared = self.reset(&mut inner).await;
                    return self.phase();
                }
                inner.user = Some(user);
                self.publish(Phase::Authenticated);
            }
            Err(e) => {
                if let Some(status) = e.status() {
                    warn!(
                        "The server rejected the stored session ({}), so you have been signed out",
                        status
                    );
                } else {
                    warn!(
                        "We could not verify the stored session, so you have been signed out: {}",
                        e
                    );
                }
                let _cleared = self.reset(&mut inner).await;
            }
        }
        self.phase()
    }

    #[cfg(test)]
    pub(crate) async fn initialize(&self) -> Phase {
        match self.restore().await {
            Some(unverified) => self.verify(unverified).await,
            None => self.phase(),
        }
    }

    /// Adopt a credential pair freshly issued by the server. It is trusted
    /// as-is; no verification call is made.
    pub(crate) async fn login(&self, token: SecretString, user: UserProfile) -> Result<()> {
        let header = http::bearer(&token)?;

        let mut inner = self.inner.lock().await;
        inner.epoch += 1;
        inner.token = Some(token.clone());
        inner.user = Some(user.clone());

        if let Err(e) = inner.store.write(&token, &user).await {
            warn!("Could not store the new session, so it is discarded: {}", e);
            let _cleared = self.reset(&mut inner).await;
            return Err(e);
        }

        // Last, so no request goes out before the session is fully recorded.
        self.client.set_authorization(header);
        self.publish(Phase::Authenticated);
        info!("Signed in as {}", user.email);
        Ok(())
    }

    /// Sign out. Safe to call in any phase, any number of times.
    pub(crate) async fn logout(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let was_signed_in = inner.token.is_some();
        let cleared = self.reset(&mut inner).await;
        if was_signed_in {
            info!("Signed out");
        }
        cleared
    }

    /// Clear every trace of the session: memory, then store, then header.
    /// The in-memory state and the header are cleared even if the store
    /// cannot be.
    async fn reset(&self, inner: &mut Inner) -> Result<()> {
        inner.epoch += 1;
        inner.token = None;
        inner.user = None;
        let cleared = inner.store.clear().await;
        if let Err(ref e) = cleared {
            warn!("Could not clear the stored session: {}", e);
        }
        self.client.clear_authorization();
        self.publish(Phase::Unauthenticated);
        cleared
    }
}

tokio::task_local! {
    static CURRENT: Arc<Manager>;
}

/// Run `f` with `session` as the session every [`current`] call inside it
/// resolves to.
pub(crate) async fn provide<F: Future>(session: Arc<Manager>, f: F) -> F::Output {
    CURRENT.scope(session, f).await
}

/// The session provided to the running task. Asking for it anywhere else is a
/// programming error, reported as [`error::Internal::NoSessionProvider`].
pub(crate) fn current() -> Result<Arc<Manager>> {
    CURRENT
        .try_with(Arc::clone)
        .map_err(|_| error::Internal::NoSessionProvider.into())
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderValue, AUTHORIZATION};
    use secrecy::ExposeSecret as _;
    use tokio::sync::oneshot;
    use url::Url;

    use crate::{
        config::Config,
        credentials::{fixtures::RejectsProfile, TOKEN_KEY, USER_KEY},
        error::Error,
        model::user::fixtures,
        storage::Memory,
    };

    use super::*;

    struct Fake {
        calls: std::sync::Mutex<u32>,
        result: std::sync::Mutex<Option<Result<UserProfile>>>,
    }

    impl Fake {
        fn returning(result: Result<UserProfile>) -> Arc<Self> {
            Arc::new(Self {
                calls: std::sync::Mutex::new(0),
                result: std::sync::Mutex::new(Some(result)),
            })
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
        }
    }

    #[async_trait]
    impl Identity for Fake {
        async fn who_am_i(&self) -> Result<UserProfile> {
            *self.calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner) += 1;
            self.result
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take()
                .unwrap_or_else(|| Err(Error::Cancelled))
        }
    }

    /// Announces that verification has started, then waits to be told how
    /// it ends.
    struct Pending {
        started: std::sync::Mutex<Option<oneshot::Sender<()>>>,
        outcome: Mutex<Option<oneshot::Receiver<Result<UserProfile>>>>,
    }

    #[async_trait]
    impl Identity for Pending {
        async fn who_am_i(&self) -> Result<UserProfile> {
            if let Some(started) = self
                .started
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .take()
            {
                let _ignored = started.send(());
            }
            let outcome = self.outcome.lock().await.take();
            match outcome {
                Some(rx) => rx.await.unwrap_or(Err(Error::Cancelled)),
                None => Err(Error::Cancelled),
            }
        }
    }

    struct Harness {
        storage: Memory,
        client: Arc<http::Client>,
        session: Arc<Manager>,
    }

    fn harness(storage: Memory, identity: Arc<dyn Identity>) -> Result<Harness> {
        let client = Arc::new(http::Client::new(&Config::new(Url::parse(
            "http://127.0.0.1:8000/",
        )?))?);
        let session = Arc::new(Manager::new(
            Box::new(storage.clone()),
            Arc::clone(&client),
            identity,
        ));
        Ok(Harness {
            storage,
            client,
            session,
        })
    }

    async fn stored(token: &str, user: &UserProfile) -> Result<Memory> {
        let mut storage = Memory::new();
        storage.set(TOKEN_KEY, token).await?;
        storage.set(USER_KEY, &serde_json::to_string(user)?).await?;
        Ok(storage)
    }

    async fn assert_signed_out(h: &mut Harness) -> Result<()> {
        let snapshot = h.session.snapshot().await;
        assert_eq!(snapshot.phase, Phase::Unauthenticated);
        assert!(snapshot.token.is_none());
        assert!(snapshot.user.is_none());
        assert_eq!(h.storage.get(TOKEN_KEY).await?, None);
        assert_eq!(h.storage.get(USER_KEY).await?, None);
        assert!(h.client.authorization().is_none());
        let req = h
            .client
            .request(reqwest::Method::GET, &["auth", "me"])?
            .build()?;
        assert!(req.headers().get(AUTHORIZATION).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn starts_initializing() -> Result<()> {
        let h = harness(Memory::new(), Fake::returning(Ok(fixtures::asha())))?;
        assert_eq!(h.session.phase(), Phase::Initializing);
        Ok(())
    }

    #[tokio::test]
    async fn empty_store_signs_out_without_network() -> Result<()> {
        let identity = Fake::returning(Ok(fixtures::asha()));
        let mut h = harness(Memory::new(), Arc::<Fake>::clone(&identity))?;

        assert_eq!(h.session.initialize().await, Phase::Unauthenticated);

        assert_eq!(identity.calls(), 0);
        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn verified_session_takes_fresh_profile() -> Result<()> {
        let mut updated = fixtures::asha();
        updated.name = "Asha Updated".to_owned();
        let identity = Fake::returning(Ok(updated.clone()));
        let mut h = harness(
            stored("abc", &fixtures::asha()).await?,
            Arc::<Fake>::clone(&identity),
        )?;

        assert_eq!(h.session.initialize().await, Phase::Authenticated);

        assert_eq!(identity.calls(), 1);
        let snapshot = h.session.snapshot().await;
        assert_eq!(
            snapshot.user.as_ref().map(|u| u.name.as_str()),
            Some("Asha Updated")
        );
        assert_eq!(
            snapshot.token.as_ref().map(|t| t.expose_secret().as_str()),
            Some("abc")
        );
        assert_eq!(
            h.client.authorization(),
            Some(HeaderValue::from_static("Bearer abc"))
        );
        let persisted: Option<UserProfile> = h
            .storage
            .get(USER_KEY)
            .await?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?;
        assert_eq!(persisted, Some(updated));
        Ok(())
    }

    #[tokio::test]
    async fn empty_store_settles_before_restore_returns() -> Result<()> {
        let identity = Fake::returning(Ok(fixtures::asha()));
        let mut h = harness(Memory::new(), Arc::<Fake>::clone(&identity))?;

        assert!(h.session.restore().await.is_none());

        assert_eq!(h.session.phase(), Phase::Unauthenticated);
        assert_eq!(identity.calls(), 0);
        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn restore_adopts_stored_session_before_verifying() -> Result<()> {
        let identity = Fake::returning(Ok(fixtures::asha()));
        let h = harness(
            stored("abc", &fixtures::asha()).await?,
            Arc::<Fake>::clone(&identity),
        )?;

        let unverified = h.session.restore().await;

        assert_eq!(h.session.phase(), Phase::Initializing);
        assert_eq!(identity.calls(), 0);
        assert_eq!(h.session.user().await, Some(fixtures::asha()));
        let req = h
            .client
            .request(reqwest::Method::GET, &["disease", "history"])?
            .build()?;
        assert_eq!(
            req.headers().get(AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer abc"))
        );

        let Some(unverified) = unverified else {
            panic!("a stored session needs verifying");
        };
        assert_eq!(h.session.verify(unverified).await, Phase::Authenticated);
        assert_eq!(identity.calls(), 1);
        assert!(h.session.restore().await.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unstorable_profile_refresh_signs_out() -> Result<()> {
        let mut backing = stored("abc", &fixtures::asha()).await?;
        let client = Arc::new(http::Client::new(&Config::new(Url::parse(
            "http://127.0.0.1:8000/",
        )?))?);
        let mut updated = fixtures::asha();
        updated.name = "Asha Updated".to_owned();
        let session = Manager::new(
            Box::new(RejectsProfile(backing.clone())),
            Arc::clone(&client),
            Fake::returning(Ok(updated)),
        );

        assert_eq!(session.initialize().await, Phase::Unauthenticated);

        let snapshot = session.snapshot().await;
        assert!(snapshot.token.is_none());
        assert!(snapshot.user.is_none());
        assert_eq!(backing.get(TOKEN_KEY).await?, None);
        assert_eq!(backing.get(USER_KEY).await?, None);
        assert!(client.authorization().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_session_is_cleared() -> Result<()> {
        let identity = Fake::returning(Err(Error::Api {
            status: reqwest::StatusCode::UNAUTHORIZED,
            detail: "Could not validate credentials".to_owned(),
        }));
        let mut h = harness(stored("abc", &fixtures::asha()).await?, identity)?;

        assert_eq!(h.session.initialize().await, Phase::Unauthenticated);

        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn unreachable_server_also_signs_out() -> Result<()> {
        let identity = Fake::returning(Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ))));
        let mut h = harness(stored("abc", &fixtures::asha()).await?, identity)?;

        assert_eq!(h.session.initialize().await, Phase::Unauthenticated);

        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn corrupt_store_is_treated_as_empty() -> Result<()> {
        let mut storage = Memory::new();
        storage.set(TOKEN_KEY, "abc").await?;
        storage.set(USER_KEY, "not a profile").await?;
        let identity = Fake::returning(Ok(fixtures::asha()));
        let mut h = harness(storage, Arc::<Fake>::clone(&identity))?;

        assert_eq!(h.session.initialize().await, Phase::Unauthenticated);

        assert_eq!(identity.calls(), 0);
        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn stays_initializing_while_verification_is_pending() -> Result<()> {
        let (started_tx, started_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let identity = Arc::new(Pending {
            started: std::sync::Mutex::new(Some(started_tx)),
            outcome: Mutex::new(Some(outcome_rx)),
        });
        let h = harness(stored("abc", &fixtures::asha()).await?, identity)?;

        let observe = async {
            let _ignored = started_rx.await;
            let snapshot = h.session.snapshot().await;
            assert_eq!(snapshot.phase, Phase::Initializing);
            assert_eq!(snapshot.user, Some(fixtures::asha()));
            assert_eq!(
                h.client.authorization(),
                Some(HeaderValue::from_static("Bearer abc"))
            );
            let _ignored = outcome_tx.send(Ok(fixtures::asha()));
        };
        let (phase, ()) = tokio::join!(h.session.initialize(), observe);

        assert_eq!(phase, Phase::Authenticated);
        assert_eq!(h.session.wait_until_settled().await, Phase::Authenticated);
        Ok(())
    }

    #[tokio::test]
    async fn logout_during_verification_is_not_reverted() -> Result<()> {
        let (started_tx, started_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let identity = Arc::new(Pending {
            started: std::sync::Mutex::new(Some(started_tx)),
            outcome: Mutex::new(Some(outcome_rx)),
        });
        let mut h = harness(stored("abc", &fixtures::asha()).await?, identity)?;

        let interrupt = async {
            let _ignored = started_rx.await;
            let logged_out = h.session.logout().await;
            let mut updated = fixtures::asha();
            updated.name = "Asha Updated".to_owned();
            let _ignored = outcome_tx.send(Ok(updated));
            logged_out
        };
        let (phase, logged_out) = tokio::join!(h.session.initialize(), interrupt);
        logged_out?;

        assert_eq!(phase, Phase::Unauthenticated);
        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn login_during_verification_wins() -> Result<()> {
        let (started_tx, started_rx) = oneshot::channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let identity = Arc::new(Pending {
            started: std::sync::Mutex::new(Some(started_tx)),
            outcome: Mutex::new(Some(outcome_rx)),
        });
        let h = harness(stored("stale", &fixtures::asha()).await?, identity)?;

        let interrupt = async {
            let _ignored = started_rx.await;
            let logged_in = h
                .session
                .login(SecretString::new("fresh".to_owned()), fixtures::asha())
                .await;
            let _ignored = outcome_tx.send(Err(Error::Api {
                status: reqwest::StatusCode::UNAUTHORIZED,
                detail: "Token expired".to_owned(),
            }));
            logged_in
        };
        let (phase, logged_in) = tokio::join!(h.session.initialize(), interrupt);
        logged_in?;

        assert_eq!(phase, Phase::Authenticated);
        assert_eq!(
            h.client.authorization(),
            Some(HeaderValue::from_static("Bearer fresh"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn login_updates_memory_store_and_header() -> Result<()> {
        let mut h = harness(Memory::new(), Fake::returning(Ok(fixtures::asha())))?;
        let _phase = h.session.initialize().await;

        h.session
            .login(SecretString::new("t0k3n".to_owned()), fixtures::asha())
            .await?;

        assert_eq!(h.session.phase(), Phase::Authenticated);
        assert_eq!(h.session.user().await, Some(fixtures::asha()));
        assert_eq!(h.storage.get(TOKEN_KEY).await?.as_deref(), Some("t0k3n"));
        assert_eq!(
            h.storage.get(USER_KEY).await?,
            Some(serde_json::to_string(&fixtures::asha())?)
        );
        let req = h
            .client
            .request(reqwest::Method::GET, &["disease", "history"])?
            .build()?;
        assert_eq!(
            req.headers().get(AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer t0k3n"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn unsendable_token_is_refused_without_side_effects() -> Result<()> {
        let mut h = harness(Memory::new(), Fake::returning(Ok(fixtures::asha())))?;
        let _phase = h.session.initialize().await;

        assert!(h
            .session
            .login(SecretString::new("line\nbreak".to_owned()), fixtures::asha())
            .await
            .is_err());

        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn login_then_logout_leaves_nothing() -> Result<()> {
        let mut h = harness(Memory::new(), Fake::returning(Ok(fixtures::asha())))?;
        let _phase = h.session.initialize().await;

        h.session
            .login(SecretString::new("abc".to_owned()), fixtures::asha())
            .await?;
        h.session.logout().await?;

        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn logout_is_idempotent() -> Result<()> {
        let mut h = harness(Memory::new(), Fake::returning(Ok(fixtures::asha())))?;
        h.session
            .login(SecretString::new("abc".to_owned()), fixtures::asha())
            .await?;

        h.session.logout().await?;
        assert_signed_out(&mut h).await?;
        h.session.logout().await?;
        assert_signed_out(&mut h).await
    }

    #[tokio::test]
    async fn restart_restores_logged_in_session() -> Result<()> {
        let storage = Memory::new();
        let first = harness(storage.clone(), Fake::returning(Ok(fixtures::asha())))?;
        let _phase = first.session.initialize().await;
        first
            .session
            .login(SecretString::new("abc".to_owned()), fixtures::asha())
            .await?;

        let identity = Fake::returning(Ok(fixtures::asha()));
        let second = harness(storage, Arc::<Fake>::clone(&identity))?;
        assert_eq!(second.session.initialize().await, Phase::Authenticated);
        assert_eq!(identity.calls(), 1);
        assert_eq!(
            second.client.authorization(),
            Some(HeaderValue::from_static("Bearer abc"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn current_requires_a_provider() -> Result<()> {
        assert!(matches!(
            current(),
            Err(Error::Internal(error::Internal::NoSessionProvider))
        ));

        let h = harness(Memory::new(), Fake::returning(Ok(fixtures::asha())))?;
        let provided = provide(Arc::clone(&h.session), async { current() }).await?;
        assert!(Arc::ptr_eq(&provided, &h.session));
        Ok(())
    }
}

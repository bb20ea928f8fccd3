// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The bearer token and user profile, persisted for the lifetime of a client
//! session.

use log::warn;
use secrecy::{ExposeSecret as _, SecretString};

use crate::{error::Result, model::UserProfile, storage::Storage};

pub(crate) const TOKEN_KEY: &str = "token";
pub(crate) const USER_KEY: &str = "user";

#[derive(Clone, Debug)]
pub(crate) struct Credentials {
    pub(crate) token: SecretString,
    pub(crate) user: UserProfile,
}

pub(crate) struct Store<S: Storage> {
    storage: S,
}

impl<S: Storage> Store<S> {
    pub(crate) const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Persist both values. If the profile cannot be written, the token is
    /// removed again so the store is never left holding half a session.
    pub(crate) async fn write(&mut self, token: &SecretString, user: &UserProfile) -> Result<()> {
        let serialized = serde_json::to_string(user)?;

        self.storage.set(TOKEN_KEY, token.expose_secret()).await?;
        if let Err(e) = self.storage.set(USER_KEY, &serialized).await {
            if let Err(rollback) = self.storage.remove(TOKEN_KEY).await {
                warn!("Could not roll back a partially written session: {}", rollback);
            }
            return Err(e);
        }
        Ok(())
    }

    /// Replace the stored profile of a session whose token stays the same.
    pub(crate) async fn write_user(&mut self, user: &UserProfile) -> Result<()> {
        let serialized = serde_json::to_string(user)?;
        self.storage.set(USER_KEY, &serialized).await
    }

    /// Read a complete session back. Anything short of both keys present
    /// and a decodable profile reads as no session at all.
    pub(crate) async fn read(&mut self) -> Option<Credentials> {
        let token = match self.storage.get(TOKEN_KEY).await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    "Failed to read the stored token, so we treat the session as absent: {}",
                    e
                );
                return None;
            }
        };

        let user = match self.storage.get(USER_KEY).await {
            Ok(Some(user)) => user,
            Ok(None) => return None,
            Err(e) => {
                warn!(
                    "Failed to read the stored profile, so we treat the session as absent: {}",
                    e
                );
                return None;
            }
        };

        match serde_json::from_str(&user) {
            Ok(user) => Some(Credentials {
                token: SecretString::new(token),
                user,
            }),
            Err(e) => {
                warn!(
                    "Failed to decode the stored profile, so we treat the session as absent: {}",
                    e
                );
                None
            }
        }
    }

    pub(crate) async fn clear(&mut self) -> Result<()> {
        self.storage.remove(TOKEN_KEY).await?;
        self.storage.remove(USER_KEY).await
    }
}

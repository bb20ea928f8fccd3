// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

pub(crate) const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/";
pub(crate) const DEFAULT_SESSION: &str = "default";

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Base URL every API path is resolved against. Always ends in a slash.
    pub(crate) api_url: Url,
    /// Name of the session-scoped store.
    pub(crate) session: String,
    /// Whether the session outlives the process.
    pub(crate) persist_session: bool,
    /// Transport-wide request timeout. The verification call gets no bound of
    /// its own.
    pub(crate) timeout: Option<Duration>,
}

impl Config {
    pub(crate) fn new(mut api_url: Url) -> Self {
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }

        Self {
            api_url,
            session: DEFAULT_SESSION.to_owned(),
            persist_session: true,
            timeout: None,
        }
    }

    pub(crate) fn with_session(mut self, session: &str) -> Result<Self> {
        let valid = !session.is_empty()
            && session
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(Error::Validation(format!(
                "session name '{}' may only contain letters, digits, '-' and '_'",
                session
            )));
        }
        self.session = session.to_owned();
        Ok(self)
    }

    pub(crate) fn with_persistence(mut self, persist_session: bool) -> Self {
        self.persist_session = persist_session;
        self
    }

    pub(crate) fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

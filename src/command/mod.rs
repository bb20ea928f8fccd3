// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use inflector::Inflector as _;
use secrecy::SecretString;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    error::{self, Result},
    gate::{self, Decision, Destination},
    http,
    password::{self, RequestBuilder},
    session,
};

pub(crate) mod advisory;
pub(crate) mod crops;
pub(crate) mod diagnosis;
pub(crate) mod history;
pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod open;
pub(crate) mod predict;
pub(crate) mod register;
pub(crate) mod stats;
pub(crate) mod whoami;

/// What every command gets to work with besides the current session.
pub(crate) struct Context {
    pub(crate) client: Arc<http::Client>,
    pub(crate) prompt: Arc<dyn password::Prompt>,
}

impl Context {
    pub(crate) async fn password(&self, req: RequestBuilder) -> Result<SecretString> {
        let password = self.prompt.prompt(req.into_request()).await?;
        password.ok_or_else(|| error::Password::NoPrompt.into())
    }
}

#[async_trait]
pub(crate) trait Command {
    /// The page this command corresponds to. Commands without one are
    /// allowed in every phase.
    fn destination(&self) -> Option<Destination>;

    async fn execute(self, ctx: &Context) -> Result<()>;
}

/// Run `cmd` if the gate lets the current session through to its
/// destination.
pub(crate) async fn dispatch<C: Command + Send>(cmd: C, ctx: &Context) -> Result<()> {
    if let Some(destination) = cmd.destination() {
        let session = session::current()?;
        let refusal = match gate::admit(&session, destination).await {
            Decision::Render(_) => None,
            Decision::Redirect(Destination::Login) => Some(format!(
                "you need to log in before opening {destination}"
            )),
            Decision::Redirect(to) => Some(match session.user().await {
                Some(user) => format!(
                    "you are already signed in as {}; try {} instead",
                    user.email, to
                ),
                None => format!("{destination} is not available right now; try {to}"),
            }),
            Decision::Loading => Some("the session is still being verified".to_owned()),
        };
        if let Some(refusal) = refusal {
            return Err(error::Error::Command(refusal));
        }
    }

    cmd.execute(ctx).await
}

pub(crate) fn table<T: Tabled>(rows: impl IntoIterator<Item = T>) -> Table {
    let mut table = Table::new(rows);
    _ = table.with(Style::rounded());
    table
}

#[derive(Tabled)]
pub(crate) struct Field {
    #[tabled(rename = "Field")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Flatten a free-form JSON object into printable rows. Nested values are
/// shown as compact JSON.
pub(crate) fn fields(object: &serde_json::Map<String, serde_json::Value>) -> Vec<Field> {
    object
        .iter()
        .map(|(name, value)| Field {
            name: name.to_title_case(),
            value: match *value {
                serde_json::Value::String(ref s) => s.clone(),
                serde_json::Value::Array(ref items) if items.iter().all(|i| i.is_string()) => {
                    items
                        .iter()
                        .filter_map(serde_json::Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                }
                ref other => other.to_string(),
            },
        })
        .collect()
}

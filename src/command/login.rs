// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::future::Future;

use async_trait::async_trait;
use clap::Parser;
use log::{debug, warn};
use reqwest::StatusCode;
use secrecy::SecretString;

use crate::{
    api::{self, Executor as _},
    error::{Error, Result},
    form,
    gate::Destination,
    metadata,
    model::AuthResponse,
    password::RequestBuilder,
    session,
};

use super::Context;

/// How many passwords to try before giving up.
const ATTEMPTS: u8 = 3;

/// Sign in with an existing account.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The e-mail address the account was registered with.
    #[clap()]
    email: String,
}

/// Prompt for a password and hand it to `attempt`. A rejected password is
/// asked for again, with the server's reason shown, until the attempts run
/// out.
async fn authenticate<F, Fut>(
    ctx: &Context,
    description: &str,
    mut attempt: F,
) -> Result<AuthResponse>
where
    F: FnMut(SecretString) -> Fut + Send,
    Fut: Future<Output = Result<AuthResponse>> + Send,
{
    let mut req = RequestBuilder::new("Password").with_description(description);
    let mut tries = 1;
    loop {
        let password = ctx.password(req).await?;
        match attempt(password).await {
            Err(Error::Api {
                status: StatusCode::UNAUTHORIZED,
                detail,
            }) if tries < ATTEMPTS => {
                warn!("Sign-in was rejected: {}", detail);
                tries += 1;
                req = RequestBuilder::new("Password")
                    .with_description(description)
                    .with_error(&detail);
            }
            result => return result,
        }
    }
}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::Login)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        form::email(&self.email)?;

        let description = format!(
            "Sign in to {} as {}.",
            *metadata::CLIENT_DISPLAY_NAME,
            self.email
        );
        let client = &ctx.client;
        let email = self.email;
        let resp = authenticate(ctx, &description, |password| {
            api::Login {
                email: email.clone(),
                password,
            }
            .execute(client)
        })
        .await?;

        debug!(
            "Issued a {} token",
            resp.token_type.as_deref().unwrap_or("bearer")
        );
        let name = resp.user.name.clone();
        session::current()?
            .login(resp.access_token, resp.user)
            .await?;
        println!("Welcome back, {name}!");
        Ok(())
    }
}

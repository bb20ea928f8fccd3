// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{
    api::{self, Executor as _},
    error::Result,
    form,
    gate::Destination,
    metadata,
    model::RegisterRequest,
    password::RequestBuilder,
    session,
};

use super::Context;

/// Create an account and sign in with it.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Your full name.
    #[arg(long)]
    name: String,

    /// The e-mail address to sign in with.
    #[arg(long)]
    email: String,

    /// A phone number the advisory service can reach you on.
    #[arg(long)]
    phone: String,

    /// The region your farm is in. Weather advice is based on it.
    #[arg(long)]
    region: String,
}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::Register)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        form::name(&self.name)?;
        form::email(&self.email)?;
        form::phone_number(&self.phone)?;
        form::region(&self.region)?;

        let description = format!(
            "Choose a password of at least {} characters for your {} account.",
            form::PASSWORD_MIN_LEN,
            *metadata::CLIENT_DISPLAY_NAME
        );
        let password = ctx
            .password(RequestBuilder::new("Password").with_description(&description))
            .await?;
        form::password(&password)?;

        let confirmation = ctx
            .password(
                RequestBuilder::new("Confirm password")
                    .with_description("Enter the same password again."),
            )
            .await?;
        form::confirmation(&password, &confirmation)?;

        let resp = api::Register(RegisterRequest {
            name: self.name.trim().to_owned(),
            email: self.email,
            phone_number: self.phone,
            region: self.region.trim().to_owned(),
            password,
        })
        .execute(&ctx.client)
        .await?;

        let name = resp.user.name.clone();
        session::current()?
            .login(resp.access_token, resp.user)
            .await?;
        println!("Your account is ready. Welcome, {name}!");
        Ok(())
    }
}

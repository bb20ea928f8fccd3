// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::debug;

use crate::{
    error::{Error, Result},
    gate::Destination,
    session,
};

use super::Context;

/// Show the profile of the signed-in user.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::Profile)
    }

    async fn execute(self, _ctx: &Context) -> Result<()> {
        let snapshot = session::current()?.snapshot().await;
        debug!(
            "Session is {}, bearer token present: {}",
            snapshot.phase,
            snapshot.token.is_some()
        );

        let user = snapshot
            .user
            .ok_or_else(|| Error::Command("nobody is signed in".to_owned()))?;
        println!("{}", super::table([user]));
        Ok(())
    }
}

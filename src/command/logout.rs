// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{error::Result, gate::Destination, session};

use super::Context;

/// Sign out and forget the stored session.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        None
    }

    async fn execute(self, _ctx: &Context) -> Result<()> {
        session::current()?.logout().await?;
        println!("Signed out.");
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{
    api::{self, Executor as _},
    error::Result,
    gate::Destination,
};

use super::Context;

/// List your most recent diagnoses.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// How many diagnoses to show.
    #[arg(
        long,
        short,
        default_value_t = api::HISTORY_LIMIT_DEFAULT,
        value_parser = clap::value_parser!(u8).range(1..=i64::from(api::HISTORY_LIMIT_MAX)),
    )]
    limit: u8,
}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::History)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let diagnoses = api::History { limit: self.limit }
            .execute(&ctx.client)
            .await?;

        if diagnoses.is_empty() {
            println!("No diagnoses yet. Upload a photo with `predict` to get started.");
        } else {
            println!("{}", super::table(&diagnoses));
        }
        Ok(())
    }
}

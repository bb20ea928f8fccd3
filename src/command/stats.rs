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

/// Summarize your diagnoses.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::Dashboard)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let statistics = api::Statistics.execute(&ctx.client).await?;
        println!("{}", super::table(super::fields(&statistics)));
        Ok(())
    }
}

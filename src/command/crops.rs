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

/// List the crops disease detection knows about.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::Landing)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        for crop in api::GetSupportedCrops.execute(&ctx.client).await?.crops {
            println!("{crop}");
        }
        Ok(())
    }
}

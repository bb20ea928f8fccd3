// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{
    error::Result,
    gate::{self, Destination},
    session,
};

use super::Context;

/// Show what opening a page would do in the current session.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Wait for start-up verification to finish before deciding.
    #[arg(long)]
    wait: bool,

    /// The page path, e.g. /history.
    #[clap()]
    path: String,
}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        None
    }

    async fn execute(self, _ctx: &Context) -> Result<()> {
        let session = session::current()?;
        let phase = if self.wait {
            session.wait_until_settled().await
        } else {
            session.phase()
        };

        println!("{}", gate::decide(phase, Destination::from_path(&self.path)));
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::{Parser, Subcommand};

use crate::{
    api::{self, Executor as _},
    error::Result,
    gate::Destination,
};

use super::Context;

#[derive(Debug, Subcommand)]
enum Action {
    /// Show a single diagnosis with its advisory.
    Show {
        /// The diagnosis identifier, as listed by `history`.
        id: String,
    },
    /// Delete a diagnosis and its uploaded image.
    Delete {
        /// The diagnosis identifier, as listed by `history`.
        id: String,
    },
}

/// Inspect or remove a past diagnosis.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[command(subcommand)]
    action: Action,
}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::History)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        match self.action {
            Action::Show { id } => {
                let diagnosis = api::GetDiagnosis { id }.execute(&ctx.client).await?;
                println!("{}", super::table([&diagnosis]));
                if let Some(serde_json::Value::Object(ref advisory)) = diagnosis.advisory {
                    println!("{}", super::table(super::fields(advisory)));
                }
            }
            Action::Delete { id } => {
                let resp = api::DeleteDiagnosis { id: id.clone() }
                    .execute(&ctx.client)
                    .await?;
                match resp.get("message").and_then(serde_json::Value::as_str) {
                    Some(message) => println!("{message}"),
                    None => println!("Deleted diagnosis {id}."),
                }
            }
        }
        Ok(())
    }
}

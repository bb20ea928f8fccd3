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
    /// Farming advice based on the current weather.
    Weather {
        /// The region to check. Defaults to the region on your profile.
        #[arg(long, short)]
        region: Option<String>,
    },
    /// Treatment and prevention advice for a disease.
    Disease {
        /// The disease name, as reported by a diagnosis.
        name: String,

        /// The affected crop.
        #[arg(long, short, default_value = "General")]
        crop: String,
    },
}

/// Get agricultural advice.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    #[command(subcommand)]
    action: Action,
}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::Advisory)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        match self.action {
            Action::Weather { region } => {
                match (api::Weather { region }).execute(&ctx.client).await? {
                    Some(advice) => println!("{}", super::table([advice])),
                    None => println!("No weather data is available for that region right now."),
                }
            }
            Action::Disease { name, crop } => {
                let advisory = api::DiseaseInfo {
                    name,
                    crop_type: crop,
                }
                .execute(&ctx.client)
                .await?;
                match advisory {
                    serde_json::Value::Object(ref object) => {
                        println!("{}", super::table(super::fields(object)));
                    }
                    ref other => println!("{other}"),
                }
            }
        }
        Ok(())
    }
}

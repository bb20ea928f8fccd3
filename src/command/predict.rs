// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use clap::Parser;
use log::debug;
use tokio::fs;

use crate::{
    api::{self, Executor as _},
    error::{Error, Result},
    gate::Destination,
};

use super::Context;

pub(crate) const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Upload a photo of a crop and diagnose it.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The crop in the photo, e.g. tomato or potato. See `crops` for the
    /// full list.
    #[arg(long, short)]
    crop: String,

    /// A JPEG or PNG image of the affected plant, at most 5 MiB.
    #[arg(value_hint = clap::ValueHint::FilePath)]
    image: PathBuf,
}

struct Upload {
    file_name: String,
    mime: &'static str,
    image: Vec<u8>,
}

async fn load(path: &Path) -> Result<Upload> {
    let mime = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(api::image_mime)
        .ok_or_else(|| {
            Error::Validation(format!("{} is not a JPEG or PNG image", path.display()))
        })?;

    let size = fs::metadata(path).await?.len();
    if size > MAX_IMAGE_BYTES {
        return Err(Error::Validation(format!(
            "{} is {} bytes, but images may be at most {} bytes",
            path.display(),
            size,
            MAX_IMAGE_BYTES
        )));
    }

    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_owned(), |name| name.to_string_lossy().into_owned());
    debug!("Uploading {} ({}, {} bytes)", file_name, mime, size);

    Ok(Upload {
        file_name,
        mime,
        image: fs::read(path).await?,
    })
}

#[async_trait]
impl super::Command for Command {
    fn destination(&self) -> Option<Destination> {
        Some(Destination::Upload)
    }

    async fn execute(self, ctx: &Context) -> Result<()> {
        let crop_type = self.crop.trim().to_lowercase();
        if crop_type.is_empty() {
            return Err(Error::Validation("a crop type is required".to_owned()));
        }

        let upload = load(&self.image).await?;
        let prediction = api::Predict {
            crop_type,
            file_name: upload.file_name,
            mime: upload.mime,
            image: upload.image,
        }
        .execute(&ctx.client)
        .await?;

        println!("{}", super::table([&prediction]));
        if !prediction.advisory.is_empty() {
            println!("{}", super::table(super::fields(&prediction.advisory)));
        }
        Ok(())
    }
}

// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::debug;
use tokio::{fs, io::AsyncWriteExt as _};

use crate::{
    error::{self, Result},
    metadata,
};

use super::{IsPersistent, Storage};

type Entries = BTreeMap<String, String>;

/// Storage backed by a single JSON object on disk, one file per named
/// session.
pub(crate) struct File {
    path: PathBuf,
}

impl File {
    pub(crate) fn new(session: &str) -> Result<Self> {
        let dir = metadata::session_dir().ok_or(error::Storage::NoDirectory)?;
        Ok(Self::with_path(dir.join(format!("{session}.json"))))
    }

    pub(crate) fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }

    async fn load(&self) -> Result<Entries> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                debug!("Session file {} is unreadable: {}", self.path.display(), e);
                error::Storage::Malformed(self.path.display().to_string()).into()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, entries: &Entries) -> Result<()> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut options = fs::OpenOptions::new();
        let _options = options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        let _options = options.mode(0o600);

        let mut file = options.open(&self.path).await?;
        // The mode only applies to files created here.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        file.write_all(&serde_json::to_vec(entries)?).await?;
        file.flush().await?;
        Ok(())
    }
}

impl IsPersistent for File {
    fn is_persistent(&self) -> bool {
        true
    }
}

#[async_trait]
impl Storage for File {
    async fn get(&mut self, key: &str) -> Result<Option<String>> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&mut self, key: &str, value: &str) -> Result<()> {
        // A malformed file is replaced rather than preserved; nothing in it is
        // recoverable anyway.
        let mut entries = self.load().await.unwrap_or_default();
        let _previous = entries.insert(key.to_owned(), value.to_owned());
        self.save(&entries).await
    }

    async fn remove(&mut self, key: &str) -> Result<()> {
        let mut entries = self.load().await.unwrap_or_default();
        let _previous = entries.remove(key);
        self.save(&entries).await
    }
}

// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use directories::ProjectDirs;
use inflector::Inflector;
use once_cell::sync::Lazy;

pub(crate) static CLIENT_TYPE_ID: Lazy<String> =
    Lazy::new(|| option_env!("CARGO_PKG_NAME").unwrap_or("khetai").to_owned());
pub(crate) static CLIENT_DISPLAY_NAME: Lazy<String> = Lazy::new(|| CLIENT_TYPE_ID.to_title_case());
pub(crate) static USER_AGENT: Lazy<String> = Lazy::new(|| {
    format!(
        "{}/{}",
        *CLIENT_TYPE_ID,
        option_env!("CARGO_PKG_VERSION").unwrap_or("0.0.0")
    )
});

pub(crate) static PROJECT_DIRS: Lazy<Option<ProjectDirs>> =
    Lazy::new(|| ProjectDirs::from("com", "KhetAI", &CLIENT_DISPLAY_NAME));

/// Where session-scoped data lives. The runtime directory is cleared when the
/// user's login session ends, which is the closest analogue to a browser tab
/// going away; not every platform has one, so fall back to the data
/// directory.
pub(crate) fn session_dir() -> Option<PathBuf> {
    PROJECT_DIRS.as_ref().map(|dirs| {
        dirs.runtime_dir()
            .unwrap_or_else(|| dirs.data_dir())
            .join("sessions")
    })
}

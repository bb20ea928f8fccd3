// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// The account the current session belongs to, as `auth/me` reports it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Tabled)]
pub(crate) struct UserProfile {
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
    #[tabled(rename = "Email")]
    pub(crate) email: String,
    #[tabled(rename = "Phone")]
    pub(crate) phone_number: String,
    #[tabled(rename = "Region")]
    pub(crate) region: String,
    #[tabled(rename = "Active")]
    pub(crate) is_active: bool,
    #[tabled(rename = "Member Since")]
    #[serde(with = "super::timestamp")]
    pub(crate) created_at: DateTime<Utc>,
}

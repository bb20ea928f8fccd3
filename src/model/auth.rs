// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use super::UserProfile;

fn expose<S: Serializer>(value: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.expose_secret())
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest {
    pub(crate) email: String,
    #[serde(serialize_with = "expose")]
    pub(crate) password: SecretString,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) phone_number: String,
    pub(crate) region: String,
    #[serde(serialize_with = "expose")]
    pub(crate) password: SecretString,
}

/// A freshly issued credential pair from `auth/login` or `auth/register`.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub(crate) access_token: SecretString,
    #[serde(default)]
    pub(crate) token_type: Option<String>,
    pub(crate) user: UserProfile,
}

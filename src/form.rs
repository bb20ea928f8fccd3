// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Checks applied to login and registration input before anything is sent.

use secrecy::{ExposeSecret as _, SecretString};

use crate::error::{Error, Result};

pub(crate) const PASSWORD_MIN_LEN: usize = 6;

fn bounded(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
    let len = value.trim().chars().count();
    if (min..=max).contains(&len) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{field} must be between {min} and {max} characters"
        )))
    }
}

pub(crate) fn name(value: &str) -> Result<()> {
    bounded("name", value, 2, 100)
}

pub(crate) fn region(value: &str) -> Result<()> {
    bounded("region", value, 2, 100)
}

pub(crate) fn email(value: &str) -> Result<()> {
    let valid = value.split_once('@').map_or(false, |(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain.contains('.')
            && domain.split('.').all(|label| !label.is_empty())
            && !value.chars().any(char::is_whitespace)
    });

    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "'{value}' is not a valid e-mail address"
        )))
    }
}

pub(crate) fn phone_number(value: &str) -> Result<()> {
    let allowed = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'));
    if allowed && (10..=15).contains(&value.chars().count()) {
        Ok(())
    } else {
        Err(Error::Validation(
            "phone number must be 10 to 15 digits, spaces or +-() characters".to_owned(),
        ))
    }
}

pub(crate) fn password(value: &SecretString) -> Result<()> {
    if value.expose_secret().chars().count() < PASSWORD_MIN_LEN {
        return Err(Error::Validation(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    Ok(())
}

pub(crate) fn confirmation(password: &SecretString, confirmation: &SecretString) -> Result<()> {
    if password.expose_secret() != confirmation.expose_secret() {
        return Err(Error::Validation("passwords do not match".to_owned()));
    }
    Ok(())
}

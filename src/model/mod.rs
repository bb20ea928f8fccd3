// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Wire models for the KhetAI API.

pub(crate) mod advisory;
pub(crate) mod auth;
pub(crate) mod diagnosis;
mod timestamp;
pub(crate) mod user;

pub(crate) use advisory::WeatherAdvice;
pub(crate) use auth::{AuthResponse, LoginRequest, RegisterRequest};
pub(crate) use diagnosis::{Diagnosis, Prediction, SupportedCrops};
pub(crate) use user::UserProfile;

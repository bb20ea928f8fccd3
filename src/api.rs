// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! Typed descriptions of the KhetAI endpoints. Each one knows how to turn
//! itself into a call on the shared client.

use async_trait::async_trait;
use reqwest::multipart;
use secrecy::SecretString;

use crate::{
    error::Result,
    http,
    model::{
        AuthResponse, Diagnosis, LoginRequest, Prediction, RegisterRequest, SupportedCrops,
        UserProfile, WeatherAdvice,
    },
};

pub(crate) const HISTORY_LIMIT_DEFAULT: u8 = 10;
pub(crate) const HISTORY_LIMIT_MAX: u8 = 50;

#[async_trait]
pub(crate) trait Executor {
    type Response;

    async fn execute(self, client: &http::Client) -> Result<Self::Response>;
}

pub(crate) struct Login {
    pub(crate) email: String,
    pub(crate) password: SecretString,
}

#[async_trait]
impl Executor for Login {
    type Response = AuthResponse;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        let body = LoginRequest {
            email: self.email,
            password: self.password,
        };
        client.post_json(&["auth", "login"], &body).await
    }
}

pub(crate) struct Register(pub(crate) RegisterRequest);

#[async_trait]
impl Executor for Register {
    type Response = AuthResponse;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        client.post_json(&["auth", "register"], &self.0).await
    }
}

/// The verification call: who does the current bearer token belong to?
pub(crate) struct Me;

#[async_trait]
impl Executor for Me {
    type Response = UserProfile;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        client.get(&["auth", "me"]).await
    }
}

pub(crate) struct Predict {
    pub(crate) crop_type: String,
    pub(crate) file_name: String,
    pub(crate) mime: &'static str,
    pub(crate) image: Vec<u8>,
}

#[async_trait]
impl Executor for Predict {
    type Response = Prediction;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        let file = multipart::Part::bytes(self.image)
            .file_name(self.file_name)
            .mime_str(self.mime)?;
        let form = multipart::Form::new()
            .part("file", file)
            .text("crop_type", self.crop_type);
        client.upload(&["disease", "predict"], form).await
    }
}

pub(crate) struct History {
    pub(crate) limit: u8,
}

#[async_trait]
impl Executor for History {
    type Response = Vec<Diagnosis>;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        let limit = self.limit.clamp(1, HISTORY_LIMIT_MAX);
        client
            .get_with_query(&["disease", "history"], &[("limit", limit)])
            .await
    }
}

pub(crate) struct GetDiagnosis {
    pub(crate) id: String,
}

#[async_trait]
impl Executor for GetDiagnosis {
    type Response = Diagnosis;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        client.get(&["disease", "diagnosis", &self.id]).await
    }
}

pub(crate) struct DeleteDiagnosis {
    pub(crate) id: String,
}

#[async_trait]
impl Executor for DeleteDiagnosis {
    type Response = serde_json::Value;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        client.delete(&["disease", "diagnosis", &self.id]).await
    }
}

pub(crate) struct GetSupportedCrops;

#[async_trait]
impl Executor for GetSupportedCrops {
    type Response = SupportedCrops;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        client.get(&["disease", "supported-crops"]).await
    }
}

pub(crate) struct Statistics;

#[async_trait]
impl Executor for Statistics {
    type Response = serde_json::Map<String, serde_json::Value>;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        client.get(&["dashboard", "statistics"]).await
    }
}

pub(crate) struct Weather {
    pub(crate) region: Option<String>,
}

#[async_trait]
impl Executor for Weather {
    type Response = Option<WeatherAdvice>;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        match self.region {
            Some(region) => {
                client
                    .get_with_query(&["advisory", "weather"], &[("region", region)])
                    .await
            }
            None => client.get(&["advisory", "weather"]).await,
        }
    }
}

pub(crate) struct DiseaseInfo {
    pub(crate) name: String,
    pub(crate) crop_type: String,
}

#[async_trait]
impl Executor for DiseaseInfo {
    type Response = serde_json::Value;

    async fn execute(self, client: &http::Client) -> Result<Self::Response> {
        client
            .get_with_query(
                &["advisory", "disease", &self.name],
                &[("crop_type", &self.crop_type)],
            )
            .await
    }
}

/// The image types the prediction endpoint accepts, keyed by extension.
pub(crate) fn image_mime(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The one HTTP client every API call goes through.
//!
//! The client owns a single default `Authorization` header. It is read when a
//! request is built, so a change is visible to every request built afterwards
//! and to none built before. Only the session manager changes it.

use std::sync::{PoisonError, RwLock};

use log::debug;
use reqwest::{
    header::{self, HeaderValue},
    multipart, Method, RequestBuilder, StatusCode,
};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{
    config::Config,
    error::{Error, Result},
    metadata,
};

/// The header value for a bearer token. Marked sensitive so it is redacted
/// from debug output.
pub(crate) fn bearer(token: &SecretString) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))?;
    value.set_sensitive(true);
    Ok(value)
}

pub(crate) struct Client {
    http: reqwest::Client,
    base_url: Url,
    authorization: RwLock<Option<HeaderValue>>,
}

impl Client {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(metadata::USER_AGENT.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            base_url: config.api_url.clone(),
            authorization: RwLock::new(None),
        })
    }

    pub(crate) fn set_authorization(&self, value: HeaderValue) {
        let mut guard = self
            .authorization
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Some(value);
    }

    pub(crate) fn clear_authorization(&self) {
        let mut guard = self
            .authorization
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    pub(crate) fn authorization(&self) -> Option<HeaderValue> {
        self.authorization
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve path segments against the API base URL. Segments are
    /// percent-encoded, so identifiers and disease names can be passed as-is.
    pub(crate) fn url(&self, path: &[&str]) -> Result<Url> {
        let mut resolved = self.base_url.clone();
        _ = resolved
            .path_segments_mut()
            .map_err(|()| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .pop_if_empty()
            .extend(path);
        Ok(resolved)
    }

    /// Start a request carrying whatever authorization is current at this
    /// moment.
    pub(crate) fn request(&self, method: Method, path: &[&str]) -> Result<RequestBuilder> {
        let mut req = self.http.request(method, self.url(path)?);
        if let Some(value) = self.authorization() {
            req = req.header(header::AUTHORIZATION, value);
        }
        Ok(req)
    }

    pub(crate) async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
        let resp = req.send().await?;
        let status = resp.status();
        debug!("{} {}", status, resp.url());

        if status.is_success() {
            return Ok(resp.json().await?);
        }

        let body = resp.text().await.unwrap_or_default();
        Err(Error::Api {
            status,
            detail: error_detail(status, &body),
        })
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        self.send(self.request(Method::GET, path)?).await
    }

    pub(crate) async fn get_with_query<T: DeserializeOwned, Q: Serialize + ?Sized + Sync>(
        &self,
        path: &[&str],
        query: &Q,
    ) -> Result<T> {
        self.send(self.request(Method::GET, path)?.query(query)).await
    }

    pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized + Sync>(
        &self,
        path: &[&str],
        body: &B,
    ) -> Result<T> {
        self.send(self.request(Method::POST, path)?.json(body)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &[&str]) -> Result<T> {
        self.send(self.request(Method::DELETE, path)?).await
    }

    pub(crate) async fn upload<T: DeserializeOwned>(
        &self,
        path: &[&str],
        form: multipart::Form,
    ) -> Result<T> {
        self.send(self.request(Method::POST, path)?.multipart(form))
            .await
    }
}

/// Pull a human-readable message out of an error body. FastAPI puts it in
/// `detail`, either as a string or as a list of validation failures.
fn error_detail(status: StatusCode, body: &str) -> String {
    let fallback = || {
        if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        } else {
            body.trim().to_owned()
        }
    };

    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(body) else {
        return fallback();
    };

    match parsed.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(serde_json::Value::Array(failures)) => {
            let messages = failures
                .iter()
                .filter_map(|failure| failure.get("msg").and_then(serde_json::Value::as_str))
                .collect::<Vec<_>>();
            if messages.is_empty() {
                fallback()
            } else {
                messages.join("; ")
            }
        }
        _ => fallback(),
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Result;

    use super::*;

    fn client() -> Result<Client> {
        Client::new(&Config::new(Url::parse("http://127.0.0.1:8000/api")?))
    }

    #[test]
    fn requests_carry_current_authorization() -> Result<()> {
        let client = client()?;

        let anonymous = client.request(Method::GET, &["auth", "me"])?.build()?;
        assert!(anonymous.headers().get(header::AUTHORIZATION).is_none());
        assert_eq!(anonymous.url().as_str(), "http://127.0.0.1:8000/api/auth/me");

        client.set_authorization(bearer(&SecretString::new("abc".to_owned()))?);
        let authorized = client.request(Method::GET, &["disease", "history"])?.build()?;
        assert_eq!(
            authorized.headers().get(header::AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer abc"))
        );

        client.clear_authorization();
        let cleared = client
            .request(Method::DELETE, &["disease", "diagnosis", "1"])?
            .build()?;
        assert!(cleared.headers().get(header::AUTHORIZATION).is_none());
        Ok(())
    }

    #[test]
    fn built_requests_keep_the_header_they_were_built_with() -> Result<()> {
        let client = client()?;
        client.set_authorization(bearer(&SecretString::new("old".to_owned()))?);
        let in_flight = client.request(Method::GET, &["auth", "me"])?;

        client.set_authorization(bearer(&SecretString::new("new".to_owned()))?);

        assert_eq!(
            in_flight.build()?.headers().get(header::AUTHORIZATION),
            Some(&HeaderValue::from_static("Bearer old"))
        );
        Ok(())
    }

    #[test]
    fn path_segments_are_encoded() -> Result<()> {
        let url = client()?.url(&["advisory", "disease", "Early blight/leaf"])?;
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/api/advisory/disease/Early%20blight%2Fleaf"
        );
        Ok(())
    }

    #[test]
    fn bearer_value_is_sensitive() -> Result<()> {
        let value = bearer(&SecretString::new("abc".to_owned()))?;
        assert!(value.is_sensitive());
        assert!(bearer(&SecretString::new("bad\ntoken".to_owned())).is_err());
        Ok(())
    }

    #[test]
    fn error_detail_prefers_server_message() {
        assert_eq!(
            error_detail(StatusCode::UNAUTHORIZED, r#"{"detail":"Could not validate credentials"}"#),
            "Could not validate credentials"
        );
        assert_eq!(
            error_detail(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"}]}"#
            ),
            "value is not a valid email address"
        );
        assert_eq!(error_detail(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(error_detail(StatusCode::BAD_GATEWAY, "upstream down\n"), "upstream down");
    }
}

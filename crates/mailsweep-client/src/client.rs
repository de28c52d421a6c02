//! reqwest-backed [`TriageService`].

use mailsweep_core::{
    AnalysisReport, DeleteStatus, FetchQuery, FetchedMessages, Message, MessageId,
    RecentSnapshot, ServiceError, ServiceResult, TriageService,
};
use reqwest::header::{COOKIE, HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, Response, StatusCode, redirect};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::{ClientConfig, SESSION_COOKIE};
use crate::error::{Error, Result};
use crate::wire::{
    AnalyzeBody, AnalyzeResponse, AuthStatus, DeleteResponse, ErrorBody, FetchBody, FetchResponse,
    RecentResponse, is_not_found,
};

/// Talks to the triage service over HTTP.
///
/// Every request carries the session cookie. Redirects are never followed,
/// so an expired session surfaces as a status instead of a login page.
#[derive(Debug, Clone)]
pub struct HttpTriageService {
    http: Client,
    config: ClientConfig,
}

impl HttpTriageService {
    /// Builds the HTTP client for `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cookie is not a valid header value or
    /// the client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = &config.session_cookie {
            let mut value = HeaderValue::from_str(&format!("{SESSION_COOKIE}={cookie}"))
                .map_err(|e| Error::InvalidConfig(format!("invalid session cookie: {e}")))?;
            value.set_sensitive(true);
            headers.insert(COOKIE, value);
        }

        let mut builder = Client::builder()
            .user_agent(concat!("mailsweep/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .cookie_store(true)
            .redirect(redirect::Policy::none());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(&self, request: RequestBuilder) -> ServiceResult<Response> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        debug!("{} {}", status.as_u16(), response.url().path());

        if status.is_success() {
            Ok(response)
        } else {
            Err(status_error(response).await)
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ServiceResult<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }
}

impl TriageService for HttpTriageService {
    async fn check_auth(&self) -> ServiceResult<()> {
        let url = self.config.endpoint(&["check-auth"]);
        let status: AuthStatus = self.send_json(self.http.get(url)).await?;
        if status.authenticated {
            Ok(())
        } else {
            Err(ServiceError::Unauthorized)
        }
    }

    async fn fetch(&self, query: &FetchQuery) -> ServiceResult<FetchedMessages> {
        let url = self.config.endpoint(&["api", "emails", "fetch"]);
        let body = FetchBody::from(query);
        let response: FetchResponse = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(response.into())
    }

    async fn analyze(&self, messages: &[Message]) -> ServiceResult<AnalysisReport> {
        let url = self.config.endpoint(&["api", "emails", "analyze"]);
        let body = AnalyzeBody { emails: messages };
        let response: AnalyzeResponse = self.send_json(self.http.post(url).json(&body)).await?;
        Ok(response.into())
    }

    async fn delete(&self, id: &MessageId) -> ServiceResult<DeleteStatus> {
        let url = self
            .config
            .endpoint(&["api", "emails", id.as_str(), "delete"]);

        match self.send_json::<DeleteResponse>(self.http.delete(url)).await {
            Ok(response) if response.success => Ok(DeleteStatus::Deleted),
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| "delete was not confirmed".into());
                if is_not_found(&message) {
                    Ok(DeleteStatus::AlreadyGone)
                } else {
                    Err(ServiceError::Status {
                        status: StatusCode::OK.as_u16(),
                        message,
                    })
                }
            }
            Err(ServiceError::NotFound) => Ok(DeleteStatus::AlreadyGone),
            Err(ServiceError::Status { message, .. }) if is_not_found(&message) => {
                debug!("Email {id} was already deleted");
                Ok(DeleteStatus::AlreadyGone)
            }
            Err(e) => Err(e),
        }
    }

    async fn recent(&self) -> ServiceResult<RecentSnapshot> {
        let url = self.config.endpoint(&["api", "emails"]);
        let response: RecentResponse = self.send_json(self.http.get(url)).await?;
        Ok(response.into())
    }

    async fn logout(&self) -> ServiceResult<()> {
        let url = self.config.endpoint(&["logout"]);
        let response = self.http.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }

    fn login_url(&self) -> String {
        self.config.login_url().to_string()
    }
}

fn transport(error: reqwest::Error) -> ServiceError {
    if error.is_decode() {
        ServiceError::InvalidResponse(error.to_string())
    } else {
        warn!("Request failed: {error}");
        ServiceError::Transport(error.to_string())
    }
}

async fn status_error(response: Response) -> ServiceError {
    let status = response.status();
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::Unauthorized,
        StatusCode::NOT_FOUND => ServiceError::NotFound,
        _ => {
            let message = response
                .text()
                .await
                .ok()
                .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
                .and_then(ErrorBody::into_message)
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            ServiceError::Status {
                status: status.as_u16(),
                message,
            }
        }
    }
}

//! HTTP implementation of [`Api`] for the TaskFlow backend.
//!
//! Endpoint layout follows the backend's `/api/v1/` router: task CRUD on
//! `tasks/` (with a `complete/` action), invite info and joining on
//! `teams/{id}/`. Timeouts are the transport's: an expired request comes
//! back as a plain [`ApiError::Network`].

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use taskflow_proto::task::TaskListResponse;
use taskflow_proto::team::{JoinResponse, TeamId};

use crate::cache::{ResourceKey, ResourceKind, ResourceValue};
use crate::error::ApiError;

use super::{Api, MutationOutcome, MutationRequest};

/// Reqwest-backed TaskFlow API client.
pub struct HttpApi {
    client: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl HttpApi {
    /// Creates a client against `base` with the given request timeout.
    ///
    /// When `token` is present it is sent as a bearer `Authorization`
    /// header on every request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the underlying client cannot be
    /// constructed.
    pub fn new(base: Url, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base,
            token,
        })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        // Url::join drops the last base segment unless the base ends in a
        // slash, so anchor every path on a normalized base.
        let mut base = self.base.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        base.join(path)
            .map_err(|e| ApiError::Network(format!("invalid request url: {e}")))
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let text = self.send_text(builder).await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn send_text(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(error_from_body(status, &text))
        }
    }

    async fn fetch_task_list(&self, key: &ResourceKey) -> Result<ResourceValue, ApiError> {
        let url = self.url("api/v1/tasks/")?;
        let query: Vec<(&str, &str)> = key.params().collect();
        let list: TaskListResponse = self
            .send_json(self.client.get(url).query(&query))
            .await?;
        Ok(ResourceValue::Tasks(list.into_tasks()))
    }

    async fn fetch_invite_info(&self, key: &ResourceKey) -> Result<ResourceValue, ApiError> {
        let team = key
            .team()
            .ok_or_else(|| ApiError::Guard("invite-info key missing team id".to_string()))?;
        let url = self.url(&format!("api/v1/teams/{team}/invite-info/"))?;
        let info = self.send_json(self.client.get(url)).await?;
        Ok(ResourceValue::Invite(info))
    }

    async fn join_team(&self, team: TeamId) -> Result<MutationOutcome, ApiError> {
        let url = self.url(&format!("api/v1/teams/{team}/join/"))?;
        let text = self.send_text(self.client.post(url)).await?;
        // The join endpoint may reply with an empty body.
        let response: JoinResponse = if text.trim().is_empty() {
            JoinResponse::default()
        } else {
            serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?
        };
        Ok(MutationOutcome::Joined {
            detail: response.detail,
        })
    }
}

impl Api for HttpApi {
    async fn fetch(&self, key: &ResourceKey) -> Result<ResourceValue, ApiError> {
        match key.kind() {
            ResourceKind::TaskList => self.fetch_task_list(key).await,
            ResourceKind::InviteInfo => self.fetch_invite_info(key).await,
        }
    }

    async fn execute(&self, request: &MutationRequest) -> Result<MutationOutcome, ApiError> {
        match request {
            MutationRequest::CreateTask(payload) => {
                let url = self.url("api/v1/tasks/")?;
                let task = self.send_json(self.client.post(url).json(payload)).await?;
                Ok(MutationOutcome::Task(task))
            }
            MutationRequest::UpdateTask { id, patch } => {
                let url = self.url(&format!("api/v1/tasks/{id}/"))?;
                let task = self.send_json(self.client.patch(url).json(patch)).await?;
                Ok(MutationOutcome::Task(task))
            }
            MutationRequest::CompleteTask { id } => {
                let url = self.url(&format!("api/v1/tasks/{id}/complete/"))?;
                let task = self.send_json(self.client.post(url)).await?;
                Ok(MutationOutcome::Task(task))
            }
            MutationRequest::DeleteTask { id } => {
                let url = self.url(&format!("api/v1/tasks/{id}/"))?;
                self.send_text(self.client.delete(url)).await?;
                Ok(MutationOutcome::Deleted)
            }
            MutationRequest::JoinTeam { team } => self.join_team(*team).await,
        }
    }
}

/// Builds an [`ApiError`] from a non-success response body.
fn error_from_body(status: StatusCode, text: &str) -> ApiError {
    let body = serde_json::from_str(text).ok();
    ApiError::Api {
        status: status.as_u16(),
        body,
    }
}

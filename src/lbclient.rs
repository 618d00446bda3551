//! Client for the learnboard HTTP API.
//!
//! [`ProgressStore`] is the client's copy of one user's progress. Every
//! operation either replaces the copy wholesale with what the server sent
//! back, or records a message in `error` and leaves the copy alone.
//! Nothing is retried.

use anyhow::{Context, Result, anyhow};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::models::{
    ErrorBody, LeaderboardEntry, LeaderboardEnvelope, ProgressEnvelope, ProgressSnapshot,
    RegisterRequest, RegisterResponse, UpdateAction, UpdateRequest,
};

/// Reads a JSON body, turning non-2xx responses into an error carrying the
/// server's `{ "error": ... }` message when there is one.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .context("Couldn't deserialize the server's response.");
    }

    let message = response
        .json::<ErrorBody>()
        .await
        .map(|body| body.error)
        .unwrap_or_else(|_| String::from("no details"));

    Err(anyhow!("Request failed ({status}): {message}"))
}

/// Registers a new account and returns the server's confirmation.
pub async fn register(base_url: &str, name: &str, email: &str, password: &str) -> Result<RegisterResponse> {
    let body = RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };

    let response = Client::new()
        .post(format!("{base_url}/api/auth/register"))
        .json(&body)
        .send()
        .await
        .context("Could not reach the learnboard server.")?;

    read_json(response).await
}

/// Fetches the top `limit` users.
pub async fn fetch_leaderboard(base_url: &str, limit: usize) -> Result<Vec<LeaderboardEntry>> {
    let response = Client::new()
        .get(format!("{base_url}/api/leaderboard"))
        .query(&[("limit", limit)])
        .send()
        .await
        .context("Could not reach the learnboard server.")?;

    Ok(read_json::<LeaderboardEnvelope>(response).await?.leaderboard)
}

pub struct ProgressStore {
    http: Client,
    base_url: String,
    user_id: String,

    progress: Option<ProgressSnapshot>,
    error: Option<String>,
}

impl ProgressStore {
    pub fn new(base_url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user_id: user_id.into(),
            progress: None,
            error: None,
        }
    }

    /// The last snapshot the server sent, if any.
    pub fn progress(&self) -> Option<&ProgressSnapshot> {
        self.progress.as_ref()
    }

    /// Message from the most recent failed operation, cleared on success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Replaces local state with the server's current snapshot.
    pub async fn refresh_progress(&mut self) -> Option<&ProgressSnapshot> {
        let result = self.fetch_progress().await;
        self.settle("refresh_progress", result)
    }

    pub async fn complete_lesson(&mut self, lesson_id: &str, points: Option<u32>) -> Option<&ProgressSnapshot> {
        self.update(UpdateAction::CompleteLesson, lesson_id, points).await
    }

    pub async fn complete_exercise(&mut self, exercise_id: &str, points: Option<u32>) -> Option<&ProgressSnapshot> {
        self.update(UpdateAction::CompleteExercise, exercise_id, points).await
    }

    pub async fn earn_achievement(&mut self, achievement_id: &str, points: Option<u32>) -> Option<&ProgressSnapshot> {
        self.update(UpdateAction::EarnAchievement, achievement_id, points).await
    }

    async fn update(&mut self, action: UpdateAction, item_id: &str, points: Option<u32>) -> Option<&ProgressSnapshot> {
        let request = UpdateRequest {
            user_id: self.user_id.clone(),
            action,
            item_id: item_id.to_string(),
            points,
        };

        let result = self.post_update(&request).await;
        self.settle("update", result)
    }

    async fn fetch_progress(&self) -> Result<ProgressSnapshot> {
        let response = self
            .http
            .get(format!("{}/api/progress", self.base_url))
            .query(&[("userId", &self.user_id)])
            .send()
            .await
            .context("Could not reach the learnboard server.")?;

        Ok(read_json::<ProgressEnvelope>(response).await?.progress)
    }

    async fn post_update(&self, request: &UpdateRequest) -> Result<ProgressSnapshot> {
        let response = self
            .http
            .post(format!("{}/api/progress/update", self.base_url))
            .json(request)
            .send()
            .await
            .context("Could not reach the learnboard server.")?;

        Ok(read_json::<ProgressEnvelope>(response).await?.progress)
    }

    /// Applies the outcome of one round-trip to local state.
    fn settle(&mut self, operation: &str, result: Result<ProgressSnapshot>) -> Option<&ProgressSnapshot> {
        match result {
            Ok(snapshot) => {
                self.error = None;
                self.progress = Some(snapshot);
            }
            Err(err) => {
                log::error!("[ProgressStore::{operation}] {err:#}");
                self.error = Some(format!("{err:#}"));
            }
        }

        self.progress.as_ref()
    }
}

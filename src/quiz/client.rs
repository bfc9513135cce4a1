use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};

use crate::quiz::{QuizError, QuizPayload};

/// Something that can produce a quiz for a topic.
#[async_trait]
pub trait QuizSource: Send + Sync {
    async fn fetch_quiz(&self, topic: &str) -> Result<QuizPayload, QuizError>;
}

/// HTTP client for the quiz-generation service (`GET {base}/getQuiz?topic=`).
pub struct QuizClient {
    client: Client,
    endpoint: Url,
}

impl QuizClient {
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self, QuizError> {
        let endpoint = format!("{}/getQuiz", base_url.as_str().trim_end_matches('/'));
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| QuizError::Transport(format!("Invalid endpoint {}: {}", endpoint, e)))?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuizError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    pub fn url_for(&self, topic: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().clear().append_pair("topic", topic);
        url
    }
}

#[async_trait]
impl QuizSource for QuizClient {
    async fn fetch_quiz(&self, topic: &str) -> Result<QuizPayload, QuizError> {
        let url = self.url_for(topic);
        debug!("Requesting quiz: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                QuizError::Transport(format!("Request timeout: {}", e))
            } else if e.is_connect() {
                QuizError::Transport(format!("Connection failed: {}", e))
            } else {
                QuizError::Transport(format!("Request failed: {}", e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| QuizError::Transport(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(QuizError::Transport(format!("HTTP {}", status)));
        }

        debug!("Quiz service answered with {} bytes", body.len());
        QuizPayload::from_json(&body)
    }
}

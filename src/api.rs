//! Summarization via an OpenAI-compatible chat completions API.
//!
//! The pipeline only needs one narrow capability from the language model:
//! `summarize(text) -> summary + usage details`. That seam is the
//! [`Summarize`] trait; [`OpenAiSummarizer`] is the concrete HTTP client
//! and [`RetrySummarize`] is a decorator that adds an explicit retry
//! policy around any implementation.
//!
//! # Retry Strategy
//!
//! - Exponential backoff starting at the configured base delay
//! - Delay capped at 60 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::models::SummaryOutcome;
use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, instrument, warn};

/// System prompt sent with every summarization request.
const SUMMARY_PROMPT: &str = "As a helpful AI assistant, your task will be to summarize text from a news article, \
which may contain incomplete sentences, HTML tags, and non-textual elements. \
Begin by cleansing the text of any irrelevant content or formatting issues. \
Then, craft a concise, neutral summary of the main news article, highlighting key \
facts: who, what, when, where, and why. Aim for a one-paragraph summary without \
editorializing or subjective interpretation. Adhere strictly to these instructions for an accurate, unbiased summary.";

/// Async summarization seam.
pub trait Summarize {
    async fn summarize(&self, text: &str) -> Result<SummaryOutcome, Box<dyn Error>>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    prompt_tokens: u32,
}

impl ChatResponse {
    /// Flatten the completion into the record fields we persist. Token
    /// counts are zero when the API omits usage metadata.
    fn into_outcome(self) -> SummaryOutcome {
        let usage = self.usage.unwrap_or_default();
        let (article_summary, finish_reason) = match self.choices.into_iter().next() {
            Some(choice) => (choice.message.content, choice.finish_reason),
            None => (None, None),
        };
        SummaryOutcome {
            article_summary,
            finish_reason,
            total_tokens: usage.total_tokens,
            completion_tokens: usage.completion_tokens,
            prompt_tokens: usage.prompt_tokens,
            time_created: self.created,
            model: self.model,
        }
    }
}

/// Chat completions client for any OpenAI-compatible endpoint.
pub struct OpenAiSummarizer {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

impl fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl Summarize for OpenAiSummarizer {
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, text: &str) -> Result<SummaryOutcome, Box<dyn Error>> {
        let user_content = format!("Article text: {text}.");
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SUMMARY_PROMPT,
                },
                Message {
                    role: "user",
                    content: &user_content,
                },
            ],
            temperature: 0.0,
        };

        let t0 = Instant::now();
        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        info!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            model = response.model.as_deref().unwrap_or("unknown"),
            "Summarization call succeeded"
        );
        Ok(response.into_outcome())
    }
}

/// Pre-jitter backoff delay for the given 1-based attempt number.
fn backoff_delay(attempt: usize, base: Duration, max: Duration) -> Duration {
    let delay = base.saturating_mul(1 << (attempt - 1).min(31));
    delay.min(max)
}

/// Decorator adding exponential-backoff retries to any [`Summarize`].
pub struct RetrySummarize<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetrySummarize<T>
where
    T: Summarize,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl<T> fmt::Debug for RetrySummarize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySummarize")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Summarize for RetrySummarize<T>
where
    T: Summarize,
{
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, text: &str) -> Result<SummaryOutcome, Box<dyn Error>> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.summarize(text).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        warn!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "summarize() exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter = Duration::from_millis(rng().random_range(0..=250));
                    let delay = backoff_delay(attempt, self.base_delay, self.max_delay) + jitter;
                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "summarize() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_backoff_delay_doubles_then_caps() {
        let base = Duration::from_secs(1);
        let max = Duration::from_secs(60);
        assert_eq!(backoff_delay(1, base, max), Duration::from_secs(1));
        assert_eq!(backoff_delay(2, base, max), Duration::from_secs(2));
        assert_eq!(backoff_delay(3, base, max), Duration::from_secs(4));
        assert_eq!(backoff_delay(7, base, max), Duration::from_secs(60));
        assert_eq!(backoff_delay(40, base, max), Duration::from_secs(60));
    }

    #[test]
    fn test_chat_response_parses_into_outcome() {
        let body = r#"{
            "choices": [
                {"message": {"content": "A tidy summary."}, "finish_reason": "stop"}
            ],
            "usage": {"total_tokens": 120, "completion_tokens": 40, "prompt_tokens": 80},
            "created": 1700000000,
            "model": "gpt-3.5-turbo"
        }"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let outcome = response.into_outcome();
        assert_eq!(outcome.article_summary.as_deref(), Some("A tidy summary."));
        assert_eq!(outcome.finish_reason.as_deref(), Some("stop"));
        assert_eq!(outcome.total_tokens, 120);
        assert_eq!(outcome.prompt_tokens, 80);
        assert_eq!(outcome.time_created, Some(1_700_000_000));
    }

    #[test]
    fn test_chat_response_without_usage_defaults_to_zero() {
        let body = r#"{"choices": [{"message": {"content": "s"}}]}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        let outcome = response.into_outcome();
        assert_eq!(outcome.total_tokens, 0);
        assert_eq!(outcome.finish_reason, None);
    }

    /// Fails a fixed number of times before succeeding, counting calls.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl Summarize for Flaky {
        async fn summarize(&self, _text: &str) -> Result<SummaryOutcome, Box<dyn Error>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err("transient".into())
            } else {
                Ok(SummaryOutcome {
                    article_summary: Some("ok".to_string()),
                    ..Default::default()
                })
            }
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let inner = Flaky {
            failures: 2,
            calls: AtomicUsize::new(0),
        };
        let retry = RetrySummarize::new(inner, 5, Duration::ZERO);
        let outcome = retry.summarize("text").await.unwrap();
        assert_eq!(outcome.article_summary.as_deref(), Some("ok"));
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let inner = Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        };
        let retry = RetrySummarize::new(inner, 2, Duration::ZERO);
        assert!(retry.summarize("text").await.is_err());
        // Initial attempt plus two retries.
        assert_eq!(retry.inner.calls.load(Ordering::SeqCst), 3);
    }
}

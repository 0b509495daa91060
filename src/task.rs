//! Asynchronous task-based generation: create a task, then poll its status until it
//! completes, fails, or runs out of time.
//!
//! The wait loop is an explicit state machine driven by [`TaskPoller`]. Both the clock and
//! the status query are injected, so the transition and timeout rules can be exercised
//! without sleeping or touching the network.

use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::{Duration, Instant, sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{GenerationError, Result};
use crate::request::{GenerationRequest, build_task_request};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Lifecycle of one provider task as seen from this side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskState {
    Submitted,
    Running,
    Completed(Vec<String>),
    Failed,
    TimedOut,
}

/// What a single status query reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusReport {
    Completed(Vec<String>),
    Failed,
    /// Any other provider status, e.g. `pending`, `processing` or `staged`.
    InProgress(String),
}

impl StatusReport {
    fn from_provider(status: &str, image_urls: Vec<String>) -> Self {
        match status {
            "completed" => StatusReport::Completed(image_urls),
            "failed" => StatusReport::Failed,
            other => StatusReport::InProgress(other.to_string()),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusReport::Completed(urls) => write!(f, "completed with {} image(s)", urls.len()),
            StatusReport::Failed => f.write_str("failed"),
            StatusReport::InProgress(status) => write!(f, "status {status}"),
        }
    }
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed(_) | TaskState::Failed | TaskState::TimedOut
        )
    }

    /// Applies a status report. Terminal states never change.
    pub fn on_report(self, report: StatusReport) -> Self {
        if self.is_terminal() {
            return self;
        }
        match report {
            StatusReport::Completed(urls) => TaskState::Completed(urls),
            StatusReport::Failed => TaskState::Failed,
            StatusReport::InProgress(_) => TaskState::Running,
        }
    }

    /// The local wall-clock budget ran out.
    pub fn on_deadline(self) -> Self {
        if self.is_terminal() {
            return self;
        }
        TaskState::TimedOut
    }
}

/// Time source for the poll loop.
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    async fn sleep(&self, duration: Duration);
}

/// Real time through tokio.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        sleep(duration).await;
    }
}

/// Anything that can report a task's status by id.
#[async_trait]
pub trait TaskStatusSource: Send + Sync {
    async fn fetch_status(&self, task_id: &str) -> Result<StatusReport>;
}

/// Polls on a fixed interval until a terminal state. No backoff, no attempt cap beyond the
/// wall-clock budget, and no cancellation request to the provider on timeout.
#[derive(Clone, Debug)]
pub struct TaskPoller<C = TokioClock> {
    clock: C,
    interval: Duration,
    timeout: Duration,
}

impl TaskPoller<TokioClock> {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self::with_clock(TokioClock, interval, timeout)
    }
}

impl Default for TaskPoller<TokioClock> {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL, DEFAULT_TIMEOUT)
    }
}

impl<C: Clock> TaskPoller<C> {
    pub fn with_clock(clock: C, interval: Duration, timeout: Duration) -> Self {
        Self {
            clock,
            interval,
            timeout,
        }
    }

    /// Waits for `task_id` to finish and returns its image URLs. The budget counts from
    /// the moment this is called, right after the task was created.
    pub async fn wait_for<S>(&self, source: &S, task_id: &str) -> Result<Vec<String>>
    where
        S: TaskStatusSource + ?Sized,
    {
        let started = self.clock.now();
        let mut state = TaskState::Submitted;
        let mut poll_count = 0u32;

        loop {
            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= self.timeout {
                state = state.on_deadline();
            } else {
                poll_count += 1;
                // a status query may not outlive the remaining budget
                let remaining = self.timeout - elapsed;
                let Ok(report) = timeout(remaining, source.fetch_status(task_id)).await else {
                    let elapsed = self.clock.now().saturating_duration_since(started);
                    warn!("task {task_id}: poll {poll_count} still pending when the budget ran out");
                    return Err(GenerationError::Timeout {
                        task_id: task_id.to_string(),
                        elapsed,
                    });
                };
                let report = report?;
                debug!("task {task_id}: poll {poll_count} reported {report}");
                state = state.on_report(report);
            }

            state = match state {
                TaskState::Completed(urls) => {
                    info!(
                        "task {task_id} completed after {poll_count} poll(s) with {} image(s)",
                        urls.len()
                    );
                    return Ok(urls);
                }
                TaskState::Failed => {
                    warn!("task {task_id} failed after {poll_count} poll(s)");
                    return Err(GenerationError::TaskFailed {
                        task_id: task_id.to_string(),
                    });
                }
                TaskState::TimedOut => {
                    warn!("task {task_id} timed out after {poll_count} poll(s)");
                    return Err(GenerationError::Timeout {
                        task_id: task_id.to_string(),
                        elapsed,
                    });
                }
                pending => {
                    self.clock.sleep(self.interval).await;
                    pending
                }
            };
        }
    }
}

pub const TASK_API_BASE_URL: &str = "https://api.goapi.ai";

/// HTTP client for the task-based image API.
#[derive(Clone, Debug)]
pub struct TaskClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct TaskEnvelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    #[serde(default)]
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskStatusData {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    output: Option<TaskOutput>,
}

#[derive(Debug, Default, Deserialize)]
struct TaskOutput {
    #[serde(default)]
    image_urls: Vec<String>,
}

async fn assert_ok_response(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let message = response.text().await.unwrap_or_default();
    Err(GenerationError::Api { status, message })
}

impl TaskClient {
    /// Pooled connections are disabled: creation and every status query each open their own.
    /// No single call may take longer than `request_timeout`.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn tasks_url(&self) -> String {
        format!("{}/api/v1/task", self.base_url)
    }

    /// Creates a task and returns the provider's opaque id.
    pub async fn create_task(&self, request: &GenerationRequest) -> Result<String> {
        let body = build_task_request(request);
        let response = self
            .client
            .post(self.tasks_url())
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response = assert_ok_response(response).await?;
        let payload: TaskEnvelope<CreatedTask> = response.json().await?;
        let task_id = payload
            .data
            .and_then(|data| data.task_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| GenerationError::UnexpectedResponse("no task_id returned".into()))?;
        info!("created task {task_id}");
        Ok(task_id)
    }

    /// Creates the task and blocks on it until it is terminal.
    pub async fn generate<C: Clock>(
        &self,
        request: &GenerationRequest,
        poller: &TaskPoller<C>,
    ) -> Result<Vec<String>> {
        let task_id = self.create_task(request).await?;
        poller.wait_for(self, &task_id).await
    }
}

#[async_trait]
impl TaskStatusSource for TaskClient {
    async fn fetch_status(&self, task_id: &str) -> Result<StatusReport> {
        let response = self
            .client
            .get(format!("{}/{task_id}", self.tasks_url()))
            .header("x-api-key", &self.api_key)
            .send()
            .await?;
        let response = assert_ok_response(response).await?;
        let payload: TaskEnvelope<TaskStatusData> = response.json().await?;
        let data = payload
            .data
            .ok_or_else(|| GenerationError::UnexpectedResponse("no task data returned".into()))?;
        let status = data.status.ok_or_else(|| {
            GenerationError::UnexpectedResponse(format!("no status for task {task_id}"))
        })?;
        let image_urls = data.output.unwrap_or_default().image_urls;
        Ok(StatusReport::from_provider(&status, image_urls))
    }
}

//! Client side of the fal.ai queue: submit a job, poll its status (collecting
//! the progress logs on the way) and fetch the result once it completed.

use std::time::Duration;

use async_stream::try_stream;
use color_eyre::Result;
use log::debug;
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::time::sleep;
use tokio_stream::Stream;

mod error;
pub use error::FalApiError;

use crate::image_model::GenerationResponse;

pub const QUEUE_URL: &str = "https://queue.fal.run";
const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestBody {
    pub prompt: String,
    pub num_images: usize,
}

#[derive(Debug)]
pub enum QueueEvent {
    Queued { position: Option<u64> },
    /// A progress line reported by the backend. Purely diagnostic.
    Log(String),
    Completed(GenerationResponse),
}

#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub request_id: String,
    pub status_url: String,
    pub response_url: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub queue_position: Option<u64>,
    #[serde(default)]
    pub logs: Option<Vec<LogLine>>,
}

#[derive(Debug, Deserialize)]
pub struct LogLine {
    pub message: String,
}

pub fn submit_url(model_id: &str) -> String {
    format!("{QUEUE_URL}/{model_id}")
}

/// Runs one queued generation to completion. The stream ends after
/// [`QueueEvent::Completed`] or the first error.
pub fn subscribe(
    model_id: String,
    body: RequestBody,
    api_key: String,
    client: Client,
) -> impl Stream<Item = Result<QueueEvent>> {
    try_stream! {
        let auth = format!("Key {api_key}");
        let res = client
            .post(submit_url(&model_id))
            .header(header::AUTHORIZATION, &auth)
            .json(&body)
            .send()
            .await?;
        // the queue serves nested model ids under different paths, so only
        // the returned urls are used from here on
        let submitted: SubmitResponse = parse_json(res).await?;
        debug!("Submitted fal request {}", submitted.request_id);

        let mut seen_logs = 0;
        loop {
            let res = client
                .get(&submitted.status_url)
                .query(&[("logs", "1")])
                .header(header::AUTHORIZATION, &auth)
                .send()
                .await?;
            let status: StatusResponse = parse_json(res).await?;

            let step = poll_step(seen_logs, status)?;
            seen_logs += step.logs.len();
            for line in step.logs {
                yield QueueEvent::Log(line);
            }

            match step.next {
                Next::Queued { position } => {
                    yield QueueEvent::Queued { position };
                    sleep(POLL_INTERVAL).await;
                }
                Next::Running => sleep(POLL_INTERVAL).await,
                Next::Completed => {
                    let res = client
                        .get(&submitted.response_url)
                        .header(header::AUTHORIZATION, &auth)
                        .send()
                        .await?;
                    let response: GenerationResponse = parse_json(res).await?;
                    yield QueueEvent::Completed(response);
                    break;
                }
            }
        }
    }
}

/// What a single status answer means for the poll loop.
#[derive(Debug, PartialEq, Eq)]
pub struct PollStep {
    /// Log lines not reported by an earlier answer.
    pub logs: Vec<String>,
    pub next: Next,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    Queued { position: Option<u64> },
    Running,
    Completed,
}

/// Interprets one status answer, given how many log lines earlier answers
/// carried. fal reports logs cumulatively.
pub fn poll_step(seen_logs: usize, status: StatusResponse) -> Result<PollStep, FalApiError> {
    let logs = status
        .logs
        .unwrap_or_default()
        .into_iter()
        .skip(seen_logs)
        .map(|line| line.message)
        .collect();

    let next = match status.status.as_str() {
        "IN_QUEUE" => Next::Queued {
            position: status.queue_position,
        },
        "IN_PROGRESS" => Next::Running,
        "COMPLETED" => Next::Completed,
        other => {
            return Err(FalApiError::GenerationFailed {
                status: other.to_string(),
            });
        }
    };
    Ok(PollStep { logs, next })
}

async fn parse_json<T: DeserializeOwned>(res: Response) -> Result<T> {
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(FalApiError::from_status(status.as_u16(), &body).into());
    }
    Ok(serde_json::from_str(&body)?)
}

#[cfg(test)]
mod test {
    use expect_test::expect;

    use super::*;

    #[test]
    fn request_serialization() {
        let body = RequestBody {
            prompt: "a red fox in snow".into(),
            num_images: 4,
        };

        let expect = expect![[r#"{"prompt":"a red fox in snow","num_images":4}"#]];
        expect.assert_eq(&serde_json::to_string(&body).unwrap());
    }

    #[test]
    fn submit_url_keeps_nested_ids() {
        assert_eq!(
            submit_url("fal-ai/flux/schnell"),
            "https://queue.fal.run/fal-ai/flux/schnell"
        );
    }

    #[test]
    fn submit_response_deserialization() {
        let resp: SubmitResponse = serde_json::from_str(
            r#"{
                "request_id": "abc-123",
                "status_url": "https://queue.fal.run/fal-ai/fast-sdxl/requests/abc-123/status",
                "response_url": "https://queue.fal.run/fal-ai/fast-sdxl/requests/abc-123",
                "queue_position": 0
            }"#,
        )
        .unwrap();
        assert_eq!(resp.request_id, "abc-123");
        assert!(resp.status_url.ends_with("/status"));
    }

    #[test]
    fn status_with_logs() {
        let status: StatusResponse = serde_json::from_str(
            r#"{
                "status": "IN_PROGRESS",
                "logs": [
                    {"message": "loading model", "level": "INFO", "timestamp": "2024-01-01T00:00:00"},
                    {"message": "step 1/25", "level": "INFO", "timestamp": "2024-01-01T00:00:01"}
                ]
            }"#,
        )
        .unwrap();
        let messages: Vec<_> = status
            .logs
            .unwrap()
            .into_iter()
            .map(|l| l.message)
            .collect();
        assert_eq!(messages, ["loading model", "step 1/25"]);
        assert_eq!(status.queue_position, None);
    }

    #[test]
    fn status_without_logs() {
        let status: StatusResponse =
            serde_json::from_str(r#"{"status": "IN_QUEUE", "queue_position": 3}"#).unwrap();
        assert_eq!(status.status, "IN_QUEUE");
        assert_eq!(status.queue_position, Some(3));
        assert!(status.logs.is_none());
    }

    fn status(json: &str) -> StatusResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn cumulative_logs_are_reported_once() {
        let answers = [
            r#"{"status": "IN_QUEUE", "queue_position": 1}"#,
            r#"{"status": "IN_PROGRESS", "logs": [{"message": "loading model"}]}"#,
            r#"{"status": "IN_PROGRESS", "logs": [{"message": "loading model"}, {"message": "step 1/25"}]}"#,
            r#"{"status": "COMPLETED", "logs": [{"message": "loading model"}, {"message": "step 1/25"}, {"message": "done"}]}"#,
        ];

        let mut seen = 0;
        let mut reported = vec![];
        let mut nexts = vec![];
        for answer in answers {
            let step = poll_step(seen, status(answer)).unwrap();
            seen += step.logs.len();
            reported.extend(step.logs);
            nexts.push(step.next);
        }

        assert_eq!(reported, ["loading model", "step 1/25", "done"]);
        assert_eq!(
            nexts,
            [
                Next::Queued { position: Some(1) },
                Next::Running,
                Next::Running,
                Next::Completed
            ]
        );
    }

    #[test]
    fn queued_without_position() {
        let step = poll_step(0, status(r#"{"status": "IN_QUEUE"}"#)).unwrap();
        assert_eq!(
            step,
            PollStep {
                logs: vec![],
                next: Next::Queued { position: None }
            }
        );
    }

    #[test]
    fn unknown_status_fails_the_generation() {
        let err = poll_step(0, status(r#"{"status": "CANCELLED"}"#)).unwrap_err();
        assert!(matches!(
            err,
            FalApiError::GenerationFailed { status } if status == "CANCELLED"
        ));
    }

    #[test]
    fn fewer_logs_than_seen_reports_nothing() {
        let step = poll_step(
            5,
            status(r#"{"status": "IN_PROGRESS", "logs": [{"message": "a"}]}"#),
        )
        .unwrap();
        assert!(step.logs.is_empty());
    }
}

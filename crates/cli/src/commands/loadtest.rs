use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::{json, Value};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct LatencySummary {
    min_ms: u64,
    avg_ms: u64,
    max_ms: u64,
}

#[derive(Debug, Serialize)]
struct LoadTestReport {
    command: &'static str,
    status: &'static str,
    base_url: String,
    sessions: u32,
    requests_per_session: u32,
    completed: usize,
    failures: usize,
    latency: Option<LatencySummary>,
}

/// Drive `POST /session` and then the SSE chat endpoint, mirroring how a real
/// browser session exercises the server.
pub fn run(base_url: &str, sessions: u32, requests: u32) -> CommandResult {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "loadtest",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let outcome = runtime.block_on(drive(base_url, sessions, requests));

    let (latencies, failures) = match outcome {
        Ok(result) => result,
        Err(error) => return CommandResult::failure("loadtest", "request_failed", error, 4),
    };

    let completed = latencies.len();
    let latency = summarize(&latencies);
    let report = LoadTestReport {
        command: "loadtest",
        status: if failures == 0 { "ok" } else { "degraded" },
        base_url: base_url.to_string(),
        sessions,
        requests_per_session: requests,
        completed,
        failures,
        latency,
    };

    let output = serde_json::to_string_pretty(&report)
        .unwrap_or_else(|error| format!("loadtest report serialization failed: {error}"));
    CommandResult { exit_code: if failures == 0 { 0 } else { 1 }, output }
}

async fn drive(
    base_url: &str,
    sessions: u32,
    requests: u32,
) -> Result<(Vec<u64>, usize), String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(|error| format!("http client init failed: {error}"))?;

    let mut latencies = Vec::new();
    let mut failures = 0usize;

    for _ in 0..sessions {
        let session_id = create_session(&client, base_url).await?;

        for _ in 0..requests {
            let started = Instant::now();
            match stream_once(&client, base_url, &session_id).await {
                Ok(()) => latencies.push(started.elapsed().as_millis() as u64),
                Err(_) => failures += 1,
            }
        }
    }

    Ok((latencies, failures))
}

async fn create_session(client: &reqwest::Client, base_url: &str) -> Result<String, String> {
    let response = client
        .post(format!("{base_url}/session"))
        .json(&json!({ "user_id": "alice" }))
        .send()
        .await
        .map_err(|error| format!("session create failed: {error}"))?;

    if !response.status().is_success() {
        return Err(format!("session create returned status {}", response.status()));
    }

    let payload: Value = response
        .json()
        .await
        .map_err(|error| format!("session create decode failed: {error}"))?;
    payload["session_id"]
        .as_str()
        .map(|value| value.to_string())
        .ok_or_else(|| "session create response missing session_id".to_string())
}

/// One streaming request; succeeds when the final SSE event arrives.
async fn stream_once(
    client: &reqwest::Client,
    base_url: &str,
    session_id: &str,
) -> Result<(), String> {
    let mut response = client
        .get(format!("{base_url}/chat/stream"))
        .query(&[("session_id", session_id), ("user_id", "alice"), ("q", "Hi!")])
        .send()
        .await
        .map_err(|error| format!("stream request failed: {error}"))?;

    if !response.status().is_success() {
        return Err(format!("stream request returned status {}", response.status()));
    }

    let mut body = String::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|error| format!("stream read failed: {error}"))?
    {
        body.push_str(&String::from_utf8_lossy(&chunk));
        if body.contains("\"final\"") {
            return Ok(());
        }
    }

    Err("stream ended without a final event".to_string())
}

fn summarize(latencies: &[u64]) -> Option<LatencySummary> {
    let min_ms = *latencies.iter().min()?;
    let max_ms = *latencies.iter().max()?;
    let avg_ms = latencies.iter().sum::<u64>() / latencies.len() as u64;
    Some(LatencySummary { min_ms, avg_ms, max_ms })
}

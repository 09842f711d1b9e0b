//! Job controller behaviour against scripted stand-ins for the fetch tool.
#![cfg(unix)]

mod common;

use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use gvd_core::{AppEvent, JobEvent, JobOptions, JobOutcome, StaticProbe};
use gvd_runtime::{ChannelEmitter, FAILURE_MESSAGE, JobError, ToolPaths, VideoJobController};
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_test::{assert_err, assert_ok};

use common::{drain, next_event};

fn fake_tool(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("yt-dlp");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn controller(dir: &TempDir, body: &str) -> (VideoJobController, UnboundedReceiver<AppEvent>) {
    let tool = fake_tool(dir, body);
    let (emitter, rx) = ChannelEmitter::new();
    let controller = VideoJobController::new(
        ToolPaths::new(tool, dir.path().join("ffmpeg")),
        Arc::new(StaticProbe(true)),
        Arc::new(emitter),
    );
    (controller, rx)
}

fn options(dir: &TempDir) -> JobOptions {
    JobOptions::new("https://example.com/watch?v=abc", dir.path().join("out"))
}

fn job_event(event: AppEvent) -> JobEvent {
    match event {
        AppEvent::Job(job) => job,
        other => panic!("expected a job event, got {other:?}"),
    }
}

/// Events up to and including `Finished`, plus the progress reset after it.
async fn run_to_end(rx: &mut UnboundedReceiver<AppEvent>) -> Vec<JobEvent> {
    let mut events = Vec::new();
    loop {
        let event = job_event(next_event(rx).await);
        let finished = matches!(event, JobEvent::Finished { .. });
        events.push(event);
        if finished {
            events.push(job_event(next_event(rx).await));
            return events;
        }
    }
}

fn outcomes(events: &[JobEvent]) -> Vec<&JobOutcome> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Finished { outcome, .. } => Some(outcome),
            _ => None,
        })
        .collect()
}

fn percents(events: &[JobEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress { percent, .. } => Some(*percent),
            _ => None,
        })
        .collect()
}

fn output_lines(events: &[JobEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Output { line, .. } => Some(line.as_str()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_successful_job_reports_single_success() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(
        &dir,
        r#"echo "[youtube] abc: Downloading webpage"
echo "[download]  42.5% of 10.00MiB at 1.00MiB/s ETA 00:05"
echo "[download] 100.0% of 10.00MiB in 00:10"
exit 0"#,
    );

    let job_id = assert_ok!(controller.start(&options(&dir)).await);
    let events = run_to_end(&mut rx).await;

    match &events[0] {
        JobEvent::Started { job_id: id, command } => {
            assert_eq!(*id, job_id);
            assert!(command[0].ends_with("yt-dlp"));
            assert!(command.contains(&"--newline".to_string()));
        }
        other => panic!("expected Started first, got {other:?}"),
    }
    assert!(matches!(
        events[1],
        JobEvent::Progress { percent, .. } if percent == 0.0
    ));
    assert_eq!(outcomes(&events), [&JobOutcome::Succeeded]);
    // Reset at start, two tool updates, reset at the end
    assert_eq!(percents(&events), [0.0, 42.5, 100.0, 0.0]);
    assert_eq!(output_lines(&events).len(), 3);
    assert!(events.iter().all(|e| e.job_id() == job_id));

    assert!(!controller.is_active());
    assert_eq!(controller.logs().lines(job_id).len(), 3);
}

#[tokio::test]
async fn test_failing_job_reports_failure_then_reset() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(&dir, "echo 'ERROR: Unsupported URL' >&2\nexit 1");

    assert_ok!(controller.start(&options(&dir)).await);
    let events = run_to_end(&mut rx).await;

    assert_eq!(
        outcomes(&events),
        [&JobOutcome::Failed {
            message: FAILURE_MESSAGE.to_string()
        }]
    );
    assert!(output_lines(&events).contains(&"ERROR: Unsupported URL"));
    assert!(matches!(
        events.last(),
        Some(JobEvent::Progress { percent, .. }) if *percent == 0.0
    ));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_progress_never_decreases() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(
        &dir,
        r#"echo "[download]  40.0% of 1.00MiB"
echo "[download]  20.0% of 1.00MiB"
echo "[download]  60.0% of 1.00MiB ETA 00:01"
echo "[download]  60.0% of 1.00MiB ETA Unknown""#,
    );

    assert_ok!(controller.start(&options(&dir)).await);
    let events = run_to_end(&mut rx).await;

    // Leading and trailing 0.0 are the start and completion resets
    assert_eq!(percents(&events), [0.0, 40.0, 60.0, 60.0, 0.0]);
}

#[tokio::test]
async fn test_output_keeps_stdout_stderr_order() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(
        &dir,
        r#"for i in 1 2 3 4 5 6 7 8; do
  echo "[download] Destination: part$i"
  echo "WARNING: retrying fragment $i" >&2
done"#,
    );

    let job_id = assert_ok!(controller.start(&options(&dir)).await);
    let events = run_to_end(&mut rx).await;

    let expected: Vec<String> = (1..=8)
        .flat_map(|i| {
            [
                format!("[download] Destination: part{i}"),
                format!("WARNING: retrying fragment {i}"),
            ]
        })
        .collect();
    assert_eq!(output_lines(&events), expected);
    let logged: Vec<String> = controller
        .logs()
        .lines(job_id)
        .into_iter()
        .map(|entry| entry.line)
        .collect();
    assert_eq!(logged, expected);
}

#[tokio::test]
async fn test_stop_cancels_running_job() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(&dir, "echo started\nexec sleep 30");

    let job_id = assert_ok!(controller.start(&options(&dir)).await);

    // Wait until the script is running
    loop {
        if let JobEvent::Output { line, .. } = job_event(next_event(&mut rx).await) {
            assert_eq!(line, "started");
            break;
        }
    }

    assert!(controller.stop());
    // A second stop while the job winds down emits nothing new
    controller.stop();

    let events = run_to_end(&mut rx).await;
    assert!(matches!(
        events[0],
        JobEvent::Progress { percent, .. } if percent == 0.0
    ));
    assert_eq!(outcomes(&events), [&JobOutcome::Cancelled]);
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.job_id() == job_id));
    assert!(!controller.is_active());
}

#[tokio::test]
async fn test_stop_without_job_emits_nothing() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(&dir, "exit 0");

    assert!(!controller.stop());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_validation_failure_emits_nothing() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(&dir, "exit 0");

    let bad = JobOptions::new("not a url", dir.path());
    let err = assert_err!(controller.start(&bad).await);
    assert!(matches!(err, JobError::Validation(_)));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_offline_emits_nothing() {
    let dir = TempDir::new().unwrap();
    let tool = fake_tool(&dir, "exit 0");
    let (emitter, mut rx) = ChannelEmitter::new();
    let controller = VideoJobController::new(
        ToolPaths::new(tool, dir.path().join("ffmpeg")),
        Arc::new(StaticProbe(false)),
        Arc::new(emitter),
    );

    let err = assert_err!(controller.start(&options(&dir)).await);
    assert!(matches!(err, JobError::Connectivity));
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_tool_sees_ffmpeg_dir_on_path() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(&dir, r#"echo "$PATH" | cut -d: -f1"#);

    assert_ok!(controller.start(&options(&dir)).await);
    let events = run_to_end(&mut rx).await;

    assert_eq!(
        output_lines(&events),
        [&*dir.path().to_string_lossy()]
    );
}

#[tokio::test]
async fn test_fetch_title_returns_first_stdout_line() {
    let dir = TempDir::new().unwrap();
    let (controller, _rx) = controller(&dir, "echo 'warning: slow' >&2\necho\necho 'My Video Title'");

    let title = assert_ok!(controller.fetch_title("https://example.com/v").await);
    assert_eq!(title, "My Video Title");
}

#[tokio::test]
async fn test_fetch_title_failure() {
    let dir = TempDir::new().unwrap();
    let (controller, _rx) = controller(&dir, "echo 'ERROR: video unavailable' >&2\nexit 1");

    let err = assert_err!(controller.fetch_title("https://example.com/v").await);
    match err {
        JobError::Execution { code, message } => {
            assert_eq!(code, Some(1));
            assert!(message.contains("video unavailable"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_watched_job_reports_progress_then_outcome() {
    let dir = TempDir::new().unwrap();
    let (controller, mut rx) = controller(
        &dir,
        r#"echo "[download]  42.5% of 10.00MiB at 1.00MiB/s ETA 00:05"
sleep 0.2
exit 3"#,
    );

    let mut watch = assert_ok!(controller.start_watched(&options(&dir)).await);
    assert_ok!(watch.progress.changed().await);
    assert_eq!(*watch.progress.borrow(), 42.5);

    let outcome = assert_ok!(watch.outcome.await);
    assert_eq!(
        outcome,
        JobOutcome::Failed {
            message: FAILURE_MESSAGE.to_string()
        }
    );

    // Finished is already out by the time the outcome resolves
    let events: Vec<JobEvent> = drain(&mut rx).into_iter().map(job_event).collect();
    assert_eq!(outcomes(&events), vec![&outcome]);
    assert!(!controller.is_active());
}

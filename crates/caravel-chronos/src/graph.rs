//! Job status classification from the scheduler's CSV graph.
//!
//! The scheduler exposes run history only as a CSV-formatted
//! scheduling graph. Node rows look like
//!
//! ```text
//! node,<job name>,<last outcome>,<current state>
//! ```
//!
//! with outer whitespace around commas tolerated. This module turns
//! that plus the scheduler's job list into a normalized
//! [`TaskStatus`].

use caravel_core::{LaunchState, TaskStatus};

use crate::models::Job;

/// First field of the graph rows that carry per-job state.
const NODE_ROW_MARKER: &str = "node";

/// Classify one named job.
///
/// A job absent from the job list is `unknown` regardless of what the
/// graph says. Otherwise the first matching node row decides, in
/// priority order: current state `running` → running, `queued` →
/// launching, last outcome `success` → complete, and anything else
/// (including no matching row) → failed.
///
/// Known limitation: the final fallback cannot distinguish genuine
/// failure from idle or cancelled jobs; the graph carries no signal
/// that would tell them apart.
pub fn classify(name: &str, jobs: &[Job], csv: &str) -> TaskStatus {
    if !jobs.iter().any(|job| job.name == name) {
        return TaskStatus::new(name, LaunchState::Unknown);
    }

    let mut last_outcome = None;
    let mut current_state = None;
    for line in csv.lines() {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.first() != Some(&NODE_ROW_MARKER) || fields.len() < 4 {
            continue;
        }
        if fields[1] == name {
            last_outcome = Some(fields[2]);
            current_state = Some(fields[3]);
            break;
        }
    }

    let state = match (last_outcome, current_state) {
        (_, Some("running")) => LaunchState::Running,
        (_, Some("queued")) => LaunchState::Launching,
        (Some("success"), _) => LaunchState::Complete,
        // "idle" may also mean cancelled; indistinguishable here.
        _ => LaunchState::Failed,
    };
    TaskStatus::new(name, state)
}

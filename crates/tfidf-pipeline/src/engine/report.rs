//! Stage lifecycle and execution reports.

use std::{
    collections::BTreeMap,
    fmt,
    path::PathBuf,
    time::{Duration, Instant},
};

use serde::Serialize;
use tracing::debug;

/// Lifecycle state of a stage.
///
/// Map/reduce stages move `Pending -> MapRunning -> Grouped -> ReduceRunning -> Complete`;
/// map-only stages skip straight from `MapRunning` to `Complete`. Any running state may
/// end in `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// Not started.
    Pending,
    /// Map tasks are running.
    MapRunning,
    /// Map output has been partitioned and grouped by key.
    Grouped,
    /// Reduce tasks are running.
    ReduceRunning,
    /// All output has been committed.
    Complete,
    /// A task exhausted its retries; output was discarded.
    Failed,
}

impl StageState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: Self) -> bool {
        use StageState::{Complete, Failed, Grouped, MapRunning, Pending, ReduceRunning};
        matches!(
            (self, next),
            (Pending, MapRunning)
                | (MapRunning, Grouped | Complete)
                | (Grouped, ReduceRunning)
                | (ReduceRunning, Complete)
                | (Pending | MapRunning | Grouped | ReduceRunning, Failed)
        )
    }

    /// Whether the state is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::MapRunning => "map-running",
            Self::Grouped => "grouped",
            Self::ReduceRunning => "reduce-running",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Record counters accumulated by tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounters {
    /// Input lines read by map tasks.
    pub input_records: u64,
    /// Key/value pairs emitted by map tasks.
    pub map_output_records: u64,
    /// Lines skipped because they could not be parsed.
    pub malformed_records: u64,
    /// Records dropped because a join found no match.
    pub dropped_records: u64,
    /// Distinct keys handed to reduce invocations.
    pub reduce_groups: u64,
    /// Records written, per output channel file prefix.
    pub output_records: BTreeMap<String, u64>,
}

impl TaskCounters {
    /// Adds another task's counters to these.
    pub fn merge(&mut self, other: &Self) {
        self.input_records += other.input_records;
        self.map_output_records += other.map_output_records;
        self.malformed_records += other.malformed_records;
        self.dropped_records += other.dropped_records;
        self.reduce_groups += other.reduce_groups;
        for (channel, count) in &other.output_records {
            *self.output_records.entry(channel.clone()).or_default() += count;
        }
    }

    /// Total records written across all channels.
    pub fn total_output_records(&self) -> u64 {
        self.output_records.values().sum()
    }
}

/// Outcome of running one stage.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Job name.
    pub name: String,
    /// Final state.
    pub state: StageState,
    /// Every state the stage passed through, in order.
    pub history: Vec<StageState>,
    /// Output location.
    pub output: PathBuf,
    /// Number of map tasks (one per input file).
    pub map_tasks: usize,
    /// Number of reduce tasks (zero for map-only stages).
    pub reduce_tasks: usize,
    /// Aggregated task counters.
    pub counters: TaskCounters,
    /// Wall-clock duration in milliseconds.
    pub elapsed_ms: u64,
    /// Start time, used to compute `elapsed_ms`.
    #[serde(skip)]
    started: Instant,
}

impl StageReport {
    /// Creates a report for a stage in the `Pending` state.
    pub fn new(name: impl Into<String>, output: PathBuf) -> Self {
        Self {
            name: name.into(),
            state: StageState::Pending,
            history: vec![StageState::Pending],
            output,
            map_tasks: 0,
            reduce_tasks: 0,
            counters: TaskCounters::default(),
            elapsed_ms: 0,
            started: Instant::now(),
        }
    }

    /// Moves the stage to `next`, recording the transition.
    pub fn enter(&mut self, next: StageState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal stage transition {} -> {next}",
            self.state
        );
        debug!(stage = %self.name, from = %self.state, to = %next, "stage transition");
        self.state = next;
        self.history.push(next);
        if next.is_terminal() {
            self.elapsed_ms = duration_ms(self.started.elapsed());
        }
    }
}

/// Converts a duration to whole milliseconds, saturating.
fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legal_transitions() {
        use StageState::*;
        assert!(Pending.can_transition_to(MapRunning));
        assert!(MapRunning.can_transition_to(Grouped));
        assert!(MapRunning.can_transition_to(Complete));
        assert!(Grouped.can_transition_to(ReduceRunning));
        assert!(ReduceRunning.can_transition_to(Complete));
        assert!(ReduceRunning.can_transition_to(Failed));
    }

    #[test]
    fn terminal_states_are_final() {
        use StageState::*;
        for next in [Pending, MapRunning, Grouped, ReduceRunning, Complete, Failed] {
            assert!(!Complete.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
        assert!(!Pending.can_transition_to(Complete));
        assert!(!Grouped.can_transition_to(Complete));
    }

    #[test]
    fn report_tracks_history() {
        let mut report = StageReport::new("step1", PathBuf::from("out/step1"));
        report.enter(StageState::MapRunning);
        report.enter(StageState::Grouped);
        report.enter(StageState::ReduceRunning);
        report.enter(StageState::Complete);
        assert_eq!(report.state, StageState::Complete);
        assert_eq!(report.history.len(), 5);
    }

    #[test]
    fn counters_merge() {
        let mut a = TaskCounters {
            input_records: 2,
            ..TaskCounters::default()
        };
        a.output_records.insert("tfraw".into(), 3);
        let mut b = TaskCounters {
            input_records: 1,
            malformed_records: 4,
            ..TaskCounters::default()
        };
        b.output_records.insert("tfraw".into(), 1);
        b.output_records.insert("doctotal".into(), 2);

        a.merge(&b);

        assert_eq!(a.input_records, 3);
        assert_eq!(a.malformed_records, 4);
        assert_eq!(a.output_records["tfraw"], 4);
        assert_eq!(a.total_output_records(), 6);
    }
}

//! Task-side collectors: what map and reduce invocations write into.

use std::collections::BTreeMap;

use super::report::TaskCounters;
use crate::{channel::DEFAULT_CHANNEL, record::Record};

/// Collects the key/value pairs emitted by one map task.
pub struct MapContext<K, V> {
    /// Emitted pairs, in emission order.
    records: Vec<(K, V)>,
    /// Counters for this task.
    counters: TaskCounters,
}

impl<K, V> MapContext<K, V> {
    /// Creates an empty context.
    pub(crate) fn new() -> Self {
        Self {
            records: Vec::new(),
            counters: TaskCounters::default(),
        }
    }

    /// Emits one key/value pair to the shuffle.
    pub fn emit(&mut self, key: K, value: V) {
        self.counters.map_output_records += 1;
        self.records.push((key, value));
    }

    /// Records that an input line was skipped as malformed.
    pub fn skip_malformed(&mut self) {
        self.counters.malformed_records += 1;
    }

    /// Counts one consumed input line.
    pub(crate) fn count_input(&mut self) {
        self.counters.input_records += 1;
    }

    /// Splits the context into its pairs and counters.
    pub(crate) fn into_parts(self) -> (Vec<(K, V)>, TaskCounters) {
        (self.records, self.counters)
    }
}

/// Tagged output sink for one task.
///
/// Every record goes to exactly one named channel. Channels are written to separate
/// files whose names start with the channel prefix, so downstream stages can select
/// them independently.
pub struct Emitter {
    /// Buffered lines per channel prefix.
    channels: BTreeMap<&'static str, String>,
    /// Counters for this task.
    counters: TaskCounters,
}

impl Emitter {
    /// Creates an emitter that always produces a file for each declared channel,
    /// even if nothing is written to it.
    pub(crate) fn new(channels: &[&'static str]) -> Self {
        Self {
            channels: channels.iter().map(|c| (*c, String::new())).collect(),
            counters: TaskCounters::default(),
        }
    }

    /// Writes a record to the default channel.
    pub fn emit<R: Record>(&mut self, record: &R) {
        self.emit_to(DEFAULT_CHANNEL, record);
    }

    /// Writes a record to the named channel.
    pub fn emit_to<R: Record>(&mut self, channel: &'static str, record: &R) {
        let buffer = self.channels.entry(channel).or_default();
        buffer.push_str(&record.to_line());
        buffer.push('\n');
        *self
            .counters
            .output_records
            .entry(channel.to_string())
            .or_default() += 1;
    }

    /// Records that an input line was skipped as malformed.
    pub fn skip_malformed(&mut self) {
        self.counters.malformed_records += 1;
    }

    /// Records that a record was dropped because a join found no match.
    pub fn drop_unmatched(&mut self) {
        self.counters.dropped_records += 1;
    }

    /// Mutable access to this task's counters.
    pub(crate) fn counters_mut(&mut self) -> &mut TaskCounters {
        &mut self.counters
    }

    /// Splits the emitter into per-channel contents and counters.
    pub(crate) fn into_parts(self) -> (BTreeMap<&'static str, String>, TaskCounters) {
        (self.channels, self.counters)
    }
}

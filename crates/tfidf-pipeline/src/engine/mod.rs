//! Local execution engine.
//!
//! Runs map/reduce and map-only jobs in-process, honoring the contract a distributed
//! engine gives the pipeline:
//! - one map task per input file, run concurrently with no shared mutable state
//! - every key delivered to exactly one reduce invocation, with all of its values
//! - reduce tasks (one per partition) run concurrently
//! - failed tasks retried up to a fixed budget, then the stage fails
//! - output committed atomically: either every file of the stage is visible under the
//!   output directory together with a `_SUCCESS` marker, or the directory is removed
//!
//! Keys are assigned to partitions with SipHash using fixed keys, and each partition
//! is grouped into a sorted map, so a rerun over identical input writes byte-identical
//! files.

mod context;
mod report;

use std::{
    collections::BTreeMap,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
};

pub use context::{Emitter, MapContext};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};
pub use report::{StageReport, StageState, TaskCounters};
use siphasher::sip::SipHasher24;
use tfidf_config::EngineSettings;
use tracing::{debug, error, info, warn};

use crate::{PipelineError, channel::DEFAULT_CHANNEL, fs::FileSystem};

/// Name of the marker file written into a committed output directory.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Name of the staging directory inside an output directory.
const STAGING_DIR: &str = "_temporary";

/// One unit of map input: a single file.
#[derive(Debug, Clone)]
pub struct InputSplit {
    /// Position of the split among all splits of the job.
    pub index: usize,
    /// Path of the file.
    pub path: PathBuf,
    /// File name, used as the document id.
    document_id: String,
}

impl InputSplit {
    /// Creates a split for the file at `path`.
    pub fn new(index: usize, path: PathBuf) -> Self {
        let document_id = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            index,
            path,
            document_id,
        }
    }

    /// The document id of this split: the source file name.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }
}

/// Where a job reads its input from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Every data file directly inside the directory. The directory must exist.
    Directory(PathBuf),
    /// Files matching a pattern on the final path component, e.g. `step1/tfraw*`.
    Glob(PathBuf),
}

/// A job: a name, its inputs, and the directory its output is committed to.
#[derive(Debug, Clone)]
pub struct Job {
    /// Human-readable job name used in logs and reports.
    pub name: String,
    /// Input sources, read together.
    pub inputs: Vec<InputSource>,
    /// Output directory. Must not exist when the job starts.
    pub output: PathBuf,
}

/// Map phase of a map/reduce job.
pub trait Mapper: Sync {
    /// Shuffle key.
    type Key: Ord + Hash + Send + Sync;
    /// Shuffle value.
    type Value: Send + Sync;

    /// Processes one input line.
    fn map(&self, split: &InputSplit, line: &str, ctx: &mut MapContext<Self::Key, Self::Value>);

    /// Called once after the last line of a split.
    fn finish(&self, _split: &InputSplit, _ctx: &mut MapContext<Self::Key, Self::Value>) {}
}

/// Reduce phase of a map/reduce job.
pub trait Reducer: Sync {
    /// Shuffle key.
    type Key;
    /// Shuffle value.
    type Value;

    /// Output channels this reducer writes. A file is produced for each one per
    /// partition, even when it stays empty.
    fn channels(&self) -> &[&'static str] {
        &[DEFAULT_CHANNEL]
    }

    /// Processes all values for one key.
    fn reduce(&self, key: &Self::Key, values: &[Self::Value], out: &mut Emitter);
}

/// A job with no shuffle: each input line maps straight to output records.
pub trait MapOnly: Sync {
    /// Processes one input line.
    fn map(&self, split: &InputSplit, line: &str, out: &mut Emitter);
}

/// Map output of one task: emitted pairs plus counters.
type MapOutput<K, V> = (Vec<(K, V)>, TaskCounters);

/// Files written by one task plus counters.
type TaskFiles = (Vec<String>, TaskCounters);

/// In-process engine running tasks on a dedicated thread pool.
pub struct LocalEngine<'fs> {
    /// Filesystem all reads and writes go through.
    fs: &'fs dyn FileSystem,
    /// Worker pool for map and reduce tasks.
    pool: ThreadPool,
    /// Number of reduce partitions.
    reduce_tasks: usize,
    /// Attempts per task before failing the stage.
    max_task_attempts: usize,
}

impl<'fs> LocalEngine<'fs> {
    /// Creates an engine over `fs` with the given settings.
    pub fn new(fs: &'fs dyn FileSystem, settings: &EngineSettings) -> Result<Self, PipelineError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.threads)
            .thread_name(|i| format!("tfidf-worker-{i}"))
            .build()?;
        Ok(Self {
            fs,
            pool,
            reduce_tasks: settings.reduce_tasks.max(1),
            max_task_attempts: settings.max_task_attempts.max(1),
        })
    }

    /// The filesystem this engine reads from and writes to.
    pub fn fs(&self) -> &'fs dyn FileSystem {
        self.fs
    }

    /// Runs a map/reduce job to completion.
    pub fn run_map_reduce<M, R>(
        &self,
        job: &Job,
        mapper: &M,
        reducer: &R,
    ) -> Result<StageReport, PipelineError>
    where
        M: Mapper,
        R: Reducer<Key = M::Key, Value = M::Value>,
    {
        let mut report = StageReport::new(&job.name, job.output.clone());
        info!(stage = %job.name, output = %job.output.display(), "starting map/reduce job");
        match self.execute_map_reduce(job, mapper, reducer, &mut report) {
            Ok(()) => {
                log_completion(&report);
                Ok(report)
            }
            Err(e) => {
                self.abort(job, &mut report, &e);
                Err(e)
            }
        }
    }

    /// Runs a map-only job to completion.
    pub fn run_map_only<M: MapOnly>(
        &self,
        job: &Job,
        mapper: &M,
    ) -> Result<StageReport, PipelineError> {
        let mut report = StageReport::new(&job.name, job.output.clone());
        info!(stage = %job.name, output = %job.output.display(), "starting map-only job");
        match self.execute_map_only(job, mapper, &mut report) {
            Ok(()) => {
                log_completion(&report);
                Ok(report)
            }
            Err(e) => {
                self.abort(job, &mut report, &e);
                Err(e)
            }
        }
    }

    /// Body of [`Self::run_map_reduce`].
    fn execute_map_reduce<M, R>(
        &self,
        job: &Job,
        mapper: &M,
        reducer: &R,
        report: &mut StageReport,
    ) -> Result<(), PipelineError>
    where
        M: Mapper,
        R: Reducer<Key = M::Key, Value = M::Value>,
    {
        let splits = self.prepare(job)?;
        report.map_tasks = splits.len();
        report.reduce_tasks = self.reduce_tasks;

        report.enter(StageState::MapRunning);
        let map_outputs = self.pool.install(|| {
            splits
                .par_iter()
                .map(|split| {
                    self.with_retries(&task_name(job, "m", split.index), || {
                        self.run_map_task(split, mapper)
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let partitions = self.shuffle(map_outputs, &mut report.counters);
        report.enter(StageState::Grouped);

        report.enter(StageState::ReduceRunning);
        let staging = job.output.join(STAGING_DIR);
        let reduce_outputs = self.pool.install(|| {
            partitions
                .par_iter()
                .enumerate()
                .map(|(partition, groups)| {
                    self.with_retries(&task_name(job, "r", partition), || {
                        self.run_reduce_task(partition, groups, reducer, &staging)
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut files = Vec::new();
        for (task_files, counters) in reduce_outputs {
            report.counters.merge(&counters);
            files.extend(task_files);
        }
        self.commit(&job.output, &files)?;
        report.enter(StageState::Complete);
        Ok(())
    }

    /// Body of [`Self::run_map_only`].
    fn execute_map_only<M: MapOnly>(
        &self,
        job: &Job,
        mapper: &M,
        report: &mut StageReport,
    ) -> Result<(), PipelineError> {
        let splits = self.prepare(job)?;
        report.map_tasks = splits.len();

        report.enter(StageState::MapRunning);
        let staging = job.output.join(STAGING_DIR);
        let outputs = self.pool.install(|| {
            splits
                .par_iter()
                .map(|split| {
                    self.with_retries(&task_name(job, "m", split.index), || {
                        self.run_map_only_task(split, mapper, &staging)
                    })
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut files = Vec::with_capacity(outputs.len());
        for (file, counters) in outputs {
            report.counters.merge(&counters);
            files.push(file);
        }
        self.commit(&job.output, &files)?;
        report.enter(StageState::Complete);
        Ok(())
    }

    /// Checks the output location and resolves input sources into splits.
    fn prepare(&self, job: &Job) -> Result<Vec<InputSplit>, PipelineError> {
        if self.fs.exists(&job.output) {
            return Err(PipelineError::OutputExists {
                path: job.output.clone(),
            });
        }

        let mut paths = Vec::new();
        for source in &job.inputs {
            match source {
                InputSource::Directory(dir) => {
                    if !self.fs.is_dir(dir) {
                        return Err(PipelineError::InputNotFound { path: dir.clone() });
                    }
                    paths.extend(self.fs.list_files(dir)?);
                }
                InputSource::Glob(pattern) => {
                    let matched = self.fs.glob(pattern)?;
                    if matched.is_empty() {
                        warn!(stage = %job.name, pattern = %pattern.display(), "input pattern matched no files");
                    }
                    paths.extend(matched);
                }
            }
        }
        paths.sort();
        paths.dedup();

        debug!(stage = %job.name, splits = paths.len(), "resolved input splits");
        Ok(paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| InputSplit::new(index, path))
            .collect())
    }

    /// Runs `task` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    fn with_retries<T>(
        &self,
        task: &str,
        mut run: impl FnMut() -> Result<T, PipelineError>,
    ) -> Result<T, PipelineError> {
        let mut attempt = 1;
        loop {
            match run() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < self.max_task_attempts => {
                    warn!(task, attempt, %error, "task attempt failed, retrying");
                    attempt += 1;
                }
                Err(error) => {
                    return Err(PipelineError::TaskFailed {
                        task: task.to_string(),
                        attempts: attempt,
                        source: Box::new(error),
                    });
                }
            }
        }
    }

    /// Maps every line of one split.
    fn run_map_task<M: Mapper>(
        &self,
        split: &InputSplit,
        mapper: &M,
    ) -> Result<MapOutput<M::Key, M::Value>, PipelineError> {
        let contents = self.fs.read_to_string(&split.path)?;
        let mut ctx = MapContext::new();
        for line in contents.lines() {
            ctx.count_input();
            mapper.map(split, line, &mut ctx);
        }
        mapper.finish(split, &mut ctx);
        Ok(ctx.into_parts())
    }

    /// Partitions map output by key hash and groups each partition by key.
    ///
    /// Values keep their order: split order first, then emission order.
    fn shuffle<K: Ord + Hash, V>(
        &self,
        outputs: Vec<MapOutput<K, V>>,
        counters: &mut TaskCounters,
    ) -> Vec<BTreeMap<K, Vec<V>>> {
        let mut partitions: Vec<BTreeMap<K, Vec<V>>> =
            (0..self.reduce_tasks).map(|_| BTreeMap::new()).collect();
        for (records, task_counters) in outputs {
            counters.merge(&task_counters);
            for (key, value) in records {
                let partition = partition_for(&key, self.reduce_tasks);
                partitions[partition].entry(key).or_default().push(value);
            }
        }
        partitions
    }

    /// Reduces one partition into staged channel files.
    fn run_reduce_task<R: Reducer>(
        &self,
        partition: usize,
        groups: &BTreeMap<R::Key, Vec<R::Value>>,
        reducer: &R,
        staging: &Path,
    ) -> Result<TaskFiles, PipelineError> {
        let mut out = Emitter::new(reducer.channels());
        for (key, values) in groups {
            out.counters_mut().reduce_groups += 1;
            reducer.reduce(key, values, &mut out);
        }

        let (channels, counters) = out.into_parts();
        let mut files = Vec::with_capacity(channels.len());
        for (channel, contents) in channels {
            let name = format!("{channel}-r-{partition:05}");
            self.fs.write(&staging.join(&name), &contents)?;
            files.push(name);
        }
        Ok((files, counters))
    }

    /// Maps one split straight into a staged output file.
    fn run_map_only_task<M: MapOnly>(
        &self,
        split: &InputSplit,
        mapper: &M,
        staging: &Path,
    ) -> Result<(String, TaskCounters), PipelineError> {
        let contents = self.fs.read_to_string(&split.path)?;
        let mut out = Emitter::new(&[DEFAULT_CHANNEL]);
        for line in contents.lines() {
            out.counters_mut().input_records += 1;
            mapper.map(split, line, &mut out);
        }

        let (channels, counters) = out.into_parts();
        let name = format!("{DEFAULT_CHANNEL}-m-{:05}", split.index);
        let contents: String = channels.into_values().collect();
        self.fs.write(&staging.join(&name), &contents)?;
        Ok((name, counters))
    }

    /// Moves staged files into the output directory and marks it complete.
    fn commit(&self, output: &Path, files: &[String]) -> Result<(), PipelineError> {
        let staging = output.join(STAGING_DIR);
        for name in files {
            self.fs.rename(&staging.join(name), &output.join(name))?;
        }
        self.fs.delete(&staging)?;
        self.fs.write(&output.join(SUCCESS_MARKER), "")
    }

    /// Marks the stage failed and discards anything it wrote.
    fn abort(&self, job: &Job, report: &mut StageReport, cause: &PipelineError) {
        report.enter(StageState::Failed);
        error!(stage = %job.name, error = %cause, "job failed");
        // A pre-existing output directory belongs to someone else
        if matches!(cause, PipelineError::OutputExists { .. }) {
            return;
        }
        if let Err(e) = self.fs.delete(&job.output) {
            warn!(stage = %job.name, error = %e, "could not remove partial output");
        }
    }
}

/// Logs a completed job's counters.
fn log_completion(report: &StageReport) {
    info!(
        stage = %report.name,
        map_tasks = report.map_tasks,
        reduce_tasks = report.reduce_tasks,
        input_records = report.counters.input_records,
        output_records = report.counters.total_output_records(),
        elapsed_ms = report.elapsed_ms,
        "job complete"
    );
    if report.counters.malformed_records > 0 {
        debug!(
            stage = %report.name,
            skipped = report.counters.malformed_records,
            "skipped malformed records"
        );
    }
}

/// Formats a task name such as `term-frequency/r-00001`.
fn task_name(job: &Job, kind: &str, index: usize) -> String {
    format!("{}/{kind}-{index:05}", job.name)
}

/// Chooses the reduce partition for a key.
fn partition_for<K: Hash>(key: &K, partitions: usize) -> usize {
    let mut hasher = SipHasher24::new();
    key.hash(&mut hasher);
    // The modulus is below `partitions`, so the cast back cannot truncate
    (hasher.finish() % partitions as u64) as usize
}

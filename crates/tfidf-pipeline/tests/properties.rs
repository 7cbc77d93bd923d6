//! End-to-end pipeline properties over real corpora on disk.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::{
    collections::{BTreeMap, HashMap},
    fs, io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
};

use tempfile::TempDir;
use tfidf_config::{EngineSettings, RunConfig};
use tfidf_pipeline::{
    DocTotal, FileSystem, InverseDocFrequency, LocalFs, Pipeline, PipelineError, Record,
    StageId, StageState, TermCount, TermFrequency, TfIdf, TopNEntry,
};

/// Tolerance for floating-point comparisons.
const EPSILON: f64 = 1e-9;

/// Corpus used by most property tests.
const CORPUS: &[(&str, &str)] = &[
    ("alpha.txt", "The quick brown fox jumps over the lazy dog.\nThe dog sleeps."),
    ("beta.txt", "A fox, a dog and a cat walk into a bar; the bar is quiet."),
    ("gamma.txt", "Quiet cats nap. Cats nap often, and dogs nap too!"),
    ("delta.txt", "brown brown brown fox\n\nlazy cat"),
];

/// Helper to create a temp directory with the documents under `corpus/`.
fn corpus(docs: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("corpus")).unwrap();
    for (name, text) in docs {
        fs::write(dir.path().join("corpus").join(name), text).unwrap();
    }
    dir
}

/// Helper to build a run configuration reading `corpus/` and writing `out/`.
fn config(dir: &Path, top_n: usize, reduce_tasks: usize, max_task_attempts: usize) -> RunConfig {
    RunConfig {
        input_dir: dir.join("corpus"),
        output_base: dir.join("out"),
        top_n,
        engine: EngineSettings {
            reduce_tasks,
            max_task_attempts,
            threads: 2,
        },
    }
}

/// Helper to run the whole pipeline with one partition and no retries.
fn run(dir: &Path, top_n: usize) {
    Pipeline::new(&LocalFs, config(dir, top_n, 1, 1))
        .run()
        .unwrap();
}

/// Helper to parse every well-formed record in `files`.
fn parse_all<R: Record>(files: &[PathBuf]) -> Vec<R> {
    files
        .iter()
        .flat_map(|file| {
            fs::read_to_string(file)
                .unwrap()
                .lines()
                .filter_map(R::parse_line)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Helper to read every record of a stage output directory.
fn records<R: Record>(dir: &Path) -> Vec<R> {
    parse_all(&LocalFs.list_files(dir).unwrap())
}

/// Helper to read every record of the files matching `pattern`.
fn channel<R: Record>(pattern: &Path) -> Vec<R> {
    parse_all(&LocalFs.glob(pattern).unwrap())
}

/// Helper to load stage 2 output keyed by `(term, document)`.
fn tf_table(out: &Path) -> HashMap<(String, String), f64> {
    records::<TermFrequency>(&out.join("step2_tf"))
        .into_iter()
        .map(|r| ((r.term, r.document), r.tf))
        .collect()
}

/// Helper to load stage 3 output keyed by term.
fn idf_table(out: &Path) -> HashMap<String, f64> {
    records::<InverseDocFrequency>(&out.join("step3_idf"))
        .into_iter()
        .map(|r| (r.term, r.idf))
        .collect()
}

/// Helper to snapshot every output file under `out`, keyed by its relative path.
fn snapshot(out: &Path) -> BTreeMap<PathBuf, String> {
    let mut files = BTreeMap::new();
    for entry in walk(out) {
        let relative = entry.strip_prefix(out).unwrap().to_path_buf();
        files.insert(relative, fs::read_to_string(&entry).unwrap());
    }
    files
}

/// Helper to list every file below `dir`, recursively.
fn walk(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(walk(&path));
        } else {
            files.push(path);
        }
    }
    files
}

#[test]
fn two_document_scenario() {
    let dir = corpus(&[
        ("doc1", "the cat sat on the mat"),
        ("doc2", "the dog sat on the log"),
    ]);
    run(dir.path(), 1);
    let out = dir.path().join("out");

    let totals = channel::<DocTotal>(&out.join("step1/doctotal*"));
    assert_eq!(totals.len(), 2);
    assert!(totals.iter().all(|t| t.total == 3));

    let tf = tf_table(&out);
    assert!((tf[&("cat".into(), "doc1".into())] - 1.0 / 3.0).abs() < EPSILON);

    let idf = idf_table(&out);
    assert!((idf["sat"] - 3.0_f64.ln()).abs() < EPSILON);
    assert!((idf["cat"] - 6.0_f64.ln()).abs() < EPSILON);
    assert!(!idf.contains_key("the"));
    assert!(!idf.contains_key("on"));

    let tfidf = records::<TfIdf>(&out.join("step4_tfidf"));
    let cat = tfidf
        .iter()
        .find(|r| r.document == "doc1" && r.term == "cat")
        .unwrap();
    assert!((cat.tfidf - 0.5973).abs() < 1e-4);

    let top = records::<TopNEntry>(&out.join("top1_freq"));
    let doc1: Vec<&TopNEntry> = top.iter().filter(|e| e.document == "doc1").collect();
    assert_eq!(doc1.len(), 1);
    assert_eq!(doc1[0].term, "cat");
    assert_eq!(doc1[0].rank, 1);
    let doc2: Vec<&TopNEntry> = top.iter().filter(|e| e.document == "doc2").collect();
    assert_eq!(doc2[0].term, "dog");
}

#[test]
fn term_frequencies_sum_to_one() {
    let dir = corpus(CORPUS);
    run(dir.path(), 5);

    let mut sums: HashMap<String, f64> = HashMap::new();
    for ((_, document), tf) in tf_table(&dir.path().join("out")) {
        assert!(tf > 0.0 && tf <= 1.0);
        *sums.entry(document).or_default() += tf;
    }

    assert_eq!(sums.len(), CORPUS.len());
    for (document, sum) in sums {
        assert!((sum - 1.0).abs() < EPSILON, "{document}: {sum}");
    }
}

#[test]
fn idf_matches_formula_and_is_non_negative() {
    let dir = corpus(CORPUS);
    run(dir.path(), 5);
    let out = dir.path().join("out");

    let documents = channel::<DocTotal>(&out.join("step1/doctotal*")).len() as f64;
    let mut tf_sums: HashMap<String, f64> = HashMap::new();
    for ((term, _), tf) in tf_table(&out) {
        *tf_sums.entry(term).or_default() += tf;
    }

    let idf = idf_table(&out);
    assert_eq!(idf.len(), tf_sums.len());
    for (term, value) in idf {
        let expected = (documents / tf_sums[&term]).ln();
        assert!((value - expected).abs() < EPSILON, "{term}");
        assert!(value >= -EPSILON, "{term}: {value}");
    }
}

#[test]
fn tfidf_is_product_of_tf_and_idf() {
    let dir = corpus(CORPUS);
    run(dir.path(), 5);
    let out = dir.path().join("out");
    let tf = tf_table(&out);
    let idf = idf_table(&out);

    let fused = records::<TfIdf>(&out.join("step4_tfidf"));

    assert_eq!(fused.len(), tf.len());
    for record in fused {
        let expected = tf[&(record.term.clone(), record.document.clone())] * idf[&record.term];
        assert!((record.tfidf - expected).abs() < EPSILON);
    }
}

#[test]
fn top_n_is_bounded_and_ordered() {
    let dir = corpus(CORPUS);
    run(dir.path(), 3);
    let out = dir.path().join("out");

    let mut distinct: HashMap<String, usize> = HashMap::new();
    for count in channel::<TermCount>(&out.join("step1/tfraw*")) {
        *distinct.entry(count.document).or_default() += 1;
    }
    let mut rankings: BTreeMap<String, Vec<TopNEntry>> = BTreeMap::new();
    for entry in records::<TopNEntry>(&out.join("top3_freq")) {
        rankings.entry(entry.document.clone()).or_default().push(entry);
    }

    assert_eq!(rankings.len(), distinct.len());
    for (document, entries) in rankings {
        assert!(entries.len() <= distinct[&document].min(3));
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.rank, i + 1);
        }
        for pair in entries.windows(2) {
            assert!(pair[0].frequency >= pair[1].frequency);
            if pair[0].frequency == pair[1].frequency {
                assert!(pair[0].term < pair[1].term);
            }
        }
    }

    let delta = &records::<TopNEntry>(&out.join("top3_freq"))
        .into_iter()
        .filter(|e| e.document == "delta.txt")
        .collect::<Vec<_>>();
    assert_eq!(delta[0].term, "brown");
    assert_eq!(delta[0].frequency, 3);
}

#[test]
fn reruns_are_byte_identical() {
    let dir = corpus(CORPUS);
    let out = dir.path().join("out");

    run(dir.path(), 5);
    let first = snapshot(&out);
    run(dir.path(), 5);
    let second = snapshot(&out);

    assert!(first.contains_key(&PathBuf::from("step1/_SUCCESS")));
    assert!(first.contains_key(&PathBuf::from("top5_freq/part-r-00000")));
    assert_eq!(first, second);
}

#[test]
fn rerun_removes_stale_output() {
    let dir = corpus(CORPUS);
    let stale = dir.path().join("out/step4_tfidf/part-m-00099");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "stale\tstale\t1\n").unwrap();

    run(dir.path(), 5);

    assert!(!stale.exists());
}

#[test]
fn empty_document_counts_toward_corpus_size() {
    let dir = corpus(&[("doc1", "cat"), ("empty", "the and of\n")]);
    run(dir.path(), 5);
    let out = dir.path().join("out");

    let totals = channel::<DocTotal>(&out.join("step1/doctotal*"));
    assert!(totals.contains(&DocTotal {
        document: "empty".into(),
        total: 0
    }));
    assert_eq!(totals.len(), 2);

    assert!(
        tf_table(&out)
            .keys()
            .all(|(_, document)| document != "empty")
    );
    assert!((idf_table(&out)["cat"] - 2.0_f64.ln()).abs() < EPSILON);
    assert!(
        records::<TopNEntry>(&out.join("top5_freq"))
            .iter()
            .all(|e| e.document != "empty")
    );
}

#[test]
fn undecodable_bytes_do_not_abort_the_run() {
    let dir = corpus(&[("doc1", "the cat sat on the mat")]);
    fs::write(dir.path().join("corpus/doc2"), b"caf\xe9 dog sat\n").unwrap();
    run(dir.path(), 5);
    let out = dir.path().join("out");

    let totals = channel::<DocTotal>(&out.join("step1/doctotal*"));
    assert_eq!(totals.len(), 2);
    assert!(totals.contains(&DocTotal {
        document: "doc2".into(),
        total: 3
    }));

    let counts = channel::<TermCount>(&out.join("step1/tfraw*"));
    assert!(
        counts
            .iter()
            .any(|c| c.document == "doc2" && c.term == "caf" && c.count == 1)
    );
    assert!((idf_table(&out)["sat"] - 3.0_f64.ln()).abs() < EPSILON);
    assert!(out.join("top5_freq/_SUCCESS").is_file());
}

#[test]
fn partitioning_does_not_change_results() {
    let single = corpus(CORPUS);
    let multi = corpus(CORPUS);
    Pipeline::new(&LocalFs, config(single.path(), 5, 1, 1))
        .run()
        .unwrap();
    let report = Pipeline::new(&LocalFs, config(multi.path(), 5, 3, 1))
        .run()
        .unwrap();

    assert!(report.stages.iter().all(|s| s.state == StageState::Complete));
    assert_eq!(
        LocalFs
            .glob(&multi.path().join("out/step1/tfraw*"))
            .unwrap()
            .len(),
        3
    );
    for stage in ["step2_tf", "step3_idf", "step4_tfidf", "top5_freq"] {
        let mut a: Vec<String> = snapshot(&single.path().join("out").join(stage))
            .into_values()
            .flat_map(|c| c.lines().map(String::from).collect::<Vec<_>>())
            .collect();
        let mut b: Vec<String> = snapshot(&multi.path().join("out").join(stage))
            .into_values()
            .flat_map(|c| c.lines().map(String::from).collect::<Vec<_>>())
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b, "{stage}");
    }
}

#[test]
fn missing_input_fails_first_stage() {
    let dir = tempfile::tempdir().unwrap();

    let err = Pipeline::new(&LocalFs, config(dir.path(), 5, 1, 1))
        .run()
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::StageFailed {
            stage: StageId::TermCount,
            ..
        }
    ));
    assert_eq!(err.exit_code(), 2);
    assert!(!dir.path().join("out/step1").exists());
}

/// Local filesystem that injects read failures.
struct FaultyFs {
    /// Reads under a directory with this name always fail.
    broken_dir: Option<&'static str>,
    /// Number of upcoming reads that fail, anywhere.
    transient: AtomicUsize,
    /// Reads failed so far.
    injected: AtomicUsize,
}

impl FaultyFs {
    /// Fails every read below a directory called `name`.
    fn broken_dir(name: &'static str) -> Self {
        Self {
            broken_dir: Some(name),
            transient: AtomicUsize::new(0),
            injected: AtomicUsize::new(0),
        }
    }

    /// Fails the next `failures` reads, then behaves.
    fn flaky(failures: usize) -> Self {
        Self {
            broken_dir: None,
            transient: AtomicUsize::new(failures),
            injected: AtomicUsize::new(0),
        }
    }

    /// Whether the read of `path` should fail, consuming a transient failure.
    fn should_fail(&self, path: &Path) -> bool {
        let broken = self
            .broken_dir
            .is_some_and(|name| path.components().any(|c| c.as_os_str() == name));
        broken
            || self
                .transient
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
    }
}

impl FileSystem for FaultyFs {
    fn exists(&self, path: &Path) -> bool {
        LocalFs.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        LocalFs.is_dir(path)
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
        LocalFs.list_files(dir)
    }

    fn read_to_string(&self, path: &Path) -> Result<String, PipelineError> {
        if self.should_fail(path) {
            self.injected.fetch_add(1, Ordering::SeqCst);
            return Err(PipelineError::Io {
                path: path.to_path_buf(),
                source: io::Error::other("injected fault"),
            });
        }
        LocalFs.read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> Result<(), PipelineError> {
        LocalFs.write(path, contents)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), PipelineError> {
        LocalFs.rename(from, to)
    }

    fn delete(&self, path: &Path) -> Result<bool, PipelineError> {
        LocalFs.delete(path)
    }
}

#[test]
fn failed_stage_halts_pipeline() {
    let dir = corpus(&[("doc1", "cat sat")]);
    let fs = FaultyFs::broken_dir("step2_tf");

    let err = Pipeline::new(&fs, config(dir.path(), 5, 1, 3))
        .run()
        .unwrap_err();

    let PipelineError::StageFailed { stage, source } = &err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(*stage, StageId::InverseDocumentFrequency);
    assert_eq!(err.exit_code(), 4);
    match source.as_ref() {
        PipelineError::TaskFailed { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("unexpected cause: {other}"),
    }
    assert_eq!(fs.injected.load(Ordering::SeqCst), 3);

    let out = dir.path().join("out");
    assert!(out.join("step1/_SUCCESS").is_file());
    assert!(out.join("step2_tf/_SUCCESS").is_file());
    assert!(!out.join("step3_idf").exists());
    assert!(!out.join("step4_tfidf").exists());
    assert!(!out.join("top5_freq").exists());
}

#[test]
fn transient_faults_are_retried() {
    let dir = corpus(CORPUS);
    let fs = FaultyFs::flaky(2);

    let report = Pipeline::new(&fs, config(dir.path(), 5, 2, 4))
        .run()
        .unwrap();

    assert_eq!(fs.injected.load(Ordering::SeqCst), 2);
    assert_eq!(report.stages.len(), 5);
    assert!(report.stages.iter().all(|s| s.state == StageState::Complete));
    assert!(dir.path().join("out/top5_freq/_SUCCESS").is_file());
}

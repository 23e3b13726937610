use anyhow::Result;
use keyscout::config::{EncodingMode, ScanConfig, StrategyChoice};
use keyscout::search::{self, search_with, ExecutionStrategy, ThreadExecutor, WorkerCommand};
use keyscout::{AggregateResult, SearchError};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tempfile::{tempdir, TempDir};

const KEYWORDS: [&str; 3] = ["python", "data", "openai"];

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for (name, content) in files {
        let path = dir.path().join(name);
        fs::write(&path, content)?;
        paths.push(path);
    }
    Ok(paths)
}

fn scenario(dir: &TempDir) -> Result<Vec<PathBuf>> {
    create_test_files(
        dir,
        &[
            (
                "test_file_0.txt",
                "This is a Python test file with data and openai.",
            ),
            ("test_file_1.txt", "This file is about Python programming."),
            ("test_file_2.txt", "OpenAI is a company that works with data."),
        ],
    )
}

fn keyword_config(dir: &TempDir) -> ScanConfig {
    ScanConfig::new(dir.path(), KEYWORDS.iter().map(|k| k.to_string()).collect())
}

fn worker_program() -> WorkerCommand {
    WorkerCommand::new(env!("CARGO_BIN_EXE_keyscout-worker"), Vec::<String>::new())
}

/// Keyword to file set, ignoring arrival order
fn as_sets(result: &AggregateResult) -> BTreeMap<String, BTreeSet<PathBuf>> {
    result
        .iter()
        .map(|(k, files)| (k.to_string(), files.iter().cloned().collect()))
        .collect()
}

fn expected_scenario(files: &[PathBuf]) -> BTreeMap<String, BTreeSet<PathBuf>> {
    let pick = |idx: &[usize]| -> BTreeSet<PathBuf> {
        idx.iter().map(|&i| files[i].clone()).collect()
    };
    BTreeMap::from([
        ("python".to_string(), pick(&[0, 1])),
        ("data".to_string(), pick(&[0, 2])),
        ("openai".to_string(), pick(&[0, 2])),
    ])
}

#[test]
fn test_scenario_thread_strategy() -> Result<()> {
    let dir = tempdir()?;
    let files = scenario(&dir)?;

    let config = ScanConfig {
        strategy: StrategyChoice::Thread,
        cores: NonZeroUsize::new(4),
        ..keyword_config(&dir)
    };
    let result = search::scan(&config)?;

    assert_eq!(as_sets(&result), expected_scenario(&files));
    assert_eq!(result.workers, 2);
    Ok(())
}

#[test]
fn test_scenario_process_strategy() -> Result<()> {
    let dir = tempdir()?;
    let files = scenario(&dir)?;

    let config = ScanConfig {
        strategy: StrategyChoice::Process,
        cores: NonZeroUsize::new(4),
        worker_command: Some(worker_program()),
        ..keyword_config(&dir)
    };
    let plan = search::plan(&config, files.len());
    assert_eq!(plan.strategy, ExecutionStrategy::ProcessIsolated);

    let result = search::scan(&config)?;
    assert_eq!(as_sets(&result), expected_scenario(&files));
    assert_eq!(result.workers, 2);
    let keywords: Vec<_> = result.iter().map(|(k, _)| k).collect();
    assert_eq!(keywords, vec!["python", "data", "openai"]);
    Ok(())
}

#[test]
fn test_auto_strategy_scan_on_many_cores() -> Result<()> {
    let dir = tempdir()?;
    let files = create_test_files(
        &dir,
        &[("one.txt", "python"), ("two.txt", "Data and OpenAI")],
    )?;

    let config = ScanConfig {
        cores: NonZeroUsize::new(4),
        ..keyword_config(&dir)
    };
    let result = search::scan(&config)?;

    let expected = BTreeMap::from([
        ("python".to_string(), BTreeSet::from([files[0].clone()])),
        ("data".to_string(), BTreeSet::from([files[1].clone()])),
        ("openai".to_string(), BTreeSet::from([files[1].clone()])),
    ]);
    assert_eq!(as_sets(&result), expected);
    assert_eq!(result.workers, 2);
    Ok(())
}

#[test]
fn test_process_and_thread_strategies_agree() -> Result<()> {
    let dir = tempdir()?;
    let contents: Vec<(String, &str)> = (0..17)
        .map(|i| {
            let body = match i % 3 {
                0 => "Python notebooks full of data",
                1 => "an OpenAI paper",
                _ => "plain prose",
            };
            (format!("note_{:02}.txt", i), body)
        })
        .collect();
    let named: Vec<(&str, &str)> = contents.iter().map(|(n, c)| (n.as_str(), *c)).collect();
    create_test_files(&dir, &named)?;

    let threaded = search::scan(&ScanConfig {
        strategy: StrategyChoice::Thread,
        cores: NonZeroUsize::new(5),
        ..keyword_config(&dir)
    })?;
    let isolated = search::scan(&ScanConfig {
        strategy: StrategyChoice::Process,
        cores: NonZeroUsize::new(5),
        worker_command: Some(worker_program()),
        ..keyword_config(&dir)
    })?;

    assert_eq!(as_sets(&threaded), as_sets(&isolated));
    assert_eq!(isolated.workers, 3);
    assert_eq!(isolated.stats.files_scanned, 17);
    Ok(())
}

#[test]
fn test_repeated_keyword_listed_once() -> Result<()> {
    let dir = tempdir()?;
    let files = create_test_files(&dir, &[("a.txt", "data"), ("b.txt", "more data")])?;

    let config = ScanConfig {
        strategy: StrategyChoice::Thread,
        cores: NonZeroUsize::new(3),
        ..ScanConfig::new(
            dir.path(),
            vec!["data".to_string(), "data".to_string(), "DATA".to_string()],
        )
    };
    let result = search::scan(&config)?;

    // Exact repeats collapse; keywords differing only in case stay separate
    assert_eq!(result.get("data").unwrap(), files.as_slice());
    assert_eq!(result.get("DATA").unwrap(), files.as_slice());
    assert_eq!(result.len(), 2);
    Ok(())
}

#[test]
fn test_result_independent_of_worker_count() -> Result<()> {
    let dir = tempdir()?;
    let mut contents = Vec::new();
    for i in 0..23 {
        let body = match i % 4 {
            0 => "python and DATA",
            1 => "OpenAI only",
            2 => "nothing to see",
            _ => "concatenated metadata",
        };
        contents.push((format!("doc_{:02}.txt", i), body.to_string()));
    }
    let named: Vec<(&str, &str)> = contents
        .iter()
        .map(|(n, c)| (n.as_str(), c.as_str()))
        .collect();
    let files = create_test_files(&dir, &named)?;
    let config = keyword_config(&dir);

    let mut baseline = None;
    for workers in [1, 2, 3, 7, 23, 64] {
        let mut executor = ThreadExecutor::new(workers)?;
        let result = search_with(&mut executor, workers, &config, files.clone(), None)?;
        assert_eq!(result.workers, workers.min(files.len()));

        let sets = as_sets(&result);
        match &baseline {
            None => baseline = Some(sets),
            Some(expected) => assert_eq!(&sets, expected, "workers = {}", workers),
        }
    }

    let baseline = baseline.unwrap();
    assert_eq!(baseline["python"].len(), 6);
    assert_eq!(baseline["data"].len(), 11); // "DATA" plus "metadata"
    assert_eq!(baseline["openai"].len(), 6);
    Ok(())
}

#[test]
fn test_merge_soundness_and_completeness() -> Result<()> {
    let dir = tempdir()?;
    let files = create_test_files(
        &dir,
        &[
            ("a.txt", "Rust and Go"),
            ("b.txt", "rustacean"),
            ("c.txt", "golang"),
            ("d.txt", "python"),
        ],
    )?;
    let config = ScanConfig::new(dir.path(), vec!["rust".to_string(), "go".to_string()]);
    let mut executor = ThreadExecutor::new(2)?;
    let result = search_with(&mut executor, 2, &config, files.clone(), None)?;

    for (keyword, matched) in result.iter() {
        for file in matched {
            let content = fs::read_to_string(file)?.to_lowercase();
            assert!(content.contains(keyword), "{} not in {:?}", keyword, file);
        }
    }
    for file in &files {
        let content = fs::read_to_string(file)?.to_lowercase();
        for keyword in ["rust", "go"] {
            if content.contains(keyword) {
                assert!(result.get(keyword).unwrap().contains(file));
            }
        }
    }
    Ok(())
}

#[test]
fn test_unreadable_file_resilience() -> Result<()> {
    let dir = tempdir()?;
    let mut files = scenario(&dir)?;
    let broken = dir.path().join("broken.txt");
    fs::write(&broken, b"python \xff\xfe data")?;
    files.insert(1, broken.clone());
    let missing = dir.path().join("vanished.txt");
    files.push(missing.clone());

    let config = keyword_config(&dir);
    let mut executor = ThreadExecutor::new(2)?;
    let result = search_with(&mut executor, 2, &config, files.clone(), None)?;

    let healthy: Vec<PathBuf> = files
        .iter()
        .filter(|p| **p != broken && **p != missing)
        .cloned()
        .collect();
    assert_eq!(as_sets(&result), expected_scenario(&healthy));

    let unreadable: BTreeSet<_> = result.unreadable.iter().cloned().collect();
    assert_eq!(unreadable, BTreeSet::from([broken, missing]));
    assert_eq!(result.stats.files_failed, 2);
    assert_eq!(result.stats.files_scanned, 3);
    Ok(())
}

#[test]
fn test_lossy_encoding_reads_invalid_utf8() -> Result<()> {
    let dir = tempdir()?;
    let broken = dir.path().join("broken.txt");
    fs::write(&broken, b"python \xff\xfe data")?;

    let config = ScanConfig {
        encoding_mode: EncodingMode::Lossy,
        strategy: StrategyChoice::Thread,
        ..keyword_config(&dir)
    };
    let result = search::scan(&config)?;
    assert_eq!(result.get("python").unwrap(), &[broken.clone()]);
    assert_eq!(result.get("data").unwrap(), &[broken]);
    assert!(result.unreadable.is_empty());
    Ok(())
}

#[test]
fn test_empty_file_set() -> Result<()> {
    let dir = tempdir()?;
    let config = keyword_config(&dir);
    let mut executor = ThreadExecutor::new(4)?;
    let result = search_with(&mut executor, 4, &config, Vec::new(), None)?;
    assert!(result.is_empty());
    assert_eq!(result.workers, 0);

    assert!(matches!(
        search::scan(&config),
        Err(SearchError::NoTextFiles(_))
    ));
    Ok(())
}

#[test]
fn test_missing_directory() {
    let dir = tempdir().unwrap();
    let config = ScanConfig::new(dir.path().join("nope"), vec!["python".to_string()]);
    assert!(matches!(
        search::scan(&config),
        Err(SearchError::DirectoryNotFound(_))
    ));
}

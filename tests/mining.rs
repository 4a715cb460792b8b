use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use x16r::algorithm::{DigestSuite, HeaderTemplate, Scanner, Solution, Target, hash_header};
use x16r::{Miner, MinerConfig, MinerError, Work, WorkContext, mine};

fn header() -> HeaderTemplate {
    let mut bytes = [0u8; 80];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = (i as u8).wrapping_mul(7);
    }
    HeaderTemplate::new(bytes)
}

fn config(threads: usize, lanes: usize, end: u32) -> MinerConfig {
    MinerConfig {
        threads: Some(threads),
        lanes: Some(lanes),
        nonce_start: 0,
        nonce_end: end,
        chunk_size: 37,
        stop_on_first: false,
        ..MinerConfig::default()
    }
}

fn sorted_nonces(solutions: &[Solution]) -> Vec<u32> {
    let mut nonces: Vec<u32> = solutions.iter().map(|s| s.nonce).collect();
    nonces.sort_unstable();
    nonces
}

#[test]
fn test_threads_find_what_a_single_scan_finds() {
    let target = Target::from_leading_zeros(4);

    let mut scanner = Scanner::new(Arc::new(DigestSuite), 1).unwrap();
    let expected = Mutex::new(Vec::<Solution>::new());
    let summary = scanner.scan(&header(), 0..=511, &target, &AtomicBool::new(false), &expected);
    assert_eq!(summary.attempted, 512);
    let expected = sorted_nonces(&expected.into_inner().unwrap());
    assert!(!expected.is_empty());

    for (threads, lanes) in [(1, 16), (3, 8), (4, 2)] {
        let report = mine(
            Arc::new(DigestSuite),
            Work::new(header(), target),
            &config(threads, lanes, 511),
        )
        .unwrap();

        assert_eq!(report.attempted, 512, "threads {threads} lanes {lanes}");
        assert!(!report.cancelled);
        assert_eq!(sorted_nonces(&report.solutions), expected);
    }
}

#[test]
fn test_reported_digests_verify() {
    let work = Work::new(header(), Target::from_leading_zeros(3));
    let miner = Miner::new(Arc::new(DigestSuite), &config(2, 4, 255)).unwrap();
    let context = WorkContext::new(work, false);

    let report = miner.mine(&context, 0..=255).unwrap();
    assert!(!report.solutions.is_empty());
    for solution in &report.solutions {
        assert!(context.verify(&DigestSuite, solution).unwrap());
        assert_eq!(
            hash_header(&DigestSuite, &header().with_nonce(solution.nonce)).unwrap(),
            solution.digest
        );
    }
}

#[test]
fn test_stop_on_first_cancels_the_search() {
    let config = MinerConfig {
        stop_on_first: true,
        ..config(2, 4, 1 << 20)
    };
    let report = mine(
        Arc::new(DigestSuite),
        Work::new(header(), Target::MAX),
        &config,
    )
    .unwrap();

    assert!(report.cancelled);
    assert!(!report.solutions.is_empty());
    assert!(report.attempted < 1 << 20);
}

#[test]
fn test_work_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("work.json");
    let json = format!(
        r#"{{ "header": "{}", "difficulty": 2 }}"#,
        hex::encode(header().as_bytes())
    );
    std::fs::write(&path, json).unwrap();

    let work = Work::load(&path).unwrap();
    assert_eq!(work.header, header());
    assert_eq!(work.target, Target::from_leading_zeros(2));

    let report = mine(Arc::new(DigestSuite), work, &config(2, 8, 63)).unwrap();
    assert_eq!(report.attempted, 64);
    assert!(!report.solutions.is_empty());
}

#[test]
fn test_unsupported_width_fails_before_mining() {
    let err = Miner::new(Arc::new(DigestSuite), &config(1, 3, 10))
        .err()
        .unwrap();
    assert!(matches!(
        err,
        MinerError::Core(x16r::algorithm::Error::UnsupportedBatchWidth(3))
    ));
}

#[test]
fn test_benchmark_hits_are_not_submitted() {
    let miner = Miner::new(Arc::new(DigestSuite), &config(2, 4, 255)).unwrap();
    let context = WorkContext::benchmark(Work::new(header(), Target::MAX));

    let report = miner.mine(&context, 0..=255).unwrap();
    assert_eq!(report.attempted, 256);
    assert!(report.solutions.is_empty());
    assert!(!report.cancelled);
}

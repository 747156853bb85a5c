//! Hi-Lo generation over instrumented sequence stores.

use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use txscope_idgen::{
    HiLoIdGenerator, IdError, IdGenerator, Sequence, SequenceConfig, SequenceIdGenerator,
};
use txscope_testkit::{
    block_size_strategy, call_count_strategy, counting_hilo, counting_sequence, init_tracing,
    start_value_strategy, stress_concurrent_draws, StressConfig, TempSequenceStore,
};

#[test]
fn increment_ten_serves_one_block_per_ten_ids() {
    init_tracing();
    let (store, generator) = counting_hilo::<i64>(1, 10);

    let ids: Vec<i64> = (0..10).map(|_| generator.next_id().unwrap()).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    assert_eq!(store.next_value_calls(), 1);

    assert_eq!(generator.next_id().unwrap(), 11);
    assert_eq!(store.next_value_calls(), 2);
    assert_eq!(generator.blocks_fetched(), 2);
}

#[test]
fn n_plus_one_calls_fetch_exactly_twice() {
    for block in [2i64, 7, 64] {
        let (store, generator) = counting_hilo::<i64>(1, block);
        for _ in 0..=block {
            generator.next_id().unwrap();
        }
        assert_eq!(store.next_value_calls(), 2, "block size {block}");
    }
}

#[test]
fn block_size_one_reads_the_store_every_call() {
    let (store, generator) = counting_hilo::<i64>(5, 1);

    let ids: Vec<i64> = (0..4).map(|_| generator.next_id().unwrap()).collect();

    assert_eq!(ids, vec![5, 6, 7, 8]);
    assert_eq!(store.next_value_calls(), 4);
}

#[test]
fn sequence_generator_reads_the_store_every_call() {
    let (store, sequence) =
        counting_sequence::<i64>(SequenceConfig::new("invoice_ids").with_start(100));
    let generator = SequenceIdGenerator::new(sequence);

    assert_eq!(generator.next_id().unwrap(), 100);
    assert_eq!(generator.next_id().unwrap(), 101);
    assert_eq!(store.next_value_calls(), 2);
}

#[test]
fn failed_read_is_surfaced_and_next_call_retries() {
    let (store, generator) = counting_hilo::<i64>(1, 10);
    store.fail_next_reads(1);

    let error = generator.next_id().unwrap_err();
    assert!(error.is_store_unavailable());
    assert_eq!(generator.blocks_fetched(), 0);

    assert_eq!(generator.next_id().unwrap(), 1);
    assert_eq!(store.next_value_calls(), 2);
}

#[test]
fn failure_at_block_boundary_does_not_reuse_the_old_block() {
    let (store, generator) = counting_hilo::<i64>(1, 3);
    for expected in 1..=3 {
        assert_eq!(generator.next_id().unwrap(), expected);
    }
    store.fail_next_reads(2);

    assert!(generator.next_id().is_err());
    assert!(generator.next_id().is_err());
    assert_eq!(generator.next_id().unwrap(), 4);
}

#[test]
fn empty_read_is_a_data_integrity_error() {
    let (store, generator) = counting_hilo::<i64>(1, 10);
    store.answer_empty_next_reads(1);

    let error = generator.next_id().unwrap_err();

    assert!(error.is_data_integrity());
    assert!(matches!(error, IdError::NoValue { .. }));
    assert_eq!(generator.next_id().unwrap(), 1);
}

#[test]
fn narrow_identifier_type_reports_overflow() {
    let (_, generator) = counting_hilo::<i32>(i64::from(i32::MAX) + 1, 10);

    let error = generator.next_id().unwrap_err();

    assert!(matches!(error, IdError::Overflow { .. }));
}

#[test]
fn block_ending_at_type_maximum_is_served_completely() {
    let (_, generator) = counting_hilo::<i32>(i64::from(i32::MAX) - 3, 4);

    let ids: Vec<i32> = (0..4).map(|_| generator.next_id().unwrap()).collect();

    assert_eq!(ids.last(), Some(&i32::MAX));
    assert!(generator.next_id().is_err());
}

#[test]
fn concurrent_callers_never_share_an_id() {
    init_tracing();
    let (store, generator) = counting_hilo::<i64>(1, 100);
    store.delay_reads(Duration::from_millis(2));
    let config = StressConfig {
        threads: 8,
        ids_per_thread: 250,
    };

    let result = stress_concurrent_draws(Arc::new(generator), &config);

    assert_eq!(result.failed, 0);
    assert!(result.all_distinct());
    assert!(result.increasing_per_thread());
    let mut ids = result.ids();
    ids.sort_unstable();
    assert_eq!(ids, (1..=2_000).collect::<Vec<i64>>());
    assert!(store.next_value_calls() <= config.total().div_ceil(100));
}

#[test]
fn generators_over_one_file_sequence_never_overlap() {
    let fixture = TempSequenceStore::new();
    let config = SequenceConfig::new("shared_ids").with_increment(16);
    let first: Sequence<i64, _> = Sequence::new(Arc::clone(&fixture.store), config.clone()).unwrap();
    first.ensure_sequence().unwrap();
    let second: Sequence<i64, _> = Sequence::new(Arc::new(fixture.reopen()), config).unwrap();
    let first = Arc::new(HiLoIdGenerator::new(first));
    let second = Arc::new(HiLoIdGenerator::new(second));

    let handles: Vec<_> = [first, second]
        .into_iter()
        .map(|generator| {
            std::thread::spawn(move || {
                (0..200)
                    .map(|_| generator.next_id().unwrap())
                    .collect::<Vec<i64>>()
            })
        })
        .collect();
    let mut ids: Vec<i64> = handles
        .into_iter()
        .flat_map(|handle| handle.join().unwrap())
        .collect();
    ids.sort_unstable();
    let before = ids.len();
    ids.dedup();

    assert_eq!(ids.len(), before);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ids_are_contiguous_and_reads_are_minimal(
        start in start_value_strategy(),
        block in block_size_strategy(),
        calls in call_count_strategy(),
    ) {
        let (store, generator) = counting_hilo::<i64>(start, block);

        let ids: Vec<i64> = (0..calls).map(|_| generator.next_id().unwrap()).collect();

        let expected: Vec<i64> = (0..calls as i64).map(|i| start + i).collect();
        prop_assert_eq!(ids, expected);
        let blocks = (calls as i64 + block - 1) / block;
        prop_assert_eq!(store.next_value_calls() as i64, blocks);
    }
}

//! Property-based test generators using proptest.

use proptest::prelude::*;
use txscope_idgen::SequenceConfig;

/// Strategy for Hi-Lo block sizes, including the degenerate size 1.
pub fn block_size_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![Just(1i64), 2i64..=64, Just(1000i64)]
}

/// Strategy for sequence start values.
pub fn start_value_strategy() -> impl Strategy<Value = i64> {
    -10_000i64..=10_000
}

/// Strategy for the number of identifiers drawn in one test case.
pub fn call_count_strategy() -> impl Strategy<Value = usize> {
    0usize..=300
}

/// Strategy for valid SQL identifiers.
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_][a-z0-9_]{0,30}").expect("Invalid regex")
}

/// Strategy for valid sequence configurations.
pub fn sequence_config_strategy() -> impl Strategy<Value = SequenceConfig> {
    (
        prop::option::of(identifier_strategy()),
        identifier_strategy(),
        start_value_strategy(),
        block_size_strategy(),
    )
        .prop_map(|(schema, name, start, increment)| {
            let config = SequenceConfig::new(name)
                .with_start(start)
                .with_increment(increment);
            match schema {
                Some(schema) => config.with_schema(schema),
                None => config,
            }
        })
}

//! Typed durable sequences.

use crate::config::SequenceConfig;
use crate::error::{IdError, IdResult};
use crate::store::{SequenceName, SequenceStore};
use crate::value::IdValue;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info};

/// A durable counter in a [`SequenceStore`], read as identifier type `T`.
///
/// The increment is fixed at construction and doubles as the Hi-Lo block
/// size.
pub struct Sequence<T: IdValue, S: SequenceStore + ?Sized> {
    store: Arc<S>,
    name: SequenceName,
    start_with: i64,
    increment: T,
    raw_increment: i64,
    _id: PhantomData<fn() -> T>,
}

impl<T: IdValue, S: SequenceStore + ?Sized> Sequence<T, S> {
    /// Creates a sequence handle. Nothing is sent to the store.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the increment does not fit
    /// `T`.
    pub fn new(store: Arc<S>, config: SequenceConfig) -> IdResult<Self> {
        config.validate()?;
        let increment = T::from_i64(config.increment).ok_or_else(|| {
            IdError::invalid_config(format!(
                "increment {} does not fit the identifier type",
                config.increment
            ))
        })?;
        Ok(Self {
            store,
            name: SequenceName::new(config.schema, config.name),
            start_with: config.start_with,
            increment,
            raw_increment: config.increment,
            _id: PhantomData,
        })
    }

    /// Returns the qualified name.
    pub fn name(&self) -> &SequenceName {
        &self.name
    }

    /// Returns the increment.
    pub fn increment(&self) -> T {
        self.increment
    }

    /// Creates the sequence unless it already exists.
    ///
    /// Meant to run once during bootstrapping. The check and the creation
    /// are two separate store calls.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub fn ensure_sequence(&self) -> IdResult<()> {
        info!(sequence = %self.name, "Ensuring existence of sequence");
        if self.store.exists(&self.name)? {
            info!(sequence = %self.name, "Sequence exists");
            return Ok(());
        }
        info!(
            sequence = %self.name,
            start_with = self.start_with,
            increment = self.raw_increment,
            "Sequence does not exist yet and will be created now"
        );
        self.store
            .create(&self.name, self.start_with, self.raw_increment)?;
        info!(sequence = %self.name, "Sequence created");
        Ok(())
    }

    /// Reads the next value with one store round trip.
    ///
    /// # Errors
    ///
    /// Returns a data-integrity error when the store yields no value or a
    /// value outside `T`, and propagates store failures.
    pub fn next_value(&self) -> IdResult<T> {
        let raw = self
            .store
            .next_value(&self.name)?
            .ok_or_else(|| IdError::no_value(&self.name))?;
        let value = T::from_i64(raw).ok_or_else(|| {
            IdError::overflow(format!("{} returned {raw}", self.name))
        })?;
        debug!(sequence = %self.name, value = %value, "Sequence served next value");
        Ok(value)
    }
}

impl<T: IdValue, S: SequenceStore + ?Sized> std::fmt::Debug for Sequence<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequence")
            .field("name", &self.name)
            .field("start_with", &self.start_with)
            .field("increment", &self.increment)
            .finish()
    }
}

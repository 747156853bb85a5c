//! Registry of long-lived generators keyed by identifier kind.

use crate::error::{IdError, IdResult};
use crate::generator::IdGenerator;
use crate::value::IdValue;
use parking_lot::RwLock;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Marker for one kind of identifier, such as the ids of one entity type.
///
/// ```ignore
/// struct OrderId;
///
/// impl IdKind for OrderId {
///     type Value = i64;
/// }
/// ```
pub trait IdKind: 'static {
    /// Numeric type of the identifiers.
    type Value: IdValue;
}

type SharedGenerator<T> = Arc<dyn IdGenerator<T>>;

/// Holds one generator per [`IdKind`].
///
/// Generators are registered once at startup and shared afterwards, so
/// every caller resolving the same kind draws from the same block.
#[derive(Default)]
pub struct IdGenerators {
    generators: RwLock<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl IdGenerators {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the generator for kind `K`, replacing any previous one.
    pub fn register<K, G>(&self, generator: G)
    where
        K: IdKind,
        G: IdGenerator<K::Value> + 'static,
    {
        let shared: SharedGenerator<K::Value> = Arc::new(generator);
        info!(kind = type_name::<K>(), "Registered identifier generator");
        self.generators
            .write()
            .insert(TypeId::of::<K>(), Box::new(shared));
    }

    /// Returns the generator registered for `K`.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::GeneratorNotRegistered`] if none was registered.
    pub fn get<K: IdKind>(&self) -> IdResult<SharedGenerator<K::Value>> {
        self.generators
            .read()
            .get(&TypeId::of::<K>())
            .and_then(|entry| entry.downcast_ref::<SharedGenerator<K::Value>>())
            .cloned()
            .ok_or_else(|| IdError::GeneratorNotRegistered {
                key: type_name::<K>(),
            })
    }

    /// Draws the next identifier of kind `K`.
    ///
    /// # Errors
    ///
    /// Fails if no generator is registered or the generator fails.
    pub fn next_id<K: IdKind>(&self) -> IdResult<K::Value> {
        self.get::<K>()?.next_id()
    }

    /// Returns true if a generator is registered for `K`.
    pub fn contains<K: IdKind>(&self) -> bool {
        self.generators.read().contains_key(&TypeId::of::<K>())
    }

    /// Returns the number of registered kinds.
    pub fn len(&self) -> usize {
        self.generators.read().len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.generators.read().is_empty()
    }
}

impl std::fmt::Debug for IdGenerators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerators")
            .field("kinds", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct OrderId;
    impl IdKind for OrderId {
        type Value = i64;
    }

    struct TicketId;
    impl IdKind for TicketId {
        type Value = i32;
    }

    struct Counter(AtomicI64);

    impl IdGenerator<i64> for Counter {
        fn next_id(&self) -> IdResult<i64> {
            Ok(self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    struct Fixed;

    impl IdGenerator<i32> for Fixed {
        fn next_id(&self) -> IdResult<i32> {
            Ok(7)
        }
    }

    #[test]
    fn resolves_registered_generators() {
        let registry = IdGenerators::new();
        registry.register::<OrderId, _>(Counter(AtomicI64::new(100)));
        registry.register::<TicketId, _>(Fixed);

        assert_eq!(registry.next_id::<OrderId>().unwrap(), 100);
        assert_eq!(registry.next_id::<TicketId>().unwrap(), 7);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn resolved_generator_is_shared() {
        let registry = IdGenerators::new();
        registry.register::<OrderId, _>(Counter(AtomicI64::new(1)));

        let a = registry.get::<OrderId>().unwrap();
        let b = registry.get::<OrderId>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.next_id().unwrap(), 1);
        assert_eq!(b.next_id().unwrap(), 2);
    }

    #[test]
    fn unregistered_kind_is_an_error() {
        let registry = IdGenerators::new();
        assert!(!registry.contains::<OrderId>());
        let error = registry.next_id::<OrderId>().unwrap_err();
        assert!(matches!(error, IdError::GeneratorNotRegistered { .. }));
        assert!(error.to_string().contains("OrderId"));
    }
}

//! Type identity used to index the registries.

use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The registry key for a request or notification type.
///
/// Derived from the type itself, never from a caller-supplied string, so two
/// distinct types can never collide. Only the [`TypeId`] takes part in
/// equality and hashing; the name is carried for error messages.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: type_name::<T>() }
    }

    pub fn id(&self) -> TypeId { self.id }
    pub fn name(&self) -> &'static str { self.name }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    struct Pong;

    #[test]
    fn test_same_type_same_key() {
        assert_eq!(TypeKey::of::<Ping>(), TypeKey::of::<Ping>());
        assert_ne!(TypeKey::of::<Ping>(), TypeKey::of::<Pong>());
    }

    #[test]
    fn test_name_is_diagnostic_only() {
        let key = TypeKey::of::<Ping>();
        assert!(key.name().ends_with("Ping"));
        assert_eq!(key.to_string(), key.name());
    }

    #[test]
    fn test_generic_instantiations_are_distinct() {
        assert_ne!(TypeKey::of::<Vec<u8>>(), TypeKey::of::<Vec<u16>>());
    }
}

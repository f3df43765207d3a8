//! The type-erased value that travels through the middleware chain.
//!
//! Middleware is written once and applied to every request type, so it cannot
//! see `R` or `R::Response`. The dispatcher boxes the request into an
//! [`Envelope`] on the way in and the handler adapter boxes the response on
//! the way out. The only checked unwraps happen at the two ends of the chain:
//! the handler adapter (request) and [`Mediator::send`](crate::Mediator::send)
//! (response).

use std::any::{Any, type_name};
use std::fmt;

/// An opaque, owned value of some `'static + Send` type.
pub struct Envelope {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl Envelope {
    pub fn new<T: Any + Send>(value: T) -> Self {
        Self { value: Box::new(value), type_name: type_name::<T>() }
    }

    /// Name of the type currently held, for diagnostics.
    pub fn type_name(&self) -> &'static str { self.type_name }

    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Mutable access, so a behavior can rewrite a request or response in
    /// place without changing its type.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut()
    }

    /// Takes the value out. On a type mismatch the envelope is handed back
    /// untouched.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { value, type_name }),
        }
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Envelope").field(&self.type_name).finish()
    }
}

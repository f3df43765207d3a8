//! Composition of registered behaviors into one pipeline.
//!
//! The chain is stored as a single composed [`Behavior`], not as a list, so
//! building the pipeline for a dispatch is one call regardless of how many
//! registration calls produced it.
//!
//! Given the current composition `C` and a newly registered list
//! `[b1, b2, …, bn]`, the new composition is
//!
//! ```text
//! next  ↦  b1(b2(…bn(C(next))…))
//! ```
//!
//! so `b1` is outermost within its own list, and the whole new list sits
//! outside `C`. With no registrations the pipeline is the terminal stage
//! itself.

use super::{Behavior, Next};

#[derive(Clone, Default)]
pub(crate) struct Chain {
    composed: Option<Behavior>,
}

impl Chain {
    /// Adds a layer of behaviors outside the current composition. An empty
    /// list leaves the chain unchanged.
    pub(crate) fn push(&mut self, behaviors: Vec<Behavior>) {
        if behaviors.is_empty() {
            return;
        }

        let inner = self.composed.take();
        self.composed = Some(Behavior::new(move |next| {
            let mut next = match &inner {
                Some(inner) => inner.wrap(next),
                None => next,
            };
            for behavior in behaviors.iter().rev() {
                next = behavior.wrap(next);
            }
            next
        }));
    }

    /// Wraps the terminal stage in every registered behavior.
    pub(crate) fn build(&self, terminal: Next) -> Next {
        match &self.composed {
            Some(composed) => composed.wrap(terminal),
            None => terminal,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.composed.is_none()
    }
}

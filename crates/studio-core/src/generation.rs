//! Generation tags for asynchronous results.
//!
//! Each state container bumps its generation whenever the state an
//! in-flight request targets is replaced. Results carry the generation
//! they were issued under and are dropped when it no longer matches.

use std::fmt;

/// Monotonic state generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The following generation.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Advance in place and return the new value.
    pub fn bump(&mut self) -> Self {
        *self = self.next();
        *self
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value paired with the generation it was produced for.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub generation: Generation,
    pub value: T,
}

impl<T> Tagged<T> {
    pub fn new(generation: Generation, value: T) -> Self {
        Self { generation, value }
    }

    /// Keep the tag, transform the payload.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Tagged<U> {
        Tagged {
            generation: self.generation,
            value: f(self.value),
        }
    }
}

//! String interning for identifiers and property names.
//!
//! Two tables exist, matching spec.md §3.7 / §5:
//!
//! * [`intern_global`] — a process-wide table, append-only, guarded by a
//!   mutex. Used for the small set of strings every interpreter needs
//!   regardless of the script it runs (well-known property names such as
//!   `length`, `prototype`, `constructor`).
//! * [`Interner`] — a per-interpreter table owned by an [`crate::Interpreter`].
//!   Populated during lexing and consulted for identifier equality and
//!   property lookups for the lifetime of that interpreter.
//!
//! Interning is the canonicalization spec.md §8 calls out: two interned
//! strings are equal iff their [`StringId`]s are equal, which lets property
//! lookups compare integers instead of code-unit sequences.

use std::sync::{Mutex, OnceLock};

use ahash::AHashMap;

/// Index into an interning table.
///
/// `u32` keeps this cheap to copy and to use as a hash map key; no script is
/// expected to intern anywhere near 4 billion distinct strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct StringId(u32);

impl StringId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).expect("intern table exhausted"))
    }
}

/// Per-interpreter string intern table.
///
/// Strings interned here live for the lifetime of the owning interpreter.
/// Lookups are O(1) amortized via an auxiliary hash map from content to id.
#[derive(Debug, Default)]
pub struct Interner {
    strings: Vec<Box<str>>,
    lookup: AHashMap<Box<str>, StringId>,
}

impl Interner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `s`, returning the canonical [`StringId`].
    ///
    /// `intern(intern(s)) == intern(s)` as ids (spec.md §8's interning law);
    /// two calls with code-unit-identical strings always return the same id.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.lookup.get(s) {
            return id;
        }
        let id = StringId::from_index(self.strings.len());
        self.strings.push(s.into());
        self.lookup.insert(s.into(), id);
        id
    }

    #[must_use]
    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

/// Process-wide intern table.
///
/// spec.md §5 calls this out as the one piece of shared mutable state in the
/// design: "a write-once-per-string append; an implementation may serialize
/// this with a mutex without affecting behavior." A plain `Mutex<Interner>`
/// satisfies that directly; there is no need for anything fancier since
/// entries are never removed.
static GLOBAL_INTERNER: OnceLock<Mutex<Interner>> = OnceLock::new();

fn global() -> &'static Mutex<Interner> {
    GLOBAL_INTERNER.get_or_init(|| Mutex::new(Interner::new()))
}

/// Interns `s` in the process-wide table.
///
/// Use for strings that are meaningful across every interpreter instance in
/// the process. Most script-level identifiers should go through a
/// per-interpreter [`Interner`] instead so that dropping an interpreter can
/// eventually reclaim its table.
pub fn intern_global(s: &str) -> StringId {
    global().lock().unwrap_or_else(std::sync::PoisonError::into_inner).intern(s)
}

#[must_use]
pub fn resolve_global(id: StringId) -> String {
    global()
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .resolve(id)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut interner = Interner::new();
        let a = interner.intern("length");
        let b = interner.intern("length");
        assert_eq!(a, b);
        assert_eq!(interner.resolve(a), "length");
    }

    #[test]
    fn distinct_content_gets_distinct_ids() {
        let mut interner = Interner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        assert_ne!(a, b);
    }
}

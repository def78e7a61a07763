//! Invariant checking for deterministic simulation testing.
//!
//! Invariants are properties every rendered [`SessionView`] must satisfy,
//! whatever sequence of frames, commands and HTTP completions produced it.
//!
//! # Usage
//!
//! ```ignore
//! let registry = InvariantRegistry::standard();
//! registry.check_all(&session.view())?;
//! ```

mod checks;

pub use checks::{ConversationsUnique, TimelineBelongsToActive, TimelineOrdered, UniqueMessageIds};
use parley_app::SessionView;

/// Invariant check result.
pub type InvariantResult = Result<(), Violation>;

/// Invariant violation with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Name of the violated invariant.
    pub invariant: &'static str,
    /// Description of what went wrong.
    pub message: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property checked against a rendered view.
pub trait Invariant {
    /// Invariant name for error reporting.
    fn name(&self) -> &'static str;

    /// Returns `Ok(())` if the invariant holds, or a [`Violation`]
    /// describing what went wrong.
    fn check(&self, view: &SessionView) -> InvariantResult;
}

/// Registry of invariants to check.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard view invariants.
    ///
    /// Includes:
    /// - [`TimelineOrdered`]: timeline sorted by send time
    /// - [`TimelineBelongsToActive`]: timeline only holds the active conversation
    /// - [`UniqueMessageIds`]: no message id appears twice
    /// - [`ConversationsUnique`]: one entry per counterpart
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(TimelineOrdered);
        registry.add(TimelineBelongsToActive);
        registry.add(UniqueMessageIds);
        registry.add(ConversationsUnique);
        registry
    }

    /// Add an invariant to the registry.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Check all invariants against `view`.
    ///
    /// # Errors
    ///
    /// Returns every violation found.
    pub fn check_all(&self, view: &SessionView) -> Result<(), Vec<Violation>> {
        let violations: Vec<_> = self.invariants.iter().filter_map(|inv| inv.check(view).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Check all invariants, panicking with every violation.
    ///
    /// # Panics
    ///
    /// If any invariant is violated.
    #[allow(clippy::panic, reason = "Test assertion helper")]
    pub fn assert_all(&self, view: &SessionView, context: &str) {
        if let Err(violations) = self.check_all(view) {
            let messages: Vec<_> = violations.iter().map(ToString::to_string).collect();
            panic!("Invariant violation {context}:\n  {}", messages.join("\n  "));
        }
    }

    /// Number of registered invariants.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}

impl std::fmt::Debug for InvariantRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.invariants.iter().map(|inv| inv.name()).collect();
        f.debug_struct("InvariantRegistry").field("invariants", &names).finish()
    }
}

use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::store::Versionstamp;

/// Precondition of an atomic operation: the key must currently carry `versionstamp`, or be
/// absent when `versionstamp` is `None`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AtomicCheck {
    pub key: Vec<u8>,
    pub versionstamp: Option<Versionstamp>,
}

/// A write inside an atomic operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    Set { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl Mutation {
    pub fn key(&self) -> &[u8] {
        match self {
            Mutation::Set { key, .. } => key,
            Mutation::Delete { key } => key,
        }
    }
}

/// A set of checks and mutations committed as one unit.
///
/// Mutations apply in insertion order, so a later mutation of the same key wins. The store
/// applies all of them or, when any check fails, none.
///
/// # Examples
///
/// ```rust,ignore
/// let mut op = AtomicOperation::new();
/// op.check(key.clone(), None)   // key must not exist yet
///   .set(key, value);
/// match store.commit(op)? {
///     CommitResult::Committed(stamp) => println!("written at {}", stamp),
///     CommitResult::Conflict => println!("someone else got there first"),
/// }
/// ```
#[derive(Clone, Debug, Default)]
pub struct AtomicOperation {
    checks: Vec<AtomicCheck>,
    mutations: Vec<Mutation>,
}

impl AtomicOperation {
    pub fn new() -> Self {
        AtomicOperation::default()
    }

    pub fn check(&mut self, key: Vec<u8>, versionstamp: Option<Versionstamp>) -> &mut Self {
        self.checks.push(AtomicCheck { key, versionstamp });
        self
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.mutations.push(Mutation::Set { key, value });
        self
    }

    pub fn delete(&mut self, key: Vec<u8>) -> &mut Self {
        self.mutations.push(Mutation::Delete { key });
        self
    }

    pub fn checks(&self) -> &[AtomicCheck] {
        &self.checks
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn into_parts(self) -> (Vec<AtomicCheck>, Vec<Mutation>) {
        (self.checks, self.mutations)
    }

    /// Number of checks plus mutations, the figure store limits apply to.
    pub fn size(&self) -> usize {
        self.checks.len() + self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty() && self.mutations.is_empty()
    }

    /// Checks the operation against a backend's limits before it is applied.
    pub fn validate(&self, max_value_size: usize, max_operations: usize) -> TesseraResult<()> {
        if self.size() > max_operations {
            log::error!(
                "Atomic operation carries {} checks and mutations, limit is {}",
                self.size(),
                max_operations
            );
            return Err(TesseraError::new(
                &format!(
                    "Atomic operation carries {} checks and mutations, limit is {}",
                    self.size(),
                    max_operations
                ),
                ErrorKind::InvalidOperation,
            ));
        }

        for mutation in &self.mutations {
            if let Mutation::Set { value, .. } = mutation {
                if value.len() > max_value_size {
                    log::error!(
                        "Value of {} bytes exceeds the entry limit of {} bytes",
                        value.len(),
                        max_value_size
                    );
                    return Err(TesseraError::new(
                        &format!(
                            "Value of {} bytes exceeds the entry limit of {} bytes",
                            value.len(),
                            max_value_size
                        ),
                        ErrorKind::ValueTooLarge,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Outcome of committing an [`AtomicOperation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitResult {
    Committed(Versionstamp),
    /// A check failed; nothing was written.
    Conflict,
}

impl CommitResult {
    pub fn is_committed(&self) -> bool {
        matches!(self, CommitResult::Committed(_))
    }

    pub fn versionstamp(&self) -> Option<Versionstamp> {
        match self {
            CommitResult::Committed(stamp) => Some(*stamp),
            CommitResult::Conflict => None,
        }
    }
}

use crate::store::Versionstamp;

/// Options of the conditional writes: [`Collection::set`](crate::collection::Collection::set),
/// [`Collection::update`](crate::collection::Collection::update) and
/// [`Collection::delete_with`](crate::collection::Collection::delete_with).
///
/// Without an expected version the write applies to whatever is stored. With one, it only
/// commits while the stored versionstamp still matches and otherwise fails with
/// [`WriteFailure::VersionMismatch`](crate::collection::WriteFailure::VersionMismatch).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub expected_version: Option<Versionstamp>,
}

impl WriteOptions {
    pub fn new() -> Self {
        WriteOptions::default()
    }

    pub fn expected_version(mut self, version: Versionstamp) -> Self {
        self.expected_version = Some(version);
        self
    }
}

pub fn if_version(version: Versionstamp) -> WriteOptions {
    WriteOptions::new().expected_version(version)
}

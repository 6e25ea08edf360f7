use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Opaque version token stamped by the store on every committed write.
///
/// Versionstamps grow monotonically with each commit of a store. Callers should only compare
/// them for equality; the hex rendering is stable and can round-trip through [`FromStr`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Versionstamp(u64);

impl Versionstamp {
    pub const fn new(value: u64) -> Self {
        Versionstamp(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Display for Versionstamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:020x}", self.0)
    }
}

impl FromStr for Versionstamp {
    type Err = TesseraError;

    fn from_str(s: &str) -> TesseraResult<Self> {
        u64::from_str_radix(s, 16).map(Versionstamp).map_err(|e| {
            TesseraError::new(
                &format!("Invalid versionstamp '{}': {}", s, e),
                ErrorKind::InvalidOperation,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_fixed_width_hex() {
        assert_eq!(Versionstamp::new(255).to_string(), "000000000000000000ff");
    }

    #[test]
    fn parses_rendered_form() {
        let stamp = Versionstamp::new(1_234_567);
        assert_eq!(stamp.to_string().parse::<Versionstamp>().unwrap(), stamp);
        assert!("not-hex".parse::<Versionstamp>().is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};

/// One element of a logical key tuple.
///
/// Document ids and index values are key parts. Parts of different variants order by variant
/// first (`Bytes < String < Float < Int < Bool`) and then by value; floats use the IEEE-754
/// total order, so every value, `NaN` included, has a stable position.
///
/// # Examples
///
/// ```rust
/// use tessera::key::KeyPart;
///
/// assert!(KeyPart::from("zebra") < KeyPart::from(1.5));
/// assert!(KeyPart::from(1.5) < KeyPart::from(-3_i64));
/// assert!(KeyPart::from(false) < KeyPart::from(true));
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum KeyPart {
    Bytes(Vec<u8>),
    String(String),
    Float(f64),
    Int(i64),
    Bool(bool),
}

impl KeyPart {
    fn rank(&self) -> u8 {
        match self {
            KeyPart::Bytes(_) => 0,
            KeyPart::String(_) => 1,
            KeyPart::Float(_) => 2,
            KeyPart::Int(_) => 3,
            KeyPart::Bool(_) => 4,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            KeyPart::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            KeyPart::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl PartialEq for KeyPart {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyPart {}

impl PartialOrd for KeyPart {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyPart {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyPart::Bytes(a), KeyPart::Bytes(b)) => a.cmp(b),
            (KeyPart::String(a), KeyPart::String(b)) => a.cmp(b),
            (KeyPart::Float(a), KeyPart::Float(b)) => a.total_cmp(b),
            (KeyPart::Int(a), KeyPart::Int(b)) => a.cmp(b),
            (KeyPart::Bool(a), KeyPart::Bool(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl Hash for KeyPart {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            KeyPart::Bytes(b) => b.hash(state),
            KeyPart::String(s) => s.hash(state),
            KeyPart::Float(f) => f.to_bits().hash(state),
            KeyPart::Int(i) => i.hash(state),
            KeyPart::Bool(b) => b.hash(state),
        }
    }
}

impl Display for KeyPart {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyPart::Bytes(bytes) => {
                write!(f, "0x")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
            KeyPart::String(s) => write!(f, "{}", s),
            KeyPart::Float(v) => write!(f, "{}", v),
            KeyPart::Int(v) => write!(f, "{}", v),
            KeyPart::Bool(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for KeyPart {
    fn from(value: &str) -> Self {
        KeyPart::String(value.to_string())
    }
}

impl From<String> for KeyPart {
    fn from(value: String) -> Self {
        KeyPart::String(value)
    }
}

impl From<&String> for KeyPart {
    fn from(value: &String) -> Self {
        KeyPart::String(value.clone())
    }
}

impl From<i64> for KeyPart {
    fn from(value: i64) -> Self {
        KeyPart::Int(value)
    }
}

impl From<i32> for KeyPart {
    fn from(value: i32) -> Self {
        KeyPart::Int(value as i64)
    }
}

impl From<u32> for KeyPart {
    fn from(value: u32) -> Self {
        KeyPart::Int(value as i64)
    }
}

impl From<f64> for KeyPart {
    fn from(value: f64) -> Self {
        KeyPart::Float(value)
    }
}

impl From<bool> for KeyPart {
    fn from(value: bool) -> Self {
        KeyPart::Bool(value)
    }
}

impl From<Vec<u8>> for KeyPart {
    fn from(value: Vec<u8>) -> Self {
        KeyPart::Bytes(value)
    }
}

impl From<&[u8]> for KeyPart {
    fn from(value: &[u8]) -> Self {
        KeyPart::Bytes(value.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn orders_by_variant_before_value() {
        let mut parts = vec![
            KeyPart::Bool(false),
            KeyPart::Int(-10),
            KeyPart::Float(100.0),
            KeyPart::String("a".into()),
            KeyPart::Bytes(vec![0xff]),
        ];
        parts.sort();
        assert_eq!(
            parts,
            vec![
                KeyPart::Bytes(vec![0xff]),
                KeyPart::String("a".into()),
                KeyPart::Float(100.0),
                KeyPart::Int(-10),
                KeyPart::Bool(false),
            ]
        );
    }

    #[test]
    fn floats_use_total_order() {
        assert!(KeyPart::Float(-0.0) < KeyPart::Float(0.0));
        assert!(KeyPart::Float(f64::NEG_INFINITY) < KeyPart::Float(-1e300));
        assert_eq!(KeyPart::Float(f64::NAN), KeyPart::Float(f64::NAN));
    }

    #[test]
    fn equal_parts_hash_equally() {
        let mut set = HashSet::new();
        set.insert(KeyPart::from("alice"));
        set.insert(KeyPart::from(String::from("alice")));
        set.insert(KeyPart::from(7_i32));
        set.insert(KeyPart::from(7_i64));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_renders_plain_values() {
        assert_eq!(KeyPart::from("bob").to_string(), "bob");
        assert_eq!(KeyPart::from(42_i64).to_string(), "42");
        assert_eq!(KeyPart::Bytes(vec![0x0a, 0xff]).to_string(), "0x0aff");
        assert_eq!(KeyPart::from(true).to_string(), "true");
    }
}

use crate::key::KeyPart;
use crate::ID_GENERATOR;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type Derive<O> = Arc<dyn Fn(&O) -> KeyPart + Send + Sync>;

/// How [`Collection::add`](crate::collection::Collection::add) assigns ids.
pub enum IdStrategy<O> {
    /// Random v4 UUID string.
    Uuid,
    /// Time-ordered 63-bit integer; id order follows insertion order.
    Snowflake,
    /// Derived from the stored value. Adding a second document with the same derived id fails
    /// with an id collision.
    Derived(Derive<O>),
}

impl<O: 'static> IdStrategy<O> {
    pub fn derived<K: Into<KeyPart> + 'static>(
        derive: impl Fn(&O) -> K + Send + Sync + 'static,
    ) -> Self {
        IdStrategy::Derived(Arc::new(move |value: &O| -> KeyPart { derive(value).into() }))
    }
}

impl<O> IdStrategy<O> {
    pub fn generate(&self, value: &O) -> KeyPart {
        match self {
            IdStrategy::Uuid => KeyPart::String(uuid::Uuid::new_v4().to_string()),
            IdStrategy::Snowflake => KeyPart::Int(ID_GENERATOR.get_id()),
            IdStrategy::Derived(derive) => derive(value),
        }
    }
}

impl<O> Clone for IdStrategy<O> {
    fn clone(&self) -> Self {
        match self {
            IdStrategy::Uuid => IdStrategy::Uuid,
            IdStrategy::Snowflake => IdStrategy::Snowflake,
            IdStrategy::Derived(derive) => IdStrategy::Derived(derive.clone()),
        }
    }
}

impl<O> Default for IdStrategy<O> {
    fn default() -> Self {
        IdStrategy::Uuid
    }
}

impl<O> Debug for IdStrategy<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            IdStrategy::Uuid => write!(f, "Uuid"),
            IdStrategy::Snowflake => write!(f, "Snowflake"),
            IdStrategy::Derived(_) => write!(f, "Derived"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_random_strings() {
        let strategy = IdStrategy::<()>::Uuid;
        let first = strategy.generate(&());
        let second = strategy.generate(&());
        assert_ne!(first, second);
        assert_eq!(first.as_str().map(str::len), Some(36));
    }

    #[test]
    fn snowflake_ids_follow_insertion_order() {
        let strategy = IdStrategy::<()>::Snowflake;
        let first = strategy.generate(&());
        let second = strategy.generate(&());
        assert!(first < second);
        assert!(first.as_int().is_some());
    }

    #[test]
    fn derived_ids_come_from_the_value() {
        let strategy = IdStrategy::derived(|name: &String| name.to_lowercase());
        assert_eq!(strategy.generate(&"Ada".to_string()), KeyPart::from("ada"));
        assert_eq!(format!("{:?}", strategy), "Derived");
    }
}

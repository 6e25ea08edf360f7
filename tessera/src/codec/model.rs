use crate::errors::TesseraResult;
use std::sync::Arc;

type Transform<I, O> = Arc<dyn Fn(I) -> TesseraResult<O> + Send + Sync>;

/// Maps the insert shape `I` of a collection to its stored shape `O`.
///
/// Most collections store what they are given and use [`Model::identity`]. An asymmetric
/// collection accepts a leaner input and derives the stored value from it, for example by
/// computing fields that the indices read. Reads always produce `O`.
///
/// # Examples
///
/// ```rust,ignore
/// let model = Model::new(|input: NewUser| {
///     Ok(User {
///         email_domain: input.email.split('@').nth(1).unwrap_or_default().to_string(),
///         email: input.email,
///         name: input.name,
///     })
/// });
/// ```
pub struct Model<I, O> {
    transform: Transform<I, O>,
}

impl<I, O> Model<I, O> {
    pub fn new(transform: impl Fn(I) -> TesseraResult<O> + Send + Sync + 'static) -> Self {
        Model {
            transform: Arc::new(transform),
        }
    }

    pub fn apply(&self, input: I) -> TesseraResult<O> {
        (self.transform)(input)
    }
}

impl<O: 'static> Model<O, O> {
    pub fn identity() -> Self {
        Model {
            transform: Arc::new(|value: O| -> TesseraResult<O> { Ok(value) }),
        }
    }
}

impl<I, O> Clone for Model<I, O> {
    fn clone(&self) -> Self {
        Model {
            transform: self.transform.clone(),
        }
    }
}

use crate::codec::{Model, SerializationMode};
use crate::collection::IdStrategy;
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::index::{IndexDescriptor, IndexKind};
use crate::key::{validate_name, KeyPart};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Declares a collection: its name, value model, id strategy, indices and serialization mode.
///
/// Like the database builder, a `CollectionBuilder` records the first configuration error and
/// returns it from [`build`](CollectionBuilder::build).
///
/// # Examples
///
/// ```rust,ignore
/// let users = CollectionBuilder::<User>::new("users")
///     .id_strategy(IdStrategy::Snowflake)
///     .primary_index("email", |u: &User| u.email.clone())
///     .secondary_index("city", |u: &User| u.city.clone())
///     .serialization(SerializationMode::Binary)
///     .build()?;
/// let users = db.collection(&users)?;
/// ```
pub struct CollectionBuilder<I, O = I> {
    name: String,
    model: Model<I, O>,
    id_strategy: IdStrategy<O>,
    indices: Vec<IndexDescriptor<O>>,
    serialization: SerializationMode<O>,
    error: Option<TesseraError>,
}

impl<O: 'static> CollectionBuilder<O, O> {
    /// A collection that stores values as they are given.
    pub fn new(name: &str) -> Self {
        CollectionBuilder::with_model(name, Model::identity())
    }
}

impl<I: 'static, O: 'static> CollectionBuilder<I, O> {
    /// A collection whose insert shape `I` is turned into the stored shape `O` by `model`.
    pub fn with_model(name: &str, model: Model<I, O>) -> Self {
        CollectionBuilder {
            name: name.to_string(),
            model,
            id_strategy: IdStrategy::default(),
            indices: Vec::new(),
            serialization: SerializationMode::default(),
            error: None,
        }
    }

    pub fn id_strategy(mut self, id_strategy: IdStrategy<O>) -> Self {
        self.id_strategy = id_strategy;
        self
    }

    /// Declares an index allowing at most one document per value.
    pub fn primary_index<K: Into<KeyPart> + 'static>(
        self,
        name: &str,
        accessor: impl Fn(&O) -> K + Send + Sync + 'static,
    ) -> Self {
        self.index(IndexDescriptor::new(name, IndexKind::Primary, accessor))
    }

    /// Declares an index allowing any number of documents per value.
    pub fn secondary_index<K: Into<KeyPart> + 'static>(
        self,
        name: &str,
        accessor: impl Fn(&O) -> K + Send + Sync + 'static,
    ) -> Self {
        self.index(IndexDescriptor::new(name, IndexKind::Secondary, accessor))
    }

    pub fn index(mut self, index: IndexDescriptor<O>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.validate_index(&index) {
                self.error = Some(e);
                return self;
            }
            self.indices.push(index);
        }
        self
    }

    pub fn serialization(mut self, serialization: SerializationMode<O>) -> Self {
        self.serialization = serialization;
        self
    }

    pub fn build(self) -> TesseraResult<CollectionDescriptor<I, O>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        validate_name(&self.name, "Collection")?;

        Ok(CollectionDescriptor {
            inner: Arc::new(CollectionDescriptorInner {
                name: self.name,
                model: self.model,
                id_strategy: self.id_strategy,
                indices: self.indices,
                serialization: self.serialization,
            }),
        })
    }

    fn validate_index(&self, index: &IndexDescriptor<O>) -> TesseraResult<()> {
        validate_name(index.name(), "Index")?;
        if self.indices.iter().any(|known| known.name() == index.name()) {
            log::error!(
                "Index {} is declared twice on collection {}",
                index.name(),
                self.name
            );
            return Err(TesseraError::new(
                &format!(
                    "Index {} is declared twice on collection {}",
                    index.name(),
                    self.name
                ),
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

/// The immutable declaration of a collection, produced by [`CollectionBuilder::build`].
pub struct CollectionDescriptor<I, O = I> {
    inner: Arc<CollectionDescriptorInner<I, O>>,
}

struct CollectionDescriptorInner<I, O> {
    name: String,
    model: Model<I, O>,
    id_strategy: IdStrategy<O>,
    indices: Vec<IndexDescriptor<O>>,
    serialization: SerializationMode<O>,
}

impl<I, O> CollectionDescriptor<I, O> {
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn model(&self) -> &Model<I, O> {
        &self.inner.model
    }

    pub fn id_strategy(&self) -> &IdStrategy<O> {
        &self.inner.id_strategy
    }

    pub fn indices(&self) -> &[IndexDescriptor<O>] {
        &self.inner.indices
    }

    pub fn index(&self, name: &str) -> Option<&IndexDescriptor<O>> {
        self.inner.indices.iter().find(|index| index.name() == name)
    }

    pub fn serialization(&self) -> &SerializationMode<O> {
        &self.inner.serialization
    }
}

impl<I, O> Clone for CollectionDescriptor<I, O> {
    fn clone(&self) -> Self {
        CollectionDescriptor {
            inner: self.inner.clone(),
        }
    }
}

impl<I, O> Debug for CollectionDescriptor<I, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionDescriptor")
            .field("name", &self.inner.name)
            .field("id_strategy", &self.inner.id_strategy)
            .field("indices", &self.inner.indices)
            .field("serialization", &self.inner.serialization)
            .finish()
    }
}

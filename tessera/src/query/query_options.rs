use crate::collection::Document;
use crate::errors::{ErrorKind, TesseraError, TesseraResult};
use crate::key::KeyPart;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

type Filter<O> = Arc<dyn Fn(&Document<O>) -> bool + Send + Sync>;

/// Parameters of a paginated query.
///
/// All parameters are optional; the default query walks the whole collection forward in id
/// order. Construct one with [`QueryOptions::new`] or one of the shorthand functions of this
/// module and chain the setters.
///
/// # Examples
///
/// ```rust,ignore
/// use tessera::query::QueryOptions;
///
/// let adults = QueryOptions::new()
///     .filter(|doc: &Document<User>| doc.value().age >= 18)
///     .reverse(true)
///     .limit(20);
/// let page = users.get_many(&adults)?;
/// ```
pub struct QueryOptions<O> {
    pub(crate) cursor: Option<String>,
    pub(crate) offset: Option<usize>,
    pub(crate) limit: Option<usize>,
    pub(crate) start_id: Option<KeyPart>,
    pub(crate) end_id: Option<KeyPart>,
    pub(crate) reverse: bool,
    pub(crate) filter: Option<Filter<O>>,
    pub(crate) batch_size: Option<usize>,
}

pub fn limit_to<O>(limit: usize) -> QueryOptions<O> {
    QueryOptions::new().limit(limit)
}

pub fn offset_by<O>(offset: usize) -> QueryOptions<O> {
    QueryOptions::new().offset(offset)
}

pub fn resume_from<O>(cursor: &str) -> QueryOptions<O> {
    QueryOptions::new().cursor(cursor)
}

pub fn reversed<O>() -> QueryOptions<O> {
    QueryOptions::new().reverse(true)
}

/// Ids in `start..end`.
pub fn between<O>(start: impl Into<KeyPart>, end: impl Into<KeyPart>) -> QueryOptions<O> {
    QueryOptions::new().start_id(start).end_id(end)
}

pub fn filter_by<O>(filter: impl Fn(&Document<O>) -> bool + Send + Sync + 'static) -> QueryOptions<O> {
    QueryOptions::new().filter(filter)
}

impl<O> QueryOptions<O> {
    pub fn new() -> QueryOptions<O> {
        QueryOptions {
            cursor: None,
            offset: None,
            limit: None,
            start_id: None,
            end_id: None,
            reverse: false,
            filter: None,
            batch_size: None,
        }
    }

    /// Resumes after the last document of the page that returned `cursor`.
    pub fn cursor(mut self, cursor: impl Into<String>) -> QueryOptions<O> {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn offset(mut self, offset: usize) -> QueryOptions<O> {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> QueryOptions<O> {
        self.limit = Some(limit);
        self
    }

    /// First id of the range, inclusive.
    pub fn start_id(mut self, id: impl Into<KeyPart>) -> QueryOptions<O> {
        self.start_id = Some(id.into());
        self
    }

    /// End of the id range, exclusive.
    pub fn end_id(mut self, id: impl Into<KeyPart>) -> QueryOptions<O> {
        self.end_id = Some(id.into());
        self
    }

    pub fn reverse(mut self, reverse: bool) -> QueryOptions<O> {
        self.reverse = reverse;
        self
    }

    pub fn filter(
        mut self,
        filter: impl Fn(&Document<O>) -> bool + Send + Sync + 'static,
    ) -> QueryOptions<O> {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Number of store entries fetched per scan call. Defaults to the database's batch size.
    pub fn batch_size(mut self, batch_size: usize) -> QueryOptions<O> {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub(crate) fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    pub(crate) fn has_id_bounds(&self) -> bool {
        self.start_id.is_some() || self.end_id.is_some()
    }

    pub(crate) fn matches(&self, document: &Document<O>) -> bool {
        match &self.filter {
            Some(filter) => filter(document),
            None => true,
        }
    }

    /// The same query without its limit.
    pub(crate) fn unlimited(&self) -> QueryOptions<O> {
        let mut query = self.clone();
        query.limit = None;
        query
    }

    pub fn validate(&self) -> TesseraResult<()> {
        if self.limit == Some(0) {
            log::error!("Query limit must be at least 1");
            return Err(TesseraError::new(
                "Query limit must be at least 1",
                ErrorKind::InvalidQuery,
            ));
        }

        if self.batch_size == Some(0) {
            log::error!("Query batch size must be at least 1");
            return Err(TesseraError::new(
                "Query batch size must be at least 1",
                ErrorKind::InvalidQuery,
            ));
        }

        if self.cursor.is_some() && self.offset.is_some() {
            log::error!("Query cannot combine a cursor with an offset");
            return Err(TesseraError::new(
                "Query cannot combine a cursor with an offset, a cursor already marks the starting point",
                ErrorKind::InvalidQuery,
            ));
        }
        Ok(())
    }
}

impl<O> Clone for QueryOptions<O> {
    fn clone(&self) -> Self {
        QueryOptions {
            cursor: self.cursor.clone(),
            offset: self.offset,
            limit: self.limit,
            start_id: self.start_id.clone(),
            end_id: self.end_id.clone(),
            reverse: self.reverse,
            filter: self.filter.clone(),
            batch_size: self.batch_size,
        }
    }
}

impl<O> Default for QueryOptions<O> {
    fn default() -> Self {
        QueryOptions::new()
    }
}

impl<O> Debug for QueryOptions<O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryOptions")
            .field("cursor", &self.cursor)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("start_id", &self.start_id)
            .field("end_id", &self.end_id)
            .field("reverse", &self.reverse)
            .field("filter", &self.filter.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_valid_and_forward() {
        let query: QueryOptions<String> = QueryOptions::new();
        assert!(query.validate().is_ok());
        assert!(!query.is_reverse());
        assert!(!query.has_filter());
        assert!(!query.has_id_bounds());
    }

    #[test]
    fn shorthands_set_one_parameter() {
        assert_eq!(limit_to::<String>(5).limit, Some(5));
        assert_eq!(offset_by::<String>(3).offset, Some(3));
        assert_eq!(resume_from::<String>("abc").cursor.as_deref(), Some("abc"));
        assert!(reversed::<String>().reverse);
        let range = between::<String>(1_i64, 9_i64);
        assert_eq!(range.start_id, Some(KeyPart::from(1_i64)));
        assert_eq!(range.end_id, Some(KeyPart::from(9_i64)));
        assert!(filter_by::<String>(|_| true).has_filter());
    }

    #[test]
    fn rejects_zero_limit_and_batch() {
        let err = limit_to::<String>(0).validate().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
        let err = QueryOptions::<String>::new().batch_size(0).validate().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
    }

    #[test]
    fn rejects_cursor_with_offset() {
        let err = resume_from::<String>("abc").offset(2).validate().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidQuery);
    }

    #[test]
    fn unlimited_keeps_everything_else() {
        let query = QueryOptions::<String>::new()
            .limit(3)
            .offset(1)
            .reverse(true)
            .filter(|_| false);
        let unlimited = query.unlimited();
        assert_eq!(unlimited.limit, None);
        assert_eq!(unlimited.offset, Some(1));
        assert!(unlimited.reverse);
        assert!(unlimited.has_filter());
    }
}

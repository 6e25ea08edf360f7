use crate::collection::Document;

/// One page of query results.
///
/// `cursor` is set when the page stopped early and more documents may follow; pass it to
/// [`QueryOptions::cursor`](crate::query::QueryOptions::cursor) to continue. `None` means the
/// range is exhausted.
#[derive(Clone, Debug)]
pub struct Page<O> {
    pub result: Vec<Document<O>>,
    pub cursor: Option<String>,
}

impl<O> Page<O> {
    pub fn empty() -> Self {
        Page {
            result: Vec::new(),
            cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.result.len()
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }

    /// The values of the page, in order.
    pub fn values(&self) -> Vec<&O> {
        self.result.iter().map(|doc| doc.value()).collect()
    }
}

impl<O> IntoIterator for Page<O> {
    type Item = Document<O>;
    type IntoIter = std::vec::IntoIter<Document<O>>;

    fn into_iter(self) -> Self::IntoIter {
        self.result.into_iter()
    }
}

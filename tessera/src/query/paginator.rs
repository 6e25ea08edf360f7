use crate::collection::Document;
use crate::errors::TesseraResult;
use crate::query::{decode_cursor, encode_cursor, QueryOptions};
use crate::store::{KeyRange, KvEntry, KvStore, ScanOptions};
use std::ops::ControlFlow;

/// Drives a query over one key range.
///
/// Every key of the range starts with `cursor_prefix`; cursors encode the remaining suffix,
/// which is the tuple-encoded document id for both the id space and secondary index entries.
pub(crate) struct Paginator<'a> {
    store: &'a KvStore,
    range: KeyRange,
    cursor_prefix: &'a [u8],
    batch_size: usize,
}

impl<'a> Paginator<'a> {
    pub fn new(store: &'a KvStore, range: KeyRange, cursor_prefix: &'a [u8], batch_size: usize) -> Self {
        Paginator {
            store,
            range,
            cursor_prefix,
            batch_size,
        }
    }

    /// Walks the range and hands every selected document to `visit`.
    ///
    /// `resolve` turns a batch of raw entries into documents, one slot per entry; `None` marks an
    /// entry whose document vanished and is skipped. The walk stops when `limit` documents were
    /// visited, `visit` breaks or the range is exhausted. Returns a cursor positioned after the
    /// last visited document when the walk stopped early and the range holds more entries.
    pub fn run<O, R, V>(
        &self,
        query: &QueryOptions<O>,
        mut resolve: R,
        mut visit: V,
    ) -> TesseraResult<Option<String>>
    where
        R: FnMut(Vec<KvEntry>) -> TesseraResult<Vec<Option<Document<O>>>>,
        V: FnMut(Document<O>) -> TesseraResult<ControlFlow<()>>,
    {
        query.validate()?;

        let mut range = self.range.clone();
        if let Some(cursor) = &query.cursor {
            let mut resume_key = self.cursor_prefix.to_vec();
            resume_key.extend_from_slice(&decode_cursor(cursor)?);
            range = range.resume_after(&resume_key, query.reverse);
        }
        if range.is_empty() {
            return Ok(None);
        }

        let batch_size = query.batch_size.unwrap_or(self.batch_size);
        let mut skip = query.offset.unwrap_or(0);
        let mut remaining = query.limit;

        loop {
            // without a filter every entry counts, so never fetch past what the page needs
            let fetch = match (remaining, query.has_filter()) {
                (Some(left), false) => batch_size.min(left.saturating_add(skip)),
                _ => batch_size,
            };
            let page = self
                .store
                .scan(&range, &ScanOptions::new(fetch, query.reverse))?;
            log::trace!("Scanned {} entries, more: {}", page.entries.len(), page.cursor.is_some());

            let has_more_pages = page.cursor.is_some();
            let keys: Vec<Vec<u8>> = page.entries.iter().map(|entry| entry.key.clone()).collect();
            let total = keys.len();
            let documents = resolve(page.entries)?;

            for (position, (key, document)) in keys.into_iter().zip(documents).enumerate() {
                let document = match document {
                    Some(document) => document,
                    None => continue,
                };
                if !query.matches(&document) {
                    continue;
                }
                if skip > 0 {
                    skip -= 1;
                    continue;
                }

                let flow = visit(document)?;
                let limit_reached = match remaining.as_mut() {
                    Some(left) => {
                        *left -= 1;
                        *left == 0
                    }
                    None => false,
                };

                if flow.is_break() || limit_reached {
                    let more = position + 1 < total || has_more_pages;
                    if !more {
                        return Ok(None);
                    }
                    let suffix = key.get(self.cursor_prefix.len()..).unwrap_or_default();
                    return Ok(Some(encode_cursor(suffix)));
                }
            }

            match page.cursor {
                Some(last) => range = range.resume_after(&last, query.reverse),
                None => return Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{encode_single, KeyPart};
    use crate::store::memory::InMemoryStore;
    use crate::store::{KvStoreProvider, Versionstamp};

    const PREFIX: &[u8] = b"\x02p\x00";

    fn store_with(ids: impl IntoIterator<Item = i64>) -> KvStore {
        let store = InMemoryStore::default();
        for id in ids {
            let mut key = PREFIX.to_vec();
            key.extend(encode_single(&KeyPart::from(id)));
            store.set(key, id.to_be_bytes().to_vec()).unwrap();
        }
        KvStore::new(store)
    }

    fn resolve(entries: Vec<KvEntry>) -> TesseraResult<Vec<Option<Document<i64>>>> {
        Ok(entries
            .into_iter()
            .map(|entry| {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&entry.value);
                let value = i64::from_be_bytes(raw);
                Some(Document::new(KeyPart::from(value), Versionstamp::new(1), value))
            })
            .collect())
    }

    fn collect(store: &KvStore, batch: usize, query: &QueryOptions<i64>) -> (Vec<i64>, Option<String>) {
        let paginator = Paginator::new(store, KeyRange::prefix(PREFIX), PREFIX, batch);
        let mut values = Vec::new();
        let cursor = paginator
            .run(query, resolve, |doc| {
                values.push(*doc.value());
                Ok(ControlFlow::Continue(()))
            })
            .unwrap();
        (values, cursor)
    }

    #[test]
    fn walks_across_batches() {
        let store = store_with(0..10);
        let (values, cursor) = collect(&store, 3, &QueryOptions::new());
        assert_eq!(values, (0..10).collect::<Vec<_>>());
        assert_eq!(cursor, None);
    }

    #[test]
    fn cursor_resumes_where_limit_stopped() {
        let store = store_with(0..10);
        let mut seen = Vec::new();
        let mut query = QueryOptions::new().limit(4);
        loop {
            let (values, cursor) = collect(&store, 3, &query);
            seen.extend(values);
            match cursor {
                Some(cursor) => query = QueryOptions::new().limit(4).cursor(cursor),
                None => break,
            }
        }
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn exact_fit_emits_no_cursor() {
        let store = store_with(0..6);
        let (values, cursor) = collect(&store, 10, &QueryOptions::new().limit(6));
        assert_eq!(values.len(), 6);
        assert_eq!(cursor, None);
    }

    #[test]
    fn filter_and_offset_count_matches_only() {
        let store = store_with(0..20);
        let query = QueryOptions::new()
            .filter(|doc: &Document<i64>| doc.value() % 2 == 0)
            .offset(2)
            .limit(3);
        let (values, cursor) = collect(&store, 4, &query);
        assert_eq!(values, vec![4, 6, 8]);
        assert!(cursor.is_some());
    }

    #[test]
    fn reverse_mirrors_forward() {
        let store = store_with(0..7);
        let (forward, _) = collect(&store, 2, &QueryOptions::new());
        let (mut backward, _) = collect(&store, 2, &QueryOptions::new().reverse(true));
        backward.reverse();
        assert_eq!(forward, backward);
    }

    #[test]
    fn visitor_break_stops_with_cursor() {
        let store = store_with(0..5);
        let paginator = Paginator::new(&store, KeyRange::prefix(PREFIX), PREFIX, 10);
        let mut seen = Vec::new();
        let cursor = paginator
            .run(&QueryOptions::new(), resolve, |doc| {
                seen.push(*doc.value());
                Ok(if seen.len() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                })
            })
            .unwrap();
        assert_eq!(seen, vec![0, 1]);

        let (rest, _) = collect(&store, 10, &QueryOptions::new().cursor(cursor.unwrap()));
        assert_eq!(rest, vec![2, 3, 4]);
    }

    #[test]
    fn cursor_past_the_end_yields_nothing() {
        let store = store_with(0..3);
        let cursor = encode_cursor(&encode_single(&KeyPart::from(99_i64)));
        let (values, next) = collect(&store, 10, &QueryOptions::new().cursor(cursor));
        assert!(values.is_empty());
        assert_eq!(next, None);
    }
}

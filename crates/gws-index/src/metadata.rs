//! Per-path metadata records.
//!
//! Every component reads and writes `info` records directly through these
//! helpers instead of caching entries. Unparsable records are treated as
//! absent so partial corruption never blocks unrelated paths.

use gws_store::{ContentStore, StoreResult};
use gws_types::{IndexEntry, Segment};
use tracing::debug;

use crate::error::IndexResult;

/// Parse an `info` record, logging and discarding garbage.
///
/// A record without a `path` takes the key it is stored under.
pub fn parse_info(path: &str, text: &str) -> Option<IndexEntry> {
    match IndexEntry::from_json(text) {
        Ok(mut entry) => {
            if entry.path.is_empty() {
                entry.path = path.to_string();
            }
            Some(entry)
        }
        Err(e) => {
            debug!(path, error = %e, "ignoring unparsable metadata");
            None
        }
    }
}

/// Read the entry for `path` from a metadata segment.
pub async fn read_entry(
    store: &dyn ContentStore,
    path: &str,
    segment: Segment,
) -> StoreResult<Option<IndexEntry>> {
    let text = store.read_blob(path, Some(segment)).await?;
    Ok(text.and_then(|t| parse_info(path, &t)))
}

/// Write `entry` into a metadata segment.
pub async fn write_entry(
    store: &dyn ContentStore,
    entry: &IndexEntry,
    segment: Segment,
) -> IndexResult<()> {
    let text = entry.to_json()?;
    store.write_blob(&entry.path, &text, segment).await?;
    Ok(())
}

/// Record `entry` as agreed with the remote: the `info` record plus its
/// `info-git` copy, which marks the path as synced even before its base
/// content is hydrated.
pub async fn write_synced_entry(store: &dyn ContentStore, entry: &IndexEntry) -> IndexResult<()> {
    write_entry(store, entry, Segment::Info).await?;
    write_entry(store, entry, Segment::InfoGit).await
}

/// Remove every metadata record for `path`.
pub async fn purge_entry(store: &dyn ContentStore, path: &str) -> StoreResult<()> {
    for segment in Segment::METADATA {
        store.delete_blob(path, Some(segment)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gws_store::InMemoryContentStore;

    #[tokio::test]
    async fn write_then_read() {
        let store = InMemoryContentStore::new();
        let entry = IndexEntry::base("a.txt", "b1");
        write_entry(&store, &entry, Segment::Info).await.unwrap();

        let read = read_entry(&store, "a.txt", Segment::Info).await.unwrap();
        assert_eq!(read, Some(entry));
        assert!(read_entry(&store, "a.txt", Segment::InfoGit).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn partial_record_takes_path_from_key() {
        let store = InMemoryContentStore::new();
        store.write_blob("a.txt", r#"{"baseSha":"b1"}"#, Segment::Info).await.unwrap();

        let entry = read_entry(&store, "a.txt", Segment::Info).await.unwrap().unwrap();
        assert_eq!(entry.path, "a.txt");
        assert_eq!(entry.base_sha.as_deref(), Some("b1"));
    }

    #[tokio::test]
    async fn synced_entry_lands_in_info_and_info_git() {
        let store = InMemoryContentStore::new();
        write_synced_entry(&store, &IndexEntry::base("a.txt", "b1")).await.unwrap();

        for segment in [Segment::Info, Segment::InfoGit] {
            let entry = read_entry(&store, "a.txt", segment).await.unwrap().unwrap();
            assert_eq!(entry.base_sha.as_deref(), Some("b1"));
        }
        assert!(read_entry(&store, "a.txt", Segment::InfoWorkspace).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_reads_as_absent() {
        let store = InMemoryContentStore::new();
        store.write_blob("a.txt", "][", Segment::Info).await.unwrap();
        assert!(read_entry(&store, "a.txt", Segment::Info).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn purge_clears_all_metadata_segments() {
        let store = InMemoryContentStore::new();
        let entry = IndexEntry::base("a.txt", "b1");
        for segment in Segment::METADATA {
            write_entry(&store, &entry, segment).await.unwrap();
        }
        store.write_blob("a.txt", "content", Segment::Base).await.unwrap();

        purge_entry(&store, "a.txt").await.unwrap();
        assert_eq!(store.len(), 1);
    }
}

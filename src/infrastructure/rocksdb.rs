use crate::domain::payment::AttemptRecord;
use crate::domain::ports::TransactionLog;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;

/// Column Family for storing attempt records.
pub const CF_ATTEMPTS: &str = "attempts";

/// A persistent transaction log backed by RocksDB.
///
/// Keys are `reference:timestamp_nanos`, so every attempt for a reference is
/// kept and a prefix scan returns them oldest first.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDbTransactionLog {
    db: Arc<DB>,
}

impl RocksDbTransactionLog {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// # Arguments
    ///
    /// * `path` - The filesystem path where the database will be stored.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_attempts = ColumnFamilyDescriptor::new(CF_ATTEMPTS, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_attempts])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn key(record: &AttemptRecord) -> String {
        let nanos = record
            .recorded_at
            .timestamp_nanos_opt()
            .unwrap_or_default();
        format!("{}:{nanos:020}", record.reference)
    }

    fn scan(&self, prefix: Option<&str>) -> Result<Vec<AttemptRecord>> {
        let cf = self.db.cf_handle(CF_ATTEMPTS).ok_or_else(|| {
            PaymentError::Io(std::io::Error::other("attempts column family not found"))
        })?;

        let mode = match prefix {
            Some(prefix) => IteratorMode::From(prefix.as_bytes(), Direction::Forward),
            None => IteratorMode::Start,
        };

        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, mode) {
            let (key, value) = item?;
            if let Some(prefix) = prefix
                && !key.starts_with(prefix.as_bytes())
            {
                break;
            }
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }
}

#[async_trait]
impl TransactionLog for RocksDbTransactionLog {
    async fn record(&self, record: AttemptRecord) -> Result<()> {
        let cf = self.db.cf_handle(CF_ATTEMPTS).ok_or_else(|| {
            PaymentError::Io(std::io::Error::other("attempts column family not found"))
        })?;

        let value = serde_json::to_vec(&record)?;
        self.db.put_cf(&cf, Self::key(&record), value)?;
        Ok(())
    }

    async fn find_by_reference(&self, reference: &str) -> Result<Vec<AttemptRecord>> {
        self.scan(Some(&format!("{reference}:")))
    }

    async fn reference_exists(&self, reference: &str) -> Result<bool> {
        Ok(!self.find_by_reference(reference).await?.is_empty())
    }

    /// Every record in the order it was logged.
    async fn all(&self) -> Result<Vec<AttemptRecord>> {
        let mut records = self.scan(None)?;
        records.sort_by_key(|record| record.recorded_at);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::amount::Amount;
    use crate::domain::attempt::PaymentAttempt;
    use tempfile::tempdir;

    fn record(reference: &str) -> AttemptRecord {
        AttemptRecord::from_attempt(&PaymentAttempt::new(reference), Amount::from_cents(500), None)
    }

    #[tokio::test]
    async fn test_rocksdb_open_cf() {
        let dir = tempdir().unwrap();
        let log = RocksDbTransactionLog::open(dir.path()).expect("Failed to open RocksDB");
        assert!(log.db.cf_handle(CF_ATTEMPTS).is_some());
    }

    #[tokio::test]
    async fn test_rocksdb_prefix_scan() {
        let dir = tempdir().unwrap();
        let log = RocksDbTransactionLog::open(dir.path()).unwrap();

        log.record(record("111111111111")).await.unwrap();
        log.record(record("111111111111")).await.unwrap();
        log.record(record("111111111112")).await.unwrap();

        let found = log.find_by_reference("111111111111").await.unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.reference == "111111111111"));
        assert!(found[0].recorded_at <= found[1].recorded_at);

        assert!(!log.reference_exists("999999999999").await.unwrap());
        assert_eq!(log.all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_rocksdb_all_is_chronological() {
        let dir = tempdir().unwrap();
        let log = RocksDbTransactionLog::open(dir.path()).unwrap();

        log.record(record("999999999999")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        log.record(record("111111111111")).await.unwrap();

        let all = log.all().await.unwrap();
        let references: Vec<&str> = all.iter().map(|r| r.reference.as_str()).collect();
        assert_eq!(references, ["999999999999", "111111111111"]);
    }
}

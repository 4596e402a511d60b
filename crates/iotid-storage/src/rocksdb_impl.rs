//! RocksDB storage implementation.
//!
//! RocksDB calls block, so every read and write runs on the blocking pool.
//! Keys are encoded before the hop and values decoded after it.

use crate::{
    column_families::all_column_families,
    errors::{Result, StorageError},
    traits::{deserialize_value, serialize_key, serialize_value, Batch, Storage},
};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use std::{path::Path, sync::Arc};
use tempfile::TempDir;
use tracing::debug;

type RawEntries = Vec<(Vec<u8>, Vec<u8>)>;

/// RocksDB storage implementation
pub struct RocksDbStorage {
    db: Arc<DB>,
}

impl RocksDbStorage {
    /// Open RocksDB database at the specified path
    ///
    /// Creates all required column families if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, &path, all_column_families()).map_err(database_error)?;

        debug!(path = ?path.as_ref(), "Opened RocksDB");

        Ok(Self { db: Arc::new(db) })
    }

    /// Open a database in a fresh temporary directory.
    ///
    /// The directory lives as long as the returned [`TempDir`].
    pub fn open_test() -> Result<(Self, TempDir)> {
        let temp_dir = TempDir::new()?;
        let storage = Self::open(temp_dir.path())?;
        Ok((storage, temp_dir))
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DB) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || op(db.as_ref()))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

fn column_family<'a>(db: &'a DB, cf: &str) -> Result<&'a ColumnFamily> {
    db.cf_handle(cf)
        .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
}

fn database_error(e: rocksdb::Error) -> StorageError {
    StorageError::Database(e.to_string())
}

fn decode_entries<V: DeserializeOwned>(entries: RawEntries) -> Result<Vec<(Vec<u8>, V)>> {
    entries
        .into_iter()
        .map(|(key, value)| Ok((key, deserialize_value(&value)?)))
        .collect()
}

#[async_trait]
impl Storage for RocksDbStorage {
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let cf = cf.to_string();
        let key = serialize_key(key)?;

        let bytes = self
            .blocking(move |db| db.get_cf(column_family(db, &cf)?, &key).map_err(database_error))
            .await?;

        bytes.map(|bytes| deserialize_value(&bytes)).transpose()
    }

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let cf = cf.to_string();
        let key = serialize_key(key)?;
        let value = serialize_value(value)?;

        self.blocking(move |db| {
            db.put_cf(column_family(db, &cf)?, &key, &value)
                .map_err(database_error)
        })
        .await
    }

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync,
    {
        let cf = cf.to_string();
        let key = serialize_key(key)?;

        self.blocking(move |db| {
            let found = db
                .get_pinned_cf(column_family(db, &cf)?, &key)
                .map_err(database_error)?;
            Ok(found.is_some())
        })
        .await
    }

    async fn get_by_prefix<K, V>(&self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let cf = cf.to_string();
        let prefix = serialize_key(prefix)?;

        let entries = self
            .blocking(move |db| {
                let mut entries = RawEntries::new();
                let iter = db.iterator_cf(
                    column_family(db, &cf)?,
                    IteratorMode::From(&prefix, Direction::Forward),
                );
                for item in iter {
                    let (key, value) = item.map_err(database_error)?;
                    // Keys are sorted, so the first miss ends the range.
                    if !key.starts_with(&prefix) {
                        break;
                    }
                    entries.push((key.to_vec(), value.to_vec()));
                }
                Ok(entries)
            })
            .await?;

        decode_entries(entries)
    }

    async fn scan_all<V>(&self, cf: &str) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned,
    {
        let cf = cf.to_string();

        let entries = self
            .blocking(move |db| {
                db.iterator_cf(column_family(db, &cf)?, IteratorMode::Start)
                    .map(|item| {
                        let (key, value) = item.map_err(database_error)?;
                        Ok((key.to_vec(), value.to_vec()))
                    })
                    .collect::<Result<RawEntries>>()
            })
            .await?;

        decode_entries(entries)
    }

    fn batch(&self) -> Box<dyn Batch> {
        Box::new(RocksDbBatch {
            db: Arc::clone(&self.db),
            write_batch: WriteBatch::default(),
        })
    }
}

/// Pending writes committed with a single RocksDB `write`
pub struct RocksDbBatch {
    db: Arc<DB>,
    write_batch: WriteBatch,
}

#[async_trait]
impl Batch for RocksDbBatch {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.write_batch
            .put_cf(column_family(&self.db, cf)?, &key, &value);
        Ok(())
    }

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()> {
        self.write_batch.delete_cf(column_family(&self.db, cf)?, &key);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let Self { db, write_batch } = *self;
        let operations = write_batch.len();

        tokio::task::spawn_blocking(move || db.write(write_batch).map_err(database_error))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))??;

        debug!(operations, "Batch committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{column_families::*, traits::BatchExt};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        id: Uuid,
        name: String,
        status: u8,
    }

    fn record(name: &str) -> TestRecord {
        TestRecord {
            id: Uuid::now_v7(),
            name: name.to_string(),
            status: 1,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();
        let data = record("acme");

        storage.put(CF_ORGANIZATIONS, &data.id, &data).await.unwrap();

        let result: Option<TestRecord> = storage.get(CF_ORGANIZATIONS, &data.id).await.unwrap();
        assert_eq!(result, Some(data));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();

        let result: Option<TestRecord> = storage.get(CF_DEVICES, &Uuid::now_v7()).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_unknown_column_family() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();

        let err = storage.put("sessions", &1u32, &()).await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidColumnFamily(cf) if cf == "sessions"));
    }

    #[tokio::test]
    async fn test_exists() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();
        let data = record("drone");

        assert!(!storage.exists(CF_DEVICES, &data.id).await.unwrap());
        storage.put(CF_DEVICES, &data.id, &data).await.unwrap();
        assert!(storage.exists(CF_DEVICES, &data.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_commit_spans_column_families() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();
        let data = record("acme");

        let mut batch = storage.batch();
        batch.put(CF_ORGANIZATIONS, &data.id, &data).unwrap();
        batch
            .put(CF_ORGANIZATIONS_BY_NAME, &data.name, &data.id)
            .unwrap();
        batch.commit().await.unwrap();

        let by_id: Option<TestRecord> = storage.get(CF_ORGANIZATIONS, &data.id).await.unwrap();
        let by_name: Option<Uuid> = storage
            .get(CF_ORGANIZATIONS_BY_NAME, &data.name)
            .await
            .unwrap();

        assert_eq!(by_id, Some(data.clone()));
        assert_eq!(by_name, Some(data.id));
    }

    #[tokio::test]
    async fn test_batch_delete_removes_index_entries() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();
        let data = record("acme");

        let mut batch = storage.batch();
        batch.put(CF_DEVICES, &data.id, &data).unwrap();
        batch.put(CF_DEVICES_BY_SERIAL, &(&data.name, data.id), &data.id).unwrap();
        batch.commit().await.unwrap();

        let mut batch = storage.batch();
        batch.delete(CF_DEVICES, &data.id).unwrap();
        batch.delete(CF_DEVICES_BY_SERIAL, &(&data.name, data.id)).unwrap();
        batch.commit().await.unwrap();

        assert!(!storage.exists(CF_DEVICES, &data.id).await.unwrap());
        let index: Vec<(Vec<u8>, Uuid)> = storage
            .get_by_prefix(CF_DEVICES_BY_SERIAL, &data.name)
            .await
            .unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_batch_writes_nothing() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();
        let data = record("acme");

        let mut batch = storage.batch();
        batch.put(CF_ORGANIZATIONS, &data.id, &data).unwrap();
        drop(batch);

        let result: Option<TestRecord> = storage.get(CF_ORGANIZATIONS, &data.id).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_open_test_keeps_directory_alive() {
        let (storage, temp_dir) = RocksDbStorage::open_test().unwrap();
        let data = record("acme");

        storage.put(CF_ORGANIZATIONS, &data.id, &data).await.unwrap();
        assert!(temp_dir.path().exists());
        drop(storage);

        let reopened = RocksDbStorage::open(temp_dir.path()).unwrap();
        let result: Option<TestRecord> = reopened.get(CF_ORGANIZATIONS, &data.id).await.unwrap();
        assert_eq!(result, Some(data));
    }

    #[tokio::test]
    async fn test_get_by_prefix() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();

        let org1 = Uuid::now_v7();
        let org2 = Uuid::now_v7();
        let devices = [(org1, Uuid::now_v7()), (org1, Uuid::now_v7()), (org2, Uuid::now_v7())];

        for key in &devices {
            storage
                .put(CF_DEVICES_BY_ORGANIZATION, key, &key.1)
                .await
                .unwrap();
        }

        let results: Vec<(Vec<u8>, Uuid)> = storage
            .get_by_prefix(CF_DEVICES_BY_ORGANIZATION, &org1)
            .await
            .unwrap();

        let ids: Vec<Uuid> = results.into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&devices[0].1));
        assert!(ids.contains(&devices[1].1));
    }

    #[tokio::test]
    async fn test_get_by_string_prefix_does_not_match_longer_strings() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();

        let short = ("SN-1".to_string(), Uuid::now_v7());
        let long = ("SN-10".to_string(), Uuid::now_v7());
        storage.put(CF_DEVICES_BY_SERIAL, &short, &short.1).await.unwrap();
        storage.put(CF_DEVICES_BY_SERIAL, &long, &long.1).await.unwrap();

        let results: Vec<(Vec<u8>, Uuid)> = storage
            .get_by_prefix(CF_DEVICES_BY_SERIAL, &"SN-1".to_string())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, short.1);
    }

    #[tokio::test]
    async fn test_scan_all() {
        let (storage, _temp_dir) = RocksDbStorage::open_test().unwrap();
        let a = record("a");
        let b = record("b");

        storage.put(CF_ORGANIZATIONS, &a.id, &a).await.unwrap();
        storage.put(CF_ORGANIZATIONS, &b.id, &b).await.unwrap();

        let all: Vec<(Vec<u8>, TestRecord)> = storage.scan_all(CF_ORGANIZATIONS).await.unwrap();
        assert_eq!(all.len(), 2);
    }
}

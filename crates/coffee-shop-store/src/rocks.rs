//! `RocksDB` storage implementation.

use std::path::Path;
use std::sync::Arc;

use coffee_shop_core::DrinkId;
use parking_lot::Mutex;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf, LAST_DRINK_ID};
use crate::types::{Drink, DrinkUpdate, NewDrink};
use crate::Store;

/// RocksDB-backed storage implementation.
///
/// Reads go straight to the database. Writes take `write_lock` so the id
/// sequence and the title index change together with the record.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    write_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Look up which drink owns a title.
    fn drink_id_for_title(&self, title: &str) -> Result<Option<DrinkId>> {
        let cf = self.cf(cf::DRINKS_BY_TITLE)?;
        let value = self
            .db
            .get_cf(&cf, keys::title_key(title))
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            Some(bytes) => keys::decode_drink_id(&bytes)
                .map(Some)
                .ok_or_else(|| StoreError::Serialization("corrupt title index".to_string())),
            None => Ok(None),
        }
    }

    /// Read the id sequence. Caller must hold `write_lock`.
    fn last_drink_id(&self) -> Result<Option<DrinkId>> {
        let cf = self.cf(cf::META)?;
        let value = self
            .db
            .get_cf(&cf, LAST_DRINK_ID)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        match value {
            Some(bytes) => keys::decode_drink_id(&bytes)
                .map(Some)
                .ok_or_else(|| StoreError::Serialization("corrupt id sequence".to_string())),
            None => Ok(None),
        }
    }
}

impl Store for RocksStore {
    fn list_drinks(&self) -> Result<Vec<Drink>> {
        let cf = self.cf(cf::DRINKS)?;

        let mut drinks = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            drinks.push(Self::deserialize(&value)?);
        }

        Ok(drinks)
    }

    fn get_drink(&self, drink_id: DrinkId) -> Result<Option<Drink>> {
        let cf = self.cf(cf::DRINKS)?;

        self.db
            .get_cf(&cf, keys::drink_key(drink_id))
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn insert_drink(&self, drink: NewDrink) -> Result<Drink> {
        let _guard = self.write_lock.lock();

        if self.drink_id_for_title(&drink.title)?.is_some() {
            return Err(StoreError::Conflict(drink.title));
        }

        let id = self
            .last_drink_id()?
            .map_or(DrinkId::FIRST, DrinkId::next);
        let record = Drink {
            id,
            title: drink.title,
            recipe: drink.recipe,
        };

        let cf_drinks = self.cf(cf::DRINKS)?;
        let cf_by_title = self.cf(cf::DRINKS_BY_TITLE)?;
        let cf_meta = self.cf(cf::META)?;
        let id_bytes = keys::drink_key(id);

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_drinks, &id_bytes, Self::serialize(&record)?);
        batch.put_cf(&cf_by_title, keys::title_key(&record.title), &id_bytes);
        batch.put_cf(&cf_meta, LAST_DRINK_ID, &id_bytes);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(drink_id = %id, title = %record.title, "Inserted drink");
        Ok(record)
    }

    fn update_drink(&self, drink_id: DrinkId, update: DrinkUpdate) -> Result<Drink> {
        let _guard = self.write_lock.lock();

        let mut drink = self.get_drink(drink_id)?.ok_or(StoreError::NotFound)?;
        let old_title = drink.title.clone();
        drink.apply(update);

        let cf_drinks = self.cf(cf::DRINKS)?;
        let cf_by_title = self.cf(cf::DRINKS_BY_TITLE)?;
        let id_bytes = keys::drink_key(drink_id);

        let mut batch = WriteBatch::default();
        if drink.title != old_title {
            if let Some(owner) = self.drink_id_for_title(&drink.title)? {
                if owner != drink_id {
                    return Err(StoreError::Conflict(drink.title));
                }
            }
            batch.delete_cf(&cf_by_title, keys::title_key(&old_title));
            batch.put_cf(&cf_by_title, keys::title_key(&drink.title), &id_bytes);
        }
        batch.put_cf(&cf_drinks, &id_bytes, Self::serialize(&drink)?);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(drink_id = %drink_id, "Updated drink");
        Ok(drink)
    }

    fn delete_drink(&self, drink_id: DrinkId) -> Result<()> {
        let _guard = self.write_lock.lock();

        let drink = self.get_drink(drink_id)?.ok_or(StoreError::NotFound)?;

        let cf_drinks = self.cf(cf::DRINKS)?;
        let cf_by_title = self.cf(cf::DRINKS_BY_TITLE)?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf_drinks, keys::drink_key(drink_id));
        batch.delete_cf(&cf_by_title, keys::title_key(&drink.title));

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(drink_id = %drink_id, "Deleted drink");
        Ok(())
    }

    fn is_empty(&self) -> Result<bool> {
        let cf = self.cf(cf::DRINKS)?;
        match self.db.iterator_cf(&cf, IteratorMode::Start).next() {
            None => Ok(true),
            Some(item) => item
                .map(|_| false)
                .map_err(|e| StoreError::Database(e.to_string())),
        }
    }
}

//! Column families used by `RocksStore`.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary drink records, keyed by big-endian `drink_id`.
    pub const DRINKS: &str = "drinks";

    /// Unique index: title bytes to big-endian `drink_id`.
    pub const DRINKS_BY_TITLE: &str = "drinks_by_title";

    /// Store bookkeeping such as the id sequence.
    pub const META: &str = "meta";
}

/// Key in [`cf::META`] holding the last allocated drink id.
pub const LAST_DRINK_ID: &[u8] = b"last_drink_id";

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![cf::DRINKS, cf::DRINKS_BY_TITLE, cf::META]
}

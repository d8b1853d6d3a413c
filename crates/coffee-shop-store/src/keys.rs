//! Key encoding for the drink column families.

use coffee_shop_core::DrinkId;

/// Encode a drink key. Big-endian so iteration follows id order.
#[must_use]
pub fn drink_key(drink_id: DrinkId) -> Vec<u8> {
    drink_id.to_be_bytes().to_vec()
}

/// Decode a drink key or a title-index value.
///
/// Returns `None` when the slice is not exactly eight bytes.
#[must_use]
pub fn decode_drink_id(bytes: &[u8]) -> Option<DrinkId> {
    let arr: [u8; 8] = bytes.try_into().ok()?;
    Some(DrinkId::from_be_bytes(arr))
}

/// Encode a title index key.
#[must_use]
pub fn title_key(title: &str) -> Vec<u8> {
    title.as_bytes().to_vec()
}

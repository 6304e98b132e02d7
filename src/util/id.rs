//! Item identifier generation

/// Number of random bytes in an item id
const ID_BYTES: usize = 16;

/// Generate a fresh 128-bit random id, hex-encoded (32 lowercase chars)
pub fn new_item_id() -> String {
  let bytes: [u8; ID_BYTES] = rand::random();
  hex::encode(bytes)
}

//! Append-only item store mirrored to a JSON file
//!
//! Every successful append rewrites the whole backing file, so the file is
//! always a full dump of the in-memory list.

pub mod item;

use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::util::new_item_id;

pub use item::{Item, NewItem};

/// Indentation of the backing file
const FILE_INDENT: &[u8] = b"    ";

/// Errors raised by the item store
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("item file I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("item file JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("lock poisoned")]
  LockPoisoned,
}

/// File-backed item store
pub struct ItemStore {
  path: PathBuf,
  /// Held across the file rewrite so appends never interleave
  items: Mutex<Vec<Item>>,
}

impl ItemStore {
  /// Open the store at `path`, adopting any items already saved there
  pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
    let path = path.into();
    let items = match fs::read(&path) {
      Ok(content) => serde_json::from_slice::<Vec<Item>>(&content)?,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        debug!("No item file at {}, starting empty", path.display());
        Vec::new()
      }
      Err(e) => return Err(e.into()),
    };
    info!("Loaded {} items from {}", items.len(), path.display());

    Ok(Self {
      path,
      items: Mutex::new(items),
    })
  }

  /// Assign an id to `new_item`, append it and rewrite the backing file.
  ///
  /// If the rewrite fails the item is dropped again, so memory and disk
  /// only ever hold items that were fully saved.
  pub fn append(&self, new_item: NewItem) -> Result<Item, StoreError> {
    let item = new_item.into_item(new_item_id());
    let mut items = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;

    items.push(item.clone());
    if let Err(e) = write_items(&self.path, &items) {
      error!("Failed to save item {} to {}: {}", item.id, self.path.display(), e);
      items.pop();
      return Err(e);
    }

    debug!("Saved item {} ({} total)", item.id, items.len());
    Ok(item)
  }

  /// All items in insertion order
  pub fn list(&self) -> Result<Vec<Item>, StoreError> {
    let items = self.items.lock().map_err(|_| StoreError::LockPoisoned)?;
    Ok(items.clone())
  }
}

/// Sibling file the next dump is staged in
fn staging_path(path: &Path) -> PathBuf {
  let mut name = path.file_name().unwrap_or_default().to_os_string();
  name.push(".tmp");
  path.with_file_name(name)
}

/// Dump the full list to `path`, pretty-printed.
///
/// The dump is written to a staging file first and renamed over `path`, so a
/// failed write leaves the previous file intact.
fn write_items(path: &Path, items: &[Item]) -> Result<(), StoreError> {
  let mut buf = Vec::new();
  let formatter = serde_json::ser::PrettyFormatter::with_indent(FILE_INDENT);
  let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
  items.serialize(&mut serializer)?;

  let staging = staging_path(path);
  fs::write(&staging, buf)?;
  if let Err(e) = fs::rename(&staging, path) {
    let _ = fs::remove_file(&staging);
    return Err(e.into());
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  fn potion() -> NewItem {
    NewItem {
      name: "Potion".to_string(),
      description: Some("Restores 20 HP".to_string()),
      price: 10.0,
      tax: Some(1.5),
    }
  }

  fn named(name: &str) -> NewItem {
    NewItem {
      name: name.to_string(),
      description: None,
      price: 1.0,
      tax: None,
    }
  }

  #[test]
  fn test_load_missing_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = ItemStore::load(dir.path().join("item.json")).unwrap();
    assert!(store.list().unwrap().is_empty());
  }

  #[test]
  fn test_load_corrupt_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    fs::write(&path, "[{\"name\": ").unwrap();
    assert!(matches!(ItemStore::load(&path), Err(StoreError::Json(_))));
  }

  #[test]
  fn test_append_returns_augmented_item() {
    let dir = tempfile::tempdir().unwrap();
    let store = ItemStore::load(dir.path().join("item.json")).unwrap();

    let item = store.append(potion()).unwrap();
    assert_eq!(item.name, "Potion");
    assert_eq!(item.price_with_tax, Some(11.5));
    assert_eq!(item.id.len(), 32);
    assert_eq!(store.list().unwrap(), vec![item]);
  }

  #[test]
  fn test_file_matches_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    let store = ItemStore::load(&path).unwrap();
    store.append(potion()).unwrap();
    store.append(named("Ether")).unwrap();

    let on_disk: Vec<Item> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, store.list().unwrap());
  }

  #[test]
  fn test_file_is_indented() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    let store = ItemStore::load(&path).unwrap();
    store.append(named("Ether")).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.starts_with("[\n    {\n        \"name\": \"Ether\","));
    assert!(!content.contains("price_with_tax"));
  }

  #[test]
  fn test_reload_keeps_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    let names = ["Potion", "Ether", "Elixir", "Revive"];

    // A fresh store per append stands in for a process restart
    for name in names {
      let store = ItemStore::load(&path).unwrap();
      store.append(named(name)).unwrap();
    }

    let store = ItemStore::load(&path).unwrap();
    let loaded: Vec<String> = store.list().unwrap().into_iter().map(|i| i.name).collect();
    assert_eq!(loaded, names);
  }

  #[test]
  fn test_failed_write_drops_item() {
    let dir = tempfile::tempdir().unwrap();
    // A directory cannot be overwritten as a file
    let path = dir.path().join("item.json");
    fs::create_dir(&path).unwrap();
    let store = ItemStore {
      path,
      items: Mutex::new(Vec::new()),
    };

    assert!(matches!(store.append(potion()), Err(StoreError::Io(_))));
    assert!(store.list().unwrap().is_empty());
  }

  #[test]
  fn test_failed_write_keeps_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    let store = ItemStore::load(&path).unwrap();
    store.append(named("Potion")).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    // Block the staging file so the next dump cannot be written
    fs::create_dir(staging_path(&path)).unwrap();
    assert!(matches!(store.append(named("Ether")), Err(StoreError::Io(_))));

    assert_eq!(fs::read_to_string(&path).unwrap(), before);
    let reloaded = ItemStore::load(&path).unwrap();
    assert_eq!(reloaded.list().unwrap(), store.list().unwrap());
    assert_eq!(store.list().unwrap().len(), 1);
  }

  #[test]
  fn test_no_staging_file_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    let store = ItemStore::load(&path).unwrap();
    store.append(named("Potion")).unwrap();

    assert_eq!(staging_path(&path), dir.path().join("item.json.tmp"));
    assert!(!staging_path(&path).exists());
  }

  #[test]
  fn test_concurrent_appends_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("item.json");
    let store = Arc::new(ItemStore::load(&path).unwrap());

    let handles: Vec<_> = (0..8)
      .map(|i| {
        let store = Arc::clone(&store);
        std::thread::spawn(move || store.append(named(&format!("item-{}", i))).unwrap())
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }

    assert_eq!(store.list().unwrap().len(), 8);
    let reloaded = ItemStore::load(&path).unwrap();
    assert_eq!(reloaded.list().unwrap(), store.list().unwrap());
  }
}

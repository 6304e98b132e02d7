//! Pokedex lookup table
//!
//! A read-only mapping from a zero-padded three digit id ("001") to a
//! pokemon name. The table is built once at startup by the [`loader`] and
//! shared by every request handler afterwards.

pub mod loader;

use rand::Rng;
use rand::seq::IteratorRandom;
use std::collections::BTreeMap;
use thiserror::Error;

pub use loader::{PokedexSource, load_pokedex};

/// Width of a padded pokedex id
pub const ID_WIDTH: usize = 3;

/// Reasons a pokedex lookup misses
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
  /// The requested id is larger than the table size
  #[error("Pokemon ID {0} not in your pokedex")]
  OutOfRange(i64),

  /// The padded id is within range but has no entry
  #[error("Pokemon ID {0} not in your pokedex")]
  Absent(String),
}

/// Immutable pokedex table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pokedex {
  entries: BTreeMap<String, String>,
}

impl Pokedex {
  /// Build a table from (id, name) pairs; a repeated id keeps the last name
  pub fn from_pairs<I, K, V>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    let entries = pairs
      .into_iter()
      .map(|(id, name)| (id.into(), name.into()))
      .collect();
    Self { entries }
  }

  /// Number of entries in the table
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Get the name for a padded id
  pub fn get(&self, id: &str) -> Option<&str> {
    self.entries.get(id).map(String::as_str)
  }

  /// All entries ordered by id
  pub fn entries(&self) -> &BTreeMap<String, String> {
    &self.entries
  }

  /// Pick one entry uniformly at random
  pub fn random_entry<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&str, &str)> {
    self
      .entries
      .iter()
      .choose(rng)
      .map(|(id, name)| (id.as_str(), name.as_str()))
  }

  /// Look up a numeric id.
  ///
  /// Ids larger than the table size miss before any padding happens. Ids
  /// within range are padded to [`ID_WIDTH`] digits and must then be present
  /// in the table. The two checks can disagree on sparse tables, where an id
  /// in range still misses.
  pub fn lookup(&self, poke_id: i64) -> Result<(&str, &str), LookupError> {
    if poke_id > self.entries.len() as i64 {
      return Err(LookupError::OutOfRange(poke_id));
    }

    let padded = pad_id(poke_id);
    match self.entries.get_key_value(&padded) {
      Some((id, name)) => Ok((id.as_str(), name.as_str())),
      None => Err(LookupError::Absent(padded)),
    }
  }
}

/// Zero-pad an id to [`ID_WIDTH`] digits (the sign counts toward the width)
pub fn pad_id(poke_id: i64) -> String {
  format!("{:0width$}", poke_id, width = ID_WIDTH)
}

//! Memo caches for the hot color and key computations.
//!
//! The caches are plain values handed to the engine, so a caller can share
//! one set across many [`crate::remap()`] calls or start fresh each time.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};

use parking_lot::RwLock;
use xxhash_rust::xxh3::Xxh3Builder;

use crate::color::{self, CanonicalColor};
use crate::normalize::{normalize, stringify_key};

/// A read-mostly map shared between worker threads.
pub struct SharedHashMap<K, V, H = Xxh3Builder> {
  inner: RwLock<HashMap<K, V, H>>,
}

impl<K, V, H> Default for SharedHashMap<K, V, H>
where
  H: Default,
{
  fn default() -> Self {
    Self {
      inner: RwLock::new(HashMap::with_hasher(H::default())),
    }
  }
}

impl<K, V, H> SharedHashMap<K, V, H>
where
  K: Hash + Eq,
  V: Clone,
  H: BuildHasher + Default,
{
  pub fn get<Q>(&self, key: &Q) -> Option<V>
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ?Sized,
  {
    self.inner.read().get(key).cloned()
  }

  pub fn insert(&self, key: K, value: V) {
    self.inner.write().insert(key, value);
  }

  /// Returns the cached value for `key`, computing and storing it on a miss.
  pub fn get_or_insert_with<Q>(&self, key: &Q, compute: impl FnOnce() -> V) -> V
  where
    K: Borrow<Q>,
    Q: Hash + Eq + ToOwned<Owned = K> + ?Sized,
  {
    if let Some(value) = self.get(key) {
      return value;
    }
    let value = compute();
    self.insert(key.to_owned(), value.clone());
    value
  }

  pub fn len(&self) -> usize {
    self.inner.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.inner.read().is_empty()
  }
}

/// Caches keyed on the exact input text.
#[derive(Default)]
pub struct Caches {
  colors: SharedHashMap<String, Option<CanonicalColor>>,
  is_color: SharedHashMap<String, bool>,
  keys: SharedHashMap<String, String>,
}

impl Caches {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn parse_color(&self, text: &str) -> Option<CanonicalColor> {
    self
      .colors
      .get_or_insert_with(text, || color::parse_color(text))
  }

  pub fn normalize_color(&self, text: &str) -> String {
    match self.parse_color(text) {
      Some(color) => color.to_string(),
      None => text.to_string(),
    }
  }

  pub fn is_color(&self, text: &str) -> bool {
    self.is_color.get_or_insert_with(text, || color::is_color(text))
  }

  /// Normalized `prop: value[ !important]` key.
  pub fn key(&self, property: &str, value: &str, important: bool) -> String {
    let raw = format!("{property}\u{0}{value}\u{0}{important}");
    self.keys.get_or_insert_with(raw.as_str(), || {
      stringify_key(&normalize(property, value, important))
    })
  }

  pub fn len(&self) -> usize {
    self.colors.len() + self.is_color.len() + self.keys.len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

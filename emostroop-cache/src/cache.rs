use lazy_static::lazy_static;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};
pub use string_cache::DefaultAtom as Atom;

lazy_static! {
    static ref TEXT_INTERNER: RwLock<Vec<Atom>> = RwLock::new(Vec::new());
}

/// Intern a string and return its ID.
pub fn intern_text(s: &str) -> usize {
    let atom = Atom::from(s);
    let mut v = TEXT_INTERNER
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    match v.iter().position(|a| *a == atom) {
        Some(idx) => idx,
        None => {
            v.push(atom);
            v.len() - 1
        }
    }
}

/// Current count of unique texts.
pub fn text_count() -> usize {
    TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

pub fn get_text(id: usize) -> Option<Atom> {
    TEXT_INTERNER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(id)
        .cloned()
}

/// Fixed-capacity cache that evicts the oldest insertion first.
///
/// Holds decoded stimulus bitmaps between `prepare` and exposure, and
/// keeps recently shown ones around for the repeat in the next block.
#[derive(Debug)]
pub struct FifoCache<K, V> {
    map: HashMap<K, Arc<V>>,
    order: VecDeque<K>,
    capacity: usize,
}

impl<K: Eq + Hash + Clone, V> FifoCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.map.get(key).map(Arc::clone)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn insert(&mut self, key: K, value: V) -> Arc<V> {
        let value = Arc::new(value);
        if self.map.insert(key.clone(), Arc::clone(&value)).is_none() {
            self.order.push_back(key);
            while self.order.len() > self.capacity {
                if let Some(old) = self.order.pop_front() {
                    self.map.remove(&old);
                }
            }
        }
        value
    }

    /// Returns the cached value or builds and stores it. Failures are not cached.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: &K,
        build: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }
        let value = build()?;
        Ok(self.insert(key.clone(), value))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

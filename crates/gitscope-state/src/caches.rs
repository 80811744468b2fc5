use rustc_hash::{FxHashMap, FxHasher};
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// A small bounded cache with insertion-order eviction.
///
/// Scoped to a graph window's lifetime: reset wholesale when the window
/// resets, never shared across views. Entries are append-mostly with no
/// cross-key ordering dependency, so plain insertion order is enough.
#[derive(Clone, Debug)]
pub struct BoundedCache<K, V> {
    capacity: usize,
    order: VecDeque<K>,
    entries: FxHashMap<K, V>,
}

impl<K: Eq + Hash + Clone, V> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            capacity,
            order: VecDeque::new(),
            entries: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.entries.get_mut(key)
    }

    pub fn insert(&mut self, key: K, value: V) {
        if self.entries.insert(key.clone(), value).is_some() {
            return;
        }

        self.order.push_back(key);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

/// Lightweight stand-in for an author avatar: initials plus a stable
/// color slot derived from the author name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthorBadge {
    pub initials: String,
    pub color_slot: u8,
}

pub const AUTHOR_COLOR_SLOTS: u8 = 12;

impl AuthorBadge {
    pub fn from_author(author: &str) -> Self {
        let initials: String = author
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect();
        let initials = if initials.is_empty() {
            "?".to_string()
        } else {
            initials
        };

        let mut hasher = FxHasher::default();
        author.hash(&mut hasher);
        let color_slot = (hasher.finish() % AUTHOR_COLOR_SLOTS as u64) as u8;

        Self {
            initials,
            color_slot,
        }
    }
}

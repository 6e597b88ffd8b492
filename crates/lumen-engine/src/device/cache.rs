use std::collections::HashMap;

struct Entry<T> {
    value: T,
    last_used: u64,
}

/// Named resource pool with per-entry "last used" frame stamps.
///
/// Backends keep one cache per resource kind (textures, shaders, programs).
pub(crate) struct ResourceCache<T> {
    entries: HashMap<String, Entry<T>>,
}

impl<T> ResourceCache<T> {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name).map(|e| &e.value)
    }

    /// Returns the resource and stamps it with `frame`.
    pub fn touch(&mut self, name: &str, frame: u64) -> Option<&T> {
        let entry = self.entries.get_mut(name)?;
        entry.last_used = frame;
        Some(&entry.value)
    }

    pub fn insert(&mut self, name: &str, value: T, frame: u64) {
        self.entries.insert(name.to_string(), Entry { value, last_used: frame });
    }

    pub fn remove(&mut self, name: &str) -> Option<T> {
        self.entries.remove(name).map(|e| e.value)
    }

    /// Drops everything; returns how many entries were removed.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        n
    }

    /// Drops entries not used within the last `max_idle` frames.
    pub fn collect_idle(&mut self, frame: u64, max_idle: u64) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, e| frame.saturating_sub(e.last_used) <= max_idle);
        before - self.entries.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values().map(|e| &e.value)
    }
}

impl<T> Default for ResourceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_keeps_entries_alive() {
        let mut cache = ResourceCache::new();
        cache.insert("a", 1, 0);
        cache.insert("b", 2, 0);
        cache.touch("a", 100);
        assert_eq!(cache.collect_idle(150, 60), 1);
        assert_eq!(cache.get("a"), Some(&1));
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn idle_limit_is_inclusive() {
        let mut cache = ResourceCache::new();
        cache.insert("a", (), 10);
        assert_eq!(cache.collect_idle(130, 120), 0);
        assert_eq!(cache.collect_idle(131, 120), 1);
    }
}

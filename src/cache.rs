use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
};

use crate::models::SlidesResponse;

/// LRU of filtered slide listings keyed by dataset version and query.
#[derive(Debug)]
pub struct SlideQueryCache {
    capacity: usize,
    order: VecDeque<String>,
    values: HashMap<String, Arc<SlidesResponse>>,
}

impl SlideQueryCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::new(),
            values: HashMap::new(),
        }
    }

    /// `v{version}?k=v&...` with keys in sorted order.
    ///
    /// The same query against a reloaded dataset must miss, so the dataset
    /// version leads the key. `params` is already canonical: a `BTreeMap`
    /// built from the categorized selection.
    pub fn key(version: u64, params: &BTreeMap<String, String>) -> String {
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        format!("v{version}?{query}")
    }

    pub fn get(&mut self, key: &str) -> Option<Arc<SlidesResponse>> {
        let value = self.values.get(key).cloned();
        if value.is_some() {
            self.touch(key);
        }
        value
    }

    pub fn set(&mut self, key: String, value: Arc<SlidesResponse>) {
        if self.values.contains_key(&key) {
            self.values.insert(key.clone(), value);
            self.touch(&key);
            return;
        }

        self.values.insert(key.clone(), value);
        self.order.push_back(key);
        self.trim();
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
            self.order.push_back(key.to_string());
        }
    }

    fn trim(&mut self) {
        while self.values.len() > self.capacity {
            match self.order.pop_front() {
                Some(old) => {
                    self.values.remove(&old);
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn response(total: usize) -> Arc<SlidesResponse> {
        Arc::new(SlidesResponse {
            dataset_version: 1,
            generated_at: Utc::now(),
            total,
            matched: 0,
            params: BTreeMap::new(),
            slides: Vec::new(),
        })
    }

    #[test]
    fn key_is_stable_for_same_params() {
        let mut a = BTreeMap::new();
        a.insert("tags".to_string(), "WGK".to_string());
        a.insert("location".to_string(), "LOCATION_PUNE".to_string());
        let mut b = BTreeMap::new();
        b.insert("location".to_string(), "LOCATION_PUNE".to_string());
        b.insert("tags".to_string(), "WGK".to_string());
        assert_eq!(SlideQueryCache::key(2, &a), SlideQueryCache::key(2, &b));
        assert_eq!(
            SlideQueryCache::key(2, &a),
            "v2?location=LOCATION_PUNE&tags=WGK"
        );
        assert_ne!(SlideQueryCache::key(2, &a), SlideQueryCache::key(3, &a));
    }

    #[test]
    fn evicts_least_recently_used() {
        let mut cache = SlideQueryCache::with_capacity(2);
        cache.set("a".into(), response(1));
        cache.set("b".into(), response(2));
        assert!(cache.get("a").is_some());
        cache.set("c".into(), response(3));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("a").map(|r| r.total), Some(1));
        assert_eq!(cache.get("c").map(|r| r.total), Some(3));
    }

    #[test]
    fn overwrite_and_clear() {
        let mut cache = SlideQueryCache::with_capacity(0);
        cache.set("a".into(), response(1));
        cache.set("a".into(), response(5));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").map(|r| r.total), Some(5));
        cache.clear();
        assert!(cache.is_empty());
    }
}

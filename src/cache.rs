//! In-memory TTL cache for validated plan payloads.
//!
//! Keys are content-addressed: a hash of the plan type plus the quiz answers
//! with all object keys recursively sorted, so field order never causes a
//! miss. The cache is a pure cost optimization; losing it only costs a
//! provider call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::plans::dto::PlanType;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: serde_json::Value,
    plan_type: PlanType,
    expires_at: Instant,
    hits: u64,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub items: usize,
    pub meal_plans: usize,
    pub workout_plans: usize,
    pub total_hits: u64,
    pub estimated_bytes: usize,
}

pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Stable key for one (plan type, answers) pair. Object keys are sorted
    /// at every nesting level before hashing.
    pub fn cache_key(plan_type: PlanType, answers: &serde_json::Value) -> String {
        let normalized = serde_json::json!({
            "answers": canonicalize(answers),
            "plan_type": plan_type.as_str(),
        });
        let mut hasher = Sha256::new();
        hasher.update(normalized.to_string().as_bytes());
        let digest = hasher.finalize();
        let mut key = String::with_capacity(digest.len() * 2);
        for byte in digest {
            key.push_str(&format!("{byte:02x}"));
        }
        key
    }

    pub async fn get(&self, plan_type: PlanType, answers: &serde_json::Value) -> Option<serde_json::Value> {
        let key = Self::cache_key(plan_type, answers);
        let mut entries = self.entries.write().await;
        match entries.get_mut(&key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(&key);
                None
            }
            Some(entry) => {
                entry.hits += 1;
                Some(entry.payload.clone())
            }
            None => None,
        }
    }

    pub async fn set(
        &self,
        plan_type: PlanType,
        answers: &serde_json::Value,
        payload: serde_json::Value,
    ) -> String {
        let key = Self::cache_key(plan_type, answers);
        let entry = CacheEntry {
            payload,
            plan_type,
            expires_at: Instant::now() + self.ttl,
            hits: 0,
        };
        self.entries.write().await.insert(key.clone(), entry);
        key
    }

    pub async fn invalidate(&self, plan_type: PlanType, answers: &serde_json::Value) -> bool {
        let key = Self::cache_key(plan_type, answers);
        self.entries.write().await.remove(&key).is_some()
    }

    /// Proactively drop expired entries; returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        before - entries.len()
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let mut stats = CacheStats {
            items: entries.len(),
            meal_plans: 0,
            workout_plans: 0,
            total_hits: 0,
            estimated_bytes: 0,
        };
        for entry in entries.values() {
            match entry.plan_type {
                PlanType::Meal => stats.meal_plans += 1,
                PlanType::Workout => stats.workout_plans += 1,
            }
            stats.total_hits += entry.hits;
            stats.estimated_bytes += entry.payload.to_string().len();
        }
        stats
    }

    /// Background sweep loop, independent of lazy eviction on reads.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately
            loop {
                ticker.tick().await;
                let removed = cache.sweep_expired().await;
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
        })
    }
}

/// Rebuild a JSON value with all object keys in sorted order at every level.
fn canonicalize(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::with_capacity(map.len());
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), canonicalize(v));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(canonicalize).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn answers() -> serde_json::Value {
        json!({"age": 30, "gender": "male", "mainGoal": "Weight loss"})
    }

    #[tokio::test]
    async fn set_then_get_returns_the_stored_payload() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        let payload = json!({"weekly_plan": []});
        cache.set(PlanType::Meal, &answers(), payload.clone()).await;
        let hit = cache.get(PlanType::Meal, &answers()).await.expect("hit");
        assert_eq!(hit, payload);
    }

    #[tokio::test]
    async fn key_order_differences_hit_the_same_entry() {
        // Same answers serialized with a different field order must collide.
        let a = serde_json::from_str::<serde_json::Value>(
            r#"{"age": 30, "gender": "male", "nested": {"x": 1, "y": 2}}"#,
        )
        .expect("json");
        let b = serde_json::from_str::<serde_json::Value>(
            r#"{"gender": "male", "nested": {"y": 2, "x": 1}, "age": 30}"#,
        )
        .expect("json");
        assert_eq!(
            ResponseCache::cache_key(PlanType::Meal, &a),
            ResponseCache::cache_key(PlanType::Meal, &b)
        );

        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.set(PlanType::Meal, &a, json!({"plan": 1})).await;
        assert!(cache.get(PlanType::Meal, &b).await.is_some());
    }

    #[tokio::test]
    async fn plan_types_do_not_share_entries() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.set(PlanType::Meal, &answers(), json!({"plan": "meal"})).await;
        assert!(cache.get(PlanType::Workout, &answers()).await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_miss_and_are_removed() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.set(PlanType::Meal, &answers(), json!({"plan": 1})).await;
        assert!(cache.get(PlanType::Meal, &answers()).await.is_none());
        assert_eq!(cache.stats().await.items, 0);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let cache = ResponseCache::new(Duration::ZERO);
        cache.set(PlanType::Meal, &answers(), json!({"plan": 1})).await;
        let removed = cache.sweep_expired().await;
        assert_eq!(removed, 1);
        assert_eq!(cache.sweep_expired().await, 0);
    }

    #[tokio::test]
    async fn invalidate_removes_the_entry() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.set(PlanType::Meal, &answers(), json!({"plan": 1})).await;
        assert!(cache.invalidate(PlanType::Meal, &answers()).await);
        assert!(!cache.invalidate(PlanType::Meal, &answers()).await);
        assert!(cache.get(PlanType::Meal, &answers()).await.is_none());
    }

    #[tokio::test]
    async fn stats_count_items_and_hits() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.set(PlanType::Meal, &answers(), json!({"plan": 1})).await;
        cache.set(PlanType::Workout, &answers(), json!({"plan": 2})).await;
        cache.get(PlanType::Meal, &answers()).await;
        cache.get(PlanType::Meal, &answers()).await;

        let stats = cache.stats().await;
        assert_eq!(stats.items, 2);
        assert_eq!(stats.meal_plans, 1);
        assert_eq!(stats.workout_plans, 1);
        assert_eq!(stats.total_hits, 2);
        assert!(stats.estimated_bytes > 0);
    }
}

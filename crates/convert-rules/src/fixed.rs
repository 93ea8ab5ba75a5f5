//! Tenant-scoped fixed-value lookups.
//!
//! The tables live in an external store reached through
//! [`FixedValueSource`]. [`FixedValueCache`] memoizes them per tenant and
//! rule in a bounded LRU; a run takes a [`FixedValueSnapshot`] up front and
//! only reads from it afterwards, so the cache may be invalidated between
//! runs without affecting one in progress.

use std::collections::{BTreeMap, HashMap};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use convert_model::TenantId;
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RuleError};
use crate::rule::FixedRule;

pub const DEFAULT_CACHE_CAPACITY: usize = 128;

/// One `before → after` entry as kept by the rule configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedValueRecord {
    #[serde(default)]
    pub tenant_id: TenantId,
    #[serde(alias = "rule")]
    pub rule_id: String,
    #[serde(alias = "data_value_before")]
    pub before: String,
    #[serde(alias = "data_value_after")]
    pub after: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedValueTable {
    values: HashMap<String, String>,
}

impl FixedValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, before: impl Into<String>, after: impl Into<String>) {
        self.values.insert(before.into(), after.into());
    }

    pub fn get(&self, before: &str) -> Option<&str> {
        self.values.get(before).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FixedValueTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (before, after) in iter {
            table.insert(before, after);
        }
        table
    }
}

/// Read access to the external fixed-value store.
pub trait FixedValueSource: Send + Sync {
    /// Loads the whole table for one tenant and rule. A rule without
    /// entries yields an empty table, not an error.
    fn load(&self, tenant_id: TenantId, rule: FixedRule) -> Result<FixedValueTable>;
}

/// Fixed values held in memory, typically loaded from a profile.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFixedValues {
    tables: BTreeMap<(TenantId, FixedRule), FixedValueTable>,
}

impl InMemoryFixedValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = FixedValueRecord>,
    {
        let mut source = Self::new();
        for record in records {
            let rule = FixedRule::from_id(&record.rule_id).ok_or_else(|| {
                RuleError::NotFixedRule {
                    rule_id: record.rule_id.clone(),
                }
            })?;
            source.insert(record.tenant_id, rule, record.before, record.after);
        }
        Ok(source)
    }

    pub fn insert(
        &mut self,
        tenant_id: TenantId,
        rule: FixedRule,
        before: impl Into<String>,
        after: impl Into<String>,
    ) {
        self.tables
            .entry((tenant_id, rule))
            .or_default()
            .insert(before, after);
    }
}

impl FixedValueSource for InMemoryFixedValues {
    fn load(&self, tenant_id: TenantId, rule: FixedRule) -> Result<FixedValueTable> {
        Ok(self
            .tables
            .get(&(tenant_id, rule))
            .cloned()
            .unwrap_or_default())
    }
}

type CacheKey = (TenantId, FixedRule);

/// Bounded memo of fixed-value tables keyed by tenant and rule.
pub struct FixedValueCache {
    source: Arc<dyn FixedValueSource>,
    entries: Mutex<LruCache<CacheKey, Arc<FixedValueTable>>>,
}

impl FixedValueCache {
    pub fn new(source: Arc<dyn FixedValueSource>) -> Self {
        Self::with_capacity(source, DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(source: Arc<dyn FixedValueSource>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<CacheKey, Arc<FixedValueTable>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Table for `tenant_id` and `rule`, loading it on a miss.
    pub fn table(&self, tenant_id: TenantId, rule: FixedRule) -> Result<Arc<FixedValueTable>> {
        if let Some(table) = self.entries().get(&(tenant_id, rule)) {
            return Ok(Arc::clone(table));
        }
        let table = Arc::new(self.source.load(tenant_id, rule)?);
        tracing::debug!(
            tenant_id = %tenant_id,
            rule = %rule,
            entries = table.len(),
            "loaded fixed-value table"
        );
        self.entries().put((tenant_id, rule), Arc::clone(&table));
        Ok(table)
    }

    /// Mapped value for `before`, or an empty string when there is none.
    pub fn get_value_mapping(&self, tenant_id: TenantId, rule_id: &str, before: &str) -> String {
        let Some(rule) = FixedRule::from_id(rule_id) else {
            tracing::warn!(rule_id, "fixed-value lookup for a non fixed-value rule");
            return String::new();
        };
        match self.table(tenant_id, rule) {
            Ok(table) => table.get(before).unwrap_or_default().to_string(),
            Err(error) => {
                tracing::error!(%error, "fixed-value lookup failed");
                String::new()
            }
        }
    }

    /// Resolves every table `rules` needs for one run.
    ///
    /// Tables that fail to load are left out and logged; lookups against
    /// them report [`RuleError::TableUnavailable`].
    pub fn snapshot<I>(&self, tenant_id: TenantId, rules: I) -> FixedValueSnapshot
    where
        I: IntoIterator<Item = FixedRule>,
    {
        let mut tables = BTreeMap::new();
        for rule in rules {
            if tables.contains_key(&rule) {
                continue;
            }
            match self.table(tenant_id, rule) {
                Ok(table) => {
                    tables.insert(rule, table);
                }
                Err(error) => {
                    tracing::error!(%error, "fixed-value table unavailable for this run");
                }
            }
        }
        FixedValueSnapshot { tenant_id, tables }
    }

    pub fn clear_cache(&self) {
        self.entries().clear();
    }

    /// Drops every cached table of one tenant.
    pub fn invalidate(&self, tenant_id: TenantId) {
        let mut entries = self.entries();
        let stale: Vec<CacheKey> = entries
            .iter()
            .map(|(key, _)| *key)
            .filter(|(tenant, _)| *tenant == tenant_id)
            .collect();
        for key in stale {
            entries.pop(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl std::fmt::Debug for FixedValueCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedValueCache")
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}

/// Read-only fixed-value tables of one tenant for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct FixedValueSnapshot {
    tenant_id: TenantId,
    tables: BTreeMap<FixedRule, Arc<FixedValueTable>>,
}

impl FixedValueSnapshot {
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn lookup(&self, rule: FixedRule, before: &str) -> Result<Option<&str>> {
        let table = self
            .tables
            .get(&rule)
            .ok_or(RuleError::TableUnavailable { rule })?;
        Ok(table.get(before))
    }

    /// Mapped value, or `value` itself when the mapping is missing or empty.
    pub fn apply(&self, value: &str, rule: FixedRule) -> Result<String> {
        Ok(match self.lookup(rule, value)? {
            Some(mapped) if !mapped.is_empty() => mapped.to_string(),
            _ => value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct CountingSource {
        inner: InMemoryFixedValues,
        loads: AtomicUsize,
    }

    impl FixedValueSource for CountingSource {
        fn load(&self, tenant_id: TenantId, rule: FixedRule) -> Result<FixedValueTable> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load(tenant_id, rule)
        }
    }

    fn source() -> Arc<CountingSource> {
        let mut inner = InMemoryFixedValues::new();
        inner.insert(TenantId(1), FixedRule::GroupNo, "A", "G-01");
        inner.insert(TenantId(2), FixedRule::GroupNo, "A", "G-99");
        Arc::new(CountingSource {
            inner,
            loads: AtomicUsize::new(0),
        })
    }

    #[test]
    fn lookup_miss_yields_empty_mapping() {
        let cache = FixedValueCache::new(source());
        assert_eq!(cache.get_value_mapping(TenantId(1), "GROUP_NO", "A"), "G-01");
        assert_eq!(cache.get_value_mapping(TenantId(1), "GROUP_NO", "X"), "");
        assert_eq!(cache.get_value_mapping(TenantId(1), "DATE1", "A"), "");
    }

    #[test]
    fn tables_are_cached_until_cleared() {
        let source = source();
        let cache = FixedValueCache::new(source.clone());
        cache.table(TenantId(1), FixedRule::GroupNo).unwrap();
        cache.table(TenantId(1), FixedRule::GroupNo).unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 1);
        cache.clear_cache();
        assert!(cache.is_empty());
        cache.table(TenantId(1), FixedRule::GroupNo).unwrap();
        assert_eq!(source.loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn invalidate_only_drops_one_tenant() {
        let cache = FixedValueCache::new(source());
        cache.table(TenantId(1), FixedRule::GroupNo).unwrap();
        cache.table(TenantId(2), FixedRule::GroupNo).unwrap();
        cache.invalidate(TenantId(1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn capacity_bounds_entries() {
        let cache = FixedValueCache::with_capacity(source(), 2);
        for rule in FixedRule::ALL {
            cache.table(TenantId(1), rule).unwrap();
        }
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn snapshot_falls_back_to_input() {
        let cache = FixedValueCache::new(source());
        let snapshot = cache.snapshot(TenantId(1), [FixedRule::GroupNo]);
        assert_eq!(snapshot.apply("A", FixedRule::GroupNo).unwrap(), "G-01");
        assert_eq!(snapshot.apply("X", FixedRule::GroupNo).unwrap(), "X");
        assert!(matches!(
            snapshot.apply("A", FixedRule::TimeEnd),
            Err(RuleError::TableUnavailable { .. })
        ));
    }

    #[test]
    fn records_must_name_fixed_rules() {
        let records = vec![FixedValueRecord {
            tenant_id: TenantId(1),
            rule_id: "DATE1".to_string(),
            before: "a".to_string(),
            after: "b".to_string(),
        }];
        assert!(matches!(
            InMemoryFixedValues::from_records(records),
            Err(RuleError::NotFixedRule { .. })
        ));
    }
}

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One entry of an enumerated option set (priority, status, product, task type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefEntry {
    pub id: String,
    pub name: String,
    /// Position of this entry within its set
    #[serde(default)]
    pub ordinal: u32,
}

impl RefEntry {
    pub fn new(id: &str, name: &str, ordinal: u32) -> Self {
        RefEntry {
            id: id.to_string(),
            name: name.to_string(),
            ordinal,
        }
    }
}

/// A team member that tasks can be assigned to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub display_name: String,
}

impl Member {
    pub fn new(id: &str, display_name: &str) -> Self {
        Member {
            id: id.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Which reference set an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Priority,
    Status,
    Product,
    TaskType,
}

impl RefKind {
    pub const ALL: [RefKind; 4] = [
        RefKind::Priority,
        RefKind::Status,
        RefKind::Product,
        RefKind::TaskType,
    ];

    /// Document name in the store
    pub fn collection(self) -> &'static str {
        match self {
            RefKind::Priority => "priorities",
            RefKind::Status => "statuses",
            RefKind::Product => "products",
            RefKind::TaskType => "task_types",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RefKind::Priority => "優先級",
            RefKind::Status => "狀態",
            RefKind::Product => "產品",
            RefKind::TaskType => "任務類型",
        }
    }
}

/// An ordinal-ordered reference set keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    entries: IndexMap<String, RefEntry>,
}

impl ReferenceSet {
    /// Build a set from entries in any order; iteration follows `ordinal`,
    /// ties keep the given order.
    pub fn new(mut entries: Vec<RefEntry>) -> Self {
        entries.sort_by_key(|e| e.ordinal);
        ReferenceSet {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&RefEntry> {
        self.entries.get(id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&RefEntry> {
        self.entries.values().find(|e| e.name == name)
    }

    /// Resolve user input that may be either an id or a display name
    pub fn resolve(&self, id_or_name: &str) -> Option<&RefEntry> {
        self.get(id_or_name)
            .or_else(|| self.find_by_name(id_or_name))
    }

    /// Lowest-ordinal entry
    pub fn first(&self) -> Option<&RefEntry> {
        self.entries.values().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-memory copy of the four reference sets, fetched once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceCache {
    pub priorities: ReferenceSet,
    pub statuses: ReferenceSet,
    pub products: ReferenceSet,
    pub task_types: ReferenceSet,
}

impl ReferenceCache {
    pub fn set(&self, kind: RefKind) -> &ReferenceSet {
        match kind {
            RefKind::Priority => &self.priorities,
            RefKind::Status => &self.statuses,
            RefKind::Product => &self.products,
            RefKind::TaskType => &self.task_types,
        }
    }

    pub fn set_mut(&mut self, kind: RefKind) -> &mut ReferenceSet {
        match kind {
            RefKind::Priority => &mut self.priorities,
            RefKind::Status => &mut self.statuses,
            RefKind::Product => &mut self.products,
            RefKind::TaskType => &mut self.task_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_iterates_by_ordinal() {
        let set = ReferenceSet::new(vec![
            RefEntry::new("c", "低", 3),
            RefEntry::new("a", "緊急", 1),
            RefEntry::new("b", "一般", 2),
        ]);
        let ids: Vec<&str> = set.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(set.first().map(|e| e.id.as_str()), Some("a"));
    }

    #[test]
    fn test_resolve_accepts_id_or_name() {
        let set = ReferenceSet::new(vec![RefEntry::new("s1", "進行中", 1)]);
        assert_eq!(set.resolve("s1").map(|e| e.name.as_str()), Some("進行中"));
        assert_eq!(set.resolve("進行中").map(|e| e.id.as_str()), Some("s1"));
        assert!(set.resolve("missing").is_none());
    }

    #[test]
    fn test_cache_selects_set_by_kind() {
        let mut cache = ReferenceCache::default();
        *cache.set_mut(RefKind::Product) = ReferenceSet::new(vec![RefEntry::new("xq", "XQ", 1)]);
        assert_eq!(cache.set(RefKind::Product).len(), 1);
        assert!(cache.set(RefKind::TaskType).is_empty());
    }
}

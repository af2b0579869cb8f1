//! In-memory resource store with scripted status progressions
//!
//! Every entry carries a queue of pending steps. Each observation (a get or
//! a list that returns the entry) consumes one step, so a test can script
//! `INIT -> CREAT -> RUN` and the reconciler sees it one poll at a time.

use std::collections::{BTreeMap, VecDeque};

/// Something whose vendor status code the mock can overwrite
pub(crate) trait MockStatus {
    fn apply_status(&mut self, code: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    Status(String),
    Remove,
}

#[derive(Debug, Clone)]
pub(crate) struct MockEntry<T> {
    pub(crate) resource: T,
    steps: VecDeque<Step>,
}

#[derive(Debug, Clone)]
pub(crate) struct MockStore<T> {
    entries: BTreeMap<String, MockEntry<T>>,
}

impl<T> Default for MockStore<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T: Clone + MockStatus> MockStore<T> {
    /// Insert as-is, without pending steps
    pub(crate) fn insert(&mut self, key: impl Into<String>, resource: T) {
        self.entries.insert(
            key.into(),
            MockEntry {
                resource,
                steps: VecDeque::new(),
            },
        );
    }

    /// Insert a freshly created resource: the first status applies now, the
    /// rest are observed one poll at a time
    pub(crate) fn insert_created(
        &mut self,
        key: impl Into<String>,
        mut resource: T,
        statuses: &[String],
    ) -> T {
        let mut steps: VecDeque<Step> = statuses.iter().cloned().map(Step::Status).collect();
        if let Some(Step::Status(first)) = steps.pop_front() {
            resource.apply_status(&first);
        }
        let snapshot = resource.clone();
        self.entries.insert(key.into(), MockEntry { resource, steps });
        snapshot
    }

    /// Replace the pending steps of an entry; `remove` appends a final removal
    pub(crate) fn schedule(&mut self, key: &str, statuses: &[String], remove: bool) -> bool {
        match self.entries.get_mut(key) {
            Some(entry) => {
                entry.steps = statuses.iter().cloned().map(Step::Status).collect();
                if remove {
                    entry.steps.push_back(Step::Remove);
                }
                true
            }
            None => false,
        }
    }

    /// Observe one entry, consuming one pending step
    pub(crate) fn observe(&mut self, key: &str) -> Option<T> {
        let step = self.entries.get_mut(key)?.steps.pop_front();
        match step {
            Some(Step::Remove) => {
                self.entries.remove(key);
                None
            }
            Some(Step::Status(code)) => {
                let entry = self.entries.get_mut(key)?;
                entry.resource.apply_status(&code);
                Some(entry.resource.clone())
            }
            None => self.entries.get(key).map(|e| e.resource.clone()),
        }
    }

    /// Observe every entry accepted by `filter`, in key order
    pub(crate) fn observe_where(&mut self, filter: impl Fn(&T) -> bool) -> Vec<T> {
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| filter(&entry.resource))
            .map(|(key, _)| key.clone())
            .collect();
        keys.iter().filter_map(|key| self.observe(key)).collect()
    }

    /// Current value without consuming a step
    pub(crate) fn peek(&self, key: &str) -> Option<T> {
        self.entries.get(key).map(|e| e.resource.clone())
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.entries.get_mut(key).map(|e| &mut e.resource)
    }

    pub(crate) fn remove(&mut self, key: &str) -> Option<T> {
        self.entries.remove(key).map(|e| e.resource)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

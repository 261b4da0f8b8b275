//! Actor exclusion list.
//!
//! Names on this list never appear in generated filenames. The list lives in a
//! key-value store under a single key, is seeded from a built-in default set on
//! first use, and is edited by the user one actor at a time.

mod store;

pub use store::{JsonFileStore, KvStore, MemoryStore, StoreError};

use serde_json::Value;

/// Store key holding the exclusion list (a JSON array of strings).
pub const EXCLUSIONS_KEY: &str = "excludedActors";

/// Seed list written on first run.
pub const DEFAULT_EXCLUDED_ACTORS: [&str; 7] = [
    "elias cash",
    "johnny sins",
    "j-mac",
    "keiran lee",
    "mick blue",
    "charles dera",
    "mike adriano",
];

/// Result of an interactive toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// User said no; the caller should follow the actor link instead.
    Declined,
}

/// Case-insensitive set of actor names. Keeps the casing of first insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    names: Vec<String>,
}

impl ExclusionList {
    pub fn with_defaults() -> Self {
        Self {
            names: DEFAULT_EXCLUDED_ACTORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        let needle = name.to_lowercase();
        self.names.iter().any(|n| n.to_lowercase() == needle)
    }

    /// Adds `name` unless an entry matches case-insensitively. Returns true if added.
    pub fn add(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Removes every case-insensitive match. Returns true if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let needle = name.to_lowercase();
        let before = self.names.len();
        self.names.retain(|n| n.to_lowercase() != needle);
        self.names.len() != before
    }

    /// Loads the list from `store`, seeding and persisting the defaults when the
    /// key is missing or does not hold an array of strings.
    pub fn load(store: &dyn KvStore) -> Result<Self, StoreError> {
        if let Some(list) = store.get(EXCLUSIONS_KEY)?.as_ref().and_then(Self::from_value) {
            tracing::debug!(count = list.len(), "loaded excluded actors");
            return Ok(list);
        }
        let list = Self::with_defaults();
        list.save(store)?;
        tracing::info!(count = list.len(), "initialized excluded actors with defaults");
        Ok(list)
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<(), StoreError> {
        store.set(EXCLUSIONS_KEY, &Value::from(self.names.clone()))
    }

    /// Asks the user whether to flip `actor`'s membership and persists a yes.
    ///
    /// `confirm` receives the prompt text and returns the user's answer.
    pub fn toggle_with_confirm<F>(
        &mut self,
        store: &dyn KvStore,
        actor: &str,
        confirm: F,
    ) -> Result<ToggleOutcome, StoreError>
    where
        F: FnOnce(&str) -> bool,
    {
        if self.contains(actor) {
            let prompt = format!(
                "\"{actor}\" is already on your exclude list.\n\nDo you want to REMOVE them from the list?"
            );
            if !confirm(&prompt) {
                return Ok(ToggleOutcome::Declined);
            }
            self.remove(actor);
            self.save(store)?;
            tracing::info!(actor, "removed actor from exclude list");
            Ok(ToggleOutcome::Removed)
        } else {
            let prompt = format!(
                "Do you want to ADD \"{actor}\" to your EXCLUDED actors list so they don't appear in filenames?"
            );
            if !confirm(&prompt) {
                return Ok(ToggleOutcome::Declined);
            }
            self.add(actor);
            self.save(store)?;
            tracing::info!(actor, "added actor to exclude list");
            Ok(ToggleOutcome::Added)
        }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let names = value
            .as_array()?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { names })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_seeds_and_persists_defaults() {
        let store = MemoryStore::new();
        let list = ExclusionList::load(&store).unwrap();
        assert_eq!(list, ExclusionList::with_defaults());
        let saved = store.get(EXCLUSIONS_KEY).unwrap().unwrap();
        assert_eq!(saved.as_array().unwrap().len(), DEFAULT_EXCLUDED_ACTORS.len());
    }

    #[test]
    fn load_replaces_malformed_value() {
        let store = MemoryStore::new();
        store.set(EXCLUSIONS_KEY, &serde_json::json!({"oops": true})).unwrap();
        assert_eq!(ExclusionList::load(&store).unwrap(), ExclusionList::with_defaults());

        store.set(EXCLUSIONS_KEY, &serde_json::json!(["ok", 3])).unwrap();
        assert_eq!(ExclusionList::load(&store).unwrap(), ExclusionList::with_defaults());
    }

    #[test]
    fn load_keeps_existing_list() {
        let store = MemoryStore::new();
        store.set(EXCLUSIONS_KEY, &serde_json::json!(["Only One"])).unwrap();
        let list = ExclusionList::load(&store).unwrap();
        assert_eq!(list.names(), ["Only One".to_string()]);
    }

    #[test]
    fn add_existing_is_noop_and_keeps_first_casing() {
        let mut list = ExclusionList::default();
        assert!(list.add("Jane Doe"));
        assert!(!list.add("JANE DOE"));
        assert!(!list.add("Jane Doe"));
        assert_eq!(list.names(), ["Jane Doe".to_string()]);
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut list = ExclusionList::with_defaults();
        assert!(list.remove("Johnny Sins"));
        assert!(!list.contains("johnny sins"));
        assert!(!list.remove("Johnny Sins"));
    }

    #[test]
    fn toggle_adds_on_yes_and_persists() {
        let store = MemoryStore::new();
        let mut list = ExclusionList::load(&store).unwrap();
        let outcome = list
            .toggle_with_confirm(&store, "Jane Doe", |prompt| {
                assert!(prompt.contains("ADD \"Jane Doe\""));
                true
            })
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Added);
        assert!(ExclusionList::load(&store).unwrap().contains("jane doe"));
    }

    #[test]
    fn toggle_removes_on_yes() {
        let store = MemoryStore::new();
        let mut list = ExclusionList::load(&store).unwrap();
        let outcome = list
            .toggle_with_confirm(&store, "Mick Blue", |prompt| {
                assert!(prompt.contains("REMOVE"));
                true
            })
            .unwrap();
        assert_eq!(outcome, ToggleOutcome::Removed);
        assert!(!ExclusionList::load(&store).unwrap().contains("mick blue"));
    }

    #[test]
    fn toggle_declined_leaves_store_untouched() {
        let store = MemoryStore::new();
        let mut list = ExclusionList::load(&store).unwrap();
        let outcome = list.toggle_with_confirm(&store, "Jane Doe", |_| false).unwrap();
        assert_eq!(outcome, ToggleOutcome::Declined);
        assert_eq!(ExclusionList::load(&store).unwrap(), ExclusionList::with_defaults());
    }
}

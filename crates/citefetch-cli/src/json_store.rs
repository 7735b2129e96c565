//! JSON-file backed item store.
//!
//! The library is a JSON array of items. Mutations are buffered by the
//! wrapped [`MemoryStore`]; `save`/`erase` commit in memory and then rewrite
//! the file through a temp-file rename, so a failed write never truncates
//! the library.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use citefetch_core::store::{
    Creator, Item, ItemId, ItemStore, ItemType, MemoryStore, StoreError, TypeChange,
};

pub struct JsonStore {
    inner: MemoryStore,
    path: PathBuf,
}

impl JsonStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading library {}", path.display()))?;
        let items: Vec<Item> = serde_json::from_str(&content)
            .with_context(|| format!("parsing library {}", path.display()))?;

        let mut inner = MemoryStore::new();
        for item in items {
            inner.insert(item);
        }
        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// All item ids in the library, in id order.
    pub fn ids(&self) -> Vec<ItemId> {
        self.inner.ids()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let items: Vec<&Item> = self.inner.items().collect();
        let json = serde_json::to_string_pretty(&items)
            .map_err(|e| StoreError::Persist(e.to_string()))?;

        let dir = self.path.parent().unwrap_or(Path::new("."));
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| StoreError::Persist(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::Persist(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::Persist(e.to_string()))?;
        Ok(())
    }
}

impl ItemStore for JsonStore {
    fn item_type(&self, id: ItemId) -> Result<ItemType, StoreError> {
        self.inner.item_type(id)
    }

    fn get_field(&self, id: ItemId, field: &str) -> Result<Option<String>, StoreError> {
        self.inner.get_field(id, field)
    }

    fn set_field(&mut self, id: ItemId, field: &str, value: &str) -> Result<(), StoreError> {
        self.inner.set_field(id, field, value)
    }

    fn fields(&self, id: ItemId) -> Result<Vec<(String, String)>, StoreError> {
        self.inner.fields(id)
    }

    fn creators(&self, id: ItemId) -> Result<Vec<Creator>, StoreError> {
        self.inner.creators(id)
    }

    fn set_creators(&mut self, id: ItemId, creators: Vec<Creator>) -> Result<(), StoreError> {
        self.inner.set_creators(id, creators)
    }

    fn change_type(&mut self, id: ItemId, new_type: ItemType) -> Result<TypeChange, StoreError> {
        self.inner.change_type(id, new_type)
    }

    fn create_item(&mut self, item_type: ItemType) -> Result<ItemId, StoreError> {
        self.inner.create_item(item_type)
    }

    fn save(&mut self, id: ItemId) -> Result<(), StoreError> {
        self.inner.save(id)?;
        self.persist()
    }

    fn erase(&mut self, id: ItemId) -> Result<(), StoreError> {
        self.inner.erase(id)?;
        self.persist()
    }

    fn discard(&mut self, id: ItemId) {
        self.inner.discard(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_library(dir: &Path) -> PathBuf {
        let path = dir.join("library.json");
        let items = vec![Item {
            id: 1,
            item_type: ItemType::JournalArticle,
            fields: [("title".to_string(), "A Paper".to_string())]
                .into_iter()
                .collect(),
            creators: vec![],
        }];
        std::fs::write(&path, serde_json::to_string_pretty(&items).unwrap()).unwrap();
        path
    }

    #[test]
    fn save_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed_library(dir.path());

        let mut store = JsonStore::open(&path).unwrap();
        store.set_field(1, "volume", "12").unwrap();
        store.save(1).unwrap();

        let reopened = JsonStore::open(&path).unwrap();
        assert_eq!(reopened.get_field(1, "volume").unwrap().unwrap(), "12");
    }

    #[test]
    fn unsaved_changes_do_not_reach_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed_library(dir.path());

        let mut store = JsonStore::open(&path).unwrap();
        store.set_field(1, "volume", "12").unwrap();
        drop(store);

        let reopened = JsonStore::open(&path).unwrap();
        assert!(reopened.get_field(1, "volume").unwrap().is_none());
    }

    #[test]
    fn erase_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed_library(dir.path());

        let mut store = JsonStore::open(&path).unwrap();
        store.erase(1).unwrap();

        let reopened = JsonStore::open(&path).unwrap();
        assert!(reopened.ids().is_empty());
    }
}

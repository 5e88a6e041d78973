//! Favorite anime list.
//!
//! Stored as a JSON array of ids under [`FAVORITES_KEY`]. The list never holds
//! the same id twice and keeps the order ids were added in.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{NotificationKind, Notifier};
use crate::Error;
use crate::store::{KeyValueStore, get_json, set_json};

/// Storage key of the favorites list.
pub const FAVORITES_KEY: &str = "absolute_favorites";

/// One catalog entry, serialized with the site's field names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct AnimeRecord {
    pub id: u32,
    #[serde(rename = "imagem")]
    pub image: String,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "episodiosTotal")]
    pub total_episodes: u32,
    pub status: String,
}

/// Read-only lookup of anime records by id.
pub trait AnimeCatalog: Send + Sync {
    fn find(&self, id: u32) -> Option<AnimeRecord>;
}

/// Catalog backed by an in-memory record list.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    records: Vec<AnimeRecord>,
}

impl StaticCatalog {
    pub fn new(records: Vec<AnimeRecord>) -> Self {
        Self { records }
    }
}

impl AnimeCatalog for StaticCatalog {
    fn find(&self, id: u32) -> Option<AnimeRecord> {
        self.records.iter().find(|r| r.id == id).cloned()
    }
}

/// Favorites list operations.
pub struct Favorites {
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl Favorites {
    pub fn new(store: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    /// Every favorite id in insertion order.
    ///
    /// Unreadable or corrupt stored data reads as an empty list.
    pub async fn all(&self) -> Vec<u32> {
        match get_json::<Vec<u32>>(self.store.as_ref(), FAVORITES_KEY).await {
            Ok(ids) => ids.unwrap_or_default(),
            Err(e) => {
                tracing::error!(error = %e, "failed to load favorites");
                Vec::new()
            }
        }
    }

    async fn save(&self, ids: &[u32]) -> Result<(), Error> {
        set_json(self.store.as_ref(), FAVORITES_KEY, ids).await
    }

    pub async fn is_favorite(&self, id: u32) -> bool {
        self.all().await.contains(&id)
    }

    /// Add an id. Returns false if it was already a favorite.
    pub async fn add(&self, id: u32) -> Result<bool, Error> {
        let mut ids = self.all().await;
        if ids.contains(&id) {
            return Ok(false);
        }

        ids.push(id);
        self.save(&ids).await?;
        self.notifier
            .show_notification("Anime added to favorites!", NotificationKind::Success);
        Ok(true)
    }

    /// Remove an id. Returns false if it was not a favorite.
    pub async fn remove(&self, id: u32) -> Result<bool, Error> {
        let mut ids = self.all().await;
        let before = ids.len();
        ids.retain(|&f| f != id);
        let removed = ids.len() != before;

        self.save(&ids).await?;
        self.notifier
            .show_notification("Anime removed from favorites", NotificationKind::Info);
        Ok(removed)
    }

    /// Flip an id's membership. Returns whether it is a favorite afterwards.
    pub async fn toggle(&self, id: u32) -> Result<bool, Error> {
        if self.is_favorite(id).await {
            self.remove(id).await?;
            Ok(false)
        } else {
            self.add(id).await?;
            Ok(true)
        }
    }

    /// Catalog records for the stored ids, skipping ids the catalog does not know.
    pub async fn resolve(&self, catalog: &dyn AnimeCatalog) -> Vec<AnimeRecord> {
        self.all()
            .await
            .into_iter()
            .filter_map(|id| catalog.find(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::testing::RecordingNotifier;
    use crate::store::MemoryKeyValueStore;

    fn record(id: u32, title: &str) -> AnimeRecord {
        AnimeRecord {
            id,
            image: format!("img/{id}.jpg"),
            title: title.to_string(),
            total_episodes: 12,
            status: "Completo".to_string(),
        }
    }

    fn favorites() -> (Favorites, Arc<MemoryKeyValueStore>, Arc<RecordingNotifier>) {
        let store = Arc::new(MemoryKeyValueStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        (Favorites::new(store.clone(), notifier.clone()), store, notifier)
    }

    #[tokio::test]
    async fn test_add_keeps_ids_unique() {
        let (favs, store, notifier) = favorites();

        assert!(favs.add(7).await.unwrap());
        assert!(!favs.add(7).await.unwrap());
        assert!(favs.add(3).await.unwrap());

        assert_eq!(favs.all().await, vec![7, 3]);
        assert_eq!(store.get_raw(FAVORITES_KEY).await.unwrap().as_deref(), Some("[7,3]"));
        let shown = notifier.shown.lock().unwrap();
        assert_eq!(shown.len(), 2);
        assert_eq!(shown[0].1, NotificationKind::Success);
    }

    #[tokio::test]
    async fn test_remove_and_toggle() {
        let (favs, _, notifier) = favorites();
        favs.add(1).await.unwrap();
        favs.add(2).await.unwrap();

        assert!(favs.remove(1).await.unwrap());
        assert!(!favs.remove(1).await.unwrap());
        assert_eq!(favs.all().await, vec![2]);
        assert_eq!(notifier.shown.lock().unwrap().last().unwrap().1, NotificationKind::Info);

        assert!(!favs.toggle(2).await.unwrap());
        assert!(favs.toggle(2).await.unwrap());
        assert!(favs.is_favorite(2).await);
    }

    #[tokio::test]
    async fn test_corrupt_storage_reads_empty() {
        let (favs, store, _) = favorites();
        store.set_raw(FAVORITES_KEY, "not json".into()).await.unwrap();

        assert!(favs.all().await.is_empty());
        assert!(favs.add(5).await.unwrap());
        assert_eq!(favs.all().await, vec![5]);
    }

    #[tokio::test]
    async fn test_resolve_skips_unknown_ids() {
        let (favs, _, _) = favorites();
        favs.add(2).await.unwrap();
        favs.add(99).await.unwrap();
        favs.add(1).await.unwrap();

        let catalog = StaticCatalog::new(vec![record(1, "One"), record(2, "Two")]);
        let resolved = favs.resolve(&catalog).await;
        assert_eq!(resolved.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[test]
    fn test_catalog_from_site_json() {
        let json = r#"[{"id":4,"imagem":"a.jpg","titulo":"Anime","episodiosTotal":24,"status":"Em andamento"}]"#;
        let catalog = StaticCatalog::new(serde_json::from_str(json).unwrap());
        let found = catalog.find(4).unwrap();
        assert_eq!(found.title, "Anime");
        assert_eq!(found.total_episodes, 24);
        assert!(catalog.find(5).is_none());
    }
}

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use keyspan_core::repository::Result;
use keyspan_core::{Link, Repository, ShortCode, StorageError};
use tracing::trace;

/// Link storage held in process memory.
///
/// DashMap shards its locks, so creates and lookups on different codes do
/// not contend. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, String>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: DashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create(&self, link: &Link) -> Result<()> {
        match self.storage.entry(link.code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(link.code.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(link.long_url.clone());
                trace!(code = %link.code, "stored link in memory");
                Ok(())
            }
        }
    }

    async fn find(&self, code: &ShortCode) -> Result<Link> {
        self.storage
            .get(code.as_str())
            .map(|url| Link::new(code.clone(), url.value().clone()))
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }

    async fn delete(&self, code: &ShortCode) -> Result<()> {
        self.storage
            .remove(code.as_str())
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn link(code: &str, url: &str) -> Link {
        Link::new(ShortCode::new_unchecked(code), url)
    }

    #[tokio::test]
    async fn create_then_find() {
        let repo = InMemoryRepository::new();
        repo.create(&link("b", "https://example.com")).await.unwrap();

        let found = repo.find(&ShortCode::new_unchecked("b")).await.unwrap();
        assert_eq!(found.long_url, "https://example.com");
        assert_eq!(found.code.as_str(), "b");
    }

    #[tokio::test]
    async fn find_absent_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.find(&ShortCode::new_unchecked("nope")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn duplicate_create_conflicts_and_keeps_first() {
        let repo = InMemoryRepository::new();
        repo.create(&link("b", "https://one.example")).await.unwrap();

        let err = repo.create(&link("b", "https://two.example")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let found = repo.find(&ShortCode::new_unchecked("b")).await.unwrap();
        assert_eq!(found.long_url, "https://one.example");
    }

    #[tokio::test]
    async fn delete_removes_link() {
        let repo = InMemoryRepository::new();
        let code = ShortCode::new_unchecked("b");
        repo.create(&link("b", "https://example.com")).await.unwrap();

        repo.delete(&code).await.unwrap();
        assert!(repo.find(&code).await.unwrap_err().is_not_found());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn delete_absent_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.delete(&ShortCode::new_unchecked("b")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn code_can_be_recreated_after_delete() {
        let repo = InMemoryRepository::new();
        let code = ShortCode::new_unchecked("b");

        repo.create(&link("b", "https://one.example")).await.unwrap();
        repo.delete(&code).await.unwrap();
        repo.create(&link("b", "https://two.example")).await.unwrap();

        assert_eq!(repo.find(&code).await.unwrap().long_url, "https://two.example");
    }

    #[tokio::test]
    async fn concurrent_creates_of_one_code_admit_a_single_winner() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..16 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.create(&link("b", &format!("https://example.com/{i}")))
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(repo.len(), 1);
    }
}

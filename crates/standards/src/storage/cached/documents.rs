//! Cached document repository decorator.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use standards_core::cache::{entity_key, entity_list_key, entity_query_key};
use standards_core::domain::EntityKind;
use standards_core::events::DomainEvent;
use standards_core::query::{Page, QueryParameters};
use standards_core::storage::{Document, DocumentRepository, Result};

use crate::cache::CacheService;

/// Cached document repository decorator.
///
/// Integrity checks happen inside the wrapped repository's writes, so they
/// never read cached state.
pub struct CachedDocumentRepository<R: ?Sized> {
    repository: Arc<R>,
    cache: CacheService,
}

impl<R: ?Sized> CachedDocumentRepository<R>
where
    R: DocumentRepository,
{
    pub fn new(repository: Arc<R>, cache: CacheService) -> Self {
        Self { repository, cache }
    }
}

#[async_trait]
impl<R> DocumentRepository for CachedDocumentRepository<R>
where
    R: DocumentRepository + ?Sized + 'static,
{
    async fn get_document(&self, kind: EntityKind, id: Uuid) -> Result<Option<Document>> {
        self.cache
            .get_or_create(&entity_key(kind, id), || {
                self.repository.get_document(kind, id)
            })
            .await
    }

    async fn list_documents(&self, kind: EntityKind) -> Result<Vec<Document>> {
        self.cache
            .get_or_create(&entity_list_key(kind), || self.repository.list_documents(kind))
            .await
    }

    async fn query_documents(
        &self,
        kind: EntityKind,
        params: &QueryParameters,
    ) -> Result<Page<Document>> {
        let key = entity_query_key(kind, &params.fingerprint());
        self.cache
            .get_or_create(&key, || self.repository.query_documents(kind, params))
            .await
    }

    async fn create_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
        self.repository.create_document(document, event).await?;
        self.cache
            .invalidate_kind(document.kind, Some(document.id))
            .await;

        tracing::debug!(kind = %document.kind, id = %document.id, "Document created");
        Ok(())
    }

    async fn update_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
        self.repository.update_document(document, event).await?;
        self.cache
            .invalidate_kind(document.kind, Some(document.id))
            .await;

        tracing::debug!(kind = %document.kind, id = %document.id, "Document updated");
        Ok(())
    }

    async fn delete_document(
        &self,
        kind: EntityKind,
        id: Uuid,
        event: &DomainEvent,
    ) -> Result<()> {
        self.repository.delete_document(kind, id, event).await?;
        self.cache.invalidate_kind(kind, Some(id)).await;

        tracing::debug!(kind = %kind, id = %id, "Document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use standards_core::cache::Expiration;
    use standards_core::domain::{Housing, Record};
    use standards_core::storage::RepositoryError;

    use crate::cache::MemoryCache;
    use crate::storage::InMemoryRepository;

    /// Repository that counts reads before delegating to an in-memory store.
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryRepository,
        gets: AtomicUsize,
        lists: AtomicUsize,
        queries: AtomicUsize,
    }

    #[async_trait]
    impl DocumentRepository for CountingRepository {
        async fn get_document(&self, kind: EntityKind, id: Uuid) -> Result<Option<Document>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get_document(kind, id).await
        }

        async fn list_documents(&self, kind: EntityKind) -> Result<Vec<Document>> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            self.inner.list_documents(kind).await
        }

        async fn query_documents(
            &self,
            kind: EntityKind,
            params: &QueryParameters,
        ) -> Result<Page<Document>> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.inner.query_documents(kind, params).await
        }

        async fn create_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
            self.inner.create_document(document, event).await
        }

        async fn update_document(&self, document: &Document, event: &DomainEvent) -> Result<()> {
            self.inner.update_document(document, event).await
        }

        async fn delete_document(
            &self,
            kind: EntityKind,
            id: Uuid,
            event: &DomainEvent,
        ) -> Result<()> {
            self.inner.delete_document(kind, id, event).await
        }
    }

    fn setup() -> (Arc<CountingRepository>, CachedDocumentRepository<CountingRepository>) {
        let repo = Arc::new(CountingRepository::default());
        let cache = CacheService::new(Arc::new(MemoryCache::new(100)), Expiration::never());
        (repo.clone(), CachedDocumentRepository::new(repo, cache))
    }

    fn housing(name: &str) -> Document {
        Document::from_record(&Record::new(Housing::new(name, "H", "1 Main St", 3))).unwrap()
    }

    fn created(document: &Document) -> DomainEvent {
        DomainEvent::created(document.kind, document.id, document.to_json())
    }

    #[tokio::test]
    async fn test_get_document_cache_hit() {
        let (repo, cached) = setup();
        let document = housing("Main");
        cached.create_document(&document, &created(&document)).await.unwrap();

        let first = cached.get_document(EntityKind::Housing, document.id).await.unwrap();
        let second = cached.get_document(EntityKind::Housing, document.id).await.unwrap();

        assert_eq!(first, Some(document.clone()));
        assert_eq!(second, Some(document));
        assert_eq!(repo.gets.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_list_cached_until_write() {
        let (repo, cached) = setup();
        let a = housing("A");
        cached.create_document(&a, &created(&a)).await.unwrap();

        assert_eq!(cached.list_documents(EntityKind::Housing).await.unwrap().len(), 1);
        assert_eq!(cached.list_documents(EntityKind::Housing).await.unwrap().len(), 1);
        assert_eq!(repo.lists.load(Ordering::SeqCst), 1);

        let b = housing("B");
        cached.create_document(&b, &created(&b)).await.unwrap();

        assert_eq!(cached.list_documents(EntityKind::Housing).await.unwrap().len(), 2);
        assert_eq!(repo.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_queries_cached_per_fingerprint() {
        let (repo, cached) = setup();
        let a = housing("North");
        cached.create_document(&a, &created(&a)).await.unwrap();

        let first = QueryParameters::parse("filter=name:eq:North").unwrap();
        let second = QueryParameters::parse("filter=name:eq:South").unwrap();
        cached.query_documents(EntityKind::Housing, &first).await.unwrap();
        cached.query_documents(EntityKind::Housing, &first).await.unwrap();
        cached.query_documents(EntityKind::Housing, &second).await.unwrap();

        assert_eq!(repo.queries.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_update_invalidates_record_and_lists() {
        let (repo, cached) = setup();
        let mut document = housing("Main");
        cached.create_document(&document, &created(&document)).await.unwrap();
        cached.get_document(EntityKind::Housing, document.id).await.unwrap();
        cached.list_documents(EntityKind::Housing).await.unwrap();

        document.fields.insert("name".to_string(), serde_json::json!("Renamed"));
        let event = DomainEvent::updated(document.kind, document.id, document.to_json());
        cached.update_document(&document, &event).await.unwrap();

        let fetched = cached
            .get_document(EntityKind::Housing, document.id)
            .await
            .unwrap()
            .unwrap();
        let listed = cached.list_documents(EntityKind::Housing).await.unwrap();
        assert_eq!(fetched.fields["name"], "Renamed");
        assert_eq!(listed[0].fields["name"], "Renamed");
        assert_eq!(repo.gets.load(Ordering::SeqCst), 2);
        assert_eq!(repo.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_delete_invalidates_record() {
        let (_, cached) = setup();
        let document = housing("Main");
        cached.create_document(&document, &created(&document)).await.unwrap();
        cached.get_document(EntityKind::Housing, document.id).await.unwrap();

        let event = DomainEvent::deleted(document.kind, document.id);
        cached
            .delete_document(document.kind, document.id, &event)
            .await
            .unwrap();

        assert_eq!(
            cached.get_document(EntityKind::Housing, document.id).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cache() {
        let (repo, cached) = setup();
        let document = housing("Main");
        cached.create_document(&document, &created(&document)).await.unwrap();
        cached.list_documents(EntityKind::Housing).await.unwrap();

        let result = cached.create_document(&document, &created(&document)).await;

        assert!(matches!(result, Err(RepositoryError::AlreadyExists { .. })));
        cached.list_documents(EntityKind::Housing).await.unwrap();
        assert_eq!(repo.lists.load(Ordering::SeqCst), 1);
    }
}

// アプリケーションサービス

mod inventory_query_service;

pub use inventory_query_service::{InventoryQueryService, UserInventoryEntry};

use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::event::{InventoryEvent, InventoryItemUpdated};
use crate::domain::model::{CatalogItemId, InventoryItem, UserId};
use crate::domain::port::{EventPublisher, InventoryItemRepository};
use std::sync::Arc;

/// 在庫アプリケーションサービス
/// 特権的な呼び出し側向けの同期パスを提供する
pub struct InventoryApplicationService<IR>
where
    IR: InventoryItemRepository,
{
    inventory_repository: IR,
    publisher: Arc<dyn EventPublisher>,
}

impl<IR> InventoryApplicationService<IR>
where
    IR: InventoryItemRepository,
{
    /// 新しいアプリケーションサービスを作成
    ///
    /// # Arguments
    /// * `inventory_repository` - 在庫リポジトリ
    /// * `publisher` - イベント発行者
    pub fn new(inventory_repository: IR, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            inventory_repository,
            publisher,
        }
    }

    /// アイテムを直接付与する
    ///
    /// コマンドパスと同じ「なければ作成・あれば加算」だが、配送IDの概念が
    /// ないため重複排除の記帳は行わない。このパスは冪等ではなく、再送信は
    /// そのまま二重加算になる。呼び出し側が二重送信しないことを前提とする。
    ///
    /// # Returns
    /// * `Ok(i64)` - 付与後の合計数量
    /// * `Err(ApplicationError)` - 付与失敗
    pub async fn grant_items(
        &self,
        user_id: UserId,
        catalog_item_id: CatalogItemId,
        quantity: i64,
    ) -> Result<i64, ApplicationError> {
        if quantity <= 0 {
            return Err(ApplicationError::DomainError(DomainError::InvalidQuantity));
        }

        let existing = self
            .inventory_repository
            .find_by_user_and_item(user_id, catalog_item_id)
            .await?;

        let item = match existing {
            None => {
                let item = InventoryItem::new(user_id, catalog_item_id, quantity);
                self.inventory_repository.create(&item).await?;
                item
            }
            Some(mut item) => {
                item.add_quantity(quantity);
                self.inventory_repository.update(&item).await?;
                item
            }
        };

        // 直接付与でも数量変化は必ず通知する
        self.publisher
            .publish(InventoryEvent::InventoryItemUpdated(
                InventoryItemUpdated::new(item.user_id(), item.catalog_item_id(), item.quantity()),
            ))
            .await
            .map_err(|e| ApplicationError::EventPublishingFailed(e.to_string()))?;

        Ok(item.quantity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::port::{PublisherError, RepositoryError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    // テスト用のモックリポジトリ
    struct MockInventoryItemRepository {
        items: Arc<Mutex<HashMap<(UserId, CatalogItemId), InventoryItem>>>,
    }

    impl MockInventoryItemRepository {
        fn new() -> Self {
            Self {
                items: Arc::new(Mutex::new(HashMap::new())),
            }
        }
    }

    #[async_trait]
    impl InventoryItemRepository for MockInventoryItemRepository {
        async fn create(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
            let mut items = self.items.lock().await;
            items.insert((item.user_id(), item.catalog_item_id()), item.clone());
            Ok(())
        }

        async fn update(&self, item: &InventoryItem) -> Result<(), RepositoryError> {
            let mut items = self.items.lock().await;
            items.insert((item.user_id(), item.catalog_item_id()), item.clone());
            Ok(())
        }

        async fn find_by_user_and_item(
            &self,
            user_id: UserId,
            catalog_item_id: CatalogItemId,
        ) -> Result<Option<InventoryItem>, RepositoryError> {
            let items = self.items.lock().await;
            Ok(items.get(&(user_id, catalog_item_id)).cloned())
        }

        async fn find_all_by_user(
            &self,
            user_id: UserId,
        ) -> Result<Vec<InventoryItem>, RepositoryError> {
            let items = self.items.lock().await;
            Ok(items
                .values()
                .filter(|item| item.user_id() == user_id)
                .cloned()
                .collect())
        }
    }

    // テスト用のモックイベント発行者
    #[derive(Clone)]
    struct MockEventPublisher {
        published_events: Arc<Mutex<Vec<InventoryEvent>>>,
    }

    impl MockEventPublisher {
        fn new() -> Self {
            Self {
                published_events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        async fn get_published_events(&self) -> Vec<InventoryEvent> {
            let events = self.published_events.lock().await;
            events.clone()
        }
    }

    #[async_trait]
    impl EventPublisher for MockEventPublisher {
        async fn publish(&self, event: InventoryEvent) -> Result<(), PublisherError> {
            let mut events = self.published_events.lock().await;
            events.push(event);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_direct_grant_creates_record() {
        let publisher = Arc::new(MockEventPublisher::new());
        let service =
            InventoryApplicationService::new(MockInventoryItemRepository::new(), publisher.clone());

        let user_id = UserId::new();
        let catalog_item_id = CatalogItemId::new();

        let total = service.grant_items(user_id, catalog_item_id, 5).await.unwrap();
        assert_eq!(total, 5);

        let events = publisher.get_published_events().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            InventoryEvent::InventoryItemUpdated(u) if u.new_total_quantity == 5
        ));
    }

    #[tokio::test]
    async fn test_direct_grant_increments_existing_record() {
        let publisher = Arc::new(MockEventPublisher::new());
        let service =
            InventoryApplicationService::new(MockInventoryItemRepository::new(), publisher.clone());

        let user_id = UserId::new();
        let catalog_item_id = CatalogItemId::new();

        service.grant_items(user_id, catalog_item_id, 5).await.unwrap();
        let total = service.grant_items(user_id, catalog_item_id, 3).await.unwrap();
        assert_eq!(total, 8);
    }

    #[tokio::test]
    async fn test_direct_grant_double_submit_double_counts() {
        // このパスに冪等性はない。再送信はそのまま二重加算になる
        let publisher = Arc::new(MockEventPublisher::new());
        let service =
            InventoryApplicationService::new(MockInventoryItemRepository::new(), publisher.clone());

        let user_id = UserId::new();
        let catalog_item_id = CatalogItemId::new();

        service.grant_items(user_id, catalog_item_id, 5).await.unwrap();
        let total = service.grant_items(user_id, catalog_item_id, 5).await.unwrap();
        assert_eq!(total, 10);
    }

    #[tokio::test]
    async fn test_direct_grant_rejects_non_positive_quantity() {
        let publisher = Arc::new(MockEventPublisher::new());
        let service =
            InventoryApplicationService::new(MockInventoryItemRepository::new(), publisher.clone());

        let result = service
            .grant_items(UserId::new(), CatalogItemId::new(), 0)
            .await;
        assert!(matches!(
            result,
            Err(ApplicationError::DomainError(DomainError::InvalidQuantity))
        ));
        assert!(publisher.get_published_events().await.is_empty());
    }
}

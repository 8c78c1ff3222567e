use crate::domain::event::InventoryEvent;
use crate::domain::port::{EventPublisher, PublisherError};
use crate::domain::serialization::EventSerializer;
use async_trait::async_trait;

/// コンソールイベント発行者
/// ドメインイベントをワイヤJSONにシリアライズしてコンソールに出力する。
/// 本番ではブローカーへのパブリッシュに差し替わる
pub struct ConsoleEventPublisher {
    serializer: EventSerializer,
}

impl ConsoleEventPublisher {
    /// 新しいコンソールイベント発行者を作成
    pub fn new() -> Self {
        Self {
            serializer: EventSerializer::new(),
        }
    }
}

impl Default for ConsoleEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for ConsoleEventPublisher {
    async fn publish(&self, event: InventoryEvent) -> Result<(), PublisherError> {
        let wire = self
            .serializer
            .serialize_event(&event)
            .map_err(|e| PublisherError::PublishingFailed(e.to_string()))?;

        match &event {
            InventoryEvent::InventoryItemsGranted(e) => {
                println!("🎁 [イベント] アイテム付与完了");
                println!("  相関ID: {}", e.correlation_id);
            }
            InventoryEvent::InventoryItemsSubtracted(e) => {
                println!("📤 [イベント] アイテム減算完了");
                println!("  相関ID: {}", e.correlation_id);
            }
            InventoryEvent::InventoryItemUpdated(e) => {
                println!("📦 [イベント] 在庫更新");
                println!("  プレイヤーID: {}", e.user_id);
                println!("  カタログアイテムID: {}", e.catalog_item_id);
                println!("  新しい合計数量: {}", e.new_total_quantity);
            }
        }
        println!("  {}", wire);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{
        InventoryItemUpdated, InventoryItemsGranted, InventoryItemsSubtracted,
    };
    use crate::domain::model::{CatalogItemId, UserId};
    use uuid::Uuid;

    #[tokio::test]
    async fn test_publish_granted_event() {
        let publisher = ConsoleEventPublisher::new();
        let event =
            InventoryEvent::InventoryItemsGranted(InventoryItemsGranted::new(Uuid::new_v4()));

        let result = publisher.publish(event).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_subtracted_event() {
        let publisher = ConsoleEventPublisher::new();
        let event =
            InventoryEvent::InventoryItemsSubtracted(InventoryItemsSubtracted::new(Uuid::new_v4()));

        let result = publisher.publish(event).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_publish_updated_event() {
        let publisher = ConsoleEventPublisher::new();
        let event = InventoryEvent::InventoryItemUpdated(InventoryItemUpdated::new(
            UserId::new(),
            CatalogItemId::new(),
            42,
        ));

        let result = publisher.publish(event).await;
        assert!(result.is_ok());
    }
}

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::command::{Delivery, GrantItems, SubtractItems};
use crate::domain::event::{
    InventoryEvent, InventoryItemUpdated, InventoryItemsGranted, InventoryItemsSubtracted,
};
use crate::domain::model::{CatalogItemId, InventoryItem};
use crate::domain::port::{CatalogItemRepository, EventPublisher, InventoryItemRepository, Logger};

/// コマンド消費エラー
/// トランスポートアダプターは is_retryable を見て再配送か破棄かを決める
#[derive(Debug, thiserror::Error)]
pub enum ConsumeError {
    /// カタログに存在しないアイテムを参照した
    /// 恒久的エラー。このコマンドは何度届けても成功しないため、再配送してはならない
    #[error("Unknown catalog item: {0}")]
    UnknownItem(CatalogItemId),
    /// ストア操作の一時的な失敗。トランスポートの再配送対象
    #[error("Repository error: {0}")]
    Repository(String),
    /// イベント発行の一時的な失敗。トランスポートの再配送対象
    #[error("Event publishing error: {0}")]
    Publish(String),
}

impl ConsumeError {
    /// トランスポートが再配送すべきエラーかどうか
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ConsumeError::UnknownItem(_))
    }
}

/// コマンドコンシューマートレイト
/// 特定のコマンドタイプを処理するコンシューマーを定義
#[async_trait]
pub trait CommandConsumer<C>: Send + Sync {
    async fn consume(&self, delivery: Delivery<C>) -> Result<(), ConsumeError>;
}

/// 付与コンシューマー
/// GrantItemsコマンドを受信して保有数量を冪等に増やす
///
/// 重複排除はレコード自身が持つ配送ID台帳で行う。同一 DeliveryId の
/// 再配送は数量を変更せず、終端応答イベントのみを再送する。
/// 異なるコマンド同士が同一レコードへ並行に read-modify-write する
/// 競合窓（lost update）はこの設計では塞いでいない（last-writer-wins）。
pub struct GrantItemsConsumer {
    inventory_repository: Arc<dyn InventoryItemRepository>,
    catalog_repository: Arc<dyn CatalogItemRepository>,
    publisher: Arc<dyn EventPublisher>,
    logger: Arc<dyn Logger>,
}

impl GrantItemsConsumer {
    /// 新しい付与コンシューマーを作成
    pub fn new(
        inventory_repository: Arc<dyn InventoryItemRepository>,
        catalog_repository: Arc<dyn CatalogItemRepository>,
        publisher: Arc<dyn EventPublisher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            inventory_repository,
            catalog_repository,
            publisher,
            logger,
        }
    }
}

#[async_trait]
impl CommandConsumer<GrantItems> for GrantItemsConsumer {
    async fn consume(&self, delivery: Delivery<GrantItems>) -> Result<(), ConsumeError> {
        let delivery_id = delivery.delivery_id;
        let command = delivery.command;

        // 受信ログ
        let mut context = HashMap::new();
        context.insert("delivery_id".to_string(), delivery_id.to_string());
        context.insert("quantity".to_string(), command.quantity.to_string());
        self.logger.info(
            "GrantItemsConsumer",
            &format!(
                "Received grant request of {} item {} from user {}",
                command.quantity, command.catalog_item_id, command.user_id
            ),
            Some(command.correlation_id),
            Some(context),
        );

        let start_time = std::time::Instant::now();

        // カタログ存在チェック
        let catalog_item = self
            .catalog_repository
            .find_by_id(command.catalog_item_id)
            .await
            .map_err(|e| ConsumeError::Repository(format!("カタログ取得エラー: {}", e)))?;

        if catalog_item.is_none() {
            let mut context = HashMap::new();
            context.insert(
                "catalog_item_id".to_string(),
                command.catalog_item_id.to_string(),
            );
            self.logger.error(
                "GrantItemsConsumer",
                "Catalog item does not exist, rejecting command permanently",
                Some(command.correlation_id),
                Some(context),
            );
            return Err(ConsumeError::UnknownItem(command.catalog_item_id));
        }

        // 在庫レコードを取得し、なければ作成・あれば加算する
        let item = match self
            .inventory_repository
            .find_by_user_and_item(command.user_id, command.catalog_item_id)
            .await
            .map_err(|e| ConsumeError::Repository(format!("在庫取得エラー: {}", e)))?
        {
            None => {
                let mut item =
                    InventoryItem::new(command.user_id, command.catalog_item_id, command.quantity);
                item.mark_delivery_processed(delivery_id);

                self.inventory_repository
                    .create(&item)
                    .await
                    .map_err(|e| ConsumeError::Repository(format!("在庫作成エラー: {}", e)))?;
                item
            }
            Some(mut item) => {
                // 冪等性チェック: この配送が既に適用済みかどうか
                if item.has_processed(delivery_id) {
                    let mut context = HashMap::new();
                    context.insert("delivery_id".to_string(), delivery_id.to_string());
                    context.insert("already_processed".to_string(), "true".to_string());
                    self.logger.debug(
                        "GrantItemsConsumer",
                        "Idempotency check: delivery already applied, re-emitting ack only",
                        Some(command.correlation_id),
                        Some(context),
                    );

                    // 再配送では変更を適用せず、終端応答だけを再送する
                    self.publisher
                        .publish(InventoryEvent::InventoryItemsGranted(
                            InventoryItemsGranted::new(command.correlation_id),
                        ))
                        .await
                        .map_err(|e| ConsumeError::Publish(format!("イベント発行エラー: {}", e)))?;
                    return Ok(());
                }

                item.grant(command.quantity, delivery_id);
                self.inventory_repository
                    .update(&item)
                    .await
                    .map_err(|e| ConsumeError::Repository(format!("在庫保存エラー: {}", e)))?;
                item
            }
        };

        // 状態の永続化が済めば二つの終端イベントは互いに独立なので、並行して発行する
        let granted = self.publisher.publish(InventoryEvent::InventoryItemsGranted(
            InventoryItemsGranted::new(command.correlation_id),
        ));
        let updated = self.publisher.publish(InventoryEvent::InventoryItemUpdated(
            InventoryItemUpdated::new(item.user_id(), item.catalog_item_id(), item.quantity()),
        ));
        let (granted, updated) = tokio::join!(granted, updated);
        granted.map_err(|e| ConsumeError::Publish(format!("イベント発行エラー: {}", e)))?;
        updated.map_err(|e| ConsumeError::Publish(format!("イベント発行エラー: {}", e)))?;

        // 処理成功ログ
        let mut context = HashMap::new();
        context.insert("new_total_quantity".to_string(), item.quantity().to_string());
        context.insert(
            "execution_time_ms".to_string(),
            start_time.elapsed().as_millis().to_string(),
        );
        self.logger.info(
            "GrantItemsConsumer",
            "GrantItems command processed successfully",
            Some(command.correlation_id),
            Some(context),
        );

        Ok(())
    }
}

/// 減算コンシューマー
/// SubtractItemsコマンドを受信して保有数量を冪等に減らす
///
/// 付与と対称だが、意図的な非対称が一つある。レコードが存在しない場合、
/// 付与されたことのない在庫からは減算できないため何もしない（負のレコードを
/// でっち上げない）。それでも終端応答は発行し、待機中の呼び出し側を解放する。
pub struct SubtractItemsConsumer {
    inventory_repository: Arc<dyn InventoryItemRepository>,
    catalog_repository: Arc<dyn CatalogItemRepository>,
    publisher: Arc<dyn EventPublisher>,
    logger: Arc<dyn Logger>,
}

impl SubtractItemsConsumer {
    /// 新しい減算コンシューマーを作成
    pub fn new(
        inventory_repository: Arc<dyn InventoryItemRepository>,
        catalog_repository: Arc<dyn CatalogItemRepository>,
        publisher: Arc<dyn EventPublisher>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            inventory_repository,
            catalog_repository,
            publisher,
            logger,
        }
    }
}

#[async_trait]
impl CommandConsumer<SubtractItems> for SubtractItemsConsumer {
    async fn consume(&self, delivery: Delivery<SubtractItems>) -> Result<(), ConsumeError> {
        let delivery_id = delivery.delivery_id;
        let command = delivery.command;

        // 受信ログ
        let mut context = HashMap::new();
        context.insert("delivery_id".to_string(), delivery_id.to_string());
        context.insert("quantity".to_string(), command.quantity.to_string());
        self.logger.info(
            "SubtractItemsConsumer",
            &format!(
                "Received subtract request of {} item {} from user {}",
                command.quantity, command.catalog_item_id, command.user_id
            ),
            Some(command.correlation_id),
            Some(context),
        );

        // カタログ存在チェック
        let catalog_item = self
            .catalog_repository
            .find_by_id(command.catalog_item_id)
            .await
            .map_err(|e| ConsumeError::Repository(format!("カタログ取得エラー: {}", e)))?;

        if catalog_item.is_none() {
            let mut context = HashMap::new();
            context.insert(
                "catalog_item_id".to_string(),
                command.catalog_item_id.to_string(),
            );
            self.logger.error(
                "SubtractItemsConsumer",
                "Catalog item does not exist, rejecting command permanently",
                Some(command.correlation_id),
                Some(context),
            );
            return Err(ConsumeError::UnknownItem(command.catalog_item_id));
        }

        let existing = self
            .inventory_repository
            .find_by_user_and_item(command.user_id, command.catalog_item_id)
            .await
            .map_err(|e| ConsumeError::Repository(format!("在庫取得エラー: {}", e)))?;

        if let Some(mut item) = existing {
            // 冪等性チェック: この配送が既に適用済みかどうか
            if item.has_processed(delivery_id) {
                let mut context = HashMap::new();
                context.insert("delivery_id".to_string(), delivery_id.to_string());
                context.insert("already_processed".to_string(), "true".to_string());
                self.logger.debug(
                    "SubtractItemsConsumer",
                    "Idempotency check: delivery already applied, re-emitting ack only",
                    Some(command.correlation_id),
                    Some(context),
                );

                self.publisher
                    .publish(InventoryEvent::InventoryItemsSubtracted(
                        InventoryItemsSubtracted::new(command.correlation_id),
                    ))
                    .await
                    .map_err(|e| ConsumeError::Publish(format!("イベント発行エラー: {}", e)))?;
                return Ok(());
            }

            // 数量に下限はない。負になってもそのまま永続化し、通知する
            item.subtract(command.quantity, delivery_id);
            self.inventory_repository
                .update(&item)
                .await
                .map_err(|e| ConsumeError::Repository(format!("在庫保存エラー: {}", e)))?;

            self.publisher
                .publish(InventoryEvent::InventoryItemUpdated(
                    InventoryItemUpdated::new(
                        item.user_id(),
                        item.catalog_item_id(),
                        item.quantity(),
                    ),
                ))
                .await
                .map_err(|e| ConsumeError::Publish(format!("イベント発行エラー: {}", e)))?;
        } else {
            let mut context = HashMap::new();
            context.insert(
                "catalog_item_id".to_string(),
                command.catalog_item_id.to_string(),
            );
            self.logger.debug(
                "SubtractItemsConsumer",
                "No inventory record for this user and item, nothing to subtract",
                Some(command.correlation_id),
                Some(context),
            );
        }

        // レコードの有無にかかわらず終端応答を発行する
        self.publisher
            .publish(InventoryEvent::InventoryItemsSubtracted(
                InventoryItemsSubtracted::new(command.correlation_id),
            ))
            .await
            .map_err(|e| ConsumeError::Publish(format!("イベント発行エラー: {}", e)))?;

        Ok(())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::model::{CatalogItemId, UserId};

/// ドメインイベント列挙型
/// 在庫の変化と終端応答を下流に通知する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InventoryEvent {
    /// 付与コマンドの終端応答
    InventoryItemsGranted(InventoryItemsGranted),
    /// 減算コマンドの終端応答
    InventoryItemsSubtracted(InventoryItemsSubtracted),
    /// 保有数量が変化した
    InventoryItemUpdated(InventoryItemUpdated),
}

impl InventoryEvent {
    /// イベント種別名を取得
    pub fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::InventoryItemsGranted(_) => "InventoryItemsGranted",
            InventoryEvent::InventoryItemsSubtracted(_) => "InventoryItemsSubtracted",
            InventoryEvent::InventoryItemUpdated(_) => "InventoryItemUpdated",
        }
    }
}

/// アイテム付与完了イベント
/// 待機中の呼び出し側を CorrelationId で解放する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemsGranted {
    pub correlation_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl InventoryItemsGranted {
    /// 新しい付与完了イベントを作成
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            occurred_at: Utc::now(),
        }
    }
}

/// アイテム減算完了イベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemsSubtracted {
    pub correlation_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

impl InventoryItemsSubtracted {
    /// 新しい減算完了イベントを作成
    pub fn new(correlation_id: Uuid) -> Self {
        Self {
            correlation_id,
            occurred_at: Utc::now(),
        }
    }
}

/// 在庫更新イベント
/// 変化後の合計数量を通知する
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemUpdated {
    pub user_id: UserId,
    pub catalog_item_id: CatalogItemId,
    pub new_total_quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

impl InventoryItemUpdated {
    /// 新しい在庫更新イベントを作成
    pub fn new(user_id: UserId, catalog_item_id: CatalogItemId, new_total_quantity: i64) -> Self {
        Self {
            user_id,
            catalog_item_id,
            new_total_quantity,
            occurred_at: Utc::now(),
        }
    }
}

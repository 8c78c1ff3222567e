use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::model::{CatalogItemId, DeliveryId, UserId};

// CorrelationId は一つの論理トランザクションに属するコマンドと
// その終端応答イベントを下流の観測者が結び付けるためのもの。
// この層の重複排除には使わない（それは DeliveryId の仕事）。

/// アイテム付与コマンド
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantItems {
    pub user_id: UserId,
    pub catalog_item_id: CatalogItemId,
    pub quantity: i64,
    pub correlation_id: Uuid,
}

impl GrantItems {
    /// 新しい付与コマンドを作成
    pub fn new(
        user_id: UserId,
        catalog_item_id: CatalogItemId,
        quantity: i64,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            user_id,
            catalog_item_id,
            quantity,
            correlation_id,
        }
    }
}

/// アイテム減算コマンド
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtractItems {
    pub user_id: UserId,
    pub catalog_item_id: CatalogItemId,
    pub quantity: i64,
    pub correlation_id: Uuid,
}

impl SubtractItems {
    /// 新しい減算コマンドを作成
    pub fn new(
        user_id: UserId,
        catalog_item_id: CatalogItemId,
        quantity: i64,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            user_id,
            catalog_item_id,
            quantity,
            correlation_id,
        }
    }
}

/// 配送エンベロープ
/// トランスポートが個々の配送に割り当てる DeliveryId でコマンドを包む。
/// 同一コマンドの再配送は同じ DeliveryId を保持したまま届く
#[derive(Debug, Clone)]
pub struct Delivery<C> {
    pub delivery_id: DeliveryId,
    pub command: C,
}

impl<C> Delivery<C> {
    /// 新しい配送エンベロープを作成
    pub fn new(delivery_id: DeliveryId, command: C) -> Self {
        Self {
            delivery_id,
            command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grant_items_serialization_round_trip() {
        let command = GrantItems::new(UserId::new(), CatalogItemId::new(), 5, Uuid::new_v4());
        let json = serde_json::to_string(&command).unwrap();
        let deserialized: GrantItems = serde_json::from_str(&json).unwrap();
        assert_eq!(command, deserialized);
    }

    #[test]
    fn test_delivery_wraps_command_with_delivery_id() {
        let delivery_id = DeliveryId::new();
        let command = SubtractItems::new(UserId::new(), CatalogItemId::new(), 2, Uuid::new_v4());
        let delivery = Delivery::new(delivery_id, command.clone());
        assert_eq!(delivery.delivery_id, delivery_id);
        assert_eq!(delivery.command, command);
    }
}

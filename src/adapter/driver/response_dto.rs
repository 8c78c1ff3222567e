use crate::application::service::UserInventoryEntry;
use serde::Serialize;

/// 在庫エントリ用のレスポンスDTO
/// 在庫レコードにカタログの名前と説明を結合したもの
#[derive(Serialize)]
pub struct InventoryItemResponse {
    pub catalog_item_id: String,
    pub name: String,
    pub description: String,
    pub quantity: i64,
    pub acquired_date: String,
}

/// 直接付与用のレスポンスDTO
#[derive(Serialize)]
pub struct GrantItemsResponse {
    pub user_id: String,
    pub catalog_item_id: String,
    pub new_total_quantity: i64,
}

/// カタログアイテム登録用のレスポンスDTO
#[derive(Serialize)]
pub struct CreateCatalogItemResponse {
    pub id: String,
}

impl InventoryItemResponse {
    /// 読み取りモデルからInventoryItemResponseを作成
    pub fn from_entry(entry: &UserInventoryEntry) -> Self {
        Self {
            catalog_item_id: entry.item.catalog_item_id().to_string(),
            name: entry.catalog_item.name().to_string(),
            description: entry.catalog_item.description().to_string(),
            quantity: entry.item.quantity(),
            acquired_date: entry.item.acquired_date().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CatalogItem, CatalogItemId, InventoryItem, UserId};

    #[test]
    fn test_inventory_item_response_from_entry() {
        let user_id = UserId::new();
        let catalog_item_id = CatalogItemId::new();
        let entry = UserInventoryEntry {
            item: InventoryItem::new(user_id, catalog_item_id, 7),
            catalog_item: CatalogItem::new(
                catalog_item_id,
                "ポーション".to_string(),
                "HPを50回復する".to_string(),
            ),
        };

        let response = InventoryItemResponse::from_entry(&entry);

        assert_eq!(response.catalog_item_id, catalog_item_id.to_string());
        assert_eq!(response.name, "ポーション");
        assert_eq!(response.description, "HPを50回復する");
        assert_eq!(response.quantity, 7);
        assert!(!response.acquired_date.is_empty());
    }

    #[test]
    fn test_inventory_item_response_serialization() {
        let catalog_item_id = CatalogItemId::new();
        let entry = UserInventoryEntry {
            item: InventoryItem::new(UserId::new(), catalog_item_id, -2),
            catalog_item: CatalogItem::new(catalog_item_id, "矢".to_string(), String::new()),
        };

        let response = InventoryItemResponse::from_entry(&entry);
        let json = serde_json::to_string(&response).unwrap();

        // 負の数量もそのまま返る
        assert!(json.contains("-2"));
        assert!(json.contains("quantity"));
    }
}

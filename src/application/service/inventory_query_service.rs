use crate::application::ApplicationError;
use crate::domain::model::{CatalogItem, CatalogItemId, InventoryItem, UserId};
use crate::domain::port::{CatalogItemRepository, InventoryItemRepository};
use std::collections::HashMap;
use std::sync::Arc;

/// プレイヤー在庫の読み取りモデル
/// 在庫レコードと対応するカタログ情報の組
#[derive(Debug, Clone)]
pub struct UserInventoryEntry {
    pub item: InventoryItem,
    pub catalog_item: CatalogItem,
}

/// 在庫クエリサービス
/// 読み取り専用の在庫操作を提供する
pub struct InventoryQueryService {
    inventory_repository: Arc<dyn InventoryItemRepository>,
    catalog_repository: Arc<dyn CatalogItemRepository>,
}

impl InventoryQueryService {
    /// 新しい在庫クエリサービスを作成
    ///
    /// # Arguments
    /// * `inventory_repository` - 在庫リポジトリ
    /// * `catalog_repository` - カタログリポジトリ
    pub fn new(
        inventory_repository: Arc<dyn InventoryItemRepository>,
        catalog_repository: Arc<dyn CatalogItemRepository>,
    ) -> Self {
        Self {
            inventory_repository,
            catalog_repository,
        }
    }

    /// 指定されたプレイヤーの在庫一覧をカタログ情報と結合して取得
    ///
    /// # Returns
    /// * `Ok(Vec<UserInventoryEntry>)` - 在庫エントリのリスト
    /// * `Err(ApplicationError::NotFound)` - 在庫が参照するカタログアイテムが存在しない
    /// * `Err(ApplicationError)` - 取得失敗
    pub async fn get_user_inventory(
        &self,
        user_id: UserId,
    ) -> Result<Vec<UserInventoryEntry>, ApplicationError> {
        let items = self.inventory_repository.find_all_by_user(user_id).await?;

        let ids: Vec<CatalogItemId> = items.iter().map(|item| item.catalog_item_id()).collect();
        let catalog_items = self.catalog_repository.find_by_ids(&ids).await?;
        let catalog_map: HashMap<CatalogItemId, CatalogItem> = catalog_items
            .into_iter()
            .map(|catalog_item| (catalog_item.id(), catalog_item))
            .collect();

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let catalog_item = catalog_map.get(&item.catalog_item_id()).ok_or_else(|| {
                ApplicationError::NotFound(format!(
                    "カタログアイテムが見つかりません: {}",
                    item.catalog_item_id()
                ))
            })?;
            entries.push(UserInventoryEntry {
                catalog_item: catalog_item.clone(),
                item,
            });
        }

        Ok(entries)
    }
}

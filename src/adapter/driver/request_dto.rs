use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 直接付与用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct GrantItemsRequest {
    pub user_id: Uuid,
    pub catalog_item_id: Uuid,
    pub quantity: i64,
}

/// カタログアイテム登録用のリクエストDTO
#[derive(Serialize, Deserialize)]
pub struct CreateCatalogItemRequest {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: String,
}

/// コマンド投入用のリクエストDTO
/// ブローカー経由で届くコマンドと同じ形。correlation_id を省略した場合は採番される
#[derive(Serialize, Deserialize)]
pub struct InventoryCommandRequest {
    pub user_id: Uuid,
    pub catalog_item_id: Uuid,
    pub quantity: i64,
    pub correlation_id: Option<Uuid>,
}

/// 在庫一覧取得用のクエリパラメータ
#[derive(Deserialize)]
pub struct ItemsQueryParams {
    pub user_id: Uuid,
}

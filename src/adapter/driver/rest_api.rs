use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::adapter::driven::{
    BusError, InMemoryMessageBus, MySqlCatalogItemRepository, MySqlInventoryItemRepository,
};
use crate::adapter::driver::request_dto::{
    CreateCatalogItemRequest, GrantItemsRequest, InventoryCommandRequest, ItemsQueryParams,
};
use crate::adapter::driver::response_dto::{
    CreateCatalogItemResponse, GrantItemsResponse, InventoryItemResponse,
};
use crate::application::service::{InventoryApplicationService, InventoryQueryService};
use crate::application::ApplicationError;
use crate::domain::command::{GrantItems, SubtractItems};
use crate::domain::model::{CatalogItem, CatalogItemId, UserId};
use crate::domain::port::CatalogItemRepository;

// REST API用のエラーDTO
#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

// アプリケーションサービスを含む状態
pub type AppState = AppStateInner;

#[derive(Clone)]
pub struct AppStateInner {
    pub inventory_service: Arc<InventoryApplicationService<MySqlInventoryItemRepository>>,
    pub inventory_query_service: Arc<InventoryQueryService>,
    pub catalog_repository: Arc<MySqlCatalogItemRepository>,
    pub message_bus: Arc<InMemoryMessageBus>,
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/items", get(get_items))
        .route("/items", post(grant_items))
        .route("/catalog-items", post(create_catalog_item))
        // ブローカーの代替としてコマンドをバスに投入するエンドポイント
        .route("/commands/grant-items", post(dispatch_grant_command))
        .route("/commands/subtract-items", post(dispatch_subtract_command))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "player-inventory-management",
        "version": "0.1.0"
    }))
}

// プレイヤー在庫一覧取得エンドポイント
async fn get_items(
    State(state): State<AppState>,
    query: Result<Query<ItemsQueryParams>, axum::extract::rejection::QueryRejection>,
) -> Result<Json<Vec<InventoryItemResponse>>, (StatusCode, Json<ApiError>)> {
    let Query(params) = query.map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "無効なクエリパラメータです".to_string(),
                code: "INVALID_PARAMETER".to_string(),
            }),
        )
    })?;

    if params.user_id.is_nil() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "user_idが指定されていません".to_string(),
                code: "INVALID_USER_ID".to_string(),
            }),
        ));
    }

    let user_id = UserId::from_uuid(params.user_id);
    match state.inventory_query_service.get_user_inventory(user_id).await {
        Ok(entries) => {
            let response: Vec<InventoryItemResponse> = entries
                .iter()
                .map(InventoryItemResponse::from_entry)
                .collect();
            Ok(Json(response))
        }
        Err(err) => Err(map_application_error(err)),
    }
}

// 直接付与エンドポイント
// 重複排除を経由しない特権パス。再送信は二重加算になる
async fn grant_items(
    State(state): State<AppState>,
    Json(request): Json<GrantItemsRequest>,
) -> Result<Json<GrantItemsResponse>, (StatusCode, Json<ApiError>)> {
    let user_id = UserId::from_uuid(request.user_id);
    let catalog_item_id = CatalogItemId::from_uuid(request.catalog_item_id);

    match state
        .inventory_service
        .grant_items(user_id, catalog_item_id, request.quantity)
        .await
    {
        Ok(new_total_quantity) => Ok(Json(GrantItemsResponse {
            user_id: user_id.to_string(),
            catalog_item_id: catalog_item_id.to_string(),
            new_total_quantity,
        })),
        Err(err) => Err(map_application_error(err)),
    }
}

// カタログアイテム登録エンドポイント（テスト用）
async fn create_catalog_item(
    State(state): State<AppState>,
    Json(request): Json<CreateCatalogItemRequest>,
) -> Result<(StatusCode, Json<CreateCatalogItemResponse>), (StatusCode, Json<ApiError>)> {
    let id = request
        .id
        .map(CatalogItemId::from_uuid)
        .unwrap_or_else(CatalogItemId::new);
    let catalog_item = CatalogItem::new(id, request.name, request.description);

    // カタログリポジトリに直接保存（本来はカタログサービスのイベントで同期される）
    match state.catalog_repository.save(&catalog_item).await {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(CreateCatalogItemResponse { id: id.to_string() }),
        )),
        Err(err) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: format!("{}", err),
                code: "REPOSITORY_ERROR".to_string(),
            }),
        )),
    }
}

// 付与コマンド投入エンドポイント（ブローカーの代替、テスト用）
async fn dispatch_grant_command(
    State(state): State<AppState>,
    Json(request): Json<InventoryCommandRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let command = GrantItems::new(
        UserId::from_uuid(request.user_id),
        CatalogItemId::from_uuid(request.catalog_item_id),
        request.quantity,
        request.correlation_id.unwrap_or_else(Uuid::new_v4),
    );

    match state.message_bus.dispatch_grant(command).await {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(err) => Err(map_bus_error(err)),
    }
}

// 減算コマンド投入エンドポイント（ブローカーの代替、テスト用）
async fn dispatch_subtract_command(
    State(state): State<AppState>,
    Json(request): Json<InventoryCommandRequest>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    let command = SubtractItems::new(
        UserId::from_uuid(request.user_id),
        CatalogItemId::from_uuid(request.catalog_item_id),
        request.quantity,
        request.correlation_id.unwrap_or_else(Uuid::new_v4),
    );

    match state.message_bus.dispatch_subtract(command).await {
        Ok(()) => Ok(StatusCode::ACCEPTED),
        Err(err) => Err(map_bus_error(err)),
    }
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(repo_err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: format!("{}", repo_err),
                code: "REPOSITORY_ERROR".to_string(),
            }),
        ),
        ApplicationError::EventPublishingFailed(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: msg,
                code: "PUBLISHER_ERROR".to_string(),
            }),
        ),
        ApplicationError::NotFound(msg) => (
            StatusCode::NOT_FOUND,
            Json(ApiError {
                error: msg,
                code: "NOT_FOUND".to_string(),
            }),
        ),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: crate::domain::error::DomainError) -> (StatusCode, Json<ApiError>) {
    use crate::domain::error::DomainError;

    match domain_err {
        DomainError::InvalidQuantity => (
            StatusCode::BAD_REQUEST,
            Json(ApiError {
                error: "無効な数量です".to_string(),
                code: "INVALID_QUANTITY".to_string(),
            }),
        ),
    }
}

// メッセージバスエラーをHTTPエラーにマッピング
fn map_bus_error(err: BusError) -> (StatusCode, Json<ApiError>) {
    match err {
        BusError::NoConsumerRegistered(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: msg,
                code: "BUS_NOT_READY".to_string(),
            }),
        ),
        BusError::DeliveryFailed(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiError {
                error: msg,
                code: "DELIVERY_FAILED".to_string(),
            }),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::DomainError;
    use crate::domain::port::RepositoryError;

    #[test]
    fn test_map_application_error_not_found() {
        let app_error = ApplicationError::NotFound("リソースが見つかりません".to_string());
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, "NOT_FOUND");
        assert_eq!(api_error.error, "リソースが見つかりません");
    }

    #[test]
    fn test_map_application_error_invalid_quantity() {
        let app_error = ApplicationError::DomainError(DomainError::InvalidQuantity);
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(api_error.code, "INVALID_QUANTITY");
    }

    #[test]
    fn test_map_application_error_repository() {
        let app_error = ApplicationError::RepositoryError(RepositoryError::OperationFailed(
            "boom".to_string(),
        ));
        let (status, Json(api_error)) = map_application_error(app_error);

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, "REPOSITORY_ERROR");
    }

    #[test]
    fn test_map_bus_error_delivery_failed() {
        let (status, Json(api_error)) =
            map_bus_error(BusError::DeliveryFailed("Unknown catalog item".to_string()));

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.code, "DELIVERY_FAILED");
    }

    #[test]
    fn test_api_error_structure() {
        let api_error = ApiError {
            error: "テストエラー".to_string(),
            code: "TEST_ERROR".to_string(),
        };

        // JSON シリアライゼーションのテスト
        let json = serde_json::to_string(&api_error).unwrap();
        assert!(json.contains("テストエラー"));
        assert!(json.contains("TEST_ERROR"));

        // JSON デシリアライゼーションのテスト
        let deserialized: ApiError = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.error, "テストエラー");
        assert_eq!(deserialized.code, "TEST_ERROR");
    }
}

use axum::{
    extract::{Extension, Json, Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    AppState,
    cache::{self, keys::item_keys},
    error::AppError,
    routes::user::model::User,
};

use super::model::{CreateItemRequest, Item, UpdateItemRequest};

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
    pub title: Option<String>,
}

#[axum::debug_handler]
pub async fn list_items(
    Extension(_current_user): Extension<User>,
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<Vec<Item>>, AppError> {
    let skip = query.skip.unwrap_or(0).max(0);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let items = Item::list(&state.pool, skip, limit, query.title.as_deref()).await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn create_item(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    let item = Item::create(&state.pool, req, current_user.id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[axum::debug_handler]
pub async fn get_item(
    Extension(_current_user): Extension<User>,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<Json<Item>, AppError> {
    // 读穿缓存：命中时不访问数据库，未命中时加载并以配置的TTL写入；
    // 数据库中不存在的物品不会被缓存
    let item = cache::get_or_load(
        &state.redis,
        &item_keys::item_key(item_id),
        state.config.item_cache_ttl_secs,
        || Item::find_by_id(&state.pool, item_id),
    )
    .await?;

    item.map(Json).ok_or(AppError::NotFound("Item not found"))
}

#[axum::debug_handler]
pub async fn update_item(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<Item>, AppError> {
    let item = Item::find_by_id(&state.pool, item_id)
        .await?
        .ok_or(AppError::NotFound("Item not found"))?;

    if item.owner_id != current_user.id {
        return Err(AppError::Forbidden);
    }

    let updated = Item::update(&state.pool, item_id, &req)
        .await?
        .ok_or(AppError::NotFound("Item not found"))?;

    // 提交成功后、返回响应前使缓存失效，后续读取只会看到已提交的状态
    cache::invalidate(&state.redis, &item_keys::item_key(item_id)).await?;

    Ok(Json(updated))
}

#[axum::debug_handler]
pub async fn delete_item(
    Extension(current_user): Extension<User>,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let item = Item::find_by_id(&state.pool, item_id)
        .await?
        .ok_or(AppError::NotFound("Item not found"))?;

    if item.owner_id != current_user.id {
        return Err(AppError::Forbidden);
    }

    Item::delete(&state.pool, item_id).await?;

    // 删除同样在提交后失效缓存
    cache::invalidate(&state.redis, &item_keys::item_key(item_id)).await?;

    Ok(StatusCode::NO_CONTENT)
}

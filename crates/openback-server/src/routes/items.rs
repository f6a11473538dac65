use actix_web::{web, HttpResponse};

use crate::error::ApiError;
use crate::items::ItemInput;
use crate::state::AppState;

fn validated_name(input: ItemInput) -> Result<String, ApiError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidBody("name must not be empty".to_string()));
    }
    Ok(name.to_string())
}

/// GET /items
pub async fn list_items(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(state.items.list().await)
}

/// GET /items/{id}
pub async fn get_item(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let item = state.items.get(id).await.ok_or(ApiError::ItemNotFound(id))?;
    Ok(HttpResponse::Ok().json(item))
}

/// POST /items
pub async fn create_item(
    body: web::Json<ItemInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let name = validated_name(body.into_inner())?;
    let item = state.items.create(name).await;
    tracing::debug!(id = item.id, "item created");
    Ok(HttpResponse::Created().json(item))
}

/// PUT /items/{id}
pub async fn update_item(
    path: web::Path<u64>,
    body: web::Json<ItemInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let name = validated_name(body.into_inner())?;
    let item = state
        .items
        .update(id, name)
        .await
        .ok_or(ApiError::ItemNotFound(id))?;
    Ok(HttpResponse::Ok().json(item))
}

/// DELETE /items/{id}
pub async fn delete_item(
    path: web::Path<u64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    if !state.items.delete(id).await {
        return Err(ApiError::ItemNotFound(id));
    }
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/items")
            .route(web::get().to(list_items))
            .route(web::post().to(create_item)),
    )
    .service(
        web::resource("/items/{id}")
            .route(web::get().to(get_item))
            .route(web::put().to(update_item))
            .route(web::delete().to(delete_item)),
    );
}

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bookshelf_http::{AppError, ValidJson, ValidPath, ValidQuery};
use uuid::Uuid;

use super::models::{CreateGenre, Genre, GenreSort, UpdateGenre};
use super::service::GenreService;
use crate::query::{ListParams, ListQuery, Page};

pub fn router(service: GenreService) -> Router {
    Router::new()
        .route("/genres", get(list_genres).post(create_genre))
        .route("/genres/", get(list_genres).post(create_genre))
        .route(
            "/genres/{id}",
            get(get_genre).patch(update_genre).delete(delete_genre),
        )
        .with_state(service)
}

async fn create_genre(
    State(service): State<GenreService>,
    ValidJson(payload): ValidJson<CreateGenre>,
) -> Result<(StatusCode, Json<Genre>), AppError> {
    let name = payload.validate()?;
    let genre = service.create(name).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

async fn list_genres(
    State(service): State<GenreService>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Page<Genre>>, AppError> {
    let query: ListQuery<GenreSort> = params.validate()?;
    Ok(Json(service.list(&query).await?))
}

async fn get_genre(
    State(service): State<GenreService>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Genre>, AppError> {
    Ok(Json(service.get(id).await?))
}

async fn update_genre(
    State(service): State<GenreService>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateGenre>,
) -> Result<Json<Genre>, AppError> {
    let name = payload.validate()?;
    Ok(Json(service.update(id, name).await?))
}

async fn delete_genre(
    State(service): State<GenreService>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

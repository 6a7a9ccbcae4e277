use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bookshelf_http::{AppError, ValidJson, ValidPath, ValidQuery};
use uuid::Uuid;

use super::models::{Book, BookSort, CreateBook, UpdateBook};
use super::service::BookService;
use crate::query::{ListParams, ListQuery, Page};

pub fn router(service: BookService) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/", get(list_books).post(create_book))
        .route(
            "/books/{id}",
            get(get_book).patch(update_book).delete(delete_book),
        )
        .with_state(service)
}

async fn create_book(
    State(service): State<BookService>,
    ValidJson(payload): ValidJson<CreateBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    let new = payload.validate()?;
    let book = service.create(new).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn list_books(
    State(service): State<BookService>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Page<Book>>, AppError> {
    let query: ListQuery<BookSort> = params.validate()?;
    Ok(Json(service.list(&query).await?))
}

async fn get_book(
    State(service): State<BookService>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Book>, AppError> {
    Ok(Json(service.get(id).await?))
}

async fn update_book(
    State(service): State<BookService>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateBook>,
) -> Result<Json<Book>, AppError> {
    let changes = payload.validate()?;
    Ok(Json(service.update(id, changes).await?))
}

async fn delete_book(
    State(service): State<BookService>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

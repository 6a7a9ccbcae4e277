use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use bookshelf_http::{AppError, ValidJson, ValidPath, ValidQuery};
use uuid::Uuid;

use super::models::{Contributor, ContributorSort, CreateContributor, UpdateContributor};
use super::service::ContributorService;
use crate::query::{ListParams, ListQuery, Page};

pub fn router(service: ContributorService) -> Router {
    Router::new()
        .route("/contributors", get(list_contributors).post(create_contributor))
        .route("/contributors/", get(list_contributors).post(create_contributor))
        .route(
            "/contributors/{id}",
            get(get_contributor)
                .patch(update_contributor)
                .delete(delete_contributor),
        )
        .with_state(service)
}

async fn create_contributor(
    State(service): State<ContributorService>,
    ValidJson(payload): ValidJson<CreateContributor>,
) -> Result<(StatusCode, Json<Contributor>), AppError> {
    let name = payload.validate()?;
    let contributor = service.create(name).await?;
    Ok((StatusCode::CREATED, Json(contributor)))
}

async fn list_contributors(
    State(service): State<ContributorService>,
    ValidQuery(params): ValidQuery<ListParams>,
) -> Result<Json<Page<Contributor>>, AppError> {
    let query: ListQuery<ContributorSort> = params.validate()?;
    Ok(Json(service.list(&query).await?))
}

async fn get_contributor(
    State(service): State<ContributorService>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<Json<Contributor>, AppError> {
    Ok(Json(service.get(id).await?))
}

async fn update_contributor(
    State(service): State<ContributorService>,
    ValidPath(id): ValidPath<Uuid>,
    ValidJson(payload): ValidJson<UpdateContributor>,
) -> Result<Json<Contributor>, AppError> {
    let name = payload.validate()?;
    Ok(Json(service.update(id, name).await?))
}

async fn delete_contributor(
    State(service): State<ContributorService>,
    ValidPath(id): ValidPath<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

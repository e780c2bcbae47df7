use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::response::Json;

use crate::error::AreasResult;
use crate::models::area::Area;
use crate::server::AppState;

/// GET / - names of areas whose occupancy is "available".
pub async fn available_areas(State(state): State<AppState>) -> AreasResult<Json<Vec<String>>> {
    let names = state.service.available_area_names().await?;
    Ok(Json(names))
}

/// GET /area/{area_id} - every record carrying that id.
pub async fn area(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> AreasResult<Json<Vec<Area>>> {
    let Path(area_id) = path?;
    tracing::debug!(area_id, "Area lookup");
    let rows = state.service.area(area_id).await?;
    Ok(Json(rows))
}

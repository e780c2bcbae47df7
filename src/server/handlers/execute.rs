use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Json;

use crate::error::AreasResult;
use crate::server::AppState;
use crate::services::{ExecuteRequest, ExecuteResponse};

pub async fn execute(
    State(state): State<AppState>,
    body: Result<Json<ExecuteRequest>, JsonRejection>,
) -> AreasResult<Json<ExecuteResponse>> {
    let Json(request) = body?;
    let response = state.service.execute(request).await?;
    Ok(Json(response))
}

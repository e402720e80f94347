use super::stock::HistoryParams;
use crate::error::Result;
use crate::types::{IndicatorBundle, IndicatorSeries};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

/// GET /api/analysis/:symbol
async fn get_analysis(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<IndicatorBundle>> {
    let bundle = state
        .market
        .analysis(&symbol, &params.period, &params.range)
        .await?;
    Ok(Json(bundle))
}

/// GET /api/analysis/:symbol/series
async fn get_series(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<IndicatorSeries>> {
    let series = state
        .market
        .overlays(&symbol, &params.period, &params.range)
        .await?;
    Ok(Json(series))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:symbol", get(get_analysis))
        .route("/:symbol/series", get(get_series))
}

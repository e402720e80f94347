use crate::error::Result;
use crate::types::{Cached, CompanyProfile, Quote, SearchResults, StockHistory};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Query for historical bars: `?period=1d&range=1mo`.
#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(default = "default_period")]
    pub period: String,
    #[serde(default = "default_range")]
    pub range: String,
}

fn default_period() -> String {
    "1d".to_string()
}

fn default_range() -> String {
    "1mo".to_string()
}

impl Default for HistoryParams {
    fn default() -> Self {
        Self {
            period: default_period(),
            range: default_range(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

/// GET /api/stock/:symbol
async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<Cached<StockHistory>>> {
    let history = state
        .market
        .history(&symbol, &params.period, &params.range)
        .await?;
    Ok(Json(history))
}

/// GET /api/quote/:symbol
async fn get_quote(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Cached<Quote>>> {
    Ok(Json(state.market.quote(&symbol).await?))
}

/// GET /api/company/:symbol
async fn get_company(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Cached<CompanyProfile>>> {
    Ok(Json(state.market.profile(&symbol).await?))
}

/// GET /api/search?q=
async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResults>> {
    Ok(Json(state.market.search(&params.q).await?))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stock/:symbol", get(get_stock))
        .route("/quote/:symbol", get(get_quote))
        .route("/company/:symbol", get(get_company))
        .route("/search", get(search))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_params_defaults() {
        let params: HistoryParams = serde_urlencoded::from_str("").unwrap();
        assert_eq!(params.period, "1d");
        assert_eq!(params.range, "1mo");
    }

    #[test]
    fn test_history_params_explicit() {
        let params: HistoryParams = serde_urlencoded::from_str("period=1wk&range=1y").unwrap();
        assert_eq!(params.period, "1wk");
        assert_eq!(params.range, "1y");
    }

    #[test]
    fn test_search_params_missing_query() {
        let params: SearchParams = serde_urlencoded::from_str("").unwrap();
        assert!(params.q.is_empty());
    }
}

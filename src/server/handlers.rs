use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{CardRecord, Error, Money};

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
}

pub async fn root(State(state): State<AppState>) -> Result<Json<RootResponse>, Error> {
    let volume = state.ledger.lock().await.summary()?.total_balance;
    let dashboard = &state.config.dashboard;
    Ok(Json(RootResponse {
        message: format!(
            "{} Live | Kiosks: {} | Volume: {}",
            dashboard.service_name, dashboard.kiosks, volume
        ),
    }))
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub kiosks: u64,
    pub volume: Money,
    pub cards: usize,
    pub dau: u64,
    pub status: String,
}

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, Error> {
    let stats = state.ledger.lock().await.summary()?;
    let dashboard = &state.config.dashboard;
    Ok(Json(DashboardResponse {
        kiosks: dashboard.kiosks,
        volume: stats.total_balance,
        cards: stats.cards,
        dau: dashboard.dau,
        status: dashboard.status.clone(),
    }))
}

pub async fn balance(
    State(state): State<AppState>,
    Path(pan): Path<String>,
) -> Result<Json<CardRecord>, Error> {
    let card = state.ledger.lock().await.get(&pan)?;
    Ok(Json(card))
}

#[derive(Debug, Deserialize)]
pub struct ReloadRequest {
    // Kept unrounded so sub-cent amounts are rejected, not rounded into range.
    #[serde(deserialize_with = "crate::domain::money::deserialize_exact")]
    pub amount: Decimal,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
}

fn default_source() -> String {
    "kiosk".to_string()
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub card: String,
    pub amount: Money,
    pub new_balance: Money,
    pub customer_id: Option<String>,
    pub source: String,
}

pub async fn reload(
    State(state): State<AppState>,
    Path(pan): Path<String>,
    payload: Result<Json<ReloadRequest>, JsonRejection>,
) -> Result<Json<ReloadResponse>, Error> {
    let Json(req) = payload.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;
    let card = state.ledger.lock().await.reload(&pan, req.amount)?;
    Ok(Json(ReloadResponse {
        status: "success",
        card: card.pan,
        amount: Money::new(req.amount),
        new_balance: card.balance,
        customer_id: req.customer_id,
        source: req.source,
    }))
}

#[derive(Debug, Serialize)]
pub struct CashLoadResponse {
    pub fee: Money,
    pub min_load: Money,
    pub max_load: Money,
}

pub async fn cash_load(State(state): State<AppState>) -> Json<CashLoadResponse> {
    let limits = state.config.limits;
    Json(CashLoadResponse {
        fee: state.config.fees.fee,
        min_load: limits.min_load,
        max_load: limits.max_load,
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

use axum::{ extract::{ rejection::{ JsonRejection, QueryRejection }, Query, State }, Json };
use serde::Serialize;

use crate::caller::Caller;
use crate::db::entity::settlement_payment;
use crate::error::Result;
use crate::services::settlement_reconciler::{ SettlementSummary, VendorSettlement };
use crate::services::settlement_service::{
    RecordPaymentRequest,
    SettlementFilters,
    SettlementQuery,
};

use super::{ json_body, query_params, ApiResponse, AppState };

#[derive(Debug, Serialize)]
pub struct SettlementsResponse {
    pub success: bool,
    pub data: Vec<VendorSettlement>,
    pub filters: SettlementFilters,
    pub summary: SettlementSummary,
}

pub async fn get_settlements(
    State(state): State<AppState>,
    caller: Caller,
    params: std::result::Result<Query<SettlementQuery>, QueryRejection>
) -> Result<Json<SettlementsResponse>> {
    let query = query_params(params)?;
    let report = state.settlement_service.get_settlements(&caller, query).await?;

    Ok(
        Json(SettlementsResponse {
            success: true,
            data: report.data,
            filters: report.filters,
            summary: report.summary,
        })
    )
}

pub async fn record_payment(
    State(state): State<AppState>,
    caller: Caller,
    payload: std::result::Result<Json<RecordPaymentRequest>, JsonRejection>
) -> Result<Json<ApiResponse<settlement_payment::Model>>> {
    let request = json_body(payload)?;
    let payment = state.settlement_service.record_payment(&caller, request).await?;

    Ok(ApiResponse::with_message("Settlement payment recorded successfully", payment))
}

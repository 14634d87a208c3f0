use chrono::{ DateTime, FixedOffset, Utc };
use sea_orm::DatabaseConnection;
use serde::{ Deserialize, Serialize };
use uuid::Uuid;
use validator::{ Validate, ValidationError };

use crate::caller::Caller;
use crate::db::entity::settlement_payment;
use crate::db::{ AccountRepository, NewSettlementPayment, SettlementRepository };
use crate::enums::{ SettlementDirection, SettlementPeriod, SettlementStatus };
use crate::error::{ AppError, Result };
use crate::services::period::SettlementWindow;
use crate::services::settlement_reconciler::{ self, SettlementSummary, VendorSettlement };
use crate::services::withdrawal_policy::{ format_rupees, parse_money, AmountError, MAX_MONEY_AMOUNT };

/// Vendors a settlement request may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorScope {
    All,
    Vendor(Uuid),
}

impl VendorScope {
    fn vendor_id(&self) -> Option<Uuid> {
        match self {
            VendorScope::All => None,
            VendorScope::Vendor(id) => Some(*id),
        }
    }
}

/// Resolves the vendor scope for a caller. `staff_vendor` is the vendor a
/// staff caller is linked to; `requested` is an explicit vendor filter.
pub fn scope_for(
    caller: &Caller,
    staff_vendor: Option<Uuid>,
    requested: Option<Uuid>
) -> Result<VendorScope> {
    let own = match *caller {
        Caller::Admin(_) => {
            return Ok(requested.map(VendorScope::Vendor).unwrap_or(VendorScope::All));
        }
        Caller::Customer(_) => {
            return Err(AppError::Forbidden("Access denied. Vendor account required".to_string()));
        }
        Caller::Vendor(id) | Caller::Doctor(id) => id,
        Caller::Staff(_) =>
            staff_vendor.ok_or_else(|| AppError::NotFound("Staff is not linked to a vendor".to_string()))?,
    };

    match requested {
        Some(vendor_id) if vendor_id != own => {
            Err(AppError::Forbidden("You can only access your own vendor settlements".to_string()))
        }
        _ => Ok(VendorScope::Vendor(own)),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementQuery {
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub vendor_id: Option<Uuid>,
}

impl SettlementQuery {
    fn period(&self) -> Result<SettlementPeriod> {
        match self.period.as_deref().map(str::trim) {
            None | Some("") => Ok(SettlementPeriod::default()),
            Some(raw) => raw.parse(),
        }
    }

    /// `None` when no status filter applies.
    fn status(&self) -> Result<Option<SettlementStatus>> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) if raw.eq_ignore_ascii_case("all") => Ok(None),
            Some(raw) => raw.parse().map(Some),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementFilters {
    pub period: SettlementPeriod,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: Option<SettlementStatus>,
}

#[derive(Debug, Serialize)]
pub struct SettlementReport {
    pub data: Vec<VendorSettlement>,
    pub filters: SettlementFilters,
    pub summary: SettlementSummary,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub vendor_id: Uuid,
    #[serde(default)]
    pub amount: serde_json::Value,
    #[serde(rename = "type")]
    pub direction: String,
    #[serde(default)]
    #[validate(custom = "payment_method_present")]
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
}

fn payment_method_present(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some("Payment method is required".into());
        return Err(error);
    }
    Ok(())
}

fn payment_amount(raw: &serde_json::Value) -> Result<rust_decimal::Decimal> {
    parse_money(raw).map_err(|reason| {
        let message = match reason {
            AmountError::NotANumber | AmountError::NotPositive => {
                "Amount must be greater than zero".to_string()
            }
            AmountError::TooPrecise => "Amount can have at most 2 decimal places".to_string(),
            AmountError::TooLarge => {
                format!("Amount cannot exceed {}", format_rupees(MAX_MONEY_AMOUNT))
            }
        };
        AppError::InvalidInput(message)
    })
}

pub struct SettlementService {
    db: DatabaseConnection,
    business_offset: FixedOffset,
}

impl SettlementService {
    pub fn new(db: DatabaseConnection, business_offset: FixedOffset) -> Self {
        Self {
            db,
            business_offset,
        }
    }

    async fn resolve_scope(&self, caller: &Caller, requested: Option<Uuid>) -> Result<VendorScope> {
        let staff_vendor = match caller {
            Caller::Staff(user_id) => AccountRepository::find_staff_vendor_id(&self.db, *user_id).await?,
            _ => None,
        };

        scope_for(caller, staff_vendor, requested)
    }

    pub async fn get_settlements(
        &self,
        caller: &Caller,
        query: SettlementQuery
    ) -> Result<SettlementReport> {
        let period = query.period()?;
        let status = query.status()?;
        let window = SettlementWindow::resolve(
            period,
            query.start_date.as_deref(),
            query.end_date.as_deref(),
            Utc::now(),
            self.business_offset
        )?;

        let scope = self.resolve_scope(caller, query.vendor_id).await?;

        let appointments = SettlementRepository::find_settleable_appointments(
            &self.db,
            scope.vendor_id(),
            window.start,
            window.end
        ).await?;
        let payments = SettlementRepository::find_payments(
            &self.db,
            scope.vendor_id(),
            window.start,
            window.end
        ).await?;

        let mut vendor_ids: Vec<Uuid> = appointments
            .iter()
            .map(|a| a.vendor_id)
            .collect();
        vendor_ids.sort();
        vendor_ids.dedup();
        let names = AccountRepository::vendor_names(&self.db, vendor_ids).await?;

        let mut data = settlement_reconciler::reconcile(&appointments, &payments, &names);
        if let Some(status) = status {
            data.retain(|s| s.status == status);
        }

        let summary = SettlementSummary::build(&data, &payments);

        tracing::debug!(
            caller = %caller.user_id(),
            period = %period,
            vendors = data.len(),
            appointments = appointments.len(),
            payments = payments.len(),
            "Settlements computed"
        );

        Ok(SettlementReport {
            data,
            filters: SettlementFilters {
                period,
                start_date: window.start,
                end_date: window.end,
                status,
            },
            summary,
        })
    }

    /// Appends a manual settlement payment. Amounts are not capped against
    /// what is outstanding.
    pub async fn record_payment(
        &self,
        caller: &Caller,
        request: RecordPaymentRequest
    ) -> Result<settlement_payment::Model> {
        let amount = payment_amount(&request.amount)?;
        let direction: SettlementDirection = request.direction.parse()?;

        request.validate().map_err(|e| AppError::validation(&e, &["payment_method"]))?;
        let payment_method = request.payment_method.trim();

        AccountRepository::find_vendor(&self.db, request.vendor_id).await?;
        self.resolve_scope(caller, Some(request.vendor_id)).await?;

        let payment = SettlementRepository::create_payment(&self.db, NewSettlementPayment {
            vendor_id: request.vendor_id,
            amount,
            direction,
            payment_method: payment_method.to_string(),
            transaction_id: non_blank(request.transaction_id),
            notes: non_blank(request.notes),
            created_by: caller.user_id(),
        }).await?;

        tracing::info!(
            payment_id = %payment.id,
            vendor_id = %payment.vendor_id,
            amount = %amount,
            direction = %direction,
            created_by = %caller.user_id(),
            "Settlement payment recorded"
        );

        Ok(payment)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_sees_all_or_filters() {
        let admin = Caller::Admin(Uuid::new_v4());
        let vendor = Uuid::new_v4();

        assert_eq!(scope_for(&admin, None, None).unwrap(), VendorScope::All);
        assert_eq!(scope_for(&admin, None, Some(vendor)).unwrap(), VendorScope::Vendor(vendor));
    }

    #[test]
    fn test_vendor_and_doctor_scoped_to_self() {
        let id = Uuid::new_v4();

        assert_eq!(scope_for(&Caller::Vendor(id), None, None).unwrap(), VendorScope::Vendor(id));
        assert_eq!(scope_for(&Caller::Doctor(id), None, Some(id)).unwrap(), VendorScope::Vendor(id));
        assert!(
            matches!(
                scope_for(&Caller::Vendor(id), None, Some(Uuid::new_v4())),
                Err(AppError::Forbidden(_))
            )
        );
    }

    #[test]
    fn test_staff_resolve_to_linked_vendor() {
        let staff = Caller::Staff(Uuid::new_v4());
        let vendor = Uuid::new_v4();

        assert_eq!(scope_for(&staff, Some(vendor), None).unwrap(), VendorScope::Vendor(vendor));

        match scope_for(&staff, None, None) {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Staff is not linked to a vendor"),
            other => panic!("expected not found, got {:?}", other),
        }
    }

    #[test]
    fn test_customers_are_forbidden() {
        let customer = Caller::Customer(Uuid::new_v4());
        assert!(matches!(scope_for(&customer, None, None), Err(AppError::Forbidden(_))));
    }

    fn payment_request(amount: serde_json::Value, payment_method: &str) -> RecordPaymentRequest {
        RecordPaymentRequest {
            vendor_id: Uuid::new_v4(),
            amount,
            direction: "Payment to Vendor".to_string(),
            payment_method: payment_method.to_string(),
            transaction_id: None,
            notes: None,
        }
    }

    #[test]
    fn test_payment_method_required() {
        assert!(payment_request(serde_json::json!(100), "upi").validate().is_ok());

        let errors = payment_request(serde_json::json!(100), "   ").validate().unwrap_err();
        let err = AppError::validation(&errors, &["payment_method"]);
        assert_eq!(err.to_string(), "Payment method is required");
    }

    #[test]
    fn test_payment_amount_bounds() {
        assert_eq!(payment_amount(&serde_json::json!("2500.75")).unwrap().to_string(), "2500.75");

        let err = payment_amount(&serde_json::json!(0)).unwrap_err();
        assert_eq!(err.to_string(), "Amount must be greater than zero");

        let err = payment_amount(&serde_json::json!("10.125")).unwrap_err();
        assert_eq!(err.to_string(), "Amount can have at most 2 decimal places");

        let err = payment_amount(&serde_json::json!("1000000000000")).unwrap_err();
        assert_eq!(err.to_string(), "Amount cannot exceed ₹999999999999.99");
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_query_defaults_and_status_parsing() {
        let query = SettlementQuery::default();
        assert_eq!(query.period().unwrap(), SettlementPeriod::Month);
        assert_eq!(query.status().unwrap(), None);

        let query = SettlementQuery {
            period: Some("week".to_string()),
            status: Some("partially paid".to_string()),
            ..Default::default()
        };
        assert_eq!(query.period().unwrap(), SettlementPeriod::Week);
        assert_eq!(query.status().unwrap(), Some(SettlementStatus::PartiallyPaid));

        let query = SettlementQuery {
            period: Some("fortnight".to_string()),
            status: Some("All".to_string()),
            ..Default::default()
        };
        assert!(query.period().is_err());
        assert_eq!(query.status().unwrap(), None);
    }
}

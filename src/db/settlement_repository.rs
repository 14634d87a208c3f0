use chrono::{ DateTime, Utc };
use sea_orm::{
    prelude::Decimal,
    ActiveModelTrait,
    ColumnTrait,
    ConnectionTrait,
    EntityTrait,
    QueryFilter,
    QueryOrder,
    Set,
};
use uuid::Uuid;

use crate::db::entity::{ appointment, settlement_payment, Appointment, SettlementPayment };
use crate::enums::SettlementDirection;
use crate::error::Result;

/// Appointment statuses that still owe a settlement. Cancelled bookings are
/// excluded even when payment was captured.
const SETTLEABLE_STATUSES: [&str; 3] = ["scheduled", "confirmed", "completed"];
const PAYMENT_COMPLETED: &str = "completed";
const MODE_ONLINE: &str = "online";

pub struct NewSettlementPayment {
    pub vendor_id: Uuid,
    pub amount: Decimal,
    pub direction: SettlementDirection,
    pub payment_method: String,
    pub transaction_id: Option<String>,
    pub notes: Option<String>,
    pub created_by: Uuid,
}

pub struct SettlementRepository;

impl SettlementRepository {
    /// Paid online-booked appointments in `[start, end]`, optionally for one
    /// vendor.
    pub async fn find_settleable_appointments<C: ConnectionTrait>(
        conn: &C,
        vendor_id: Option<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>
    ) -> Result<Vec<appointment::Model>> {
        let mut query = Appointment::find()
            .filter(appointment::Column::Date.gte(start))
            .filter(appointment::Column::Date.lte(end))
            .filter(appointment::Column::PaymentStatus.eq(PAYMENT_COMPLETED))
            .filter(appointment::Column::Mode.eq(MODE_ONLINE))
            .filter(appointment::Column::Status.is_in(SETTLEABLE_STATUSES));

        if let Some(vendor_id) = vendor_id {
            query = query.filter(appointment::Column::VendorId.eq(vendor_id));
        }

        let appointments = query.order_by_asc(appointment::Column::Date).all(conn).await?;
        Ok(appointments)
    }

    pub async fn find_payments<C: ConnectionTrait>(
        conn: &C,
        vendor_id: Option<Uuid>,
        start: DateTime<Utc>,
        end: DateTime<Utc>
    ) -> Result<Vec<settlement_payment::Model>> {
        let mut query = SettlementPayment::find()
            .filter(settlement_payment::Column::PaymentDate.gte(start))
            .filter(settlement_payment::Column::PaymentDate.lte(end));

        if let Some(vendor_id) = vendor_id {
            query = query.filter(settlement_payment::Column::VendorId.eq(vendor_id));
        }

        let payments = query.order_by_asc(settlement_payment::Column::PaymentDate).all(conn).await?;
        Ok(payments)
    }

    pub async fn create_payment<C: ConnectionTrait>(
        conn: &C,
        new: NewSettlementPayment
    ) -> Result<settlement_payment::Model> {
        let payment = settlement_payment::ActiveModel {
            id: Set(Uuid::new_v4()),
            vendor_id: Set(new.vendor_id),
            amount: Set(new.amount),
            direction: Set(new.direction.as_str().to_string()),
            payment_method: Set(new.payment_method),
            transaction_id: Set(new.transaction_id),
            notes: Set(new.notes),
            payment_date: Set(Utc::now()),
            created_by: Set(new.created_by),
        };

        let payment = payment.insert(conn).await?;
        Ok(payment)
    }
}

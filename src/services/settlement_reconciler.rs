//! Per-vendor settlement arithmetic.
//!
//! Online payments are collected by the platform, which then owes the vendor
//! the base service amount. Salon payments are collected by the vendor, who
//! then owes the platform its fee and the service tax. The two are netted
//! per vendor and compared with the manual payments recorded in the same
//! direction.

use std::collections::HashMap;

use sea_orm::prelude::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::db::entity::{ appointment, settlement_payment };
use crate::enums::{ PaymentMethod, SettlementDirection, SettlementStatus };

const UNKNOWN_VENDOR: &str = "Unknown vendor";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSettlement {
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub total_appointments: u64,
    pub online_appointments: u64,
    pub salon_appointments: u64,
    /// Sum of the final amounts charged to customers.
    pub total_amount: Decimal,
    pub platform_fee: Decimal,
    pub service_tax: Decimal,
    pub admin_owes_vendor: Decimal,
    pub vendor_owes_admin: Decimal,
    pub net_settlement: Decimal,
    pub vendor_amount: Decimal,
    pub admin_receivable_amount: Decimal,
    pub paid_to_vendor: Decimal,
    pub paid_to_admin: Decimal,
    /// Paid in the direction the balance currently flows.
    pub amount_paid: Decimal,
    pub amount_pending: Decimal,
    pub status: SettlementStatus,
}

impl VendorSettlement {
    fn new(vendor_id: Uuid, vendor_name: String) -> Self {
        Self {
            vendor_id,
            vendor_name,
            total_appointments: 0,
            online_appointments: 0,
            salon_appointments: 0,
            total_amount: Decimal::ZERO,
            platform_fee: Decimal::ZERO,
            service_tax: Decimal::ZERO,
            admin_owes_vendor: Decimal::ZERO,
            vendor_owes_admin: Decimal::ZERO,
            net_settlement: Decimal::ZERO,
            vendor_amount: Decimal::ZERO,
            admin_receivable_amount: Decimal::ZERO,
            paid_to_vendor: Decimal::ZERO,
            paid_to_admin: Decimal::ZERO,
            amount_paid: Decimal::ZERO,
            amount_pending: Decimal::ZERO,
            status: SettlementStatus::Paid,
        }
    }

    /// Direction money is owed in, `None` when the vendor is square.
    pub fn direction(&self) -> Option<SettlementDirection> {
        if self.net_settlement > Decimal::ZERO {
            Some(SettlementDirection::ToVendor)
        } else if self.net_settlement < Decimal::ZERO {
            Some(SettlementDirection::ToAdmin)
        } else {
            None
        }
    }

    fn finalize(&mut self) {
        self.net_settlement = self.admin_owes_vendor - self.vendor_owes_admin;
        self.vendor_amount = self.net_settlement.max(Decimal::ZERO);
        self.admin_receivable_amount = (-self.net_settlement).max(Decimal::ZERO);

        let (owed, paid) = match self.direction() {
            Some(SettlementDirection::ToVendor) => (self.vendor_amount, self.paid_to_vendor),
            Some(SettlementDirection::ToAdmin) => (self.admin_receivable_amount, self.paid_to_admin),
            None => (Decimal::ZERO, Decimal::ZERO),
        };

        self.amount_paid = paid;
        self.amount_pending = (owed - paid).max(Decimal::ZERO);
        self.status = classify(owed, paid);
    }
}

pub fn classify(owed: Decimal, paid: Decimal) -> SettlementStatus {
    if owed - paid <= Decimal::ZERO {
        SettlementStatus::Paid
    } else if paid > Decimal::ZERO {
        SettlementStatus::PartiallyPaid
    } else {
        SettlementStatus::Pending
    }
}

/// Builds one settlement per vendor that has qualifying appointments.
/// Payments for vendors without appointments in the window are ignored.
/// The result is ordered by vendor name, then id.
pub fn reconcile(
    appointments: &[appointment::Model],
    payments: &[settlement_payment::Model],
    vendor_names: &HashMap<Uuid, String>
) -> Vec<VendorSettlement> {
    let mut by_vendor: HashMap<Uuid, VendorSettlement> = HashMap::new();

    for appt in appointments {
        let method = match appt.payment_method.parse::<PaymentMethod>() {
            Ok(method) => method,
            Err(_) => {
                tracing::warn!(
                    appointment_id = %appt.id,
                    payment_method = %appt.payment_method,
                    "Skipping appointment with unknown payment method"
                );
                continue;
            }
        };

        let entry = by_vendor.entry(appt.vendor_id).or_insert_with(|| {
            let name = vendor_names
                .get(&appt.vendor_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_VENDOR.to_string());
            VendorSettlement::new(appt.vendor_id, name)
        });

        entry.total_appointments += 1;
        entry.total_amount += appt.final_amount;
        entry.platform_fee += appt.platform_fee;
        entry.service_tax += appt.service_tax;

        match method {
            PaymentMethod::PayOnline => {
                entry.online_appointments += 1;
                entry.admin_owes_vendor += appt.total_amount;
            }
            PaymentMethod::PayAtSalon => {
                entry.salon_appointments += 1;
                entry.vendor_owes_admin += appt.platform_fee + appt.service_tax;
            }
        }
    }

    for payment in payments {
        let Some(entry) = by_vendor.get_mut(&payment.vendor_id) else {
            continue;
        };

        match payment.direction.parse::<SettlementDirection>() {
            Ok(SettlementDirection::ToVendor) => {
                entry.paid_to_vendor += payment.amount;
            }
            Ok(SettlementDirection::ToAdmin) => {
                entry.paid_to_admin += payment.amount;
            }
            Err(_) => {
                tracing::warn!(
                    payment_id = %payment.id,
                    direction = %payment.direction,
                    "Skipping settlement payment with unknown direction"
                );
            }
        }
    }

    let mut settlements: Vec<VendorSettlement> = by_vendor
        .into_values()
        .map(|mut s| {
            s.finalize();
            s
        })
        .collect();

    settlements.sort_by(|a, b| {
        a.vendor_name.cmp(&b.vendor_name).then_with(|| a.vendor_id.cmp(&b.vendor_id))
    });

    settlements
}

/// Window-level totals over the returned settlements.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementSummary {
    pub total_vendors: u64,
    pub total_appointments: u64,
    pub total_amount: Decimal,
    pub total_admin_receivable: Decimal,
    pub total_vendor_amount: Decimal,
    /// Every payment in the window and scope, whatever its direction.
    pub total_paid: Decimal,
    pub total_pending: Decimal,
}

impl SettlementSummary {
    pub fn build(settlements: &[VendorSettlement], payments: &[settlement_payment::Model]) -> Self {
        let mut summary = Self {
            total_vendors: settlements.len() as u64,
            total_appointments: 0,
            total_amount: Decimal::ZERO,
            total_admin_receivable: Decimal::ZERO,
            total_vendor_amount: Decimal::ZERO,
            total_paid: payments
                .iter()
                .map(|p| p.amount)
                .sum(),
            total_pending: Decimal::ZERO,
        };

        for s in settlements {
            summary.total_appointments += s.total_appointments;
            summary.total_amount += s.total_amount;
            summary.total_admin_receivable += s.admin_receivable_amount;
            summary.total_vendor_amount += s.vendor_amount;
            summary.total_pending += s.amount_pending;
        }

        summary
    }
}

use sea_orm::entity::prelude::*;
use serde::{ Deserialize, Serialize };

/// Booking snapshot consumed by settlement. Written by the booking system.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub date: DateTimeUtc,
    pub status: String,
    pub mode: String,
    pub payment_status: String,
    pub payment_method: String,
    pub total_amount: Decimal,
    pub platform_fee: Decimal,
    pub service_tax: Decimal,
    pub final_amount: Decimal,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vendor::Entity",
        from = "Column::VendorId",
        to = "super::vendor::Column::Id"
    )]
    Vendor,
}

impl Related<super::vendor::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vendor.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

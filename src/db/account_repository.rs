use std::collections::HashMap;

use sea_orm::{ ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter };
use uuid::Uuid;

use crate::db::entity::{ staff, user, vendor, Staff, User, Vendor };
use crate::error::{ AppError, Result };

/// Lookups for users, vendors and staff links.
pub struct AccountRepository;

impl AccountRepository {
    pub async fn find_user<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<user::Model> {
        User::find_by_id(id)
            .one(conn).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn find_vendor<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<vendor::Model> {
        Vendor::find_by_id(id)
            .one(conn).await?
            .ok_or_else(|| AppError::NotFound("Vendor not found".to_string()))
    }

    /// Vendor a staff member works for, if the link is set.
    pub async fn find_staff_vendor_id<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid
    ) -> Result<Option<Uuid>> {
        let staff = Staff::find()
            .filter(staff::Column::UserId.eq(user_id))
            .one(conn).await?;

        Ok(staff.and_then(|s| s.vendor_id))
    }

    pub async fn vendor_names<C: ConnectionTrait>(
        conn: &C,
        ids: Vec<Uuid>
    ) -> Result<HashMap<Uuid, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let vendors = Vendor::find()
            .filter(vendor::Column::Id.is_in(ids))
            .all(conn).await?;

        Ok(
            vendors
                .into_iter()
                .map(|v| (v.id, v.name))
                .collect()
        )
    }
}

use chrono::{ DateTime, Utc };
use sea_orm::{
    prelude::{ Decimal, Json },
    ActiveModelTrait,
    ColumnTrait,
    ConnectionTrait,
    EntityTrait,
    PaginatorTrait,
    QueryFilter,
    QueryOrder,
    QuerySelect,
    Set,
};
use uuid::Uuid;

use crate::db::entity::{ withdrawal, Withdrawal };
use crate::enums::{ WithdrawalMethod, WithdrawalStatus };
use crate::error::Result;

pub struct NewWithdrawal {
    pub user_id: Uuid,
    pub amount: Decimal,
    pub fee: Decimal,
    pub net_amount: Decimal,
    pub method: WithdrawalMethod,
    pub bank_details: Json,
    pub status: WithdrawalStatus,
    pub risk_score: i32,
    pub risk_flags: Vec<String>,
    pub rejection_reason: Option<String>,
    pub requested_at: DateTime<Utc>,
}

/// One page of a user's withdrawal history.
pub struct WithdrawalPage {
    pub items: Vec<withdrawal::Model>,
    pub total_items: u64,
    pub total_pages: u64,
}

pub struct WithdrawalRepository;

impl WithdrawalRepository {
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        new: NewWithdrawal
    ) -> Result<withdrawal::Model> {
        let id = Uuid::new_v4();
        let processed_at = (new.status == WithdrawalStatus::Processing).then_some(new.requested_at);

        let model = withdrawal::ActiveModel {
            id: Set(id),
            user_id: Set(new.user_id),
            amount: Set(new.amount),
            fee: Set(new.fee),
            net_amount: Set(new.net_amount),
            method: Set(new.method.as_str().to_string()),
            bank_details: Set(new.bank_details),
            status: Set(new.status.as_str().to_string()),
            risk_score: Set(new.risk_score),
            risk_flags: Set(serde_json::json!(new.risk_flags)),
            rejection_reason: Set(new.rejection_reason),
            provider_reference: Set(format!("WD-{}", id.simple())),
            requested_at: Set(new.requested_at),
            processed_at: Set(processed_at),
            completed_at: Set(None),
            failed_at: Set(None),
            failure_reason: Set(None),
        };

        let withdrawal = model.insert(conn).await?;
        Ok(withdrawal)
    }

    pub async fn count_since<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        since: DateTime<Utc>,
        statuses: &[WithdrawalStatus]
    ) -> Result<u64> {
        let count = Withdrawal::find()
            .filter(withdrawal::Column::UserId.eq(user_id))
            .filter(withdrawal::Column::RequestedAt.gte(since))
            .filter(withdrawal::Column::Status.is_in(statuses.iter().map(|s| s.as_str())))
            .count(conn).await?;

        Ok(count)
    }

    pub async fn sum_since<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        since: DateTime<Utc>,
        statuses: &[WithdrawalStatus]
    ) -> Result<Decimal> {
        let total: Option<Option<Decimal>> = Withdrawal::find()
            .select_only()
            .column_as(withdrawal::Column::Amount.sum(), "total")
            .filter(withdrawal::Column::UserId.eq(user_id))
            .filter(withdrawal::Column::RequestedAt.gte(since))
            .filter(withdrawal::Column::Status.is_in(statuses.iter().map(|s| s.as_str())))
            .into_tuple()
            .one(conn).await?;

        Ok(total.flatten().unwrap_or(Decimal::ZERO))
    }

    pub async fn find_last_completed<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid
    ) -> Result<Option<withdrawal::Model>> {
        let last = Withdrawal::find()
            .filter(withdrawal::Column::UserId.eq(user_id))
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Completed.as_str()))
            .filter(withdrawal::Column::CompletedAt.is_not_null())
            .order_by_desc(withdrawal::Column::CompletedAt)
            .one(conn).await?;

        Ok(last)
    }

    pub async fn find_by_provider_reference_for_update<C: ConnectionTrait>(
        conn: &C,
        provider_reference: &str
    ) -> Result<Option<withdrawal::Model>> {
        let found = Withdrawal::find()
            .filter(withdrawal::Column::ProviderReference.eq(provider_reference))
            .lock_exclusive()
            .one(conn).await?;

        Ok(found)
    }

    /// Oldest `processing` withdrawals requested before `cutoff`.
    pub async fn find_processing_before<C: ConnectionTrait>(
        conn: &C,
        cutoff: DateTime<Utc>,
        limit: u64
    ) -> Result<Vec<withdrawal::Model>> {
        let due = Withdrawal::find()
            .filter(withdrawal::Column::Status.eq(WithdrawalStatus::Processing.as_str()))
            .filter(withdrawal::Column::RequestedAt.lte(cutoff))
            .order_by_asc(withdrawal::Column::RequestedAt)
            .limit(limit)
            .all(conn).await?;

        Ok(due)
    }

    /// `page` is 1-based.
    pub async fn list_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        status: Option<WithdrawalStatus>,
        page: u64,
        limit: u64
    ) -> Result<WithdrawalPage> {
        let mut query = Withdrawal::find().filter(withdrawal::Column::UserId.eq(user_id));

        if let Some(status) = status {
            query = query.filter(withdrawal::Column::Status.eq(status.as_str()));
        }

        let paginator = query.order_by_desc(withdrawal::Column::RequestedAt).paginate(conn, limit);

        let counts = paginator.num_items_and_pages().await?;
        // Pages past the end are empty. Fetching them would overflow the offset.
        let items = if page == 0 || page > counts.number_of_pages {
            Vec::new()
        } else {
            paginator.fetch_page(page - 1).await?
        };

        Ok(WithdrawalPage {
            items,
            total_items: counts.number_of_items,
            total_pages: counts.number_of_pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use sea_orm::{ DatabaseBackend, MockDatabase, Value };

    #[tokio::test]
    async fn test_page_past_the_end_skips_fetch() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![BTreeMap::from([("num_items", Value::BigInt(Some(250)))])]])
            .into_connection();

        let page = WithdrawalRepository::list_for_user(
            &db,
            Uuid::new_v4(),
            Some(WithdrawalStatus::Completed),
            u64::MAX,
            100
        ).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total_items, 250);
        assert_eq!(page.total_pages, 3);
        assert_eq!(db.into_transaction_log().len(), 1);
    }
}

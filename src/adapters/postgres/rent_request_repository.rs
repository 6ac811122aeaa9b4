use crate::domain::{
    NewRentRequest, RentRequest, RentRequestId, RentRequestStatus, RentalPeriod,
    value_objects::{ListingId, PaymentStatus, UserId},
};
use crate::ports::rent_request_repository::{
    PageRequest, RentRequestFilter, RentRequestRepository as RentRequestRepositoryTrait, Result,
    StatusTransition,
};
use async_trait::async_trait;
use sqlx::{
    PgPool, Postgres, QueryBuilder, Row,
    postgres::{PgArguments, PgRow},
    query::Query,
};
use std::str::FromStr;

const SELECT_COLUMNS: &str = r#"
    SELECT
        id,
        renter_id,
        owner_id,
        listing_id,
        start_date,
        end_date,
        total_price,
        status,
        payment_status,
        created_at,
        updated_at
    FROM rent_requests
"#;

fn invalid_data(message: String) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// PostgreSQLの行データをRentRequestに変換する
///
/// ステータス文字列と期間の不変条件（start < end）を検証する。
fn map_row_to_rent_request(row: &PgRow) -> Result<RentRequest> {
    let status_str: &str = row.get("status");
    let status = RentRequestStatus::from_str(status_str).map_err(invalid_data)?;

    let payment_status_str: &str = row.get("payment_status");
    let payment_status = PaymentStatus::from_str(payment_status_str).map_err(invalid_data)?;

    let id: i64 = row.get("id");
    let period = RentalPeriod::new(row.get("start_date"), row.get("end_date"))
        .map_err(|e| invalid_data(format!("rent request {}: {:?}", id, e)))?;

    Ok(RentRequest {
        id: RentRequestId::new(id),
        renter_id: UserId::new(row.get("renter_id")),
        owner_id: UserId::new(row.get("owner_id")),
        listing_id: ListingId::new(row.get("listing_id")),
        period,
        total_price: row.get("total_price"),
        status,
        payment_status,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// 状態が期待値のままである場合に限りレコード全体を上書きするUPDATE
fn replace_query(
    record: &RentRequest,
    expected_status: RentRequestStatus,
) -> Query<'static, Postgres, PgArguments> {
    sqlx::query(
        r#"
        UPDATE rent_requests
        SET
            renter_id = $2,
            owner_id = $3,
            listing_id = $4,
            start_date = $5,
            end_date = $6,
            total_price = $7,
            status = $8,
            payment_status = $9,
            created_at = $10,
            updated_at = $11
        WHERE id = $1 AND status = $12
        "#,
    )
    .bind(record.id.value())
    .bind(record.renter_id.value())
    .bind(record.owner_id.value())
    .bind(record.listing_id.value())
    .bind(record.period.start())
    .bind(record.period.end())
    .bind(record.total_price)
    .bind(record.status.as_str())
    .bind(record.payment_status.as_str())
    .bind(record.created_at)
    .bind(record.updated_at)
    .bind(expected_status.as_str())
}

/// RentRequestRepositoryのPostgreSQL実装
pub struct RentRequestRepository {
    pool: PgPool,
}

impl RentRequestRepository {
    /// PostgreSQLコネクションプールから新しいRentRequestRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 当事者（貸し手または借り手）列で絞り込んだ一覧
    ///
    /// `party_column`は内部の固定値のみを受け付ける。
    async fn list_by_party(
        &self,
        party_column: &'static str,
        user_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> Result<Vec<RentRequest>> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_COLUMNS);
        builder
            .push(" WHERE ")
            .push(party_column)
            .push(" = ")
            .push_bind(user_id.value());

        if let Some(status) = filter.status {
            builder.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(from) = filter.created_from {
            builder.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(before) = filter.created_before {
            builder.push(" AND created_at < ").push_bind(before);
        }

        builder
            .push(" ORDER BY id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);

        let rows = builder.build().fetch_all(&self.pool).await?;

        rows.iter().map(map_row_to_rent_request).collect()
    }
}

#[async_trait]
impl RentRequestRepositoryTrait for RentRequestRepository {
    async fn add(&self, new_request: NewRentRequest) -> Result<RentRequestId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO rent_requests (
                renter_id,
                owner_id,
                listing_id,
                start_date,
                end_date,
                total_price,
                status,
                payment_status,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(new_request.renter_id.value())
        .bind(new_request.owner_id.value())
        .bind(new_request.listing_id.value())
        .bind(new_request.period.start())
        .bind(new_request.period.end())
        .bind(new_request.total_price)
        .bind(new_request.status.as_str())
        .bind(new_request.payment_status.as_str())
        .bind(new_request.created_at)
        .bind(new_request.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(RentRequestId::new(id))
    }

    async fn replace(
        &self,
        record: &RentRequest,
        expected_status: RentRequestStatus,
    ) -> Result<bool> {
        let result = replace_query(record, expected_status)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// 1件でも条件を満たさなければロールバックする
    async fn replace_batch(&self, transitions: &[StatusTransition]) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        for transition in transitions {
            let result = replace_query(&transition.record, transition.expected_status)
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() != 1 {
                tx.rollback().await?;
                return Ok(false);
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn get_by_id(&self, id: RentRequestId) -> Result<Option<RentRequest>> {
        let row = sqlx::query(&format!("{} WHERE id = $1", SELECT_COLUMNS))
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_rent_request).transpose()
    }

    /// (listing_id, status)のインデックスを使用する
    async fn get_overlapping(
        &self,
        listing_id: ListingId,
        status: RentRequestStatus,
        period: &RentalPeriod,
    ) -> Result<Vec<RentRequest>> {
        let rows = sqlx::query(&format!(
            "{} WHERE listing_id = $1 AND status = $2 AND start_date <= $3 AND end_date >= $4 ORDER BY id ASC",
            SELECT_COLUMNS
        ))
        .bind(listing_id.value())
        .bind(status.as_str())
        .bind(period.end())
        .bind(period.start())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_rent_request).collect()
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> Result<Vec<RentRequest>> {
        self.list_by_party("owner_id", owner_id, filter, page).await
    }

    async fn list_by_renter(
        &self,
        renter_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> Result<Vec<RentRequest>> {
        self.list_by_party("renter_id", renter_id, filter, page).await
    }
}

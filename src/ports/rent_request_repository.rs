use crate::domain::{
    NewRentRequest, RentRequest, RentRequestId, RentRequestStatus, RentalPeriod,
    value_objects::{ListingId, UserId},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 一覧取得の絞り込み条件
///
/// 指定された条件はすべてAND結合される。
/// 日時条件は作成日時（created_at）に適用する。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RentRequestFilter {
    pub status: Option<RentRequestStatus>,
    /// created_at >= created_from
    pub created_from: Option<DateTime<Utc>>,
    /// created_at < created_before
    pub created_before: Option<DateTime<Utc>>,
}

impl RentRequestFilter {
    /// 条件に一致するか判定する
    pub fn matches(&self, request: &RentRequest) -> bool {
        self.status.is_none_or(|s| request.status == s)
            && self.created_from.is_none_or(|from| request.created_at >= from)
            && self
                .created_before
                .is_none_or(|before| request.created_at < before)
    }
}

/// オフセット方式のページ指定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: i64,
    pub limit: i64,
}

/// 条件付き置き換え
///
/// 保存されている状態が`expected_status`のままである場合に限り`record`で上書きする。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub record: RentRequest,
    pub expected_status: RentRequestStatus,
}

/// 貸出リクエストリポジトリポート
///
/// 永続化のみを担い、ドメインルールは持たない。
/// レコードは物理削除しない。
#[async_trait]
pub trait RentRequestRepository: Send + Sync {
    /// 新しい貸出リクエストを保存し、採番されたIDを返す
    async fn add(&self, new_request: NewRentRequest) -> Result<RentRequestId>;

    /// レコードをIDで全体上書きする
    ///
    /// 保存済みの状態が`expected_status`と異なる場合は書き込まずに`false`を返す。
    /// 読み取りから書き込みまでの間に他の操作が状態を変えた場合の検出に使う。
    async fn replace(
        &self,
        record: &RentRequest,
        expected_status: RentRequestStatus,
    ) -> Result<bool>;

    /// 複数の条件付き置き換えを1トランザクションで適用する
    ///
    /// 1件でも条件を満たさなければ何も書き込まずに`false`を返す。
    async fn replace_batch(&self, transitions: &[StatusTransition]) -> Result<bool>;

    /// IDで取得する
    async fn get_by_id(&self, id: RentRequestId) -> Result<Option<RentRequest>>;

    /// 出品・状態が一致し、期間が重なるリクエストを取得する
    ///
    /// 重なり判定は両端を含む: `existing.start <= period.end AND existing.end >= period.start`
    async fn get_overlapping(
        &self,
        listing_id: ListingId,
        status: RentRequestStatus,
        period: &RentalPeriod,
    ) -> Result<Vec<RentRequest>>;

    /// 貸し手の貸出リクエスト一覧（作成順）
    async fn list_by_owner(
        &self,
        owner_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> Result<Vec<RentRequest>>;

    /// 借り手の貸出リクエスト一覧（作成順）
    async fn list_by_renter(
        &self,
        renter_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> Result<Vec<RentRequest>>;
}

use crate::domain::value_objects::{ListingId, UserId};
use async_trait::async_trait;
use thiserror::Error;

/// 貸出リクエスト作成に必要な出品情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingDetails {
    pub listing_id: ListingId,
    pub owner_id: UserId,
    /// 1日あたりの料金（通貨の最小単位ではなく整数の通貨単位）
    pub price_per_day: i64,
}

/// 出品サービスのエラー
///
/// 呼び出し元が区別して扱えるよう、失敗の種類ごとに分ける。
#[derive(Debug, Error)]
pub enum ListingServiceError {
    /// 出品が存在しない
    #[error("Listing not found")]
    NotFound,

    /// 出品サービスがリクエストを不正とした
    #[error("Listing service rejected the request: {0}")]
    BadRequest(String),

    /// 通信失敗・想定外の応答（一時的な障害）
    #[error("Listing service unavailable: {0}")]
    Unavailable(String),
}

/// 出品サービスポート
///
/// 貸出リクエストコンテキストと出品コンテキストの境界を維持する。
/// 貸出リクエスト側は料金と貸し手IDだけを知る。
#[async_trait]
pub trait ListingService: Send + Sync {
    async fn get_listing(
        &self,
        listing_id: ListingId,
    ) -> std::result::Result<ListingDetails, ListingServiceError>;
}

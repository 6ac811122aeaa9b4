use crate::domain::{RequestRentError, TransitionError};
use crate::ports::ListingServiceError;
use thiserror::Error;

/// 貸出リクエスト管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum RentRequestApplicationError {
    /// 入力値が不正（日付・期間・絞り込み条件など）
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 期間の重なる支払い済みリクエストが既にある
    #[error("There is already a paid request for this period")]
    PaidRequestConflict,

    /// 貸出リクエストが見つからない
    #[error("Rent request not found")]
    RentRequestNotFound,

    /// 呼び出し元にその操作の権限がない
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// 現在の状態からは操作できない
    #[error("Invalid rent request state: {0}")]
    InvalidState(String),

    /// 読み取り後に他の操作が状態を変更した
    #[error("Rent request was modified concurrently")]
    ConcurrentModification,

    /// 出品が存在しない
    #[error("Listing not found")]
    ListingNotFound,

    /// 出品サービスがリクエストを不正とした
    #[error("Invalid listing request: {0}")]
    InvalidListingRequest(String),

    /// 出品サービスのエラー
    #[error("Listing service error")]
    ListingServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 決済サービスのエラー
    #[error("Payment service error")]
    PaymentServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// リポジトリのエラー
    #[error("Repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl RentRequestApplicationError {
    /// 状態遷移エラーを操作名付きで変換する
    pub(super) fn from_transition(err: TransitionError, action: &str) -> Self {
        match err {
            TransitionError::NotOwner => RentRequestApplicationError::Forbidden(format!(
                "only the owner can {} this rent request",
                action
            )),
            TransitionError::NotRenter => RentRequestApplicationError::Forbidden(format!(
                "only the renter can {} this rent request",
                action
            )),
            TransitionError::InvalidState(status) => RentRequestApplicationError::InvalidState(
                format!("cannot {} a rent request in status {}", action, status),
            ),
        }
    }
}

impl From<ListingServiceError> for RentRequestApplicationError {
    fn from(err: ListingServiceError) -> Self {
        match err {
            ListingServiceError::NotFound => RentRequestApplicationError::ListingNotFound,
            ListingServiceError::BadRequest(msg) => {
                RentRequestApplicationError::InvalidListingRequest(msg)
            }
            e @ ListingServiceError::Unavailable(_) => {
                RentRequestApplicationError::ListingServiceError(Box::new(e))
            }
        }
    }
}

impl From<RequestRentError> for RentRequestApplicationError {
    fn from(err: RequestRentError) -> Self {
        match err {
            RequestRentError::InvalidPeriod => RentRequestApplicationError::InvalidInput(
                "start date must be before end date".to_string(),
            ),
            RequestRentError::PeriodTooShort => RentRequestApplicationError::InvalidInput(
                "rental period must be at least one day".to_string(),
            ),
            RequestRentError::PriceOverflow => RentRequestApplicationError::InvalidInput(
                "total price is out of range".to_string(),
            ),
            // 出品側のデータ不整合
            RequestRentError::NegativePrice => RentRequestApplicationError::ListingServiceError(
                "listing has a negative price per day".into(),
            ),
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, RentRequestApplicationError>;

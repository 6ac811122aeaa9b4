use super::{RentRequestStatus, RentalPeriodError};

/// 貸出リクエスト作成のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestRentError {
    /// 開始日時が終了日時より前ではない
    InvalidPeriod,
    /// 期間が1日に満たない
    PeriodTooShort,
    /// 1日あたりの料金が負
    NegativePrice,
    /// 合計金額がオーバーフローした
    PriceOverflow,
}

impl From<RentalPeriodError> for RequestRentError {
    fn from(err: RentalPeriodError) -> Self {
        match err {
            RentalPeriodError::StartNotBeforeEnd => RequestRentError::InvalidPeriod,
        }
    }
}

/// 状態遷移のエラー
///
/// 承認・支払い開始・取り消し・却下・支払い結果反映で共通。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// 呼び出し元が貸し手ではない
    NotOwner,
    /// 呼び出し元が借り手ではない
    NotRenter,
    /// 現在の状態からはその遷移ができない
    InvalidState(RentRequestStatus),
}

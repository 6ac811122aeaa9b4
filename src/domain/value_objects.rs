use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 貸出リクエストID - 永続化時に採番される集約ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RentRequestId(i64);

impl RentRequestId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for RentRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ユーザーID - 認証サービスが発行するIDへの参照
///
/// 借り手・貸し手のどちらにも使う。コアはIDの比較以外を行わない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 出品ID - 出品（posts）サービスへの参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(i64);

impl ListingId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 貸出期間のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RentalPeriodError {
    /// 開始日時が終了日時より前ではない
    StartNotBeforeEnd,
}

/// 貸出期間
///
/// 不変条件：start < end
/// 両端を含む区間として重なり判定を行う。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentalPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl RentalPeriod {
    /// # エラー
    /// `start >= end` の場合は`RentalPeriodError::StartNotBeforeEnd`を返す
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, RentalPeriodError> {
        if start >= end {
            return Err(RentalPeriodError::StartNotBeforeEnd);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// 期間の日数（24時間単位の切り捨て）
    ///
    /// 24時間未満の期間は0日になる。
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    /// 両端を含む重なり判定: `a.start <= b.end && a.end >= b.start`
    pub fn overlaps(&self, other: &RentalPeriod) -> bool {
        self.start <= other.end && self.end >= other.start
    }
}

/// 貸出リクエストのステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RentRequestStatus {
    /// 貸し手の確認待ち
    AwaitingConfirmation,
    /// 貸し手が承認済み（支払い待ち）
    Confirmed,
    /// 支払い完了
    Paid,
    /// 重複する別リクエストの支払いにより却下
    Rejected,
    /// 借り手が取り消し
    Canceled,
}

impl RentRequestStatus {
    /// 他リクエストの支払い完了時に却下対象となる状態
    pub const LIVE: [RentRequestStatus; 2] = [
        RentRequestStatus::AwaitingConfirmation,
        RentRequestStatus::Confirmed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RentRequestStatus::AwaitingConfirmation => "awaiting_confirmation",
            RentRequestStatus::Confirmed => "confirmed",
            RentRequestStatus::Paid => "paid",
            RentRequestStatus::Rejected => "rejected",
            RentRequestStatus::Canceled => "canceled",
        }
    }

    /// まだ決着していない（確認待ち・承認済み）か
    pub fn is_live(&self) -> bool {
        Self::LIVE.contains(self)
    }
}

impl std::fmt::Display for RentRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RentRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "awaiting_confirmation" => Ok(RentRequestStatus::AwaitingConfirmation),
            "confirmed" => Ok(RentRequestStatus::Confirmed),
            "paid" => Ok(RentRequestStatus::Paid),
            "rejected" => Ok(RentRequestStatus::Rejected),
            "canceled" => Ok(RentRequestStatus::Canceled),
            _ => Err(format!("Invalid rent request status: {}", s)),
        }
    }
}

/// 支払いステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Success,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "success" => Ok(PaymentStatus::Success),
            "canceled" => Ok(PaymentStatus::Canceled),
            _ => Err(format!("Invalid payment status: {}", s)),
        }
    }
}

/// 決済サービスから通知される支払い結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Success,
    Cancel,
}

impl std::str::FromStr for PaymentOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(PaymentOutcome::Success),
            "cancel" => Ok(PaymentOutcome::Cancel),
            _ => Err(format!("Invalid payment outcome: {}", s)),
        }
    }
}

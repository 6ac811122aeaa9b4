use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ListingId, PaymentOutcome, RentRequestId, UserId};

/// コマンド：貸出リクエストを作成する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateRentRequest {
    pub renter_id: UserId,
    pub listing_id: ListingId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：貸出リクエストを承認する（貸し手）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmRentRequest {
    pub rent_request_id: RentRequestId,
    pub owner_id: UserId,
    pub confirmed_at: DateTime<Utc>,
}

/// コマンド：支払いを開始する（借り手）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRentRequest {
    pub rent_request_id: RentRequestId,
    pub renter_id: UserId,
}

/// コマンド：貸出リクエストを取り消す（借り手）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelRentRequest {
    pub rent_request_id: RentRequestId,
    pub renter_id: UserId,
    pub canceled_at: DateTime<Utc>,
}

/// コマンド：決済サービスからの支払い結果を反映する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyPaymentOutcome {
    pub rent_request_id: RentRequestId,
    pub outcome: PaymentOutcome,
    pub received_at: DateTime<Utc>,
}

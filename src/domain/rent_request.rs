use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ListingId, PaymentOutcome, PaymentStatus, RentRequestId, RentRequestStatus, RentalPeriod,
    RequestRentError, TransitionError, UserId, commands::CreateRentRequest,
};

/// RentRequest集約 - 1件の出品に対する1回の貸出申し込み
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentRequest {
    // 識別子
    pub id: RentRequestId,

    // 当事者と対象（作成後は不変）
    pub renter_id: UserId,
    pub owner_id: UserId,
    pub listing_id: ListingId,

    // 貸出条件
    pub period: RentalPeriod,
    pub total_price: i64,

    // 状態
    pub status: RentRequestStatus,
    pub payment_status: PaymentStatus,

    // 監査情報
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 永続化前の貸出リクエスト（IDはリポジトリが採番する）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRentRequest {
    pub renter_id: UserId,
    pub owner_id: UserId,
    pub listing_id: ListingId,
    pub period: RentalPeriod,
    pub total_price: i64,
    pub status: RentRequestStatus,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewRentRequest {
    /// 採番されたIDを付与して集約にする
    pub fn with_id(self, id: RentRequestId) -> RentRequest {
        RentRequest {
            id,
            renter_id: self.renter_id,
            owner_id: self.owner_id,
            listing_id: self.listing_id,
            period: self.period,
            total_price: self.total_price,
            status: self.status,
            payment_status: self.payment_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// 支払い結果を反映した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSettlement {
    /// 既に支払い成功済み（何もしない）
    AlreadySettled,
    /// 支払い成功：Paidへ遷移
    Paid(RentRequest),
    /// 支払い取り消し：Confirmedのまま再支払い可能
    Canceled(RentRequest),
}

/// 純粋関数：貸出リクエストを作成する
///
/// ビジネスルール：
/// - 開始日時 < 終了日時
/// - 日数（24時間単位の切り捨て）が1日以上
/// - 合計金額 = 日数 × 1日あたりの料金
/// - 貸し手IDは出品情報から決まる（呼び出し元は指定できない）
/// - 状態はAwaitingConfirmation、支払いはPending
///
/// 副作用なし。
pub fn request_rent(
    cmd: &CreateRentRequest,
    owner_id: UserId,
    price_per_day: i64,
) -> Result<NewRentRequest, RequestRentError> {
    let period = RentalPeriod::new(cmd.start_date, cmd.end_date)?;

    let days = period.days();
    if days <= 0 {
        return Err(RequestRentError::PeriodTooShort);
    }

    if price_per_day < 0 {
        return Err(RequestRentError::NegativePrice);
    }

    let total_price = days
        .checked_mul(price_per_day)
        .ok_or(RequestRentError::PriceOverflow)?;

    Ok(NewRentRequest {
        renter_id: cmd.renter_id,
        owner_id,
        listing_id: cmd.listing_id,
        period,
        total_price,
        status: RentRequestStatus::AwaitingConfirmation,
        payment_status: PaymentStatus::Pending,
        created_at: cmd.requested_at,
        updated_at: cmd.requested_at,
    })
}

/// 純粋関数：貸し手が承認する
///
/// ビジネスルール：
/// - 呼び出し元が貸し手であること
/// - AwaitingConfirmationからのみ承認可能
pub fn confirm(
    request: &RentRequest,
    caller: UserId,
    confirmed_at: DateTime<Utc>,
) -> Result<RentRequest, TransitionError> {
    if request.owner_id != caller {
        return Err(TransitionError::NotOwner);
    }

    if request.status != RentRequestStatus::AwaitingConfirmation {
        return Err(TransitionError::InvalidState(request.status));
    }

    Ok(RentRequest {
        status: RentRequestStatus::Confirmed,
        updated_at: confirmed_at,
        ..request.clone()
    })
}

/// 純粋関数：支払いを開始できるか検証する
///
/// 状態は変えない。決済セッションの作成は外部で行い、
/// 結果はコールバック（`apply_payment_outcome`）で反映する。
pub fn authorize_payment(request: &RentRequest, caller: UserId) -> Result<(), TransitionError> {
    if request.renter_id != caller {
        return Err(TransitionError::NotRenter);
    }

    if request.status != RentRequestStatus::Confirmed {
        return Err(TransitionError::InvalidState(request.status));
    }

    Ok(())
}

/// 純粋関数：決済サービスの支払い結果を反映する
///
/// ビジネスルール：
/// - 既に支払い成功済みなら何もしない（コールバックの重複配信）
/// - Confirmed以外では反映しない（順序の入れ替わったコールバック）
/// - success: Paid / Success
/// - cancel: Confirmedのまま / Canceled
pub fn apply_payment_outcome(
    request: &RentRequest,
    outcome: PaymentOutcome,
    received_at: DateTime<Utc>,
) -> Result<PaymentSettlement, TransitionError> {
    if request.payment_status == PaymentStatus::Success {
        return Ok(PaymentSettlement::AlreadySettled);
    }

    if request.status != RentRequestStatus::Confirmed {
        return Err(TransitionError::InvalidState(request.status));
    }

    let settlement = match outcome {
        PaymentOutcome::Success => PaymentSettlement::Paid(RentRequest {
            status: RentRequestStatus::Paid,
            payment_status: PaymentStatus::Success,
            updated_at: received_at,
            ..request.clone()
        }),
        PaymentOutcome::Cancel => PaymentSettlement::Canceled(RentRequest {
            payment_status: PaymentStatus::Canceled,
            updated_at: received_at,
            ..request.clone()
        }),
    };

    Ok(settlement)
}

/// 純粋関数：借り手が取り消す
///
/// ビジネスルール：
/// - 呼び出し元が借り手であること
/// - AwaitingConfirmationまたはConfirmedからのみ取り消し可能
pub fn cancel(
    request: &RentRequest,
    caller: UserId,
    canceled_at: DateTime<Utc>,
) -> Result<RentRequest, TransitionError> {
    if request.renter_id != caller {
        return Err(TransitionError::NotRenter);
    }

    if !request.status.is_live() {
        return Err(TransitionError::InvalidState(request.status));
    }

    Ok(RentRequest {
        status: RentRequestStatus::Canceled,
        updated_at: canceled_at,
        ..request.clone()
    })
}

/// 純粋関数：競合により却下する
pub fn reject(
    request: &RentRequest,
    rejected_at: DateTime<Utc>,
) -> Result<RentRequest, TransitionError> {
    if !request.status.is_live() {
        return Err(TransitionError::InvalidState(request.status));
    }

    Ok(RentRequest {
        status: RentRequestStatus::Rejected,
        updated_at: rejected_at,
        ..request.clone()
    })
}

/// 競合による却下結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// 却下前の状態（条件付き書き込みの期待値に使う）
    pub previous_status: RentRequestStatus,
    pub rejected: RentRequest,
}

/// 純粋関数：支払い済みリクエストと競合する候補をすべて却下する
///
/// 候補のうち、同じ出品・期間が重なる・未決着（確認待ち/承認済み）・
/// 支払い済みリクエスト自身ではない、をすべて満たすものを却下して返す。
/// 条件を満たさない候補は結果に含めない。
pub fn reject_competing(
    paid: &RentRequest,
    candidates: &[RentRequest],
    rejected_at: DateTime<Utc>,
) -> Vec<Rejection> {
    candidates
        .iter()
        .filter(|c| c.id != paid.id)
        .filter(|c| c.listing_id == paid.listing_id)
        .filter(|c| c.period.overlaps(&paid.period))
        .filter_map(|c| {
            reject(c, rejected_at).ok().map(|rejected| Rejection {
                previous_status: c.status,
                rejected,
            })
        })
        .collect()
}

/// 純粋関数：閲覧権限の判定（借り手または貸し手）
pub fn can_view(request: &RentRequest, caller: UserId) -> bool {
    request.renter_id == caller || request.owner_id == caller
}

use crate::domain::{
    self, PaymentSettlement, RentRequest, RentRequestId, RentRequestStatus, RentalPeriod,
    RequestRentError, commands::*, value_objects::*,
};
use crate::ports::*;
use futures::future::try_join_all;
use std::sync::Arc;

use super::errors::{RentRequestApplicationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// 振る舞い（メソッド）は持たず、純粋な関数に依存関係を渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub repository: Arc<dyn RentRequestRepository>,
    pub listing_service: Arc<dyn ListingService>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    /// 決済サービスに渡すコールバックURLの基底（例: `http://localhost:8082`）
    pub callback_base_url: String,
}

/// 支払いコールバックの処理結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentCallbackOutcome {
    /// 支払い完了。競合していたリクエストを却下した
    Paid { rejected: Vec<RentRequestId> },
    /// 支払いが取り消された。再支払い可能
    PaymentCanceled,
    /// 既に支払い完了済み（重複配信）
    AlreadyProcessed,
}

/// リポジトリから貸出リクエストを取得するヘルパー関数
///
/// # エラー
/// - RepositoryError: 読み込み失敗
/// - RentRequestNotFound: 存在しない
async fn load_rent_request(
    repository: &Arc<dyn RentRequestRepository>,
    id: RentRequestId,
) -> Result<RentRequest> {
    repository
        .get_by_id(id)
        .await
        .map_err(RentRequestApplicationError::RepositoryError)?
        .ok_or(RentRequestApplicationError::RentRequestNotFound)
}

/// 状態遷移を条件付きで保存するヘルパー関数
///
/// 読み取った時点の状態（`expected_status`）から変わっていれば
/// ConcurrentModificationを返す。
async fn persist_transition(
    repository: &Arc<dyn RentRequestRepository>,
    updated: &RentRequest,
    expected_status: RentRequestStatus,
) -> Result<()> {
    let applied = repository
        .replace(updated, expected_status)
        .await
        .map_err(RentRequestApplicationError::RepositoryError)?;

    if !applied {
        tracing::warn!(
            rent_request_id = %updated.id,
            expected = %expected_status,
            "Rent request changed between read and write"
        );
        return Err(RentRequestApplicationError::ConcurrentModification);
    }

    Ok(())
}

/// 決済サービスに渡すコールバックURL
fn callback_url(base_url: &str, id: RentRequestId) -> String {
    format!(
        "{}/rent-request/callback?requestId={}",
        base_url.trim_end_matches('/'),
        id
    )
}

/// 貸出リクエストを作成する
///
/// ビジネスルール：
/// - 開始日時 < 終了日時
/// - 同じ出品で期間の重なる支払い済みリクエストがないこと
/// - 出品が存在すること（料金・貸し手IDは出品サービスから取得）
/// - 期間は1日以上
///
/// 出品サービスの失敗時はレコードを作成しない。
///
/// # 戻り値
/// 作成された貸出リクエスト
pub async fn create_rent_request(
    deps: &ServiceDependencies,
    cmd: CreateRentRequest,
) -> Result<RentRequest> {
    // 1. 期間の検証
    let period = RentalPeriod::new(cmd.start_date, cmd.end_date).map_err(RequestRentError::from)?;

    // 2. 支払い済みリクエストとの重なり確認
    let paid_overlaps = deps
        .repository
        .get_overlapping(cmd.listing_id, RentRequestStatus::Paid, &period)
        .await
        .map_err(RentRequestApplicationError::RepositoryError)?;

    if !paid_overlaps.is_empty() {
        tracing::warn!(
            listing_id = %cmd.listing_id,
            renter_id = %cmd.renter_id,
            "Rent request overlaps a paid request"
        );
        return Err(RentRequestApplicationError::PaidRequestConflict);
    }

    // 3. 出品情報の取得
    let listing = deps.listing_service.get_listing(cmd.listing_id).await?;

    // 4. ドメイン層の純粋関数を呼び出し
    let new_request =
        domain::rent_request::request_rent(&cmd, listing.owner_id, listing.price_per_day)?;

    // 5. 保存
    let id = deps
        .repository
        .add(new_request.clone())
        .await
        .map_err(RentRequestApplicationError::RepositoryError)?;

    tracing::info!(
        rent_request_id = %id,
        listing_id = %cmd.listing_id,
        renter_id = %cmd.renter_id,
        total_price = new_request.total_price,
        "Rent request created"
    );

    Ok(new_request.with_id(id))
}

/// 貸出リクエストを取得する
///
/// 借り手または貸し手のみ閲覧できる。
pub async fn get_rent_request(
    deps: &ServiceDependencies,
    caller: UserId,
    id: RentRequestId,
) -> Result<RentRequest> {
    let request = load_rent_request(&deps.repository, id).await?;

    if !domain::rent_request::can_view(&request, caller) {
        return Err(RentRequestApplicationError::Forbidden(
            "only the renter or the owner can view this rent request".to_string(),
        ));
    }

    Ok(request)
}

/// 貸出リクエストを承認する
///
/// ビジネスルール：
/// - 呼び出し元が貸し手であること
/// - 確認待ち状態であること
pub async fn confirm_rent_request(
    deps: &ServiceDependencies,
    cmd: ConfirmRentRequest,
) -> Result<RentRequest> {
    let current = load_rent_request(&deps.repository, cmd.rent_request_id).await?;

    let confirmed = domain::rent_request::confirm(&current, cmd.owner_id, cmd.confirmed_at)
        .map_err(|e| RentRequestApplicationError::from_transition(e, "confirm"))?;

    persist_transition(&deps.repository, &confirmed, current.status).await?;

    tracing::info!(rent_request_id = %confirmed.id, "Rent request confirmed");

    Ok(confirmed)
}

/// 支払いを開始する
///
/// 決済セッションを作成してリダイレクトURLを返す。状態は変更しない。
/// 支払い結果は`handle_payment_callback`で反映される。
///
/// ビジネスルール：
/// - 呼び出し元が借り手であること
/// - 承認済み状態であること
pub async fn pay_rent_request(deps: &ServiceDependencies, cmd: PayRentRequest) -> Result<String> {
    let request = load_rent_request(&deps.repository, cmd.rent_request_id).await?;

    domain::rent_request::authorize_payment(&request, cmd.renter_id)
        .map_err(|e| RentRequestApplicationError::from_transition(e, "pay"))?;

    let session = PaymentSessionRequest {
        rent_request_id: request.id,
        amount: request.total_price,
        callback_url: callback_url(&deps.callback_base_url, request.id),
    };

    let redirect_url = deps
        .payment_gateway
        .create_payment_session(session)
        .await
        .map_err(RentRequestApplicationError::PaymentServiceError)?;

    tracing::info!(
        rent_request_id = %request.id,
        amount = request.total_price,
        "Payment session created"
    );

    Ok(redirect_url)
}

/// 決済サービスからの支払い結果を反映する
///
/// ビジネスルール：
/// - 既に支払い完了済みなら何もしない（冪等）
/// - 承認済み状態でなければ反映しない
/// - success: 支払い完了にし、同じ出品で期間の重なる
///   確認待ち・承認済みのリクエストをすべて却下する
/// - cancel: 支払い状態のみ取り消しにする（再支払い可能）
///
/// # 一貫性保証
///
/// 支払い完了と競合リクエストの却下は1トランザクションで保存する。
/// 途中で他の操作と競合した場合は何も保存しない。
pub async fn handle_payment_callback(
    deps: &ServiceDependencies,
    cmd: ApplyPaymentOutcome,
) -> Result<PaymentCallbackOutcome> {
    let current = load_rent_request(&deps.repository, cmd.rent_request_id).await?;

    let settlement =
        domain::rent_request::apply_payment_outcome(&current, cmd.outcome, cmd.received_at)
            .map_err(|e| RentRequestApplicationError::from_transition(e, "settle payment for"))?;

    let paid = match settlement {
        PaymentSettlement::AlreadySettled => {
            tracing::debug!(rent_request_id = %current.id, "Payment already settled");
            return Ok(PaymentCallbackOutcome::AlreadyProcessed);
        }
        PaymentSettlement::Canceled(canceled) => {
            persist_transition(&deps.repository, &canceled, current.status).await?;
            tracing::info!(rent_request_id = %canceled.id, "Payment canceled");
            return Ok(PaymentCallbackOutcome::PaymentCanceled);
        }
        PaymentSettlement::Paid(paid) => paid,
    };

    // 競合候補：同じ出品で期間が重なる確認待ち・承認済みのリクエスト
    let lookups = RentRequestStatus::LIVE.iter().map(|status| {
        deps.repository
            .get_overlapping(paid.listing_id, *status, &paid.period)
    });
    let candidates: Vec<RentRequest> = try_join_all(lookups)
        .await
        .map_err(RentRequestApplicationError::RepositoryError)?
        .into_iter()
        .flatten()
        .collect();

    let rejections = domain::rent_request::reject_competing(&paid, &candidates, cmd.received_at);

    let mut transitions = Vec::with_capacity(rejections.len() + 1);
    transitions.push(StatusTransition {
        record: paid.clone(),
        expected_status: current.status,
    });
    transitions.extend(rejections.iter().map(|r| StatusTransition {
        record: r.rejected.clone(),
        expected_status: r.previous_status,
    }));

    let applied = deps
        .repository
        .replace_batch(&transitions)
        .await
        .map_err(RentRequestApplicationError::RepositoryError)?;

    if !applied {
        // 同じコールバックの並行配信に負けた場合は冪等に成功扱い
        let latest = load_rent_request(&deps.repository, paid.id).await?;
        if latest.payment_status == PaymentStatus::Success {
            return Ok(PaymentCallbackOutcome::AlreadyProcessed);
        }
        tracing::warn!(
            rent_request_id = %paid.id,
            "Payment reconciliation lost a race, nothing was written"
        );
        return Err(RentRequestApplicationError::ConcurrentModification);
    }

    let rejected: Vec<RentRequestId> = rejections.iter().map(|r| r.rejected.id).collect();

    tracing::info!(
        rent_request_id = %paid.id,
        listing_id = %paid.listing_id,
        rejected = rejected.len(),
        "Rent request paid"
    );
    for id in &rejected {
        tracing::warn!(rent_request_id = %id, paid_by = %paid.id, "Rent request rejected");
    }

    Ok(PaymentCallbackOutcome::Paid { rejected })
}

/// 貸出リクエストを取り消す
///
/// ビジネスルール：
/// - 呼び出し元が借り手であること
/// - 確認待ち・承認済み状態であること
pub async fn cancel_rent_request(
    deps: &ServiceDependencies,
    cmd: CancelRentRequest,
) -> Result<RentRequest> {
    let current = load_rent_request(&deps.repository, cmd.rent_request_id).await?;

    let canceled = domain::rent_request::cancel(&current, cmd.renter_id, cmd.canceled_at)
        .map_err(|e| RentRequestApplicationError::from_transition(e, "cancel"))?;

    persist_transition(&deps.repository, &canceled, current.status).await?;

    tracing::info!(rent_request_id = %canceled.id, "Rent request canceled");

    Ok(canceled)
}

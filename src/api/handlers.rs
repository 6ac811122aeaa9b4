use crate::application::rent_request::{
    ListRentRequestsQuery, PaymentCallbackOutcome, RentRequestApplicationError,
    ServiceDependencies, cancel_rent_request as execute_cancel, confirm_rent_request as execute_confirm,
    create_rent_request as execute_create, get_rent_request as execute_get,
    handle_payment_callback as execute_payment_callback, list_owner_rent_requests,
    list_renter_rent_requests, pay_rent_request as execute_pay,
};
use crate::domain::{
    commands::{
        ApplyPaymentOutcome, CancelRentRequest, ConfirmRentRequest, CreateRentRequest,
        PayRentRequest,
    },
    value_objects::{ListingId, PaymentOutcome, RentRequestId},
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::{
    auth::{AuthenticatedUser, JwtVerifier},
    error::ApiError,
    extract::{ApiJson, ApiPath},
    types::{
        CreateRentRequestBody, MessageResponse, PaymentCallbackQuery, PaymentRedirectResponse,
        RentRequestCreatedResponse, RentRequestResponse,
    },
};

const PAYMENT_SUCCESS_MESSAGE: &str = "Your payment was processed successfully!";
const PAYMENT_CANCELED_MESSAGE: &str = "Your payment has been canceled";

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    pub jwt: JwtVerifier,
}

// ============================================================================
// Command handlers
// ============================================================================

/// POST /rent-request - 貸出リクエストを作成
///
/// 強制されるビジネスルール:
/// - 開始日時が終了日時より前であること
/// - 同じ出品で期間の重なる支払い済みリクエストがないこと
/// - 期間が1日以上であること
pub async fn create_rent_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(renter_id): AuthenticatedUser,
    ApiJson(body): ApiJson<CreateRentRequestBody>,
) -> Result<(StatusCode, Json<RentRequestCreatedResponse>), ApiError> {
    let cmd = CreateRentRequest {
        renter_id,
        listing_id: ListingId::new(body.listing_id),
        start_date: body.start_date,
        end_date: body.end_date,
        requested_at: chrono::Utc::now(),
    };

    let created = execute_create(&state.service_deps, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(RentRequestCreatedResponse::from(&created)),
    ))
}

/// PUT /rent-request/:id/confirm - 貸し手が承認
pub async fn confirm_rent_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let cmd = ConfirmRentRequest {
        rent_request_id: RentRequestId::new(id),
        owner_id,
        confirmed_at: chrono::Utc::now(),
    };

    execute_confirm(&state.service_deps, cmd).await?;

    Ok(Json(MessageResponse::new("Rent request confirmed")))
}

/// PUT /rent-request/:id/pay - 借り手が支払いを開始
///
/// 決済ページへのリダイレクトURLを返す。状態は変わらない。
pub async fn pay_rent_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(renter_id): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<PaymentRedirectResponse>, ApiError> {
    let cmd = PayRentRequest {
        rent_request_id: RentRequestId::new(id),
        renter_id,
    };

    let redirect_url = execute_pay(&state.service_deps, cmd).await?;

    Ok(Json(PaymentRedirectResponse { redirect_url }))
}

/// PUT /rent-request/:id/cancel - 借り手が取り消し
pub async fn cancel_rent_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(renter_id): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let cmd = CancelRentRequest {
        rent_request_id: RentRequestId::new(id),
        renter_id,
        canceled_at: chrono::Utc::now(),
    };

    execute_cancel(&state.service_deps, cmd).await?;

    Ok(Json(MessageResponse::new("Rent request canceled")))
}

/// GET /rent-request/callback?requestId=..&status=success|cancel
///
/// 決済サービスから呼ばれる。認証なし。
pub async fn payment_callback(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaymentCallbackQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request_id = query
        .request_id
        .as_deref()
        .and_then(|id| id.trim().parse::<i64>().ok())
        .ok_or_else(|| {
            RentRequestApplicationError::InvalidInput("requestId must be a number".to_string())
        })?;

    let outcome = query
        .status
        .as_deref()
        .unwrap_or_default()
        .parse::<PaymentOutcome>()
        .map_err(RentRequestApplicationError::InvalidInput)?;

    let cmd = ApplyPaymentOutcome {
        rent_request_id: RentRequestId::new(request_id),
        outcome,
        received_at: chrono::Utc::now(),
    };

    let message = match execute_payment_callback(&state.service_deps, cmd).await? {
        PaymentCallbackOutcome::Paid { .. } | PaymentCallbackOutcome::AlreadyProcessed => {
            PAYMENT_SUCCESS_MESSAGE
        }
        PaymentCallbackOutcome::PaymentCanceled => PAYMENT_CANCELED_MESSAGE,
    };

    Ok(Json(MessageResponse::new(message)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /rent-request/:id - 借り手または貸し手が詳細を取得
pub async fn get_rent_request(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<RentRequestResponse>, ApiError> {
    let request = execute_get(&state.service_deps, caller, RentRequestId::new(id)).await?;

    Ok(Json(RentRequestResponse::from(request)))
}

/// GET /rent-request/owner - 貸し手として受けたリクエスト一覧
///
/// クエリパラメータ:
/// - status: ステータスでフィルタリング（オプション）
/// - date: 作成日の範囲 `YYYY-MM-DD,YYYY-MM-DD`（オプション）
/// - page: 1始まり、1ページ10件
pub async fn list_owner_requests(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(owner_id): AuthenticatedUser,
    Query(query): Query<ListRentRequestsQuery>,
) -> Result<Json<Vec<RentRequestResponse>>, ApiError> {
    let requests = list_owner_rent_requests(&state.service_deps, owner_id, &query).await?;

    Ok(Json(
        requests.into_iter().map(RentRequestResponse::from).collect(),
    ))
}

/// GET /rent-request/renter - 借り手として出したリクエスト一覧
pub async fn list_renter_requests(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(renter_id): AuthenticatedUser,
    Query(query): Query<ListRentRequestsQuery>,
) -> Result<Json<Vec<RentRequestResponse>>, ApiError> {
    let requests = list_renter_rent_requests(&state.service_deps, renter_id, &query).await?;

    Ok(Json(
        requests.into_iter().map(RentRequestResponse::from).collect(),
    ))
}

use chrono::{Duration, Utc};
use rent_request_service::application::rent_request::{
    ListRentRequestsQuery, PaymentCallbackOutcome, RentRequestApplicationError,
    cancel_rent_request, confirm_rent_request, create_rent_request, get_rent_request,
    handle_payment_callback, list_owner_rent_requests, list_renter_rent_requests,
    pay_rent_request,
};
use rent_request_service::adapters::mock::RentRequestRepository as InMemoryRentRequestRepository;
use rent_request_service::application::rent_request::ServiceDependencies;
use rent_request_service::domain::commands::*;
use rent_request_service::domain::value_objects::*;
use rent_request_service::domain::{NewRentRequest, RentRequest};
use rent_request_service::ports::rent_request_repository::{self, PageRequest, RentRequestFilter};
use rent_request_service::ports::{RentRequestRepository, StatusTransition};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

mod common;

use common::*;

// ============================================================================
// 読み取りと書き込みの間に別の操作を割り込ませるリポジトリ
// ============================================================================

type Interleaved = Box<dyn FnOnce(&InMemoryRentRequestRepository) + Send>;

/// インメモリリポジトリへの委譲に加え、最初の書き込みの直前に
/// 登録された操作を1回だけ実行する。一覧取得の回数も数える。
struct InterleavingRepository {
    inner: Arc<InMemoryRentRequestRepository>,
    before_write: Mutex<Option<Interleaved>>,
    list_calls: AtomicUsize,
}

impl InterleavingRepository {
    fn new(inner: Arc<InMemoryRentRequestRepository>) -> Self {
        Self {
            inner,
            before_write: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
        }
    }

    fn interleave(&self, op: impl FnOnce(&InMemoryRentRequestRepository) + Send + 'static) {
        *self.before_write.lock().unwrap() = Some(Box::new(op));
    }

    fn run_interleaved(&self) {
        let op = self.before_write.lock().unwrap().take();
        if let Some(op) = op {
            op(&self.inner);
        }
    }

    fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RentRequestRepository for InterleavingRepository {
    async fn add(&self, new_request: NewRentRequest) -> rent_request_repository::Result<RentRequestId> {
        self.inner.add(new_request).await
    }

    async fn replace(
        &self,
        record: &RentRequest,
        expected_status: RentRequestStatus,
    ) -> rent_request_repository::Result<bool> {
        self.run_interleaved();
        self.inner.replace(record, expected_status).await
    }

    async fn replace_batch(
        &self,
        transitions: &[StatusTransition],
    ) -> rent_request_repository::Result<bool> {
        self.run_interleaved();
        self.inner.replace_batch(transitions).await
    }

    async fn get_by_id(
        &self,
        id: RentRequestId,
    ) -> rent_request_repository::Result<Option<RentRequest>> {
        self.inner.get_by_id(id).await
    }

    async fn get_overlapping(
        &self,
        listing_id: ListingId,
        status: RentRequestStatus,
        period: &RentalPeriod,
    ) -> rent_request_repository::Result<Vec<RentRequest>> {
        self.inner.get_overlapping(listing_id, status, period).await
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> rent_request_repository::Result<Vec<RentRequest>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_by_owner(owner_id, filter, page).await
    }

    async fn list_by_renter(
        &self,
        renter_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> rent_request_repository::Result<Vec<RentRequest>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.list_by_renter(renter_id, filter, page).await
    }
}

/// 既存のコンテキストのリポジトリを割り込み可能なものに差し替えた依存関係
fn interleaving_deps(ctx: &TestContext) -> (Arc<InterleavingRepository>, ServiceDependencies) {
    let repository = Arc::new(InterleavingRepository::new(ctx.repository.clone()));
    let deps = ServiceDependencies {
        repository: repository.clone(),
        ..ctx.deps.clone()
    };
    (repository, deps)
}

// ============================================================================
// ヘルパー
// ============================================================================

async fn confirm(ctx: &TestContext, request: &RentRequest) -> RentRequest {
    confirm_rent_request(
        &ctx.deps,
        ConfirmRentRequest {
            rent_request_id: request.id,
            owner_id: OWNER,
            confirmed_at: Utc::now(),
        },
    )
    .await
    .expect("Failed to confirm")
}

async fn callback(
    ctx: &TestContext,
    id: RentRequestId,
    outcome: PaymentOutcome,
) -> Result<PaymentCallbackOutcome, RentRequestApplicationError> {
    handle_payment_callback(
        &ctx.deps,
        ApplyPaymentOutcome {
            rent_request_id: id,
            outcome,
            received_at: Utc::now(),
        },
    )
    .await
}

async fn stored(ctx: &TestContext, id: RentRequestId) -> RentRequest {
    ctx.repository
        .all()
        .into_iter()
        .find(|r| r.id == id)
        .expect("record should exist")
}

fn query(status: Option<&str>, date: Option<&str>, page: Option<&str>) -> ListRentRequestsQuery {
    ListRentRequestsQuery {
        status: status.map(String::from),
        date: date.map(String::from),
        page: page.map(String::from),
    }
}

// ============================================================================
// 作成
// ============================================================================

#[tokio::test]
async fn test_create_computes_total_price_from_listing() {
    let ctx = setup();

    let created = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    assert_eq!(created.total_price, 300);
    assert_eq!(created.status, RentRequestStatus::AwaitingConfirmation);
    assert_eq!(created.payment_status, PaymentStatus::Pending);
    assert_eq!(created.owner_id, OWNER);
    assert_eq!(created.renter_id, RENTER);
    assert_eq!(stored(&ctx, created.id).await, created);
}

#[tokio::test]
async fn test_create_floors_partial_days() {
    let ctx = setup();

    let created = create_request(
        &ctx.deps,
        RENTER,
        LISTING,
        day(1),
        day(3) + Duration::hours(20),
    )
    .await;

    assert_eq!(created.total_price, 200);
}

#[tokio::test]
async fn test_create_rejects_invalid_periods() {
    let ctx = setup();

    let reversed =
        create_rent_request(&ctx.deps, create_command(RENTER, LISTING, day(4), day(1))).await;
    assert!(matches!(
        reversed,
        Err(RentRequestApplicationError::InvalidInput(_))
    ));

    let same_instant =
        create_rent_request(&ctx.deps, create_command(RENTER, LISTING, day(1), day(1))).await;
    assert!(matches!(
        same_instant,
        Err(RentRequestApplicationError::InvalidInput(_))
    ));

    let under_a_day = create_rent_request(
        &ctx.deps,
        create_command(RENTER, LISTING, day(1), day(1) + Duration::hours(12)),
    )
    .await;
    assert!(matches!(
        under_a_day,
        Err(RentRequestApplicationError::InvalidInput(_))
    ));

    assert!(ctx.repository.all().is_empty());
}

#[tokio::test]
async fn test_create_conflicts_with_overlapping_paid_request() {
    let ctx = setup();
    let paid = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    confirm(&ctx, &paid).await;
    callback(&ctx, paid.id, PaymentOutcome::Success)
        .await
        .unwrap();

    // 終了日と開始日が同じ日時でも重なりとみなす
    let overlapping =
        create_rent_request(&ctx.deps, create_command(OTHER_RENTER, LISTING, day(4), day(6)))
            .await;
    assert!(matches!(
        overlapping,
        Err(RentRequestApplicationError::PaidRequestConflict)
    ));

    // 重ならない期間・別の出品は作成できる
    create_request(&ctx.deps, OTHER_RENTER, LISTING, day(5), day(7)).await;
    create_request(&ctx.deps, OTHER_RENTER, OTHER_LISTING, day(1), day(4)).await;
}

#[tokio::test]
async fn test_create_allows_overlap_with_unpaid_requests() {
    let ctx = setup();
    create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    let second = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(2), day(5)).await;

    assert_eq!(second.status, RentRequestStatus::AwaitingConfirmation);
    assert_eq!(ctx.repository.all().len(), 2);
}

#[tokio::test]
async fn test_create_with_unknown_listing_leaves_no_record() {
    let ctx = setup();

    let result = create_rent_request(
        &ctx.deps,
        create_command(RENTER, ListingId::new(404), day(1), day(4)),
    )
    .await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::ListingNotFound)
    ));
    assert!(ctx.repository.all().is_empty());
}

#[tokio::test]
async fn test_create_with_listing_service_down_leaves_no_record() {
    let ctx = setup();
    ctx.listing_service.set_unavailable(true);

    let result =
        create_rent_request(&ctx.deps, create_command(RENTER, LISTING, day(1), day(4))).await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::ListingServiceError(_))
    ));
    assert!(ctx.repository.all().is_empty());
}

// ============================================================================
// 承認
// ============================================================================

#[tokio::test]
async fn test_confirm_only_by_owner_and_only_once() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    let by_renter = confirm_rent_request(
        &ctx.deps,
        ConfirmRentRequest {
            rent_request_id: request.id,
            owner_id: RENTER,
            confirmed_at: Utc::now(),
        },
    )
    .await;
    assert!(matches!(
        by_renter,
        Err(RentRequestApplicationError::Forbidden(_))
    ));
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::AwaitingConfirmation
    );

    let confirmed = confirm(&ctx, &request).await;
    assert_eq!(confirmed.status, RentRequestStatus::Confirmed);
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::Confirmed
    );

    let again = confirm_rent_request(
        &ctx.deps,
        ConfirmRentRequest {
            rent_request_id: request.id,
            owner_id: OWNER,
            confirmed_at: Utc::now(),
        },
    )
    .await;
    assert!(matches!(
        again,
        Err(RentRequestApplicationError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_confirm_unknown_request() {
    let ctx = setup();

    let result = confirm_rent_request(
        &ctx.deps,
        ConfirmRentRequest {
            rent_request_id: RentRequestId::new(42),
            owner_id: OWNER,
            confirmed_at: Utc::now(),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::RentRequestNotFound)
    ));
}

// ============================================================================
// 支払い開始
// ============================================================================

#[tokio::test]
async fn test_pay_requires_confirmation_and_renter() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    let too_early = pay_rent_request(
        &ctx.deps,
        PayRentRequest {
            rent_request_id: request.id,
            renter_id: RENTER,
        },
    )
    .await;
    assert!(matches!(
        too_early,
        Err(RentRequestApplicationError::InvalidState(_))
    ));

    confirm(&ctx, &request).await;

    let by_owner = pay_rent_request(
        &ctx.deps,
        PayRentRequest {
            rent_request_id: request.id,
            renter_id: OWNER,
        },
    )
    .await;
    assert!(matches!(
        by_owner,
        Err(RentRequestApplicationError::Forbidden(_))
    ));
    assert!(ctx.payment_gateway.sessions().is_empty());
}

#[tokio::test]
async fn test_pay_creates_payment_session_without_changing_state() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    confirm(&ctx, &request).await;

    let redirect_url = pay_rent_request(
        &ctx.deps,
        PayRentRequest {
            rent_request_id: request.id,
            renter_id: RENTER,
        },
    )
    .await
    .unwrap();

    assert_eq!(
        redirect_url,
        rent_request_service::adapters::mock::PaymentGateway::redirect_url_for(request.id.value())
    );

    let sessions = ctx.payment_gateway.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].rent_request_id, request.id);
    assert_eq!(sessions[0].amount, 300);
    assert_eq!(
        sessions[0].callback_url,
        format!(
            "{}/rent-request/callback?requestId={}",
            CALLBACK_BASE_URL, request.id
        )
    );

    let after = stored(&ctx, request.id).await;
    assert_eq!(after.status, RentRequestStatus::Confirmed);
    assert_eq!(after.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_pay_surfaces_payment_service_failure() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    confirm(&ctx, &request).await;
    ctx.payment_gateway.set_failing(true);

    let result = pay_rent_request(
        &ctx.deps,
        PayRentRequest {
            rent_request_id: request.id,
            renter_id: RENTER,
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::PaymentServiceError(_))
    ));
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::Confirmed
    );
}

// ============================================================================
// 支払いコールバック
// ============================================================================

#[tokio::test]
async fn test_success_callback_pays_and_rejects_overlapping_live_requests() {
    let ctx = setup();
    let winner = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    let awaiting = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(3), day(6)).await;
    let touching = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(4), day(5)).await;
    let later = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(10), day(12)).await;
    let elsewhere = create_request(&ctx.deps, OTHER_RENTER, OTHER_LISTING, day(1), day(4)).await;
    let withdrawn = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(2), day(3)).await;

    confirm(&ctx, &winner).await;
    confirm(&ctx, &touching).await;
    cancel_rent_request(
        &ctx.deps,
        CancelRentRequest {
            rent_request_id: withdrawn.id,
            renter_id: OTHER_RENTER,
            canceled_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let outcome = callback(&ctx, winner.id, PaymentOutcome::Success)
        .await
        .unwrap();

    let PaymentCallbackOutcome::Paid { mut rejected } = outcome else {
        panic!("expected Paid, got {:?}", outcome);
    };
    rejected.sort();
    assert_eq!(rejected, vec![awaiting.id, touching.id]);

    let paid = stored(&ctx, winner.id).await;
    assert_eq!(paid.status, RentRequestStatus::Paid);
    assert_eq!(paid.payment_status, PaymentStatus::Success);

    assert_eq!(
        stored(&ctx, awaiting.id).await.status,
        RentRequestStatus::Rejected
    );
    assert_eq!(
        stored(&ctx, touching.id).await.status,
        RentRequestStatus::Rejected
    );
    assert_eq!(
        stored(&ctx, later.id).await.status,
        RentRequestStatus::AwaitingConfirmation
    );
    assert_eq!(
        stored(&ctx, elsewhere.id).await.status,
        RentRequestStatus::AwaitingConfirmation
    );
    assert_eq!(
        stored(&ctx, withdrawn.id).await.status,
        RentRequestStatus::Canceled
    );
}

#[tokio::test]
async fn test_duplicate_success_callback_is_idempotent() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    confirm(&ctx, &request).await;
    callback(&ctx, request.id, PaymentOutcome::Success)
        .await
        .unwrap();
    let after_first = stored(&ctx, request.id).await;

    let outcome = callback(&ctx, request.id, PaymentOutcome::Success)
        .await
        .unwrap();

    assert_eq!(outcome, PaymentCallbackOutcome::AlreadyProcessed);
    assert_eq!(stored(&ctx, request.id).await, after_first);
}

#[tokio::test]
async fn test_cancel_callback_never_pays_and_allows_retry() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    let competitor = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(2), day(3)).await;
    confirm(&ctx, &request).await;

    let outcome = callback(&ctx, request.id, PaymentOutcome::Cancel)
        .await
        .unwrap();
    assert_eq!(outcome, PaymentCallbackOutcome::PaymentCanceled);

    let after_cancel = stored(&ctx, request.id).await;
    assert_eq!(after_cancel.status, RentRequestStatus::Confirmed);
    assert_eq!(after_cancel.payment_status, PaymentStatus::Canceled);
    assert_eq!(
        stored(&ctx, competitor.id).await.status,
        RentRequestStatus::AwaitingConfirmation
    );

    // 再度支払いを開始できる
    pay_rent_request(
        &ctx.deps,
        PayRentRequest {
            rent_request_id: request.id,
            renter_id: RENTER,
        },
    )
    .await
    .unwrap();

    callback(&ctx, request.id, PaymentOutcome::Success)
        .await
        .unwrap();
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::Paid
    );
    assert_eq!(
        stored(&ctx, competitor.id).await.status,
        RentRequestStatus::Rejected
    );
}

#[tokio::test]
async fn test_callback_before_confirmation_is_rejected() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    let result = callback(&ctx, request.id, PaymentOutcome::Success).await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::InvalidState(_))
    ));
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::AwaitingConfirmation
    );
}

#[tokio::test]
async fn test_callback_for_canceled_request_is_rejected() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    confirm(&ctx, &request).await;
    cancel_rent_request(
        &ctx.deps,
        CancelRentRequest {
            rent_request_id: request.id,
            renter_id: RENTER,
            canceled_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    let result = callback(&ctx, request.id, PaymentOutcome::Success).await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_callback_for_unknown_request() {
    let ctx = setup();

    let result = callback(&ctx, RentRequestId::new(77), PaymentOutcome::Success).await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::RentRequestNotFound)
    ));
}

// ============================================================================
// 取り消し
// ============================================================================

#[tokio::test]
async fn test_cancel_from_live_states_only() {
    let ctx = setup();
    let awaiting = create_request(&ctx.deps, RENTER, LISTING, day(1), day(2)).await;
    let confirmed = create_request(&ctx.deps, RENTER, LISTING, day(5), day(6)).await;
    let paid = create_request(&ctx.deps, RENTER, LISTING, day(10), day(12)).await;
    confirm(&ctx, &confirmed).await;
    confirm(&ctx, &paid).await;
    callback(&ctx, paid.id, PaymentOutcome::Success)
        .await
        .unwrap();

    for request in [&awaiting, &confirmed] {
        let canceled = cancel_rent_request(
            &ctx.deps,
            CancelRentRequest {
                rent_request_id: request.id,
                renter_id: RENTER,
                canceled_at: Utc::now(),
            },
        )
        .await
        .unwrap();
        assert_eq!(canceled.status, RentRequestStatus::Canceled);
    }

    let paid_cancel = cancel_rent_request(
        &ctx.deps,
        CancelRentRequest {
            rent_request_id: paid.id,
            renter_id: RENTER,
            canceled_at: Utc::now(),
        },
    )
    .await;
    assert!(matches!(
        paid_cancel,
        Err(RentRequestApplicationError::InvalidState(_))
    ));

    let twice = cancel_rent_request(
        &ctx.deps,
        CancelRentRequest {
            rent_request_id: awaiting.id,
            renter_id: RENTER,
            canceled_at: Utc::now(),
        },
    )
    .await;
    assert!(matches!(
        twice,
        Err(RentRequestApplicationError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_cancel_only_by_renter() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    let result = cancel_rent_request(
        &ctx.deps,
        CancelRentRequest {
            rent_request_id: request.id,
            renter_id: OWNER,
            canceled_at: Utc::now(),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::Forbidden(_))
    ));
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::AwaitingConfirmation
    );
}

// ============================================================================
// 取得・一覧
// ============================================================================

#[tokio::test]
async fn test_get_is_visible_to_both_parties_only() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    assert_eq!(
        get_rent_request(&ctx.deps, RENTER, request.id).await.unwrap(),
        request
    );
    assert_eq!(
        get_rent_request(&ctx.deps, OWNER, request.id).await.unwrap(),
        request
    );
    assert!(matches!(
        get_rent_request(&ctx.deps, STRANGER, request.id).await,
        Err(RentRequestApplicationError::Forbidden(_))
    ));
    assert!(matches!(
        get_rent_request(&ctx.deps, RENTER, RentRequestId::new(999)).await,
        Err(RentRequestApplicationError::RentRequestNotFound)
    ));
}

#[tokio::test]
async fn test_lists_are_scoped_to_party_and_filtered_by_status() {
    let ctx = setup();
    let mine = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    let theirs = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(10), day(12)).await;
    confirm(&ctx, &theirs).await;

    let renter_list = list_renter_rent_requests(&ctx.deps, RENTER, &query(None, None, None))
        .await
        .unwrap();
    assert_eq!(renter_list.len(), 1);
    assert_eq!(renter_list[0].id, mine.id);

    let owner_list = list_owner_rent_requests(&ctx.deps, OWNER, &query(None, None, None))
        .await
        .unwrap();
    assert_eq!(owner_list.len(), 2);

    let confirmed_only =
        list_owner_rent_requests(&ctx.deps, OWNER, &query(Some("confirmed"), None, None))
            .await
            .unwrap();
    assert_eq!(confirmed_only.len(), 1);
    assert_eq!(confirmed_only[0].id, theirs.id);

    let nobody = list_owner_rent_requests(&ctx.deps, RENTER, &query(None, None, None))
        .await
        .unwrap();
    assert!(nobody.is_empty());
}

#[tokio::test]
async fn test_list_pages_of_ten() {
    let ctx = setup();
    for i in 0..12 {
        let start = day(1) + Duration::days(i * 2);
        create_request(&ctx.deps, RENTER, LISTING, start, start + Duration::days(1)).await;
    }

    let first = list_renter_rent_requests(&ctx.deps, RENTER, &query(None, None, Some("0")))
        .await
        .unwrap();
    let second = list_renter_rent_requests(&ctx.deps, RENTER, &query(None, None, Some("2")))
        .await
        .unwrap();
    let third = list_renter_rent_requests(&ctx.deps, RENTER, &query(None, None, Some("3")))
        .await
        .unwrap();

    assert_eq!(first.len(), 10);
    assert_eq!(second.len(), 2);
    assert!(third.is_empty());
    assert_eq!(second[0].id, RentRequestId::new(11));
}

#[tokio::test]
async fn test_list_filters_by_creation_date() {
    let ctx = setup();
    let mut early = create_command(RENTER, LISTING, day(20), day(22));
    early.requested_at = day(1) + Duration::hours(9);
    let mut late = create_command(RENTER, LISTING, day(24), day(26));
    late.requested_at = day(3) + Duration::hours(23);

    let early = create_rent_request(&ctx.deps, early).await.unwrap();
    let late = create_rent_request(&ctx.deps, late).await.unwrap();

    let only_first_day = list_renter_rent_requests(
        &ctx.deps,
        RENTER,
        &query(None, Some("2024-06-01,2024-06-01"), None),
    )
    .await
    .unwrap();
    assert_eq!(
        only_first_day.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![early.id]
    );

    let from_second_day =
        list_renter_rent_requests(&ctx.deps, RENTER, &query(None, Some("2024-06-02,"), None))
            .await
            .unwrap();
    assert_eq!(
        from_second_day.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![late.id]
    );

    let up_to_third_day =
        list_renter_rent_requests(&ctx.deps, RENTER, &query(None, Some(",2024-06-03"), None))
            .await
            .unwrap();
    assert_eq!(up_to_third_day.len(), 2);
}

#[tokio::test]
async fn test_list_rejects_invalid_filters() {
    let ctx = setup();
    let (repository, deps) = interleaving_deps(&ctx);

    let reversed = list_owner_rent_requests(
        &deps,
        OWNER,
        &query(None, Some("2024-06-05,2024-06-01"), None),
    )
    .await;
    assert!(matches!(
        reversed,
        Err(RentRequestApplicationError::InvalidInput(_))
    ));

    let unknown_status =
        list_owner_rent_requests(&deps, OWNER, &query(Some("archived"), None, None)).await;
    assert!(matches!(
        unknown_status,
        Err(RentRequestApplicationError::InvalidInput(_))
    ));

    // 不正な条件ではリポジトリに問い合わせない
    assert_eq!(repository.list_calls(), 0);

    list_owner_rent_requests(&deps, OWNER, &query(None, Some("2024-06-01,2024-06-05"), None))
        .await
        .unwrap();
    assert_eq!(repository.list_calls(), 1);
}

// ============================================================================
// 読み取り後の競合
// ============================================================================

#[tokio::test]
async fn test_confirm_loses_race_with_cancel() {
    let ctx = setup();
    let (repository, deps) = interleaving_deps(&ctx);
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;

    let canceled = RentRequest {
        status: RentRequestStatus::Canceled,
        ..request.clone()
    };
    repository.interleave(move |inner| inner.force_replace(canceled));

    let result = confirm_rent_request(
        &deps,
        ConfirmRentRequest {
            rent_request_id: request.id,
            owner_id: OWNER,
            confirmed_at: Utc::now(),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::ConcurrentModification)
    ));
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::Canceled
    );
}

#[tokio::test]
async fn test_success_callback_writes_nothing_when_competitor_changes_mid_reconciliation() {
    let ctx = setup();
    let (repository, deps) = interleaving_deps(&ctx);
    let winner = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    let competitor = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(2), day(3)).await;
    confirm(&ctx, &winner).await;

    // 却下候補として読み取られた後、書き込みの前に借り手が取り消す
    let withdrawn = RentRequest {
        status: RentRequestStatus::Canceled,
        ..competitor.clone()
    };
    repository.interleave(move |inner| inner.force_replace(withdrawn));

    let result = handle_payment_callback(
        &deps,
        ApplyPaymentOutcome {
            rent_request_id: winner.id,
            outcome: PaymentOutcome::Success,
            received_at: Utc::now(),
        },
    )
    .await;

    assert!(matches!(
        result,
        Err(RentRequestApplicationError::ConcurrentModification)
    ));

    let winner_after = stored(&ctx, winner.id).await;
    assert_eq!(winner_after.status, RentRequestStatus::Confirmed);
    assert_eq!(winner_after.payment_status, PaymentStatus::Pending);
    assert_eq!(
        stored(&ctx, competitor.id).await.status,
        RentRequestStatus::Canceled
    );

    // 再配信されたコールバックは最新の状態で処理される
    let retried = callback(&ctx, winner.id, PaymentOutcome::Success)
        .await
        .unwrap();
    assert_eq!(retried, PaymentCallbackOutcome::Paid { rejected: vec![] });
}

#[tokio::test]
async fn test_success_callback_racing_duplicate_delivery_is_already_processed() {
    let ctx = setup();
    let (repository, deps) = interleaving_deps(&ctx);
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    let confirmed = confirm(&ctx, &request).await;

    // 同じコールバックの別配信が先に支払い完了を書き込む
    let settled = RentRequest {
        status: RentRequestStatus::Paid,
        payment_status: PaymentStatus::Success,
        ..confirmed
    };
    let settled_clone = settled.clone();
    repository.interleave(move |inner| inner.force_replace(settled_clone));

    let outcome = handle_payment_callback(
        &deps,
        ApplyPaymentOutcome {
            rent_request_id: request.id,
            outcome: PaymentOutcome::Success,
            received_at: Utc::now(),
        },
    )
    .await
    .unwrap();

    assert_eq!(outcome, PaymentCallbackOutcome::AlreadyProcessed);
    assert_eq!(stored(&ctx, request.id).await, settled);
}

// ============================================================================
// 一連の流れ
// ============================================================================

#[tokio::test]
async fn test_full_lifecycle_example() {
    let ctx = setup();
    let request = create_request(&ctx.deps, RENTER, LISTING, day(1), day(4)).await;
    let competitor = create_request(&ctx.deps, OTHER_RENTER, LISTING, day(2), day(3)).await;
    assert_eq!(request.total_price, 300);

    let by_stranger = confirm_rent_request(
        &ctx.deps,
        ConfirmRentRequest {
            rent_request_id: request.id,
            owner_id: STRANGER,
            confirmed_at: Utc::now(),
        },
    )
    .await;
    assert!(matches!(
        by_stranger,
        Err(RentRequestApplicationError::Forbidden(_))
    ));

    confirm(&ctx, &request).await;
    pay_rent_request(
        &ctx.deps,
        PayRentRequest {
            rent_request_id: request.id,
            renter_id: RENTER,
        },
    )
    .await
    .unwrap();

    let outcome = callback(&ctx, request.id, PaymentOutcome::Success)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        PaymentCallbackOutcome::Paid {
            rejected: vec![competitor.id]
        }
    );
    assert_eq!(
        stored(&ctx, request.id).await.status,
        RentRequestStatus::Paid
    );
    assert_eq!(
        stored(&ctx, competitor.id).await.status,
        RentRequestStatus::Rejected
    );
    assert!(ctx.listing_service.call_count() >= 2);
}

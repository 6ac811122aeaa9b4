use crate::domain::value_objects::{ListingId, UserId};
use crate::ports::listing_service::{
    ListingDetails, ListingService as ListingServiceTrait, ListingServiceError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// ListingServiceのモック実装
///
/// 事前に登録した出品のみ返し、未登録のIDはNotFoundになる。
/// 障害モードではUnavailableを返す。
pub struct ListingService {
    listings: Mutex<HashMap<ListingId, ListingDetails>>,
    unavailable: AtomicBool,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ListingService {
    pub fn new() -> Self {
        Self {
            listings: Mutex::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// テスト用に出品を登録
    pub fn add_listing(&self, listing_id: ListingId, owner_id: UserId, price_per_day: i64) {
        self.listings.lock().unwrap().insert(
            listing_id,
            ListingDetails {
                listing_id,
                owner_id,
                price_per_day,
            },
        );
    }

    /// 出品サービスの障害を再現する
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// これまでの問い合わせ回数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ListingService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ListingServiceTrait for ListingService {
    async fn get_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<ListingDetails, ListingServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ListingServiceError::Unavailable(
                "mock listing service is down".to_string(),
            ));
        }

        self.listings
            .lock()
            .unwrap()
            .get(&listing_id)
            .copied()
            .ok_or(ListingServiceError::NotFound)
    }
}

use crate::domain::{
    NewRentRequest, RentRequest, RentRequestId, RentRequestStatus, RentalPeriod,
    value_objects::{ListingId, UserId},
};
use crate::ports::rent_request_repository::{
    PageRequest, RentRequestFilter, RentRequestRepository as RentRequestRepositoryTrait, Result,
    StatusTransition,
};
use async_trait::async_trait;
use std::sync::Mutex;

/// RentRequestRepositoryのインメモリ実装
///
/// IDは1から順に採番する。全レコードを1つのロックで保護するため、
/// 一括置き換えは原子的に適用される。
pub struct RentRequestRepository {
    records: Mutex<Vec<RentRequest>>,
}

#[allow(dead_code)]
impl RentRequestRepository {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// 保存済みの全レコード（ID順）
    pub fn all(&self) -> Vec<RentRequest> {
        self.records.lock().unwrap().clone()
    }

    /// 状態の確認なしに上書きする（テストの状態準備用）
    pub fn force_replace(&self, record: RentRequest) {
        let mut records = self.records.lock().unwrap();
        if let Some(slot) = records.iter_mut().find(|r| r.id == record.id) {
            *slot = record;
        }
    }
}

impl Default for RentRequestRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(records: &mut [RentRequest], transition: &StatusTransition) -> bool {
    match records
        .iter_mut()
        .find(|r| r.id == transition.record.id && r.status == transition.expected_status)
    {
        Some(slot) => {
            *slot = transition.record.clone();
            true
        }
        None => false,
    }
}

fn page_of(records: impl Iterator<Item = RentRequest>, page: PageRequest) -> Vec<RentRequest> {
    records
        .skip(usize::try_from(page.offset).unwrap_or(0))
        .take(usize::try_from(page.limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl RentRequestRepositoryTrait for RentRequestRepository {
    async fn add(&self, new_request: NewRentRequest) -> Result<RentRequestId> {
        let mut records = self.records.lock().unwrap();
        let id = RentRequestId::new(records.len() as i64 + 1);
        records.push(new_request.with_id(id));
        Ok(id)
    }

    async fn replace(
        &self,
        record: &RentRequest,
        expected_status: RentRequestStatus,
    ) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        Ok(apply(
            &mut records,
            &StatusTransition {
                record: record.clone(),
                expected_status,
            },
        ))
    }

    async fn replace_batch(&self, transitions: &[StatusTransition]) -> Result<bool> {
        let mut records = self.records.lock().unwrap();
        let mut staged = records.clone();

        for transition in transitions {
            if !apply(&mut staged, transition) {
                return Ok(false);
            }
        }

        *records = staged;
        Ok(true)
    }

    async fn get_by_id(&self, id: RentRequestId) -> Result<Option<RentRequest>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn get_overlapping(
        &self,
        listing_id: ListingId,
        status: RentRequestStatus,
        period: &RentalPeriod,
    ) -> Result<Vec<RentRequest>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.listing_id == listing_id && r.status == status)
            .filter(|r| r.period.overlaps(period))
            .cloned()
            .collect())
    }

    async fn list_by_owner(
        &self,
        owner_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> Result<Vec<RentRequest>> {
        let records = self.records.lock().unwrap().clone();
        Ok(page_of(
            records
                .into_iter()
                .filter(|r| r.owner_id == owner_id && filter.matches(r)),
            page,
        ))
    }

    async fn list_by_renter(
        &self,
        renter_id: UserId,
        filter: &RentRequestFilter,
        page: PageRequest,
    ) -> Result<Vec<RentRequest>> {
        let records = self.records.lock().unwrap().clone();
        Ok(page_of(
            records
                .into_iter()
                .filter(|r| r.renter_id == renter_id && filter.matches(r)),
            page,
        ))
    }
}

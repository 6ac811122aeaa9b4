use crate::domain::{RentRequest, RentRequestStatus, value_objects::UserId};
use crate::ports::{PageRequest, RentRequestFilter};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use super::errors::{RentRequestApplicationError, Result};
use super::rent_request_service::ServiceDependencies;

/// 一覧の1ページあたりの件数
pub const PAGE_SIZE: i64 = 10;

/// 一覧取得のクエリ（未解釈の文字列のまま受け取る）
///
/// - status: ステータス名（例: `confirmed`）
/// - date: 作成日の範囲 `YYYY-MM-DD,YYYY-MM-DD`（どちらか片方は省略可）
/// - page: 1始まりのページ番号。未指定・不正値は1
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRentRequestsQuery {
    pub status: Option<String>,
    pub date: Option<String>,
    pub page: Option<String>,
}

/// 一覧取得の対象
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Owner,
    Renter,
}

/// ステータス絞り込みの解釈（空文字は指定なし）
pub fn parse_status_filter(status: Option<&str>) -> Result<Option<RentRequestStatus>> {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<RentRequestStatus>()
            .map(Some)
            .map_err(RentRequestApplicationError::InvalidInput),
    }
}

/// 作成日範囲の解釈
///
/// `min,max` の形式で、どちらか片方は省略できる。カンマがない値は不正。
/// 両方指定されて min > max の場合も不正。
pub fn parse_date_range(date: Option<&str>) -> Result<(Option<NaiveDate>, Option<NaiveDate>)> {
    let Some(raw) = date.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok((None, None));
    };

    let Some((min_str, max_str)) = raw.split_once(',') else {
        return Err(RentRequestApplicationError::InvalidInput(
            "date must be formatted as min,max".to_string(),
        ));
    };

    let min = parse_date(min_str, "Invalid minimum date")?;
    let max = parse_date(max_str, "Invalid maximum date")?;

    if matches!((min, max), (Some(min), Some(max)) if min > max) {
        return Err(RentRequestApplicationError::InvalidInput(
            "Minimum date cannot be greater than maximum date".to_string(),
        ));
    }

    Ok((min, max))
}

fn parse_date(value: &str, message: &str) -> Result<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| RentRequestApplicationError::InvalidInput(message.to_string()))
}

/// ページ番号の解釈（未指定・0・負数・数値以外は1）
pub fn parse_page(page: Option<&str>) -> u32 {
    page.and_then(|p| p.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1)
}

/// 指定日の翌日0:00（UTC）。表現できる最終日は不正
fn end_of_day(date: NaiveDate) -> Result<DateTime<Utc>> {
    date.succ_opt()
        .map(|next| next.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| RentRequestApplicationError::InvalidInput("Invalid maximum date".to_string()))
}

/// クエリ全体を絞り込み条件とページ指定に変換する
///
/// 日付範囲は両端の日を含む（max日の終わりまで）。
pub fn build_list_criteria(
    query: &ListRentRequestsQuery,
) -> Result<(RentRequestFilter, PageRequest)> {
    let status = parse_status_filter(query.status.as_deref())?;
    let (min, max) = parse_date_range(query.date.as_deref())?;
    let page = parse_page(query.page.as_deref());

    let filter = RentRequestFilter {
        status,
        created_from: min.map(|d| d.and_time(NaiveTime::MIN).and_utc()),
        created_before: max.map(end_of_day).transpose()?,
    };

    let page = PageRequest {
        offset: i64::from(page - 1) * PAGE_SIZE,
        limit: PAGE_SIZE,
    };

    Ok((filter, page))
}

async fn list_rent_requests(
    deps: &ServiceDependencies,
    party: Party,
    user_id: UserId,
    query: &ListRentRequestsQuery,
) -> Result<Vec<RentRequest>> {
    // 不正な条件はクエリ実行前に弾く
    let (filter, page) = build_list_criteria(query)?;

    let result = match party {
        Party::Owner => deps.repository.list_by_owner(user_id, &filter, page).await,
        Party::Renter => deps.repository.list_by_renter(user_id, &filter, page).await,
    };

    result.map_err(RentRequestApplicationError::RepositoryError)
}

/// 貸し手として受けた貸出リクエストの一覧
pub async fn list_owner_rent_requests(
    deps: &ServiceDependencies,
    owner_id: UserId,
    query: &ListRentRequestsQuery,
) -> Result<Vec<RentRequest>> {
    list_rent_requests(deps, Party::Owner, owner_id, query).await
}

/// 借り手として出した貸出リクエストの一覧
pub async fn list_renter_rent_requests(
    deps: &ServiceDependencies,
    renter_id: UserId,
    query: &ListRentRequestsQuery,
) -> Result<Vec<RentRequest>> {
    list_rent_requests(deps, Party::Renter, renter_id, query).await
}

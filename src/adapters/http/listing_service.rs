use crate::domain::value_objects::{ListingId, UserId};
use crate::ports::listing_service::{
    ListingDetails, ListingService as ListingServiceTrait, ListingServiceError,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use super::{UpstreamError, join_url};

const SERVICE: &str = "listing service";

/// `GET /posts/{id}` のレスポンスのうち利用する項目
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostResponse {
    price_per_day: f64,
    owner_id: i64,
}

/// ListingServiceのHTTP実装
///
/// 出品（posts）サービスから料金と貸し手IDを取得する。
pub struct ListingService {
    client: Client,
    base_url: String,
}

impl ListingService {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

fn unavailable(err: UpstreamError) -> ListingServiceError {
    ListingServiceError::Unavailable(err.to_string())
}

/// 小数の料金は整数に切り捨てる
fn to_listing_details(
    listing_id: ListingId,
    post: PostResponse,
) -> Result<ListingDetails, UpstreamError> {
    if !post.price_per_day.is_finite() {
        return Err(UpstreamError::InvalidBody {
            service: SERVICE,
            reason: format!("pricePerDay is not a finite number: {}", post.price_per_day),
        });
    }

    Ok(ListingDetails {
        listing_id,
        owner_id: UserId::new(post.owner_id),
        price_per_day: post.price_per_day.trunc() as i64,
    })
}

#[async_trait]
impl ListingServiceTrait for ListingService {
    async fn get_listing(
        &self,
        listing_id: ListingId,
    ) -> Result<ListingDetails, ListingServiceError> {
        let url = join_url(&self.base_url, &format!("/posts/{}", listing_id));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| {
                unavailable(UpstreamError::Transport {
                    service: SERVICE,
                    source,
                })
            })?;

        match response.status() {
            StatusCode::OK => {
                let post: PostResponse = response.json().await.map_err(|e| {
                    unavailable(UpstreamError::InvalidBody {
                        service: SERVICE,
                        reason: e.to_string(),
                    })
                })?;
                to_listing_details(listing_id, post).map_err(unavailable)
            }
            StatusCode::NOT_FOUND => Err(ListingServiceError::NotFound),
            StatusCode::BAD_REQUEST => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(listing_id = %listing_id, body = %body, "Listing service rejected lookup");
                Err(ListingServiceError::BadRequest(body))
            }
            status => Err(unavailable(UpstreamError::UnexpectedStatus {
                service: SERVICE,
                status,
            })),
        }
    }
}

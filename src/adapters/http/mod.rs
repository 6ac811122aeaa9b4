pub mod listing_service;
pub mod payment_gateway;

use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

pub use listing_service::ListingService as HttpListingService;
pub use payment_gateway::PaymentGateway as HttpPaymentGateway;

/// 上流サービスとの通信失敗
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} responded with unexpected status {status}")]
    UnexpectedStatus {
        service: &'static str,
        status: StatusCode,
    },

    #[error("invalid response body from {service}: {reason}")]
    InvalidBody {
        service: &'static str,
        reason: String,
    },
}

/// 上流呼び出しで共有するクライアント（タイムアウトはリクエスト全体に適用）
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

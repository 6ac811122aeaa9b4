use crate::ports::payment_gateway::{
    PaymentGateway as PaymentGatewayTrait, PaymentSessionRequest, Result,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{UpstreamError, join_url};

const SERVICE: &str = "payment service";

#[derive(Debug, Serialize)]
struct PaymentRequestBody {
    #[serde(rename = "requestId")]
    request_id: i64,
    amount: i64,
    #[serde(rename = "callbackURL")]
    callback_url: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponseBody {
    #[serde(rename = "redirectURL")]
    redirect_url: String,
}

/// PaymentGatewayのHTTP実装
///
/// `POST /payment/request` で決済セッションを作成する。成功は201のみ。
pub struct PaymentGateway {
    client: Client,
    base_url: String,
}

impl PaymentGateway {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PaymentGatewayTrait for PaymentGateway {
    async fn create_payment_session(&self, request: PaymentSessionRequest) -> Result<String> {
        let url = join_url(&self.base_url, "/payment/request");
        let body = PaymentRequestBody {
            request_id: request.rent_request_id.value(),
            amount: request.amount,
            callback_url: request.callback_url,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                service: SERVICE,
                source,
            })?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(UpstreamError::UnexpectedStatus {
                service: SERVICE,
                status,
            }
            .into());
        }

        let parsed: PaymentResponseBody =
            response
                .json()
                .await
                .map_err(|e| UpstreamError::InvalidBody {
                    service: SERVICE,
                    reason: e.to_string(),
                })?;

        Ok(parsed.redirect_url)
    }
}

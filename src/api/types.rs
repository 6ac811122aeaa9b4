use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RentRequest;

/// 貸出リクエスト作成のリクエストボディ（POST /rent-request）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRentRequestBody {
    /// 出品（post）ID
    #[serde(rename = "postId")]
    pub listing_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

/// 貸出リクエストレスポンス（GET /rent-request/:id と一覧）
///
/// 当事者のIDは含めない。
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RentRequestResponse {
    pub id: i64,
    pub listing_id: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total_price: i64,
    pub status: String,
    pub payment_status: String,
}

impl From<RentRequest> for RentRequestResponse {
    fn from(request: RentRequest) -> Self {
        Self {
            id: request.id.value(),
            listing_id: request.listing_id.value(),
            start_date: request.period.start(),
            end_date: request.period.end(),
            total_price: request.total_price,
            status: request.status.as_str().to_string(),
            payment_status: request.payment_status.as_str().to_string(),
        }
    }
}

/// 作成レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct RentRequestCreatedResponse {
    pub id: i64,
    pub total_price: i64,
    pub status: String,
    pub payment_status: String,
}

impl From<&RentRequest> for RentRequestCreatedResponse {
    fn from(request: &RentRequest) -> Self {
        Self {
            id: request.id.value(),
            total_price: request.total_price,
            status: request.status.as_str().to_string(),
            payment_status: request.payment_status.as_str().to_string(),
        }
    }
}

/// メッセージのみのレスポンス（承認・取り消し・コールバック）
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// 支払い開始レスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRedirectResponse {
    pub redirect_url: String,
}

/// 決済サービスからのコールバックのクエリパラメータ
///
/// 不正値もJSONのエラーで返すため文字列のまま受け取る。
#[derive(Debug, Deserialize)]
pub struct PaymentCallbackQuery {
    #[serde(rename = "requestId")]
    pub request_id: Option<String>,
    pub status: Option<String>,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

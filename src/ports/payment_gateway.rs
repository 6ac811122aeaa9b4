use crate::domain::value_objects::RentRequestId;
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 決済セッション作成要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSessionRequest {
    pub rent_request_id: RentRequestId,
    pub amount: i64,
    /// 決済完了・取り消し時に決済サービスが呼び出すURL
    pub callback_url: String,
}

/// 決済サービスポート
///
/// 支払い結果はこの呼び出しの戻り値ではなく、コールバックで非同期に届く。
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// 決済セッションを作成し、利用者を誘導するリダイレクトURLを返す
    async fn create_payment_session(&self, request: PaymentSessionRequest) -> Result<String>;
}

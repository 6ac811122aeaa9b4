use crate::ports::payment_gateway::{
    PaymentGateway as PaymentGatewayTrait, PaymentSessionRequest, Result,
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// PaymentGatewayのモック実装
///
/// 決済セッション要求を記録し、固定形式のリダイレクトURLを返す。
pub struct PaymentGateway {
    sessions: Mutex<Vec<PaymentSessionRequest>>,
    failing: AtomicBool,
}

#[allow(dead_code)]
impl PaymentGateway {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// 以降のセッション作成を失敗させる
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// これまでに受け取ったセッション要求
    pub fn sessions(&self) -> Vec<PaymentSessionRequest> {
        self.sessions.lock().unwrap().clone()
    }

    /// 貸出リクエストに対して返すリダイレクトURL
    pub fn redirect_url_for(rent_request_id: i64) -> String {
        format!("https://payments.test/checkout/{}", rent_request_id)
    }
}

impl Default for PaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGatewayTrait for PaymentGateway {
    async fn create_payment_session(&self, request: PaymentSessionRequest) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("mock payment service is down".into());
        }

        let redirect_url = Self::redirect_url_for(request.rent_request_id.value());
        self.sessions.lock().unwrap().push(request);
        Ok(redirect_url)
    }
}

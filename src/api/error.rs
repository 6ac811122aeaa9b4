use crate::application::rent_request::RentRequestApplicationError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(RentRequestApplicationError);

impl From<RentRequestApplicationError> for ApiError {
    fn from(err: RentRequestApplicationError) -> Self {
        ApiError(err)
    }
}

/// リクエストボディの不正（日付形式の誤り・必須項目の欠落など）
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(RentRequestApplicationError::InvalidInput(
            rejection.body_text(),
        ))
    }
}

/// パスパラメータの不正（数値でないIDなど）
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(RentRequestApplicationError::InvalidInput(
            rejection.body_text(),
        ))
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        use RentRequestApplicationError as E;

        match &self.0 {
            // 400 Bad Request - 入力値の誤り
            E::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            E::InvalidListingRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_LISTING_REQUEST",
                msg.clone(),
            ),

            // 403 Forbidden - 当事者以外の操作
            E::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),

            // 404 Not Found
            E::RentRequestNotFound => (
                StatusCode::NOT_FOUND,
                "RENT_REQUEST_NOT_FOUND",
                "Rent request not found".to_string(),
            ),
            E::ListingNotFound => (
                StatusCode::NOT_FOUND,
                "LISTING_NOT_FOUND",
                "Listing not found".to_string(),
            ),

            // 409 Conflict
            E::PaidRequestConflict => (
                StatusCode::CONFLICT,
                "RENT_REQUEST_CONFLICT",
                "There is already a paid request for this period".to_string(),
            ),
            E::ConcurrentModification => (
                StatusCode::CONFLICT,
                "CONCURRENT_MODIFICATION",
                "Rent request was modified by another operation, retry".to_string(),
            ),

            // 422 Unprocessable Entity - 状態遷移のルール違反
            E::InvalidState(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_STATE",
                msg.clone(),
            ),

            // 502 Bad Gateway - 上流サービスの障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            E::ListingServiceError(e) => {
                tracing::error!("Listing service error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "LISTING_SERVICE_ERROR",
                    "Listing service error".to_string(),
                )
            }
            E::PaymentServiceError(e) => {
                tracing::error!("Payment service error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "PAYMENT_SERVICE_ERROR",
                    "Payment service error".to_string(),
                )
            }

            // 500 Internal Server Error - システム障害
            E::RepositoryError(e) => {
                tracing::error!("Repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "REPOSITORY_ERROR",
                    "Failed to access rent requests".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = self.parts();

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: RentRequestApplicationError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        use RentRequestApplicationError as E;

        assert_eq!(status_of(E::InvalidInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(E::PaidRequestConflict), StatusCode::CONFLICT);
        assert_eq!(status_of(E::RentRequestNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_of(E::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(E::InvalidState("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_of(E::ConcurrentModification), StatusCode::CONFLICT);
        assert_eq!(status_of(E::ListingNotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(E::InvalidListingRequest("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(E::ListingServiceError("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(E::PaymentServiceError("down".into())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(E::RepositoryError("db".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let (_, code, message) =
            ApiError::from(RentRequestApplicationError::RepositoryError(
                "password authentication failed".into(),
            ))
            .parts();

        assert_eq!(code, "REPOSITORY_ERROR");
        assert!(!message.contains("password"));
    }
}

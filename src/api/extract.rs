use axum::extract::{FromRequest, FromRequestParts};

use super::error::ApiError;

/// JSONボディの抽出（解析失敗はINVALID_INPUTとして返す）
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// パスパラメータの抽出（解析失敗はINVALID_INPUTとして返す）
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

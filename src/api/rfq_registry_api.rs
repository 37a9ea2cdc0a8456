use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};

use crate::{
    app_state::AppState,
    error::ApiError,
    service::{RegistryAccess, RfqtEligibilityGate},
};

/// GET /swap/v1/rfq/registry
///
/// 凭注册表密码返回 RFQT API key 白名单；拒绝时 401 空响应体
pub async fn get_rfq_registry(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<String>>, ApiError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    match RfqtEligibilityGate::new(&st.access, &st.metrics).authorize_registry(authorization) {
        RegistryAccess::Granted(keys) => {
            st.metrics.count_ok("GET /swap/v1/rfq/registry");
            Ok(Json(keys))
        }
        RegistryAccess::Denied => {
            st.metrics.count_err("GET /swap/v1/rfq/registry");
            Err(ApiError::Unauthorized)
        }
    }
}

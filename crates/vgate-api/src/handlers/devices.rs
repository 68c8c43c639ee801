//! Device and point handlers

use axum::http::Method;
use tracing::debug;
use vgate_core::routing::DeviceRoute;
use vgate_core::PointValue;

use crate::dispatch::ApiRequest;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

use super::json_ok;

/// GET /devices/hierarchy
///
/// Devices of every platform, nested by platform name.
pub async fn devices_hierarchy(
    state: AppState,
    request: ApiRequest,
) -> Result<ApiResponse, ApiError> {
    state.authorize(&request)?;
    let hierarchy = state.resolver().devices_hierarchy().await?;
    json_ok(&hierarchy)
}

/// GET /devices
///
/// Flattened listing: device topic → `{platform, link}`.
pub async fn devices_list(state: AppState, request: ApiRequest) -> Result<ApiResponse, ApiError> {
    state.authorize(&request)?;
    let devices = state.resolver().devices_list().await?;
    json_ok(&devices)
}

/// /devices/{platform}/{device...}[/all | /pt/{point}]
///
/// - `.../all` - every point of the device with its value
/// - `.../pt/{point}` - GET reads, POST writes `value` from the request data
/// - anything else - links to the device's sub-resources
pub async fn device_or_point(
    state: AppState,
    request: ApiRequest,
) -> Result<ApiResponse, ApiError> {
    state.authorize(&request)?;

    let route = DeviceRoute::parse(request.path())?;
    debug!(?route, method = %request.method, "Device request");

    let devices = state.devices();
    match route {
        DeviceRoute::ScrapeAll { platform, device } => {
            json_ok(&devices.scrape_all(&platform, &device).await?)
        }
        DeviceRoute::Index { platform, device } => {
            json_ok(&devices.device_index(&platform, &device).await?)
        }
        DeviceRoute::Point {
            platform,
            device,
            point,
        } => match request.method {
            Method::GET => {
                let value = devices.get_point(&platform, &device, &point).await?;
                json_ok(&PointValue::from(value))
            }
            Method::POST => {
                let value = request
                    .data()?
                    .remove("value")
                    .ok_or_else(|| ApiError::BadRequest("A 'value' must be specified.".to_string()))?;
                let confirmed = devices.set_point(&platform, &device, &point, value).await?;
                json_ok(&PointValue::from(confirmed))
            }
            _ => Err(ApiError::MethodNotAllowed(format!(
                "Method {} not supported on points.",
                request.method
            ))),
        },
    }
}

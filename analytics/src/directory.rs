use crate::errors::Result;
use crate::model::{DeviceSummary, OfflineDevice};
use chrono::{DateTime, Duration, Utc};
use sqlx::PgConnection;

pub const DEFAULT_OFFLINE_HOURS: u32 = 24;
pub const MAX_OFFLINE_HOURS: u32 = 24 * 30;
pub const DEFAULT_OFFLINE_LIMIT: u32 = 100;
pub const MAX_OFFLINE_LIMIT: u32 = 1000;

// LEFT JOIN so devices without a location row are still listed.
const DEVICE_SELECT: &str = r#"
    SELECT d.device_key, d.device_id, d.device_name, d.network, d.category, d.status,
           d.is_active, d.is_online, l.latitude, l.longitude
    FROM dim_device d
    LEFT JOIN dim_location l ON l.device_key = d.device_key
"#;

pub async fn list_devices(conn: &mut PgConnection) -> Result<Vec<DeviceSummary>> {
    let query = format!("{} ORDER BY d.device_key ASC", DEVICE_SELECT);
    let devices = sqlx::query_as::<_, DeviceSummary>(&query)
        .fetch_all(conn)
        .await?;
    Ok(devices)
}

pub async fn get_device(conn: &mut PgConnection, device_id: &str) -> Result<Option<DeviceSummary>> {
    let query = format!("{} WHERE d.device_id = $1", DEVICE_SELECT);
    let device = sqlx::query_as::<_, DeviceSummary>(&query)
        .bind(device_id)
        .fetch_optional(conn)
        .await?;
    Ok(device)
}

/// Clamps the requested look-back and page size, applying defaults when absent.
pub fn offline_window(hours: Option<u32>, limit: Option<u32>) -> (u32, u32) {
    let hours = hours
        .unwrap_or(DEFAULT_OFFLINE_HOURS)
        .clamp(1, MAX_OFFLINE_HOURS);
    let limit = limit
        .unwrap_or(DEFAULT_OFFLINE_LIMIT)
        .clamp(1, MAX_OFFLINE_LIMIT);
    (hours, limit)
}

/// Devices flagged offline whose latest status event is older than `hours`
/// before `now`, or that never reported. Longest silent first.
pub async fn offline_devices(
    conn: &mut PgConnection,
    now: DateTime<Utc>,
    hours: u32,
    limit: u32,
) -> Result<Vec<OfflineDevice>> {
    let cutoff = now - Duration::hours(i64::from(hours));

    let devices = sqlx::query_as::<_, OfflineDevice>(
        r#"
        SELECT d.device_key, d.device_id, d.device_name, d.network, d.category, d.status,
               d.is_active, d.is_online, l.latitude, l.longitude, s.last_seen
        FROM dim_device d
        LEFT JOIN dim_location l ON l.device_key = d.device_key
        LEFT JOIN (
            SELECT device_key, MAX(recorded_at) AS last_seen
            FROM fact_device_status
            GROUP BY device_key
        ) s ON s.device_key = d.device_key
        WHERE NOT d.is_online
          AND (s.last_seen IS NULL OR s.last_seen < $1)
        ORDER BY s.last_seen ASC NULLS FIRST, d.device_key ASC
        LIMIT $2
        "#,
    )
    .bind(cutoff)
    .bind(i64::from(limit))
    .fetch_all(conn)
    .await?;

    Ok(devices)
}

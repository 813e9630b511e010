use crate::errors::Result;
use crate::model::MonthlyFailureBucket;
use chrono::{DateTime, Months, NaiveDateTime, Utc};
use sqlx::PgConnection;

pub const TREND_WINDOW_MONTHS: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    Connectivity,
    Sensor,
    Power,
    PhysicalDamage,
}

impl FailureCategory {
    pub const ALL: [FailureCategory; 4] = [
        FailureCategory::Connectivity,
        FailureCategory::Sensor,
        FailureCategory::Power,
        FailureCategory::PhysicalDamage,
    ];

    pub fn device_status(&self) -> &'static str {
        match self {
            FailureCategory::Connectivity => "offline",
            FailureCategory::Sensor => "maintenance",
            FailureCategory::Power => "low_battery",
            FailureCategory::PhysicalDamage => "damaged",
        }
    }

    /// Connectivity and sensor failures only count while the device reports
    /// offline. Power and physical damage count regardless.
    pub fn requires_offline(&self) -> bool {
        matches!(self, FailureCategory::Connectivity | FailureCategory::Sensor)
    }

    pub fn matches(&self, device_status: &str, is_online: bool) -> bool {
        device_status == self.device_status() && (!self.requires_offline() || !is_online)
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BucketRow {
    month: NaiveDateTime,
    connectivity_issues: i64,
    sensor_failures: i64,
    power_issues: i64,
    physical_damage: i64,
}

impl From<BucketRow> for MonthlyFailureBucket {
    fn from(row: BucketRow) -> Self {
        MonthlyFailureBucket {
            month: month_label(&row.month),
            connectivity_issues: row.connectivity_issues,
            sensor_failures: row.sensor_failures,
            power_issues: row.power_issues,
            physical_damage: row.physical_damage,
        }
    }
}

// Clamped to the end of shorter months (Aug 31 -> Feb 28/29).
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.checked_sub_months(Months::new(TREND_WINDOW_MONTHS))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

pub fn month_label(month: &NaiveDateTime) -> String {
    month.format("%b").to_string()
}

pub async fn failure_trends(
    conn: &mut PgConnection,
    now: DateTime<Utc>,
) -> Result<Vec<MonthlyFailureBucket>> {
    let [connectivity, sensor, power, physical] = FailureCategory::ALL.map(|c| c.device_status());

    let rows = sqlx::query_as::<_, BucketRow>(
        r#"
        SELECT
            date_trunc('month', recorded_at AT TIME ZONE 'UTC') AS month,
            COUNT(*) FILTER (WHERE device_status = $3 AND NOT is_online) AS connectivity_issues,
            COUNT(*) FILTER (WHERE device_status = $4 AND NOT is_online) AS sensor_failures,
            COUNT(*) FILTER (WHERE device_status = $5) AS power_issues,
            COUNT(*) FILTER (WHERE device_status = $6) AS physical_damage
        FROM fact_device_status
        WHERE recorded_at >= $1
          AND recorded_at <= $2
          AND (
                (device_status IN ($3, $4) AND NOT is_online)
                OR device_status IN ($5, $6)
          )
        GROUP BY 1
        ORDER BY 1 ASC
        "#,
    )
    .bind(window_start(now))
    .bind(now)
    .bind(connectivity)
    .bind(sensor)
    .bind(power)
    .bind(physical)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(MonthlyFailureBucket::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    #[test]
    fn test_window_start_is_six_calendar_months_back() {
        let now = Utc.with_ymd_and_hms(2025, 7, 15, 12, 30, 0).unwrap();
        assert_eq!(
            window_start(now),
            Utc.with_ymd_and_hms(2025, 1, 15, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_window_start_crosses_year_boundary() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(
            window_start(now),
            Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_window_start_clamps_to_month_end() {
        let now = Utc.with_ymd_and_hms(2025, 8, 31, 0, 0, 0).unwrap();
        assert_eq!(
            window_start(now),
            Utc.with_ymd_and_hms(2025, 2, 28, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_month_label_short_name() {
        let jan = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let sep = NaiveDate::from_ymd_opt(2024, 9, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(month_label(&jan), "Jan");
        assert_eq!(month_label(&sep), "Sep");
    }

    #[test]
    fn test_offline_event_is_connectivity_only() {
        let hits: Vec<_> = FailureCategory::ALL
            .iter()
            .filter(|c| c.matches("offline", false))
            .collect();
        assert_eq!(hits, vec![&FailureCategory::Connectivity]);
    }

    #[test]
    fn test_online_devices_do_not_count_connectivity_or_sensor() {
        assert!(!FailureCategory::Connectivity.matches("offline", true));
        assert!(!FailureCategory::Sensor.matches("maintenance", true));
        assert!(FailureCategory::Sensor.matches("maintenance", false));
    }

    #[test]
    fn test_power_and_damage_ignore_connectivity() {
        assert!(FailureCategory::Power.matches("low_battery", true));
        assert!(FailureCategory::Power.matches("low_battery", false));
        assert!(FailureCategory::PhysicalDamage.matches("damaged", true));
        assert!(FailureCategory::PhysicalDamage.matches("damaged", false));
    }

    #[test]
    fn test_unrelated_status_matches_nothing() {
        assert!(FailureCategory::ALL
            .iter()
            .all(|c| !c.matches("active", false)));
    }
}

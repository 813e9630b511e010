use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Deployment lifecycle values counted by the fleet summary. The warehouse may
/// hold other values; they are counted in the total only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentStatus {
    Deployed,
    NotDeployed,
    Recalled,
}

impl DeploymentStatus {
    pub const ALL: [DeploymentStatus; 3] = [
        DeploymentStatus::Deployed,
        DeploymentStatus::NotDeployed,
        DeploymentStatus::Recalled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Deployed => "deployed",
            DeploymentStatus::NotDeployed => "not_deployed",
            DeploymentStatus::Recalled => "recalled",
        }
    }
}

/// Device as returned by the directory endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceSummary {
    pub device_key: i64,
    pub device_id: String,
    pub device_name: Option<String>,
    pub network: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub is_active: bool,
    pub is_online: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OfflineDevice {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub device: DeviceSummary,
    /// Latest status event of any kind; `None` when the device never reported.
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineDevicesResponse {
    pub hours: u32,
    pub devices: Vec<OfflineDevice>,
}

/// One group of a breakdown. A null `name` is the group of devices with no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GroupCount {
    pub name: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetStats {
    pub total_devices: i64,
    pub active_devices: i64,
    pub offline_devices: i64,
    pub deployed_devices: i64,
    pub not_deployed_devices: i64,
    pub recalled_devices: i64,
    pub networks: Vec<GroupCount>,
    pub categories: Vec<GroupCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyFailureBucket {
    pub month: String,
    pub connectivity_issues: i64,
    pub sensor_failures: i64,
    pub power_issues: i64,
    pub physical_damage: i64,
}

/// Response wrapper for the failure trend endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureTrendsResponse {
    pub failure_data: Vec<MonthlyFailureBucket>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

use chrono::{DateTime, Duration, Utc};
use device_analytics::failures::FailureCategory;
use device_analytics::model::DeploymentStatus;
use rand::seq::SliceRandom;
use rand::Rng;

const NETWORKS: [&str; 4] = ["airqo", "kcca", "iqair", "purpleair"];
const CATEGORIES: [&str; 3] = ["lowcost", "bam", "gas"];
const HEALTHY_STATUSES: [&str; 2] = ["active", "online"];

// Rough bounding box around the East African deployments.
const LAT_RANGE: std::ops::Range<f64> = -4.0..4.5;
const LON_RANGE: std::ops::Range<f64> = 29.5..35.0;

#[derive(Debug, Clone)]
pub struct SeedDevice {
    pub device_id: String,
    pub device_name: String,
    pub network: Option<String>,
    pub category: Option<String>,
    pub status: &'static str,
    pub is_active: bool,
    pub is_online: bool,
    pub location: Option<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct SeedEvent {
    pub recorded_at: DateTime<Utc>,
    pub device_status: &'static str,
    pub is_online: bool,
}

pub fn generate_device(rng: &mut impl Rng, index: usize) -> SeedDevice {
    let status = match rng.gen_range(0..10) {
        0..=6 => DeploymentStatus::Deployed,
        7..=8 => DeploymentStatus::NotDeployed,
        _ => DeploymentStatus::Recalled,
    };

    // A few devices arrive from ingestion without network/category metadata.
    let network = (!rng.gen_bool(0.05)).then(|| pick(rng, &NETWORKS));
    let category = (!rng.gen_bool(0.05)).then(|| pick(rng, &CATEGORIES));

    let location = rng
        .gen_bool(0.85)
        .then(|| (rng.gen_range(LAT_RANGE), rng.gen_range(LON_RANGE)));

    SeedDevice {
        device_id: format!("aq-{:05}", index),
        device_name: format!("Sensor {}", index),
        network,
        category,
        status: status.as_str(),
        is_active: status != DeploymentStatus::Recalled && rng.gen_bool(0.9),
        is_online: status == DeploymentStatus::Deployed && rng.gen_bool(0.8),
        location,
    }
}

/// Status events spread uniformly over the `months` (30-day) period before `now`.
pub fn generate_events(
    rng: &mut impl Rng,
    now: DateTime<Utc>,
    months: u32,
    count: usize,
) -> Vec<SeedEvent> {
    let span_secs = i64::from(months.max(1)) * 30 * 24 * 3600;

    let mut events: Vec<SeedEvent> = (0..count)
        .map(|_| {
            let recorded_at = now - Duration::seconds(rng.gen_range(0..span_secs));
            if rng.gen_bool(0.3) {
                let category = *FailureCategory::ALL
                    .choose(rng)
                    .unwrap_or(&FailureCategory::Connectivity);
                SeedEvent {
                    recorded_at,
                    device_status: category.device_status(),
                    // Mostly offline, so connectivity and sensor failures register.
                    is_online: (!category.requires_offline() && rng.gen_bool(0.5))
                        || rng.gen_bool(0.1),
                }
            } else {
                SeedEvent {
                    recorded_at,
                    device_status: pick_static(rng, &HEALTHY_STATUSES),
                    is_online: true,
                }
            }
        })
        .collect();

    events.sort_by_key(|e| e.recorded_at);
    events
}

fn pick(rng: &mut impl Rng, values: &[&str]) -> String {
    pick_static(rng, values).to_string()
}

fn pick_static<'a>(rng: &mut impl Rng, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or("unknown")
}

use crate::errors::Result;
use crate::model::{DeploymentStatus, FleetStats, GroupCount};
use sqlx::PgConnection;

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    total_devices: i64,
    active_devices: i64,
    offline_devices: i64,
    deployed_devices: i64,
    not_deployed_devices: i64,
    recalled_devices: i64,
}

// Only these column names are ever interpolated into SQL.
#[derive(Debug, Clone, Copy)]
enum Breakdown {
    Network,
    Category,
}

impl Breakdown {
    fn column(&self) -> &'static str {
        match self {
            Breakdown::Network => "network",
            Breakdown::Category => "category",
        }
    }
}

/// Expects a connection inside `db::begin_read` so all counts share a snapshot.
pub async fn fleet_stats(conn: &mut PgConnection) -> Result<FleetStats> {
    let summary = sqlx::query_as::<_, SummaryRow>(
        r#"
        SELECT
            COUNT(*) AS total_devices,
            COUNT(*) FILTER (WHERE is_active) AS active_devices,
            COUNT(*) FILTER (WHERE NOT is_online) AS offline_devices,
            COUNT(*) FILTER (WHERE status = $1) AS deployed_devices,
            COUNT(*) FILTER (WHERE status = $2) AS not_deployed_devices,
            COUNT(*) FILTER (WHERE status = $3) AS recalled_devices
        FROM dim_device
        "#,
    )
    .bind(DeploymentStatus::Deployed.as_str())
    .bind(DeploymentStatus::NotDeployed.as_str())
    .bind(DeploymentStatus::Recalled.as_str())
    .fetch_one(&mut *conn)
    .await?;

    let networks = breakdown(&mut *conn, Breakdown::Network).await?;
    let categories = breakdown(&mut *conn, Breakdown::Category).await?;

    Ok(FleetStats {
        total_devices: summary.total_devices,
        active_devices: summary.active_devices,
        offline_devices: summary.offline_devices,
        deployed_devices: summary.deployed_devices,
        not_deployed_devices: summary.not_deployed_devices,
        recalled_devices: summary.recalled_devices,
        networks,
        categories,
    })
}

async fn breakdown(conn: &mut PgConnection, by: Breakdown) -> Result<Vec<GroupCount>> {
    let column = by.column();
    let query = format!(
        "SELECT {col} AS name, COUNT(*) AS count
         FROM dim_device
         GROUP BY {col}
         ORDER BY count DESC, name ASC NULLS LAST",
        col = column
    );

    let groups = sqlx::query_as::<_, GroupCount>(&query)
        .fetch_all(conn)
        .await?;
    Ok(groups)
}

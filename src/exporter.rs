use chrono::{DateTime, Local};
use rusoto_core::Region;
use rusoto_rds::{DBCluster, DBInstance};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::error::InventoryError;
use crate::normalizer::{
    global_cluster_of, normalize_cluster, normalize_instance, InstanceContext,
};
use crate::rds_inventory_client::{ClassCapacity, Describe, RdsInventoryClient};
use crate::schema::{Column, ReportWriter};

const REPORT_PREFIX: &str = "rds_insights_combined_";

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ExportSummary {
    pub instances: usize,
    pub clusters: usize,
    pub skipped: usize,
}

pub fn report_path(output_dir: &Path, now: DateTime<Local>) -> PathBuf {
    output_dir.join(format!(
        "{}{}.csv",
        REPORT_PREFIX,
        now.format("%Y-%m-%d_%H-%M-%S")
    ))
}

/// Writes the report for every configured region against the live RDS API.
pub async fn run_export(
    config: &ExportConfig,
    now: DateTime<Local>,
) -> Result<PathBuf, InventoryError> {
    let path = report_path(&config.output_dir, now);
    export_to_file(&path, &config.regions, |region| {
        RdsInventoryClient::new(region.clone())
    })
    .await?;
    Ok(path)
}

pub async fn export_to_file<C, F>(
    path: &Path,
    regions: &[Region],
    connect: F,
) -> Result<ExportSummary, InventoryError>
where
    C: Describe,
    F: Fn(&Region) -> C,
{
    let file = File::create(path)?;
    let mut writer = ReportWriter::new(file)?;
    let summary = export_regions(regions, connect, &mut writer).await?;
    writer.into_inner()?;
    Ok(summary)
}

/// Rows are written region by region, instances before clusters, in API order.
/// A failed describe call aborts the export; rows of earlier regions stay flushed.
pub async fn export_regions<C, F, W>(
    regions: &[Region],
    connect: F,
    writer: &mut ReportWriter<W>,
) -> Result<ExportSummary, InventoryError>
where
    C: Describe,
    F: Fn(&Region) -> C,
    W: Write,
{
    let mut summary = ExportSummary::default();
    for region in regions {
        let client = connect(region);
        let region_summary = export_region(region, &client, writer).await?;
        writer.flush()?;
        info!(
            region = region.name(),
            instances = region_summary.instances,
            clusters = region_summary.clusters,
            skipped = region_summary.skipped,
            "Exported RDS inventory"
        );
        summary.instances += region_summary.instances;
        summary.clusters += region_summary.clusters;
        summary.skipped += region_summary.skipped;
    }
    Ok(summary)
}

async fn export_region<C, W>(
    region: &Region,
    client: &C,
    writer: &mut ReportWriter<W>,
) -> Result<ExportSummary, InventoryError>
where
    C: Describe,
    W: Write,
{
    let instances = client.describe_all_instances().await?;
    let clusters = client.describe_all_clusters().await?;
    let global_clusters = match client.describe_all_global_clusters().await {
        Ok(global_clusters) => global_clusters,
        Err(error) => {
            warn!(region = region.name(), %error, "Global cluster lookup failed");
            Vec::new()
        }
    };

    let mut summary = ExportSummary::default();
    let mut capacities = HashMap::<(String, String), Option<ClassCapacity>>::new();

    for instance in &instances {
        let cluster = owning_cluster(instance, &clusters);
        let context = InstanceContext {
            region,
            capacity: class_capacity(client, instance, &mut capacities).await,
            cluster,
            global_cluster: cluster.and_then(|cluster| {
                global_cluster_of(&global_clusters, cluster.db_cluster_arn.as_deref())
            }),
        };
        match normalize_instance(instance, &context) {
            Ok(record) => {
                debug!(
                    identifier = record.get(Column::DbIdentifier),
                    "Writing instance row"
                );
                writer.write(&record)?;
                summary.instances += 1;
            }
            Err(error) => {
                warn!(region = region.name(), %error, "Skipping DB instance");
                summary.skipped += 1;
            }
        }
    }

    for cluster in &clusters {
        let global_cluster =
            global_cluster_of(&global_clusters, cluster.db_cluster_arn.as_deref());
        match normalize_cluster(cluster, region, global_cluster) {
            Ok(record) => {
                debug!(
                    identifier = record.get(Column::DbClusterIdentifier),
                    "Writing cluster row"
                );
                writer.write(&record)?;
                summary.clusters += 1;
            }
            Err(error) => {
                warn!(region = region.name(), %error, "Skipping DB cluster");
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

fn owning_cluster<'a>(
    instance: &DBInstance,
    clusters: &'a [DBCluster],
) -> Option<&'a DBCluster> {
    let identifier = instance.db_cluster_identifier.as_deref()?;
    clusters
        .iter()
        .find(|cluster| cluster.db_cluster_identifier.as_deref() == Some(identifier))
}

/// CPU layout for the instance class. A failed lookup leaves the columns blank.
async fn class_capacity<C: Describe>(
    client: &C,
    instance: &DBInstance,
    capacities: &mut HashMap<(String, String), Option<ClassCapacity>>,
) -> Option<ClassCapacity> {
    let engine = instance.engine.as_deref()?;
    let instance_class = instance.db_instance_class.as_deref()?;
    let key = (engine.to_string(), instance_class.to_string());
    if let Some(capacity) = capacities.get(&key) {
        return *capacity;
    }
    let capacity = match client.describe_class_capacity(engine, instance_class).await {
        Ok(capacity) => capacity,
        Err(error) => {
            warn!(engine, instance_class, %error, "Instance class lookup failed");
            None
        }
    };
    capacities.insert(key, capacity);
    capacity
}

//! The flat report layout shared by instance and cluster rows.

use crate::error::InventoryError;
use std::collections::HashMap;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    DbIdentifier,
    Status,
    Role,
    Engine,
    Region,
    Size,
    Cpu,
    VCpu,
    ProvisionedIops,
    StorageType,
    MultiAzLegacy,
    GlobalCluster,
    InstanceType,
    PerformanceInsightsEnabled,
    PerformanceInsightsKmsKeyId,
    PerformanceInsightsRetentionPeriod,
    ServerlessV2ScalingConfiguration,
    AvailabilityZone,
    PreferredMaintenanceWindow,
    BackupRetentionPeriod,
    MultiAz,
    PubliclyAccessible,
    VpcSecurityGroups,
    DbSubnetGroupName,
    ReadReplicaDbClusterIdentifiers,
    ProcessorFeatures,
    CoreCount,
    DbClusterIdentifier,
    ClusterStatus,
    ClusterEngine,
    ClusterRegion,
}

/// Declared column order. Both row kinds are written through this list.
pub const FIELDNAMES: [Column; 31] = [
    Column::DbIdentifier,
    Column::Status,
    Column::Role,
    Column::Engine,
    Column::Region,
    Column::Size,
    Column::Cpu,
    Column::VCpu,
    Column::ProvisionedIops,
    Column::StorageType,
    Column::MultiAzLegacy,
    Column::GlobalCluster,
    Column::InstanceType,
    Column::PerformanceInsightsEnabled,
    Column::PerformanceInsightsKmsKeyId,
    Column::PerformanceInsightsRetentionPeriod,
    Column::ServerlessV2ScalingConfiguration,
    Column::AvailabilityZone,
    Column::PreferredMaintenanceWindow,
    Column::BackupRetentionPeriod,
    Column::MultiAz,
    Column::PubliclyAccessible,
    Column::VpcSecurityGroups,
    Column::DbSubnetGroupName,
    Column::ReadReplicaDbClusterIdentifiers,
    Column::ProcessorFeatures,
    Column::CoreCount,
    Column::DbClusterIdentifier,
    Column::ClusterStatus,
    Column::ClusterEngine,
    Column::ClusterRegion,
];

impl Column {
    pub fn name(self) -> &'static str {
        match self {
            Column::DbIdentifier => "DBIdentifier",
            Column::Status => "Status",
            Column::Role => "Role",
            Column::Engine => "Engine",
            Column::Region => "Region",
            Column::Size => "Size",
            Column::Cpu => "CPU",
            Column::VCpu => "vCPU",
            Column::ProvisionedIops => "ProvisionedIOPS",
            Column::StorageType => "StorageType",
            Column::MultiAzLegacy => "Multi-AZ",
            Column::GlobalCluster => "GlobalCluster",
            Column::InstanceType => "InstanceType",
            Column::PerformanceInsightsEnabled => "PerformanceInsightsEnabled",
            Column::PerformanceInsightsKmsKeyId => "PerformanceInsightsKMSKeyId",
            Column::PerformanceInsightsRetentionPeriod => "PerformanceInsightsRetentionPeriod",
            Column::ServerlessV2ScalingConfiguration => "ServerlessV2ScalingConfiguration",
            Column::AvailabilityZone => "AvailabilityZone",
            Column::PreferredMaintenanceWindow => "PreferredMaintenanceWindow",
            Column::BackupRetentionPeriod => "BackupRetentionPeriod",
            Column::MultiAz => "MultiAZ",
            Column::PubliclyAccessible => "PubliclyAccessible",
            Column::VpcSecurityGroups => "VpcSecurityGroups",
            Column::DbSubnetGroupName => "DBSubnetGroupName",
            Column::ReadReplicaDbClusterIdentifiers => "ReadReplicaDBClusterIdentifiers",
            Column::ProcessorFeatures => "ProcessorFeatures",
            Column::CoreCount => "CoreCount",
            Column::DbClusterIdentifier => "DBClusterIdentifier",
            Column::ClusterStatus => "ClusterStatus",
            Column::ClusterEngine => "ClusterEngine",
            Column::ClusterRegion => "ClusterRegion",
        }
    }
}

/// One report row. Columns never set are written as empty cells.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FlatRecord {
    values: HashMap<Column, String>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: Column, value: String) -> &mut Self {
        self.values.insert(column, value);
        self
    }

    pub fn get(&self, column: Column) -> &str {
        self.values.get(&column).map_or("", String::as_str)
    }

    pub fn cells(&self) -> Vec<&str> {
        FIELDNAMES.iter().map(|column| self.get(*column)).collect()
    }
}

// Rendering of optional upstream values. A missing value is always an
// empty cell.

pub fn text(value: Option<&str>) -> String {
    value.map_or_else(String::new, str::to_string)
}

pub fn flag(value: Option<bool>) -> String {
    match value {
        Some(true) => "True".to_string(),
        Some(false) => "False".to_string(),
        None => String::new(),
    }
}

pub fn number(value: Option<i64>) -> String {
    value.map_or_else(String::new, |number| number.to_string())
}

pub fn joined<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| value.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    /// Wraps `sink` and writes the header row.
    pub fn new(sink: W) -> Result<Self, InventoryError> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(sink);
        writer.write_record(FIELDNAMES.iter().map(|column| column.name()))?;
        Ok(ReportWriter { writer })
    }

    pub fn write(&mut self, record: &FlatRecord) -> Result<(), InventoryError> {
        self.writer.write_record(record.cells())?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), InventoryError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, InventoryError> {
        self.writer
            .into_inner()
            .map_err(|error| InventoryError::Io(error.error().to_string()))
    }
}

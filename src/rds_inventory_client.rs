use async_trait::async_trait;
use rusoto_core::Region;
use rusoto_rds::{
    DBCluster, DBInstance, DescribeDBClustersMessage, DescribeDBInstancesMessage,
    DescribeGlobalClustersMessage, DescribeOrderableDBInstanceOptionsMessage, GlobalCluster, Rds,
    RdsClient,
};

use crate::error::InventoryError;

const PAGE_SIZE: i64 = 100;

/// Default processor layout RDS advertises for an engine and instance class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassCapacity {
    pub cores: i64,
    pub threads_per_core: i64,
}

impl ClassCapacity {
    pub fn vcpus(&self) -> i64 {
        self.cores * self.threads_per_core
    }
}

/// Read-only view of the RDS API for one region.
#[async_trait]
pub trait Describe {
    async fn describe_all_instances(&self) -> Result<Vec<DBInstance>, InventoryError>;
    async fn describe_all_clusters(&self) -> Result<Vec<DBCluster>, InventoryError>;
    async fn describe_all_global_clusters(&self) -> Result<Vec<GlobalCluster>, InventoryError>;
    async fn describe_class_capacity(
        &self,
        engine: &str,
        instance_class: &str,
    ) -> Result<Option<ClassCapacity>, InventoryError>;
}

pub struct RdsInventoryClient {
    client: RdsClient,
}

#[async_trait]
impl Describe for RdsInventoryClient {
    async fn describe_all_instances(&self) -> Result<Vec<DBInstance>, InventoryError> {
        let mut instances = Vec::<DBInstance>::new();
        let mut marker = None;
        loop {
            let request = DescribeDBInstancesMessage {
                max_records: Some(PAGE_SIZE),
                marker,
                ..DescribeDBInstancesMessage::default()
            };
            let result = self.client.describe_db_instances(request).await?;
            instances.extend(result.db_instances.unwrap_or_default());
            marker = result.marker;
            if marker.is_none() {
                break;
            }
        }
        Ok(instances)
    }

    async fn describe_all_clusters(&self) -> Result<Vec<DBCluster>, InventoryError> {
        let mut clusters = Vec::<DBCluster>::new();
        let mut marker = None;
        loop {
            let request = DescribeDBClustersMessage {
                max_records: Some(PAGE_SIZE),
                marker,
                ..DescribeDBClustersMessage::default()
            };
            let result = self.client.describe_db_clusters(request).await?;
            clusters.extend(result.db_clusters.unwrap_or_default());
            marker = result.marker;
            if marker.is_none() {
                break;
            }
        }
        Ok(clusters)
    }

    async fn describe_all_global_clusters(&self) -> Result<Vec<GlobalCluster>, InventoryError> {
        let mut global_clusters = Vec::<GlobalCluster>::new();
        let mut marker = None;
        loop {
            let request = DescribeGlobalClustersMessage {
                max_records: Some(PAGE_SIZE),
                marker,
                ..DescribeGlobalClustersMessage::default()
            };
            let result = self.client.describe_global_clusters(request).await?;
            global_clusters.extend(result.global_clusters.unwrap_or_default());
            marker = result.marker;
            if marker.is_none() {
                break;
            }
        }
        Ok(global_clusters)
    }

    async fn describe_class_capacity(
        &self,
        engine: &str,
        instance_class: &str,
    ) -> Result<Option<ClassCapacity>, InventoryError> {
        let request = DescribeOrderableDBInstanceOptionsMessage {
            engine: engine.to_string(),
            db_instance_class: Some(instance_class.to_string()),
            max_records: Some(PAGE_SIZE),
            ..DescribeOrderableDBInstanceOptionsMessage::default()
        };
        let result = self
            .client
            .describe_orderable_db_instance_options(request)
            .await?;

        let capacity = result
            .orderable_db_instance_options
            .unwrap_or_default()
            .into_iter()
            .filter_map(|option| option.available_processor_features)
            .find_map(|features| {
                let default_of = |name: &str| {
                    features
                        .iter()
                        .find(|feature| feature.name.as_deref() == Some(name))
                        .and_then(|feature| feature.default_value.as_deref())
                        .and_then(|value| value.trim().parse::<i64>().ok())
                };
                let cores = default_of("coreCount")?;
                let threads_per_core = default_of("threadsPerCore")?;
                Some(ClassCapacity {
                    cores,
                    threads_per_core,
                })
            });
        Ok(capacity)
    }
}

impl RdsInventoryClient {
    pub fn new(region: Region) -> Self {
        RdsInventoryClient {
            client: RdsClient::new(region),
        }
    }

    pub fn new_with_client(client: RdsClient) -> Self {
        RdsInventoryClient { client }
    }
}

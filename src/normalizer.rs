use rusoto_core::Region;
use rusoto_rds::{DBCluster, DBInstance, GlobalCluster, ProcessorFeature};

use crate::error::NormalizeError;
use crate::rds_inventory_client::ClassCapacity;
use crate::schema::{flag, joined, number, text, Column, FlatRecord};

const CORE_COUNT_FEATURE: &str = "coreCount";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Role {
    Standalone,
    Primary,
    Replica,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Standalone => "Standalone",
            Role::Primary => "Primary",
            Role::Replica => "Replica",
        }
    }
}

/// Lookups resolved by the caller before an instance is normalized.
#[derive(Debug, Clone, Copy)]
pub struct InstanceContext<'a> {
    pub region: &'a Region,
    pub capacity: Option<ClassCapacity>,
    pub cluster: Option<&'a DBCluster>,
    pub global_cluster: Option<&'a str>,
}

impl<'a> InstanceContext<'a> {
    pub fn new(region: &'a Region) -> Self {
        InstanceContext {
            region,
            capacity: None,
            cluster: None,
            global_cluster: None,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

pub fn infer_role(instance: &DBInstance) -> Role {
    if non_empty(instance.read_replica_source_db_instance_identifier.as_deref()).is_some() {
        return Role::Replica;
    }
    let has_replicas = instance
        .read_replica_db_instance_identifiers
        .iter()
        .chain(instance.read_replica_db_cluster_identifiers.iter())
        .any(|identifiers| !identifiers.is_empty());
    if has_replicas {
        Role::Primary
    } else {
        Role::Standalone
    }
}

/// Value of the `coreCount` processor feature. Absent or unparsable yields `None`.
pub fn extract_core_count(features: Option<&[ProcessorFeature]>) -> Option<i64> {
    features?
        .iter()
        .find(|feature| feature.name.as_deref() == Some(CORE_COUNT_FEATURE))
        .and_then(|feature| feature.value.as_deref())
        .and_then(|value| value.trim().parse::<i64>().ok())
}

fn processor_features(features: Option<&[ProcessorFeature]>) -> String {
    joined(features.unwrap_or_default().iter().filter_map(|feature| {
        let name = feature.name.as_deref()?;
        Some(format!("{}={}", name, feature.value.as_deref().unwrap_or_default()))
    }))
}

/// Capacity range of an Aurora Serverless v1 cluster (`ScalingConfigurationInfo`).
/// rusoto_rds has no Serverless v2 field, so v2 clusters yield `None`.
pub fn serverless_scaling(cluster: &DBCluster) -> Option<String> {
    let scaling = cluster.scaling_configuration_info.as_ref()?;
    if scaling.min_capacity.is_none() && scaling.max_capacity.is_none() {
        return None;
    }
    Some(format!(
        "MinCapacity={}, MaxCapacity={}",
        number(scaling.min_capacity),
        number(scaling.max_capacity)
    ))
}

/// Identifier of the global cluster that lists `cluster_arn` as a member.
pub fn global_cluster_of<'a>(
    global_clusters: &'a [GlobalCluster],
    cluster_arn: Option<&str>,
) -> Option<&'a str> {
    let cluster_arn = non_empty(cluster_arn)?;
    global_clusters
        .iter()
        .find(|global| {
            global
                .global_cluster_members
                .iter()
                .flatten()
                .any(|member| member.db_cluster_arn.as_deref() == Some(cluster_arn))
        })
        .and_then(|global| global.global_cluster_identifier.as_deref())
}

pub fn normalize_instance(
    instance: &DBInstance,
    context: &InstanceContext,
) -> Result<FlatRecord, NormalizeError> {
    let identifier = non_empty(instance.db_instance_identifier.as_deref())
        .ok_or(NormalizeError::MissingIdentifier)?;
    let features = instance.processor_features.as_deref();
    let security_groups = instance
        .vpc_security_groups
        .iter()
        .flatten()
        .filter_map(|group| group.vpc_security_group_id.as_deref());
    let replica_identifiers = instance
        .read_replica_db_instance_identifiers
        .iter()
        .chain(instance.read_replica_db_cluster_identifiers.iter())
        .flatten();

    let mut record = FlatRecord::new();
    record
        .set(Column::DbIdentifier, identifier.to_string())
        .set(Column::Status, text(instance.db_instance_status.as_deref()))
        .set(Column::Role, infer_role(instance).as_str().to_string())
        .set(Column::Engine, text(instance.engine.as_deref()))
        .set(Column::Region, context.region.name().to_string())
        .set(Column::Size, number(instance.allocated_storage))
        .set(Column::Cpu, number(context.capacity.map(|c| c.cores)))
        .set(Column::VCpu, number(context.capacity.map(|c| c.vcpus())))
        .set(Column::ProvisionedIops, number(instance.iops))
        .set(Column::StorageType, text(instance.storage_type.as_deref()))
        .set(Column::MultiAzLegacy, flag(instance.multi_az))
        .set(Column::GlobalCluster, text(context.global_cluster))
        .set(Column::InstanceType, text(instance.db_instance_class.as_deref()))
        .set(
            Column::PerformanceInsightsEnabled,
            flag(instance.performance_insights_enabled),
        )
        .set(
            Column::PerformanceInsightsKmsKeyId,
            text(instance.performance_insights_kms_key_id.as_deref()),
        )
        .set(
            Column::PerformanceInsightsRetentionPeriod,
            number(instance.performance_insights_retention_period),
        )
        .set(
            Column::ServerlessV2ScalingConfiguration,
            text(context.cluster.and_then(serverless_scaling).as_deref()),
        )
        .set(
            Column::AvailabilityZone,
            text(instance.availability_zone.as_deref()),
        )
        .set(
            Column::PreferredMaintenanceWindow,
            text(instance.preferred_maintenance_window.as_deref()),
        )
        .set(
            Column::BackupRetentionPeriod,
            number(instance.backup_retention_period),
        )
        .set(Column::MultiAz, flag(instance.multi_az))
        .set(Column::PubliclyAccessible, flag(instance.publicly_accessible))
        .set(Column::VpcSecurityGroups, joined(security_groups))
        .set(
            Column::DbSubnetGroupName,
            text(
                instance
                    .db_subnet_group
                    .as_ref()
                    .and_then(|group| group.db_subnet_group_name.as_deref()),
            ),
        )
        .set(
            Column::ReadReplicaDbClusterIdentifiers,
            joined(replica_identifiers),
        )
        .set(Column::ProcessorFeatures, processor_features(features))
        .set(Column::CoreCount, number(extract_core_count(features)))
        .set(
            Column::DbClusterIdentifier,
            text(instance.db_cluster_identifier.as_deref()),
        );
    Ok(record)
}

pub fn normalize_cluster(
    cluster: &DBCluster,
    region: &Region,
    global_cluster: Option<&str>,
) -> Result<FlatRecord, NormalizeError> {
    let identifier = non_empty(cluster.db_cluster_identifier.as_deref())
        .ok_or(NormalizeError::MissingIdentifier)?;

    let mut record = FlatRecord::new();
    record
        .set(Column::GlobalCluster, text(global_cluster))
        .set(Column::DbClusterIdentifier, identifier.to_string())
        .set(Column::ClusterStatus, text(cluster.status.as_deref()))
        .set(Column::ClusterEngine, text(cluster.engine.as_deref()))
        .set(Column::ClusterRegion, region.name().to_string());
    Ok(record)
}

#[cfg(test)]
mod tests {
    use crate::error::NormalizeError;
    use crate::normalizer::{
        extract_core_count, global_cluster_of, infer_role, normalize_cluster,
        normalize_instance, serverless_scaling, InstanceContext, Role,
    };
    use crate::rds_inventory_client::ClassCapacity;
    use crate::schema::{Column, FIELDNAMES};
    use rusoto_core::Region;
    use rusoto_rds::{
        DBCluster, DBInstance, DBSubnetGroup, GlobalCluster, GlobalClusterMember,
        ProcessorFeature, ScalingConfigurationInfo, VpcSecurityGroupMembership,
    };

    fn feature(name: &str, value: &str) -> ProcessorFeature {
        ProcessorFeature {
            name: Some(name.to_string()),
            value: Some(value.to_string()),
            ..ProcessorFeature::default()
        }
    }

    fn instance(identifier: &str) -> DBInstance {
        DBInstance {
            db_instance_identifier: Some(identifier.to_string()),
            db_instance_status: Some("available".to_string()),
            engine: Some("postgres".to_string()),
            db_instance_class: Some("db.m5.xlarge".to_string()),
            ..DBInstance::default()
        }
    }

    #[test]
    fn test_role_replica_when_source_present() {
        let replica = DBInstance {
            read_replica_source_db_instance_identifier: Some("source-db".to_string()),
            read_replica_db_instance_identifiers: Some(vec!["chained".to_string()]),
            ..instance("replica-db")
        };
        assert_eq!(infer_role(&replica), Role::Replica);
    }

    #[test]
    fn test_role_primary_when_replicas_present() {
        let primary = DBInstance {
            read_replica_source_db_instance_identifier: Some(String::new()),
            read_replica_db_instance_identifiers: Some(vec!["replica-db".to_string()]),
            ..instance("primary-db")
        };
        assert_eq!(infer_role(&primary), Role::Primary);

        let cross_cluster = DBInstance {
            read_replica_db_cluster_identifiers: Some(vec!["replica-cluster".to_string()]),
            ..instance("primary-db")
        };
        assert_eq!(infer_role(&cross_cluster), Role::Primary);
    }

    #[test]
    fn test_role_standalone() {
        assert_eq!(infer_role(&instance("lonely-db")), Role::Standalone);

        let empty_lists = DBInstance {
            read_replica_db_instance_identifiers: Some(vec![]),
            read_replica_db_cluster_identifiers: Some(vec![]),
            ..instance("lonely-db")
        };
        assert_eq!(infer_role(&empty_lists), Role::Standalone);
    }

    #[test]
    fn test_extract_core_count() {
        let features = vec![feature("threadsPerCore", "2"), feature("coreCount", "4")];
        assert_eq!(extract_core_count(Some(features.as_slice())), Some(4));
    }

    #[test]
    fn test_extract_core_count_missing() {
        assert_eq!(extract_core_count(None), None);
        assert_eq!(
            extract_core_count(Some(&[feature("threadsPerCore", "2")][..])),
            None
        );
        assert_eq!(extract_core_count(Some(&[feature("CoreCount", "4")][..])), None);
        assert_eq!(
            extract_core_count(Some(&[feature("coreCount", "four")][..])),
            None
        );
    }

    #[test]
    fn test_normalize_instance() {
        let region = Region::UsEast1;
        let db = DBInstance {
            allocated_storage: Some(100),
            iops: Some(1000),
            storage_type: Some("io1".to_string()),
            multi_az: Some(false),
            publicly_accessible: Some(true),
            backup_retention_period: Some(7),
            db_subnet_group: Some(DBSubnetGroup {
                db_subnet_group_name: Some("private".to_string()),
                ..DBSubnetGroup::default()
            }),
            vpc_security_groups: Some(vec![
                VpcSecurityGroupMembership {
                    vpc_security_group_id: Some("sg-1".to_string()),
                    status: Some("active".to_string()),
                    ..VpcSecurityGroupMembership::default()
                },
                VpcSecurityGroupMembership {
                    vpc_security_group_id: Some("sg-2".to_string()),
                    status: Some("active".to_string()),
                    ..VpcSecurityGroupMembership::default()
                },
            ]),
            read_replica_db_instance_identifiers: Some(vec!["reporting-db".to_string()]),
            processor_features: Some(vec![
                feature("coreCount", "4"),
                feature("threadsPerCore", "1"),
            ]),
            ..instance("orders-db")
        };
        let context = InstanceContext {
            capacity: Some(ClassCapacity {
                cores: 2,
                threads_per_core: 2,
            }),
            ..InstanceContext::new(&region)
        };

        let record = normalize_instance(&db, &context).unwrap();

        assert_eq!(record.get(Column::DbIdentifier), "orders-db");
        assert_eq!(record.get(Column::Status), "available");
        assert_eq!(record.get(Column::Role), "Primary");
        assert_eq!(record.get(Column::Engine), "postgres");
        assert_eq!(record.get(Column::Region), "us-east-1");
        assert_eq!(record.get(Column::Size), "100");
        assert_eq!(record.get(Column::Cpu), "2");
        assert_eq!(record.get(Column::VCpu), "4");
        assert_eq!(record.get(Column::ProvisionedIops), "1000");
        assert_eq!(record.get(Column::InstanceType), "db.m5.xlarge");
        assert_eq!(record.get(Column::MultiAz), "False");
        assert_eq!(record.get(Column::MultiAzLegacy), "False");
        assert_eq!(record.get(Column::PubliclyAccessible), "True");
        assert_eq!(record.get(Column::VpcSecurityGroups), "sg-1, sg-2");
        assert_eq!(record.get(Column::DbSubnetGroupName), "private");
        assert_eq!(
            record.get(Column::ReadReplicaDbClusterIdentifiers),
            "reporting-db"
        );
        assert_eq!(
            record.get(Column::ProcessorFeatures),
            "coreCount=4, threadsPerCore=1"
        );
        assert_eq!(record.get(Column::CoreCount), "4");
        assert_eq!(record.get(Column::ClusterRegion), "");
        assert_eq!(record.cells().len(), FIELDNAMES.len());
    }

    #[test]
    fn test_normalize_instance_without_performance_insights() {
        let region = Region::UsEast2;
        let record = normalize_instance(&instance("plain-db"), &InstanceContext::new(&region))
            .unwrap();

        for column in [
            Column::PerformanceInsightsEnabled,
            Column::PerformanceInsightsKmsKeyId,
            Column::PerformanceInsightsRetentionPeriod,
            Column::Cpu,
            Column::VCpu,
            Column::CoreCount,
            Column::ServerlessV2ScalingConfiguration,
        ]
        .iter()
        {
            assert_eq!(record.get(*column), "");
        }
        assert!(record.cells().iter().all(|cell| *cell != "None"));
    }

    #[test]
    fn test_normalize_instance_cluster_member() {
        let region = Region::UsEast2;
        let cluster = DBCluster {
            db_cluster_identifier: Some("billing".to_string()),
            scaling_configuration_info: Some(ScalingConfigurationInfo {
                min_capacity: Some(2),
                max_capacity: Some(16),
                ..ScalingConfigurationInfo::default()
            }),
            ..DBCluster::default()
        };
        let member = DBInstance {
            db_cluster_identifier: Some("billing".to_string()),
            ..instance("billing-1")
        };
        let context = InstanceContext {
            cluster: Some(&cluster),
            global_cluster: Some("billing-global"),
            ..InstanceContext::new(&region)
        };

        let record = normalize_instance(&member, &context).unwrap();

        assert_eq!(record.get(Column::DbClusterIdentifier), "billing");
        assert_eq!(record.get(Column::GlobalCluster), "billing-global");
        assert_eq!(
            record.get(Column::ServerlessV2ScalingConfiguration),
            "MinCapacity=2, MaxCapacity=16"
        );
        assert_eq!(record.get(Column::Role), "Standalone");
    }

    #[test]
    fn test_normalize_instance_missing_identifier() {
        let region = Region::UsEast1;
        let result = normalize_instance(&DBInstance::default(), &InstanceContext::new(&region));
        assert_eq!(result.err(), Some(NormalizeError::MissingIdentifier));
    }

    #[test]
    fn test_normalize_cluster() {
        let cluster = DBCluster {
            db_cluster_identifier: Some("billing".to_string()),
            status: Some("available".to_string()),
            engine: Some("aurora-postgresql".to_string()),
            ..DBCluster::default()
        };

        let record = normalize_cluster(&cluster, &Region::EuWest1, None).unwrap();

        assert_eq!(record.get(Column::DbClusterIdentifier), "billing");
        assert_eq!(record.get(Column::ClusterStatus), "available");
        assert_eq!(record.get(Column::ClusterEngine), "aurora-postgresql");
        assert_eq!(record.get(Column::ClusterRegion), "eu-west-1");
        assert_eq!(record.get(Column::DbIdentifier), "");
        assert_eq!(record.get(Column::Role), "");
        assert_eq!(record.get(Column::GlobalCluster), "");
    }

    #[test]
    fn test_normalize_cluster_missing_identifier() {
        let result = normalize_cluster(&DBCluster::default(), &Region::EuWest1, None);
        assert_eq!(result.err(), Some(NormalizeError::MissingIdentifier));
    }

    #[test]
    fn test_serverless_scaling_absent() {
        assert_eq!(serverless_scaling(&DBCluster::default()), None);
        let empty_scaling = DBCluster {
            scaling_configuration_info: Some(ScalingConfigurationInfo::default()),
            ..DBCluster::default()
        };
        assert_eq!(serverless_scaling(&empty_scaling), None);
    }

    #[test]
    fn test_serverless_column_blank_for_provisioned_cluster_member() {
        let region = Region::UsEast2;
        let cluster = DBCluster {
            db_cluster_identifier: Some("ledger".to_string()),
            engine_mode: Some("provisioned".to_string()),
            ..DBCluster::default()
        };
        let member = DBInstance {
            db_cluster_identifier: Some("ledger".to_string()),
            ..instance("ledger-1")
        };
        let context = InstanceContext {
            cluster: Some(&cluster),
            ..InstanceContext::new(&region)
        };

        let record = normalize_instance(&member, &context).unwrap();

        assert_eq!(record.get(Column::ServerlessV2ScalingConfiguration), "");
    }

    #[test]
    fn test_global_cluster_of() {
        let globals = vec![GlobalCluster {
            global_cluster_identifier: Some("billing-global".to_string()),
            global_cluster_members: Some(vec![GlobalClusterMember {
                db_cluster_arn: Some("arn:aws:rds:us-east-2:1:cluster:billing".to_string()),
                is_writer: Some(true),
                ..GlobalClusterMember::default()
            }]),
            ..GlobalCluster::default()
        }];

        assert_eq!(
            global_cluster_of(&globals, Some("arn:aws:rds:us-east-2:1:cluster:billing")),
            Some("billing-global")
        );
        assert_eq!(
            global_cluster_of(&globals, Some("arn:aws:rds:us-east-2:1:cluster:other")),
            None
        );
        assert_eq!(global_cluster_of(&globals, None), None);
    }
}

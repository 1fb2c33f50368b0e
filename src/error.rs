use std::error::Error;

use rusoto_core::RusotoError;
use rusoto_rds::{
    DescribeDBClustersError, DescribeDBInstancesError, DescribeGlobalClustersError,
    DescribeOrderableDBInstanceOptionsError,
};
use std::fmt;
use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq)]
pub enum InventoryError {
    Configuration(String),
    Io(String),
    Csv(String),
    DescribeInstances(RusotoError<DescribeDBInstancesError>),
    DescribeClusters(RusotoError<DescribeDBClustersError>),
    DescribeGlobalClusters(RusotoError<DescribeGlobalClustersError>),
    DescribeOrderableOptions(RusotoError<DescribeOrderableDBInstanceOptionsError>),
}

impl Display for InventoryError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            InventoryError::Configuration(ref message) => {
                write!(f, "Invalid configuration: {}", message)
            }
            InventoryError::Io(ref message) => write!(f, "Failed to write report: {}", message),
            InventoryError::Csv(ref message) => write!(f, "Failed to write csv row: {}", message),
            InventoryError::DescribeInstances(ref error) => {
                write!(f, "DescribeDBInstances failed: {}", error)
            }
            InventoryError::DescribeClusters(ref error) => {
                write!(f, "DescribeDBClusters failed: {}", error)
            }
            InventoryError::DescribeGlobalClusters(ref error) => {
                write!(f, "DescribeGlobalClusters failed: {}", error)
            }
            InventoryError::DescribeOrderableOptions(ref error) => {
                write!(f, "DescribeOrderableDBInstanceOptions failed: {}", error)
            }
        }
    }
}

impl Error for InventoryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            InventoryError::DescribeInstances(ref error) => Some(error),
            InventoryError::DescribeClusters(ref error) => Some(error),
            InventoryError::DescribeGlobalClusters(ref error) => Some(error),
            InventoryError::DescribeOrderableOptions(ref error) => Some(error),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InventoryError {
    fn from(e: std::io::Error) -> InventoryError {
        InventoryError::Io(e.to_string())
    }
}

impl From<csv::Error> for InventoryError {
    fn from(e: csv::Error) -> InventoryError {
        InventoryError::Csv(e.to_string())
    }
}

impl From<RusotoError<DescribeDBInstancesError>> for InventoryError {
    fn from(e: RusotoError<DescribeDBInstancesError>) -> InventoryError {
        InventoryError::DescribeInstances(e)
    }
}

impl From<RusotoError<DescribeDBClustersError>> for InventoryError {
    fn from(e: RusotoError<DescribeDBClustersError>) -> InventoryError {
        InventoryError::DescribeClusters(e)
    }
}

impl From<RusotoError<DescribeGlobalClustersError>> for InventoryError {
    fn from(e: RusotoError<DescribeGlobalClustersError>) -> InventoryError {
        InventoryError::DescribeGlobalClusters(e)
    }
}

impl From<RusotoError<DescribeOrderableDBInstanceOptionsError>> for InventoryError {
    fn from(e: RusotoError<DescribeOrderableDBInstanceOptionsError>) -> InventoryError {
        InventoryError::DescribeOrderableOptions(e)
    }
}

/// Per-entity failure: the descriptor is skipped, the run continues.
#[derive(Debug, PartialEq)]
pub enum NormalizeError {
    MissingIdentifier,
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            NormalizeError::MissingIdentifier => write!(f, "Descriptor has no identifier"),
        }
    }
}

impl Error for NormalizeError {}

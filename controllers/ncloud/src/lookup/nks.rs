//! NKS cluster and node-pool lookups (VPC only)

use super::{Criteria, exactly_one};
use crate::error::ReconcileError;
use crate::reconciler::Reconciler;
use ncloud_client::{DeploymentMode, NksCluster};
use serde::{Deserialize, Serialize};

const CLUSTER: &str = "nks_cluster";
const NODE_POOLS: &str = "nks_node_pools";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NksClusterQuery {
    pub uuid: String,
}

impl Reconciler {
    /// Find one cluster by uuid among the listed clusters
    pub async fn find_nks_cluster(&self, query: &NksClusterQuery) -> Result<NksCluster, ReconcileError> {
        self.require_modes(CLUSTER, &[DeploymentMode::Vpc])?;
        if query.uuid.trim().is_empty() {
            return Err(ReconcileError::validation(CLUSTER, "uuid is required"));
        }

        let clusters = self
            .client()
            .get_nks_clusters()
            .await
            .map_err(|e| ReconcileError::remote(CLUSTER, "list", None, e))?;

        let criteria = Criteria::new().with("uuid", Some(query.uuid.clone()), |c: &NksCluster, uuid| {
            c.uuid == *uuid
        });
        exactly_one(CLUSTER, clusters, &criteria)
    }

    /// Names of the node pools of a cluster
    pub async fn nks_node_pool_names(&self, cluster_uuid: &str) -> Result<Vec<String>, ReconcileError> {
        self.require_modes(NODE_POOLS, &[DeploymentMode::Vpc])?;

        let pools = self
            .client()
            .get_nks_node_pools(cluster_uuid)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    ReconcileError::not_found(CLUSTER, cluster_uuid)
                } else {
                    ReconcileError::remote(NODE_POOLS, "list", None, e)
                }
            })?;
        Ok(pools.into_iter().map(|pool| pool.name).collect())
    }
}

//! Server lookup by name, instance number and VPC

use super::{Criteria, exactly_one};
use crate::error::ReconcileError;
use crate::reconciler::Reconciler;
use ncloud_client::{ServerInstance, ServerListFilter};
use serde::{Deserialize, Serialize};

const KIND: &str = "server";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_no: Option<String>,
}

impl Reconciler {
    /// Find exactly one server in either mode
    pub async fn find_server(&self, query: &ServerQuery) -> Result<ServerInstance, ReconcileError> {
        // The vendor filters are a first cut; the criteria below decide
        let filter = ServerListFilter {
            server_instance_nos: query.instance_no.iter().cloned().collect(),
            server_name: query.name.clone(),
            vpc_no: query.vpc_no.clone(),
        };
        let servers = self
            .client()
            .get_server_instance_list(self.mode(), &filter)
            .await
            .map_err(|e| ReconcileError::remote(KIND, "list", None, e))?;

        let criteria = Criteria::new()
            .with("name", query.name.clone(), |s: &ServerInstance, name| s.server_name == *name)
            .with("instance_no", query.instance_no.clone(), |s: &ServerInstance, no| {
                s.server_instance_no == *no
            })
            .with("vpc_no", query.vpc_no.clone(), |s: &ServerInstance, vpc| {
                s.vpc_no.as_ref() == Some(vpc)
            });
        exactly_one(KIND, servers, &criteria)
    }
}

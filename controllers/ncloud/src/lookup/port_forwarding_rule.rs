//! Classic port-forwarding rule lookup

use super::{Criteria, exactly_one};
use crate::error::ReconcileError;
use crate::reconciler::Reconciler;
use ncloud_client::{DeploymentMode, PortForwardingRule, PortForwardingRuleFilter};
use serde::{Deserialize, Serialize};
use tracing::debug;

const KIND: &str = "port_forwarding_rule";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortForwardingRuleQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_instance_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_port: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_port: Option<i32>,
}

/// The matched rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortForwardingRuleInfo {
    /// Configuration number of the whole rule list
    pub configuration_no: Option<String>,
    pub public_ip: Option<String>,
    pub server_instance_no: Option<String>,
    pub internal_port: i32,
    pub external_port: i32,
}

impl Reconciler {
    /// Find exactly one port-forwarding rule; classic mode only
    pub async fn find_port_forwarding_rule(
        &self,
        query: &PortForwardingRuleQuery,
    ) -> Result<PortForwardingRuleInfo, ReconcileError> {
        self.require_modes(KIND, &[DeploymentMode::Classic])?;

        let filter = PortForwardingRuleFilter {
            region_no: query.region_no.clone(),
            zone_no: query.zone_no.clone(),
        };
        let list = self
            .client()
            .get_port_forwarding_rule_list(&filter)
            .await
            .map_err(|e| ReconcileError::remote(KIND, "list", None, e))?;
        debug!(
            "Listed {} port forwarding rules",
            list.port_forwarding_rule_list.len()
        );

        let criteria = Criteria::new()
            .with(
                "server_instance_no",
                query.server_instance_no.clone(),
                |rule: &PortForwardingRule, no| {
                    rule.server_instance
                        .as_ref()
                        .is_some_and(|server| server.server_instance_no == *no)
                },
            )
            .with("internal_port", query.internal_port, |rule: &PortForwardingRule, port| {
                rule.port_forwarding_internal_port == *port
            })
            .with("external_port", query.external_port, |rule: &PortForwardingRule, port| {
                rule.port_forwarding_external_port == *port
            });

        let rule = exactly_one(KIND, list.port_forwarding_rule_list, &criteria)?;
        let server = rule.server_instance.as_ref();
        Ok(PortForwardingRuleInfo {
            configuration_no: list.port_forwarding_configuration_no,
            public_ip: server
                .and_then(|s| s.port_forwarding_public_ip.clone())
                .or(list.port_forwarding_public_ip),
            server_instance_no: server.map(|s| s.server_instance_no.clone()),
            internal_port: rule.port_forwarding_internal_port,
            external_port: rule.port_forwarding_external_port,
        })
    }
}

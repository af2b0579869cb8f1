//! Test utilities for unit testing reconcilers
//!
//! Builds reconcilers over a `MockNcloudClient` with short poll cadences, and
//! specs that validate in each deployment mode.

#[cfg(test)]
use crate::config::{PollSettings, ProviderConfig, Timeouts};
#[cfg(test)]
use crate::reconciler::{
    NatGatewaySpec, NksClusterSpec, Reconciler, ServerSpec, SubnetSpec, VpcSpec,
};
#[cfg(test)]
use ncloud_client::{CommonCode, Credentials, Endpoints, MockNcloudClient, ServerInstance, Site};
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

/// Provider configuration with a 1s poll interval and 5 minute deadlines
#[cfg(test)]
pub fn test_config(support_vpc: bool) -> ProviderConfig {
    ProviderConfig {
        credentials: Credentials::new("test-access-key", "test-secret-key"),
        region: "KR".to_string(),
        site: Site::Public,
        endpoints: Endpoints::for_site(Site::Public),
        support_vpc,
        poll: PollSettings {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(5),
            not_found_tolerance: 3,
        },
        timeouts: Timeouts {
            create: Duration::from_secs(300),
            update: Duration::from_secs(300),
            delete: Duration::from_secs(300),
        },
    }
}

/// Reconciler over a fresh mock; the mock is returned for inspection
#[cfg(test)]
pub fn test_reconciler(support_vpc: bool) -> (Reconciler, MockNcloudClient) {
    let mock = MockNcloudClient::new("KR");
    let reconciler = Reconciler::new(Arc::new(mock.clone()), &test_config(support_vpc));
    (reconciler, mock)
}

/// Classic server spec
#[cfg(test)]
pub fn classic_server_spec(name: &str) -> ServerSpec {
    ServerSpec {
        name: name.to_string(),
        image_product_code: "SPSW0LINUX000046".to_string(),
        product_code: Some("SPSVRSTAND000004".to_string()),
        zone_no: Some("3".to_string()),
        ..Default::default()
    }
}

/// VPC server spec
#[cfg(test)]
pub fn vpc_server_spec(name: &str) -> ServerSpec {
    ServerSpec {
        name: name.to_string(),
        image_product_code: "SW.VSVR.OS.LNX64.CNTOS.0703.B050".to_string(),
        product_code: Some("SVR.VSVR.STAND.C002.M008.NET.SSD.B050.G002".to_string()),
        login_key_name: Some("tf-test-key".to_string()),
        vpc_no: Some("4021".to_string()),
        subnet_no: Some("11734".to_string()),
        ..Default::default()
    }
}

/// Server already present in the mock with a settled status
#[cfg(test)]
pub fn create_test_server(no: &str, name: &str, status: &str) -> ServerInstance {
    ServerInstance {
        server_instance_no: no.to_string(),
        server_name: name.to_string(),
        server_product_code: Some("SPSVRSTAND000004".to_string()),
        server_instance_status: Some(CommonCode::new(status)),
        ..Default::default()
    }
}

#[cfg(test)]
pub fn vpc_spec(name: &str) -> VpcSpec {
    VpcSpec {
        name: name.to_string(),
        ipv4_cidr_block: "10.0.0.0/16".to_string(),
    }
}

#[cfg(test)]
pub fn subnet_spec(vpc_no: &str) -> SubnetSpec {
    SubnetSpec {
        name: "tf-test-subnet".to_string(),
        vpc_no: vpc_no.to_string(),
        zone: "KR-1".to_string(),
        subnet: "10.0.1.0/24".to_string(),
        network_acl_no: "7001".to_string(),
        subnet_type: "PRIVATE".to_string(),
        usage_type: None,
    }
}

#[cfg(test)]
pub fn nat_gateway_spec(vpc_no: &str) -> NatGatewaySpec {
    NatGatewaySpec {
        vpc_no: vpc_no.to_string(),
        zone: "KR-1".to_string(),
        name: Some("tf-test-nat".to_string()),
        description: Some("egress".to_string()),
    }
}

#[cfg(test)]
pub fn nks_cluster_spec(name: &str) -> NksClusterSpec {
    NksClusterSpec {
        name: name.to_string(),
        cluster_type: "SVR.VNKS.STAND.C002.M008.NET.SSD.B050.G002".to_string(),
        login_key_name: "tf-test-key".to_string(),
        k8s_version: Some("1.27.9-nks.1".to_string()),
        zone: "KR-1".to_string(),
        vpc_no: "4021".to_string(),
        subnet_no_list: vec!["11734".to_string()],
        lb_private_subnet_no: "11735".to_string(),
        lb_public_subnet_no: None,
        kube_network_plugin: Some("cilium".to_string()),
    }
}

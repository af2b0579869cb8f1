//! Integration tests for NCloud client
//!
//! These tests call the real API gateways.
//! Set NCLOUD_ACCESS_KEY and NCLOUD_SECRET_KEY environment variables to run.

use ncloud_client::{
    Credentials, DeploymentMode, Endpoints, NcloudClient, NcloudClientTrait,
    PortForwardingRuleFilter, ServerListFilter, Site,
};

fn live_client() -> NcloudClient {
    let access_key = std::env::var("NCLOUD_ACCESS_KEY")
        .expect("NCLOUD_ACCESS_KEY environment variable must be set");
    let secret_key = std::env::var("NCLOUD_SECRET_KEY")
        .expect("NCLOUD_SECRET_KEY environment variable must be set");
    let region = std::env::var("NCLOUD_REGION").unwrap_or_else(|_| "KR".to_string());

    NcloudClient::new(
        Endpoints::for_site(Site::Public),
        Credentials::new(access_key, secret_key),
        region,
    )
    .expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires NCloud credentials
async fn test_list_vpc_servers() {
    let client = live_client();
    let servers = client
        .get_server_instance_list(DeploymentMode::Vpc, &ServerListFilter::default())
        .await
        .expect("Failed to list servers");

    println!("Found {} VPC servers", servers.len());
}

#[tokio::test]
#[ignore]
async fn test_list_classic_port_forwarding_rules() {
    let client = live_client();
    let rules = client
        .get_port_forwarding_rule_list(&PortForwardingRuleFilter::default())
        .await
        .expect("Failed to list port forwarding rules");

    println!(
        "Configuration {:?} has {} rules",
        rules.port_forwarding_configuration_no,
        rules.port_forwarding_rule_list.len()
    );
}

#[tokio::test]
#[ignore]
async fn test_list_nks_clusters() {
    let client = live_client();
    let clusters = client
        .get_nks_clusters()
        .await
        .expect("Failed to list clusters");

    println!("Found {} clusters", clusters.len());
}

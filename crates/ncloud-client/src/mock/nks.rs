//! Kubernetes service operations for MockNcloudClient

use super::{MockKind, MockNcloudClient, MockPhase, lock};
use crate::error::NcloudError;
use crate::models::*;

fn not_found(uuid: &str) -> NcloudError {
    NcloudError::NotFound(format!("Cluster {} not found", uuid))
}

pub fn create_nks_cluster(
    client: &MockNcloudClient,
    request: &CreateNksClusterRequest,
) -> Result<String, NcloudError> {
    client.enter("create_nks_cluster")?;

    let id = client.next_id();
    let uuid = format!("{:08x}-5c1e-4a5b-9d2f-{:012x}", id, id);
    let cluster = NksCluster {
        uuid: uuid.clone(),
        name: request.name.clone(),
        cluster_type: request.cluster_type.clone(),
        login_key_name: request.login_key_name.clone(),
        k8s_version: Some(
            request
                .k8s_version
                .clone()
                .unwrap_or_else(|| "1.27.9-nks.1".to_string()),
        ),
        zone_code: request.zone_code.clone(),
        vpc_no: request.vpc_no,
        subnet_no_list: request.subnet_no_list.clone(),
        lb_private_subnet_no: Some(request.lb_private_subnet_no),
        lb_public_subnet_no: request.lb_public_subnet_no,
        kube_network_plugin: request.kube_network_plugin.clone(),
        created_at: Some(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let statuses = client.progression(MockKind::NksCluster, MockPhase::Create);
    lock(&client.nks_clusters).insert_created(uuid.clone(), cluster, &statuses);
    Ok(uuid)
}

pub fn get_nks_cluster(client: &MockNcloudClient, uuid: &str) -> Result<NksCluster, NcloudError> {
    client.enter("get_nks_cluster")?;
    lock(&client.nks_clusters)
        .observe(uuid)
        .ok_or_else(|| not_found(uuid))
}

pub fn get_nks_clusters(client: &MockNcloudClient) -> Result<Vec<NksCluster>, NcloudError> {
    client.enter("get_nks_clusters")?;
    Ok(lock(&client.nks_clusters).observe_where(|_| true))
}

pub fn upgrade_nks_cluster(
    client: &MockNcloudClient,
    uuid: &str,
    k8s_version: &str,
) -> Result<(), NcloudError> {
    client.enter("upgrade_nks_cluster")?;

    let statuses = client.progression(MockKind::NksCluster, MockPhase::Update);
    let mut clusters = lock(&client.nks_clusters);
    let cluster = clusters.get_mut(uuid).ok_or_else(|| not_found(uuid))?;
    cluster.k8s_version = Some(k8s_version.to_string());
    clusters.schedule(uuid, &statuses, false);
    Ok(())
}

pub fn delete_nks_cluster(client: &MockNcloudClient, uuid: &str) -> Result<(), NcloudError> {
    client.enter("delete_nks_cluster")?;

    let statuses = client.progression(MockKind::NksCluster, MockPhase::Delete);
    if lock(&client.nks_clusters).schedule(uuid, &statuses, true) {
        lock(&client.node_pools).remove(uuid);
        Ok(())
    } else {
        Err(not_found(uuid))
    }
}

pub fn get_nks_node_pools(client: &MockNcloudClient, uuid: &str) -> Result<Vec<NodePool>, NcloudError> {
    client.enter("get_nks_node_pools")?;

    if lock(&client.nks_clusters).peek(uuid).is_none() {
        return Err(not_found(uuid));
    }
    Ok(lock(&client.node_pools)
        .get(uuid)
        .cloned()
        .unwrap_or_default())
}

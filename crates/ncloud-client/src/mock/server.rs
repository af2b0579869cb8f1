//! Server operations for MockNcloudClient
//!
//! Mirrors the vendor's preconditions: a running server has to be stopped
//! before its spec can change or it can be terminated.

use super::{MockKind, MockNcloudClient, MockPhase, lock};
use crate::error::NcloudError;
use crate::models::*;

fn not_found(server_instance_no: &str) -> NcloudError {
    NcloudError::NotFound(format!("Server instance {} not found", server_instance_no))
}

fn require_stopped(server: &ServerInstance, action: &str) -> Result<(), NcloudError> {
    if server.status_code() == "NSTOP" {
        Ok(())
    } else {
        Err(NcloudError::Api {
            status: 400,
            code: "25013".to_string(),
            message: format!(
                "{}: server {} must be stopped (status {})",
                action,
                server.server_instance_no,
                server.status_code()
            ),
        })
    }
}

pub fn create_server_instance(
    client: &MockNcloudClient,
    mode: DeploymentMode,
    request: &CreateServerRequest,
) -> Result<ServerInstance, NcloudError> {
    client.enter("create_server_instance")?;

    let no = client.next_id().to_string();
    let server = ServerInstance {
        server_instance_no: no.clone(),
        server_name: request.server_name.clone(),
        server_description: request.server_description.clone(),
        server_image_product_code: Some(request.server_image_product_code.clone()),
        server_product_code: Some(
            request
                .server_product_code
                .clone()
                .unwrap_or_else(|| "SPSVRSTAND000004".to_string()),
        ),
        zone_code: match mode {
            DeploymentMode::Classic => request.zone_no.clone(),
            DeploymentMode::Vpc => Some(format!("{}-1", client.region)),
        },
        vpc_no: request.vpc_no.clone(),
        subnet_no: request.subnet_no.clone(),
        login_key_name: request.login_key_name.clone(),
        create_date: Some(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };

    let statuses = client.progression(MockKind::Server, MockPhase::Create);
    Ok(lock(&client.servers).insert_created(no, server, &statuses))
}

pub fn get_server_instance_list(
    client: &MockNcloudClient,
    _mode: DeploymentMode,
    filter: &ServerListFilter,
) -> Result<Vec<ServerInstance>, NcloudError> {
    client.enter("get_server_instance_list")?;

    Ok(lock(&client.servers).observe_where(|server| {
        (filter.server_instance_nos.is_empty()
            || filter.server_instance_nos.contains(&server.server_instance_no))
            && filter
                .server_name
                .as_ref()
                .is_none_or(|name| *name == server.server_name)
            && filter
                .vpc_no
                .as_ref()
                .is_none_or(|vpc| server.vpc_no.as_ref() == Some(vpc))
    }))
}

pub fn stop_server_instance(
    client: &MockNcloudClient,
    _mode: DeploymentMode,
    server_instance_no: &str,
) -> Result<(), NcloudError> {
    client.enter("stop_server_instance")?;

    let statuses = client.progression(MockKind::Server, MockPhase::Stop);
    let mut servers = lock(&client.servers);
    if !servers.schedule(server_instance_no, &statuses, false) {
        return Err(not_found(server_instance_no));
    }
    Ok(())
}

pub fn start_server_instance(
    client: &MockNcloudClient,
    _mode: DeploymentMode,
    server_instance_no: &str,
) -> Result<(), NcloudError> {
    client.enter("start_server_instance")?;

    let statuses = client.progression(MockKind::Server, MockPhase::Start);
    let mut servers = lock(&client.servers);
    if !servers.schedule(server_instance_no, &statuses, false) {
        return Err(not_found(server_instance_no));
    }
    Ok(())
}

pub fn change_server_instance_spec(
    client: &MockNcloudClient,
    _mode: DeploymentMode,
    server_instance_no: &str,
    server_product_code: &str,
) -> Result<(), NcloudError> {
    client.enter("change_server_instance_spec")?;

    let statuses = client.progression(MockKind::Server, MockPhase::Update);
    let mut servers = lock(&client.servers);
    let server = servers
        .get_mut(server_instance_no)
        .ok_or_else(|| not_found(server_instance_no))?;
    require_stopped(server, "changeServerInstanceSpec")?;
    server.server_product_code = Some(server_product_code.to_string());
    servers.schedule(server_instance_no, &statuses, false);
    Ok(())
}

pub fn terminate_server_instance(
    client: &MockNcloudClient,
    _mode: DeploymentMode,
    server_instance_no: &str,
) -> Result<(), NcloudError> {
    client.enter("terminate_server_instance")?;

    let statuses = client.progression(MockKind::Server, MockPhase::Delete);
    let mut servers = lock(&client.servers);
    let server = servers
        .get_mut(server_instance_no)
        .ok_or_else(|| not_found(server_instance_no))?;
    require_stopped(server, "terminateServerInstances")?;
    servers.schedule(server_instance_no, &statuses, true);
    Ok(())
}

pub fn get_port_forwarding_rule_list(
    client: &MockNcloudClient,
    _filter: &PortForwardingRuleFilter,
) -> Result<PortForwardingRuleList, NcloudError> {
    client.enter("get_port_forwarding_rule_list")?;
    Ok(lock(&client.port_forwarding).clone())
}

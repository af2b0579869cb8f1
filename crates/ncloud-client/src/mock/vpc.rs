//! VPC operations for MockNcloudClient
//!
//! Handles VPCs, subnets and NAT gateways

use super::{MockKind, MockNcloudClient, MockPhase, lock};
use crate::error::NcloudError;
use crate::models::*;

fn matches_nos(nos: &[String], no: &str) -> bool {
    nos.is_empty() || nos.iter().any(|n| n == no)
}

pub fn create_vpc(client: &MockNcloudClient, request: &CreateVpcRequest) -> Result<Vpc, NcloudError> {
    client.enter("create_vpc")?;

    let no = client.next_id().to_string();
    let vpc = Vpc {
        vpc_no: no.clone(),
        vpc_name: request.vpc_name.clone(),
        ipv4_cidr_block: request.ipv4_cidr_block.clone(),
        region_code: Some(client.region.clone()),
        create_date: Some(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let statuses = client.progression(MockKind::Vpc, MockPhase::Create);
    Ok(lock(&client.vpcs).insert_created(no, vpc, &statuses))
}

pub fn get_vpc_list(client: &MockNcloudClient, filter: &VpcListFilter) -> Result<Vec<Vpc>, NcloudError> {
    client.enter("get_vpc_list")?;

    Ok(lock(&client.vpcs).observe_where(|vpc| {
        matches_nos(&filter.vpc_nos, &vpc.vpc_no)
            && filter.vpc_name.as_ref().is_none_or(|name| *name == vpc.vpc_name)
    }))
}

pub fn delete_vpc(client: &MockNcloudClient, vpc_no: &str) -> Result<(), NcloudError> {
    client.enter("delete_vpc")?;

    let statuses = client.progression(MockKind::Vpc, MockPhase::Delete);
    if lock(&client.vpcs).schedule(vpc_no, &statuses, true) {
        Ok(())
    } else {
        Err(NcloudError::NotFound(format!("VPC {} not found", vpc_no)))
    }
}

pub fn create_subnet(client: &MockNcloudClient, request: &CreateSubnetRequest) -> Result<Subnet, NcloudError> {
    client.enter("create_subnet")?;

    let no = client.next_id().to_string();
    let subnet = Subnet {
        subnet_no: no.clone(),
        vpc_no: request.vpc_no.clone(),
        zone_code: request.zone_code.clone(),
        subnet_name: request.subnet_name.clone(),
        subnet: request.subnet.clone(),
        subnet_type: Some(CommonCode::new(request.subnet_type_code.as_str())),
        usage_type: Some(CommonCode::new(
            request.usage_type_code.as_deref().unwrap_or("GEN"),
        )),
        network_acl_no: Some(request.network_acl_no.clone()),
        ..Default::default()
    };
    let statuses = client.progression(MockKind::Subnet, MockPhase::Create);
    Ok(lock(&client.subnets).insert_created(no, subnet, &statuses))
}

pub fn get_subnet_list(client: &MockNcloudClient, filter: &SubnetListFilter) -> Result<Vec<Subnet>, NcloudError> {
    client.enter("get_subnet_list")?;

    Ok(lock(&client.subnets).observe_where(|subnet| {
        matches_nos(&filter.subnet_nos, &subnet.subnet_no)
            && filter.vpc_no.as_ref().is_none_or(|vpc| *vpc == subnet.vpc_no)
            && filter
                .subnet_name
                .as_ref()
                .is_none_or(|name| *name == subnet.subnet_name)
    }))
}

pub fn set_subnet_network_acl(
    client: &MockNcloudClient,
    subnet_no: &str,
    network_acl_no: &str,
) -> Result<(), NcloudError> {
    client.enter("set_subnet_network_acl")?;

    let statuses = client.progression(MockKind::Subnet, MockPhase::Update);
    let mut subnets = lock(&client.subnets);
    let subnet = subnets
        .get_mut(subnet_no)
        .ok_or_else(|| NcloudError::NotFound(format!("Subnet {} not found", subnet_no)))?;
    subnet.network_acl_no = Some(network_acl_no.to_string());
    subnets.schedule(subnet_no, &statuses, false);
    Ok(())
}

pub fn delete_subnet(client: &MockNcloudClient, subnet_no: &str) -> Result<(), NcloudError> {
    client.enter("delete_subnet")?;

    let statuses = client.progression(MockKind::Subnet, MockPhase::Delete);
    if lock(&client.subnets).schedule(subnet_no, &statuses, true) {
        Ok(())
    } else {
        Err(NcloudError::NotFound(format!("Subnet {} not found", subnet_no)))
    }
}

pub fn create_nat_gateway_instance(
    client: &MockNcloudClient,
    request: &CreateNatGatewayRequest,
) -> Result<NatGatewayInstance, NcloudError> {
    client.enter("create_nat_gateway_instance")?;

    let no = client.next_id().to_string();
    let nat_gateway = NatGatewayInstance {
        nat_gateway_instance_no: no.clone(),
        nat_gateway_name: request
            .nat_gateway_name
            .clone()
            .unwrap_or_else(|| format!("nat-{}", no)),
        nat_gateway_description: request.nat_gateway_description.clone(),
        vpc_no: request.vpc_no.clone(),
        zone_code: request.zone_code.clone(),
        ..Default::default()
    };
    let statuses = client.progression(MockKind::NatGateway, MockPhase::Create);
    Ok(lock(&client.nat_gateways).insert_created(no, nat_gateway, &statuses))
}

pub fn get_nat_gateway_instance_list(
    client: &MockNcloudClient,
    filter: &NatGatewayListFilter,
) -> Result<Vec<NatGatewayInstance>, NcloudError> {
    client.enter("get_nat_gateway_instance_list")?;

    Ok(lock(&client.nat_gateways).observe_where(|nat| {
        matches_nos(&filter.nat_gateway_instance_nos, &nat.nat_gateway_instance_no)
            && filter.vpc_no.as_ref().is_none_or(|vpc| *vpc == nat.vpc_no)
    }))
}

pub fn set_nat_gateway_description(
    client: &MockNcloudClient,
    nat_gateway_instance_no: &str,
    description: &str,
) -> Result<(), NcloudError> {
    client.enter("set_nat_gateway_description")?;

    let statuses = client.progression(MockKind::NatGateway, MockPhase::Update);
    let mut nat_gateways = lock(&client.nat_gateways);
    let nat = nat_gateways.get_mut(nat_gateway_instance_no).ok_or_else(|| {
        NcloudError::NotFound(format!("NAT gateway {} not found", nat_gateway_instance_no))
    })?;
    nat.nat_gateway_description = Some(description.to_string());
    nat_gateways.schedule(nat_gateway_instance_no, &statuses, false);
    Ok(())
}

pub fn delete_nat_gateway_instance(
    client: &MockNcloudClient,
    nat_gateway_instance_no: &str,
) -> Result<(), NcloudError> {
    client.enter("delete_nat_gateway_instance")?;

    let statuses = client.progression(MockKind::NatGateway, MockPhase::Delete);
    if lock(&client.nat_gateways).schedule(nat_gateway_instance_no, &statuses, true) {
        Ok(())
    } else {
        Err(NcloudError::NotFound(format!(
            "NAT gateway {} not found",
            nat_gateway_instance_no
        )))
    }
}

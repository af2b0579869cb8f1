//! Status code bookkeeping for mocked resources
//!
//! Besides the code itself, reaching a running state fills in the attributes
//! the vendor assigns asynchronously (private IP, cluster endpoint).

use super::store::MockStatus;
use crate::models::*;

fn server_status_name(code: &str) -> &'static str {
    match code {
        "INIT" => "init",
        "CREAT" => "creating",
        "RUN" => "running",
        "SHTDN" => "stopping",
        "NSTOP" => "stopped",
        "BOOT" => "booting",
        "TERMTING" => "terminating",
        _ => "unknown",
    }
}

impl MockStatus for ServerInstance {
    fn apply_status(&mut self, code: &str) {
        self.server_instance_status = Some(CommonCode::new(code));
        self.server_instance_status_name = Some(server_status_name(code).to_string());
        if code == "RUN" && self.private_ip.is_none() {
            let host = self
                .server_instance_no
                .parse::<u64>()
                .map(|no| no % 250 + 2)
                .unwrap_or(10);
            self.private_ip = Some(format!("10.0.1.{}", host));
        }
    }
}

impl MockStatus for Vpc {
    fn apply_status(&mut self, code: &str) {
        self.vpc_status = Some(CommonCode::new(code));
    }
}

impl MockStatus for Subnet {
    fn apply_status(&mut self, code: &str) {
        self.subnet_status = Some(CommonCode::new(code));
    }
}

impl MockStatus for NatGatewayInstance {
    fn apply_status(&mut self, code: &str) {
        self.nat_gateway_instance_status = Some(CommonCode::new(code));
        self.nat_gateway_instance_status_name = Some(code.to_lowercase());
        if code == "RUN" && self.public_ip.is_none() {
            self.public_ip = Some("203.0.113.10".to_string());
        }
    }
}

impl MockStatus for NksCluster {
    fn apply_status(&mut self, code: &str) {
        self.status = code.to_string();
        if code == "RUNNING" && self.endpoint.is_none() {
            self.endpoint = Some(format!("https://{}.kr.vnks.ntruss.com", self.uuid));
        }
    }
}

//! Unit tests for VPC networking: VPCs, subnets and NAT gateways

#[cfg(test)]
mod tests {
    use crate::error::ReconcileError;
    use crate::lifecycle::Handle;
    use crate::reconciler::{ManagedResource, NatGatewayResource, SubnetResource, VpcResource};
    use crate::test_utils::*;
    use ncloud_client::DeploymentMode;

    #[tokio::test(start_paused = true)]
    async fn test_vpc_lifecycle() {
        let (reconciler, mock) = test_reconciler(true);

        let observed = reconciler
            .provision::<VpcResource>(&vpc_spec("tf-test-vpc"))
            .await
            .expect("vpc ready");
        assert_eq!(observed.status, "RUN");
        assert_eq!(observed.resource.ipv4_cidr_block, "10.0.0.0/16");

        reconciler
            .destroy::<VpcResource>(&observed.handle)
            .await
            .expect("vpc destroyed");
        assert!(mock.vpc(observed.handle.as_str()).is_none());
        assert_eq!(mock.calls_to("delete_vpc"), 1);
    }

    #[tokio::test]
    async fn test_vpc_cidr_is_validated() {
        let (reconciler, mock) = test_reconciler(true);

        let mut public_range = vpc_spec("tf-test-vpc");
        public_range.ipv4_cidr_block = "8.8.0.0/16".to_string();
        let err = reconciler.create::<VpcResource>(&public_range).await.expect_err("public range");
        assert!(matches!(err, ReconcileError::Validation { kind: "vpc", .. }));

        let mut too_small = vpc_spec("tf-test-vpc");
        too_small.ipv4_cidr_block = "10.0.0.0/29".to_string();
        let err = reconciler.create::<VpcResource>(&too_small).await.expect_err("prefix too long");
        assert!(err.to_string().contains("/16"), "{}", err);

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vpc_rename_requires_recreate() {
        let (reconciler, mock) = test_reconciler(true);
        let current = vpc_spec("tf-test-vpc");
        let observed = reconciler.provision::<VpcResource>(&current).await.expect("ready");
        mock.clear_calls();

        let err = reconciler
            .update::<VpcResource>(&observed.handle, &current, &vpc_spec("tf-other-vpc"))
            .await
            .expect_err("name is creation-only");
        assert!(matches!(err, ReconcileError::ImmutableFieldChanged { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subnet_network_acl_updates_in_place() {
        let (reconciler, mock) = test_reconciler(true);
        let current = subnet_spec("4021");
        let observed = reconciler.provision::<SubnetResource>(&current).await.expect("ready");

        let mut desired = current.clone();
        desired.network_acl_no = "7002".to_string();
        let updated = reconciler
            .update::<SubnetResource>(&observed.handle, &current, &desired)
            .await
            .expect("acl swapped");

        assert_eq!(updated.handle, observed.handle);
        assert_eq!(updated.resource.network_acl_no.as_deref(), Some("7002"));
        assert_eq!(mock.calls_to("set_subnet_network_acl"), 1);
        assert_eq!(mock.calls_to("create_subnet"), 1);
    }

    #[tokio::test]
    async fn test_subnet_type_is_validated() {
        let (reconciler, mock) = test_reconciler(true);
        let mut spec = subnet_spec("4021");
        spec.subnet_type = "INTERNAL".to_string();

        let err = reconciler.create::<SubnetResource>(&spec).await.expect_err("bad type");
        assert!(err.to_string().contains("PUBLIC, PRIVATE"), "{}", err);

        let mut spec = subnet_spec("4021");
        spec.usage_type = Some("NATGW".to_string());
        assert!(SubnetResource::validate(&spec, DeploymentMode::Vpc).is_ok());
        spec.usage_type = Some("VPN".to_string());
        assert!(SubnetResource::validate(&spec, DeploymentMode::Vpc).is_err());

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_subnet_cidr_change_is_immutable() {
        let (reconciler, mock) = test_reconciler(true);
        let current = subnet_spec("4021");
        let mut desired = current.clone();
        desired.subnet = "10.0.2.0/24".to_string();
        desired.network_acl_no = "7002".to_string();

        let err = reconciler
            .update::<SubnetResource>(&Handle::new("812001"), &current, &desired)
            .await
            .expect_err("cidr is creation-only");
        match err {
            ReconcileError::ImmutableFieldChanged { fields, .. } => assert_eq!(fields, vec!["subnet"]),
            other => panic!("expected immutable field error, got {:?}", other),
        }
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nat_gateway_lifecycle() {
        let (reconciler, mock) = test_reconciler(true);
        let current = nat_gateway_spec("4021");

        let observed = reconciler
            .provision::<NatGatewayResource>(&current)
            .await
            .expect("nat ready");
        assert_eq!(observed.resource.public_ip.as_deref(), Some("203.0.113.10"));

        let mut desired = current.clone();
        desired.description = Some("egress for private subnets".to_string());
        reconciler
            .update::<NatGatewayResource>(&observed.handle, &current, &desired)
            .await
            .expect("description updated");
        assert_eq!(
            mock.nat_gateway(observed.handle.as_str())
                .and_then(|n| n.nat_gateway_description),
            Some("egress for private subnets".to_string())
        );

        reconciler
            .destroy::<NatGatewayResource>(&observed.handle)
            .await
            .expect("nat destroyed");
        assert!(mock.nat_gateway(observed.handle.as_str()).is_none());
    }

    #[tokio::test]
    async fn test_network_kinds_need_vpc_mode() {
        let (reconciler, mock) = test_reconciler(false);

        let err = reconciler
            .create::<NatGatewayResource>(&nat_gateway_spec("4021"))
            .await
            .expect_err("classic has no NAT gateways");
        assert!(matches!(err, ReconcileError::Validation { kind: "nat_gateway", .. }));

        // Deleting also checks the mode before talking to the vendor
        let err = reconciler
            .delete::<SubnetResource>(&Handle::new("812001"))
            .await
            .expect_err("classic has no subnets");
        assert!(matches!(err, ReconcileError::Validation { .. }));
        assert_eq!(mock.call_count(), 0);
    }
}

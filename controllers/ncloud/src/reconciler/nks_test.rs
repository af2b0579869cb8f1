//! Unit tests for NKS cluster reconciliation

#[cfg(test)]
mod tests {
    use crate::error::ReconcileError;
    use crate::reconciler::NksClusterResource;
    use crate::test_utils::*;
    use ncloud_client::{MockKind, MockPhase};

    #[tokio::test(start_paused = true)]
    async fn test_cluster_provisioning_assigns_endpoint() {
        let (reconciler, mock) = test_reconciler(true);

        let observed = reconciler
            .provision::<NksClusterResource>(&nks_cluster_spec("tf-test-nks"))
            .await
            .expect("cluster running");

        assert_eq!(observed.status, "RUNNING");
        assert_eq!(observed.resource.vpc_no, 4021);
        assert_eq!(observed.resource.subnet_no_list, vec![11734]);
        assert!(observed.resource.endpoint.is_some());
        // CREATING, CREATING, RUNNING: two polls after create
        assert_eq!(mock.calls_to("get_nks_cluster"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cluster_error_status_fails_fast() {
        let (reconciler, mock) = test_reconciler(true);
        mock.set_progression(MockKind::NksCluster, MockPhase::Create, &["CREATING", "ERROR"]);

        let err = reconciler
            .provision::<NksClusterResource>(&nks_cluster_spec("tf-test-nks"))
            .await
            .expect_err("cluster failed");

        match &err {
            ReconcileError::RemoteResourceFailed { kind, status, .. } => {
                assert_eq!(*kind, "nks_cluster");
                assert_eq!(status, "ERROR");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(mock.calls_to("get_nks_cluster"), 1);
    }

    #[tokio::test]
    async fn test_non_numeric_references_are_rejected() {
        let (reconciler, mock) = test_reconciler(true);

        let mut spec = nks_cluster_spec("tf-test-nks");
        spec.vpc_no = "vpc-main".to_string();
        let err = reconciler
            .create::<NksClusterResource>(&spec)
            .await
            .expect_err("vpc_no must be numeric");
        assert!(err.to_string().contains("vpc_no must be numeric"), "{}", err);

        let mut spec = nks_cluster_spec("tf-test-nks");
        spec.subnet_no_list.clear();
        let err = reconciler
            .create::<NksClusterResource>(&spec)
            .await
            .expect_err("at least one subnet");
        assert!(matches!(err, ReconcileError::Validation { .. }));

        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_version_change_upgrades_in_place() {
        let (reconciler, mock) = test_reconciler(true);
        let current = nks_cluster_spec("tf-test-nks");
        let observed = reconciler
            .provision::<NksClusterResource>(&current)
            .await
            .expect("running");

        let mut desired = current.clone();
        desired.k8s_version = Some("1.28.10-nks.1".to_string());
        let upgraded = reconciler
            .update::<NksClusterResource>(&observed.handle, &current, &desired)
            .await
            .expect("upgraded");

        assert_eq!(upgraded.handle, observed.handle);
        assert_eq!(upgraded.status, "RUNNING");
        assert_eq!(upgraded.resource.k8s_version.as_deref(), Some("1.28.10-nks.1"));
        assert_eq!(mock.calls_to("upgrade_nks_cluster"), 1);
        assert_eq!(mock.calls_to("create_nks_cluster"), 1);
    }

    #[tokio::test]
    async fn test_subnet_change_requires_recreate() {
        let (reconciler, mock) = test_reconciler(true);
        let current = nks_cluster_spec("tf-test-nks");
        let mut desired = current.clone();
        desired.subnet_no_list.push("11736".to_string());

        let err = reconciler
            .update::<NksClusterResource>(
                &crate::lifecycle::Handle::new("000c6421-5c1e-4a5b-9d2f-0000000c6421"),
                &current,
                &desired,
            )
            .await
            .expect_err("subnets are creation-only");
        assert!(matches!(err, ReconcileError::ImmutableFieldChanged { .. }));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cluster_destroy_waits_for_disappearance() {
        let (reconciler, mock) = test_reconciler(true);
        let observed = reconciler
            .provision::<NksClusterResource>(&nks_cluster_spec("tf-test-nks"))
            .await
            .expect("running");

        reconciler
            .destroy::<NksClusterResource>(&observed.handle)
            .await
            .expect("destroyed");

        assert!(mock.nks_cluster(observed.handle.as_str()).is_none());
        assert_eq!(mock.calls_to("delete_nks_cluster"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cluster_can_be_destroyed() {
        let (reconciler, mock) = test_reconciler(true);
        mock.set_progression(MockKind::NksCluster, MockPhase::Create, &["CREATING", "ERROR"]);
        let err = reconciler
            .provision::<NksClusterResource>(&nks_cluster_spec("tf-test-nks"))
            .await
            .expect_err("cluster failed");
        let handle = err.handle().cloned().expect("failure carries the handle");

        // The vendor keeps reporting ERROR for a poll after accepting the delete
        mock.set_progression(MockKind::NksCluster, MockPhase::Delete, &["ERROR", "DELETING"]);
        reconciler
            .destroy::<NksClusterResource>(&handle)
            .await
            .expect("failed cluster destroyed");

        assert!(mock.nks_cluster(handle.as_str()).is_none());
        assert_eq!(mock.calls_to("delete_nks_cluster"), 1);
    }
}

//! Unit tests for the server lifecycle (spec change and termination)

#[cfg(test)]
mod tests {
    use crate::error::ReconcileError;
    use crate::lifecycle::Handle;
    use crate::reconciler::ServerResource;
    use crate::test_utils::*;

    fn position(calls: &[String], operation: &str) -> usize {
        calls
            .iter()
            .position(|c| c == operation)
            .unwrap_or_else(|| panic!("{} was never called: {:?}", operation, calls))
    }

    #[tokio::test(start_paused = true)]
    async fn test_product_change_stops_changes_and_starts() {
        let (reconciler, mock) = test_reconciler(false);
        mock.insert_server(create_test_server("812100", "tf-test-vm", "RUN"));

        let current = classic_server_spec("tf-test-vm");
        let mut desired = current.clone();
        desired.product_code = Some("SPSVRSTAND000005".to_string());

        let observed = reconciler
            .update::<ServerResource>(&Handle::new("812100"), &current, &desired)
            .await
            .expect("resized");

        assert_eq!(observed.status, "RUN");
        assert_eq!(
            observed.resource.server_product_code.as_deref(),
            Some("SPSVRSTAND000005")
        );

        let calls = mock.calls();
        let stop = position(&calls, "stop_server_instance");
        let change = position(&calls, "change_server_instance_spec");
        let start = position(&calls, "start_server_instance");
        assert!(stop < change && change < start, "{:?}", calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_product_change_on_stopped_server_skips_stop() {
        let (reconciler, mock) = test_reconciler(false);
        mock.insert_server(create_test_server("812100", "tf-test-vm", "NSTOP"));

        let current = classic_server_spec("tf-test-vm");
        let mut desired = current.clone();
        desired.product_code = Some("SPSVRSTAND000005".to_string());

        reconciler
            .update::<ServerResource>(&Handle::new("812100"), &current, &desired)
            .await
            .expect("resized");

        assert_eq!(mock.calls_to("stop_server_instance"), 0);
        assert_eq!(mock.calls_to("change_server_instance_spec"), 1);
        assert_eq!(mock.calls_to("start_server_instance"), 1);
        assert_eq!(mock.server("812100").map(|s| s.status_code().to_string()), Some("RUN".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_product_code_keeps_size() {
        let (reconciler, mock) = test_reconciler(false);
        mock.insert_server(create_test_server("812100", "tf-test-vm", "RUN"));

        let current = classic_server_spec("tf-test-vm");
        let mut desired = current.clone();
        desired.product_code = None;

        reconciler
            .update::<ServerResource>(&Handle::new("812100"), &current, &desired)
            .await
            .expect("no-op update");
        assert_eq!(mock.calls_to("change_server_instance_spec"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_running_server_stops_first() {
        let (reconciler, mock) = test_reconciler(false);
        mock.insert_server(create_test_server("812100", "tf-test-vm", "RUN"));

        reconciler
            .destroy::<ServerResource>(&Handle::new("812100"))
            .await
            .expect("destroyed");

        let calls = mock.calls();
        assert!(
            position(&calls, "stop_server_instance") < position(&calls, "terminate_server_instance"),
            "{:?}",
            calls
        );
        assert!(mock.server("812100").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_stopped_server_terminates_directly() {
        let (reconciler, mock) = test_reconciler(false);
        mock.insert_server(create_test_server("812100", "tf-test-vm", "NSTOP"));

        reconciler
            .destroy::<ServerResource>(&Handle::new("812100"))
            .await
            .expect("destroyed");

        assert_eq!(mock.calls_to("stop_server_instance"), 0);
        assert_eq!(mock.calls_to("terminate_server_instance"), 1);
        assert_eq!(mock.server_count(), 0);
    }

    #[tokio::test]
    async fn test_rejected_create_is_remote_rejected() {
        let (reconciler, mock) = test_reconciler(false);
        mock.reject_next(
            "create_server_instance",
            "1000015",
            "The server name already exists",
        );

        let err = reconciler
            .create::<ServerResource>(&classic_server_spec("tf-test-vm"))
            .await
            .expect_err("rejected");

        match &err {
            ReconcileError::RemoteRejected {
                operation, handle, ..
            } => {
                assert_eq!(*operation, "create");
                assert!(handle.is_none());
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert!(err.to_string().contains("1000015"), "{}", err);
        assert_eq!(mock.server_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_vpc_server_gets_private_ip() {
        let (reconciler, _mock) = test_reconciler(true);

        let observed = reconciler
            .provision::<ServerResource>(&vpc_server_spec("tf-test-vm"))
            .await
            .expect("ready");

        assert_eq!(observed.resource.vpc_no.as_deref(), Some("4021"));
        assert!(observed.resource.private_ip.is_some());
    }
}

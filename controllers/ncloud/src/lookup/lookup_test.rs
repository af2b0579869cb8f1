//! Unit tests for the list-and-filter lookups

#[cfg(test)]
mod tests {
    use crate::error::ReconcileError;
    use crate::lookup::{
        Criteria, NksClusterQuery, PortForwardingRuleQuery, ServerQuery, exactly_one,
    };
    use crate::test_utils::*;
    use ncloud_client::{
        NksCluster, NodePool, PortForwardingRule, PortForwardingRuleList, PortForwardingServer,
    };

    fn rule(server_instance_no: &str, internal: i32, external: i32) -> PortForwardingRule {
        PortForwardingRule {
            port_forwarding_internal_port: internal,
            port_forwarding_external_port: external,
            server_instance: Some(PortForwardingServer {
                server_instance_no: server_instance_no.to_string(),
                server_name: None,
                port_forwarding_public_ip: Some("198.51.100.7".to_string()),
            }),
        }
    }

    fn rule_list() -> PortForwardingRuleList {
        PortForwardingRuleList {
            port_forwarding_configuration_no: Some("1893".to_string()),
            port_forwarding_public_ip: Some("198.51.100.7".to_string()),
            total_rows: Some(3),
            port_forwarding_rule_list: vec![
                rule("812100", 22, 2022),
                rule("812100", 80, 8080),
                rule("812200", 22, 2122),
            ],
        }
    }

    fn cluster(uuid: &str) -> NksCluster {
        NksCluster {
            uuid: uuid.to_string(),
            name: "tf-test-nks".to_string(),
            status: "RUNNING".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_exactly_one_contract() {
        let criteria = Criteria::new().with("even", Some(true), |n: &u32, even| (n % 2 == 0) == *even);

        assert_eq!(exactly_one("number", vec![1, 2, 3], &criteria).expect("one even"), 2);

        let err = exactly_one("number", vec![1, 3], &criteria).expect_err("no even");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("even=true"), "{}", err);

        let err = exactly_one("number", vec![2, 4, 6], &criteria).expect_err("three evens");
        assert!(matches!(err, ReconcileError::AmbiguousResult { count: 3, .. }));
    }

    #[test]
    fn test_unset_filters_match_everything() {
        let criteria = Criteria::new().with("n", None::<u32>, |n: &u32, wanted: &u32| n == wanted);
        assert!(criteria.matches(&7));
        assert_eq!(criteria.describe(), "(no filters)");
    }

    #[tokio::test]
    async fn test_port_forwarding_filters_are_combined() {
        let (reconciler, mock) = test_reconciler(false);
        mock.set_port_forwarding_rules(rule_list());

        // Server 812100 alone has two rules
        let err = reconciler
            .find_port_forwarding_rule(&PortForwardingRuleQuery {
                server_instance_no: Some("812100".to_string()),
                ..Default::default()
            })
            .await
            .expect_err("two rules for the server");
        assert!(matches!(err, ReconcileError::AmbiguousResult { count: 2, .. }));

        let found = reconciler
            .find_port_forwarding_rule(&PortForwardingRuleQuery {
                server_instance_no: Some("812100".to_string()),
                internal_port: Some(22),
                ..Default::default()
            })
            .await
            .expect("server and port narrow it down");
        assert_eq!(found.external_port, 2022);
        assert_eq!(found.configuration_no.as_deref(), Some("1893"));
        assert_eq!(found.public_ip.as_deref(), Some("198.51.100.7"));
        assert_eq!(found.server_instance_no.as_deref(), Some("812100"));
    }

    #[tokio::test]
    async fn test_port_forwarding_no_match_is_not_found() {
        let (reconciler, mock) = test_reconciler(false);
        mock.set_port_forwarding_rules(rule_list());

        let err = reconciler
            .find_port_forwarding_rule(&PortForwardingRuleQuery {
                external_port: Some(9999),
                ..Default::default()
            })
            .await
            .expect_err("no rule on 9999");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_port_forwarding_is_classic_only() {
        let (reconciler, mock) = test_reconciler(true);

        let err = reconciler
            .find_port_forwarding_rule(&PortForwardingRuleQuery::default())
            .await
            .expect_err("VPC has no port forwarding");
        assert!(err.to_string().contains("not supported in vpc mode"), "{}", err);
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_find_nks_cluster_by_uuid() {
        let (reconciler, mock) = test_reconciler(true);
        mock.insert_nks_cluster(cluster("a1"));
        mock.insert_nks_cluster(cluster("b2"));

        let found = reconciler
            .find_nks_cluster(&NksClusterQuery {
                uuid: "b2".to_string(),
            })
            .await
            .expect("cluster b2");
        assert_eq!(found.uuid, "b2");

        let err = reconciler
            .find_nks_cluster(&NksClusterQuery {
                uuid: "c3".to_string(),
            })
            .await
            .expect_err("unknown uuid");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_node_pool_names() {
        let (reconciler, mock) = test_reconciler(true);
        mock.insert_nks_cluster(cluster("a1"));
        for (no, name) in [(1, "default-pool"), (2, "gpu-pool")] {
            mock.add_node_pool(
                "a1",
                NodePool {
                    instance_no: no,
                    name: name.to_string(),
                    status: "RUN".to_string(),
                    node_count: 2,
                    k8s_version: None,
                },
            );
        }

        let names = reconciler.nks_node_pool_names("a1").await.expect("pools");
        assert_eq!(names, vec!["default-pool".to_string(), "gpu-pool".to_string()]);

        let err = reconciler.nks_node_pool_names("zz").await.expect_err("no cluster");
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_find_server_by_name() {
        let (reconciler, mock) = test_reconciler(false);
        mock.insert_server(create_test_server("812100", "tf-test-vm", "RUN"));
        mock.insert_server(create_test_server("812200", "tf-test-db", "RUN"));

        let found = reconciler
            .find_server(&ServerQuery {
                name: Some("tf-test-db".to_string()),
                ..Default::default()
            })
            .await
            .expect("db server");
        assert_eq!(found.server_instance_no, "812200");

        let err = reconciler
            .find_server(&ServerQuery::default())
            .await
            .expect_err("two servers without filters");
        assert!(matches!(err, ReconcileError::AmbiguousResult { count: 2, .. }));

        let err = reconciler
            .find_server(&ServerQuery {
                name: Some("tf-test-db".to_string()),
                instance_no: Some("812100".to_string()),
                ..Default::default()
            })
            .await
            .expect_err("name and number disagree");
        assert!(err.is_not_found());
    }
}

//! HTTP-level tests for NcloudClient against a local wiremock server

use ncloud_client::{
    CreateNksClusterRequest, Credentials, DeploymentMode, Endpoints, NcloudClient,
    NcloudClientTrait, NcloudError, ServerListFilter, VpcListFilter,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> NcloudClient {
    NcloudClient::new(
        Endpoints::new(server.uri(), format!("{}/", server.uri())),
        Credentials::new("test-access-key", "test-secret-key"),
        "KR",
    )
    .expect("client builds")
}

#[tokio::test]
async fn test_vpc_server_list_is_signed_and_scoped_by_region() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vserver/v2/getServerInstanceList"))
        .and(query_param("responseFormatType", "json"))
        .and(query_param("regionCode", "KR"))
        .and(query_param("serverInstanceNoList.1", "812345"))
        .and(header("x-ncp-iam-access-key", "test-access-key"))
        .and(header_exists("x-ncp-apigw-timestamp"))
        .and(header_exists("x-ncp-apigw-signature-v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "getServerInstanceListResponse": {
                "returnCode": "0",
                "returnMessage": "success",
                "totalRows": 1,
                "serverInstanceList": [{
                    "serverInstanceNo": "812345",
                    "serverName": "tf-test-vm",
                    "serverInstanceStatus": {"code": "RUN", "codeName": "Server run state"},
                    "privateIp": "10.0.1.6"
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let servers = client
        .get_server_instance_list(DeploymentMode::Vpc, &ServerListFilter::by_instance_no("812345"))
        .await
        .expect("list succeeds");

    assert_eq!(servers.len(), 1);
    assert_eq!(servers[0].status_code(), "RUN");
    assert_eq!(servers[0].private_ip.as_deref(), Some("10.0.1.6"));
}

#[tokio::test]
async fn test_classic_server_list_uses_classic_service() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/server/v2/getServerInstanceList"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "getServerInstanceListResponse": {"returnCode": "0", "serverInstanceList": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let servers = client_for(&server)
        .get_server_instance_list(DeploymentMode::Classic, &ServerListFilter::default())
        .await
        .expect("list succeeds");
    assert!(servers.is_empty());
}

#[tokio::test]
async fn test_vendor_error_envelope_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vpc/v2/getVpcList"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "responseError": {"returnCode": "1000015", "returnMessage": "Invalid vpcNo"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_vpc_list(&VpcListFilter::default())
        .await
        .expect_err("vendor rejected the call");

    assert_eq!(err.code(), Some("1000015"));
    assert!(err.to_string().contains("Invalid vpcNo"));
}

#[tokio::test]
async fn test_forbidden_maps_to_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"errorCode": "200", "message": "Authentication Failed"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_vpc_list(&VpcListFilter::default())
        .await
        .expect_err("unauthorized");
    assert!(matches!(err, NcloudError::Authentication(_)));
}

#[tokio::test]
async fn test_nks_cluster_create_and_get() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/vnks/v2/clusters"))
        .and(body_partial_json(json!({"name": "tf-nks", "vpcNo": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "2b9d8f3a-0000-4000-8000-000000000001"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/vnks/v2/clusters/2b9d8f3a-0000-4000-8000-000000000001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cluster": {
                "uuid": "2b9d8f3a-0000-4000-8000-000000000001",
                "name": "tf-nks",
                "status": "CREATING",
                "vpcNo": 7,
                "subnetNoList": [8]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let request = CreateNksClusterRequest {
        name: "tf-nks".to_string(),
        cluster_type: "SVR.VNKS.STAND.C002.M008.NET.SSD.B050.G002".to_string(),
        login_key_name: "key".to_string(),
        zone_code: "KR-1".to_string(),
        vpc_no: 7,
        subnet_no_list: vec![8],
        lb_private_subnet_no: 9,
        ..Default::default()
    };

    let uuid = client.create_nks_cluster(&request).await.expect("create succeeds");
    let cluster = client.get_nks_cluster(&uuid).await.expect("get succeeds");
    assert_eq!(cluster.status, "CREATING");
    assert_eq!(cluster.subnet_no_list, vec![8]);
}

#[tokio::test]
async fn test_missing_nks_cluster_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/vnks/v2/clusters/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"errorCode": "404", "message": "Not found cluster"}
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_nks_cluster("gone")
        .await
        .expect_err("cluster is gone");
    assert!(err.is_not_found());
}

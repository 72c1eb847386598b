//! Integration tests for the provider against a mocked configuration API.
//!
//! Each test starts a wiremock server standing in for PingDirectory's
//! `/config/v1` endpoints and drives the provider through the same calls the
//! host makes.

use pingdirectory_provider::testing::{
    assert_plan_creates, assert_plan_no_changes, assert_plan_updates, ProviderTester,
};
use pingdirectory_provider::{
    ConfigApiClient, PingDirectoryProvider, ProductVersion, ProviderError, ProviderService,
};
use serde_json::{json, Value};
use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USERNAME: &str = "cn=administrator";
const PASSWORD: &str = "2FederateM0re";
const MESSAGES_URN: &str = "urn:pingidentity:schemas:configuration:messages:2.0";

fn tester(server: &MockServer) -> ProviderTester<PingDirectoryProvider> {
    let client = ConfigApiClient::new(format!("{}/config/v1", server.uri()), USERNAME, PASSWORD)
        .expect("client should build");
    ProviderTester::new(PingDirectoryProvider::with_client(
        client,
        ProductVersion::new(9, 3, 0, 0),
    ))
}

fn criteria_response(description: &str, protocols: &[&str]) -> Value {
    json!({
        "schemas": ["urn:pingidentity:schemas:configuration:2.0:connection-criteria:simple"],
        "id": "Internal",
        "description": description,
        "includedProtocol": protocols,
        "communicationSecurityLevel": "all",
        "userAuthType": ["internal", "sasl", "simple"],
        "meta": {"resourceType": "Simple Connection Criteria"}
    })
}

mod resource_tests {
    use super::*;

    /// Create, update and delete a polymorphic object.
    #[tokio::test]
    async fn test_connection_criteria_lifecycle() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("POST"))
            .and(path("/config/v1/connection-criteria"))
            .and(basic_auth(USERNAME, PASSWORD))
            .and(body_json(json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:connection-criteria:simple"],
                "connectionCriteriaName": "Internal",
                "description": "Internal clients",
                "includedProtocol": ["HTTP", "LDAP"]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(criteria_response("Internal clients", &["HTTP", "LDAP"])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/config/v1/connection-criteria/Internal"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(criteria_response("Internal clients", &["LDAP", "HTTP"])),
            )
            .mount(&server)
            .await;

        let config = json!({
            "name": "Internal",
            "type": "simple",
            "description": "Internal clients",
            "included_protocol": ["LDAP", "HTTP"]
        });
        let state = tester
            .apply("pingdirectory_connection_criteria", None, &config)
            .await
            .unwrap();

        assert_eq!(state["id"], "Internal");
        assert_eq!(state["type"], "simple");
        assert_eq!(state["included_protocol"], json!(["HTTP", "LDAP"]));
        assert_eq!(state["communication_security_level"], "all");
        assert_eq!(state["user_auth_type"], json!(["internal", "sasl", "simple"]));
        assert_eq!(state["excluded_protocol"], json!([]));
        assert_eq!(state["notifications"], json!([]));

        server.verify().await;
        server.reset().await;

        Mock::given(method("PATCH"))
            .and(path("/config/v1/connection-criteria/Internal"))
            .and(body_json(json!({
                "operations": [
                    {"op": "replace", "path": "description", "value": "LDAP clients"},
                    {"op": "remove", "path": "includedProtocol", "value": ["HTTP"]}
                ]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(criteria_response("LDAP clients", &["LDAP"])),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/config/v1/connection-criteria/Internal"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(criteria_response("LDAP clients", &["LDAP"])),
            )
            .mount(&server)
            .await;

        let config = json!({
            "name": "Internal",
            "type": "simple",
            "description": "LDAP clients",
            "included_protocol": ["LDAP"]
        });
        let plan = tester
            .plan("pingdirectory_connection_criteria", Some(&state), &config)
            .await
            .unwrap();
        assert_plan_updates(&plan, &["description", "included_protocol"]);

        let updated = tester
            .apply("pingdirectory_connection_criteria", Some(&state), &config)
            .await
            .unwrap();
        assert_eq!(updated["description"], "LDAP clients");
        assert_eq!(updated["included_protocol"], json!(["LDAP"]));
        assert_eq!(updated["communication_security_level"], "all");

        server.verify().await;
        server.reset().await;

        Mock::given(method("DELETE"))
            .and(path("/config/v1/connection-criteria/Internal"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        tester
            .destroy("pingdirectory_connection_criteria", &updated)
            .await
            .unwrap();
    }

    /// A plan that matches the prior state makes no request on apply.
    #[tokio::test]
    async fn test_update_without_changes_only_reads() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/locations/east"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:location"],
                "id": "east",
                "description": "East data center"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let prior = tester
            .refresh("pingdirectory_location", &json!({"name": "east"}))
            .await
            .unwrap()
            .expect("location should exist");
        let config = json!({"name": "east", "description": "East data center"});
        let plan = tester
            .plan("pingdirectory_location", Some(&prior), &config)
            .await
            .unwrap();
        assert_plan_no_changes(&plan);

        let state = tester
            .provider()
            .update("pingdirectory_location", prior.clone(), plan.planned_state)
            .await
            .unwrap();
        assert_eq!(state, prior);
    }

    #[tokio::test]
    async fn test_read_missing_object_returns_none() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/locations/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "schemas": ["urn:pingidentity:schemas:common:2.0:Error"],
                "status": "404",
                "detail": "Location 'gone' does not exist"
            })))
            .mount(&server)
            .await;

        let state = tester
            .refresh("pingdirectory_location", &json!({"id": "gone", "name": "gone"}))
            .await
            .unwrap();
        assert!(state.is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_object_succeeds() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("DELETE"))
            .and(path("/config/v1/locations/gone"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        tester
            .provider()
            .delete("pingdirectory_location", json!({"id": "gone", "name": "gone"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_api_error_is_reported_with_detail() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("POST"))
            .and(path("/config/v1/locations"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "schemas": ["urn:pingidentity:schemas:common:2.0:Error"],
                "status": "409",
                "detail": "An entry with name 'east' already exists"
            })))
            .mount(&server)
            .await;

        let plan = tester
            .plan("pingdirectory_location", None, &json!({"name": "east"}))
            .await
            .unwrap();
        assert_plan_creates(&plan);

        let err = tester
            .provider()
            .create("pingdirectory_location", plan.planned_state)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: Some(409), .. }));
        assert_eq!(err.summary(), "An error occurred while trying to create the Location");
        assert_eq!(
            err.detail().as_deref(),
            Some("Error response: An entry with name 'east' already exists")
        );
    }

    /// Notifications and required actions from the server land in state.
    #[tokio::test]
    async fn test_messages_are_kept_in_state() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/monitoring-endpoints/metrics"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:monitoring-endpoint:statsd"],
                "id": "metrics",
                "hostname": "statsd.example.com",
                "serverPort": 8125,
                "connectionType": "unencrypted-udp",
                "enabled": true,
                MESSAGES_URN: {
                    "notifications": ["The endpoint will be used once enabled"],
                    "requiredActions": [{
                        "property": "hostname",
                        "type": "other",
                        "synopsis": "Check that the host accepts StatsD traffic"
                    }]
                }
            })))
            .mount(&server)
            .await;

        let state = tester
            .refresh("pingdirectory_monitoring_endpoint", &json!({"name": "metrics"}))
            .await
            .unwrap()
            .expect("endpoint should exist");

        assert_eq!(state["server_port"], 8125);
        assert_eq!(state["enabled"], true);
        assert_eq!(
            state["notifications"],
            json!(["The endpoint will be used once enabled"])
        );
        assert_eq!(state["required_actions"][0]["property"], "hostname");
        assert_eq!(state["required_actions"][0]["type"], "other");
    }
}

mod default_resource_tests {
    use super::*;

    fn json_syntax(default_behavior: &str) -> Value {
        json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:log-field-syntax:json"],
            "id": "JSON",
            "defaultBehavior": default_behavior
        })
    }

    /// Adopting a default object patches it instead of creating it.
    #[tokio::test]
    async fn test_default_resource_adopts_existing_object() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/log-field-syntaxes/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json_syntax("preserve")))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/config/v1/log-field-syntaxes/JSON"))
            .and(body_json(json!({
                "operations": [{"op": "replace", "path": "defaultBehavior", "value": "omit"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json_syntax("omit")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let plan = tester
            .plan(
                "pingdirectory_default_log_field_syntax",
                None,
                &json!({"name": "JSON", "type": "json", "default_behavior": "omit"}),
            )
            .await
            .unwrap();
        assert!(plan.changes.iter().any(|c| c.path == "default_behavior"));

        let state = tester
            .provider()
            .create("pingdirectory_default_log_field_syntax", plan.planned_state)
            .await
            .unwrap();
        assert_eq!(state["default_behavior"], "omit");
        assert_eq!(state["type"], "json");
    }

    #[tokio::test]
    async fn test_default_resource_rejects_type_mismatch() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/log-field-syntaxes/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json_syntax("preserve")))
            .mount(&server)
            .await;

        let plan = tester
            .plan(
                "pingdirectory_default_log_field_syntax",
                None,
                &json!({"name": "JSON", "type": "csv"}),
            )
            .await
            .unwrap();
        let err = tester
            .provider()
            .create("pingdirectory_default_log_field_syntax", plan.planned_state)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.message().contains("'json'"));
        assert!(err.message().contains("'csv'"));
    }

    #[tokio::test]
    async fn test_default_resource_delete_leaves_object() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        tester
            .destroy(
                "pingdirectory_default_log_field_syntax",
                &json!({"id": "JSON", "name": "JSON", "type": "json"}),
            )
            .await
            .unwrap();
    }
}

mod child_object_tests {
    use super::*;

    fn claim_response() -> Value {
        json!({
            "schemas": ["urn:pingidentity:schemas:configuration:2.0:token-claim-validation:string"],
            "id": "sub",
            "claimName": "sub",
            "anyRequiredValue": ["alice", "bob"]
        })
    }

    #[tokio::test]
    async fn test_token_claim_validation_uses_parent_path() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("POST"))
            .and(path("/config/v1/id-token-validators/My%20Validator/token-claim-validations"))
            .and(body_json(json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:token-claim-validation:string"],
                "tokenClaimValidationName": "sub",
                "claimName": "sub",
                "anyRequiredValue": ["alice", "bob"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(claim_response()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/config/v1/id-token-validators/My%20Validator/token-claim-validations/sub"))
            .respond_with(ResponseTemplate::new(200).set_body_json(claim_response()))
            .mount(&server)
            .await;

        let state = tester
            .apply(
                "pingdirectory_token_claim_validation",
                None,
                &json!({
                    "id_token_validator_name": "My Validator",
                    "name": "sub",
                    "type": "string",
                    "claim_name": "sub",
                    "any_required_value": ["bob", "alice"]
                }),
            )
            .await
            .unwrap();
        assert_eq!(state["id_token_validator_name"], "My Validator");
        assert_eq!(state["any_required_value"], json!(["alice", "bob"]));

        let imported = tester
            .provider()
            .import_resource("pingdirectory_token_claim_validation", "My Validator/sub")
            .await
            .unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].resource_type, "pingdirectory_token_claim_validation");
        assert_eq!(imported[0].state, state);

        let refreshed = tester
            .refresh("pingdirectory_token_claim_validation", &imported[0].state)
            .await
            .unwrap();
        assert_eq!(refreshed, Some(state));
    }

    #[tokio::test]
    async fn test_import_requires_parent() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        let err = tester
            .import("pingdirectory_token_claim_validation", "sub")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::InvalidRequest(_)));
        assert!(err.message().starts_with("Expected import identifier with format"));
    }

    #[tokio::test]
    async fn test_import_missing_object_is_not_found() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/locations/nowhere"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = tester
            .import("pingdirectory_location", "nowhere")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert_eq!(err.message(), "Location 'nowhere' does not exist");
    }
}

mod data_source_tests {
    use super::*;

    #[tokio::test]
    async fn test_list_data_source_passes_filter() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/locations"))
            .and(query_param("filter", "id sw \"e\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
                "totalResults": 2,
                "Resources": [
                    {"id": "west", "schemas": ["urn:pingidentity:schemas:configuration:2.0:location"]},
                    {"id": "east", "schemas": ["urn:pingidentity:schemas:configuration:2.0:location"]}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = tester
            .read_data_source("pingdirectory_locations", &json!({"filter": "id sw \"e\""}))
            .await
            .unwrap();
        assert_eq!(state["id"], "/locations");
        assert_eq!(state["ids"], json!(["east", "west"]));
        assert_eq!(state["filter"], "id sw \"e\"");
    }

    #[tokio::test]
    async fn test_list_data_source_of_child_objects() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/id-token-validators/My%20Validator/token-claim-validations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Resources": [{"id": "sub"}, {"id": "aud"}]
            })))
            .mount(&server)
            .await;

        let state = tester
            .read_data_source(
                "pingdirectory_token_claim_validations",
                &json!({"id_token_validator_name": "My Validator"}),
            )
            .await
            .unwrap();
        assert_eq!(state["ids"], json!(["aud", "sub"]));
        assert_eq!(state["id_token_validator_name"], "My Validator");
        assert_eq!(state["filter"], Value::Null);
    }

    #[tokio::test]
    async fn test_single_data_source_reads_object() {
        let server = MockServer::start().await;
        let tester = tester(&server);

        Mock::given(method("GET"))
            .and(path("/config/v1/log-field-syntaxes/JSON"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "schemas": ["urn:pingidentity:schemas:configuration:2.0:log-field-syntax:json"],
                "id": "JSON",
                "defaultBehavior": "preserve",
                "includedSensitiveField": ["password"],
                MESSAGES_URN: {"notifications": ["ignored by data sources"]}
            })))
            .mount(&server)
            .await;

        let state = tester
            .read_data_source("pingdirectory_log_field_syntax", &json!({"name": "JSON"}))
            .await
            .unwrap();
        assert_eq!(state["type"], "json");
        assert_eq!(state["default_behavior"], "preserve");
        assert_eq!(state["included_sensitive_field"], json!(["password"]));
        assert!(state.get("notifications").is_none());
    }

    #[tokio::test]
    async fn test_data_source_rejects_invalid_config_before_request() {
        let server = MockServer::start().await;
        let provider = PingDirectoryProvider::with_client(
            ConfigApiClient::new(format!("{}/config/v1", server.uri()), USERNAME, PASSWORD).unwrap(),
            ProductVersion::new(9, 3, 0, 0),
        );

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider
            .read_data_source("pingdirectory_token_claim_validation", json!({"name": "sub"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Validation(_)));
        assert!(err.message().contains("id_token_validator_name"));
    }
}

//! Full provisioning run: generated PEM material, the audited HTTP client,
//! the name registry and the workflow against a mock key manager.

mod common;

use certbundle::catalog::ServiceCatalog;
use certbundle::certificates::{CertificateModel, Field, NameRegistry};
use certbundle::secrets::{AuditedSecretStore, BarbicanClient, BarbicanConfig};
use certbundle::workflow::{
    CertificateWorkflow, NotificationLevel, WorkflowState, CERTIFICATES_CREATED, SECRETS_FAILED,
};
use common::{RecordingDialog, RecordingNotifier};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Setup {
    server: MockServer,
    registry: Arc<CertificateModel>,
    notifier: Arc<RecordingNotifier>,
    dialog: Arc<RecordingDialog>,
    workflow: CertificateWorkflow,
}

async fn setup(existing: &[&str]) -> Setup {
    let server = MockServer::start().await;

    let containers: Vec<_> = existing
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({ "name": name, "container_ref": format!("{}/v1/containers/{i}", server.uri()) })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/v1/containers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "containers": containers,
            "total": existing.len()
        })))
        .mount(&server)
        .await;

    let client = BarbicanClient::new(BarbicanConfig {
        endpoint: server.uri(),
        token: "tok".into(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    })
    .unwrap();
    let store = Arc::new(AuditedSecretStore::new(client));
    let registry = Arc::new(CertificateModel::new(store.clone()));
    registry.refresh_certificate_list().await.unwrap();

    let notifier = Arc::new(RecordingNotifier::default());
    let dialog = Arc::new(RecordingDialog::default());
    let workflow = CertificateWorkflow::new(
        store,
        Arc::new(ServiceCatalog::with_key_manager()),
        registry.clone(),
        notifier.clone(),
        dialog.clone(),
    );

    Setup { server, registry, notifier, dialog, workflow }
}

async fn mount_secret(server: &MockServer, name: &str, status: u16) {
    let response = if status < 300 {
        ResponseTemplate::new(status).set_body_json(json!({
            "secret_ref": format!("{}/v1/secrets/{name}", server.uri())
        }))
    } else {
        ResponseTemplate::new(status).set_body_string("rejected")
    };

    Mock::given(method("POST"))
        .and(path("/v1/secrets"))
        .and(body_partial_json(json!({ "name": name })))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_generated_bundle_is_provisioned() {
    let bundle = common::pem::bundle("web.example.com");
    let mut s = setup(&["api"]).await;

    s.workflow.set_certificate_name("web");
    s.workflow.set_certificate(bundle.certificate.as_str());
    s.workflow.set_private_key(bundle.private_key.as_str());
    s.workflow.set_intermediate(bundle.intermediate.as_str());
    assert!(s.workflow.validate_fields().is_empty());

    mount_secret(&s.server, "web", 201).await;
    mount_secret(&s.server, "web-private_key", 201).await;
    mount_secret(&s.server, "web-intermediate", 201).await;
    Mock::given(method("POST"))
        .and(path("/v1/containers"))
        .and(body_partial_json(json!({ "type": "certificate", "name": "web" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "container_ref": format!("{}/v1/containers/web", s.server.uri())
        })))
        .expect(1)
        .mount(&s.server)
        .await;

    let container_ref = s.workflow.submit().await.unwrap();

    assert_eq!(container_ref.object_id(), Some("web"));
    assert_eq!(s.workflow.container_spec().secret_refs.len(), 3);
    assert_eq!(
        s.notifier.all(),
        vec![(NotificationLevel::Success, CERTIFICATES_CREATED.to_string())]
    );
    assert_eq!(s.dialog.close_count(), 1);
    assert_eq!(s.workflow.state(), WorkflowState::Closed);
}

#[tokio::test]
async fn test_existing_name_fails_validation() {
    let bundle = common::pem::bundle("api.example.com");
    let mut s = setup(&["api"]).await;

    s.workflow.set_certificate_name("api");
    s.workflow.set_certificate(bundle.certificate.as_str());
    s.workflow.set_private_key(bundle.private_key.as_str());

    let errors = s.workflow.validate_fields();
    assert!(errors.has(Field::Name));
    assert_eq!(errors.len(), 1);
    assert_eq!(s.registry.certificate_names(), vec!["api"]);
}

#[tokio::test]
async fn test_mismatched_key_fails_validation() {
    let first = common::pem::self_signed("one.example.com");
    let second = common::pem::self_signed("two.example.com");
    let mut s = setup(&[]).await;

    s.workflow.set_certificate_name("one");
    s.workflow.set_certificate(first.cert.pem());
    s.workflow.set_private_key(second.key_pair.serialize_pem());

    let errors = s.workflow.validate_fields();
    assert!(errors.has(Field::PrivateKey));
    assert!(!errors.has(Field::Certificate));
}

#[tokio::test]
async fn test_rejected_secret_leaves_orphan_and_no_container() {
    let mut s = setup(&[]).await;
    s.workflow.set_certificate_name("db");
    s.workflow.set_certificate("CERT");
    s.workflow.set_private_key("KEY");

    mount_secret(&s.server, "db", 201).await;
    mount_secret(&s.server, "db-private_key", 500).await;
    Mock::given(method("POST"))
        .and(path("/v1/containers"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&s.server)
        .await;

    let err = s.workflow.submit().await.unwrap_err();

    assert_eq!(err.orphaned().len(), 1);
    assert_eq!(s.workflow.history().last(), Some(&WorkflowState::Closed));
    assert!(s.workflow.history().contains(&WorkflowState::SecretsFailed));
    assert_eq!(s.notifier.all(), vec![(NotificationLevel::Error, SECRETS_FAILED.to_string())]);
    assert_eq!(s.dialog.close_count(), 1);
}

//! Recording collaborators for workflow tests.

use async_trait::async_trait;
use certbundle::catalog::{CapabilityProbe, CatalogError};
use certbundle::certificates::{ContainerSpec, NameRegistry, SecretRole, SecretSlot};
use certbundle::secrets::{
    ContainerRef, ContainerSummary, Result as StoreResult, SecretRef, SecretStoreClient,
    SecretsError,
};
use certbundle::workflow::{CertificateWorkflow, Dialog, NotificationLevel, NotificationSink};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Role a secret name was derived for.
pub fn role_of(secret_name: &str) -> SecretRole {
    SecretRole::ALL
        .into_iter()
        .rev()
        .find(|role| role.name_suffix().is_some_and(|suffix| secret_name.ends_with(suffix)))
        .unwrap_or(SecretRole::Certificate)
}

/// Secret store that records every call and can be told to fail or stall.
#[derive(Default)]
pub struct FakeStore {
    failing_roles: HashSet<SecretRole>,
    delays: HashMap<SecretRole, Duration>,
    fail_container: bool,
    listing: Vec<ContainerSummary>,

    pub secret_calls: Mutex<Vec<SecretSlot>>,
    pub completions: Mutex<Vec<SecretRole>>,
    pub container_calls: Mutex<Vec<ContainerSpec>>,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, role: SecretRole) -> Self {
        self.failing_roles.insert(role);
        self
    }

    pub fn delayed(mut self, role: SecretRole, millis: u64) -> Self {
        self.delays.insert(role, Duration::from_millis(millis));
        self
    }

    pub fn failing_container(mut self) -> Self {
        self.fail_container = true;
        self
    }

    pub fn with_listing(mut self, names: &[&str]) -> Self {
        self.listing = names
            .iter()
            .enumerate()
            .map(|(i, name)| ContainerSummary {
                name: Some(name.to_string()),
                container_ref: ContainerRef::from_string(format!(
                    "https://kms.test/v1/containers/{i}"
                )),
                status: Some("ACTIVE".to_string()),
            })
            .collect();
        self
    }

    pub fn secret_call_count(&self) -> usize {
        self.secret_calls.lock().unwrap().len()
    }

    pub fn container_call_count(&self) -> usize {
        self.container_calls.lock().unwrap().len()
    }

    pub fn secret_ref_for(name: &str) -> SecretRef {
        SecretRef::from_string(format!("https://kms.test/v1/secrets/{name}"))
    }
}

#[async_trait]
impl SecretStoreClient for FakeStore {
    async fn create_secret(&self, slot: &SecretSlot) -> StoreResult<SecretRef> {
        let role = role_of(&slot.name);
        self.secret_calls.lock().unwrap().push(slot.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&role) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completions.lock().unwrap().push(role);

        if self.failing_roles.contains(&role) {
            Err(SecretsError::backend_error(500, format!("{} rejected", slot.name)))
        } else {
            Ok(Self::secret_ref_for(&slot.name))
        }
    }

    async fn create_certificate_container(
        &self,
        container: &ContainerSpec,
    ) -> StoreResult<ContainerRef> {
        self.container_calls.lock().unwrap().push(container.clone());
        if self.fail_container {
            return Err(SecretsError::backend_error(400, "container rejected"));
        }
        Ok(ContainerRef::from_string(format!("https://kms.test/v1/containers/{}", container.name)))
    }

    async fn list_certificate_containers(&self) -> StoreResult<Vec<ContainerSummary>> {
        Ok(self.listing.clone())
    }
}

/// Probe with a fixed answer.
pub struct FakeProbe {
    answer: std::result::Result<bool, String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeProbe {
    pub fn enabled() -> Self {
        Self { answer: Ok(true), calls: Mutex::new(Vec::new()) }
    }

    pub fn disabled() -> Self {
        Self { answer: Ok(false), calls: Mutex::new(Vec::new()) }
    }

    pub fn broken() -> Self {
        Self { answer: Err("identity service down".to_string()), calls: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl CapabilityProbe for FakeProbe {
    async fn is_capability_enabled(&self, name: &str) -> std::result::Result<bool, CatalogError> {
        self.calls.lock().unwrap().push(name.to_string());
        self.answer.clone().map_err(CatalogError::unreachable)
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub notifications: Mutex<Vec<(NotificationLevel, String)>>,
}

impl RecordingNotifier {
    pub fn all(&self) -> Vec<(NotificationLevel, String)> {
        self.notifications.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        self.notifications.lock().unwrap().push((level, message.to_string()));
    }
}

#[derive(Default)]
pub struct RecordingDialog {
    pub closed: AtomicUsize,
    pub dismissed: AtomicUsize,
}

impl RecordingDialog {
    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn dismiss_count(&self) -> usize {
        self.dismissed.load(Ordering::SeqCst)
    }
}

impl Dialog for RecordingDialog {
    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Registry whose snapshot tests can change between calls.
#[derive(Default)]
pub struct FakeRegistry {
    pub names: Mutex<Vec<String>>,
    pub refreshes: AtomicUsize,
    pub fail_refresh: bool,
}

impl FakeRegistry {
    pub fn with_names(names: &[&str]) -> Self {
        let names = names.iter().map(|n| n.to_string()).collect();
        Self { names: Mutex::new(names), ..Default::default() }
    }

    pub fn set_names(&self, names: &[&str]) {
        *self.names.lock().unwrap() = names.iter().map(|n| n.to_string()).collect();
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NameRegistry for FakeRegistry {
    fn certificate_names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }

    async fn refresh_certificate_list(&self) -> StoreResult<()> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        if self.fail_refresh {
            Err(SecretsError::connection_failed("listing unavailable"))
        } else {
            Ok(())
        }
    }
}

/// A workflow wired to recording doubles.
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub probe: Arc<FakeProbe>,
    pub registry: Arc<FakeRegistry>,
    pub notifier: Arc<RecordingNotifier>,
    pub dialog: Arc<RecordingDialog>,
    pub workflow: CertificateWorkflow,
}

impl Harness {
    pub fn new(store: FakeStore, probe: FakeProbe) -> Self {
        Self::with_registry(store, probe, FakeRegistry::default())
    }

    pub fn with_registry(store: FakeStore, probe: FakeProbe, registry: FakeRegistry) -> Self {
        let store = Arc::new(store);
        let probe = Arc::new(probe);
        let registry = Arc::new(registry);
        let notifier = Arc::new(RecordingNotifier::default());
        let dialog = Arc::new(RecordingDialog::default());

        let workflow = CertificateWorkflow::new(
            store.clone(),
            probe.clone(),
            registry.clone(),
            notifier.clone(),
            dialog.clone(),
        );

        Self { store, probe, registry, notifier, dialog, workflow }
    }

    /// Fill the two required slots under `name`.
    pub fn minimal(mut self, name: &str) -> Self {
        self.workflow.set_certificate_name(name);
        self.workflow.set_certificate("CERT");
        self.workflow.set_private_key("KEY");
        self
    }

    /// Fill all four slots under `name`.
    pub fn full(self, name: &str) -> Self {
        let mut harness = self.minimal(name);
        harness.workflow.set_passphrase("PASS");
        harness.workflow.set_intermediate("CHAIN");
        harness
    }
}

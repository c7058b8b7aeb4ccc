//! # Certificate workflow
//!
//! Provisions one TLS bundle: probe the key manager, create every used secret
//! concurrently, then assemble a certificate container from the returned
//! references.
//!
//! ```text
//! Idle ─submit─▶ Probing ─▶ CreatingSecrets ─▶ CreatingContainer ─▶ Succeeded ─┐
//!  │                │              │                    │                      ├▶ Closed
//!  │                ▼              ▼                    ▼                      │
//!  │           ProbeFailed    SecretsFailed      ContainerFailed ──────────────┘
//!  └─cancel─▶ Dismissed
//! ```
//!
//! Every terminal path sends exactly one notification and closes the dialog
//! exactly once. Secrets created before a later failure are not deleted.

pub mod error;
pub mod notify;

pub use error::{
    WorkflowError, CERTIFICATES_CREATED, CONTAINER_FAILED, KEY_MANAGER_UNAVAILABLE,
    SECRETS_FAILED,
};
pub use notify::{Dialog, NotificationLevel, NotificationSink};

use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn, Instrument};

use crate::catalog::{CapabilityProbe, KEY_MANAGER_SERVICE};
use crate::certificates::{
    validate_fields, CertificateSpec, ContainerSpec, FieldErrors, NameRegistry, SecretRefEntry,
    SecretRole,
};
use crate::observability::MetricsRecorder;
use crate::secrets::{ContainerRef, SecretPayload, SecretStoreClient};

/// Where a workflow instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowState {
    Idle,
    Probing,
    CreatingSecrets,
    CreatingContainer,
    Succeeded,
    ProbeFailed,
    SecretsFailed,
    ContainerFailed,
    Closed,
    Dismissed,
}

impl WorkflowState {
    /// Closed and Dismissed accept no further transitions.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Closed | Self::Dismissed)
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Probing => "probing",
            Self::CreatingSecrets => "creating_secrets",
            Self::CreatingContainer => "creating_container",
            Self::Succeeded => "succeeded",
            Self::ProbeFailed => "probe_failed",
            Self::SecretsFailed => "secrets_failed",
            Self::ContainerFailed => "container_failed",
            Self::Closed => "closed",
            Self::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the passphrase field is shown in clear text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordVisibility {
    #[default]
    Visible,
    Hidden,
}

/// One certificate-bundle creation, bound to its collaborators.
pub struct CertificateWorkflow {
    spec: CertificateSpec,
    container: ContainerSpec,
    state: WorkflowState,
    history: Vec<WorkflowState>,
    busy: bool,
    password_visibility: PasswordVisibility,
    store: Arc<dyn SecretStoreClient>,
    probe: Arc<dyn CapabilityProbe>,
    registry: Arc<dyn NameRegistry>,
    notifier: Arc<dyn NotificationSink>,
    dialog: Arc<dyn Dialog>,
    metrics: MetricsRecorder,
}

impl CertificateWorkflow {
    pub fn new(
        store: Arc<dyn SecretStoreClient>,
        probe: Arc<dyn CapabilityProbe>,
        registry: Arc<dyn NameRegistry>,
        notifier: Arc<dyn NotificationSink>,
        dialog: Arc<dyn Dialog>,
    ) -> Self {
        Self {
            spec: CertificateSpec::default(),
            container: ContainerSpec::default(),
            state: WorkflowState::Idle,
            history: vec![WorkflowState::Idle],
            busy: false,
            password_visibility: PasswordVisibility::default(),
            store,
            probe,
            registry,
            notifier,
            dialog,
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Every state entered so far, starting with `Idle`.
    pub fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn spec(&self) -> &CertificateSpec {
        &self.spec
    }

    /// Container request as built by the last submission.
    pub fn container_spec(&self) -> &ContainerSpec {
        &self.container
    }

    pub fn password_visibility(&self) -> PasswordVisibility {
        self.password_visibility
    }

    pub fn reveal_password(&mut self) {
        self.password_visibility = PasswordVisibility::Visible;
    }

    pub fn hide_password(&mut self) {
        self.password_visibility = PasswordVisibility::Hidden;
    }

    /// Set the certificate name and re-derive the sibling secret names.
    pub fn set_certificate_name(&mut self, name: impl Into<String>) {
        self.spec.certificate.name = name.into();
        self.after_cert_name();
    }

    pub fn set_certificate(&mut self, payload: impl Into<SecretPayload>) {
        self.spec.certificate.payload = payload.into();
    }

    pub fn set_private_key(&mut self, payload: impl Into<SecretPayload>) {
        self.spec.private_key.payload = payload.into();
    }

    pub fn set_passphrase(&mut self, payload: impl Into<SecretPayload>) {
        self.spec.passphrase.payload = payload.into();
    }

    pub fn set_intermediate(&mut self, payload: impl Into<SecretPayload>) {
        self.spec.intermediate.payload = payload.into();
    }

    pub fn after_cert_name(&mut self) {
        self.spec.after_cert_name();
    }

    /// Whether `candidate` is in the registry's current snapshot.
    pub fn does_certificate_exist(&self, candidate: &str) -> bool {
        self.registry.certificate_names().iter().any(|name| name == candidate)
    }

    /// Check every field against the current registry snapshot.
    pub fn validate_fields(&self) -> FieldErrors {
        let exists = self.does_certificate_exist(&self.spec.certificate.name);
        validate_fields(&self.spec, exists)
    }

    /// Leave without submitting. Only meaningful before `submit()`.
    pub fn cancel(&mut self) {
        if self.state == WorkflowState::Idle {
            self.dialog.dismiss();
            self.transition(WorkflowState::Dismissed);
        } else {
            debug!(state = %self.state, "Ignoring cancel outside idle state");
        }
    }

    /// Run the workflow to a terminal state.
    ///
    /// The notification and the dialog close have happened by the time this
    /// returns; the result is for callers that need the container reference
    /// or the orphaned secrets.
    pub async fn submit(&mut self) -> Result<ContainerRef, WorkflowError> {
        if self.state != WorkflowState::Idle {
            return Err(WorkflowError::NotIdle { state: self.state });
        }

        let span = crate::workflow_span!("submit", self.spec.certificate.name);
        let started = Instant::now();
        self.busy = true;

        let outcome = self.provision().instrument(span.clone()).await;
        self.finish(&outcome).instrument(span).await;

        let elapsed = started.elapsed().as_secs_f64();
        self.metrics.record_workflow_outcome(self.terminal_state().as_str(), elapsed);
        if let Err(e) = &outcome {
            self.metrics.record_orphaned_secrets(e.orphaned().len());
        }
        outcome
    }

    async fn provision(&mut self) -> Result<ContainerRef, WorkflowError> {
        self.spec.after_cert_name();
        self.container = ContainerSpec::named(self.spec.certificate.name.clone());

        self.transition(WorkflowState::Probing);
        let reason = match self.probe.is_capability_enabled(KEY_MANAGER_SERVICE).await {
            Ok(true) => None,
            Ok(false) => Some(format!("service '{KEY_MANAGER_SERVICE}' is not enabled")),
            Err(e) => Some(e.to_string()),
        };
        if let Some(reason) = reason {
            warn!(reason = %reason, "Key manager unavailable");
            self.transition(WorkflowState::ProbeFailed);
            return Err(WorkflowError::CapabilityUnavailable { reason });
        }

        self.transition(WorkflowState::CreatingSecrets);
        let failed = self.create_secrets().await;
        if !failed.is_empty() {
            self.transition(WorkflowState::SecretsFailed);
            let orphaned = self.container.secret_refs.clone();
            warn_orphaned(&orphaned);
            return Err(WorkflowError::SecretCreation { failed, orphaned });
        }

        self.transition(WorkflowState::CreatingContainer);
        match self.store.create_certificate_container(&self.container).await {
            Ok(container_ref) => {
                info!(container_ref = %container_ref, "Certificate container created");
                self.transition(WorkflowState::Succeeded);
                Ok(container_ref)
            }
            Err(source) => {
                warn!(error = %source, "Certificate container creation failed");
                self.transition(WorkflowState::ContainerFailed);
                let orphaned = self.container.secret_refs.clone();
                warn_orphaned(&orphaned);
                Err(WorkflowError::ContainerCreation { source, orphaned })
            }
        }
    }

    /// Issue every needed secret call at once and wait for all of them.
    ///
    /// Returns the roles whose call failed, in slot order. References of the
    /// successful calls are appended to the container in completion order.
    async fn create_secrets(&mut self) -> Vec<SecretRole> {
        let Self { spec, container, store, metrics, .. } = self;
        let store: &dyn SecretStoreClient = &**store;
        let spec: &CertificateSpec = spec;

        let mut pending: FuturesUnordered<_> = spec
            .issued_roles()
            .into_iter()
            .map(|role| {
                let slot = spec.slot(role);
                async move { (role, store.create_secret(slot).await) }
            })
            .collect();
        debug!(issued = pending.len(), "Creating secrets");

        let mut failed = Vec::new();
        while let Some((role, result)) = pending.next().await {
            metrics.record_secret_call(role.tag(), result.is_ok());
            match result {
                Ok(secret_ref) => {
                    debug!(role = %role, secret_ref = %secret_ref, "Secret created");
                    container.secret_refs.push(SecretRefEntry { name: role, secret_ref });
                }
                Err(e) => {
                    warn!(role = %role, error = %e, "Secret creation failed");
                    failed.push(role);
                }
            }
        }

        failed.sort();
        failed
    }

    async fn finish(&mut self, outcome: &Result<ContainerRef, WorkflowError>) {
        match outcome {
            Ok(_) => {
                self.notifier.notify(NotificationLevel::Success, CERTIFICATES_CREATED);
                if let Err(e) = self.registry.refresh_certificate_list().await {
                    warn!(error = %e, "Certificate list refresh failed");
                }
            }
            Err(e) => {
                if let Some(message) = e.user_message() {
                    self.notifier.notify(NotificationLevel::Error, message);
                }
            }
        }

        self.busy = false;
        self.dialog.close();
        self.transition(WorkflowState::Closed);
    }

    /// Last state entered before `Closed`.
    fn terminal_state(&self) -> WorkflowState {
        self.history
            .iter()
            .rev()
            .copied()
            .find(|state| !state.is_final())
            .unwrap_or(WorkflowState::Idle)
    }

    fn transition(&mut self, next: WorkflowState) {
        debug!(from = %self.state, to = %next, "Workflow transition");
        self.state = next;
        self.history.push(next);
    }
}

fn warn_orphaned(orphaned: &[SecretRefEntry]) {
    for entry in orphaned {
        warn!(
            role = %entry.name,
            secret_ref = %entry.secret_ref,
            "Secret left without a container"
        );
    }
}

//! Terminal rendering for the CLI: notifications, the dialog stand-in, and
//! command output in text or JSON form.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

use crate::certificates::{FieldErrors, SecretRole};
use crate::secrets::{ContainerRef, ContainerSummary};
use crate::workflow::{
    CertificateWorkflow, Dialog, NotificationLevel, NotificationSink, PasswordVisibility,
    WorkflowError,
};

const MASK: &str = "********";

/// Writes workflow notifications to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, level: NotificationLevel, message: &str) {
        match level {
            NotificationLevel::Success => eprintln!("{} {}", "✓".green().bold(), message),
            NotificationLevel::Error => eprintln!("{} {}", "✗".red().bold(), message),
        }
    }
}

/// The CLI has no window; this records how the invocation ended.
#[derive(Debug, Default)]
pub struct TerminalDialog {
    closed: AtomicU32,
    dismissed: AtomicU32,
}

impl TerminalDialog {
    pub fn close_count(&self) -> u32 {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn dismiss_count(&self) -> u32 {
        self.dismissed.load(Ordering::SeqCst)
    }
}

impl Dialog for TerminalDialog {
    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
        debug!("Dialog closed");
    }

    fn dismiss(&self) {
        self.dismissed.fetch_add(1, Ordering::SeqCst);
        debug!("Dialog dismissed");
    }
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

#[derive(Debug, Serialize)]
struct PlannedSecret {
    role: SecretRole,
    name: String,
    payload_content_type: String,
    bytes: usize,
}

#[derive(Debug, Serialize)]
struct Plan {
    container: String,
    #[serde(rename = "type")]
    container_type: &'static str,
    secrets: Vec<PlannedSecret>,
    #[serde(skip_serializing_if = "Option::is_none")]
    passphrase: Option<String>,
}

fn plan(workflow: &CertificateWorkflow) -> Plan {
    let spec = workflow.spec();
    let secrets = spec
        .issued_roles()
        .into_iter()
        .map(|role| {
            let slot = spec.slot(role);
            PlannedSecret {
                role,
                name: slot.name.clone(),
                payload_content_type: slot.payload_content_type.clone(),
                bytes: slot.payload.len(),
            }
        })
        .collect();

    let passphrase = (!spec.passphrase.is_empty()).then(|| {
        match workflow.password_visibility() {
            PasswordVisibility::Visible => spec.passphrase.payload.expose_secret().to_string(),
            PasswordVisibility::Hidden => MASK.to_string(),
        }
    });

    Plan {
        container: spec.certificate.name.clone(),
        container_type: crate::certificates::CERTIFICATE_CONTAINER_TYPE,
        secrets,
        passphrase,
    }
}

/// Show what `submit()` would create.
pub fn print_plan(workflow: &CertificateWorkflow, json: bool) -> Result<()> {
    let plan = plan(workflow);
    if json {
        return print_json(&plan);
    }

    println!("Container {} ({})", plan.container.bold(), plan.container_type);
    for secret in &plan.secrets {
        println!(
            "  {:<24} {:<40} {} bytes",
            secret.role.tag(),
            secret.name,
            secret.bytes
        );
    }
    if let Some(passphrase) = &plan.passphrase {
        println!("  passphrase: {}", passphrase);
    }
    Ok(())
}

/// Print each failed field with its fixed message.
pub fn print_field_errors(errors: &FieldErrors) {
    for (_, message, reason) in errors.iter() {
        eprintln!("{} {}", "✗".red().bold(), message);
        eprintln!("    {}", reason.dimmed());
    }
}

#[derive(Serialize)]
struct Created<'a> {
    container_ref: &'a ContainerRef,
}

/// Print the reference of a newly created container.
pub fn print_created(container_ref: &ContainerRef, json: bool) -> Result<()> {
    if json {
        print_json(&Created { container_ref })
    } else {
        println!("{}", container_ref);
        Ok(())
    }
}

/// Report secrets a failed workflow left behind.
pub fn print_orphans(error: &WorkflowError) {
    let orphaned = error.orphaned();
    if orphaned.is_empty() {
        return;
    }
    eprintln!("{}", "Secrets created before the failure were not removed:".yellow());
    for entry in orphaned {
        eprintln!("  {:<24} {}", entry.name.tag(), entry.secret_ref);
    }
}

/// Print certificate containers as a table or JSON.
pub fn print_containers(containers: &[ContainerSummary], json: bool) -> Result<()> {
    if json {
        return print_json(&containers);
    }

    if containers.is_empty() {
        println!("No certificate containers found");
        return Ok(());
    }

    println!("{:<40} {:<10} {}", "NAME".bold(), "STATUS".bold(), "CONTAINER REF".bold());
    for container in containers {
        println!(
            "{:<40} {:<10} {}",
            container.name.as_deref().unwrap_or("-"),
            container.status.as_deref().unwrap_or("-"),
            container.container_ref
        );
    }
    Ok(())
}

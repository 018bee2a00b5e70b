//! Orchestrator
//!
//! Sequences reconciliation along realm → client → user → credential and
//! applies the per-step failure policy.

use serde::Serialize;
use std::sync::Arc;

use crate::core::HttpTransport;
use crate::error::{AuthError, BootstrapError, ReconcileError};
use crate::reconcile::ResourceReconciler;
use crate::telemetry::{EventSink, NoOpEventSink, Step, StepEvent, StepStatus};
use crate::token::{AdminCredentials, PasswordGrantTokenManager, TokenManager};
use crate::types::{
    BootstrapConfig, ClientSpec, Credential, CredentialSpec, FailurePolicy, RealmSpec,
    ReconcileOutcome, ResourceSpec, UserSpec,
};

/// Desired end state of one run.
#[derive(Clone, Debug)]
pub struct BootstrapPlan {
    pub realm: RealmSpec,
    /// Skipped when absent.
    pub client: Option<ClientSpec>,
    pub user: UserSpec,
    pub password: CredentialSpec,
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    Authenticated,
    RealmReady,
    ClientAttempted,
    UserReady,
    CredentialSet,
    Done,
    Aborted,
}

/// A step that did not reach its desired state.
#[derive(Debug, Clone, Serialize)]
pub struct StepFailure {
    pub step: Step,
    /// Whether the failure ended the run.
    pub fatal: bool,
    pub message: String,
    /// Status reported by the admin API, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Raw response body reported by the admin API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Result of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub final_state: RunState,
    pub steps: Vec<StepEvent>,
    pub failures: Vec<StepFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            final_state: RunState::Init,
            steps: Vec::new(),
            failures: Vec::new(),
            user_id: None,
        }
    }

    /// Reached `Done` with every step succeeding.
    pub fn is_success(&self) -> bool {
        self.final_state == RunState::Done && self.failures.is_empty()
    }

    /// Reached `Done` but at least one step failed.
    pub fn is_degraded(&self) -> bool {
        self.final_state == RunState::Done && !self.failures.is_empty()
    }

    /// Process exit code: 0 success, 1 aborted, 2 degraded.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else if self.final_state == RunState::Aborted {
            1
        } else {
            2
        }
    }

    /// Status recorded for `step`, if it ran.
    pub fn status_of(&self, step: Step) -> Option<StepStatus> {
        self.steps
            .iter()
            .rev()
            .find(|event| event.step == step)
            .map(|event| event.status)
    }
}

/// Runs a [`BootstrapPlan`] to completion.
pub struct Orchestrator<T: HttpTransport, M: TokenManager> {
    tokens: M,
    reconciler: ResourceReconciler<T>,
    policy: FailurePolicy,
    events: Arc<dyn EventSink>,
}

impl<T: HttpTransport> Orchestrator<T, PasswordGrantTokenManager<T>> {
    /// Wire the password-grant token manager and reconciler from `config`.
    pub fn from_config(config: &BootstrapConfig, transport: Arc<T>) -> Result<Self, BootstrapError> {
        let tokens =
            PasswordGrantTokenManager::new(AdminCredentials::from_config(config), transport.clone());
        let reconciler =
            ResourceReconciler::new(&config.base_url, transport, config.retry.clone())?;
        Ok(Self::new(tokens, reconciler, config.policy))
    }
}

impl<T: HttpTransport, M: TokenManager> Orchestrator<T, M> {
    /// Create new orchestrator.
    pub fn new(tokens: M, reconciler: ResourceReconciler<T>, policy: FailurePolicy) -> Self {
        Self {
            tokens,
            reconciler,
            policy,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Send step events to `sink`.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.events = sink;
        self
    }

    /// Execute the plan. Never panics on remote failures; every outcome is in
    /// the report.
    pub async fn run(&self, plan: &BootstrapPlan) -> RunReport {
        let mut report = RunReport::new();

        // Init -> Authenticated
        let credential = match self.tokens.acquire().await {
            Ok(credential) => {
                self.record(&mut report, Step::Authenticate, StepStatus::Succeeded, None);
                credential
            }
            Err(error) => {
                self.fail(&mut report, true, failure_from_error(Step::Authenticate, &error));
                return self.abort(report);
            }
        };
        report.final_state = RunState::Authenticated;

        if self.policy.recreate_realm {
            match self
                .reconciler
                .delete_realm(&plan.realm.realm, &credential)
                .await
            {
                Ok(existed) => {
                    let detail = if existed { "deleted" } else { "absent" };
                    self.record(
                        &mut report,
                        Step::DeleteRealm,
                        StepStatus::Succeeded,
                        Some(detail.to_string()),
                    );
                }
                Err(error) => {
                    self.fail(&mut report, true, failure_from_error(Step::DeleteRealm, &error));
                    return self.abort(report);
                }
            }
        }

        // Authenticated -> RealmReady
        let realm_spec = ResourceSpec::Realm(plan.realm.clone());
        if self
            .reconcile_step(&mut report, Step::Realm, &realm_spec, &credential, true)
            .await
            .is_none()
        {
            return self.abort(report);
        }
        report.final_state = RunState::RealmReady;

        // RealmReady -> ClientAttempted
        match &plan.client {
            Some(client) => {
                let spec = ResourceSpec::Client {
                    realm: plan.realm.realm.clone(),
                    spec: client.clone(),
                };
                let fatal = self.policy.abort_on_client_failure;
                if self
                    .reconcile_step(&mut report, Step::Client, &spec, &credential, fatal)
                    .await
                    .is_none()
                    && fatal
                {
                    return self.abort(report);
                }
            }
            None => self.record(&mut report, Step::Client, StepStatus::Skipped, None),
        }
        report.final_state = RunState::ClientAttempted;

        // ClientAttempted -> UserReady
        let user_spec = ResourceSpec::User {
            realm: plan.realm.realm.clone(),
            spec: plan.user.clone(),
        };
        let user_id = match self
            .reconcile_step(&mut report, Step::User, &user_spec, &credential, true)
            .await
        {
            Some(outcome) => match outcome.id() {
                Some(id) => id.to_string(),
                None => {
                    let error = ReconcileError::LookupInconsistency {
                        realm: plan.realm.realm.clone(),
                        username: plan.user.username.clone(),
                    };
                    self.fail(&mut report, true, failure_from_reconcile(Step::User, &error));
                    return self.abort(report);
                }
            },
            None => return self.abort(report),
        };
        report.user_id = Some(user_id.clone());
        report.final_state = RunState::UserReady;

        // UserReady -> CredentialSet
        let credential_spec = ResourceSpec::Credential {
            realm: plan.realm.realm.clone(),
            user_id,
            spec: plan.password.clone(),
        };
        let fatal = self.policy.abort_on_credential_failure;
        if self
            .reconcile_step(&mut report, Step::Credential, &credential_spec, &credential, fatal)
            .await
            .is_some()
        {
            report.final_state = RunState::CredentialSet;
        } else if fatal {
            return self.abort(report);
        }

        report.final_state = RunState::Done;
        tracing::info!(
            success = report.is_success(),
            failures = report.failures.len(),
            "provisioning run finished"
        );
        report
    }

    /// Reconcile one resource and record the result. `None` on failure.
    async fn reconcile_step(
        &self,
        report: &mut RunReport,
        step: Step,
        spec: &ResourceSpec,
        credential: &Credential,
        fatal: bool,
    ) -> Option<ReconcileOutcome> {
        match self.reconciler.reconcile(spec, credential).await {
            Ok(ReconcileOutcome::Failed(error)) => {
                self.fail(report, fatal, failure_from_reconcile(step, &error));
                None
            }
            Ok(outcome) => {
                let status = match outcome {
                    ReconcileOutcome::AlreadyExists(_) => StepStatus::AlreadyExists,
                    _ => StepStatus::Created,
                };
                let detail = match outcome.id() {
                    Some(id) => format!("{} ({})", spec.name(), id),
                    None => spec.name().to_string(),
                };
                self.record(report, step, status, Some(detail));
                Some(outcome)
            }
            Err(error) => {
                self.fail(report, fatal, failure_from_error(step, &error));
                None
            }
        }
    }

    fn record(&self, report: &mut RunReport, step: Step, status: StepStatus, detail: Option<String>) {
        let event = StepEvent::new(step, status, detail);
        self.events.emit(&event);
        report.steps.push(event);
    }

    fn fail(&self, report: &mut RunReport, fatal: bool, mut failure: StepFailure) {
        failure.fatal = fatal;
        self.record(report, failure.step, StepStatus::Failed, Some(failure.message.clone()));
        report.failures.push(failure);
    }

    fn abort(&self, mut report: RunReport) -> RunReport {
        tracing::error!(
            reached = ?report.final_state,
            failures = report.failures.len(),
            "provisioning run aborted"
        );
        report.final_state = RunState::Aborted;
        report
    }
}

fn failure_from_reconcile(step: Step, error: &ReconcileError) -> StepFailure {
    StepFailure {
        step,
        fatal: false,
        message: error.to_string(),
        http_status: error.status(),
        body: error.body().map(str::to_string),
    }
}

fn failure_from_error(step: Step, error: &BootstrapError) -> StepFailure {
    match error {
        BootstrapError::Reconcile(inner) => failure_from_reconcile(step, inner),
        BootstrapError::Auth(AuthError::Rejected { status, body }) => StepFailure {
            step,
            fatal: false,
            message: error.to_string(),
            http_status: Some(*status),
            body: Some(body.clone()),
        },
        other => StepFailure {
            step,
            fatal: false,
            message: other.to_string(),
            http_status: None,
            body: None,
        },
    }
}

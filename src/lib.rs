//! Realm Bootstrap
//!
//! Idempotent provisioning of an identity-provider realm, application client,
//! user and password through the provider's admin REST API.
//!
//! # Features
//!
//! - Administrator password grant against the `master` realm
//! - Create-or-confirm-existing reconciliation (409 Conflict is success)
//! - Bounded retry with exponential backoff on transient 5xx responses
//! - Ordered realm → client → user → credential run with a per-step failure policy
//! - Readiness wait for a freshly started server
//!
//! # Example
//!
//! ```rust,ignore
//! use realm_bootstrap::{
//!     bootstrap_config, BootstrapPlan, ClientSpec, CredentialSpec, Orchestrator, RealmSpec,
//!     ReqwestHttpTransport, UserSpec,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = bootstrap_config()
//!         .base_url("http://localhost:8090")
//!         .admin_username("admin")
//!         .admin_password("admin")
//!         .build()?;
//!
//!     let transport = Arc::new(ReqwestHttpTransport::with_config(&config.transport)?);
//!     let orchestrator = Orchestrator::from_config(&config, transport)?;
//!
//!     let plan = BootstrapPlan {
//!         realm: RealmSpec::new("durval-crm"),
//!         client: Some(ClientSpec::public_pkce("durvalcrm-app")),
//!         user: UserSpec::new("tesouraria"),
//!         password: CredentialSpec::password("change-me"),
//!     };
//!
//!     let report = orchestrator.run(&plan).await;
//!     std::process::exit(report.exit_code());
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: configuration, desired-state specs and outcomes
//! - `error`: error hierarchy
//! - `core`: HTTP transport and readiness wait
//! - `resilience`: retry policy
//! - `token`: administrator token acquisition
//! - `reconcile`: create-or-confirm-existing per resource kind
//! - `orchestrator`: ordered run with failure policy
//! - `telemetry`: logging setup and step events
//! - `builders`: fluent configuration builder

pub mod builders;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod reconcile;
pub mod resilience;
pub mod telemetry;
pub mod token;
pub mod types;

// Re-export builders
pub use builders::{bootstrap_config, BootstrapConfigBuilder};

// Re-export errors
pub use error::{
    AuthError, BootstrapError, BootstrapResult, ConfigurationError, NetworkError, ProtocolError,
    ReconcileError,
};

// Re-export types
pub use types::{
    // Config
    BootstrapConfig, FailurePolicy, ReadinessConfig, TransportConfig,
    // Token
    Credential, TokenResponse,
    // Representations
    ClientSpec, CredentialSpec, RealmRoles, RealmSpec, RoleSpec, UserRepresentation, UserSpec,
    // Resources
    ReconcileOutcome, ResourceKind, ResourceSpec,
};

// Re-export core components
pub use core::{
    wait_until_ready, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
};

// Re-export resilience
pub use resilience::{RetryConfig, RetryPolicy, RetryStats, DEFAULT_RETRY_STATUSES};

// Re-export token management
pub use token::{AdminCredentials, PasswordGrantTokenManager, TokenManager};

// Re-export reconciliation
pub use reconcile::ResourceReconciler;

// Re-export orchestration
pub use orchestrator::{BootstrapPlan, Orchestrator, RunReport, RunState, StepFailure};

// Re-export telemetry
pub use telemetry::{
    EventSink, InMemoryEventSink, LogFormat, LogLevel, LoggingConfig, NoOpEventSink, Step,
    StepEvent, StepStatus, TracingEventSink,
};

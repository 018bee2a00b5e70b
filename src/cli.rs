//! CLI argument parsing.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use realm_bootstrap::{
    BootstrapConfigBuilder, BootstrapPlan, BootstrapResult, ClientSpec, CredentialSpec,
    LogFormat, ReadinessConfig, RealmSpec, UserSpec,
};

/// Provision a realm, client, user and password on an identity provider.
///
/// Every step is idempotent: re-running against a provisioned server
/// confirms the existing resources and overwrites the password.
#[derive(Debug, Parser)]
#[command(name = "realm-bootstrap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Identity provider base URL.
    #[arg(long, env = "KEYCLOAK_URL", default_value = "http://localhost:8090")]
    pub url: String,

    /// Administrator username in the master realm.
    #[arg(long, env = "KEYCLOAK_ADMIN_USER", default_value = "admin")]
    pub admin_user: String,

    /// Administrator password.
    #[arg(long, env = "KEYCLOAK_ADMIN_PASSWORD", default_value = "admin", hide_env_values = true)]
    pub admin_password: String,

    /// Realm that owns the administrator account.
    #[arg(long, env = "KEYCLOAK_ADMIN_REALM", default_value = "master")]
    pub admin_realm: String,

    /// Client used for the administrator password grant.
    #[arg(long, env = "KEYCLOAK_ADMIN_CLIENT_ID", default_value = "admin-cli")]
    pub admin_client_id: String,

    /// Realm to provision.
    #[arg(long, env = "REALM_NAME", default_value = "durval-crm")]
    pub realm: String,

    /// Realm export document to create instead of the built-in realm.
    #[arg(long, env = "REALM_FILE")]
    pub realm_file: Option<PathBuf>,

    /// Application client id.
    #[arg(long, env = "CLIENT_ID", default_value = "durvalcrm-app")]
    pub client_id: String,

    /// Do not provision the application client.
    #[arg(long)]
    pub skip_client: bool,

    /// Redirect URIs for the client (comma separated). Derived from the app
    /// base URLs when empty.
    #[arg(long, env = "CLIENT_REDIRECT_URIS", value_delimiter = ',')]
    pub redirect_uris: Vec<String>,

    /// Web origins for the client (comma separated). Derived from the app
    /// base URLs when empty.
    #[arg(long, env = "CLIENT_WEB_ORIGINS", value_delimiter = ',')]
    pub web_origins: Vec<String>,

    /// Application base URL on localhost.
    #[arg(long, env = "APP_BASE_URL_LOCALHOST", default_value = "http://localhost:9080")]
    pub app_base_url_localhost: String,

    /// Application base URL on the loopback address.
    #[arg(long, env = "APP_BASE_URL_127", default_value = "http://127.0.0.1:9080")]
    pub app_base_url_127: String,

    /// Application context path.
    #[arg(long, env = "APP_CONTEXT_PATH", default_value = "/crm")]
    pub app_context_path: String,

    /// Username to provision.
    #[arg(long, env = "BOOTSTRAP_USERNAME", default_value = "tesouraria")]
    pub username: String,

    /// Password to set on the provisioned user.
    #[arg(long, env = "BOOTSTRAP_USER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Email of the provisioned user.
    #[arg(long, env = "BOOTSTRAP_USER_EMAIL")]
    pub email: Option<String>,

    /// First name of the provisioned user.
    #[arg(long, env = "BOOTSTRAP_USER_FIRST_NAME")]
    pub first_name: Option<String>,

    /// Last name of the provisioned user.
    #[arg(long, env = "BOOTSTRAP_USER_LAST_NAME")]
    pub last_name: Option<String>,

    /// Skip TLS certificate verification.
    #[arg(long)]
    pub insecure: bool,

    /// Total attempts per admin API request on transient errors.
    #[arg(long, default_value_t = 3)]
    pub max_attempts: u32,

    /// Stop the run when the client cannot be provisioned.
    #[arg(long)]
    pub abort_on_client_failure: bool,

    /// Stop the run when the password cannot be set.
    #[arg(long)]
    pub abort_on_credential_failure: bool,

    /// Delete the realm before provisioning it.
    #[arg(long)]
    pub recreate_realm: bool,

    /// Readiness polls before giving up.
    #[arg(long, default_value_t = 30)]
    pub wait_attempts: u32,

    /// Seconds between readiness polls.
    #[arg(long, default_value_t = 2)]
    pub wait_interval: u64,

    /// Start provisioning without waiting for the server.
    #[arg(long)]
    pub skip_wait: bool,

    /// Log output format (pretty, compact, json).
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the run report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Configuration builder seeded from the environment and overridden by
    /// the parsed arguments.
    pub fn config_builder(&self) -> BootstrapConfigBuilder {
        // Only KEYCLOAK_VERIFY_TLS survives from the environment seed; the
        // URL and admin account are read by clap and set below.
        let mut builder = BootstrapConfigBuilder::from_env()
            .base_url(self.url.as_str())
            .admin_realm(self.admin_realm.as_str())
            .admin_client_id(self.admin_client_id.as_str())
            .admin_username(self.admin_user.as_str())
            .admin_password(self.admin_password.as_str())
            .max_attempts(self.max_attempts)
            .abort_on_client_failure(self.abort_on_client_failure)
            .abort_on_credential_failure(self.abort_on_credential_failure)
            .recreate_realm(self.recreate_realm);
        if self.insecure {
            builder = builder.verify_tls(false);
        }
        builder
    }

    pub fn readiness(&self) -> ReadinessConfig {
        ReadinessConfig {
            attempts: self.wait_attempts,
            interval: Duration::from_secs(self.wait_interval),
            ..Default::default()
        }
    }

    /// Desired state described by the arguments.
    pub fn plan(&self) -> BootstrapResult<BootstrapPlan> {
        let realm = match &self.realm_file {
            Some(path) => RealmSpec::from_file(path)?,
            None => development_realm(&self.realm),
        };

        let client = (!self.skip_client).then(|| self.client());

        let mut user = UserSpec::new(self.username.as_str());
        user.email = self.email.clone();
        user.first_name = self.first_name.clone();
        user.last_name = self.last_name.clone();

        Ok(BootstrapPlan {
            realm,
            client,
            user,
            password: CredentialSpec::password(self.password.as_str()),
        })
    }

    fn client(&self) -> ClientSpec {
        let mut client = ClientSpec::public_pkce(self.client_id.as_str());
        client.direct_access_grants_enabled = true;
        client.redirect_uris = if self.redirect_uris.is_empty() {
            self.default_redirect_uris()
        } else {
            self.redirect_uris.clone()
        };
        client.web_origins = if self.web_origins.is_empty() {
            self.default_web_origins()
        } else {
            self.web_origins.clone()
        };
        client
            .attributes
            .insert("post.logout.redirect.uris".to_string(), "+".to_string());
        client
    }

    /// Callback and wildcard URIs under the context path for both base URLs,
    /// plus the root-context callbacks.
    pub fn default_redirect_uris(&self) -> Vec<String> {
        let bases = [
            self.app_base_url_localhost.trim_end_matches('/'),
            self.app_base_url_127.trim_end_matches('/'),
        ];
        let context = self.app_context_path.trim_end_matches('/');

        let mut uris: Vec<String> = bases
            .iter()
            .map(|base| format!("{base}{context}/auth/callback"))
            .collect();
        uris.extend(bases.iter().map(|base| format!("{base}{context}/*")));
        uris.extend(bases.iter().map(|base| format!("{base}/auth/callback")));
        uris
    }

    /// Both base URLs plus the local frontend dev server.
    pub fn default_web_origins(&self) -> Vec<String> {
        vec![
            self.app_base_url_localhost.trim_end_matches('/').to_string(),
            self.app_base_url_127.trim_end_matches('/').to_string(),
            "http://localhost:5173".to_string(),
            "http://127.0.0.1:5173".to_string(),
        ]
    }
}

fn development_realm(name: &str) -> RealmSpec {
    let mut realm = RealmSpec::new(name)
        .with_role("user", "User role")
        .with_role("admin", "Admin role");
    realm.login_with_email_allowed = Some(true);
    realm.duplicate_emails_allowed = Some(false);
    realm.reset_password_allowed = Some(true);
    realm.edit_username_allowed = Some(false);
    realm.brute_force_protected = Some(false);
    realm.password_policy = Some("length(8)".to_string());
    realm
}

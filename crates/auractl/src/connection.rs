//! Connection management for the Aura management API

use auractl_core::{ApiClient, Config, CredentialStore, Poller, TokenManager};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::Result as CliResult;

/// Holds the resolved settings for one invocation and builds clients from them
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    pub config: Config,
    pub config_dir: PathBuf,
    /// Credential requested with `--credential`, if any
    pub credential: Option<String>,
}

impl ConnectionManager {
    pub fn new(config: Config, config_dir: PathBuf, credential: Option<String>) -> Self {
        Self {
            config,
            config_dir,
            credential,
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn credential_store(&self) -> CredentialStore {
        CredentialStore::in_dir(&self.config_dir)
    }

    /// Name of the credential this invocation authenticates with
    pub fn active_credential(&self) -> CliResult<String> {
        let credentials = self.credential_store().load()?;
        let credential = credentials.active(self.credential.as_deref())?;
        Ok(credential.name.clone())
    }

    /// Create an authenticated API client for the active credential
    pub fn create_client(&self) -> CliResult<ApiClient> {
        let name = self.active_credential()?;
        info!("Using credential: {}", name);
        debug!(
            "Base URL: {}, auth URL: {}",
            self.config.base_url, self.config.auth_url
        );

        let http = ApiClient::build_http_client()?;
        let tokens = TokenManager::new(
            self.credential_store(),
            name,
            &self.config.auth_url,
            http.clone(),
        );
        Ok(ApiClient::new(&self.config.base_url, tokens, http))
    }

    pub fn poller(&self) -> Poller {
        Poller::from_config(&self.config.polling)
    }

    /// Tenant to use when a command did not name one
    pub fn tenant_or_default(&self, tenant_id: Option<&str>) -> Option<String> {
        tenant_id
            .map(str::to_string)
            .or_else(|| self.config.default_tenant.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auractl_core::{Credential, Credentials};
    use tempfile::TempDir;

    #[test]
    fn test_active_credential_resolution() {
        let dir = TempDir::new().unwrap();
        let mut mgr = ConnectionManager::new(Config::default(), dir.path().to_path_buf(), None);
        assert!(mgr.active_credential().is_err());

        let mut creds = Credentials::default();
        creds.add(Credential::new("prod", "id", "secret")).unwrap();
        creds.add(Credential::new("dev", "id2", "secret2")).unwrap();
        mgr.credential_store().save(&creds).unwrap();

        assert_eq!(mgr.active_credential().unwrap(), "prod");
        mgr.credential = Some("dev".to_string());
        assert_eq!(mgr.active_credential().unwrap(), "dev");
    }

    #[test]
    fn test_tenant_falls_back_to_default() {
        let mut config = Config::default();
        config.default_tenant = Some("default-tenant".to_string());
        let mgr = ConnectionManager::new(config, PathBuf::from("/tmp"), None);

        assert_eq!(mgr.tenant_or_default(Some("t1")).as_deref(), Some("t1"));
        assert_eq!(mgr.tenant_or_default(None).as_deref(), Some("default-tenant"));
    }
}

//! Registry of targets the recipe runs against.
//!
//! The registry is filled from the configured target list the first time it is
//! enumerated, resolving one password per target on the way.

use crate::credentials::{resolve_password, CredentialProvider, PasswordContext};
use crate::defaults::RecetteConfig;
use crate::error::Result;
use crate::target::{TargetConfig, TargetDescriptor};

#[derive(Debug, Default)]
pub struct RegistryState {
    default_password: Option<String>,
    targets: Vec<TargetDescriptor>,
    configured: Vec<TargetConfig>,
    extension_dir_template: Option<String>,
    next_sequence: u64,
}

impl RegistryState {
    /// Registry that populates itself from `configured` on first enumeration.
    pub fn new(configured: Vec<TargetConfig>) -> Self {
        Self {
            configured,
            ..Self::default()
        }
    }

    pub fn from_config(config: &RecetteConfig) -> Self {
        Self::new(config.targets.clone())
            .with_extension_dir_template(config.extension.extension_dir_template.clone())
    }

    pub fn with_extension_dir_template(mut self, template: Option<String>) -> Self {
        self.extension_dir_template = template;
        self
    }

    pub fn default_password(&self) -> Option<&str> {
        self.default_password.as_deref()
    }

    /// Set the password shared by targets without their own.
    ///
    /// Without a value the provider is asked once; an empty answer leaves the default unset.
    pub fn set_default_password(
        &mut self,
        password: Option<&str>,
        provider: &mut dyn CredentialProvider,
    ) -> Result<()> {
        let password = match password.filter(|p| !p.is_empty()) {
            Some(password) => password.to_string(),
            None => provider.read_password(&PasswordContext::SharedDefault)?,
        };

        if password.is_empty() {
            return Ok(());
        }
        self.default_password = Some(password);
        Ok(())
    }

    pub fn reset_default_password(&mut self) {
        self.default_password = None;
    }

    /// Resolve a password for `config` and append the resulting target.
    pub fn add(
        &mut self,
        config: &TargetConfig,
        provider: &mut dyn CredentialProvider,
    ) -> Result<&TargetDescriptor> {
        let context = PasswordContext::Target {
            role: config.user.clone(),
            host: config.host.clone(),
            port: config.port,
            version: config.version.clone(),
        };
        let password = resolve_password(
            config.password.as_deref(),
            self.default_password.as_deref(),
            &context,
            provider,
        )?;
        let extension_dir = config.resolve_extension_dir(self.extension_dir_template.as_deref())?;

        self.next_sequence += 1;
        let descriptor =
            TargetDescriptor::new(config, password, extension_dir).with_sequence(self.next_sequence);
        self.targets.push(descriptor);

        let index = self.targets.len() - 1;
        Ok(&self.targets[index])
    }

    /// Remove `target` if present. Returns whether something was removed.
    pub fn remove(&mut self, target: &TargetDescriptor) -> bool {
        match self.targets.iter().position(|t| t == target) {
            Some(index) => {
                self.targets.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_populated(&self) -> bool {
        !self.targets.is_empty()
    }

    /// Targets currently held, without triggering population.
    pub fn populated(&self) -> &[TargetDescriptor] {
        &self.targets
    }

    /// Enumerate targets in insertion order, populating from configuration first if empty.
    pub fn targets(
        &mut self,
        provider: &mut dyn CredentialProvider,
    ) -> Result<std::slice::Iter<'_, TargetDescriptor>> {
        if self.targets.is_empty() {
            self.populate(provider)?;
        }
        Ok(self.targets.iter())
    }

    fn populate(&mut self, provider: &mut dyn CredentialProvider) -> Result<()> {
        let configured = self.configured.clone();
        let needs_default = configured
            .iter()
            .any(|c| c.password.as_deref().map_or(true, str::is_empty));

        if needs_default && self.default_password.is_none() {
            self.set_default_password(None, provider)?;
        }

        for config in &configured {
            self.add(config, provider)?;
        }

        crate::log_status!("registry", "{} target(s) registered", self.targets.len());
        Ok(())
    }
}

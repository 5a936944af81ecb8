//! Password resolution for targets.
//!
//! A password comes from the target configuration, then from the shared default,
//! then from a [`CredentialProvider`]. Providers are asked again until they return
//! something non-empty.

use crate::error::Result;
use crate::keychain;
use crate::tty;

/// What a password is being asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordContext {
    /// The default shared by every target without its own password.
    SharedDefault,
    Target {
        role: String,
        host: String,
        port: u16,
        version: String,
    },
}

impl PasswordContext {
    pub fn prompt(&self) -> String {
        match self {
            PasswordContext::SharedDefault => "Mot de passe par défaut : ".to_string(),
            PasswordContext::Target {
                role,
                host,
                port,
                version,
            } => format!(
                "Mot de passe pour le rôle \"{}\" sur {}:{} ({}) ? ",
                role, host, port, version
            ),
        }
    }
}

/// Source of passwords that were not configured.
pub trait CredentialProvider {
    /// Ask for a password. An empty string means "nothing entered".
    fn read_password(&mut self, context: &PasswordContext) -> Result<String>;
}

/// Blocking prompt on the controlling terminal.
#[derive(Debug, Default)]
pub struct ConsolePrompt;

impl CredentialProvider for ConsolePrompt {
    fn read_password(&mut self, context: &PasswordContext) -> Result<String> {
        tty::prompt_password(&context.prompt())
    }
}

/// Checks the system keychain for target passwords before asking `inner`.
pub struct KeychainCredentials<P> {
    inner: P,
}

impl<P: CredentialProvider> KeychainCredentials<P> {
    pub fn new(inner: P) -> Self {
        Self { inner }
    }
}

impl<P: CredentialProvider> CredentialProvider for KeychainCredentials<P> {
    fn read_password(&mut self, context: &PasswordContext) -> Result<String> {
        if let PasswordContext::Target {
            role, host, port, ..
        } = context
        {
            match keychain::get(role, host, *port) {
                Ok(Some(password)) if !password.is_empty() => return Ok(password),
                Ok(_) => {}
                Err(err) => {
                    crate::log_status!("keychain", "{}", err.message);
                }
            }
        }
        self.inner.read_password(context)
    }
}

impl<P: CredentialProvider + ?Sized> CredentialProvider for Box<P> {
    fn read_password(&mut self, context: &PasswordContext) -> Result<String> {
        (**self).read_password(context)
    }
}

/// Resolve a non-empty password: explicit value, then shared default, then the
/// provider, asked until it answers with something.
pub fn resolve_password(
    explicit: Option<&str>,
    shared_default: Option<&str>,
    context: &PasswordContext,
    provider: &mut dyn CredentialProvider,
) -> Result<String> {
    if let Some(password) = explicit.filter(|p| !p.is_empty()) {
        return Ok(password.to_string());
    }
    if let Some(password) = shared_default.filter(|p| !p.is_empty()) {
        return Ok(password.to_string());
    }

    loop {
        let answer = provider.read_password(context)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_and_default_passwords_are_used_without_asking() {
        let context = PasswordContext::SharedDefault;
        let mut provider = ConsolePrompt;
        assert_eq!(
            resolve_password(Some("explicit"), Some("shared"), &context, &mut provider).unwrap(),
            "explicit"
        );
        assert_eq!(
            resolve_password(Some(""), Some("shared"), &context, &mut provider).unwrap(),
            "shared"
        );
    }

    #[test]
    fn target_prompt_names_role_address_and_version() {
        let context = PasswordContext::Target {
            role: "postgres".into(),
            host: "localhost".into(),
            port: 5437,
            version: "15".into(),
        };
        assert_eq!(
            context.prompt(),
            "Mot de passe pour le rôle \"postgres\" sur localhost:5437 (15) ? "
        );
        assert_eq!(PasswordContext::SharedDefault.prompt(), "Mot de passe par défaut : ");
    }
}

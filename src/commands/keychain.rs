use clap::{Args, Subcommand};
use serde::Serialize;

use recette::defaults::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER};
use recette::{keychain, tty, Error};

use super::CmdResult;

#[derive(Args, Debug)]
pub struct KeychainArgs {
    #[command(subcommand)]
    command: KeychainCommand,
}

#[derive(Args, Debug)]
struct EntryArgs {
    /// Connection role
    #[arg(long, default_value = DEFAULT_USER)]
    role: String,
    /// Server host
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    /// Server port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[derive(Subcommand, Debug)]
enum KeychainCommand {
    /// Store a password for a role on a server (prompts when --password is omitted)
    Set {
        #[command(flatten)]
        entry: EntryArgs,
        #[arg(long)]
        password: Option<String>,
    },
    /// Remove a stored password
    Delete {
        #[command(flatten)]
        entry: EntryArgs,
    },
}

#[derive(Debug, Serialize)]
pub struct KeychainOutput {
    pub command: String,
    pub key: String,
    pub changed: bool,
}

pub fn run(args: KeychainArgs) -> CmdResult<KeychainOutput> {
    match args.command {
        KeychainCommand::Set { entry, password } => {
            let password = match password.filter(|p| !p.is_empty()) {
                Some(password) => password,
                None if !tty::is_stdin_tty() => {
                    return Err(Error::validation_invalid_argument(
                        "password",
                        "Pass --password when stdin is not a terminal",
                    ));
                }
                None => tty::prompt_password(&format!(
                    "Mot de passe pour {} : ",
                    keychain::entry_key(&entry.role, &entry.host, entry.port)
                ))?,
            };
            if password.is_empty() {
                return Err(Error::validation_invalid_argument(
                    "password",
                    "Refusing to store an empty password",
                ));
            }
            keychain::store(&entry.role, &entry.host, entry.port, &password)?;
            Ok((
                KeychainOutput {
                    command: "keychain.set".to_string(),
                    key: keychain::entry_key(&entry.role, &entry.host, entry.port),
                    changed: true,
                },
                0,
            ))
        }
        KeychainCommand::Delete { entry } => {
            let changed = keychain::delete(&entry.role, &entry.host, entry.port)?;
            Ok((
                KeychainOutput {
                    command: "keychain.delete".to_string(),
                    key: keychain::entry_key(&entry.role, &entry.host, entry.port),
                    changed,
                },
                0,
            ))
        }
    }
}

//! Config command implementation.
//!
//! `config show` prints the stored defaults with secrets masked. `config set`
//! updates only the given fields; provider and subnet names are looked up on
//! the control plane so their ids are stored alongside.

use std::io::Write;

use ccp_client::Transport;
use ccp_config::{Defaults, DefaultsStore, NamedRef};
use tracing::info;

use crate::cli::{ConfigCommands, ConfigSetArgs};
use crate::connection::Connection;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Config command executor.
pub struct ConfigCommand<'a> {
    store: &'a DefaultsStore,
    insecure: bool,
}

impl<'a> ConfigCommand<'a> {
    /// Create a new config command.
    #[must_use]
    pub const fn new(store: &'a DefaultsStore, insecure: bool) -> Self {
        Self { store, insecure }
    }

    /// Execute a config subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if the defaults cannot be read or written, or a
    /// name lookup fails.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ConfigCommands,
    ) -> Result<(), CliError> {
        match command {
            ConfigCommands::Show => {
                let defaults = self.store.load()?;
                format.write(writer, &defaults.redacted())?;
            }
            ConfigCommands::Set(args) => {
                let mut defaults = self.store.load()?;
                apply_settings(args, &mut defaults)?;

                if args.needs_lookup() {
                    let conn = Connection::open(self.store.clone(), defaults, self.insecure)?;
                    save_with_lookup(conn, args).await?;
                } else {
                    self.store.save(&defaults)?;
                }

                info!(path = %self.store.path().display(), "defaults updated");
                let msg = Message::success(format!(
                    "Defaults saved to {}",
                    self.store.path().display()
                ));
                format.write(writer, &msg)?;
            }
        }
        Ok(())
    }
}

/// Copy every given flag into `defaults`.
///
/// Changing the URL or credentials drops the stored session token, since it
/// belongs to the previous identity.
///
/// # Errors
///
/// Returns an error if the token expiry is zero.
pub fn apply_settings(args: &ConfigSetArgs, defaults: &mut Defaults) -> Result<(), CliError> {
    let cp = &mut defaults.control_plane;
    let identity_before = (cp.url.clone(), cp.username.clone(), cp.password.clone());

    set(&mut cp.name, args.name.as_ref());
    set(&mut cp.url, args.url.as_ref());
    set(&mut cp.username, args.username.as_ref());
    set(&mut cp.password, args.password.as_ref());
    if let Some(skip) = args.insecure_skip_verify {
        cp.insecure_skip_verify = skip;
    }
    let identity_changed =
        identity_before != (cp.url.clone(), cp.username.clone(), cp.password.clone());

    if let Some(minutes) = args.token_expiry_minutes {
        if minutes == 0 {
            return Err(CliError::invalid("--token-expiry-minutes must be at least 1"));
        }
        defaults.token_expiry_minutes = minutes;
    }

    set(&mut defaults.ssh.user, args.ssh_user.as_ref());
    set(&mut defaults.ssh.key, args.ssh_key.as_ref());

    let infra = &mut defaults.infra;
    set(&mut infra.cluster, args.cluster.as_ref());
    set(&mut infra.vsphere_cluster, args.vsphere_cluster.as_ref());
    set(&mut infra.datacenter, args.datacenter.as_ref());
    set(&mut infra.datastore, args.datastore.as_ref());
    set(&mut infra.network, args.network.as_ref());
    set(&mut infra.image, args.image.as_ref());

    if identity_changed {
        defaults.clear_session();
    }
    Ok(())
}

fn set(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

/// Log in if needed, resolve names, then save everything in one write.
///
/// Nothing is written when login or a lookup fails, so a bad name does not
/// leave half-applied settings behind.
///
/// # Errors
///
/// Returns an error if login or a lookup fails, or the file cannot be
/// written.
pub async fn save_with_lookup<T: Transport>(
    mut conn: Connection<T>,
    args: &ConfigSetArgs,
) -> Result<(), CliError> {
    conn.client().ensure_session().await?;
    resolve_names(&mut conn, args).await?;
    if !conn.persist_session()? {
        conn.save()?;
    }
    Ok(())
}

/// Resolve `--provider` and `--subnet` names to ids on the control plane.
///
/// # Errors
///
/// Returns [`ccp_client::Error::NotFound`] if a name does not exist.
pub async fn resolve_names<T: Transport>(
    conn: &mut Connection<T>,
    args: &ConfigSetArgs,
) -> Result<(), CliError> {
    if let Some(name) = &args.provider {
        let provider = conn.client().find_provider(name).await?;
        let id = provider.id.unwrap_or_default();
        info!(provider = %name, id = %id, "resolved provider");
        conn.defaults_mut().infra.provider = NamedRef {
            name: name.clone(),
            id,
        };
    }
    if let Some(name) = &args.subnet {
        let subnet = conn.client().find_subnet(name).await?;
        let id = subnet.uuid.unwrap_or_default();
        info!(subnet = %name, id = %id, "resolved subnet");
        conn.defaults_mut().infra.subnet = NamedRef {
            name: name.clone(),
            id,
        };
    }
    Ok(())
}

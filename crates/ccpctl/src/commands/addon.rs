//! Add-on command implementation.
//!
//! `all` expands to every add-on; installs run in catalogue order and
//! deletes in reverse, so operators outlive the instances that need them.

use std::io::Write;

use ccp_client::{Addon, Transport};
use tracing::info;

use crate::cli::AddonCommands;
use crate::commands::cluster_id;
use crate::connection::Connection;
use crate::error::CliError;
use crate::output::{Message, OutputFormat};

/// Add-on command executor.
pub struct AddonCommand<'a, T: Transport> {
    conn: &'a Connection<T>,
}

impl<'a, T: Transport> AddonCommand<'a, T> {
    /// Create a new add-on command.
    pub const fn new(conn: &'a Connection<T>) -> Self {
        Self { conn }
    }

    /// Execute an add-on subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown add-on names, unknown clusters and
    /// failed requests. With `all`, add-ons handled before the failure stay
    /// installed or removed.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &AddonCommands,
    ) -> Result<(), CliError> {
        let client = self.conn.client();
        match command {
            AddonCommands::List { cluster } => {
                let id = cluster_id(client, cluster).await?;
                format.write(writer, &client.installed_addons(&id).await?)?;
            }
            AddonCommands::Catalogue { cluster } => {
                let id = cluster_id(client, cluster).await?;
                format.write(writer, &client.addon_catalogue(&id).await?)?;
            }
            AddonCommands::Install { cluster, addon } => {
                let addons = parse_addons(addon)?;
                let id = cluster_id(client, cluster).await?;
                for addon in addons {
                    client.install_addon(&id, addon).await?;
                    info!(cluster = %cluster, addon = %addon, "add-on installed");
                    let msg = Message::success(format!("Add-on {addon} installed on {cluster}"));
                    format.write(writer, &msg)?;
                }
            }
            AddonCommands::Delete { cluster, addon } => {
                let mut addons = parse_addons(addon)?;
                addons.reverse();
                let id = cluster_id(client, cluster).await?;
                for addon in addons {
                    client.delete_addon(&id, addon).await?;
                    info!(cluster = %cluster, addon = %addon, "add-on deleted");
                    let msg = Message::success(format!("Add-on {addon} removed from {cluster}"));
                    format.write(writer, &msg)?;
                }
            }
        }
        Ok(())
    }
}

/// Expand an add-on argument; `all` yields every add-on in install order.
///
/// # Errors
///
/// Returns [`ccp_client::Error::NotFound`] for unknown names.
pub fn parse_addons(name: &str) -> Result<Vec<Addon>, CliError> {
    if name.eq_ignore_ascii_case("all") {
        return Ok(Addon::ALL.to_vec());
    }
    Ok(vec![name.parse()?])
}

//! Login command implementation.

use std::io::Write;

use ccp_client::Transport;
use serde::Serialize;

use crate::connection::Connection;
use crate::error::CliError;
use crate::output::{OutputFormat, TableDisplay};

/// Forces a login and stores the new token.
pub struct LoginCommand<'a, T: Transport> {
    conn: &'a mut Connection<T>,
}

impl<'a, T: Transport> LoginCommand<'a, T> {
    /// Create a new login command.
    pub fn new(conn: &'a mut Connection<T>) -> Self {
        Self { conn }
    }

    /// Log in and print a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if login fails or the token cannot be stored.
    pub async fn execute<W: Write>(self, writer: &mut W, format: &OutputFormat) -> Result<(), CliError> {
        let token = self.conn.login().await?;
        let cp = &self.conn.defaults().control_plane;
        let summary = LoginSummary {
            control_plane: cp.name.clone(),
            url: cp.url.clone(),
            username: cp.username.clone(),
            acquired_at: token.acquired_at().to_rfc3339(),
        };
        format.write(writer, &summary)
    }
}

/// Result of a successful login. The token itself is never printed.
#[derive(Debug, Clone, Serialize)]
pub struct LoginSummary {
    /// Control-plane name.
    pub control_plane: String,
    /// Control-plane URL.
    pub url: String,
    /// Logged-in user.
    pub username: String,
    /// When the token was issued.
    pub acquired_at: String,
}

impl TableDisplay for LoginSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(
            writer,
            "✓ Logged in to {} ({}) as {}",
            self.control_plane, self.url, self.username
        )?;
        Ok(())
    }
}

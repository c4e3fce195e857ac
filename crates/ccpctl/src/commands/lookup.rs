//! Provider, subnet and ACI profile lookups.

use std::io::Write;

use ccp_client::{AciProfile, ProviderClientConfig, Transport};
use ccp_config::REDACTED;

use crate::cli::LookupCommands;
use crate::connection::Connection;
use crate::error::CliError;
use crate::output::OutputFormat;

/// Read-only collections that share the `list` / `get <name>` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Infrastructure providers.
    Provider,
    /// IP pool subnets.
    Subnet,
    /// ACI fabric profiles.
    AciProfile,
}

/// Lookup command executor.
pub struct LookupCommand<'a, T: Transport> {
    conn: &'a Connection<T>,
    resource: Resource,
}

impl<'a, T: Transport> LookupCommand<'a, T> {
    /// Create a new lookup command.
    pub const fn new(conn: &'a Connection<T>, resource: Resource) -> Self {
        Self { conn, resource }
    }

    /// Execute a lookup subcommand. Stored secrets are masked in the output.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no entry has the given name.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &LookupCommands,
    ) -> Result<(), CliError> {
        let client = self.conn.client();
        match (self.resource, command) {
            (Resource::Provider, LookupCommands::List) => {
                let providers: Vec<_> = client
                    .list_providers()
                    .await?
                    .into_iter()
                    .map(mask_provider)
                    .collect();
                format.write(writer, &providers)?;
            }
            (Resource::Provider, LookupCommands::Get { name }) => {
                let provider = mask_provider(client.find_provider(name).await?);
                format.write(writer, &provider)?;
            }
            (Resource::Subnet, LookupCommands::List) => {
                format.write(writer, &client.list_subnets().await?)?;
            }
            (Resource::Subnet, LookupCommands::Get { name }) => {
                format.write(writer, &client.find_subnet(name).await?)?;
            }
            (Resource::AciProfile, LookupCommands::List) => {
                let profiles: Vec<_> = client
                    .list_aci_profiles()
                    .await?
                    .into_iter()
                    .map(mask_aci_profile)
                    .collect();
                format.write(writer, &profiles)?;
            }
            (Resource::AciProfile, LookupCommands::Get { name }) => {
                let profile = mask_aci_profile(client.find_aci_profile(name).await?);
                format.write(writer, &profile)?;
            }
        }
        Ok(())
    }
}

fn mask_provider(mut provider: ProviderClientConfig) -> ProviderClientConfig {
    if provider.password.is_some() {
        provider.password = Some(REDACTED.to_string());
    }
    provider
}

fn mask_aci_profile(mut profile: AciProfile) -> AciProfile {
    if profile.apic_password.is_some() {
        profile.apic_password = Some(REDACTED.to_string());
    }
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::testing::{StubTransport, configured_defaults};
    use ccp_config::DefaultsStore;
    use serde_json::json;

    fn connect(stub: &StubTransport) -> Connection<StubTransport> {
        let mut defaults = configured_defaults();
        defaults.record_session("tok", chrono::Utc::now());
        Connection::with_transport(stub.clone(), DefaultsStore::at("/nonexistent"), defaults)
            .unwrap()
    }

    async fn run(
        stub: &StubTransport,
        resource: Resource,
        format: Format,
        command: LookupCommands,
    ) -> Result<String, CliError> {
        let conn = connect(stub);
        let mut out = Vec::new();
        LookupCommand::new(&conn, resource)
            .execute(&mut out, &OutputFormat::new(format), &command)
            .await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn provider_password_is_masked() {
        let stub = StubTransport::new().route_json(
            "GET",
            "/v3/providers",
            200,
            &json!([{"id": "p-1", "name": "vsphere", "type": "vsphere", "password": "hunter2"}]),
        );

        let output = run(&stub, Resource::Provider, Format::Json, LookupCommands::List)
            .await
            .unwrap();
        assert!(!output.contains("hunter2"));
        let providers: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(providers[0]["password"], REDACTED);
        assert_eq!(providers[0]["id"], "p-1");
    }

    #[tokio::test]
    async fn aci_profile_password_is_masked() {
        let stub = StubTransport::new().route_json(
            "GET",
            "/v3/aci-profiles",
            200,
            &json!([{"id": "a-1", "name": "fabric", "apic_password": "s3cret"}]),
        );

        let output = run(
            &stub,
            Resource::AciProfile,
            Format::Json,
            LookupCommands::Get {
                name: "fabric".into(),
            },
        )
        .await
        .unwrap();
        assert!(!output.contains("s3cret"));
    }

    #[tokio::test]
    async fn subnet_table_lists_entries() {
        let stub = StubTransport::new().route_json(
            "GET",
            "/2/network_service/subnets/",
            200,
            &json!([{"uuid": "s-1", "name": "default-network-subnet", "cidr": "10.10.99.0/24"}]),
        );

        let output = run(&stub, Resource::Subnet, Format::Table, LookupCommands::List)
            .await
            .unwrap();
        assert!(output.contains("default-network-subnet"));
        assert!(output.contains("10.10.99.0/24"));
    }

    #[tokio::test]
    async fn unknown_name_is_not_found() {
        let stub = StubTransport::new().route_json("GET", "/2/network_service/subnets/", 200, &json!([]));

        let err = run(
            &stub,
            Resource::Subnet,
            Format::Table,
            LookupCommands::Get {
                name: "missing".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "subnet not found: missing");
    }
}

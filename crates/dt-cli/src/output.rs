//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use dt_proto::{
    AuthRefreshData, AuthStartData, CapabilitiesData, DeployPreviewData, DnsRollbackData,
    DnsUpdateData, FetchConfigData, SyncEnvData, Verb, VerbData,
};

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

// ─────────────────────────────────────────────────────────────
// Verb results
// ─────────────────────────────────────────────────────────────

impl TableDisplay for CapabilitiesData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Adapter:   {} v{}", self.adapter_name, self.adapter_version)?;
        writeln!(writer, "Auth:      {}", self.auth_type)?;
        writeln!(writer)?;
        writeln!(writer, "Verbs")?;
        for verb in Verb::ALL {
            let mark = if self.supports(verb) { "✓" } else { "✗" };
            writeln!(writer, "  {mark} {verb}")?;
        }
        writeln!(writer)?;
        writeln!(writer, "Features")?;
        writeln!(writer, "  DNS management:       {}", yes_no(self.features.dns_management))?;
        writeln!(writer, "  Preview deployments:  {}", yes_no(self.features.preview_deployments))?;
        writeln!(writer, "  Environment vars:     {}", yes_no(self.features.env_variables))?;
        writeln!(writer, "  Build logs:           {}", yes_no(self.features.build_logs))?;
        Ok(())
    }
}

impl TableDisplay for AuthStartData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Auth URL:  {}", or_dash(self.auth_url.as_deref()))?;
        writeln!(writer, "Token:     {}", if self.token.is_some() { "issued" } else { "-" })?;
        if let Some(expires_at) = self.expires_at {
            writeln!(writer, "Expires:   {expires_at}")?;
        }
        Ok(())
    }
}

impl TableDisplay for AuthRefreshData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Token:     {}", self.token)?;
        writeln!(writer, "Expires:   {}", self.expires_at)?;
        Ok(())
    }
}

impl TableDisplay for FetchConfigData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Project")?;
        writeln!(writer, "  ID:         {}", self.project.id)?;
        writeln!(writer, "  Name:       {}", self.project.name)?;
        writeln!(writer, "  Domain:     {}", self.project.domain)?;
        writeln!(writer, "  Framework:  {}", or_dash(self.project.framework.as_deref()))?;
        writeln!(writer)?;
        writeln!(writer, "Build")?;
        writeln!(writer, "  Command:    {}", self.build.command)?;
        writeln!(writer, "  Output:     {}", self.build.output_dir)?;
        writeln!(writer, "  Install:    {}", or_dash(self.build.install_command.as_deref()))?;
        writeln!(writer)?;
        if self.env.is_empty() {
            writeln!(writer, "No environment variables")?;
            return Ok(());
        }
        writeln!(writer, "{:<32}  {}", "KEY", "TARGETS")?;
        writeln!(writer, "{}", "─".repeat(56))?;
        for var in &self.env {
            writeln!(writer, "{:<32}  {}", var.key, var.target.join(","))?;
        }
        Ok(())
    }
}

impl TableDisplay for SyncEnvData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Synced {} variable(s)", self.synced)?;
        if !self.failed.is_empty() {
            writeln!(writer, "Failed: {}", self.failed.join(", "))?;
        }
        Ok(())
    }
}

impl TableDisplay for DeployPreviewData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Deployment:  {}", self.deployment_id)?;
        writeln!(writer, "URL:         {}", self.url)?;
        writeln!(writer, "Status:      {}", self.status)?;
        if let Some(secs) = self.build_time {
            writeln!(writer, "Build time:  {secs}s")?;
        }
        Ok(())
    }
}

impl TableDisplay for DnsUpdateData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Record:       {}", self.record_id)?;
        writeln!(writer, "Previous:     {}", or_dash(self.previous_value.as_deref()))?;
        writeln!(writer, "Propagation:  ~{}s", self.propagation_time)?;
        Ok(())
    }
}

impl TableDisplay for DnsRollbackData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Restored:  {}", yes_no(self.restored))?;
        writeln!(writer, "Value:     {}", self.current_value)?;
        Ok(())
    }
}

impl TableDisplay for VerbData {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        match self {
            Self::Capabilities(d) => d.write_table(writer),
            Self::AuthStart(d) => d.write_table(writer),
            Self::AuthRefresh(d) => d.write_table(writer),
            Self::FetchConfig(d) => d.write_table(writer),
            Self::SyncEnv(d) => d.write_table(writer),
            Self::DeployPreview(d) => d.write_table(writer),
            Self::DnsUpdate(d) => d.write_table(writer),
            Self::DnsRollback(d) => d.write_table(writer),
        }
    }
}

// ─────────────────────────────────────────────────────────────
// Command outputs
// ─────────────────────────────────────────────────────────────

/// Result of a raw `dt call`.
#[derive(Debug, Clone, Serialize)]
pub struct CallOutput {
    /// Verb that ran.
    pub verb: Verb,
    /// Decoded result, re-encoded.
    pub data: Value,
    #[serde(skip)]
    typed: VerbData,
}

impl CallOutput {
    /// Wrap a decoded result.
    ///
    /// # Errors
    ///
    /// Returns an error if the result cannot be re-encoded.
    pub fn new(typed: VerbData) -> Result<Self, CliError> {
        let data = typed
            .to_value()
            .map_err(|e| CliError::Format(e.to_string()))?;
        Ok(Self {
            verb: typed.verb(),
            data,
            typed,
        })
    }
}

impl TableDisplay for CallOutput {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.verb)?;
        writeln!(writer, "══════════════════════════════════")?;
        self.typed.write_table(writer)
    }
}

/// Outcome of the `dt auth` flow.
#[derive(Debug, Clone, Serialize)]
pub struct AuthOutcome {
    /// Provider authenticated with.
    pub provider: String,
    /// Adapter that handled the flow.
    pub adapter: String,
    /// How the token was obtained: `flag`, `adapter`, `oauth` or `prompt`.
    pub method: String,
    /// Whether the provider accepted the token.
    pub verified: bool,
    /// Project seen during verification, if one was fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    /// Token expiry reported by the adapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl TableDisplay for AuthOutcome {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let status = if self.verified { "verified" } else { "not verified" };
        writeln!(writer, "Authenticated with {} ({status})", self.provider)?;
        writeln!(writer, "  Adapter:  {}", self.adapter)?;
        writeln!(writer, "  Method:   {}", self.method)?;
        if let Some(project) = &self.project {
            writeln!(writer, "  Project:  {project}")?;
        }
        if let Some(expires_at) = self.expires_at {
            writeln!(writer, "  Expires:  {expires_at}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dt_proto::{AuthType, Features, SyncEnvData};

    fn capabilities() -> CapabilitiesData {
        CapabilitiesData {
            adapter_name: "vercel".into(),
            adapter_version: "1.0.0".into(),
            supported_verbs: vec![Verb::Capabilities, Verb::FetchConfig],
            auth_type: AuthType::Oauth,
            features: Features {
                dns_management: true,
                ..Features::default()
            },
        }
    }

    #[test]
    fn capabilities_table_marks_verbs() {
        let text = OutputFormat::default().to_string(&capabilities()).unwrap();
        assert!(text.contains("Adapter:   vercel v1.0.0"));
        assert!(text.contains("✓ fetch:config"));
        assert!(text.contains("✗ dns:update"));
        assert!(text.contains("DNS management:       yes"));
    }

    #[test]
    fn capabilities_json_uses_wire_names() {
        let text = OutputFormat::new(Format::Json)
            .to_string(&capabilities())
            .unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["auth_type"], "oauth");
        assert_eq!(value["supported_verbs"][1], "fetch:config");
    }

    #[test]
    fn call_output_json_has_verb_and_data() {
        let output = CallOutput::new(VerbData::SyncEnv(SyncEnvData {
            synced: 2,
            failed: vec![],
        }))
        .unwrap();
        let text = OutputFormat::new(Format::Json).to_string(&output).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["verb"], "sync:env");
        assert_eq!(value["data"]["synced"], 2);
        assert!(value.get("typed").is_none());
    }

    #[test]
    fn call_output_table_delegates() {
        let output = CallOutput::new(VerbData::SyncEnv(SyncEnvData {
            synced: 1,
            failed: vec!["BAD KEY".into()],
        }))
        .unwrap();
        let text = OutputFormat::default().to_string(&output).unwrap();
        assert!(text.starts_with("sync:env\n"));
        assert!(text.contains("Failed: BAD KEY"));
    }
}

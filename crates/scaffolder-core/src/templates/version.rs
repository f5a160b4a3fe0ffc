//! CLI / template version compatibility

use super::manifest::TemplateConfig;
use semver::Version;

/// Warn when the template asks for a newer CLI than the one running.
///
/// Unparseable versions on either side never produce a warning.
pub fn check_compatibility(
    cli_version: &str,
    template: &TemplateConfig,
    upgrade_command: &str,
) -> Option<String> {
    let required = template.min_cli_version.as_deref()?;
    let cli_ver = parse_version(cli_version)?;
    let required_ver = parse_version(required)?;

    (cli_ver < required_ver).then(|| {
        format!(
            "This template requires CLI version {} or newer (running {}). Consider updating: {}",
            required_ver, cli_ver, upgrade_command
        )
    })
}

/// Parse a version string, tolerating a leading `v`
pub fn parse_version(version_str: &str) -> Option<Version> {
    let cleaned = version_str.trim();
    let cleaned = cleaned.strip_prefix('v').unwrap_or(cleaned);
    Version::parse(cleaned).ok()
}

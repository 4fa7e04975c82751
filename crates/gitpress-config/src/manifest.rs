//! Build manifest parsing.
//!
//! Every deployable repository carries a `.gitpress.kdl` at its root telling
//! the builder how to produce the site:
//!
//! ```kdl
//! build "make dist"
//! output "dist"
//! cname "www.example.com"
//! ```

use crate::{ConfigError, ConfigResult};
use gitpress_core::SiteManifest;
use kdl::{KdlDocument, KdlNode};

/// File name of the manifest inside a working copy.
pub const MANIFEST_FILE: &str = ".gitpress.kdl";

/// Output directory used when the manifest does not name one.
pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// Parse a site manifest from KDL text.
pub fn parse_manifest(kdl: &str) -> ConfigResult<SiteManifest> {
    let doc: KdlDocument = kdl.parse()?;

    let mut build_command = None;
    let mut output_dir = None;
    let mut cname = None;

    for node in doc.nodes() {
        match node.name().value() {
            "build" => {
                build_command = get_first_string_arg(node);
            }
            "output" => {
                output_dir = get_first_string_arg(node);
            }
            "cname" => {
                cname = get_first_string_arg(node);
            }
            _ => {} // Ignore unknown nodes
        }
    }

    let build_command =
        build_command.ok_or_else(|| ConfigError::MissingField("build".to_string()))?;

    Ok(SiteManifest {
        build_command,
        output_dir: output_dir.unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
        cname,
    })
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_manifest() {
        let manifest = parse_manifest(
            r#"
            build "make dist"
            output "dist"
            cname "www.example.com"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.build_command, "make dist");
        assert_eq!(manifest.output_dir, "dist");
        assert_eq!(manifest.cname.as_deref(), Some("www.example.com"));
    }

    #[test]
    fn output_defaults_when_absent() {
        let manifest = parse_manifest(r#"build "npm run build""#).unwrap();

        assert_eq!(manifest.output_dir, DEFAULT_OUTPUT_DIR);
        assert_eq!(manifest.cname, None);
    }

    #[test]
    fn missing_build_command_is_an_error() {
        let err = parse_manifest(r#"output "dist""#).unwrap_err();

        assert!(matches!(err, ConfigError::MissingField(field) if field == "build"));
    }

    #[test]
    fn malformed_kdl_is_an_error() {
        let err = parse_manifest(r#"build "unterminated"#).unwrap_err();

        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_nodes_are_ignored() {
        let manifest = parse_manifest(
            r#"
            build "make"
            theme "minimal"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.build_command, "make");
    }
}

//! Generator configuration.
//!
//! Everything that names an output file, an export macro or a managed
//! namespace lives here, so one model can be generated for different engine
//! layouts. Configuration is usually loaded from a TOML file:
//!
//! ```toml
//! header = "Generated by interop-codegen. Do not edit."
//! doc_wrap_column = 100
//! indent = { spaces = 4 }
//!
//! [editor]
//! managed_namespace = "MyEditor"
//! ```

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::code::Indent;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Settings of one output target (engine or editor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Macro exporting the generated native wrapper classes.
    pub export_macro: String,
    /// Assembly the managed types are registered under.
    pub assembly: String,
    pub managed_namespace: String,
    /// First include of every generated native header.
    pub prerequisites_header: String,
    /// Output folder of generated native headers.
    pub header_dir: String,
    /// Output folder of generated native sources.
    pub source_dir: String,
    /// Output folder of generated managed sources.
    pub managed_dir: String,
}

impl TargetConfig {
    pub fn engine() -> Self {
        Self {
            export_macro: "BS_SCR_BE_EXPORT".to_string(),
            assembly: "ENGINE_ASSEMBLY".to_string(),
            managed_namespace: "BansheeEngine".to_string(),
            prerequisites_header: "BsScriptEnginePrerequisites.h".to_string(),
            header_dir: "Engine/Include".to_string(),
            source_dir: "Engine/Source".to_string(),
            managed_dir: "Engine/Managed".to_string(),
        }
    }

    pub fn editor() -> Self {
        Self {
            export_macro: "BS_SCR_BED_EXPORT".to_string(),
            assembly: "EDITOR_ASSEMBLY".to_string(),
            managed_namespace: "BansheeEditor".to_string(),
            prerequisites_header: "BsScriptEditorPrerequisites.h".to_string(),
            header_dir: "Editor/Include".to_string(),
            source_dir: "Editor/Source".to_string(),
            managed_dir: "Editor/Managed".to_string(),
        }
    }
}

/// A target table as written in a file; missing keys keep the target's defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetOverrides {
    export_macro: Option<String>,
    assembly: Option<String>,
    managed_namespace: Option<String>,
    prerequisites_header: Option<String>,
    header_dir: Option<String>,
    source_dir: Option<String>,
    managed_dir: Option<String>,
}

impl TargetOverrides {
    fn apply(self, mut target: TargetConfig) -> TargetConfig {
        let fields = [
            (self.export_macro, &mut target.export_macro),
            (self.assembly, &mut target.assembly),
            (self.managed_namespace, &mut target.managed_namespace),
            (self.prerequisites_header, &mut target.prerequisites_header),
            (self.header_dir, &mut target.header_dir),
            (self.source_dir, &mut target.source_dir),
            (self.managed_dir, &mut target.managed_dir),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
        target
    }
}

fn engine_target<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TargetConfig, D::Error> {
    Ok(TargetOverrides::deserialize(deserializer)?.apply(TargetConfig::engine()))
}

fn editor_target<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TargetConfig, D::Error> {
    Ok(TargetOverrides::deserialize(deserializer)?.apply(TargetConfig::editor()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Banner emitted as a comment at the top of every artifact.
    pub header: Option<String>,
    /// Namespace the native glue code is placed in.
    pub native_namespace: String,
    /// Prefix of generated native file names.
    pub file_prefix: String,
    pub indent: Indent,
    /// Column managed documentation comments are wrapped at.
    pub doc_wrap_column: usize,
    #[serde(deserialize_with = "engine_target")]
    pub engine: TargetConfig,
    #[serde(deserialize_with = "editor_target")]
    pub editor: TargetConfig,
    /// Global header listing every builtin component wrapper.
    pub component_lookup_file: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            header: None,
            native_namespace: "bs".to_string(),
            file_prefix: "BsScript".to_string(),
            indent: Indent::Tab,
            doc_wrap_column: 124,
            engine: TargetConfig::engine(),
            editor: TargetConfig::editor(),
            component_lookup_file: "BsBuiltinComponentLookup.generated.h".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path)?;
        Self::from_toml_str(&input)
    }

    /// Target settings of an engine or editor module.
    pub fn target(&self, editor: bool) -> &TargetConfig {
        if editor { &self.editor } else { &self.engine }
    }

    pub fn native_header_file(&self, module: &str) -> String {
        format!("{}{module}.generated.h", self.file_prefix)
    }

    pub fn native_source_file(&self, module: &str) -> String {
        format!("{}{module}.generated.cpp", self.file_prefix)
    }

    pub fn managed_file(&self, module: &str) -> String {
        format!("{module}.generated.cs")
    }

    /// Header included for the wrappers of types generated into `dest`.
    ///
    /// `dest` is either a module name or a header path used as-is.
    pub fn generated_header(&self, dest: &str) -> String {
        if dest.ends_with(".h") {
            dest.to_string()
        } else {
            self.native_header_file(dest)
        }
    }

    /// Banner lines commented with `prefix`, followed by a blank line.
    pub fn banner(&self, prefix: &str) -> Vec<String> {
        let Some(header) = &self.header else {
            return Vec::new();
        };
        let mut lines: Vec<String> = header
            .lines()
            .map(|line| format!("{prefix} {line}").trim_end().to_string())
            .collect();
        lines.push(String::new());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::default();
        assert_eq!(config.native_namespace, "bs");
        assert_eq!(config.indent, Indent::Tab);
        assert_eq!(config.doc_wrap_column, 124);
        assert_eq!(config.target(false).export_macro, "BS_SCR_BE_EXPORT");
        assert_eq!(config.target(true).assembly, "EDITOR_ASSEMBLY");
        assert_eq!(config.native_header_file("Texture"), "BsScriptTexture.generated.h");
        assert_eq!(config.native_source_file("Texture"), "BsScriptTexture.generated.cpp");
        assert_eq!(config.managed_file("Texture"), "Texture.generated.cs");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            header = "Generated file.\nDo not edit."
            indent = { spaces = 4 }

            [editor]
            managed_namespace = "MyEditor"
            "#,
        )
        .unwrap();

        assert_eq!(config.indent, Indent::Spaces(4));
        assert_eq!(config.editor.managed_namespace, "MyEditor");
        assert_eq!(config.editor.export_macro, "BS_SCR_BED_EXPORT");
        assert_eq!(config.engine, TargetConfig::engine());
        assert_eq!(config.doc_wrap_column, 124);
        assert_eq!(
            config.banner("//"),
            vec!["// Generated file.", "// Do not edit.", ""]
        );
    }

    #[test]
    fn test_generated_header_accepts_paths() {
        let config = GeneratorConfig::default();
        assert_eq!(config.generated_header("Physics"), "BsScriptPhysics.generated.h");
        assert_eq!(config.generated_header("Wrappers/BsScriptFont.h"), "Wrappers/BsScriptFont.h");
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let err = GeneratorConfig::from_toml_str("doc_wrap_column = \"wide\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

use crate::error::{ExtractorError, Result};
use autofold_protocol::RegionKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported programming language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Java,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "java" => Language::Java,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Java => "java",
            Language::Unknown => "unknown",
        }
    }

    /// Check if this language can be parsed
    pub fn supports_ast(self) -> bool {
        !matches!(self, Language::Unknown)
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Ok(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Java => Ok(tree_sitter_java::LANGUAGE.into()),
            Language::Unknown => Err(ExtractorError::unsupported_language(self.as_str())),
        }
    }

    /// Region kind for a foldable syntax node, given its parent's kind.
    pub(crate) fn body_kind(self, kind: &str, parent: Option<&str>) -> Option<RegionKind> {
        let parent = parent.unwrap_or("");
        match self {
            Language::Rust => match kind {
                "block" if matches!(parent, "function_item" | "closure_expression") => {
                    Some(RegionKind::FunctionBody)
                }
                "block" | "match_block" => Some(RegionKind::Block),
                "declaration_list" | "field_declaration_list" | "enum_variant_list" => {
                    Some(RegionKind::TypeBody)
                }
                _ => None,
            },
            Language::Python => match kind {
                "block" if parent == "function_definition" => Some(RegionKind::FunctionBody),
                "block" if parent == "class_definition" => Some(RegionKind::TypeBody),
                "block" => Some(RegionKind::Block),
                _ => None,
            },
            Language::JavaScript | Language::TypeScript => match kind {
                "statement_block"
                    if matches!(
                        parent,
                        "function_declaration"
                            | "function_expression"
                            | "function"
                            | "generator_function_declaration"
                            | "generator_function"
                            | "arrow_function"
                            | "method_definition"
                    ) =>
                {
                    Some(RegionKind::FunctionBody)
                }
                "statement_block" | "switch_body" => Some(RegionKind::Block),
                "class_body" | "interface_body" | "enum_body" => Some(RegionKind::TypeBody),
                "object_type" if parent == "interface_declaration" => Some(RegionKind::TypeBody),
                _ => None,
            },
            Language::Java => match kind {
                "block" if parent == "method_declaration" => Some(RegionKind::FunctionBody),
                "constructor_body" => Some(RegionKind::FunctionBody),
                "block" | "switch_block" => Some(RegionKind::Block),
                "class_body" | "interface_body" | "enum_body" | "annotation_type_body" => {
                    Some(RegionKind::TypeBody)
                }
                _ => None,
            },
            Language::Unknown => None,
        }
    }

    /// Leaf kinds whose text is an identifier.
    pub(crate) fn is_identifier(self, kind: &str) -> bool {
        match self {
            Language::Rust => matches!(
                kind,
                "identifier" | "type_identifier" | "field_identifier" | "shorthand_field_identifier"
            ),
            Language::Python => kind == "identifier",
            Language::JavaScript | Language::TypeScript => matches!(
                kind,
                "identifier"
                    | "type_identifier"
                    | "property_identifier"
                    | "private_property_identifier"
                    | "shorthand_property_identifier"
                    | "shorthand_property_identifier_pattern"
            ),
            Language::Java => matches!(kind, "identifier" | "type_identifier"),
            Language::Unknown => false,
        }
    }

    pub(crate) fn is_comment(self, kind: &str) -> bool {
        matches!(kind, "comment" | "line_comment" | "block_comment")
    }

    pub(crate) fn is_import(self, kind: &str) -> bool {
        match self {
            Language::Rust => matches!(kind, "use_declaration" | "extern_crate_declaration"),
            Language::Python => matches!(
                kind,
                "import_statement" | "import_from_statement" | "future_import_statement"
            ),
            Language::JavaScript | Language::TypeScript => kind == "import_statement",
            Language::Java => kind == "import_declaration",
            Language::Unknown => false,
        }
    }

    pub(crate) fn is_field(self, kind: &str) -> bool {
        match self {
            Language::Rust => kind == "field_declaration",
            Language::JavaScript | Language::TypeScript => {
                matches!(kind, "field_definition" | "public_field_definition")
            }
            Language::Java => kind == "field_declaration",
            Language::Python | Language::Unknown => false,
        }
    }
}

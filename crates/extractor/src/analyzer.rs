use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, Result};
use crate::language::Language;
use crate::tokenizer::Tokenizer;
use crate::types::ExtractedFile;
use autofold_protocol::{CharRange, LineIndex, Region, RegionKind};
use tree_sitter::{Node, Parser};

/// Half-open byte span proposed as a region.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
    kind: RegionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentStyle {
    DocLine,
    DocBlock,
    Line,
    Block,
}

#[derive(Debug, Clone, Copy)]
struct CommentSpan {
    start: usize,
    end: usize,
    style: CommentStyle,
    /// Nothing but whitespace precedes it on its line.
    own_line: bool,
}

/// Run of sibling statements of one kind (imports, fields).
#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    end: usize,
    len: usize,
    kind: RegionKind,
}

/// Everything gathered in one syntax-tree walk.
#[derive(Debug, Default)]
struct Collected {
    candidates: Vec<Candidate>,
    comments: Vec<CommentSpan>,
    occurrences: Vec<(usize, String)>,
}

/// Tree-sitter based region extractor for one language.
pub struct RegionExtractor {
    config: ExtractorConfig,
    tokenizer: Tokenizer,
    parser: Parser,
    language: Language,
}

impl RegionExtractor {
    /// Create an extractor for `language`
    pub fn new(language: Language, config: ExtractorConfig) -> Result<Self> {
        config.validate().map_err(ExtractorError::invalid_config)?;
        if !language.supports_ast() {
            return Err(ExtractorError::unsupported_language(language.as_str()));
        }

        let ts_language = language.tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ExtractorError::tree_sitter(format!("Failed to set language: {e}")))?;

        Ok(Self {
            tokenizer: Tokenizer::new(&config),
            config,
            parser,
            language,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Parse `source` and build its region tree.
    pub fn extract(&mut self, source: &str) -> Result<ExtractedFile> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| ExtractorError::parse("Failed to parse source code"))?;
        let root = tree.root_node();
        if root.has_error() {
            log::debug!(
                "{} source has syntax errors; regions are best effort",
                self.language.as_str()
            );
        }

        let mut collected = Collected::default();
        self.visit(source, root, &mut collected);
        self.comment_regions(source, &mut collected);

        let line_index = LineIndex::new(source);
        let mut regions = nest(&line_index, collected.candidates);
        assign_terms(&mut regions, collected.occurrences);

        Ok(ExtractedFile {
            language: self.language,
            regions,
            line_index,
        })
    }

    fn visit(&self, source: &str, node: Node, out: &mut Collected) {
        let kind = node.kind();

        if self.language.is_comment(kind) {
            self.collect_comment(source, node, out);
            return;
        }

        if node.child_count() == 0 {
            if node.is_named() && self.language.is_identifier(kind) {
                if let Some(text) = source.get(node.start_byte()..node.end_byte()) {
                    for term in self.tokenizer.identifier(text) {
                        out.occurrences.push((node.start_byte(), term));
                    }
                }
            }
            return;
        }

        let parent_kind = node.parent().map(|p| p.kind());
        if let Some(region_kind) = self.language.body_kind(kind, parent_kind) {
            out.candidates.push(Candidate {
                start: node.start_byte(),
                end: node.end_byte(),
                kind: region_kind,
            });
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        let docstring_owner = self.language == Language::Python && matches!(kind, "module" | "block");
        let mut seen_statement = false;
        let mut run: Option<Run> = None;

        for child in children {
            let child_kind = child.kind();

            if child.is_named() && !self.language.is_comment(child_kind) {
                let first_statement = !seen_statement;
                seen_statement = true;
                if docstring_owner && first_statement && self.collect_docstring(source, child, out) {
                    flush_run(&mut run, out);
                    continue;
                }

                match self.run_kind(child_kind) {
                    Some(run_kind) => match run.as_mut() {
                        Some(current) if current.kind == run_kind => {
                            current.end = child.end_byte();
                            current.len += 1;
                        }
                        _ => {
                            flush_run(&mut run, out);
                            run = Some(Run {
                                start: child.start_byte(),
                                end: child.end_byte(),
                                len: 1,
                                kind: run_kind,
                            });
                        }
                    },
                    None => flush_run(&mut run, out),
                }
            }

            self.visit(source, child, out);
        }
        flush_run(&mut run, out);
    }

    fn run_kind(&self, kind: &str) -> Option<RegionKind> {
        if self.config.fold_imports && self.language.is_import(kind) {
            Some(RegionKind::Imports)
        } else if self.config.conflate_fields && self.language.is_field(kind) {
            Some(RegionKind::Fields)
        } else {
            None
        }
    }

    /// Python docstring: a bare string as the first statement of a module
    /// or block.
    fn collect_docstring(&self, source: &str, statement: Node, out: &mut Collected) -> bool {
        if statement.kind() != "expression_statement" || statement.named_child_count() != 1 {
            return false;
        }
        let Some(string) = statement.named_child(0) else {
            return false;
        };
        if string.kind() != "string" {
            return false;
        }

        let (start, end) = (statement.start_byte(), statement.end_byte());
        out.candidates.push(Candidate {
            start,
            end,
            kind: RegionKind::Documentation,
        });
        if self.config.tokenize_comments {
            if let Some(text) = source.get(start..end) {
                for term in self.tokenizer.comment(text) {
                    out.occurrences.push((start, term));
                }
            }
        }
        true
    }

    fn collect_comment(&self, source: &str, node: Node, out: &mut Collected) {
        let start = node.start_byte();
        let Some(text) = source.get(start..node.end_byte()) else {
            return;
        };
        let text = text.trim_end();
        if text.is_empty() {
            return;
        }

        let style = match self.language {
            Language::Python => CommentStyle::Line,
            _ if text.starts_with("///") && !text.starts_with("////") => CommentStyle::DocLine,
            _ if text.starts_with("//!") => CommentStyle::DocLine,
            _ if text.starts_with("//") => CommentStyle::Line,
            _ if (text.starts_with("/**") && text != "/**/") || text.starts_with("/*!") => {
                CommentStyle::DocBlock
            }
            _ => CommentStyle::Block,
        };
        let line_start = source[..start].rfind('\n').map_or(0, |i| i + 1);
        let own_line = source[line_start..start].trim().is_empty();

        out.comments.push(CommentSpan {
            start,
            end: start + text.len(),
            style,
            own_line,
        });
        if self.config.tokenize_comments {
            for term in self.tokenizer.comment(text) {
                out.occurrences.push((start, term));
            }
        }
    }

    /// Block comments fold on their own; consecutive own-line doc comments
    /// fold together, plain line comments only when configured.
    fn comment_regions(&self, source: &str, out: &mut Collected) {
        let mut pending: Option<(CommentSpan, usize)> = None;

        for comment in std::mem::take(&mut out.comments) {
            match comment.style {
                CommentStyle::DocBlock | CommentStyle::Block => {
                    flush_comments(&mut pending, self.config.fold_line_comments, out);
                    out.candidates.push(Candidate {
                        start: comment.start,
                        end: comment.end,
                        kind: if comment.style == CommentStyle::DocBlock {
                            RegionKind::Documentation
                        } else {
                            RegionKind::Comment
                        },
                    });
                }
                CommentStyle::DocLine | CommentStyle::Line if comment.own_line => {
                    let joins = pending.as_ref().is_some_and(|(run, _)| {
                        run.style == comment.style && adjacent_lines(source, run.end, comment.start)
                    });
                    if joins {
                        if let Some((run, count)) = pending.as_mut() {
                            run.end = comment.end;
                            *count += 1;
                        }
                    } else {
                        flush_comments(&mut pending, self.config.fold_line_comments, out);
                        pending = Some((comment, 1));
                    }
                }
                CommentStyle::DocLine | CommentStyle::Line => {
                    flush_comments(&mut pending, self.config.fold_line_comments, out);
                }
            }
        }
        flush_comments(&mut pending, self.config.fold_line_comments, out);
    }
}

/// Parse `source` as `language` and build its region tree.
pub fn extract(source: &str, language: Language, config: &ExtractorConfig) -> Result<ExtractedFile> {
    RegionExtractor::new(language, config.clone())?.extract(source)
}

fn flush_run(run: &mut Option<Run>, out: &mut Collected) {
    if let Some(run) = run.take() {
        if run.len >= 2 {
            out.candidates.push(Candidate {
                start: run.start,
                end: run.end,
                kind: run.kind,
            });
        }
    }
}

fn flush_comments(pending: &mut Option<(CommentSpan, usize)>, fold_line_comments: bool, out: &mut Collected) {
    let Some((run, count)) = pending.take() else {
        return;
    };
    let kind = match run.style {
        CommentStyle::DocLine => RegionKind::Documentation,
        CommentStyle::Line if fold_line_comments && count >= 2 => RegionKind::Comment,
        _ => return,
    };
    out.candidates.push(Candidate {
        start: run.start,
        end: run.end,
        kind,
    });
}

/// True when only whitespace spanning exactly one line break separates
/// `end` from `start`.
fn adjacent_lines(source: &str, end: usize, start: usize) -> bool {
    source
        .get(end..start)
        .is_some_and(|gap| gap.trim().is_empty() && gap.matches('\n').count() == 1)
}

/// Orders candidates in pre-order and links each to its innermost
/// enclosing region. Candidates that straddle another region's boundary
/// are dropped.
fn nest(line_index: &LineIndex, mut candidates: Vec<Candidate>) -> Vec<Region> {
    let text_len = line_index.text_len();
    let root_range = line_index.full_range();
    let mut regions = vec![Region::new(
        root_range,
        line_index.full_span(),
        None,
        RegionKind::Root,
    )];

    for candidate in &mut candidates {
        candidate.end = candidate.end.min(text_len);
    }
    candidates.retain(|c| c.start < c.end);
    candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    candidates.dedup_by(|later, earlier| later.start == earlier.start && later.end == earlier.end);

    let mut stack = vec![0usize];
    for candidate in candidates {
        let range = CharRange::from_half_open(candidate.start, candidate.end);
        if range == root_range {
            continue;
        }

        let parent = loop {
            let Some(&top) = stack.last() else {
                break None;
            };
            let enclosing = regions[top].range;
            if enclosing.contains(&range) {
                break Some(top);
            }
            if enclosing.precedes(&range) {
                stack.pop();
                continue;
            }
            break None;
        };

        let Some(parent) = parent else {
            log::debug!("dropping {:?} region {range:?}: crosses an enclosing region", candidate.kind);
            continue;
        };
        let id = regions.len();
        regions.push(Region::new(
            range,
            line_index.span_of(range),
            Some(parent),
            candidate.kind,
        ));
        stack.push(id);
    }

    regions
}

/// Gives each term occurrence to the innermost region holding its offset.
fn assign_terms(regions: &mut [Region], mut occurrences: Vec<(usize, String)>) {
    occurrences.sort_by_key(|(offset, _)| *offset);

    let mut stack = vec![0usize];
    let mut next = 1;
    for (offset, term) in occurrences {
        while next < regions.len() && regions[next].range.start <= offset {
            while stack.len() > 1 && !regions[stack[stack.len() - 1]].range.contains(&regions[next].range) {
                stack.pop();
            }
            stack.push(next);
            next += 1;
        }
        while stack.len() > 1 && !regions[stack[stack.len() - 1]].range.contains_offset(offset) {
            stack.pop();
        }
        let owner = stack[stack.len() - 1];
        regions[owner].terms.add(term);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rust(source: &str) -> ExtractedFile {
        extract(source, Language::Rust, &ExtractorConfig::default()).unwrap()
    }

    fn kinds(file: &ExtractedFile) -> Vec<RegionKind> {
        file.regions().iter().map(|r| r.kind).collect()
    }

    #[test]
    fn test_rust_function_body() {
        let file = rust("fn main() {\n    let x = 1;\n    let y = x + 1;\n}\n");
        assert_eq!(kinds(&file), vec![RegionKind::Root, RegionKind::FunctionBody]);
        let body = &file.regions()[1];
        assert_eq!(body.parent, Some(0));
        assert_eq!((body.lines.start, body.lines.end), (1, 4));
        assert_eq!(file.regions()[0].terms.count("main"), 1);
        assert_eq!(body.terms.count("x"), 2);
    }

    #[test]
    fn test_rust_doc_lines_conflate() {
        let source = "/// Adds two numbers.\n/// Returns the sum.\nfn add(a: u32, b: u32) -> u32 {\n    a + b\n}\n";
        let file = rust(source);
        assert_eq!(
            kinds(&file),
            vec![RegionKind::Root, RegionKind::Documentation, RegionKind::FunctionBody]
        );
        let doc = &file.regions()[1];
        assert_eq!((doc.lines.start, doc.lines.end), (1, 2));
        assert_eq!(doc.terms.count("sum"), 1);
        assert_eq!(doc.terms.count("adds"), 1);
    }

    #[test]
    fn test_plain_line_comments_stay_in_parent() {
        let source = "fn f() {\n    // first\n    // second\n    g();\n}\n";
        let file = rust(source);
        assert_eq!(kinds(&file), vec![RegionKind::Root, RegionKind::FunctionBody]);
        assert_eq!(file.regions()[1].terms.count("second"), 1);

        let config = ExtractorConfig {
            fold_line_comments: true,
            ..Default::default()
        };
        let file = extract(source, Language::Rust, &config).unwrap();
        assert_eq!(
            kinds(&file),
            vec![RegionKind::Root, RegionKind::FunctionBody, RegionKind::Comment]
        );
        assert_eq!(file.regions()[2].parent, Some(1));
    }

    #[test]
    fn test_rust_imports_and_fields() {
        let source = "use std::fmt;\nuse std::io;\n\npub struct Point {\n    x: i32,\n    y: i32,\n}\n";
        let file = rust(source);
        assert_eq!(
            kinds(&file),
            vec![
                RegionKind::Root,
                RegionKind::Imports,
                RegionKind::TypeBody,
                RegionKind::Fields
            ]
        );
        assert_eq!(file.regions()[3].parent, Some(2));
        assert_eq!(file.regions()[1].terms.count("fmt"), 1);
        assert_eq!(file.regions()[0].terms.count("point"), 1);
    }

    #[test]
    fn test_python_docstring_and_method() {
        let source = "class Reader:\n    \"\"\"Reads lines.\"\"\"\n\n    def read_line(self):\n        return self.buffer\n";
        let file = extract(source, Language::Python, &ExtractorConfig::default()).unwrap();
        assert_eq!(
            kinds(&file),
            vec![
                RegionKind::Root,
                RegionKind::TypeBody,
                RegionKind::Documentation,
                RegionKind::FunctionBody
            ]
        );
        assert_eq!(file.regions()[2].terms.count("reads"), 1);
        assert_eq!(file.regions()[3].terms.count("buffer"), 1);
        assert_eq!(file.regions()[1].terms.count("read"), 1);
    }

    #[test]
    fn test_java_javadoc_and_constructor() {
        let source = "/**\n * A counter.\n */\npublic class Counter {\n    private int count;\n\n    public Counter() {\n        count = 0;\n    }\n}\n";
        let file = extract(source, Language::Java, &ExtractorConfig::default()).unwrap();
        assert_eq!(
            kinds(&file),
            vec![
                RegionKind::Root,
                RegionKind::Documentation,
                RegionKind::TypeBody,
                RegionKind::FunctionBody
            ]
        );
        assert_eq!(file.regions()[3].parent, Some(2));
        assert_eq!(file.regions()[1].terms.count("counter"), 1);
    }

    #[test]
    fn test_regions_are_pre_ordered_and_nested() {
        let source = "impl Stack {\n    fn push(&mut self, v: u8) {\n        if v > 0 {\n            self.items.push(v);\n        }\n    }\n\n    fn pop(&mut self) -> Option<u8> {\n        self.items.pop()\n    }\n}\n";
        let file = rust(source);
        let regions = file.regions();
        for (id, region) in regions.iter().enumerate().skip(1) {
            let parent = region.parent.unwrap();
            assert!(parent < id);
            assert!(regions[parent].range.contains(&region.range));
        }
        assert_eq!(
            kinds(&file),
            vec![
                RegionKind::Root,
                RegionKind::TypeBody,
                RegionKind::FunctionBody,
                RegionKind::Block,
                RegionKind::FunctionBody
            ]
        );
    }

    #[test]
    fn test_empty_source_is_single_root() {
        let file = rust("");
        assert_eq!(kinds(&file), vec![RegionKind::Root]);
        assert!(file.file_terms().is_empty());
        assert_eq!(file.line_count(), 1);
    }

    #[test]
    fn test_code_only_config_skips_comment_words() {
        let source = "// helper comment\nfn helper() {}\n";
        let file = extract(source, Language::Rust, &ExtractorConfig::code_only()).unwrap();
        assert_eq!(file.file_terms().count("comment"), 0);
        assert_eq!(file.file_terms().count("helper"), 1);
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(matches!(
            RegionExtractor::new(Language::Unknown, ExtractorConfig::default()),
            Err(ExtractorError::UnsupportedLanguage(_))
        ));
    }
}

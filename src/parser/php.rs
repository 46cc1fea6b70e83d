// PHP parser using tree-sitter

use crate::error::{Error, Result};
use crate::parser::ast::*;
use crate::parser::ClassParser;
use tree_sitter::{Node, Parser};

/// Parser for PHP source files
pub struct PhpParser {
    parser: Parser,
}

impl PhpParser {
    /// Create a new PHP parser
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language = tree_sitter_php::language_php();
        parser
            .set_language(&language)
            .map_err(|e| Error::Parser(format!("Failed to set PHP language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse PHP source code and collect its classes
    pub fn parse_source(&mut self, source: &str) -> Result<Vec<ClassRecord>> {
        let mut classes = Vec::new();
        self.for_each_class(source, &mut |class| classes.push(class))?;
        Ok(classes)
    }
}

impl ClassParser for PhpParser {
    fn extensions(&self) -> &[&'static str] {
        &["php", "inc", "phtml"]
    }

    fn for_each_class(&mut self, source: &str, visit: &mut dyn FnMut(ClassRecord)) -> Result<()> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parser("Failed to parse source"))?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(Error::parser(describe_syntax_error(&root)));
        }

        let mut walker = ClassWalker {
            source,
            namespace: None,
            visit,
        };
        walker.walk(root);

        Ok(())
    }
}

/// Pre-order walk reporting every named class declaration, nested or not
struct ClassWalker<'s, 'v> {
    source: &'s str,
    namespace: Option<String>,
    visit: &'v mut dyn FnMut(ClassRecord),
}

impl ClassWalker<'_, '_> {
    fn walk(&mut self, node: Node) {
        match node.kind() {
            "namespace_definition" => {
                let name = node
                    .child_by_field_name("name")
                    .map(|n| get_text(&n, self.source).to_string());

                match node.child_by_field_name("body") {
                    // namespace Foo { ... }
                    Some(body) => {
                        let outer = std::mem::replace(&mut self.namespace, name);
                        self.walk(body);
                        self.namespace = outer;
                    }
                    // namespace Foo; applies to the rest of the file
                    None => self.namespace = name,
                }
                return;
            }
            "class_declaration" => {
                if let Some(mut class) = parse_class(&node, self.source) {
                    class.namespace = self.namespace.clone();
                    (self.visit)(class);
                }
            }
            _ => {}
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        for child in children {
            self.walk(child);
        }
    }
}

/// Parse a class declaration and its direct methods
fn parse_class(node: &Node, source: &str) -> Option<ClassRecord> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;

    let mut class = ClassRecord::new(name, node.start_position().row + 1);
    class.line_end = node.end_position().row + 1;
    class.doc_comment = doc_comment(node, source);

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for child in body.children(&mut cursor) {
            if child.kind() == "method_declaration" {
                if let Some(method) = parse_method(&child, source) {
                    class.methods.push(method);
                }
            }
        }
    }

    Some(class)
}

/// Parse a method declaration
fn parse_method(node: &Node, source: &str) -> Option<MethodRecord> {
    let name = node
        .child_by_field_name("name")
        .map(|n| get_text(&n, source).to_string())?;

    let mut method = MethodRecord::new(name, node.start_position().row + 1);
    method.line_end = node.end_position().row + 1;
    method.doc_comment = doc_comment(node, source);
    method.body = line_span(node, source).to_string();

    Some(method)
}

/// Nearest `/** ... */` comment directly above a declaration
fn doc_comment(node: &Node, source: &str) -> String {
    let mut prev = node.prev_sibling();
    while let Some(sibling) = prev {
        if sibling.kind() != "comment" {
            break;
        }
        let text = get_text(&sibling, source);
        if text.starts_with("/**") {
            return text.to_string();
        }
        prev = sibling.prev_sibling();
    }
    String::new()
}

/// Source text of a node widened to whole lines, trailing newline included
fn line_span<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = source
        .get(..node.start_byte())
        .and_then(|head| head.rfind('\n'))
        .map_or(0, |i| i + 1);
    let end_byte = node.end_byte();
    let end = source
        .get(end_byte..)
        .and_then(|tail| tail.find('\n'))
        .map_or(source.len(), |i| end_byte + i + 1);

    source.get(start..end).unwrap_or("")
}

/// Location of the first ERROR or MISSING node
fn describe_syntax_error(root: &Node) -> String {
    match first_error(*root) {
        Some(node) => {
            let pos = node.start_position();
            if node.is_missing() {
                format!(
                    "missing `{}` at line {}, column {}",
                    node.kind(),
                    pos.row + 1,
                    pos.column + 1
                )
            } else {
                format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1)
            }
        }
        None => "syntax error".to_string(),
    }
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }

    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error)
}

/// Get text content of a node
fn get_text<'a>(node: &Node, source: &'a str) -> &'a str {
    source.get(node.byte_range()).unwrap_or("")
}

//! Minimal CSS tree and its text serialization.
//!
//! Only what the candidate compiler produces is modelled: declarations and
//! blocks with a header. A block header is either a nested selector
//! (`&:hover`) or an at-rule prelude (`@media (prefers-color-scheme: dark)`);
//! both serialize the same way.

use std::fmt::Write as _;

/// A node in a compiled rule body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Decl {
        property: String,
        value: String,
        important: bool,
    },
    Block {
        header: String,
        nodes: Vec<Node>,
    },
}

impl Node {
    pub fn decl(property: impl Into<String>, value: impl Into<String>) -> Self {
        Node::Decl {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }

    pub fn block(header: impl Into<String>, nodes: Vec<Node>) -> Self {
        Node::Block {
            header: header.into(),
            nodes,
        }
    }

    /// Mark this declaration, or every declaration below this block, `!important`
    pub fn make_important(&mut self) {
        match self {
            Node::Decl { important, .. } => *important = true,
            Node::Block { nodes, .. } => nodes.iter_mut().for_each(Node::make_important),
        }
    }
}

/// A top-level rule produced for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    /// Escaped class selector, including the leading `.`
    pub selector: String,
    /// Variant wraps nested around the utility declarations
    pub nodes: Vec<Node>,
}

impl CompiledRule {
    /// Serialize this rule, appending to `out`
    pub fn write_css(&self, out: &mut String, minify: bool) {
        if minify {
            write_minified(out, &self.selector, &self.nodes);
        } else {
            write_pretty(out, &self.selector, &self.nodes, 0);
        }
    }

    pub fn to_css(&self, minify: bool) -> String {
        let mut out = String::new();
        self.write_css(&mut out, minify);
        out
    }
}

fn write_pretty(out: &mut String, header: &str, nodes: &[Node], depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = writeln!(out, "{}{} {{", indent, header);
    for node in nodes {
        match node {
            Node::Decl { property, value, important } => {
                let _ = writeln!(
                    out,
                    "{}  {}: {}{};",
                    indent,
                    property,
                    value,
                    if *important { " !important" } else { "" }
                );
            }
            Node::Block { header, nodes } => write_pretty(out, header, nodes, depth + 1),
        }
    }
    let _ = writeln!(out, "{}}}", indent);
}

fn write_minified(out: &mut String, header: &str, nodes: &[Node]) {
    out.push_str(header);
    out.push('{');
    let mut first = true;
    for node in nodes {
        match node {
            Node::Decl { property, value, important } => {
                if !first {
                    out.push(';');
                }
                let _ = write!(
                    out,
                    "{}:{}{}",
                    property,
                    value,
                    if *important { "!important" } else { "" }
                );
                first = false;
            }
            Node::Block { header, nodes } => {
                if !first {
                    out.push(';');
                }
                write_minified(out, header, nodes);
                first = true;
            }
        }
    }
    out.push('}');
}

/// Escape a raw candidate for use as a class selector
pub fn escape_class(class: &str) -> String {
    let mut escaped = String::with_capacity(class.len() * 2);

    for (idx, ch) in class.chars().enumerate() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            ':' | '/' | '[' | ']' | '(' | ')' | '&' | '>' | '<' | '+' | '~' | ',' | '%' | '='
            | '!' | '*' | '@' | '#' | '\'' | '"' | '.' | '$' | '^' | '|' | '?' | '{' | '}'
            | ';' => {
                escaped.push('\\');
                escaped.push(ch);
            }
            ' ' => escaped.push_str("\\ "),
            // A leading digit cannot start an identifier
            '0'..='9' if idx == 0 => {
                let _ = write!(escaped, "\\{:x} ", ch as u32);
            }
            _ => escaped.push(ch),
        }
    }

    escaped
}

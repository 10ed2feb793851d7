use tree_sitter::{Node, Tree};

use crate::graph::node::{NodeKind, Position};

/// The syntactic shape of a declaration, decided once by the parser adapter.
///
/// Both traversal (does this declaration open a naming scope?) and
/// classification (which [`NodeKind`] does it become?) match on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationShape {
    /// `function foo() {}` or `function* foo() {}`.
    Function,
    /// A variable initialised with a function or arrow expression.
    FunctionValued,
    Class,
    Interface,
    TypeAlias,
    Enum,
    /// A module-level variable with a non-function initialiser.
    Variable,
}

impl DeclarationShape {
    /// Map the shape to the node kind stored in the graph.
    ///
    /// Function-shaped declarations whose name starts with an uppercase letter
    /// become components.
    pub fn classify(&self, name: &str) -> NodeKind {
        match self {
            DeclarationShape::Function | DeclarationShape::FunctionValued => {
                if name.chars().next().is_some_and(char::is_uppercase) {
                    NodeKind::Component
                } else {
                    NodeKind::Function
                }
            }
            DeclarationShape::Interface => NodeKind::Interface,
            DeclarationShape::TypeAlias => NodeKind::Type,
            DeclarationShape::Class | DeclarationShape::Enum | DeclarationShape::Variable => {
                NodeKind::Variable
            }
        }
    }

    /// Whether declarations nested inside this one are qualified by its name.
    pub fn opens_scope(&self) -> bool {
        match self {
            DeclarationShape::Function
            | DeclarationShape::FunctionValued
            | DeclarationShape::Class => true,
            DeclarationShape::Interface
            | DeclarationShape::TypeAlias
            | DeclarationShape::Enum
            | DeclarationShape::Variable => false,
        }
    }
}

/// A named declaration extracted from a syntax tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub shape: DeclarationShape,
    /// Names of the enclosing scope-opening declarations, outermost first.
    /// Empty for top-level declarations.
    pub scope: Vec<String>,
    /// True when the declaration carries an `export` modifier.
    pub exported: bool,
    /// Start of the full declaration (including `export`), 1-based line.
    pub start: Position,
    /// End of the full declaration, 1-based line.
    pub end: Position,
}

fn node_text<'a>(node: Node<'a>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn is_function_value(node: Node) -> bool {
    matches!(
        node.kind(),
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

/// The enclosing `export_statement`, when `node` is directly exported.
fn export_parent(node: Node) -> Option<Node> {
    node.parent().filter(|p| p.kind() == "export_statement")
}

/// True for variable statements directly in the program body, exported or not.
fn is_module_level(node: Node) -> bool {
    match node.parent() {
        Some(p) if p.kind() == "program" => true,
        Some(p) if p.kind() == "export_statement" => {
            p.parent().is_some_and(|pp| pp.kind() == "program")
        }
        _ => false,
    }
}

fn span(node: Node) -> (Position, Position) {
    let start = node.start_position();
    let end = node.end_position();
    (
        Position::new(start.row + 1, start.column),
        Position::new(end.row + 1, end.column),
    )
}

/// Shape of a named declaration node, or `None` for anything else.
fn named_shape(kind: &str) -> Option<DeclarationShape> {
    match kind {
        "function_declaration" | "generator_function_declaration" => {
            Some(DeclarationShape::Function)
        }
        "class_declaration" | "abstract_class_declaration" => Some(DeclarationShape::Class),
        "interface_declaration" => Some(DeclarationShape::Interface),
        "type_alias_declaration" => Some(DeclarationShape::TypeAlias),
        "enum_declaration" => Some(DeclarationShape::Enum),
        _ => None,
    }
}

/// The first declarator of a `lexical_declaration`/`variable_declaration`,
/// when it binds a simple identifier.
///
/// Returns `(name, value)`. Destructuring patterns yield `None`.
fn first_declarator<'a>(decl: Node<'a>, source: &'a [u8]) -> Option<(&'a str, Option<Node<'a>>)> {
    let mut cursor = decl.walk();
    let declarator = decl
        .named_children(&mut cursor)
        .find(|c| c.kind() == "variable_declarator")?;
    let name = declarator.child_by_field_name("name")?;
    if name.kind() != "identifier" {
        return None;
    }
    Some((node_text(name, source), declarator.child_by_field_name("value")))
}

struct Collector<'s> {
    source: &'s [u8],
    scope: Vec<String>,
    out: Vec<Declaration>,
}

impl<'s> Collector<'s> {
    fn push(&mut self, node: Node, name: &str, shape: DeclarationShape) {
        let exported = export_parent(node);
        let (start, end) = span(exported.unwrap_or(node));
        self.out.push(Declaration {
            name: name.to_owned(),
            shape,
            scope: self.scope.clone(),
            exported: exported.is_some(),
            start,
            end,
        });
    }

    fn visit_children(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child);
        }
    }

    fn visit_scoped(&mut self, node: Node, name: &str, shape: DeclarationShape) {
        if shape.opens_scope() {
            self.scope.push(name.to_owned());
            self.visit_children(node);
            self.scope.pop();
        } else {
            self.visit_children(node);
        }
    }

    fn visit(&mut self, node: Node) {
        let kind = node.kind();

        if let Some(shape) = named_shape(kind) {
            match node.child_by_field_name("name") {
                Some(name_node) => {
                    let name = node_text(name_node, self.source).to_owned();
                    self.push(node, &name, shape);
                    self.visit_scoped(node, &name, shape);
                }
                // Anonymous `export default function () {}`.
                None => self.visit_children(node),
            }
            return;
        }

        if matches!(kind, "lexical_declaration" | "variable_declaration") {
            let Some((name, value)) = first_declarator(node, self.source) else {
                self.visit_children(node);
                return;
            };
            let name = name.to_owned();
            let shape = match value {
                Some(v) if is_function_value(v) => Some(DeclarationShape::FunctionValued),
                Some(_) => Some(DeclarationShape::Variable),
                // `let x;` has no initialiser and produces no node.
                None => None,
            };
            match shape {
                Some(shape) if is_module_level(node) => {
                    self.push(node, &name, shape);
                    self.visit_scoped(node, &name, shape);
                }
                Some(shape) => self.visit_scoped(node, &name, shape),
                None => self.visit_children(node),
            }
            return;
        }

        self.visit_children(node);
    }
}

/// Extract every matching declaration from `tree`, in source order.
///
/// The whole tree is traversed, not only the program body: functions, classes,
/// interfaces, type aliases and enums are collected at any depth; variable
/// statements only at module level.
pub fn extract_declarations(tree: &Tree, source: &[u8]) -> Vec<Declaration> {
    let mut collector = Collector {
        source,
        scope: Vec::new(),
        out: Vec::new(),
    };
    collector.visit(tree.root_node());
    collector.out
}

//! Parse-tree walker and generic emission.
//!
//! Walks the expression tree produced by tree-sitter, assigns each visited
//! node a type from the symbol table, and emits target text by delegating
//! to the per-target hooks. Owns callee resolution and argument checking;
//! the per-class constructor spellings live in the target emitters.
//!
//! Node types are kept in a side map keyed by `Node::id()` rather than
//! written onto the tree, so the external AST stays immutable.

use std::borrow::Cow;

use rustc_hash::FxHashMap;
use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{
    argument_count_error, generic, generic_at, reference_error, type_error, Result,
};
use crate::eval;
use crate::lang::Target;
use crate::symbols::{
    Callable, SymbolTable, Type, TypeId, ARRAY, BOOL, NULL, NUMERIC_MEMBERS, OBJECT, REGEX,
    STRING, UNDEFINED,
};

/// Result of visiting one node: its emitted text and inferred type.
#[derive(Debug)]
pub struct Rendered {
    pub text: String,
    pub ty: TypeId,
}

/// A resolved call or `new` expression handed to the target emitters.
pub struct CallSite<'t> {
    /// The whole call node; `node_text` of it is the evaluator fragment.
    pub node: Node<'t>,
    /// Emitted callee text.
    pub callee_text: String,
    /// Emitted receiver text, for attribute calls.
    pub callee_object: Option<String>,
    /// Dispatch key: owning type id plus the attribute name, if any.
    pub dispatch: (TypeId, Option<&'static str>),
    /// Argument nodes, in order.
    pub args: Vec<Node<'t>>,
    /// Whether the call was spelled with `new`.
    pub is_new: bool,
}

/// Join rendered arguments for a plain argument list.
pub fn join_args(args: &[Rendered]) -> String {
    args.iter()
        .map(|a| a.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Translate a single shell expression to the given target.
///
/// Allocates a fresh walker per call; translations share only the
/// immutable symbol table and target registry.
pub fn translate(source: &str, target: &'static dyn Target) -> Result<String> {
    Walker::new(source, target).translate()
}

/// One-shot tree walker. Holds the source text, the chosen target, and the
/// node-type side map filled in during the walk.
pub struct Walker<'s> {
    source: Cow<'s, str>,
    target: &'static dyn Target,
    table: &'static SymbolTable,
    types: FxHashMap<usize, TypeId>,
}

enum MemberRef {
    /// Attribute resolved through the symbol table.
    Known {
        text: String,
        object_text: String,
        ty: &'static Type,
        owner: TypeId,
        attr: &'static str,
    },
    /// Attribute on a non-recognized value; emitted verbatim.
    Raw { text: String },
}

impl<'s> Walker<'s> {
    pub fn new(source: &'s str, target: &'static dyn Target) -> Self {
        Walker {
            source: Cow::Borrowed(source),
            target,
            table: SymbolTable::global(),
            types: FxHashMap::default(),
        }
    }

    /// Translate the walker's source expression.
    pub fn translate(&mut self) -> Result<String> {
        let mut tree = self.parse()?;
        let mut wrapped = false;

        // A leading `{` parses as a block statement; re-parse object
        // documents (and anything else statement-ambiguous) in parentheses.
        if !single_expression_shape(&tree) {
            let rewrapped = format!("({})", self.source);
            self.source = Cow::Owned(rewrapped);
            tree = self.parse()?;
            wrapped = true;
        }

        let root = tree.root_node();
        if root.has_error() {
            return Err(generic("failed to parse input expression"));
        }

        let mut cursor = root.walk();
        let stmts: Vec<Node<'_>> = root
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .collect();
        let stmt = match stmts.as_slice() {
            [] => return Err(generic("empty input")),
            [stmt] if stmt.kind() == "expression_statement" => *stmt,
            [stmt] => {
                return Err(generic(format!(
                    "expected a single expression, found {}",
                    stmt.kind()
                )))
            }
            _ => return Err(generic("expected a single expression")),
        };
        let mut expr = stmt
            .named_child(0)
            .ok_or_else(|| generic("empty input"))?;
        if wrapped && expr.kind() == "parenthesized_expression" {
            expr = expr
                .named_child(0)
                .ok_or_else(|| generic("empty input"))?;
        }

        let rendered = self.visit(expr)?;
        debug!(lang = self.target.name(), "translated expression");
        Ok(rendered.text)
    }

    fn parse(&self) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .map_err(|e| generic(format!("failed to load grammar: {e}")))?;
        parser
            .parse(self.source.as_ref(), None)
            .ok_or_else(|| generic("failed to parse input expression"))
    }

    /// Source text spanned by a node.
    pub fn node_text(&self, node: Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }

    /// Visit a node, record its inferred type, and return its emission.
    pub fn visit(&mut self, node: Node<'_>) -> Result<Rendered> {
        let rendered = match node.kind() {
            "string" => Rendered {
                text: self
                    .target
                    .quote(&crate::lang::common::js_string_value(self.node_text(node))),
                ty: STRING,
            },
            "number" => self.visit_number(node),
            "true" => Rendered {
                text: self.target.boolean(true).to_string(),
                ty: BOOL,
            },
            "false" => Rendered {
                text: self.target.boolean(false).to_string(),
                ty: BOOL,
            },
            "null" => Rendered {
                text: self.target.null().to_string(),
                ty: NULL,
            },
            "undefined" => Rendered {
                text: self.target.undefined().to_string(),
                ty: UNDEFINED,
            },
            "regex" => self.visit_regex(node)?,
            "object" => self.visit_object(node)?,
            "array" => self.visit_array(node)?,
            "identifier" => self.visit_identifier(node)?,
            "member_expression" => match self.resolve_member(node)? {
                MemberRef::Known { text, ty, .. } => Rendered { text, ty: ty.id },
                MemberRef::Raw { text } => Rendered {
                    text,
                    ty: UNDEFINED,
                },
            },
            "call_expression" => self.visit_call(node, false)?,
            "new_expression" => self.visit_call(node, true)?,
            "parenthesized_expression" => {
                let inner = node
                    .named_child(0)
                    .ok_or_else(|| generic_at("empty parenthesized expression", node))?;
                let r = self.visit(inner)?;
                Rendered {
                    text: format!("({})", r.text),
                    ty: r.ty,
                }
            }
            "unary_expression" => self.visit_unary(node)?,
            // Literal leaves matching no rule keep their raw text.
            _ => Rendered {
                text: self.node_text(node).to_string(),
                ty: UNDEFINED,
            },
        };
        self.types.insert(node.id(), rendered.ty);
        Ok(rendered)
    }

    fn visit_number(&mut self, node: Node<'_>) -> Rendered {
        let text = self.node_text(node);
        let (ty, octal_digits) = classify_number(text);
        let text = match octal_digits {
            Some(digits) => self.target.octal(&digits),
            None => text.to_string(),
        };
        Rendered { text, ty }
    }

    fn visit_regex(&mut self, node: Node<'_>) -> Result<Rendered> {
        let value = eval::evaluate(self.node_text(node))?;
        let (source, flags) = value
            .as_regex()
            .ok_or_else(|| generic_at("expected a regular expression", node))?;
        Ok(Rendered {
            text: self.target.regex_literal(source, flags),
            ty: REGEX,
        })
    }

    fn visit_object(&mut self, node: Node<'_>) -> Result<Rendered> {
        let mut pairs = Vec::new();
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.named_children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "comment" => {}
                "pair" => {
                    let key = child
                        .child_by_field_name("key")
                        .ok_or_else(|| generic_at("object pair without a key", child))?;
                    let key = match key.kind() {
                        "property_identifier" | "number" => self.node_text(key).to_string(),
                        "string" => crate::lang::common::js_string_value(self.node_text(key)),
                        kind => {
                            return Err(generic_at(
                                format!("unsupported object key: {kind}"),
                                key,
                            ))
                        }
                    };
                    let value = child
                        .child_by_field_name("value")
                        .ok_or_else(|| generic_at("object pair without a value", child))?;
                    let value = self.visit(value)?;
                    pairs.push((key, value.text));
                }
                kind => {
                    return Err(generic_at(
                        format!("unsupported object member: {kind}"),
                        child,
                    ))
                }
            }
        }
        Ok(Rendered {
            text: self.target.object_literal(&pairs),
            ty: OBJECT,
        })
    }

    fn visit_array(&mut self, node: Node<'_>) -> Result<Rendered> {
        let mut items = Vec::new();
        let mut have_element = false;
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        for child in children {
            match child.kind() {
                "[" | "]" | "comment" => {}
                "," => {
                    // An elision hole renders as the target's null literal.
                    if !have_element {
                        items.push(self.target.null().to_string());
                    }
                    have_element = false;
                }
                _ => {
                    let r = self.visit(child)?;
                    items.push(r.text);
                    have_element = true;
                }
            }
        }
        Ok(Rendered {
            text: self.target.array_literal(&items),
            ty: ARRAY,
        })
    }

    fn visit_identifier(&mut self, node: Node<'_>) -> Result<Rendered> {
        let name = self.node_text(node);
        // Some grammar versions surface `undefined` as a plain identifier.
        if name == "undefined" {
            return Ok(Rendered {
                text: self.target.undefined().to_string(),
                ty: UNDEFINED,
            });
        }
        let (key, ty) = self
            .table
            .get_entry(name)
            .ok_or_else(|| reference_error(name, node))?;
        Ok(Rendered {
            text: self.target.identifier(key).to_string(),
            ty: ty.id,
        })
    }

    fn visit_unary(&mut self, node: Node<'_>) -> Result<Rendered> {
        let op = node
            .child_by_field_name("operator")
            .map(|n| self.node_text(n).to_string())
            .unwrap_or_default();
        let arg = node
            .child_by_field_name("argument")
            .ok_or_else(|| generic_at("unary expression without an operand", node))?;
        if op == "-" || op == "+" {
            let r = self.visit(arg)?;
            if NUMERIC_MEMBERS.contains(&r.ty) {
                return Ok(Rendered {
                    text: format!("{}{}", op, r.text),
                    ty: r.ty,
                });
            }
        }
        Err(generic_at(
            format!("unsupported unary expression: {}", self.node_text(node)),
            node,
        ))
    }

    /// Resolve an attribute access by walking the left side's type chain.
    fn resolve_member(&mut self, node: Node<'_>) -> Result<MemberRef> {
        let object = node
            .child_by_field_name("object")
            .ok_or_else(|| generic_at("member access without an object", node))?;
        let property = node
            .child_by_field_name("property")
            .ok_or_else(|| generic_at("member access without a property", node))?;

        let lhs = self.visit(object)?;
        let prop_name = self.node_text(property).to_string();

        match self.table.find_attr(lhs.ty, &prop_name) {
            Some((owner, attr, ty)) => Ok(MemberRef::Known {
                text: format!("{}.{}", lhs.text, attr),
                object_text: lhs.text,
                ty,
                owner,
                attr,
            }),
            None if self.table.is_class(lhs.ty) => {
                Err(crate::error::attribute_error(lhs.ty, &prop_name, node))
            }
            None => Ok(MemberRef::Raw {
                text: format!("{}.{}", lhs.text, prop_name),
            }),
        }
    }

    fn visit_call(&mut self, node: Node<'_>, is_new: bool) -> Result<Rendered> {
        let field = if is_new { "constructor" } else { "function" };
        let callee = node
            .child_by_field_name(field)
            .ok_or_else(|| generic_at("call without a callee", node))?;

        let mut args = Vec::new();
        if let Some(args_node) = node.child_by_field_name("arguments") {
            let mut cursor = args_node.walk();
            args.extend(
                args_node
                    .named_children(&mut cursor)
                    .filter(|n| n.kind() != "comment"),
            );
        }

        let (callee_text, callee_object, ty, dispatch) = match callee.kind() {
            "identifier" => {
                let name = self.node_text(callee);
                let (key, ty) = self
                    .table
                    .get_entry(name)
                    .ok_or_else(|| reference_error(name, callee))?;
                (
                    self.target.identifier(key).to_string(),
                    None,
                    ty,
                    (ty.id, None),
                )
            }
            "member_expression" => match self.resolve_member(callee)? {
                MemberRef::Known {
                    text,
                    object_text,
                    ty,
                    owner,
                    attr,
                } => (text, Some(object_text), ty, (owner, Some(attr))),
                MemberRef::Raw { text } => {
                    return Err(type_error(format!("{text} is not callable"), node))
                }
            },
            _ => {
                let r = self.visit(callee)?;
                match self.table.get(r.ty) {
                    Some(ty) => (r.text, None, ty, (ty.id, None)),
                    None => return Err(type_error(format!("{} is not callable", r.text), node)),
                }
            }
        };
        self.types.insert(callee.id(), ty.id);

        let site = CallSite {
            node,
            callee_text,
            callee_object,
            dispatch,
            args,
            is_new,
        };

        let target = self.target;
        if let Some(text) = target.emit_call(self, ty, &site)? {
            return Ok(Rendered {
                text,
                ty: ty.returns,
            });
        }

        // Generic emission for recognized callables without an override.
        if ty.callable == Callable::NotCallable {
            return Err(type_error(
                format!("{} is not callable", site.callee_text),
                node,
            ));
        }
        let args = self.check_args(ty, &site)?;
        let mut text = format!("{}({})", site.callee_text, join_args(&args));
        if ty.callable == Callable::Constructor {
            if let Some(token) = target.new_token() {
                text = format!("{token}{text}");
            }
        }
        Ok(Rendered {
            text,
            ty: ty.returns,
        })
    }

    /// Check a call's arguments against the schema, visiting each in order.
    ///
    /// Reports the first failure: an arity mismatch when the count falls
    /// outside the schema's bounds, a type error when an argument misses
    /// its slot's accept set.
    pub fn check_args(&mut self, ty: &Type, site: &CallSite<'_>) -> Result<Vec<Rendered>> {
        if site.args.len() > ty.max_args() {
            return Err(argument_count_error(
                ty.id,
                &ty.arity_label(),
                site.args.len(),
                site.node,
            ));
        }
        let mut out = Vec::new();
        for (i, slot) in ty.args.iter().enumerate() {
            let Some(&arg) = site.args.get(i) else {
                if slot.optional {
                    break;
                }
                return Err(argument_count_error(
                    ty.id,
                    &ty.arity_label(),
                    site.args.len(),
                    site.node,
                ));
            };
            let rendered = self.visit(arg)?;
            if !slot.matches(rendered.ty) {
                return Err(type_error(
                    format!(
                        "argument {} to {} must be {}, got {}",
                        i + 1,
                        ty.id,
                        slot.expected(),
                        rendered.ty
                    ),
                    arg,
                ));
            }
            out.push(rendered);
        }
        Ok(out)
    }
}

/// Classify a numeric literal by its syntactic form. Returns the type id
/// and, for octal forms, the digits with the prefix stripped.
pub(crate) fn classify_number(text: &str) -> (TypeId, Option<String>) {
    use crate::symbols::{DECIMAL, HEX, INTEGER, OCTAL};

    let clean = text.replace('_', "");
    if clean.starts_with("0x") || clean.starts_with("0X") {
        return (HEX, None);
    }
    if let Some(digits) = clean.strip_prefix("0o").or_else(|| clean.strip_prefix("0O")) {
        return (OCTAL, Some(digits.to_string()));
    }
    if clean.starts_with("0b") || clean.starts_with("0B") {
        return (INTEGER, None);
    }
    if clean.contains(['.', 'e', 'E']) {
        return (DECIMAL, None);
    }
    // Legacy octal: leading zero, all digits in 0-7. With an 8 or 9 the
    // literal is decimal per ECMAScript.
    if clean.len() > 1
        && clean.starts_with('0')
        && clean.bytes().all(|b| (b'0'..=b'7').contains(&b))
    {
        return (OCTAL, Some(clean[1..].to_string()));
    }
    (INTEGER, None)
}

fn single_expression_shape(tree: &Tree) -> bool {
    let root = tree.root_node();
    if root.has_error() {
        return false;
    }
    let mut cursor = root.walk();
    let stmts: Vec<Node<'_>> = root
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    matches!(stmts.as_slice(), [stmt] if stmt.kind() == "expression_statement")
}

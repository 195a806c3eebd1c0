//! Constrained evaluator for compile-time computable fragments.
//!
//! Re-parses a fragment of the input expression and folds it to a host
//! [`Value`] using shims for exactly the recognized compile-time-evaluable
//! constructors (`ObjectId`, `Binary`, `Long`, the numeric shell shims,
//! `Decimal128`, `Date`/`ISODate`, `RegExp`, `Long.fromBits`, and regex
//! literals). The emitters read canonical forms off the result: the hex
//! string of an ObjectId, a binary subtype index, the signed-64 value of a
//! Long, the UTC components of a date, a regex source and flag set.
//!
//! The folder is the whole sandbox: it evaluates nothing but these shims,
//! so it exposes no file-system, network, or process capability. Every
//! failure is reported as a generic error carrying the underlying message.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::trace;
use tree_sitter::{Node, Parser, Tree};

use crate::error::{generic, Result};
use crate::lang::common::js_string_value;

/// A host value produced by constant folding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    Array(Vec<Value>),
    Object(Vec<(String, Value)>),
    /// 24-character hex string.
    ObjectId(String),
    /// Payload string plus the subtype index, when one was given.
    Binary { data: String, subtype: Option<u8> },
    /// Canonical signed 64-bit value.
    Long(i64),
    /// Canonical decimal string.
    Decimal(String),
    Date(DateTime<Utc>),
    Regex { source: String, flags: String },
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::ObjectId(_) => "ObjectId",
            Value::Binary { .. } => "Binary",
            Value::Long(_) => "Long",
            Value::Decimal(_) => "Decimal128",
            Value::Date(_) => "Date",
            Value::Regex { .. } => "regex",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<&str> {
        match self {
            Value::ObjectId(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<(&str, Option<u8>)> {
        match self {
            Value::Binary { data, subtype } => Some((data, *subtype)),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<&str> {
        match self {
            Value::Decimal(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Date(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_regex(&self) -> Option<(&str, &str)> {
        match self {
            Value::Regex { source, flags } => Some((source, flags)),
            _ => None,
        }
    }
}

/// Evaluate a fragment of the input expression to a host value.
///
/// The fragment is typically the original source text of a constructor
/// call, `new` keyword included when present.
pub fn evaluate(fragment: &str) -> Result<Value> {
    trace!(fragment, "constant folding");
    let tree = parse(fragment)?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(generic(format!("failed to parse fragment: {fragment}")));
    }

    let mut cursor = root.walk();
    let stmts: Vec<Node<'_>> = root
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    let expr = match stmts.as_slice() {
        [stmt] if stmt.kind() == "expression_statement" => stmt
            .named_child(0)
            .ok_or_else(|| generic("empty fragment"))?,
        _ => return Err(generic(format!("not a single expression: {fragment}"))),
    };

    fold(fragment, expr)
}

fn parse(fragment: &str) -> Result<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
        .map_err(|e| generic(format!("failed to load grammar: {e}")))?;
    parser
        .parse(fragment, None)
        .ok_or_else(|| generic("failed to parse fragment"))
}

fn text<'a>(src: &'a str, node: Node<'_>) -> &'a str {
    &src[node.byte_range()]
}

fn fold(src: &str, node: Node<'_>) -> Result<Value> {
    match node.kind() {
        "string" => Ok(Value::Str(js_string_value(text(src, node)))),
        "number" => parse_number(text(src, node)),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        "null" => Ok(Value::Null),
        "undefined" => Ok(Value::Undefined),
        "regex" => {
            let source = node
                .child_by_field_name("pattern")
                .map(|p| text(src, p).to_string())
                .ok_or_else(|| generic("regex literal without a pattern"))?;
            let flags = node
                .child_by_field_name("flags")
                .map(|f| text(src, f).to_string())
                .unwrap_or_default();
            Ok(Value::Regex { source, flags })
        }
        "array" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .filter(|n| n.kind() != "comment")
                .map(|n| fold(src, n))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array)
        }
        "object" => {
            let mut pairs = Vec::new();
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() != "pair" {
                    continue;
                }
                let key = child
                    .child_by_field_name("key")
                    .ok_or_else(|| generic("object pair without a key"))?;
                let key = match key.kind() {
                    "string" => js_string_value(text(src, key)),
                    _ => text(src, key).to_string(),
                };
                let value = child
                    .child_by_field_name("value")
                    .ok_or_else(|| generic("object pair without a value"))?;
                pairs.push((key, fold(src, value)?));
            }
            Ok(Value::Object(pairs))
        }
        "parenthesized_expression" => {
            let inner = node
                .named_child(0)
                .ok_or_else(|| generic("empty parenthesized expression"))?;
            fold(src, inner)
        }
        "unary_expression" => fold_unary(src, node),
        "call_expression" => fold_call(src, node, false),
        "new_expression" => fold_call(src, node, true),
        kind => Err(generic(format!("not a compile-time constant: {kind}"))),
    }
}

fn fold_unary(src: &str, node: Node<'_>) -> Result<Value> {
    let op = node
        .child_by_field_name("operator")
        .map(|n| text(src, n))
        .unwrap_or("");
    let arg = node
        .child_by_field_name("argument")
        .ok_or_else(|| generic("unary expression without an operand"))?;
    let value = fold(src, arg)?;
    match (op, value) {
        ("-", Value::Int(i)) => Ok(Value::Int(-i)),
        ("-", Value::Double(d)) => Ok(Value::Double(-d)),
        ("+", v @ (Value::Int(_) | Value::Double(_))) => Ok(v),
        (op, _) => Err(generic(format!("not a compile-time constant: unary {op}"))),
    }
}

fn fold_call(src: &str, node: Node<'_>, is_new: bool) -> Result<Value> {
    let field = if is_new { "constructor" } else { "function" };
    let callee = node
        .child_by_field_name(field)
        .ok_or_else(|| generic("call without a callee"))?;

    let (name, attr) = match callee.kind() {
        "identifier" => (text(src, callee), None),
        "member_expression" => {
            let object = callee
                .child_by_field_name("object")
                .filter(|n| n.kind() == "identifier")
                .ok_or_else(|| generic("not a compile-time constant: computed callee"))?;
            let property = callee
                .child_by_field_name("property")
                .ok_or_else(|| generic("member access without a property"))?;
            (text(src, object), Some(text(src, property)))
        }
        kind => return Err(generic(format!("not a compile-time constant: {kind} call"))),
    };

    let mut args = Vec::new();
    if let Some(args_node) = node.child_by_field_name("arguments") {
        let mut cursor = args_node.walk();
        for arg in args_node.named_children(&mut cursor) {
            if arg.kind() == "comment" {
                continue;
            }
            args.push(fold(src, arg)?);
        }
    }

    apply(name, attr, &args)
}

/// Apply one of the recognized shims to folded arguments.
fn apply(name: &str, attr: Option<&str>, args: &[Value]) -> Result<Value> {
    match (name, attr) {
        ("ObjectId", None) => fold_object_id(args),
        ("Binary", None) => fold_binary(args),
        ("Long", None) | ("NumberLong", None) => fold_long(args),
        ("Long", Some("fromBits")) => fold_long_from_bits(args),
        ("Int32", None) | ("NumberInt", None) => fold_int32(args),
        ("Number", None) => fold_number(args),
        ("Decimal128", None) | ("NumberDecimal", None) => fold_decimal(args),
        ("Date", None) | ("ISODate", None) => fold_date(args).map(Value::Date),
        ("RegExp", None) => fold_regexp(args),
        _ => {
            let full = match attr {
                Some(attr) => format!("{name}.{attr}"),
                None => name.to_string(),
            };
            Err(generic(format!("not a compile-time constant: call to {full}")))
        }
    }
}

fn fold_object_id(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Str(s)] => {
            if s.len() == 24 && s.chars().all(|c| c.is_ascii_hexdigit()) {
                Ok(Value::ObjectId(s.clone()))
            } else {
                Err(generic(format!("invalid ObjectId hex string: {s}")))
            }
        }
        _ => Err(generic("ObjectId requires a single hex string")),
    }
}

fn fold_binary(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Str(data)] => Ok(Value::Binary {
            data: data.clone(),
            subtype: None,
        }),
        [Value::Str(data), subtype] => {
            let idx = int_value(subtype)?;
            if !(0..=255).contains(&idx) {
                return Err(generic(format!("binary subtype out of range: {idx}")));
            }
            Ok(Value::Binary {
                data: data.clone(),
                subtype: Some(idx as u8),
            })
        }
        _ => Err(generic("Binary requires a payload string")),
    }
}

fn fold_long(args: &[Value]) -> Result<Value> {
    match args {
        [one] => long_value(one).map(Value::Long),
        [low, high] => fold_long_from_bits(&[low.clone(), high.clone()]),
        _ => Err(generic("Long requires one or two arguments")),
    }
}

/// Assemble a signed 64-bit value from low/high 32-bit halves.
fn fold_long_from_bits(args: &[Value]) -> Result<Value> {
    let [low, high] = args else {
        return Err(generic("fromBits requires low and high halves"));
    };
    let low = int_value(low)?;
    let high = int_value(high)?;
    for (name, half) in [("low", low), ("high", high)] {
        if i32::try_from(half).is_err() {
            return Err(generic(format!("{name} half out of 32-bit range: {half}")));
        }
    }
    let bits = ((high as i32 as i64) << 32) | ((low as i32 as u32) as i64);
    Ok(Value::Long(bits))
}

fn fold_int32(args: &[Value]) -> Result<Value> {
    let [one] = args else {
        return Err(generic("Int32 requires a single argument"));
    };
    let v = long_value(one)?;
    if i32::try_from(v).is_err() {
        return Err(generic(format!("value out of 32-bit range: {v}")));
    }
    Ok(Value::Int(v))
}

fn fold_number(args: &[Value]) -> Result<Value> {
    let [one] = args else {
        return Err(generic("Number requires a single argument"));
    };
    let v = match one {
        Value::Int(i) => return Ok(Value::Int(*i)),
        Value::Double(d) => *d,
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| generic(format!("could not parse {s:?} as a number")))?,
        other => {
            return Err(generic(format!(
                "Number requires a string or numeric argument, got {}",
                other.type_name()
            )))
        }
    };
    if !v.is_finite() {
        return Err(generic(format!("not a finite number: {v}")));
    }
    Ok(Value::Double(v))
}

fn fold_decimal(args: &[Value]) -> Result<Value> {
    match args {
        [Value::Str(s)] => {
            let trimmed = s.trim();
            if is_valid_decimal(trimmed) {
                Ok(Value::Decimal(trimmed.to_string()))
            } else {
                Err(generic(format!("invalid Decimal128 string: {s}")))
            }
        }
        _ => Err(generic("Decimal128 requires a single string")),
    }
}

fn fold_regexp(args: &[Value]) -> Result<Value> {
    let (source, literal_flags) = match args.first() {
        Some(Value::Str(s)) => (s.clone(), String::new()),
        Some(Value::Regex { source, flags }) => (source.clone(), flags.clone()),
        _ => return Err(generic("RegExp requires a pattern")),
    };
    let flags = match args.get(1) {
        Some(Value::Str(f)) => f.clone(),
        Some(other) => {
            return Err(generic(format!(
                "RegExp flags must be a string, got {}",
                other.type_name()
            )))
        }
        None => literal_flags,
    };
    let bad: String = flags.chars().filter(|c| !"dgimsuvy".contains(*c)).collect();
    if !bad.is_empty() {
        return Err(generic(format!("invalid regular expression flags: {bad}")));
    }
    Ok(Value::Regex { source, flags })
}

/// JavaScript `Date` semantics: a lone number is epoch milliseconds, a lone
/// string is parsed, and the component form is (year, month0, day, h, m, s,
/// ms) with a zero-based month, interpreted as UTC. Years 0-99 map to
/// 1900-1999.
fn fold_date(args: &[Value]) -> Result<DateTime<Utc>> {
    match args {
        [] => Ok(Utc::now()),
        [Value::Str(s)] => parse_date_string(s),
        [one] => {
            let ms = one
                .as_f64()
                .ok_or_else(|| generic(format!("invalid Date argument: {}", one.type_name())))?;
            Utc.timestamp_millis_opt(ms as i64)
                .single()
                .ok_or_else(|| generic(format!("timestamp out of range: {ms}")))
        }
        parts => {
            let comp = |i: usize, default: i64| -> Result<i64> {
                match parts.get(i) {
                    None => Ok(default),
                    Some(v) => int_value(v),
                }
            };
            let mut year = comp(0, 0)?;
            if (0..=99).contains(&year) {
                year += 1900;
            }
            let month0 = comp(1, 0)?;
            if !(0..=11).contains(&month0) {
                return Err(generic(format!("month out of range: {month0}")));
            }
            let day = comp(2, 1)?;
            let (hour, minute, second) = (comp(3, 0)?, comp(4, 0)?, comp(5, 0)?);
            let ms = comp(6, 0)?;

            let year = i32::try_from(year)
                .map_err(|_| generic(format!("year out of range: {year}")))?;
            let dt = Utc
                .with_ymd_and_hms(
                    year,
                    (month0 + 1) as u32,
                    day as u32,
                    hour as u32,
                    minute as u32,
                    second as u32,
                )
                .single()
                .ok_or_else(|| generic("invalid date components"))?;
            Ok(dt + Duration::milliseconds(ms))
        }
    }
}

fn parse_date_string(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    Err(generic(format!("unrecognized date string: {s}")))
}

/// Parse a numeric literal, handling hex, octal (legacy and `0o`), binary,
/// and decimal forms.
fn parse_number(literal: &str) -> Result<Value> {
    let clean = literal.replace('_', "");
    let radix_value = |digits: &str, radix: u32| {
        i64::from_str_radix(digits, radix)
            .map(Value::Int)
            .map_err(|_| generic(format!("invalid numeric literal: {literal}")))
    };

    if let Some(digits) = clean.strip_prefix("0x").or_else(|| clean.strip_prefix("0X")) {
        return radix_value(digits, 16);
    }
    if let Some(digits) = clean.strip_prefix("0o").or_else(|| clean.strip_prefix("0O")) {
        return radix_value(digits, 8);
    }
    if let Some(digits) = clean.strip_prefix("0b").or_else(|| clean.strip_prefix("0B")) {
        return radix_value(digits, 2);
    }
    if clean.contains(['.', 'e', 'E']) {
        return clean
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| generic(format!("invalid numeric literal: {literal}")));
    }
    // Legacy octal: leading zero and all digits in 0-7. A leading zero with
    // an 8 or 9 in it is decimal per ECMAScript.
    if clean.len() > 1
        && clean.starts_with('0')
        && clean.bytes().all(|b| (b'0'..=b'7').contains(&b))
    {
        return radix_value(&clean[1..], 8);
    }
    match clean.parse::<i64>() {
        Ok(v) => Ok(Value::Int(v)),
        Err(_) => clean
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| generic(format!("invalid numeric literal: {literal}"))),
    }
}

/// Extract an integral value, admitting doubles with no fractional part.
fn int_value(v: &Value) -> Result<i64> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Double(d) if d.fract() == 0.0 => Ok(*d as i64),
        other => Err(generic(format!(
            "expected an integer, got {}",
            other.type_name()
        ))),
    }
}

/// Parse a signed 64-bit value out of a string or numeric host value.
fn long_value(v: &Value) -> Result<i64> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Double(d) if d.fract() == 0.0 => Ok(*d as i64),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| generic(format!("could not parse {s:?} as a 64-bit integer"))),
        other => Err(generic(format!(
            "expected a string or integer, got {}",
            other.type_name()
        ))),
    }
}

fn is_valid_decimal(s: &str) -> bool {
    let t = s.strip_prefix(['+', '-']).unwrap_or(s);
    if t.eq_ignore_ascii_case("infinity") || t.eq_ignore_ascii_case("nan") {
        return true;
    }
    let (mantissa, exponent) = match t.split_once(['e', 'E']) {
        Some((m, e)) => (m, Some(e)),
        None => (t, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next().unwrap_or("");
    if int_part.is_empty() && frac_part.is_empty() {
        return false;
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return false;
    }
    match exponent {
        None => true,
        Some(e) => {
            let e = e.strip_prefix(['+', '-']).unwrap_or(e);
            !e.is_empty() && e.bytes().all(|b| b.is_ascii_digit())
        }
    }
}

//! Java target emission.
//!
//! Emits Java driver flavored code: `org.bson` classes (`ObjectId`,
//! `Binary`, `BsonRegularExpression`, `BSONTimestamp`, `Document`, ...),
//! `java.util.Date`, and `Pattern.compile` for regular expressions.
//! Constructor calls carry the `new` token.

use crate::error::{generic, generic_at, Result};
use crate::eval::{self, Value};
use crate::lang::common;
use crate::lang::traits::Target;
use crate::symbols::Type;
use crate::walker::{join_args, CallSite, Walker};

/// Java language emitter.
pub struct Java;

impl Java {
    /// `BsonBinarySubType` constant for a subtype index.
    fn subtype_constant(&self, subtype: u8) -> Result<&'static str> {
        Ok(match subtype {
            0 => "BsonBinarySubType.BINARY",
            1 => "BsonBinarySubType.FUNCTION",
            2 => "BsonBinarySubType.OLD_BINARY",
            3 => "BsonBinarySubType.UUID_LEGACY",
            4 => "BsonBinarySubType.UUID_STANDARD",
            5 => "BsonBinarySubType.MD5",
            128 => "BsonBinarySubType.USER_DEFINED",
            other => return Err(generic(format!("unknown binary subtype: {other}"))),
        })
    }

    fn emit_code(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        let args = w.check_args(ty, site)?;
        match args.as_slice() {
            [code] => Ok(format!("new Code({})", code.text)),
            [code, scope] => Ok(format!("new CodeWithScope({}, {})", code.text, scope.text)),
            _ => Err(generic_at("Code requires a code string", site.node)),
        }
    }

    fn emit_object_id(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        if site.args.is_empty() {
            return Ok("new ObjectId()".to_string());
        }
        let value = eval::evaluate(w.node_text(site.node))?;
        let hex = value
            .as_object_id()
            .ok_or_else(|| generic_at("expected an ObjectId value", site.node))?;
        Ok(format!("new ObjectId({})", self.quote(hex)))
    }

    fn emit_binary(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.node))?;
        let (data, subtype) = value
            .as_binary()
            .ok_or_else(|| generic_at("expected a Binary value", site.node))?;
        let payload = format!("{}.getBytes()", self.quote(data));
        match subtype {
            None => Ok(format!("new Binary({payload})")),
            Some(idx) => Ok(format!(
                "new Binary({}, {payload})",
                self.subtype_constant(idx)?
            )),
        }
    }

    fn emit_long(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.node))?;
        let v = value
            .as_long()
            .ok_or_else(|| generic_at("expected a Long value", site.node))?;
        Ok(format!("new java.lang.Long({})", self.quote(&v.to_string())))
    }

    fn emit_long_to_string(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        let args = w.check_args(ty, site)?;
        let receiver = site
            .callee_object
            .as_deref()
            .ok_or_else(|| generic_at("toString requires a receiver", site.node))?;
        match args.first() {
            None => Ok(format!("{receiver}.toString()")),
            Some(radix) => Ok(format!("java.lang.Long.toString({receiver}, {})", radix.text)),
        }
    }

    fn emit_int32(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.node))?;
        let text = scalar_text(&value, site)?;
        Ok(format!("new java.lang.Integer({})", self.quote(&text)))
    }

    fn emit_double(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.args[0]))?;
        let text = scalar_text(&value, site)?;
        Ok(format!("new java.lang.Double({})", self.quote(&text)))
    }

    fn emit_number(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.node))?;
        let text = scalar_text(&value, site)?;
        Ok(format!("new java.lang.Double({})", self.quote(&text)))
    }

    fn emit_date(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        w.check_args(ty, site)?;
        if site.dispatch.0 == "Date" && !site.is_new {
            return Ok("new java.util.Date().toString()".to_string());
        }
        if site.args.is_empty() {
            return Ok("new java.util.Date()".to_string());
        }
        let value = eval::evaluate(w.node_text(site.node))?;
        let dt = value
            .as_datetime()
            .ok_or_else(|| generic_at("expected a Date value", site.node))?;
        Ok(format!("new java.util.Date({}L)", dt.timestamp_millis()))
    }

    fn emit_bson_regexp(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        let pattern = eval::evaluate(w.node_text(site.args[0]))?;
        let pattern = pattern
            .as_str()
            .ok_or_else(|| generic_at("expected a pattern string", site.node))?
            .to_string();
        match site.args.get(1) {
            None => Ok(format!("new BsonRegularExpression({})", self.quote(&pattern))),
            Some(&flags_node) => {
                let flags = eval::evaluate(w.node_text(flags_node))?;
                let flags = flags
                    .as_str()
                    .ok_or_else(|| generic_at("expected a flag string", site.node))?
                    .to_string();
                common::validate_bson_regex_flags(&flags)?;
                Ok(format!(
                    "new BsonRegularExpression({}, {})",
                    self.quote(&pattern),
                    self.quote(&flags)
                ))
            }
        }
    }

    fn emit_decimal(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.node))?;
        let s = value
            .as_decimal()
            .ok_or_else(|| generic_at("expected a Decimal128 value", site.node))?;
        Ok(format!("Decimal128.parse({})", self.quote(s)))
    }

    fn emit_regexp(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.node))?;
        let (source, flags) = value
            .as_regex()
            .ok_or_else(|| generic_at("expected a regular expression", site.node))?;
        Ok(self.regex_literal(source, flags))
    }

    fn emit_dbref(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        let args = w.check_args(ty, site)?;
        // The Java driver takes the database name first.
        match args.as_slice() {
            [ns, id] => Ok(format!("new DBRef({}, {})", ns.text, id.text)),
            [ns, id, db] => Ok(format!("new DBRef({}, {}, {})", db.text, ns.text, id.text)),
            _ => Err(generic_at("DBRef requires a namespace and an id", site.node)),
        }
    }
}

/// Text form of a folded string-or-numeric scalar.
fn scalar_text(value: &Value, site: &CallSite<'_>) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Double(d) => Ok(d.to_string()),
        other => Err(generic_at(
            format!("expected a string or numeric value, got {}", other.type_name()),
            site.node,
        )),
    }
}

impl Target for Java {
    fn name(&self) -> &'static str {
        "java"
    }

    fn quote(&self, value: &str) -> String {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{escaped}\"")
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value {
            "true"
        } else {
            "false"
        }
    }

    fn null(&self) -> &'static str {
        "null"
    }

    fn undefined(&self) -> &'static str {
        "null"
    }

    fn octal(&self, digits: &str) -> String {
        format!("0{digits}")
    }

    fn new_token(&self) -> Option<&'static str> {
        Some("new ")
    }

    fn identifier(&self, name: &'static str) -> &'static str {
        match name {
            "Long" | "NumberLong" => "java.lang.Long",
            "Int32" | "NumberInt" => "java.lang.Integer",
            "Double" => "java.lang.Double",
            "NumberDecimal" => "Decimal128",
            "BSONRegExp" => "BsonRegularExpression",
            "Timestamp" => "BSONTimestamp",
            "Date" | "ISODate" => "java.util.Date",
            "RegExp" => "Pattern",
            other => other,
        }
    }

    fn object_literal(&self, pairs: &[(String, String)]) -> String {
        let mut out = String::from("new Document()");
        for (key, value) in pairs {
            out.push_str(&format!(".append({}, {})", self.quote(key), value));
        }
        out
    }

    fn array_literal(&self, items: &[String]) -> String {
        format!("Arrays.asList({})", items.join(", "))
    }

    fn regex_flag(&self, flag: char) -> Option<char> {
        match flag {
            'i' => Some('i'),
            'm' => Some('m'),
            'u' => Some('u'),
            _ => None,
        }
    }

    fn regex_literal(&self, source: &str, flags: &str) -> String {
        let pattern = common::double_escape(source).replace('"', "\\\"");
        let flags = common::translate_flags(flags, |c| self.regex_flag(c));
        if flags.is_empty() {
            format!("Pattern.compile(\"{pattern}\")")
        } else {
            format!("Pattern.compile(\"{pattern}(?{flags})\")")
        }
    }

    fn emit_call(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<Option<String>> {
        let text = match site.dispatch {
            ("Code", None) => self.emit_code(w, ty, site)?,
            ("ObjectId", None) => self.emit_object_id(w, ty, site)?,
            ("Binary", None) => self.emit_binary(w, ty, site)?,
            ("Double", None) => self.emit_double(w, ty, site)?,
            ("Long", None) | ("NumberLong", None) => self.emit_long(w, ty, site)?,
            ("Long", Some("fromBits")) => self.emit_long(w, ty, site)?,
            ("Long", Some("toString")) => self.emit_long_to_string(w, ty, site)?,
            ("Int32", None) | ("NumberInt", None) => self.emit_int32(w, ty, site)?,
            ("Number", None) => self.emit_number(w, ty, site)?,
            ("MinKey", None) | ("MaxKey", None) => {
                w.check_args(ty, site)?;
                format!("new {}()", site.dispatch.0)
            }
            ("Symbol", None) => {
                let args = w.check_args(ty, site)?;
                format!("new Symbol({})", args[0].text)
            }
            ("Timestamp", None) => {
                let args = w.check_args(ty, site)?;
                format!("new BSONTimestamp({})", join_args(&args))
            }
            ("DBRef", None) => self.emit_dbref(w, ty, site)?,
            ("BSONRegExp", None) => self.emit_bson_regexp(w, ty, site)?,
            ("Decimal128", None) | ("NumberDecimal", None) => self.emit_decimal(w, ty, site)?,
            ("Date", None) | ("ISODate", None) => self.emit_date(w, ty, site)?,
            ("RegExp", None) => self.emit_regexp(w, ty, site)?,
            ("Object", Some("create")) => {
                let args = w.check_args(ty, site)?;
                args[0].text.clone()
            }
            _ => return Ok(None),
        };
        Ok(Some(text))
    }
}

#[cfg(test)]
mod tests {
    use crate::lang::TargetRegistry;
    use crate::walker;

    fn java(source: &str) -> String {
        let target = TargetRegistry::global().get_by_name("java").unwrap();
        walker::translate(source, target).unwrap()
    }

    fn java_err(source: &str) -> crate::error::TranslateError {
        let target = TargetRegistry::global().get_by_name("java").unwrap();
        walker::translate(source, target).unwrap_err()
    }

    #[test]
    fn test_object_id() {
        assert_eq!(
            java("ObjectId('5ab901c29ee65f5c8550c5b9')"),
            "new ObjectId(\"5ab901c29ee65f5c8550c5b9\")"
        );
        assert_eq!(java("new ObjectId()"), "new ObjectId()");
    }

    #[test]
    fn test_regex_drops_global_flag() {
        assert_eq!(java("/foo/gi"), "Pattern.compile(\"foo(?i)\")");
        assert_eq!(java("/foo/u"), "Pattern.compile(\"foo(?u)\")");
    }

    #[test]
    fn test_code_with_scope() {
        assert_eq!(
            java("new Code(\"return 1\", { x: 1 })"),
            "new CodeWithScope(\"return 1\", new Document().append(\"x\", 1))"
        );
        assert_eq!(java("Code('return 1')"), "new Code(\"return 1\")");
    }

    #[test]
    fn test_long() {
        assert_eq!(
            java("NumberLong(\"12345\")"),
            "new java.lang.Long(\"12345\")"
        );
        assert_eq!(
            java("NumberLong('5').toString(16)"),
            "java.lang.Long.toString(new java.lang.Long(\"5\"), 16)"
        );
        assert_eq!(
            java("NumberLong('5').toString()"),
            "new java.lang.Long(\"5\").toString()"
        );
    }

    #[test]
    fn test_binary_subtypes() {
        assert_eq!(
            java("Binary('abc', 4)"),
            "new Binary(BsonBinarySubType.UUID_STANDARD, \"abc\".getBytes())"
        );
        assert_eq!(java("Binary('abc')"), "new Binary(\"abc\".getBytes())");
    }

    #[test]
    fn test_numeric_wrappers() {
        assert_eq!(java("NumberInt('5')"), "new java.lang.Integer(\"5\")");
        assert_eq!(java("Double(1.5)"), "new java.lang.Double(\"1.5\")");
        assert_eq!(java("Number('1')"), "new java.lang.Double(\"1\")");
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(java("Timestamp(100, 1)"), "new BSONTimestamp(100, 1)");
    }

    #[test]
    fn test_dbref_reorders_database() {
        assert_eq!(
            java("DBRef('coll', {a: 1})"),
            "new DBRef(\"coll\", new Document().append(\"a\", 1))"
        );
        assert_eq!(
            java("DBRef('coll', {a: 1}, 'db')"),
            "new DBRef(\"db\", \"coll\", new Document().append(\"a\", 1))"
        );
    }

    #[test]
    fn test_bson_regexp_raises_on_bad_flags() {
        assert_eq!(
            java("BSONRegExp('foo', 'im')"),
            "new BsonRegularExpression(\"foo\", \"im\")"
        );
        let err = java_err("BSONRegExp('foo', 'gk')");
        assert!(err.to_string().contains("gk"), "got: {err}");
    }

    #[test]
    fn test_decimal128() {
        assert_eq!(
            java("NumberDecimal('1.5E-4')"),
            "Decimal128.parse(\"1.5E-4\")"
        );
    }

    #[test]
    fn test_date_forms() {
        assert_eq!(java("new Date()"), "new java.util.Date()");
        assert_eq!(
            java("new Date(2012, 11, 19, 6, 1, 17)"),
            "new java.util.Date(1355896877000L)"
        );
        assert_eq!(java("Date()"), "new java.util.Date().toString()");
    }

    #[test]
    fn test_min_max_key() {
        assert_eq!(java("MinKey()"), "new MinKey()");
        assert_eq!(java("new MaxKey()"), "new MaxKey()");
    }

    #[test]
    fn test_literals() {
        assert_eq!(java("true"), "true");
        assert_eq!(java("null"), "null");
        assert_eq!(java("undefined"), "null");
        assert_eq!(java("017"), "017");
        assert_eq!(java("0o17"), "017");
        assert_eq!(java("'abc'"), "\"abc\"");
    }

    #[test]
    fn test_documents_and_arrays() {
        assert_eq!(
            java("{x: 1, y: [1, true]}"),
            "new Document().append(\"x\", 1).append(\"y\", Arrays.asList(1, true))"
        );
        assert_eq!(java("{}"), "new Document()");
        assert_eq!(java("[1, , 2]"), "Arrays.asList(1, null, 2)");
    }

    #[test]
    fn test_symbol() {
        assert_eq!(java("Symbol('abc')"), "new Symbol(\"abc\")");
    }
}

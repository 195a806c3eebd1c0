//! Python target emission.
//!
//! Emits PyMongo-flavored Python: `bson` classes (`ObjectId`, `Int64`,
//! `Decimal128`, `Regex`, ...), `datetime` for dates, and `re.compile`
//! for regular expressions. Python needs no `new` token, so constructor
//! calls render as plain calls.

use chrono::{Datelike, Timelike};

use crate::error::{generic, generic_at, Result};
use crate::eval;
use crate::lang::common;
use crate::lang::traits::Target;
use crate::symbols::Type;
use crate::walker::{join_args, CallSite, Walker};

/// Python language emitter.
pub struct Python;

impl Python {
    /// PyMongo binary subtype constant for a subtype index.
    fn subtype_constant(&self, subtype: u8) -> Result<&'static str> {
        Ok(match subtype {
            0 => "bson.binary.BINARY_SUBTYPE",
            1 => "bson.binary.FUNCTION_SUBTYPE",
            2 => "bson.binary.OLD_BINARY_SUBTYPE",
            3 => "bson.binary.OLD_UUID_SUBTYPE",
            4 => "bson.binary.UUID_SUBTYPE",
            5 => "bson.binary.MD5_SUBTYPE",
            128 => "bson.binary.USER_DEFINED_SUBTYPE",
            other => return Err(generic(format!("unknown binary subtype: {other}"))),
        })
    }

    fn emit_code(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        let args = w.check_args(ty, site)?;
        Ok(format!("Code({})", join_args(&args)))
    }

    fn emit_object_id(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        w.check_args(ty, site)?;
        if site.args.is_empty() {
            return Ok("ObjectId()".to_string());
        }
        let value = eval::evaluate(w.node_text(site.node))?;
        let hex = value
            .as_object_id()
            .ok_or_else(|| generic_at("expected an ObjectId value", site.node))?;
        Ok(format!("ObjectId({})", self.quote(hex)))
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
        let payload = format!("bytes({}, 'utf-8')", self.quote(data));
        match subtype {
            None => Ok(format!("Binary({payload})")),
            Some(idx) => Ok(format!("Binary({payload}, {})", self.subtype_constant(idx)?)),
        }
    }

    fn emit_long(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        w.check_args(ty, site)?;
        let value = eval::evaluate(w.node_text(site.node))?;
        let v = value
            .as_long()
            .ok_or_else(|| generic_at("expected a Long value", site.node))?;
        Ok(format!("Int64({v})"))
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
            None => Ok(format!("str({receiver})")),
            Some(radix) if radix.text.parse::<i64>().ok() == Some(10) => {
                Ok(format!("str({receiver})"))
            }
            Some(radix) => Err(generic_at(
                format!("unsupported toString radix: {}", radix.text),
                site.node,
            )),
        }
    }

    fn emit_number(
        &self,
        w: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<String> {
        let args = w.check_args(ty, site)?;
        // Fold the call to reject non-finite constants.
        eval::evaluate(w.node_text(site.node))?;
        Ok(format!("int({})", join_args(&args)))
    }

    fn emit_date(&self, w: &mut Walker<'_>, ty: &'static Type, site: &CallSite<'_>) -> Result<String> {
        w.check_args(ty, site)?;
        // A bare Date() call yields the shell's date string, arguments
        // notwithstanding; ISODate always yields a date.
        if site.dispatch.0 == "Date" && !site.is_new {
            return Ok(
                "datetime.datetime.utcnow().strftime('%a %b %d %Y %H:%M:%S %Z')".to_string(),
            );
        }
        if site.args.is_empty() {
            return Ok("datetime.datetime.utcnow()".to_string());
        }
        let value = eval::evaluate(w.node_text(site.node))?;
        let dt = value
            .as_datetime()
            .ok_or_else(|| generic_at("expected a Date value", site.node))?;
        let micros = dt.timestamp_subsec_micros();
        let micros = if micros > 0 {
            format!(", {micros}")
        } else {
            String::new()
        };
        Ok(format!(
            "datetime.datetime({}, {}, {}, {}, {}, {}{}, tzinfo=datetime.timezone.utc)",
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
            micros,
        ))
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
            None => Ok(format!("Regex({})", self.quote(&pattern))),
            Some(&flags_node) => {
                let flags = eval::evaluate(w.node_text(flags_node))?;
                let flags = flags
                    .as_str()
                    .ok_or_else(|| generic_at("expected a flag string", site.node))?
                    .to_string();
                common::validate_bson_regex_flags(&flags)?;
                Ok(format!(
                    "Regex({}, {})",
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
        Ok(format!("Decimal128(Decimal({}))", self.quote(s)))
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
}

impl Target for Python {
    fn name(&self) -> &'static str {
        "python"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["py", "python3"]
    }

    fn quote(&self, value: &str) -> String {
        let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
        format!("'{escaped}'")
    }

    fn boolean(&self, value: bool) -> &'static str {
        if value {
            "True"
        } else {
            "False"
        }
    }

    fn null(&self) -> &'static str {
        "None"
    }

    fn undefined(&self) -> &'static str {
        "None"
    }

    fn octal(&self, digits: &str) -> String {
        format!("0o{digits}")
    }

    fn identifier(&self, name: &'static str) -> &'static str {
        match name {
            "Long" | "NumberLong" => "Int64",
            "Int32" | "NumberInt" => "int",
            "Double" => "float",
            "NumberDecimal" => "Decimal128",
            "BSONRegExp" => "Regex",
            other => other,
        }
    }

    fn object_literal(&self, pairs: &[(String, String)]) -> String {
        if pairs.is_empty() {
            return "{}".to_string();
        }
        let body = pairs
            .iter()
            .map(|(k, v)| format!("{}: {}", self.quote(k), v))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{body}}}")
    }

    fn array_literal(&self, items: &[String]) -> String {
        format!("[{}]", items.join(", "))
    }

    fn regex_flag(&self, flag: char) -> Option<char> {
        match flag {
            'i' => Some('i'),
            'm' => Some('m'),
            'u' => Some('a'),
            'g' => Some('s'),
            _ => None,
        }
    }

    fn regex_literal(&self, source: &str, flags: &str) -> String {
        let pattern = common::double_escape(source).replace('"', "\\\"");
        let flags = common::translate_flags(flags, |c| self.regex_flag(c));
        if flags.is_empty() {
            format!("re.compile(r\"{pattern}\")")
        } else {
            format!("re.compile(r\"{pattern}(?{flags})\")")
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
            ("Double", None) => {
                let args = w.check_args(ty, site)?;
                format!("float({})", join_args(&args))
            }
            ("Long", None) | ("NumberLong", None) => self.emit_long(w, ty, site)?,
            ("Long", Some("fromBits")) => self.emit_long(w, ty, site)?,
            ("Long", Some("toString")) => self.emit_long_to_string(w, ty, site)?,
            ("Int32", None) | ("NumberInt", None) => {
                let args = w.check_args(ty, site)?;
                format!("int({})", join_args(&args))
            }
            ("Number", None) => self.emit_number(w, ty, site)?,
            ("MinKey", None) | ("MaxKey", None) => {
                w.check_args(ty, site)?;
                format!("{}()", site.dispatch.0)
            }
            ("Symbol", None) => {
                let args = w.check_args(ty, site)?;
                args[0].text.clone()
            }
            ("Timestamp", None) => {
                let args = w.check_args(ty, site)?;
                format!("Timestamp({})", join_args(&args))
            }
            ("DBRef", None) => {
                let args = w.check_args(ty, site)?;
                format!("DBRef({})", join_args(&args))
            }
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

    fn py(source: &str) -> String {
        let target = TargetRegistry::global().get_by_name("python").unwrap();
        walker::translate(source, target).unwrap()
    }

    fn py_err(source: &str) -> crate::error::TranslateError {
        let target = TargetRegistry::global().get_by_name("python").unwrap();
        walker::translate(source, target).unwrap_err()
    }

    #[test]
    fn test_object_id_round_trip() {
        assert_eq!(
            py("ObjectId('5ab901c29ee65f5c8550c5b9')"),
            "ObjectId('5ab901c29ee65f5c8550c5b9')"
        );
        assert_eq!(py("ObjectId()"), "ObjectId()");
    }

    #[test]
    fn test_code_with_scope() {
        assert_eq!(
            py("new Code(\"return 1\", { x: 1 })"),
            "Code('return 1', {'x': 1})"
        );
        assert_eq!(py("Code('return 1')"), "Code('return 1')");
    }

    #[test]
    fn test_timestamp() {
        assert_eq!(py("Timestamp(100, 1)"), "Timestamp(100, 1)");
        assert!(matches!(
            py_err("Timestamp(\"a\", 1)"),
            crate::error::TranslateError::Type { .. }
        ));
    }

    #[test]
    fn test_regex_literal_flags() {
        assert_eq!(py("/foo/gi"), "re.compile(r\"foo(?is)\")");
        assert_eq!(py("/foo/"), "re.compile(r\"foo\")");
        // y has no Python equivalent and is dropped.
        assert_eq!(py("/foo/y"), "re.compile(r\"foo\")");
    }

    #[test]
    fn test_regex_backslash_double_escape() {
        assert_eq!(py(r"/a\d/"), "re.compile(r\"a\\\\d\")");
    }

    #[test]
    fn test_regexp_constructor() {
        assert_eq!(py("new RegExp('foo', 'i')"), "re.compile(r\"foo(?i)\")");
    }

    #[test]
    fn test_number_long() {
        assert_eq!(py("NumberLong(\"12345\")"), "Int64(12345)");
        assert_eq!(py("new Long(1, 0)"), "Int64(1)");
        assert_eq!(py("Long.fromBits(0, 1)"), "Int64(4294967296)");
    }

    #[test]
    fn test_long_to_string() {
        assert_eq!(py("NumberLong('5').toString()"), "str(Int64(5))");
        assert_eq!(py("NumberLong('5').toString(10)"), "str(Int64(5))");
        assert!(py_err("NumberLong('5').toString(16)")
            .to_string()
            .contains("radix"));
    }

    #[test]
    fn test_binary_subtypes() {
        assert_eq!(
            py("Binary(\"abc\", 4)"),
            "Binary(bytes('abc', 'utf-8'), bson.binary.UUID_SUBTYPE)"
        );
        assert_eq!(py("Binary('abc')"), "Binary(bytes('abc', 'utf-8'))");
        assert!(py_err("Binary('abc', 9)").to_string().contains("subtype"));
    }

    #[test]
    fn test_numeric_wrappers() {
        assert_eq!(py("NumberInt('5')"), "int('5')");
        assert_eq!(py("Int32(5)"), "int(5)");
        assert_eq!(py("Double(1.5)"), "float(1.5)");
        assert_eq!(py("Number('1')"), "int('1')");
        assert!(py_err("Number('wat')").to_string().contains("number"));
    }

    #[test]
    fn test_decimal128() {
        assert_eq!(
            py("NumberDecimal('1.5E-4')"),
            "Decimal128(Decimal('1.5E-4'))"
        );
    }

    #[test]
    fn test_date_forms() {
        assert_eq!(py("new Date()"), "datetime.datetime.utcnow()");
        assert_eq!(
            py("new Date(2018, 2, 1)"),
            "datetime.datetime(2018, 3, 1, 0, 0, 0, tzinfo=datetime.timezone.utc)"
        );
        assert_eq!(
            py("ISODate('2012-12-19T06:01:17.171Z')"),
            "datetime.datetime(2012, 12, 19, 6, 1, 17, 171000, tzinfo=datetime.timezone.utc)"
        );
        assert_eq!(
            py("Date()"),
            "datetime.datetime.utcnow().strftime('%a %b %d %Y %H:%M:%S %Z')"
        );
    }

    #[test]
    fn test_bson_regexp() {
        assert_eq!(py("BSONRegExp('foo', 'im')"), "Regex('foo', 'im')");
        assert_eq!(py("BSONRegExp('foo')"), "Regex('foo')");
        let err = py_err("BSONRegExp('foo', 'gk')");
        assert!(err.to_string().contains("gk"), "got: {err}");
    }

    #[test]
    fn test_dbref() {
        assert_eq!(
            py("DBRef('coll', {a: 1}, 'db')"),
            "DBRef('coll', {'a': 1}, 'db')"
        );
    }

    #[test]
    fn test_min_max_key() {
        assert_eq!(py("MinKey()"), "MinKey()");
        assert_eq!(py("new MaxKey()"), "MaxKey()");
    }

    #[test]
    fn test_symbol_collapses_to_string() {
        assert_eq!(py("Symbol('abc')"), "'abc'");
    }

    #[test]
    fn test_object_create_returns_object() {
        assert_eq!(py("Object.create({a: 1})"), "{'a': 1}");
    }

    #[test]
    fn test_literals() {
        assert_eq!(py("true"), "True");
        assert_eq!(py("null"), "None");
        assert_eq!(py("undefined"), "None");
        assert_eq!(py("017"), "0o17");
        assert_eq!(py("0O17"), "0o17");
        assert_eq!(py("0x1F"), "0x1F");
        assert_eq!(py("'it\\'s'"), "'it\\'s'");
    }

    #[test]
    fn test_documents_and_arrays() {
        assert_eq!(py("{x: 1, 'y': true}"), "{'x': 1, 'y': True}");
        assert_eq!(py("[1, , 2]"), "[1, None, 2]");
        assert_eq!(py("[1, 2,]"), "[1, 2]");
        assert_eq!(py("{}"), "{}");
    }

    #[test]
    fn test_nested_document() {
        assert_eq!(
            py("{a: {b: [NumberLong(\"1\"), null]}}"),
            "{'a': {'b': [Int64(1), None]}}"
        );
    }
}

//! End-to-end Java emission tests.

use bson_transpile::translate;

fn java(source: &str) -> String {
    translate(source, "java").expect(source)
}

#[test]
fn test_object_id_uses_new() {
    assert_eq!(
        java("ObjectId('5ab901c29ee65f5c8550c5b9')"),
        "new ObjectId(\"5ab901c29ee65f5c8550c5b9\")"
    );
}

#[test]
fn test_regex_drops_untranslatable_flags() {
    assert_eq!(java("/foo/gi"), "Pattern.compile(\"foo(?i)\")");
}

#[test]
fn test_code_scope_becomes_code_with_scope() {
    assert_eq!(
        java("new Code(\"return 1\", { x: 1 })"),
        "new CodeWithScope(\"return 1\", new Document().append(\"x\", 1))"
    );
}

#[test]
fn test_long_quoted_string_form() {
    assert_eq!(java("NumberLong(\"12345\")"), "new java.lang.Long(\"12345\")");
}

#[test]
fn test_binary_subtype_table() {
    assert_eq!(
        java("Binary(\"abc\", 4)"),
        "new Binary(BsonBinarySubType.UUID_STANDARD, \"abc\".getBytes())"
    );
}

#[test]
fn test_full_query_document() {
    let source = "{_id: ObjectId('5ab901c29ee65f5c8550c5b9'), ok: true, tags: ['a', 'b']}";
    assert_eq!(
        java(source),
        "new Document().append(\"_id\", new ObjectId(\"5ab901c29ee65f5c8550c5b9\"))\
         .append(\"ok\", true).append(\"tags\", Arrays.asList(\"a\", \"b\"))"
    );
}

#[test]
fn test_octal_normalization() {
    assert_eq!(java("[0o10, 010]"), "Arrays.asList(010, 010)");
}

#[test]
fn test_timestamp_spelling() {
    assert_eq!(java("Timestamp(100, 1)"), "new BSONTimestamp(100, 1)");
}

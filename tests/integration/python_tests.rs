//! End-to-end Python emission tests.

use bson_transpile::translate;

fn py(source: &str) -> String {
    translate(source, "python").expect(source)
}

#[test]
fn test_object_id_embeds_hex_literal() {
    assert_eq!(
        py("ObjectId('5ab901c29ee65f5c8550c5b9')"),
        "ObjectId('5ab901c29ee65f5c8550c5b9')"
    );
    assert_eq!(
        py("new ObjectId(\"5ab901c29ee65f5c8550c5b9\")"),
        "ObjectId('5ab901c29ee65f5c8550c5b9')"
    );
}

#[test]
fn test_code_with_scope_document() {
    assert_eq!(
        py("new Code(\"return 1\", { x: 1 })"),
        "Code('return 1', {'x': 1})"
    );
}

#[test]
fn test_timestamp_passthrough() {
    assert_eq!(py("Timestamp(100, 1)"), "Timestamp(100, 1)");
}

#[test]
fn test_regex_flag_translation() {
    assert_eq!(py("/foo/gi"), "re.compile(r\"foo(?is)\")");
}

#[test]
fn test_number_long_canonical_value() {
    assert_eq!(py("NumberLong(\"12345\")"), "Int64(12345)");
}

#[test]
fn test_binary_subtype_table() {
    assert_eq!(
        py("Binary(\"abc\", 4)"),
        "Binary(bytes('abc', 'utf-8'), bson.binary.UUID_SUBTYPE)"
    );
}

#[test]
fn test_full_query_document() {
    let source = "{_id: ObjectId('5ab901c29ee65f5c8550c5b9'), n: NumberInt('10'), \
                  when: ISODate('2012-12-19T06:01:17.171Z'), tags: ['a', /b/i]}";
    assert_eq!(
        py(source),
        "{'_id': ObjectId('5ab901c29ee65f5c8550c5b9'), 'n': int('10'), \
         'when': datetime.datetime(2012, 12, 19, 6, 1, 17, 171000, tzinfo=datetime.timezone.utc), \
         'tags': ['a', re.compile(r\"b(?i)\")]}"
    );
}

#[test]
fn test_octal_normalization_value_preserved() {
    // All three octal spellings normalize to Python's 0o form.
    assert_eq!(py("[010, 0o10, 0O10]"), "[0o10, 0o10, 0o10]");
}

#[test]
fn test_whitespace_and_comments_tolerated() {
    assert_eq!(py("  Timestamp( 100 , 1 )  "), "Timestamp(100, 1)");
    assert_eq!(py("Timestamp(100, 1) // upsert marker"), "Timestamp(100, 1)");
}

#[test]
fn test_negative_numeric_argument() {
    assert_eq!(py("Timestamp(-1, 0)"), "Timestamp(-1, 0)");
}

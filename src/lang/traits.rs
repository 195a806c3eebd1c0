//! Target language abstraction.
//!
//! Each output language implements [`Target`]: the literal spellings the
//! generic walker needs (quoting, booleans, octal form, `new` policy) plus
//! `emit_call`, which overrides emission for every recognized host class.

use crate::error::Result;
use crate::symbols::Type;
use crate::walker::{CallSite, Walker};

/// A target language emitter.
pub trait Target: Sync {
    /// Canonical target name (e.g. "python").
    fn name(&self) -> &'static str;

    /// Alternative names resolving to this target.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Quote a string value in the target's preferred style, escaping
    /// embedded quotes and backslashes.
    fn quote(&self, value: &str) -> String;

    /// The target's boolean literal casing.
    fn boolean(&self, value: bool) -> &'static str;

    /// The target's null literal.
    fn null(&self) -> &'static str;

    /// Rendering of the `undefined` literal.
    fn undefined(&self) -> &'static str;

    /// Canonical octal literal from prefix-stripped digits.
    fn octal(&self, digits: &str) -> String;

    /// Token prefixed to constructor calls when the target requires one.
    fn new_token(&self) -> Option<&'static str> {
        None
    }

    /// Target spelling of a bare recognized identifier.
    fn identifier(&self, name: &'static str) -> &'static str {
        name
    }

    /// Render an object literal from raw keys and emitted values.
    fn object_literal(&self, pairs: &[(String, String)]) -> String;

    /// Render an array literal from emitted elements.
    fn array_literal(&self, items: &[String]) -> String;

    /// Per-target translation of one JavaScript regex flag. `None` drops
    /// the flag.
    fn regex_flag(&self, flag: char) -> Option<char>;

    /// Render a compiled regex from its source and JavaScript flags.
    fn regex_literal(&self, source: &str, flags: &str) -> String;

    /// Class-specific call emission, dispatched on `site.dispatch`.
    ///
    /// Returns `Ok(None)` when the target has no override for the callee,
    /// in which case the walker's generic path applies. Overrides run their
    /// own argument checks (via [`Walker::check_args`]) and call the
    /// constant folder when a canonical literal form is needed.
    fn emit_call(
        &self,
        walker: &mut Walker<'_>,
        ty: &'static Type,
        site: &CallSite<'_>,
    ) -> Result<Option<String>>;
}

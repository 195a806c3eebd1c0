//! Translate MongoDB shell expressions into driver-ready target code.
//!
//! Takes a single shell expression (object and array documents, primitive
//! literals, regular expressions, and the recognized BSON and JavaScript
//! constructor calls) and emits the semantically equivalent expression in
//! a chosen target language.
//!
//! # Architecture
//!
//! - [`symbols`] - Symbol/type table declaring every recognized identifier
//! - [`walker`] - Parse-tree walker: type tagging, argument checking,
//!   generic emission
//! - [`eval`] - Constant folder recovering canonical literal forms
//!   (ObjectId hex, Long values, UTC date components, regex source/flags)
//! - [`lang`] - Per-target emitters behind the [`Target`](lang::Target)
//!   trait, looked up through [`TargetRegistry`]
//! - [`error`] - The typed failure surface
//!
//! # Example
//!
//! ```
//! use bson_transpile::Translator;
//!
//! let translator = Translator::new("python")?;
//! let out = translator.translate("{status: NumberLong(\"1\")}")?;
//! assert_eq!(out, "{'status': Int64(1)}");
//! # Ok::<(), bson_transpile::TranslateError>(())
//! ```

pub mod error;
pub mod eval;
pub mod lang;
pub mod symbols;
pub mod walker;

pub use error::{Result, Span, TranslateError};
pub use lang::{Target, TargetRegistry};

/// A reusable translator bound to one target language.
///
/// Holds only the target handle; every [`translate`](Translator::translate)
/// call allocates a fresh walker, so one translator may serve concurrent
/// translations.
pub struct Translator {
    target: &'static dyn Target,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("target", &self.target.name())
            .finish()
    }
}

impl Translator {
    /// Create a translator for the named target language.
    ///
    /// Accepts canonical names ("python", "java") and registry aliases
    /// ("py"). Unknown names are a generic error.
    pub fn new(target: &str) -> Result<Self> {
        TargetRegistry::global()
            .get_by_name(target)
            .map(|target| Translator { target })
            .ok_or_else(|| TranslateError::Generic {
                message: format!("unsupported target language: {target}"),
                span: None,
            })
    }

    /// Canonical name of the bound target.
    pub fn target(&self) -> &'static str {
        self.target.name()
    }

    /// Translate a single shell expression.
    pub fn translate(&self, source: &str) -> Result<String> {
        walker::translate(source, self.target)
    }
}

/// One-shot translation of `source` into the named target language.
pub fn translate(source: &str, target: &str) -> Result<String> {
    Translator::new(target)?.translate(source)
}

//! Symbol and type table for the recognized shell surface.
//!
//! Declares every identifier the translator understands: the JavaScript
//! builtins (`Date`, `RegExp`, `Object.create`, `Number`), the BSON classes,
//! and the shell's numeric shims (`NumberInt`, `NumberLong`, `NumberDecimal`,
//! `ISODate`). Each entry records its callable kind, an ordered argument
//! schema, the instance type it yields when called, and any attributes that
//! may be accessed on it.
//!
//! The table is built once into a `OnceLock` singleton and is read-only for
//! the lifetime of the process; walkers only ever borrow it.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;

/// Stable type identifier. Primitive ids carry a leading underscore;
/// everything else names a recognized class.
pub type TypeId = &'static str;

pub const STRING: TypeId = "_string";
pub const INTEGER: TypeId = "_integer";
pub const DECIMAL: TypeId = "_decimal";
pub const HEX: TypeId = "_hex";
pub const OCTAL: TypeId = "_octal";
pub const BOOL: TypeId = "_bool";
pub const NULL: TypeId = "_null";
pub const UNDEFINED: TypeId = "_undefined";
pub const OBJECT: TypeId = "_object";
pub const ARRAY: TypeId = "_array";
pub const REGEX: TypeId = "_regex";

/// Union sentinel: matches any of the four numeric literal forms.
pub const NUMERIC: TypeId = "_numeric";

/// The members `_numeric` expands to at slot-check time.
pub const NUMERIC_MEMBERS: &[TypeId] = &[INTEGER, DECIMAL, HEX, OCTAL];

/// How a symbol may be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callable {
    NotCallable,
    Function,
    Constructor,
}

/// One position in a callable's argument schema: the set of acceptable
/// types, plus whether the argument may be omitted.
#[derive(Debug, Clone)]
pub struct ArgSlot {
    pub accepts: &'static [TypeId],
    pub optional: bool,
}

impl ArgSlot {
    const fn required(accepts: &'static [TypeId]) -> Self {
        ArgSlot {
            accepts,
            optional: false,
        }
    }

    const fn opt(accepts: &'static [TypeId]) -> Self {
        ArgSlot {
            accepts,
            optional: true,
        }
    }

    /// Whether an argument of type `ty` satisfies this slot.
    /// `_numeric` in the accept set expands to the numeric literal forms.
    pub fn matches(&self, ty: TypeId) -> bool {
        self.accepts
            .iter()
            .any(|a| *a == ty || (*a == NUMERIC && NUMERIC_MEMBERS.contains(&ty)))
    }

    /// Human-readable form of the accept set, for type errors.
    pub fn expected(&self) -> String {
        self.accepts.join(" | ")
    }
}

/// A declared type: identity, callability, argument schema, instance type,
/// and attribute map.
#[derive(Debug, Clone)]
pub struct Type {
    pub id: TypeId,
    pub callable: Callable,
    pub args: Vec<ArgSlot>,
    /// Instance type id yielded when this value is called.
    pub returns: TypeId,
    pub attrs: FxHashMap<&'static str, Type>,
}

impl Type {
    fn new(id: TypeId, callable: Callable, args: Vec<ArgSlot>, returns: TypeId) -> Self {
        Type {
            id,
            callable,
            args,
            returns,
            attrs: FxHashMap::default(),
        }
    }

    fn with_attr(mut self, name: &'static str, attr: Type) -> Self {
        self.attrs.insert(name, attr);
        self
    }

    /// Minimum number of arguments the schema admits.
    pub fn min_args(&self) -> usize {
        self.args.iter().filter(|s| !s.optional).count()
    }

    /// Maximum number of arguments the schema admits.
    pub fn max_args(&self) -> usize {
        self.args.len()
    }

    /// Arity bounds as text for argument-count errors ("2", "1 to 2").
    pub fn arity_label(&self) -> String {
        let (lo, hi) = (self.min_args(), self.max_args());
        if lo == hi {
            lo.to_string()
        } else {
            format!("{lo} to {hi}")
        }
    }
}

static TABLE: OnceLock<SymbolTable> = OnceLock::new();

/// Mapping from identifier name to [`Type`] for every recognized top-level
/// name. Immutable after initialization.
pub struct SymbolTable {
    types: FxHashMap<&'static str, Type>,
}

impl SymbolTable {
    /// Get the global symbol table singleton.
    pub fn global() -> &'static Self {
        TABLE.get_or_init(Self::new)
    }

    fn new() -> Self {
        let mut types = FxHashMap::default();

        let mut declare = |ty: Type| {
            types.insert(ty.id, ty);
        };

        // JavaScript builtins
        declare(Type::new(
            "Date",
            Callable::Constructor,
            vec![
                ArgSlot::opt(&[STRING, NUMERIC]),
                ArgSlot::opt(&[NUMERIC]),
                ArgSlot::opt(&[NUMERIC]),
                ArgSlot::opt(&[NUMERIC]),
                ArgSlot::opt(&[NUMERIC]),
                ArgSlot::opt(&[NUMERIC]),
                ArgSlot::opt(&[NUMERIC]),
            ],
            "Date",
        ));
        declare(Type::new(
            "RegExp",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING, REGEX]), ArgSlot::opt(&[STRING])],
            REGEX,
        ));
        declare(
            Type::new("Object", Callable::NotCallable, vec![], OBJECT).with_attr(
                "create",
                Type::new(
                    "Object.create",
                    Callable::Function,
                    vec![ArgSlot::required(&[OBJECT])],
                    OBJECT,
                ),
            ),
        );
        declare(Type::new(
            "Number",
            Callable::Function,
            vec![ArgSlot::required(&[STRING, NUMERIC])],
            DECIMAL,
        ));

        // BSON classes
        declare(Type::new(
            "Code",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING]), ArgSlot::opt(&[OBJECT])],
            "Code",
        ));
        declare(Type::new(
            "ObjectId",
            Callable::Constructor,
            vec![ArgSlot::opt(&[STRING])],
            "ObjectId",
        ));
        declare(Type::new(
            "Binary",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING]), ArgSlot::opt(&[NUMERIC])],
            "Binary",
        ));
        declare(Type::new(
            "Double",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING, NUMERIC])],
            "Double",
        ));
        declare(
            Type::new(
                "Long",
                Callable::Constructor,
                vec![
                    ArgSlot::required(&[STRING, NUMERIC]),
                    ArgSlot::opt(&[NUMERIC]),
                ],
                "Long",
            )
            .with_attr(
                "fromBits",
                Type::new(
                    "Long.fromBits",
                    Callable::Function,
                    vec![ArgSlot::required(&[INTEGER]), ArgSlot::required(&[INTEGER])],
                    "Long",
                ),
            )
            .with_attr(
                "toString",
                Type::new(
                    "Long.toString",
                    Callable::Function,
                    vec![ArgSlot::opt(&[INTEGER])],
                    STRING,
                ),
            ),
        );
        declare(Type::new(
            "Int32",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING, NUMERIC])],
            "Int32",
        ));
        declare(Type::new("MaxKey", Callable::Constructor, vec![], "MaxKey"));
        declare(Type::new("MinKey", Callable::Constructor, vec![], "MinKey"));
        declare(Type::new(
            "Symbol",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING])],
            "Symbol",
        ));
        declare(Type::new(
            "Timestamp",
            Callable::Constructor,
            vec![ArgSlot::required(&[INTEGER]), ArgSlot::required(&[INTEGER])],
            "Timestamp",
        ));
        declare(Type::new(
            "DBRef",
            Callable::Constructor,
            vec![
                ArgSlot::required(&[STRING]),
                ArgSlot::required(&[OBJECT]),
                ArgSlot::opt(&[STRING]),
            ],
            "DBRef",
        ));
        declare(Type::new(
            "BSONRegExp",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING]), ArgSlot::opt(&[STRING])],
            "BSONRegExp",
        ));
        declare(Type::new(
            "Decimal128",
            Callable::Constructor,
            vec![ArgSlot::required(&[STRING])],
            "Decimal128",
        ));

        // Shell numeric shims. Each shims the class named by `returns`.
        declare(Type::new(
            "NumberInt",
            Callable::Function,
            vec![ArgSlot::required(&[STRING, NUMERIC])],
            "Int32",
        ));
        declare(Type::new(
            "NumberLong",
            Callable::Function,
            vec![ArgSlot::required(&[STRING, NUMERIC])],
            "Long",
        ));
        declare(Type::new(
            "NumberDecimal",
            Callable::Function,
            vec![ArgSlot::required(&[STRING])],
            "Decimal128",
        ));
        declare(Type::new(
            "ISODate",
            Callable::Function,
            vec![ArgSlot::opt(&[STRING])],
            "Date",
        ));

        SymbolTable { types }
    }

    /// Look up a symbol by name.
    pub fn get(&self, name: &str) -> Option<&Type> {
        self.types.get(name)
    }

    /// Look up a symbol by name, also returning the interned key.
    pub fn get_entry(&self, name: &str) -> Option<(&'static str, &Type)> {
        self.types.get_key_value(name).map(|(k, v)| (*k, v))
    }

    /// Whether `id` names a recognized class (as opposed to a primitive).
    pub fn is_class(&self, id: TypeId) -> bool {
        !id.starts_with('_') && self.types.contains_key(id)
    }

    /// Resolve an attribute on `start`, walking up the instance-type chain
    /// until the attribute is found or the chain ends.
    pub fn find_attr(&self, start: TypeId, name: &str) -> Option<(TypeId, &'static str, &Type)> {
        let mut cur = start;
        loop {
            let ty = self.types.get(cur)?;
            if let Some((key, attr)) = ty.attrs.get_key_value(name) {
                return Some((ty.id, *key, attr));
            }
            if ty.returns == cur {
                return None;
            }
            cur = ty.returns;
        }
    }
}

//! Attribute Registry and Application
//!
//! Attributes are named settings on a connection or on the connection
//! manager (fetch modes, portability flags, cache backends, ...). The set of
//! valid attribute names and the symbolic constants their values may refer to
//! are owned by the ORM; [`AttributeRegistry`] exposes them as plain tables.
//!
//! # Resolution Rules
//! 1. The key is matched case-insensitively, with an optional `attr_` prefix.
//!    Unknown keys fail with `UnknownAttribute`.
//! 2. Cache slots (`query_cache`, `result_cache`) take a descriptor
//!    `{ class, options }`; the class is built through the [`TypeRegistry`].
//! 3. String values are uppercased and looked up among the named constants;
//!    a match substitutes the constant, otherwise the literal is kept.
//! 4. Integers, floats and booleans are kept as scalars, mappings are passed
//!    through unchanged. Null and arrays fail with `InvalidAttributeValue`.

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::manager::Configurable;
use crate::registry::{Cache, TypeRegistry};

/// Attribute identifiers understood by the ORM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    QueryCache,
    ResultCache,
    QueryCacheLifespan,
    ResultCacheLifespan,
    Portability,
    Validate,
    ModelLoading,
    AutoAccessorOverride,
    AutoFreeQueryObjects,
    AutoloadTableClasses,
    UseDqlCallbacks,
    UseNativeEnum,
    UseNativeSet,
    QuoteIdentifier,
    FieldCase,
    IdxnameFormat,
    SeqnameFormat,
    TblnameFormat,
    FknameFormat,
    SeqcolName,
    Export,
    DecimalPlaces,
    DefaultTableType,
    DefaultTableCharset,
    DefaultTableCollate,
    DefaultColumnOptions,
    DefaultIdentifierOptions,
    EmulateDatabase,
    Fetchmode,
    HydrateOverwrite,
    LoadReferences,
    CollKey,
    TableClass,
    QueryClass,
    CollectionClass,
    ModelClassPrefix,
    CascadeSaves,
    ThrowExceptions,
}

impl Attribute {
    /// Every attribute, in declaration order
    pub const ALL: [Self; 38] = [
        Self::QueryCache,
        Self::ResultCache,
        Self::QueryCacheLifespan,
        Self::ResultCacheLifespan,
        Self::Portability,
        Self::Validate,
        Self::ModelLoading,
        Self::AutoAccessorOverride,
        Self::AutoFreeQueryObjects,
        Self::AutoloadTableClasses,
        Self::UseDqlCallbacks,
        Self::UseNativeEnum,
        Self::UseNativeSet,
        Self::QuoteIdentifier,
        Self::FieldCase,
        Self::IdxnameFormat,
        Self::SeqnameFormat,
        Self::TblnameFormat,
        Self::FknameFormat,
        Self::SeqcolName,
        Self::Export,
        Self::DecimalPlaces,
        Self::DefaultTableType,
        Self::DefaultTableCharset,
        Self::DefaultTableCollate,
        Self::DefaultColumnOptions,
        Self::DefaultIdentifierOptions,
        Self::EmulateDatabase,
        Self::Fetchmode,
        Self::HydrateOverwrite,
        Self::LoadReferences,
        Self::CollKey,
        Self::TableClass,
        Self::QueryClass,
        Self::CollectionClass,
        Self::ModelClassPrefix,
        Self::CascadeSaves,
        Self::ThrowExceptions,
    ];

    /// Canonical configuration name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::QueryCache => "query_cache",
            Self::ResultCache => "result_cache",
            Self::QueryCacheLifespan => "query_cache_lifespan",
            Self::ResultCacheLifespan => "result_cache_lifespan",
            Self::Portability => "portability",
            Self::Validate => "validate",
            Self::ModelLoading => "model_loading",
            Self::AutoAccessorOverride => "auto_accessor_override",
            Self::AutoFreeQueryObjects => "auto_free_query_objects",
            Self::AutoloadTableClasses => "autoload_table_classes",
            Self::UseDqlCallbacks => "use_dql_callbacks",
            Self::UseNativeEnum => "use_native_enum",
            Self::UseNativeSet => "use_native_set",
            Self::QuoteIdentifier => "quote_identifier",
            Self::FieldCase => "field_case",
            Self::IdxnameFormat => "idxname_format",
            Self::SeqnameFormat => "seqname_format",
            Self::TblnameFormat => "tblname_format",
            Self::FknameFormat => "fkname_format",
            Self::SeqcolName => "seqcol_name",
            Self::Export => "export",
            Self::DecimalPlaces => "decimal_places",
            Self::DefaultTableType => "default_table_type",
            Self::DefaultTableCharset => "default_table_charset",
            Self::DefaultTableCollate => "default_table_collate",
            Self::DefaultColumnOptions => "default_column_options",
            Self::DefaultIdentifierOptions => "default_identifier_options",
            Self::EmulateDatabase => "emulate_database",
            Self::Fetchmode => "fetchmode",
            Self::HydrateOverwrite => "hydrate_overwrite",
            Self::LoadReferences => "load_references",
            Self::CollKey => "coll_key",
            Self::TableClass => "table_class",
            Self::QueryClass => "query_class",
            Self::CollectionClass => "collection_class",
            Self::ModelClassPrefix => "model_class_prefix",
            Self::CascadeSaves => "cascade_saves",
            Self::ThrowExceptions => "throw_exceptions",
        }
    }

    /// Whether the attribute holds a cache backend
    #[must_use]
    pub const fn is_cache_slot(&self) -> bool {
        matches!(self, Self::QueryCache | Self::ResultCache)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Named constants attribute values may refer to symbolically
const CONSTANTS: &[(&str, i64)] = &[
    ("CASE_NATURAL", 0),
    ("CASE_UPPER", 1),
    ("CASE_LOWER", 2),
    ("FETCH_LAZY", 1),
    ("FETCH_ASSOC", 2),
    ("FETCH_NUM", 3),
    ("FETCH_ARRAY", 3),
    ("FETCH_BOTH", 4),
    ("FETCH_OBJ", 5),
    ("FETCH_RECORD", 2),
    ("FETCH_COLUMN", 7),
    ("HYDRATE_RECORD", 2),
    ("HYDRATE_ARRAY", 3),
    ("HYDRATE_NONE", 4),
    ("HYDRATE_SCALAR", 5),
    ("HYDRATE_SINGLE_SCALAR", 6),
    ("HYDRATE_ON_DEMAND", 7),
    ("HYDRATE_ARRAY_HIERARCHY", 8),
    ("HYDRATE_RECORD_HIERARCHY", 9),
    ("PORTABILITY_NONE", 0),
    ("PORTABILITY_FIX_CASE", 1),
    ("PORTABILITY_RTRIM", 2),
    ("PORTABILITY_DELETE_COUNT", 4),
    ("PORTABILITY_EMPTY_TO_NULL", 8),
    ("PORTABILITY_FIX_ASSOC_FIELD_NAMES", 16),
    ("PORTABILITY_EXPR", 32),
    ("PORTABILITY_ALL", 63),
    ("VALIDATE_NONE", 0),
    ("VALIDATE_LENGTHS", 1),
    ("VALIDATE_TYPES", 2),
    ("VALIDATE_CONSTRAINTS", 4),
    ("VALIDATE_ALL", 7),
    ("VALIDATE_USER", 8),
    ("MODEL_LOADING_AGGRESSIVE", 1),
    ("MODEL_LOADING_CONSERVATIVE", 2),
    ("MODEL_LOADING_PEAR", 3),
    ("EXPORT_NONE", 0),
    ("EXPORT_TABLES", 1),
    ("EXPORT_CONSTRAINTS", 2),
    ("EXPORT_PLUGINS", 4),
    ("EXPORT_ALL", 7),
    ("IDENTIFIER_AUTOINC", 1),
    ("IDENTIFIER_SEQUENCE", 2),
    ("IDENTIFIER_NATURAL", 3),
    ("IDENTIFIER_COMPOSITE", 4),
];

/// Valid attribute names and symbolic constants
///
/// Keys are stored uppercased so lookups are case-insensitive.
#[derive(Debug, Clone)]
pub struct AttributeRegistry {
    attributes: HashMap<String, Attribute>,
    constants: HashMap<String, i64>,
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        let attributes = Attribute::ALL
            .iter()
            .map(|a| (a.as_str().to_ascii_uppercase(), *a))
            .collect();
        let constants = CONSTANTS
            .iter()
            .map(|(name, value)| ((*name).to_string(), *value))
            .collect();

        Self {
            attributes,
            constants,
        }
    }
}

impl AttributeRegistry {
    /// Register an additional name for an attribute
    #[must_use]
    pub fn with_alias(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_ascii_uppercase(), attribute);
        self
    }

    /// Register an additional named constant
    #[must_use]
    pub fn with_constant(mut self, name: &str, value: i64) -> Self {
        self.constants.insert(name.to_ascii_uppercase(), value);
        self
    }

    /// Look up an attribute by configuration key
    ///
    /// Matching is case-insensitive and accepts an `attr_` prefix.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<Attribute> {
        let upper = key.to_ascii_uppercase();
        if let Some(attribute) = self.attributes.get(&upper) {
            return Some(*attribute);
        }

        let bare = upper.strip_prefix("ATTR_")?;
        self.attributes.get(bare).copied()
    }

    /// Look up a named constant (case-insensitive)
    #[must_use]
    pub fn constant(&self, name: &str) -> Option<i64> {
        self.constants.get(&name.to_ascii_uppercase()).copied()
    }
}

/// A resolved attribute value as handed to the ORM
#[derive(Debug, Clone)]
pub enum AttributeSetting {
    /// Symbolic constant substituted for a string value
    Constant { name: String, value: i64 },
    /// String value with no matching constant
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Structured value passed through unchanged
    Map(Map<String, Value>),
    /// Cache backend built from a descriptor
    Cache(Arc<dyn Cache>),
}

impl PartialEq for AttributeSetting {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Self::Constant { name: a, value: x },
                Self::Constant { name: b, value: y },
            ) => a == b && x == y,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            // Two caches are the same setting when built from the same descriptor
            (Self::Cache(a), Self::Cache(b)) => {
                a.class_name() == b.class_name() && a.options() == b.options()
            }
            _ => false,
        }
    }
}

impl AttributeSetting {
    /// JSON rendering used in summaries and CLI output
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Constant { value, .. } | Self::Integer(value) => Value::from(*value),
            Self::Text(s) => Value::from(s.as_str()),
            Self::Float(f) => Value::from(*f),
            Self::Bool(b) => Value::from(*b),
            Self::Map(m) => Value::Object(m.clone()),
            Self::Cache(cache) => serde_json::json!({
                "class": cache.class_name(),
                "options": cache.options(),
            }),
        }
    }
}

/// Apply every attribute in `attributes` to `target`, in order
///
/// The first failing attribute aborts; attributes set before it stay set.
pub fn apply_attributes<T: Configurable + ?Sized>(
    target: &mut T,
    attributes: &Map<String, Value>,
    registry: &AttributeRegistry,
    types: &TypeRegistry,
) -> Result<()> {
    for (key, value) in attributes {
        let attribute = registry
            .lookup(key)
            .ok_or_else(|| ConfigError::unknown_attribute(key.to_ascii_uppercase()))?;

        let setting = resolve_setting(attribute, value, registry, types)?;
        tracing::debug!(target_name = target.name(), %attribute, "setting attribute");
        target.set_attribute(attribute, setting);
    }

    Ok(())
}

/// Resolve the value of a single attribute
pub fn resolve_setting(
    attribute: Attribute,
    value: &Value,
    registry: &AttributeRegistry,
    types: &TypeRegistry,
) -> Result<AttributeSetting> {
    if attribute.is_cache_slot() {
        return build_cache(attribute, value, types).map(AttributeSetting::Cache);
    }

    match value {
        Value::String(s) => Ok(match registry.constant(s) {
            Some(constant) => AttributeSetting::Constant {
                name: s.to_ascii_uppercase(),
                value: constant,
            },
            None => AttributeSetting::Text(s.clone()),
        }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(AttributeSetting::Integer(i))
            } else if let Some(f) = n.as_f64() {
                Ok(AttributeSetting::Float(f))
            } else {
                Err(ConfigError::invalid_attribute_value(
                    attribute.as_str(),
                    format!("number {n} is out of range"),
                ))
            }
        }
        Value::Bool(b) => Ok(AttributeSetting::Bool(*b)),
        Value::Object(map) => Ok(AttributeSetting::Map(map.clone())),
        Value::Null => Err(ConfigError::invalid_attribute_value(
            attribute.as_str(),
            "value must not be null",
        )),
        Value::Array(_) => Err(ConfigError::invalid_attribute_value(
            attribute.as_str(),
            "lists are not supported, use a mapping",
        )),
    }
}

/// Build a cache from a `{ class, options }` descriptor
fn build_cache(
    attribute: Attribute,
    value: &Value,
    types: &TypeRegistry,
) -> Result<Arc<dyn Cache>> {
    let Value::Object(descriptor) = value else {
        return Err(ConfigError::invalid_attribute_value(
            attribute.as_str(),
            "cache attributes take a mapping with 'class' and 'options'",
        ));
    };

    let class = match descriptor.get("class") {
        None | Some(Value::Null) => {
            return Err(ConfigError::missing_cache_class(attribute.as_str()));
        }
        Some(Value::String(class)) => class,
        Some(_) => {
            return Err(ConfigError::invalid_attribute_value(
                attribute.as_str(),
                "cache class must be a string",
            ));
        }
    };

    let constructor = types
        .resolve_cache(class)
        .ok_or_else(|| ConfigError::unresolved_cache_class(class))?;

    let empty = Map::new();
    let options = match descriptor.get("options") {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(options)) => options,
        Some(_) => {
            return Err(ConfigError::invalid_attribute_value(
                attribute.as_str(),
                "cache options must be a mapping",
            ));
        }
    };

    constructor(options)
        .map_err(|detail| ConfigError::invalid_attribute_value(attribute.as_str(), detail))
}

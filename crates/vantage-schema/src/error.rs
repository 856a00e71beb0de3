/// Errors that can occur while parsing a payload against a schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The parse base starts at or past the end of the payload.
    ///
    /// Individual reads past the end resolve to null; a base offset beyond
    /// the buffer means the caller handed the wrong payload entirely.
    #[error("payload too short for schema ({len} bytes, parse base {base})")]
    MalformedData { base: usize, len: usize },

    /// A copy-of source does not name a field at its nesting level.
    #[error("copy-of source '{0}' does not resolve at its nesting level")]
    UnresolvedCopy(String),

    /// A dependency does not name a property at its nesting level.
    #[error("dependency '{0}' does not resolve at its nesting level")]
    UnresolvedDependency(String),

    /// A numeric transform was applied to a non-numeric value.
    ///
    /// Only reachable through a schema bug: transforms run after earlier
    /// pipeline stages already produced a widened value.
    #[error("transform {transform} cannot be applied to {value}")]
    BadTransform { transform: String, value: String },

    /// A parser fault, annotated with the path of the offending property.
    #[error("failed to parse '{path}': {source}")]
    Parser {
        path: String,
        #[source]
        source: Box<SchemaError>,
    },
}

impl SchemaError {
    /// Annotate an error with the property path segment it occurred under.
    ///
    /// Nested annotations accumulate into a dotted path.
    pub(crate) fn at(self, segment: &str) -> Self {
        match self {
            SchemaError::Parser { path, source } => SchemaError::Parser {
                path: format!("{segment}.{path}"),
                source,
            },
            other => SchemaError::Parser {
                path: segment.to_string(),
                source: Box::new(other),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, SchemaError>;

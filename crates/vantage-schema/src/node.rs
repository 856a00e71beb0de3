use crate::transform::Transform;

/// Wire encoding of a primitive field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    U8,
    U16Le,
    U16Be,
    U32Le,
    U32Be,
    I8,
    I16Le,
    I16Be,
    I32Le,
    I32Be,
    /// A single bit. The field position's integer part selects the byte,
    /// the fractional part (×8, rounded) the bit index, MSB-first.
    Bit,
}

impl PrimitiveKind {
    /// Bytes occupied on the wire. A bit field occupies its byte.
    pub fn size(self) -> usize {
        match self {
            PrimitiveKind::U8 | PrimitiveKind::I8 | PrimitiveKind::Bit => 1,
            PrimitiveKind::U16Le
            | PrimitiveKind::U16Be
            | PrimitiveKind::I16Le
            | PrimitiveKind::I16Be => 2,
            PrimitiveKind::U32Le
            | PrimitiveKind::U32Be
            | PrimitiveKind::I32Le
            | PrimitiveKind::I32Be => 4,
        }
    }
}

/// A primitive read at a position, with its value pipeline.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub kind: PrimitiveKind,
    /// Byte offset relative to the parse base. Only [`PrimitiveKind::Bit`]
    /// fields carry a fractional part.
    pub position: f64,
    /// Raw values the console uses to mean "no reading".
    pub nullables: Vec<i64>,
    /// Unit transforms, applied left-to-right to non-null values.
    pub transform: Vec<Transform>,
    /// Sibling whose null-ness forces this field to null.
    pub depends_on: Option<String>,
}

impl FieldSpec {
    pub fn new(kind: PrimitiveKind, position: f64) -> Self {
        Self {
            kind,
            position,
            nullables: Vec::new(),
            transform: Vec::new(),
            depends_on: None,
        }
    }

    pub fn u8(position: f64) -> Self {
        Self::new(PrimitiveKind::U8, position)
    }

    pub fn i8(position: f64) -> Self {
        Self::new(PrimitiveKind::I8, position)
    }

    pub fn u16(position: f64) -> Self {
        Self::new(PrimitiveKind::U16Le, position)
    }

    pub fn i16(position: f64) -> Self {
        Self::new(PrimitiveKind::I16Le, position)
    }

    pub fn u32(position: f64) -> Self {
        Self::new(PrimitiveKind::U32Le, position)
    }

    pub fn bit(position: f64) -> Self {
        Self::new(PrimitiveKind::Bit, position)
    }

    /// Add a raw sentinel that parses to null.
    pub fn nullable(mut self, raw: i64) -> Self {
        self.nullables.push(raw);
        self
    }

    /// Add several raw sentinels at once.
    pub fn nullables(mut self, raws: &[i64]) -> Self {
        self.nullables.extend_from_slice(raws);
        self
    }

    /// Append a transform to the pipeline.
    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform.push(transform);
        self
    }

    /// Null this field whenever the named sibling resolves to null.
    pub fn depends_on(mut self, sibling: impl Into<String>) -> Self {
        self.depends_on = Some(sibling.into());
        self
    }
}

/// Adopt a sibling field's raw value, then run an own pipeline over it.
#[derive(Debug, Clone)]
pub struct CopySpec {
    /// Sibling field to copy the pre-transform raw value from.
    pub source: String,
    pub nullables: Vec<i64>,
    pub transform: Vec<Transform>,
    pub depends_on: Option<String>,
}

impl CopySpec {
    pub fn of(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            nullables: Vec::new(),
            transform: Vec::new(),
            depends_on: None,
        }
    }

    pub fn nullable(mut self, raw: i64) -> Self {
        self.nullables.push(raw);
        self
    }

    pub fn transform(mut self, transform: Transform) -> Self {
        self.transform.push(transform);
        self
    }

    pub fn depends_on(mut self, sibling: impl Into<String>) -> Self {
        self.depends_on = Some(sibling.into());
        self
    }
}

/// How array entries advance through the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// Each repeated field advances by `size_of(kind) * index` from its own
    /// position. Matches record layouts grouped by field (all day-lows,
    /// then all day-highs, …).
    PropertyBased,
    /// The whole element's base advances by `stride * index`. Matches
    /// record layouts grouped by entry.
    EntryBased { stride: usize },
}

/// One node of a schema tree.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Field(FieldSpec),
    CopyOf(CopySpec),
    Array {
        element: Box<SchemaNode>,
        length: usize,
        kind: ArrayKind,
    },
    Object(Schema),
}

/// An ordered mapping of property names to schema nodes.
///
/// Order is the parse order and the order of the resulting record.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<(String, SchemaNode)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primitive field.
    pub fn field(self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.node(name, SchemaNode::Field(spec))
    }

    /// Append a copy-of property.
    pub fn copy(self, name: impl Into<String>, spec: CopySpec) -> Self {
        self.node(name, SchemaNode::CopyOf(spec))
    }

    /// Append a repeated element.
    pub fn array(
        self,
        name: impl Into<String>,
        element: SchemaNode,
        length: usize,
        kind: ArrayKind,
    ) -> Self {
        self.node(
            name,
            SchemaNode::Array {
                element: Box::new(element),
                length,
                kind,
            },
        )
    }

    /// Append a nested record.
    pub fn object(self, name: impl Into<String>, schema: Schema) -> Self {
        self.node(name, SchemaNode::Object(schema))
    }

    /// Append an arbitrary node.
    pub fn node(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.entries.push((name.into(), node));
        self
    }

    /// Properties in declaration order.
    pub fn entries(&self) -> &[(String, SchemaNode)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_sizes() {
        assert_eq!(PrimitiveKind::U8.size(), 1);
        assert_eq!(PrimitiveKind::I8.size(), 1);
        assert_eq!(PrimitiveKind::Bit.size(), 1);
        assert_eq!(PrimitiveKind::U16Le.size(), 2);
        assert_eq!(PrimitiveKind::I16Be.size(), 2);
        assert_eq!(PrimitiveKind::U32Be.size(), 4);
        assert_eq!(PrimitiveKind::I32Le.size(), 4);
    }

    #[test]
    fn builder_preserves_declaration_order() {
        let schema = Schema::new()
            .field("b", FieldSpec::u8(1.0))
            .field("a", FieldSpec::u8(0.0))
            .object("nested", Schema::new().field("x", FieldSpec::u16(2.0)));

        let names: Vec<&str> = schema.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["b", "a", "nested"]);
    }

    #[test]
    fn field_spec_builder_accumulates_pipeline() {
        let spec = FieldSpec::i16(12.0)
            .nullable(32767)
            .nullables(&[-32768])
            .transform(Transform::Scale(0.1))
            .depends_on("other");

        assert_eq!(spec.nullables, vec![32767, -32768]);
        assert_eq!(spec.transform.len(), 1);
        assert_eq!(spec.depends_on.as_deref(), Some("other"));
    }
}

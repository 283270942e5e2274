use super::{ByteBuffer, Type, Value, error::ProtocolError};

/// A named, documented slot in a [`Schema`](super::Schema).
///
/// Fields are built unattached. [`Schema::new`](super::Schema::new) makes its
/// own copy of every field and stamps it with its slot; that copy is the only
/// kind that can read or write.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    index: Option<usize>,
    name: String,
    ty: Type,
    doc: String,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Type, doc: impl Into<String>) -> Self {
        Self {
            index: None,
            name: name.into(),
            ty,
            doc: doc.into(),
        }
    }

    pub(super) fn attach(self, index: usize) -> Self {
        Self {
            index: Some(index),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Slot inside the owning schema, `None` while unattached.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    fn assert_attached(&self) {
        assert!(
            self.index.is_some(),
            "field '{}' is not attached to a schema",
            self.name
        );
    }

    /// # Panics
    /// If the field was never adopted by a schema.
    pub fn slot(&self) -> usize {
        match self.index {
            Some(index) => index,
            None => panic!("field '{}' is not attached to a schema", self.name),
        }
    }

    pub fn read<'a>(&'a self, buffer: &mut ByteBuffer) -> Result<Value<'a>, ProtocolError> {
        self.assert_attached();
        self.ty.read(buffer)
    }

    pub fn write(&self, buffer: &mut ByteBuffer, value: &Value<'_>) -> Result<(), ProtocolError> {
        self.assert_attached();
        self.ty.write(buffer, value)
    }
}

use crate::types::schema::Schema;

/// Chain of enclosing query contexts.
///
/// Rows evaluated under a scope are the scope row (outermost frame first)
/// followed by the local row, so column indices for local columns are offset
/// by the total scope width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    /// Frames, outermost first.
    frames: Vec<Schema>,
}

impl Scope {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a new scope with `schema` as the innermost frame.
    pub fn nested(&self, schema: Schema) -> Scope {
        let mut frames = self.frames.clone();
        frames.push(schema);
        Scope { frames }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total number of columns across all frames.
    pub fn width(&self) -> usize {
        self.frames.iter().map(|f| f.len()).sum()
    }

    /// Iterate frames innermost first, along with the offset of the frame in
    /// the scope row.
    pub fn frames_innermost_first(&self) -> impl Iterator<Item = (usize, &Schema)> {
        let mut offset = self.width();
        self.frames.iter().rev().map(move |frame| {
            offset -= frame.len();
            (offset, frame)
        })
    }

    /// All frames concatenated, outermost first.
    pub fn schema(&self) -> Schema {
        Schema::merge(self.frames.iter().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::datatype::DataType;
    use crate::types::schema::Column;

    fn frame(names: &[&str]) -> Schema {
        names
            .iter()
            .map(|n| Column::new(*n, DataType::Int32, false))
            .collect()
    }

    #[test]
    fn offsets_innermost_first() {
        let scope = Scope::empty()
            .nested(frame(&["a", "b"]))
            .nested(frame(&["c"]))
            .nested(frame(&["d", "e", "f"]));

        assert_eq!(6, scope.width());
        let offsets: Vec<_> = scope
            .frames_innermost_first()
            .map(|(offset, schema)| (offset, schema.len()))
            .collect();
        assert_eq!(vec![(3, 3), (2, 1), (0, 2)], offsets);
    }
}

//! Named field tables.
//!
//! A [`Layout`] maps field ids to human-readable names, sorted by id, and
//! can emit the table as source-code constants so that generated gameplay
//! code and the kernel agree on cell indices.

use indexmap::IndexMap;

use crate::id::FieldId;

/// Sorted `FieldId -> name` table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Layout {
    fields: IndexMap<FieldId, String>,
}

impl Layout {
    /// Longest stored name, in bytes. Longer names are truncated.
    pub const MAX_NAME_LEN: usize = 40;

    /// An empty layout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field. If `id` is already present the call does nothing.
    pub fn add_field(&mut self, id: FieldId, name: &str) {
        if self.fields.contains_key(&id) {
            return;
        }
        self.fields.insert_sorted(id, truncate(name, Self::MAX_NAME_LEN).to_owned());
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the layout has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Cell index of `id`.
    pub fn index_of(&self, id: FieldId) -> Option<usize> {
        self.fields.get_index_of(&id)
    }

    /// Name of `id`.
    pub fn name_of(&self, id: FieldId) -> Option<&str> {
        self.fields.get(&id).map(String::as_str)
    }

    /// Field ids in index order.
    pub fn field_ids(&self) -> impl Iterator<Item = FieldId> + '_ {
        self.fields.keys().copied()
    }

    /// Emit one `<indent><prefix><name> = <index in hex><delim>` line per
    /// field, in index order.
    pub fn codegen(&self, indent: usize, prefix: &str, delim: &str) -> String {
        let pad = " ".repeat(indent);
        self.fields
            .values()
            .enumerate()
            .map(|(index, name)| format!("{pad}{prefix}{name} = {index:x}{delim}"))
            .collect()
    }
}

fn truncate(name: &str, max: usize) -> &str {
    if name.len() <= max {
        return name;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_sorted_by_id() {
        let mut layout = Layout::new();
        layout.add_field(FieldId(3), "speed");
        layout.add_field(FieldId(1), "x");
        layout.add_field(FieldId(2), "y");
        assert_eq!(layout.index_of(FieldId(1)), Some(0));
        assert_eq!(layout.index_of(FieldId(3)), Some(2));
        assert_eq!(layout.index_of(FieldId(9)), None);
    }

    #[test]
    fn first_name_wins() {
        let mut layout = Layout::new();
        layout.add_field(FieldId(1), "x");
        layout.add_field(FieldId(1), "other");
        assert_eq!(layout.len(), 1);
        assert_eq!(layout.name_of(FieldId(1)), Some("x"));
    }

    #[test]
    fn long_names_are_truncated() {
        let mut layout = Layout::new();
        layout.add_field(FieldId(0), &"n".repeat(100));
        assert_eq!(layout.name_of(FieldId(0)).map(str::len), Some(Layout::MAX_NAME_LEN));
    }

    #[test]
    fn codegen_emits_hex_indices() {
        let mut layout = Layout::new();
        for i in 0..12u32 {
            layout.add_field(FieldId(i), &format!("f{i}"));
        }
        let code = layout.codegen(2, "VALUE_", ",\n");
        let lines: Vec<&str> = code.lines().collect();
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "  VALUE_f0 = 0,");
        assert_eq!(lines[11], "  VALUE_f11 = b,");
    }

    #[test]
    fn empty_layout_generates_nothing() {
        assert!(Layout::new().codegen(4, "x", ";").is_empty());
    }
}

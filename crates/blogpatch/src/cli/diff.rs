//! `blogpatch diff`: classify one change offline and print the result.

use std::path::Path;

use blogpatch_core::classify::{FieldClassification, classify_field};
use blogpatch_core::document::FieldShape;
use blogpatch_core::error::{PatchError, Result};
use blogpatch_core::operation::EditOperation;
use blogpatch_core::Field;

pub fn handle_diff(old: &str, new: &str, field: &str, files: bool) -> Result<()> {
    let field: Field = field.parse()?;
    if !matches!(field.shape(), FieldShape::Plain | FieldShape::Paragraph) {
        return Err(PatchError::InvalidOperation(format!(
            "'{}' is sent whole; diff works on text fields",
            field
        )));
    }

    let (old, new) = if files {
        (read_value(Path::new(old))?, read_value(Path::new(new))?)
    } else {
        (old.to_string(), new.to_string())
    };

    for line in render(field, &old, &new)? {
        println!("{}", line);
    }
    Ok(())
}

fn read_value(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| PatchError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// One JSON frame per operation, or the single word `fallback`.
fn render(field: Field, old: &str, new: &str) -> Result<Vec<String>> {
    match classify_field(field, old, new) {
        FieldClassification::Fallback => Ok(vec!["fallback".to_string()]),
        FieldClassification::Operations(ops) => ops
            .iter()
            .map(EditOperation::to_message)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_tail_append() {
        let lines = render(Field::Title, "Hello", "Hello world").unwrap();
        assert_eq!(lines.len(), 1);
        let op = EditOperation::from_message(&lines[0]).unwrap();
        assert_eq!(op.operate_type_code.code(), 1);
        assert_eq!(op.content_change.as_deref(), Some(" world"));
    }

    #[test]
    fn test_render_paragraph_operations() {
        let lines = render(Field::Content, "aa\n\nbb", "aa!\n\nbb?").unwrap();
        assert_eq!(lines.len(), 2);
        for line in &lines {
            let op = EditOperation::from_message(line).unwrap();
            assert!(op.operate_type_code.is_paragraph());
        }
    }

    #[test]
    fn test_render_fallback() {
        let lines = render(Field::Content, "one two", "one\n\ntwo").unwrap();
        assert_eq!(lines, vec!["fallback".to_string()]);
    }

    #[test]
    fn test_rejects_whole_fields() {
        assert!(handle_diff("1", "2", "status", false).is_err());
        assert!(handle_diff("a", "b", "body", false).is_err());
    }

    #[test]
    fn test_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let old = dir.path().join("old.md");
        let new = dir.path().join("new.md");
        std::fs::write(&old, "draft").unwrap();
        std::fs::write(&new, "draft two").unwrap();
        assert!(handle_diff(
            old.to_str().unwrap(),
            new.to_str().unwrap(),
            "content",
            true
        )
        .is_ok());
        assert!(matches!(
            handle_diff("/nonexistent/a", "/nonexistent/b", "content", true),
            Err(PatchError::FileRead { .. })
        ));
    }
}

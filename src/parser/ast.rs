// Records extracted from parsed source files
//
// These carry just enough of each class and method to build prompts.
// They are serializable so `docscribe extract` can dump them as JSON.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A class found in a source file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassRecord {
    pub name: String,
    /// Raw doc-comment text, empty if the class has none
    pub doc_comment: String,
    /// Enclosing namespace, if declared
    pub namespace: Option<String>,
    /// Methods in declaration order
    pub methods: Vec<MethodRecord>,
    /// File the class was found in
    pub file: PathBuf,
    pub line_start: usize,
    pub line_end: usize,
}

impl ClassRecord {
    pub fn new(name: impl Into<String>, line_start: usize) -> Self {
        Self {
            name: name.into(),
            doc_comment: String::new(),
            namespace: None,
            methods: Vec::new(),
            file: PathBuf::new(),
            line_start,
            line_end: line_start,
        }
    }
}

/// A method declared directly inside a class body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MethodRecord {
    pub name: String,
    pub doc_comment: String,
    /// Verbatim source lines `line_start..=line_end`
    pub body: String,
    pub line_start: usize,
    pub line_end: usize,
}

impl MethodRecord {
    pub fn new(name: impl Into<String>, line_start: usize) -> Self {
        Self {
            name: name.into(),
            doc_comment: String::new(),
            body: String::new(),
            line_start,
            line_end: line_start,
        }
    }
}

/// A file that yielded no classes because it could not be read or parsed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParseFailure {
    pub path: PathBuf,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_record_new() {
        let class = ClassRecord::new("Foo", 3);
        assert_eq!(class.name, "Foo");
        assert_eq!(class.line_start, 3);
        assert_eq!(class.line_end, 3);
        assert!(class.methods.is_empty());
        assert!(class.doc_comment.is_empty());
    }

    #[test]
    fn test_class_record_serializes() {
        let mut class = ClassRecord::new("Foo", 1);
        class.doc_comment = "/** Foo class */".to_string();
        let mut method = MethodRecord::new("bar", 2);
        method.body = "    public function bar() { return 1; }\n".to_string();
        class.methods.push(method);

        let json = serde_json::to_string(&class).unwrap();
        assert!(json.contains("\"name\":\"Foo\""));
        assert!(json.contains("\"doc_comment\":\"/** Foo class */\""));
        assert!(json.contains("\"name\":\"bar\""));
    }
}

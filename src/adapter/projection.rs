//! Suite/case projection
//!
//! Maps the raw discovered tree and raw failure records into the shape the
//! host consumes. This is the only place raw 1-based source lines are
//! shifted to the editor's 0-based convention; applying the shift anywhere
//! else reintroduces the historical off-by-one regressions, so tests pin
//! exact line values.

use serde::Serialize;

use crate::protocol::{TestFailure, TestNode};

/// Reserved identifier of the synthetic root suite, accepted by the run
/// entry point to mean "run everything". Never a legal runner test name.
pub const ROOT_SUITE_ID: &str = "*";

/// A projected tree entry: a suite or a leaf test
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TestItem {
    Suite(SuiteInfo),
    Test(TestInfo),
}

/// A named group of tests and subsuites
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteInfo {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// 0-based editor line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub children: Vec<TestItem>,
}

/// A leaf test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestInfo {
    pub id: String,
    pub label: String,
    pub file: String,
    /// 0-based editor line
    pub line: u32,
}

/// A source-location marker attached to a failed test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decoration {
    pub file: String,
    /// 0-based editor line
    pub line: u32,
    pub message: String,
}

/// Convert a raw 1-based source line to the editor's 0-based convention
pub fn editor_line(raw: u32) -> u32 {
    raw.saturating_sub(1)
}

/// Wrap the top-level discovered nodes in the synthetic root suite
pub fn project_tree(label: &str, nodes: Vec<TestNode>) -> SuiteInfo {
    SuiteInfo {
        id: ROOT_SUITE_ID.to_string(),
        label: label.to_string(),
        file: None,
        line: None,
        children: nodes.into_iter().map(project_node).collect(),
    }
}

/// Project one discovered node: a `children` field (even empty) makes a
/// suite, its absence a leaf test
pub fn project_node(node: TestNode) -> TestItem {
    match node.children {
        Some(children) => TestItem::Suite(SuiteInfo {
            id: node.name.clone(),
            label: node.name,
            file: Some(node.file),
            line: Some(editor_line(node.line)),
            children: children.into_iter().map(project_node).collect(),
        }),
        None => TestItem::Test(TestInfo {
            id: node.name.clone(),
            label: node.name,
            file: node.file,
            line: editor_line(node.line),
        }),
    }
}

/// Project one buffered failure onto an editor decoration
pub fn decorate(failure: &TestFailure) -> Decoration {
    Decoration {
        file: failure.file.clone(),
        line: editor_line(failure.line),
        message: failure.render(),
    }
}

/// Concatenated human-readable message for a failed test, one line per
/// buffered failure
pub fn failure_message(failures: &[TestFailure]) -> String {
    failures
        .iter()
        .map(TestFailure::render)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_projection_pins_zero_based_lines() {
        let node: TestNode = serde_json::from_value(json!({
            "name": "Root", "file": "f.c", "line": 3,
            "children": [{"name": "t1", "file": "f.c", "line": 5}]
        }))
        .unwrap();

        let root = project_tree("suite", vec![node]);
        assert_eq!(root.id, ROOT_SUITE_ID);
        assert_eq!(root.children.len(), 1);

        let suite = match &root.children[0] {
            TestItem::Suite(s) => s,
            other => panic!("expected suite, got {other:?}"),
        };
        assert_eq!(suite.id, "Root");
        assert_eq!(suite.line, Some(2));

        let test = match &suite.children[0] {
            TestItem::Test(t) => t,
            other => panic!("expected test, got {other:?}"),
        };
        assert_eq!(test.id, "t1");
        assert_eq!(test.file, "f.c");
        assert_eq!(test.line, 4);
    }

    #[test]
    fn test_empty_children_is_a_suite() {
        let node: TestNode = serde_json::from_value(
            json!({"name": "Empty", "file": "f.c", "line": 1, "children": []}),
        )
        .unwrap();
        assert!(matches!(project_node(node), TestItem::Suite(_)));
    }

    #[test]
    fn test_line_one_projects_to_zero() {
        assert_eq!(editor_line(1), 0);
        // Raw lines are 1-based; 0 must not underflow
        assert_eq!(editor_line(0), 0);
    }

    #[test]
    fn test_decoration_line_and_message() {
        let failure = TestFailure {
            file: "f.c".to_string(),
            line: 10,
            kind: "ASSERT".to_string(),
            test: "c1".to_string(),
            msg: Some("x!=y".to_string()),
        };

        let decoration = decorate(&failure);
        assert_eq!(decoration.line, 9);
        assert_eq!(decoration.message, "f.c:10 - [ASSERT] c1 | x!=y");
    }

    #[test]
    fn test_failure_message_one_line_per_failure() {
        let failures = vec![
            TestFailure {
                file: "f.c".to_string(),
                line: 10,
                kind: "ASSERT".to_string(),
                test: "c1".to_string(),
                msg: Some("x!=y".to_string()),
            },
            TestFailure {
                file: "g.c".to_string(),
                line: 4,
                kind: "CHECK".to_string(),
                test: "c1".to_string(),
                msg: None,
            },
        ];

        assert_eq!(
            failure_message(&failures),
            "f.c:10 - [ASSERT] c1 | x!=y\ng.c:4 - [CHECK] c1"
        );
    }
}

//! Test discovery protocol
//!
//! Runs the test binary in list mode and decodes its standard output as a
//! concatenation of `TestNode` documents, collected as top-level siblings.
//! A single root-tree document (the older protocol revision) is just the
//! one-sibling case, so both revisions parse. Discovery resolves when the
//! process exits, regardless of exit code; the stream must have settled
//! cleanly and produced at least one node.

use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;

use crate::common::{Error, Result, RunSpec};
use crate::process::{split_args, TestProcess};
use crate::stream::JsonStreamDecoder;

/// One node of the discovered test tree.
///
/// Absence of `children` marks a leaf case; presence (even empty) marks a
/// suite. Names are unique among siblings and are the node's identity for
/// host purposes. `line` is 1-based on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestNode {
    pub name: String,
    pub file: String,
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TestNode>>,
}

/// Discover the test tree exposed by the configured runner
pub async fn discover(spec: &RunSpec) -> Result<Vec<TestNode>> {
    let args = split_args(&spec.load_args)?;
    let mut process = TestProcess::spawn(&spec.executable, &args, &spec.cwd)?;
    let mut stdout = process
        .take_stdout()
        .ok_or_else(|| Error::launch(spec.executable.display(), "no stdout pipe"))?;

    let mut decoder = JsonStreamDecoder::new();
    let mut values = Vec::new();
    let mut buf = [0u8; 8192];

    let stream_result: Result<()> = loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break Ok(()),
            Ok(n) => match decoder.push(&buf[..n]) {
                Ok(decoded) => values.extend(decoded),
                Err(e) => break Err(e),
            },
            Err(e) => break Err(e.into()),
        }
    };

    // A runner still writing after a stream error would block on the full
    // pipe and never exit on its own.
    if stream_result.is_err() {
        process.terminate();
    }
    let exit_code = process.wait().await?;
    tracing::debug!(?exit_code, nodes = values.len(), "Discovery stream ended");

    stream_result.map_err(Error::discovery)?;
    decoder.finish().map_err(Error::discovery)?;

    if values.is_empty() {
        return Err(Error::discovery("the runner produced no test list"));
    }

    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(Error::discovery))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_leaf_vs_suite() {
        let leaf: TestNode =
            serde_json::from_value(json!({"name": "t1", "file": "f.c", "line": 5})).unwrap();
        assert!(leaf.children.is_none());

        let suite: TestNode = serde_json::from_value(
            json!({"name": "S", "file": "f.c", "line": 1, "children": []}),
        )
        .unwrap();
        assert_eq!(suite.children, Some(vec![]));
    }

    #[test]
    fn test_nested_tree_document() {
        let node: TestNode = serde_json::from_value(json!({
            "name": "Root", "file": "f.c", "line": 3,
            "children": [{"name": "t1", "file": "f.c", "line": 5}]
        }))
        .unwrap();

        let children = node.children.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "t1");
        assert_eq!(children[0].line, 5);
    }
}

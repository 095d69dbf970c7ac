//! Lifecycle event wire types
//!
//! During a run the test binary reports one JSON document per transition,
//! discriminated by the `hook` field. Ordering in the stream is
//! significant: the execution protocol delivers events exactly in arrival
//! order.

use serde::{Deserialize, Deserializer};

/// One record describing a transition in the execution of a suite or case
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "hook")]
pub enum LifecycleEvent {
    /// An assertion (or other check) failed inside the current case
    #[serde(rename = "FAILURE")]
    Failure {
        file: String,
        /// 1-based source line of the failing check
        line: u32,
        #[serde(rename = "type")]
        kind: String,
        test: String,
        #[serde(default)]
        msg: Option<String>,
    },

    /// A suite started running
    #[serde(rename = "SUITE_ENTER")]
    #[serde(rename_all = "camelCase")]
    SuiteEnter { suite_name: String, nb: u32 },

    /// A suite finished
    #[serde(rename = "SUITE_LEAVE")]
    #[serde(rename_all = "camelCase")]
    SuiteLeave {
        suite_name: String,
        nb: u32,
        #[serde(deserialize_with = "de_flag")]
        fail: bool,
    },

    /// A case started running
    #[serde(rename = "CASE_ENTER")]
    #[serde(rename_all = "camelCase")]
    CaseEnter { test_name: String },

    /// A case finished
    #[serde(rename = "CASE_LEAVE")]
    #[serde(rename_all = "camelCase")]
    CaseLeave {
        test_name: String,
        #[serde(deserialize_with = "de_flag")]
        fail: bool,
    },
}

/// Runners emit failure flags as 0/1 integers; older revisions used
/// booleans. Accept both.
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    struct FlagVisitor;

    impl serde::de::Visitor<'_> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a boolean or a 0/1 integer")
        }

        fn visit_bool<E: serde::de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v != 0)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v != 0)
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> LifecycleEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_failure_event() {
        let event = parse(
            r#"{"hook":"FAILURE","file":"f.c","line":10,"type":"ASSERT","test":"c1","msg":"x!=y"}"#,
        );
        assert_eq!(
            event,
            LifecycleEvent::Failure {
                file: "f.c".to_string(),
                line: 10,
                kind: "ASSERT".to_string(),
                test: "c1".to_string(),
                msg: Some("x!=y".to_string()),
            }
        );
    }

    #[test]
    fn test_failure_without_msg() {
        let event =
            parse(r#"{"hook":"FAILURE","file":"f.c","line":7,"type":"CHECK","test":"c2"}"#);
        assert!(matches!(event, LifecycleEvent::Failure { msg: None, .. }));
    }

    #[test]
    fn test_suite_and_case_events() {
        assert_eq!(
            parse(r#"{"hook":"SUITE_ENTER","suiteName":"S","nb":2}"#),
            LifecycleEvent::SuiteEnter {
                suite_name: "S".to_string(),
                nb: 2
            }
        );
        assert_eq!(
            parse(r#"{"hook":"CASE_LEAVE","testName":"c1","fail":0}"#),
            LifecycleEvent::CaseLeave {
                test_name: "c1".to_string(),
                fail: false
            }
        );
    }

    #[test]
    fn test_fail_flag_accepts_int_and_bool() {
        let int_form = parse(r#"{"hook":"SUITE_LEAVE","suiteName":"S","nb":1,"fail":1}"#);
        let bool_form = parse(r#"{"hook":"SUITE_LEAVE","suiteName":"S","nb":1,"fail":true}"#);
        assert_eq!(int_form, bool_form);
    }

    #[test]
    fn test_unknown_hook_is_an_error() {
        let result: Result<LifecycleEvent, _> =
            serde_json::from_str(r#"{"hook":"NOPE","testName":"c1"}"#);
        assert!(result.is_err());
    }
}

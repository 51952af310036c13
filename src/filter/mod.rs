//! Filter evaluator
//!
//! Decides whether a torrent belongs in the result. Built-in flags are
//! turned into expression fragments and appended to the user's expressions;
//! a torrent matches when every expression evaluates to `true`. With no
//! expressions at all, everything matches.
//!
//! Bindings available to expressions:
//!
//! | name | type | meaning |
//! |---|---|---|
//! | `complete`, `incomplete` | bool | nothing / something left to download |
//! | `size` | int | bytes when done |
//! | `trackers` | array | tracker hostnames |
//! | `tracker` | string | short tracker name |
//! | `up`, `down` | int | current rates in bytes/s |
//! | `age` | int | seconds since added or finished |
//! | `downloadDir` | string | download directory |
//! | `priority` | string | `low`, `normal` or `high` |
//! | `status` | string | status text |
//! | `name` | string | torrent name |
//! | `error` | string | daemon error text, empty when none |

pub mod error;

pub use error::FilterError;

use tracing::debug;

use crate::expr::{Engine, Environment, ExpressionEngine, Value};
use crate::rpc::Torrent;
use crate::torrent::{Derived, tracker_hosts};

/// Filter settings as given on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Free-text expressions, all of which must hold
    pub expressions: Vec<String>,
    /// Only torrents with something left to download
    pub incomplete: bool,
    /// Only torrents whose short tracker name contains this text
    pub tracker: Option<String>,
}

impl FilterOptions {
    /// User expressions followed by the fragments for the built-in flags
    #[must_use]
    pub fn expressions(&self) -> Vec<String> {
        let mut all = self.expressions.clone();
        if self.incomplete {
            all.push("incomplete".to_string());
        }
        if let Some(tracker) = &self.tracker {
            all.push(format!("tracker ~ \"{}\"", quote(&regex::escape(tracker))));
        }
        all
    }
}

/// Escape `text` for use inside a double-quoted expression string
fn quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// RPC fields each binding is computed from
fn fields_for(variable: &str) -> &'static [&'static str] {
    match variable {
        "complete" | "incomplete" => &["leftUntilDone"],
        "size" => &["sizeWhenDone"],
        "trackers" | "tracker" => &["trackers"],
        "up" => &["rateUpload", "status"],
        "down" => &["rateDownload", "status"],
        "age" => &["addedDate", "doneDate"],
        "downloadDir" => &["downloadDir"],
        "priority" => &["bandwidthPriority"],
        "status" => &["status"],
        "name" => &["name"],
        "error" => &["error", "errorString"],
        _ => &[],
    }
}

const ALL_BINDINGS: [&str; 14] = [
    "complete",
    "incomplete",
    "size",
    "trackers",
    "tracker",
    "up",
    "down",
    "age",
    "downloadDir",
    "priority",
    "status",
    "name",
    "error",
    "id",
];

/// Compiled filter
///
/// All expressions are parsed up front, so a typo is reported before any
/// torrent is looked at.
pub struct Filter<E: ExpressionEngine = Engine> {
    engine: E,
    programs: Vec<(String, E::Program)>,
}

impl Filter<Engine> {
    /// Compile `options` with the built-in engine
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Syntax` for the first expression that does not
    /// parse.
    pub fn new(options: &FilterOptions) -> Result<Self, FilterError> {
        Self::with_engine(Engine, options)
    }
}

impl<E: ExpressionEngine> Filter<E> {
    /// Compile `options` with a specific engine
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Syntax` for the first expression that does not
    /// parse.
    pub fn with_engine(engine: E, options: &FilterOptions) -> Result<Self, FilterError> {
        let programs = options
            .expressions()
            .into_iter()
            .map(|expr| match engine.parse(&expr) {
                Ok(program) => Ok((expr, program)),
                Err(errors) => Err(FilterError::Syntax { expr, errors }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = programs.len(), "compiled filter expressions");
        Ok(Self { engine, programs })
    }

    /// True when the filter matches everything
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// RPC fields the expressions need, without repeats
    ///
    /// When the engine cannot report its variables, every binding's fields
    /// are requested.
    #[must_use]
    pub fn required_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::new();
        for (_, program) in &self.programs {
            let variables = self
                .engine
                .variables(program)
                .unwrap_or_else(|| ALL_BINDINGS.iter().map(ToString::to_string).collect());
            for variable in &variables {
                for field in fields_for(variable) {
                    if !fields.contains(field) {
                        fields.push(field);
                    }
                }
            }
        }
        fields
    }

    /// Test one torrent against every expression
    ///
    /// Every expression is evaluated, even after one has come out false, so a
    /// broken expression is reported whatever its position.
    ///
    /// # Errors
    ///
    /// Returns `FilterError::Eval` if an expression fails to evaluate, or
    /// `FilterError::NotBoolean` if it yields a non-boolean.
    pub fn matches(&self, torrent: &Torrent, derived: &Derived) -> Result<bool, FilterError> {
        if self.programs.is_empty() {
            return Ok(true);
        }

        let env = environment(torrent, derived);
        let mut matched = true;
        for (expr, program) in &self.programs {
            match self.engine.evaluate(program, &env) {
                Ok(Value::Bool(value)) => matched &= value,
                Ok(other) => {
                    return Err(FilterError::NotBoolean {
                        expr: expr.clone(),
                        id: torrent.id,
                        got: other.to_string(),
                    });
                }
                Err(source) => {
                    return Err(FilterError::Eval {
                        expr: expr.clone(),
                        id: torrent.id,
                        source,
                    });
                }
            }
        }
        Ok(matched)
    }
}

/// Bindings for one torrent, built fresh for every evaluation
#[must_use]
pub fn environment(torrent: &Torrent, derived: &Derived) -> Environment {
    let mut env = Environment::new();
    let complete = torrent.left_until_done == 0;
    env.set("id", torrent.id);
    env.set("complete", complete);
    env.set("incomplete", !complete);
    env.set("size", torrent.size_when_done);
    env.set("trackers", tracker_hosts(&torrent.trackers));
    env.set("tracker", derived.tracker.as_str());
    env.set("up", torrent.rate_upload);
    env.set("down", torrent.rate_download);
    env.set("age", derived.age);
    env.set("downloadDir", torrent.download_dir.as_str());
    env.set("priority", derived.priority);
    env.set("status", derived.status);
    env.set("name", torrent.name.as_str());
    env.set(
        "error",
        if torrent.error == 0 {
            ""
        } else {
            torrent.error_string.as_str()
        },
    );
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerNames;
    use crate::rpc::Tracker;
    use crate::torrent::{Deriver, ZeroSize};

    fn check(options: &FilterOptions, torrent: &Torrent) -> Result<bool, FilterError> {
        let names = TrackerNames::from_pairs([("foo-tracker", "foo")]);
        let derived = Deriver::at(&names, ZeroSize::Complete, 10_000).derive(torrent);
        Filter::new(options)?.matches(torrent, &derived)
    }

    fn with_exprs(exprs: &[&str]) -> FilterOptions {
        FilterOptions {
            expressions: exprs.iter().map(ToString::to_string).collect(),
            ..FilterOptions::default()
        }
    }

    fn sample() -> Torrent {
        Torrent {
            id: 2,
            name: "ubuntu-24.04.iso".to_string(),
            download_dir: "/srv/dl".to_string(),
            size_when_done: 5_000,
            left_until_done: 100,
            status: 0,
            trackers: vec![Tracker::new("https://foo-tracker.example.org/announce")],
            ..Torrent::default()
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(check(&FilterOptions::default(), &sample()).unwrap());
        assert!(Filter::new(&FilterOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn test_builtin_flags_become_fragments() {
        let options = FilterOptions {
            expressions: vec!["size > 1".to_string()],
            incomplete: true,
            tracker: Some("foo.bar\"".to_string()),
        };
        assert_eq!(
            options.expressions(),
            vec![
                "size > 1".to_string(),
                "incomplete".to_string(),
                r#"tracker ~ "foo\\.bar\"""#.to_string(),
            ]
        );
    }

    #[test]
    fn test_incomplete_flag() {
        let options = FilterOptions {
            incomplete: true,
            ..FilterOptions::default()
        };
        assert!(check(&options, &sample()).unwrap());

        let done = Torrent {
            left_until_done: 0,
            ..sample()
        };
        assert!(!check(&options, &done).unwrap());
    }

    #[test]
    fn test_tracker_flag_matches_short_name() {
        let foo = FilterOptions {
            tracker: Some("fo".to_string()),
            ..FilterOptions::default()
        };
        assert!(check(&foo, &sample()).unwrap());

        let other = FilterOptions {
            tracker: Some("bar".to_string()),
            ..FilterOptions::default()
        };
        assert!(!check(&other, &sample()).unwrap());
    }

    #[test]
    fn test_every_expression_must_hold() {
        assert!(check(&with_exprs(&["size > 1000", "incomplete"]), &sample()).unwrap());
        assert!(!check(&with_exprs(&["size > 1000", "complete"]), &sample()).unwrap());
    }

    #[test]
    fn test_bindings() {
        let torrent = sample();
        assert!(
            check(
                &with_exprs(&[
                    r#"downloadDir == "/srv/dl""#,
                    r#"status == "Stopped""#,
                    r#"priority == "normal""#,
                    r#"error == """#,
                    r#""foo-tracker.example.org" in trackers"#,
                    r#"tracker == "foo""#,
                    r#"name ~ "\.iso$""#,
                    "age == 10000 and up == 0 and down == 0",
                ]),
                &torrent
            )
            .unwrap()
        );
    }

    #[test]
    fn test_error_binding_uses_error_string() {
        let torrent = Torrent {
            error: 2,
            error_string: "Tracker gave HTTP response code 404".to_string(),
            ..sample()
        };
        assert!(check(&with_exprs(&[r#"error ~ "404""#]), &torrent).unwrap());
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        let result = Filter::new(&with_exprs(&["size >"]));
        assert!(matches!(result, Err(FilterError::Syntax { .. })));
    }

    #[test]
    fn test_non_boolean_result_is_fatal() {
        let result = check(&with_exprs(&["size"]), &sample());
        assert!(matches!(
            result,
            Err(FilterError::NotBoolean { id: 2, ref got, .. }) if got == "5000"
        ));
    }

    #[test]
    fn test_broken_expression_after_false_one_is_fatal() {
        let result = check(&with_exprs(&["complete", "size"]), &sample());
        assert!(matches!(result, Err(FilterError::NotBoolean { ref expr, .. }) if expr == "size"));

        let result = check(&with_exprs(&["complete", "seeders > 3"]), &sample());
        assert!(matches!(result, Err(FilterError::Eval { ref expr, .. }) if expr == "seeders > 3"));
    }

    #[test]
    fn test_unknown_variable_is_fatal() {
        let result = check(&with_exprs(&["seeders > 3"]), &sample());
        assert!(matches!(result, Err(FilterError::Eval { .. })));
    }

    #[test]
    fn test_required_fields() {
        let filter = Filter::new(&FilterOptions {
            expressions: vec!["size > 1 and name ~ \"x\"".to_string()],
            incomplete: true,
            tracker: None,
        })
        .unwrap();
        assert_eq!(
            filter.required_fields(),
            vec!["sizeWhenDone", "name", "leftUntilDone"]
        );
    }
}

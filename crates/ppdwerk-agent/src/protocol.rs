// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON request/response protocol for the host integration.
//
// One request maps onto one facade operation. Responses are either
//   { "ok": true,  "result": ... }
//   { "ok": false, "error": { "kind", "message", "detail", "suggestion", ... } }

use std::path::PathBuf;

use ppdwerk_core::error::{PpdError, Result};
use ppdwerk_core::human_errors::humanize_error;
use ppdwerk_core::Selection;
use ppdwerk_ppd::DocumentLoader;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::facade::QueryFacade;

/// A decoded host request, tagged by `op`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op")]
pub enum Request {
    IsPpd {
        path: PathBuf,
    },
    Info {
        path: PathBuf,
    },
    Groups {
        path: PathBuf,
    },
    Options {
        path: PathBuf,
        group: String,
    },
    Option {
        path: PathBuf,
        option: String,
    },
    /// All constraints, or only those involving `option` when given.
    Constraints {
        path: PathBuf,
        #[serde(default)]
        option: Option<String>,
    },
    /// Violated constraints; with `with_defaults`, unset options take their
    /// default choice.
    FailedConstraints {
        path: PathBuf,
        #[serde(default)]
        selection: Selection,
        #[serde(default)]
        with_defaults: bool,
    },
    /// The two options a constraint relates, resolved strictly.
    ConstraintOptions {
        path: PathBuf,
        index: usize,
    },
    Extract {
        path: PathBuf,
        dir: PathBuf,
    },
    LastError,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Self::IsPpd { .. } => "IsPpd",
            Self::Info { .. } => "Info",
            Self::Groups { .. } => "Groups",
            Self::Options { .. } => "Options",
            Self::Option { .. } => "Option",
            Self::Constraints { .. } => "Constraints",
            Self::FailedConstraints { .. } => "FailedConstraints",
            Self::ConstraintOptions { .. } => "ConstraintOptions",
            Self::Extract { .. } => "Extract",
            Self::LastError => "LastError",
        }
    }
}

/// Run `request` against the facade and build the response value.
pub fn dispatch<L: DocumentLoader>(facade: &QueryFacade<L>, request: Request) -> Value {
    let op = request.name();
    debug!(op, "dispatching request");
    // Failures are logged where they are recorded.
    match answer(facade, request) {
        Ok(result) => json!({ "ok": true, "result": result }),
        Err(err) => error_response(&err),
    }
}

/// Decode one JSON request line and dispatch it. Malformed input yields an
/// `InvalidRequest` error response.
pub fn handle_line<L: DocumentLoader>(facade: &QueryFacade<L>, line: &str) -> Value {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => dispatch(facade, request),
        Err(err) => {
            let err = PpdError::InvalidRequest(err.to_string());
            debug!(%err, "request rejected");
            facade.last_error().record(&err);
            error_response(&err)
        }
    }
}

fn answer<L: DocumentLoader>(facade: &QueryFacade<L>, request: Request) -> Result<Value> {
    let value = match request {
        Request::IsPpd { path } => Value::Bool(facade.is_valid_document(&path)),
        Request::Info { path } => serde_json::to_value(facade.identity(&path))?,
        Request::Groups { path } => serde_json::to_value(facade.groups_of(&path)?)?,
        Request::Options { path, group } => {
            serde_json::to_value(facade.options_of(&path, &group)?)?
        }
        Request::Option { path, option } => serde_json::to_value(facade.option(&path, &option)?)?,
        Request::Constraints { path, option: None } => {
            serde_json::to_value(facade.all_constraints(&path)?)?
        }
        Request::Constraints {
            path,
            option: Some(option),
        } => serde_json::to_value(facade.constraints_for(&path, &option)?)?,
        Request::FailedConstraints {
            path,
            selection,
            with_defaults: false,
        } => serde_json::to_value(facade.violated_constraints(&path, &selection)?)?,
        Request::FailedConstraints {
            path,
            selection,
            with_defaults: true,
        } => serde_json::to_value(facade.violated_with_defaults(&path, &selection)?)?,
        Request::ConstraintOptions { path, index } => {
            let (first, second) = facade.constraint_options(&path, index)?;
            json!({ "first": first, "second": second })
        }
        Request::Extract { path, dir } => serde_json::to_value(facade.extract_to(&path, &dir)?)?,
        Request::LastError => serde_json::to_value(facade.last_error().get())?,
    };
    Ok(value)
}

fn error_response(err: &PpdError) -> Value {
    let human = humanize_error(err);
    json!({
        "ok": false,
        "error": {
            "kind": err.kind(),
            "message": human.message,
            "detail": err.to_string(),
            "suggestion": human.suggestion,
            "retriable": human.retriable,
            "severity": human.severity.as_str(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ppdwerk_core::AgentConfig;
    use std::path::Path;

    const PPD: &str = r#"*PPD-Adobe: "4.3"
*Manufacturer: "Acme"
*ModelName: "X200"
*NickName: "Acme X200 Foomatic"
*OpenUI *Duplex/Two-Sided: PickOne
*DefaultDuplex: None
*Duplex None/Off: ""
*Duplex Long/Long Edge: ""
*CloseUI: *Duplex
*OpenUI *PageSize/Page Size: PickOne
*DefaultPageSize: Letter
*PageSize A4/A4: ""
*PageSize Letter/Letter: ""
*CloseUI: *PageSize
*UIConstraints: *Duplex Long *PageSize A4
"#;

    fn setup() -> (tempfile::TempDir, PathBuf, QueryFacade) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme.ppd");
        std::fs::write(&path, PPD).unwrap();
        let config = AgentConfig {
            temp_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };
        (dir, path, QueryFacade::from_config(&config))
    }

    fn request(op: &str, path: &Path, extra: Value) -> String {
        let mut value = json!({ "op": op, "path": path });
        if let (Some(obj), Some(more)) = (value.as_object_mut(), extra.as_object()) {
            obj.extend(more.clone());
        }
        value.to_string()
    }

    #[test]
    fn decodes_tagged_requests() {
        let req: Request =
            serde_json::from_str(r#"{"op":"Options","path":"/x.ppd","group":"General"}"#).unwrap();
        assert_eq!(req, Request::Options {
            path: PathBuf::from("/x.ppd"),
            group: "General".into(),
        });

        let req: Request = serde_json::from_str(r#"{"op":"LastError"}"#).unwrap();
        assert_eq!(req, Request::LastError);

        let req: Request = serde_json::from_str(r#"{"op":"Constraints","path":"/x.ppd"}"#).unwrap();
        assert_eq!(req, Request::Constraints {
            path: PathBuf::from("/x.ppd"),
            option: None,
        });
    }

    #[test]
    fn info_and_groups() {
        let (_dir, path, facade) = setup();

        let info = handle_line(&facade, &request("Info", &path, json!({})));
        assert_eq!(info["ok"], true);
        assert_eq!(info["result"]["manufacturer"], "Acme");
        assert_eq!(info["result"]["nickname"], "Acme X200 Foomatic");

        let groups = handle_line(&facade, &request("Groups", &path, json!({})));
        assert_eq!(groups["result"][0]["key"], "General");
    }

    #[test]
    fn failed_constraints_reports_the_violation() {
        let (_dir, path, facade) = setup();
        let line = request(
            "FailedConstraints",
            &path,
            json!({ "selection": { "Duplex": "Long", "PageSize": "A4" } }),
        );
        let response = handle_line(&facade, &line);
        assert_eq!(response["ok"], true);
        let violated = response["result"].as_array().unwrap();
        assert_eq!(violated.len(), 1);
        assert_eq!(violated[0]["index"], 0);
        assert_eq!(violated[0]["first"]["option"], "Duplex");
    }

    #[test]
    fn errors_carry_kind_and_suggestion() {
        let (_dir, path, facade) = setup();
        let response = handle_line(
            &facade,
            &request("Options", &path, json!({ "group": "NoSuchGroup" })),
        );
        assert_eq!(response["ok"], false);
        assert_eq!(response["error"]["kind"], "GroupNotFound");
        assert_eq!(
            response["error"]["message"],
            humanize_error(&PpdError::GroupNotFound("NoSuchGroup".into())).message
        );
        assert_eq!(response["error"]["detail"], "group not found: NoSuchGroup");
        assert!(!response["error"]["suggestion"].as_str().unwrap().is_empty());

        let last = handle_line(&facade, r#"{"op":"LastError"}"#);
        assert_eq!(last["result"]["kind"], "GroupNotFound");
    }

    #[test]
    fn is_ppd_never_fails() {
        let (_dir, _path, facade) = setup();
        let response = handle_line(&facade, r#"{"op":"IsPpd","path":"missing.ppd"}"#);
        assert_eq!(response, json!({ "ok": true, "result": false }));
    }

    #[test]
    fn malformed_lines_are_invalid_requests() {
        let (_dir, _path, facade) = setup();
        for line in ["not json", r#"{"op":"Print","path":"/x"}"#, r#"{"op":"Groups"}"#] {
            let response = handle_line(&facade, line);
            assert_eq!(response["error"]["kind"], "InvalidRequest", "{line}");
        }
    }

    #[test]
    fn failed_constraints_with_defaults() {
        let (dir, _path, facade) = setup();
        let path = dir.path().join("a4.ppd");
        std::fs::write(&path, PPD.replace("*DefaultPageSize: Letter", "*DefaultPageSize: A4")).unwrap();

        let plain = request("FailedConstraints", &path, json!({ "selection": { "Duplex": "Long" } }));
        assert_eq!(handle_line(&facade, &plain)["result"], json!([]));

        let line = request(
            "FailedConstraints",
            &path,
            json!({ "selection": { "Duplex": "Long" }, "with_defaults": true }),
        );
        let response = handle_line(&facade, &line);
        assert_eq!(response["result"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn constraint_options_request() {
        let (_dir, path, facade) = setup();
        let response = handle_line(&facade, &request("ConstraintOptions", &path, json!({ "index": 0 })));
        assert_eq!(response["ok"], true);
        assert_eq!(response["result"]["first"]["key"], "Duplex");
        assert_eq!(response["result"]["second"]["key"], "PageSize");
    }
}

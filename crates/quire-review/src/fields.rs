// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-document-type patch field table.
//!
//! A patch body is a JSON object whose keys must all appear in the table for
//! the document's type. Each entry pairs a validator with a merge function.
//! Anything outside the table is a bad request, never silently dropped.

use std::collections::BTreeMap;

use quire_core::QuireError;
use quire_core::types::IndexedDocument;
use serde_json::Value;

/// Checks a field value before it is accepted.
pub type Validator = fn(&Value) -> Result<(), String>;

/// Writes an accepted value into the document.
pub type Merger = fn(&mut IndexedDocument, &str, &Value);

#[derive(Clone, Copy)]
pub struct FieldSpec {
    pub validate: Validator,
    pub merge: Merger,
}

const REVIEWERS: &str = "reviewers";

fn string_value(value: &Value) -> Result<(), String> {
    match value {
        Value::String(_) => Ok(()),
        other => Err(format!("expected a string, found {}", kind_of(other))),
    }
}

fn people_value(value: &Value) -> Result<(), String> {
    let Value::Array(items) = value else {
        return Err(format!("expected a list of people, found {}", kind_of(value)));
    };
    for item in items {
        match item {
            Value::String(s) if !s.trim().is_empty() => {}
            Value::String(_) => return Err("people must not be blank".to_string()),
            other => {
                return Err(format!(
                    "expected people to be strings, found {}",
                    kind_of(other)
                ));
            }
        }
    }
    Ok(())
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

fn as_string(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_string()
}

/// Collects a validated people list. Empty means "leave unchanged".
fn as_people(value: &Value) -> Option<Vec<String>> {
    let people: Vec<String> = value
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|v| v.as_str().map(str::to_string))
        .collect();
    (!people.is_empty()).then_some(people)
}

fn merge_reviewers(doc: &mut IndexedDocument, _: &str, value: &Value) {
    if let Some(people) = as_people(value) {
        doc.reviewers = people;
    }
}

fn merge_contributors(doc: &mut IndexedDocument, _: &str, value: &Value) {
    if let Some(people) = as_people(value) {
        doc.contributors = people;
    }
}

fn merge_due_date(doc: &mut IndexedDocument, _: &str, value: &Value) {
    doc.due_date = Some(as_string(value));
}

fn merge_status(doc: &mut IndexedDocument, _: &str, value: &Value) {
    doc.status = as_string(value);
}

fn merge_summary(doc: &mut IndexedDocument, _: &str, value: &Value) {
    doc.summary = as_string(value);
}

fn merge_title(doc: &mut IndexedDocument, _: &str, value: &Value) {
    doc.title = as_string(value);
}

fn merge_custom_string(doc: &mut IndexedDocument, name: &str, value: &Value) {
    doc.custom_fields.insert(name.to_string(), value.clone());
}

fn merge_custom_people(doc: &mut IndexedDocument, name: &str, value: &Value) {
    if let Some(people) = as_people(value) {
        doc.custom_fields
            .insert(name.to_string(), Value::from(people));
    }
}

const STRING: FieldSpec = FieldSpec {
    validate: string_value,
    merge: merge_custom_string,
};

const PEOPLE: FieldSpec = FieldSpec {
    validate: people_value,
    merge: merge_custom_people,
};

/// The set of patchable fields for one document type.
pub struct FieldTable {
    doc_type: String,
    fields: BTreeMap<&'static str, FieldSpec>,
}

impl FieldTable {
    /// Builds the table for `doc_type`. Unknown types get the common fields only.
    pub fn for_doc_type(doc_type: &str) -> Self {
        let mut fields = BTreeMap::from([
            (
                REVIEWERS,
                FieldSpec {
                    validate: people_value,
                    merge: merge_reviewers,
                },
            ),
            (
                "contributors",
                FieldSpec {
                    validate: people_value,
                    merge: merge_contributors,
                },
            ),
            (
                "dueDate",
                FieldSpec {
                    validate: string_value,
                    merge: merge_due_date,
                },
            ),
            (
                "status",
                FieldSpec {
                    validate: string_value,
                    merge: merge_status,
                },
            ),
            (
                "summary",
                FieldSpec {
                    validate: string_value,
                    merge: merge_summary,
                },
            ),
            (
                "title",
                FieldSpec {
                    validate: string_value,
                    merge: merge_title,
                },
            ),
        ]);

        let custom: &[(&'static str, FieldSpec)] = match doc_type {
            "RFC" => &[
                ("currentVersion", STRING),
                ("prd", STRING),
                ("stakeholders", PEOPLE),
                ("targetVersion", STRING),
            ],
            "PRD" => &[("rfc", STRING), ("stakeholders", PEOPLE)],
            "FRD" => &[("prd", STRING), ("prfaq", STRING)],
            _ => &[],
        };
        fields.extend(custom.iter().copied());

        Self {
            doc_type: doc_type.to_string(),
            fields,
        }
    }

    /// Decodes and validates a patch body against the table.
    pub fn decode(&self, body: &[u8]) -> Result<DocumentPatch, QuireError> {
        let parsed: Value = serde_json::from_slice(body)
            .map_err(|e| QuireError::BadRequest(format!("malformed patch body: {e}")))?;
        let Value::Object(map) = parsed else {
            return Err(QuireError::BadRequest(
                "patch body must be a JSON object".to_string(),
            ));
        };

        let mut entries = Vec::with_capacity(map.len());
        for (name, value) in map {
            let Some(spec) = self.fields.get(name.as_str()) else {
                return Err(QuireError::BadRequest(format!(
                    "field `{name}` cannot be patched on {} documents",
                    self.display_type()
                )));
            };
            (spec.validate)(&value)
                .map_err(|reason| QuireError::BadRequest(format!("field `{name}`: {reason}")))?;
            entries.push(PatchEntry {
                name,
                value,
                merge: spec.merge,
            });
        }
        Ok(DocumentPatch { entries })
    }

    fn display_type(&self) -> &str {
        if self.doc_type.is_empty() {
            "untyped"
        } else {
            &self.doc_type
        }
    }
}

struct PatchEntry {
    name: String,
    value: Value,
    merge: Merger,
}

/// A validated partial update, ready to merge.
pub struct DocumentPatch {
    entries: Vec<PatchEntry>,
}

impl DocumentPatch {
    /// The reviewers list as requested. Empty when absent or empty.
    pub fn requested_reviewers(&self) -> Vec<String> {
        self.entries
            .iter()
            .find(|e| e.name == REVIEWERS)
            .and_then(|e| as_people(&e.value))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Merges every entry into `doc`. Fields not in the patch are left alone.
    pub fn apply(&self, doc: &mut IndexedDocument) {
        for entry in &self.entries {
            (entry.merge)(doc, &entry.name, &entry.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> IndexedDocument {
        IndexedDocument {
            object_id: "d1".into(),
            doc_type: "RFC".into(),
            title: "Old".into(),
            status: "Draft".into(),
            owner: "o@x".into(),
            reviewers: vec!["a@x".into(), "b@x".into()],
            contributors: vec!["c@x".into()],
            ..Default::default()
        }
    }

    fn bad_request(result: Result<DocumentPatch, QuireError>) -> String {
        match result {
            Err(QuireError::BadRequest(msg)) => msg,
            Err(other) => panic!("expected BadRequest, got {other:?}"),
            Ok(_) => panic!("expected BadRequest, got a patch"),
        }
    }

    #[test]
    fn unknown_field_is_rejected_not_dropped() {
        let table = FieldTable::for_doc_type("RFC");
        let msg = bad_request(table.decode(br#"{"title":"New","owner":"eve@x"}"#));
        assert!(msg.contains("owner"), "{msg}");
    }

    #[test]
    fn locked_flag_is_not_patchable() {
        let table = FieldTable::for_doc_type("RFC");
        let msg = bad_request(table.decode(br#"{"locked":false}"#));
        assert!(msg.contains("`locked`"), "{msg}");
    }

    #[test]
    fn custom_fields_depend_on_doc_type() {
        let rfc = FieldTable::for_doc_type("RFC");
        let prd = FieldTable::for_doc_type("PRD");
        let frd = FieldTable::for_doc_type("FRD");
        assert!(
            rfc.decode(br#"{"currentVersion":"1.2","targetVersion":"2.0"}"#)
                .is_ok()
        );
        bad_request(prd.decode(br#"{"currentVersion":"1.2"}"#));
        assert!(prd.decode(br#"{"rfc":"r1","stakeholders":["a@x"]}"#).is_ok());
        assert!(frd.decode(br#"{"prfaq":"p1"}"#).is_ok());
        bad_request(frd.decode(br#"{"stakeholders":["a@x"]}"#));

        let unknown = FieldTable::for_doc_type("Memo");
        assert!(unknown.decode(br#"{"title":"t","summary":"s"}"#).is_ok());
        let msg = bad_request(unknown.decode(br#"{"prd":"x"}"#));
        assert!(msg.contains("Memo"), "{msg}");
    }

    #[test]
    fn null_and_wrong_types_are_rejected() {
        let table = FieldTable::for_doc_type("RFC");
        bad_request(table.decode(br#"{"title":null}"#));
        bad_request(table.decode(br#"{"reviewers":"a@x"}"#));
        bad_request(table.decode(br#"{"reviewers":[1]}"#));
        bad_request(table.decode(br#"{"reviewers":[" "]}"#));
        bad_request(table.decode(br#"{"summary":42}"#));
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        let table = FieldTable::for_doc_type("RFC");
        bad_request(table.decode(b"[]"));
        bad_request(table.decode(b"not json"));
        bad_request(table.decode(b""));
    }

    #[test]
    fn merge_leaves_absent_fields_unchanged() {
        let table = FieldTable::for_doc_type("RFC");
        let patch = table
            .decode(br#"{"title":"New","dueDate":"2026-11-01","currentVersion":"2.0"}"#)
            .unwrap();
        let mut d = doc();
        patch.apply(&mut d);
        assert_eq!(d.title, "New");
        assert_eq!(d.due_date.as_deref(), Some("2026-11-01"));
        assert_eq!(d.custom_fields["currentVersion"], "2.0");
        assert_eq!(d.status, "Draft");
        assert_eq!(d.reviewers, vec!["a@x", "b@x"]);
    }

    #[test]
    fn empty_people_list_means_no_change() {
        let table = FieldTable::for_doc_type("RFC");
        let patch = table
            .decode(br#"{"reviewers":[],"contributors":[],"stakeholders":[]}"#)
            .unwrap();
        assert!(patch.requested_reviewers().is_empty());
        let mut d = doc();
        patch.apply(&mut d);
        assert_eq!(d.reviewers, vec!["a@x", "b@x"]);
        assert_eq!(d.contributors, vec!["c@x"]);
        assert!(!d.custom_fields.contains_key("stakeholders"));
    }

    #[test]
    fn people_lists_replace_wholesale() {
        let table = FieldTable::for_doc_type("RFC");
        let patch = table
            .decode(br#"{"reviewers":["a@x","z@x"],"stakeholders":["s@x"]}"#)
            .unwrap();
        assert_eq!(patch.requested_reviewers(), vec!["a@x", "z@x"]);
        let mut d = doc();
        patch.apply(&mut d);
        assert_eq!(d.reviewers, vec!["a@x", "z@x"]);
        assert_eq!(d.custom_fields["stakeholders"], serde_json::json!(["s@x"]));
    }

    #[test]
    fn unrecognized_status_string_is_kept_verbatim() {
        let table = FieldTable::for_doc_type("RFC");
        let patch = table.decode(br#"{"status":"Approved"}"#).unwrap();
        let mut d = doc();
        patch.apply(&mut d);
        assert_eq!(d.status, "Approved");
    }
}

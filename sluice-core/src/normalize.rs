//! YAML normalization
//!
//! Configuration documents are compared by content, not by text. A document is
//! parsed with serde_yaml, `<<` merge keys are expanded, every mapping is
//! re-ordered by key, and the result is serialized again. Two documents are semantically equal iff their normalized
//! forms are byte-identical.

use serde::Deserialize;
use serde_yaml::value::TaggedValue;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Normalize a YAML (or JSON) document into its canonical textual form
///
/// # Errors
/// Returns `Error::Parse` if the input is not a single well-formed, non-empty document.
pub fn normalize(text: &str) -> Result<String> {
    let mut value = parse_single_document(text)?;
    value
        .apply_merge()
        .map_err(|e| Error::Parse(format!("Failed to expand merge keys: {}", e)))?;
    let canonical = canonicalize(value)?;

    serde_yaml::to_string(&canonical)
        .map_err(|e| Error::Parse(format!("Failed to serialize document: {}", e)))
}

/// Check whether two documents are equal after normalization
pub fn semantically_equal(a: &str, b: &str) -> Result<bool> {
    Ok(normalize(a)? == normalize(b)?)
}

fn parse_single_document(text: &str) -> Result<Value> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document).map_err(|e| Error::Parse(e.to_string()))?;
        documents.push(value);
    }

    if documents.len() > 1 {
        return Err(Error::Parse(format!(
            "expected a single document, found {}",
            documents.len()
        )));
    }

    match documents.pop() {
        None | Some(Value::Null) => Err(Error::Parse("configuration document is empty".to_string())),
        Some(value) => Ok(value),
    }
}

fn canonicalize(value: Value) -> Result<Value> {
    match value {
        Value::Mapping(map) => canonicalize_mapping(map).map(Value::Mapping),
        Value::Sequence(items) => items
            .into_iter()
            .map(canonicalize)
            .collect::<Result<Vec<_>>>()
            .map(Value::Sequence),
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            Ok(Value::Tagged(Box::new(TaggedValue {
                tag,
                value: canonicalize(value)?,
            })))
        }
        scalar => Ok(scalar),
    }
}

fn canonicalize_mapping(map: Mapping) -> Result<Mapping> {
    let mut entries = Vec::with_capacity(map.len());
    for (key, value) in map {
        let key = canonicalize(key)?;
        let sort_key = match &key {
            Value::String(s) => s.clone(),
            other => serde_yaml::to_string(other)
                .map_err(|e| Error::Parse(format!("Failed to serialize mapping key: {}", e)))?,
        };
        entries.push((sort_key, key, canonicalize(value)?));
    }

    entries.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(entries.into_iter().map(|(_, key, value)| (key, value)).collect())
}

/// Render a line diff between two normalized documents
///
/// Lines only in `old` are prefixed with `- `, lines only in `new` with `+ `,
/// shared lines with two spaces.
pub fn diff_normalized(old: &str, new: &str) -> String {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    // Only the differing middle goes through the LCS table
    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut out = String::new();
    for line in &a[..prefix] {
        push_line(&mut out, "  ", line);
    }
    diff_lines(&mut out, &a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);
    for line in &a[a.len() - suffix..] {
        push_line(&mut out, "  ", line);
    }

    out
}

fn diff_lines(out: &mut String, a: &[&str], b: &[&str]) {
    // lcs[i][j] = length of the longest common subsequence of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            push_line(out, "  ", a[i]);
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            push_line(out, "- ", a[i]);
            i += 1;
        } else {
            push_line(out, "+ ", b[j]);
            j += 1;
        }
    }
    for line in &a[i..] {
        push_line(out, "- ", line);
    }
    for line in &b[j..] {
        push_line(out, "+ ", line);
    }
}

fn push_line(out: &mut String, prefix: &str, line: &str) {
    out.push_str(prefix);
    out.push_str(line);
    out.push('\n');
}

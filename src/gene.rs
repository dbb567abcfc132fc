use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::mygene::Hit;

/// Fields requested from the provider for every lookup.
pub const DEFAULT_FIELDS: &[&str] = &[
    "entrezgene",
    "ensembl.gene",
    "uniprot.Swiss-Prot",
    "symbol",
    "name",
];

pub const TAXID_FIELD: &str = "taxid";
pub const HOMOLOGY_FIELD: &str = "homologene";

/// Keys `GeneRecord` serializes from its typed fields.
const RECORD_KEYS: &[&str] = &[
    "mygene_id",
    "source_id",
    "symbol",
    "name",
    "ncbigene",
    "ensemblgene",
    "uniprot",
    "taxid",
];

/// Ordered set of provider fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSet {
    fields: Vec<String>,
}

impl FieldSet {
    pub fn defaults() -> Self {
        Self {
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn with(mut self, field: &str) -> Self {
        self.insert(field);
        self
    }

    pub fn insert(&mut self, field: &str) {
        let field = field.trim();
        if !field.is_empty() && !self.contains(field) {
            self.fields.push(field.to_string());
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn query_param(&self) -> String {
        self.fields.join(",")
    }

    /// Requested fields copied into `GeneRecord::extra`, as
    /// `(output key, provider field)`. The output key is the field's
    /// top-level key, or the full dotted field when the top-level key is a
    /// typed record field. A bare field named like a typed record field is
    /// left out.
    fn extra_keys(&self) -> Vec<(&str, &str)> {
        let mut keys: Vec<(&str, &str)> = Vec::new();
        for field in self.iter() {
            if DEFAULT_FIELDS.contains(&field) || field == TAXID_FIELD {
                continue;
            }
            let top = field.split('.').next().unwrap_or(field);
            let key = match (RECORD_KEYS.contains(&top), top == field) {
                (false, _) => top,
                (true, false) => field,
                (true, true) => continue,
            };
            if !keys.iter().any(|(existing, _)| *existing == key) {
                keys.push((key, field));
            }
        }
        keys
    }
}

impl Default for FieldSet {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Scalar-or-list value as the provider and the output documents use it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// `None` for an empty list, a scalar for exactly one value.
    pub fn from_vec(mut values: Vec<T>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.pop().map(OneOrMany::One),
            _ => Some(OneOrMany::Many(values)),
        }
    }

    pub fn to_vec(&self) -> Vec<&T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values.iter().collect(),
        }
    }
}

/// Identifiers that resolved to one canonical gene. Non-empty, ordered by
/// first appearance, no repeats. Serializes as a scalar when it holds one id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIds {
    ids: Vec<String>,
}

impl SourceIds {
    pub fn single(id: impl Into<String>) -> Self {
        Self {
            ids: vec![id.into()],
        }
    }

    pub fn first(&self) -> &str {
        &self.ids[0]
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|existing| existing == id)
    }

    pub fn push(&mut self, id: &str) {
        if !self.contains(id) {
            self.ids.push(id.to_string());
        }
    }

    pub fn merge(&mut self, other: &SourceIds) {
        for id in other.iter() {
            self.push(id);
        }
    }
}

impl Serialize for SourceIds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.ids.len() == 1 {
            self.ids[0].serialize(serializer)
        } else {
            self.ids.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for SourceIds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ids = match OneOrMany::<String>::deserialize(deserializer)? {
            OneOrMany::One(id) => vec![id],
            OneOrMany::Many(ids) => ids,
        };
        let mut iter = ids.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| serde::de::Error::custom("source_id must not be empty"))?;
        let mut source = SourceIds::single(first);
        for id in iter {
            source.push(&id);
        }
        Ok(source)
    }
}

/// Canonical gene resolved by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneRecord {
    pub mygene_id: String,
    pub source_id: SourceIds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncbigene: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensemblgene: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniprot: Option<OneOrMany<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxid: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl GeneRecord {
    pub fn new(mygene_id: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            mygene_id: mygene_id.into(),
            source_id: SourceIds::single(source_id),
            symbol: None,
            name: None,
            ncbigene: None,
            ensemblgene: None,
            uniprot: None,
            taxid: None,
            extra: BTreeMap::new(),
        }
    }

    /// Builds a record keyed to the hit's echoed query. Only requested fields
    /// are read. `None` for not-found hits or hits without a canonical id.
    pub fn from_hit(hit: &Hit, fields: &FieldSet) -> Option<Self> {
        if hit.notfound {
            return None;
        }
        let mygene_id = hit.id.as_deref().filter(|id| !id.is_empty())?;
        let mut record = GeneRecord::new(mygene_id, hit.query.as_str());

        if fields.contains("symbol") {
            record.symbol = hit.field("symbol").and_then(text_value);
        }
        if fields.contains("name") {
            record.name = hit.field("name").and_then(text_value);
        }
        if fields.contains("entrezgene") {
            record.ncbigene = hit.field("entrezgene").and_then(text_value);
        }
        if fields.contains("ensembl.gene") {
            record.ensemblgene = hit
                .field("ensembl")
                .and_then(|value| OneOrMany::from_vec(collect_nested(value, "gene")));
        }
        if fields.contains("uniprot.Swiss-Prot") {
            record.uniprot = hit
                .field("uniprot")
                .and_then(|value| OneOrMany::from_vec(collect_nested(value, "Swiss-Prot")));
        }
        if fields.contains(TAXID_FIELD) {
            record.taxid = hit.field(TAXID_FIELD).and_then(taxid_value);
        }
        for (key, field) in fields.extra_keys() {
            let value = match field.split_once('.') {
                Some((top, rest)) if key == field => hit
                    .field(top)
                    .and_then(|value| nested_value(value, &rest.split('.').collect::<Vec<_>>())),
                _ => hit.field(key).cloned(),
            };
            if let Some(value) = value.filter(|value| !is_empty_value(value)) {
                record.extra.insert(key.to_string(), value);
            }
        }
        Some(record)
    }

    pub fn extra_field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}

pub(crate) fn taxid_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(num) => num.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Collects `key` from an object, or from every object of an array.
/// The nested value may itself be a scalar or a list.
fn collect_nested(value: &Value, key: &str) -> Vec<String> {
    let mut output = Vec::new();
    let mut push = |item: &Value| match item.get(key) {
        Some(Value::Array(values)) => {
            for value in values {
                if let Some(text) = text_value(value) {
                    if !output.contains(&text) {
                        output.push(text);
                    }
                }
            }
        }
        Some(value) => {
            if let Some(text) = text_value(value) {
                if !output.contains(&text) {
                    output.push(text);
                }
            }
        }
        None => {}
    };
    match value {
        Value::Array(items) => items.iter().for_each(&mut push),
        Value::Object(_) => push(value),
        _ => {}
    }
    output
}

/// Follows a dotted path below `value`, mapping over arrays of objects.
fn nested_value(value: &Value, path: &[&str]) -> Option<Value> {
    let Some((head, rest)) = path.split_first() else {
        return Some(value.clone());
    };
    match value {
        Value::Object(map) => nested_value(map.get(*head)?, rest),
        Value::Array(items) => {
            let values: Vec<Value> = items
                .iter()
                .filter_map(|item| nested_value(item, path))
                .collect();
            (!values.is_empty()).then_some(Value::Array(values))
        }
        _ => None,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

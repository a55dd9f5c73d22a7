//! In-memory [`QueryExecutor`] for engine and handler tests
//!
//! Evaluates the subset of MongoDB query language the list engine emits:
//! `$and`/`$or`/`$nor`, equality (numeric coercion, array membership),
//! `$eq`/`$ne`/`$gt`/`$gte`/`$lt`/`$lte`/`$in`/`$nin`/`$exists`,
//! `$regex` with `$options`, dotted paths, multi-key sorts using the
//! server's type ordering, and inclusion/exclusion projections. Projections
//! the server would refuse fail with `ProjectionMismatch`.

use async_trait::async_trait;
use list_query::{FindQuery, ListQueryError, ListQueryResult, QueryExecutor};
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, RwLock};

/// Collections held in memory, with failure injection and call counting
#[derive(Default)]
pub struct InMemoryExecutor {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    failure: Mutex<Option<ListQueryError>>,
    calls: AtomicUsize,
}

impl InMemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection, replacing whatever it held
    pub fn with_records(self, collection: &str, records: Vec<Document>) -> Self {
        self.collections
            .write()
            .expect("collections lock poisoned")
            .insert(collection.to_string(), records);
        self
    }

    pub fn insert(&self, collection: &str, record: Document) {
        self.collections
            .write()
            .expect("collections lock poisoned")
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    pub fn records(&self, collection: &str) -> Vec<Document> {
        self.collections
            .read()
            .expect("collections lock poisoned")
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every following call fail with `error` until cleared with `None`
    pub fn set_failure(&self, error: Option<ListQueryError>) {
        *self.failure.lock().expect("failure lock poisoned") = error;
    }

    /// Number of `find`/`count` calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    fn enter(&self) -> ListQueryResult<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        match self.failure.lock().expect("failure lock poisoned").as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn matching(&self, collection: &str, filter: &Document) -> ListQueryResult<Vec<Document>> {
        let mut out = Vec::new();
        for record in self.records(collection) {
            if matches(&record, filter)? {
                out.push(record);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl QueryExecutor for InMemoryExecutor {
    async fn find(&self, collection: &str, query: &FindQuery) -> ListQueryResult<Vec<Document>> {
        self.enter()?;
        let projection = query.projection.as_ref().map(Projection::parse).transpose()?;

        let mut records = self.matching(collection, &query.filter)?;
        records.sort_by(|a, b| compare_by(&query.sort, a, b));

        let skip = query.skip.map_or(0, |s| s as usize);
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);

        Ok(records
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|record| match &projection {
                Some(p) => p.apply(&record),
                None => record,
            })
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Document) -> ListQueryResult<u64> {
        self.enter()?;
        Ok(self.matching(collection, filter)?.len() as u64)
    }
}

fn unsupported(what: impl std::fmt::Display) -> ListQueryError {
    ListQueryError::QueryExecutionFailure(format!("unsupported by in-memory executor: {what}"))
}

fn matches(record: &Document, filter: &Document) -> ListQueryResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => all_clauses(record, condition)?.iter().all(|b| *b),
            "$or" => all_clauses(record, condition)?.iter().any(|b| *b),
            "$nor" => !all_clauses(record, condition)?.iter().any(|b| *b),
            op if op.starts_with('$') => return Err(unsupported(op)),
            path => field_matches(lookup(record, path), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn all_clauses(record: &Document, clauses: &Bson) -> ListQueryResult<Vec<bool>> {
    let Bson::Array(items) = clauses else {
        return Err(ListQueryError::QueryExecutionFailure(
            "$and/$or/$nor must be an array".into(),
        ));
    };
    items
        .iter()
        .map(|item| match item {
            Bson::Document(clause) => matches(record, clause),
            other => Err(ListQueryError::QueryExecutionFailure(format!(
                "logical clause must be a document, got {other}"
            ))),
        })
        .collect()
}

fn lookup<'a>(record: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

fn field_matches(value: Option<&Bson>, condition: &Bson) -> ListQueryResult<bool> {
    let operators = match condition {
        Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => ops,
        _ => return Ok(equals(value, condition)),
    };

    for (op, operand) in operators {
        let ok = match op.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => ordered(value, operand, |o| o == Ordering::Greater),
            "$gte" => ordered(value, operand, |o| o != Ordering::Less),
            "$lt" => ordered(value, operand, |o| o == Ordering::Less),
            "$lte" => ordered(value, operand, |o| o != Ordering::Greater),
            "$in" => in_list(value, operand)?,
            "$nin" => !in_list(value, operand)?,
            "$exists" => value.is_some() == matches!(operand, Bson::Boolean(true)),
            "$regex" => regex_matches(value, operand, operators.get_str("$options").unwrap_or(""))?,
            "$options" => true,
            other => return Err(unsupported(other)),
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| same(item, expected))
        }
        Some(actual) => same(actual, expected),
    }
}

fn same(a: &Bson, b: &Bson) -> bool {
    match (number(a), number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn in_list(value: Option<&Bson>, operand: &Bson) -> ListQueryResult<bool> {
    match operand {
        Bson::Array(candidates) => Ok(candidates.iter().any(|c| equals(value, c))),
        _ => Err(ListQueryError::QueryExecutionFailure("$in/$nin needs an array".into())),
    }
}

fn ordered(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    match value {
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| same_type_cmp(item, operand).is_some_and(&accept)),
        Some(actual) => same_type_cmp(actual, operand).is_some_and(accept),
        None => false,
    }
}

fn regex_matches(value: Option<&Bson>, pattern: &Bson, options: &str) -> ListQueryResult<bool> {
    let Bson::String(pattern) = pattern else {
        return Err(unsupported("non-string $regex"));
    };
    let regex = regex::RegexBuilder::new(pattern)
        .case_insensitive(options.contains('i'))
        .multi_line(options.contains('m'))
        .build()
        .map_err(|e| ListQueryError::QueryExecutionFailure(e.to_string()))?;

    Ok(match value {
        Some(Bson::String(s)) => regex.is_match(s),
        Some(Bson::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Bson::String(s) if regex.is_match(s))),
        _ => false,
    })
}

fn number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(n) => Some(*n),
        _ => None,
    }
}

/// Comparison within one BSON type class; `None` across classes
fn same_type_cmp(a: &Bson, b: &Bson) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (number(a), number(b)) {
        return x.partial_cmp(&y);
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        (Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.bytes().cmp(&y.bytes())),
        (Bson::Null, Bson::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Server sort order across types: null < numbers < strings < documents <
/// arrays < ObjectId < booleans < dates
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 1,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 2,
        Some(Bson::String(_)) => 3,
        Some(Bson::Document(_)) => 4,
        Some(Bson::Array(_)) => 5,
        Some(Bson::ObjectId(_)) => 7,
        Some(Bson::Boolean(_)) => 8,
        Some(Bson::DateTime(_)) => 9,
        Some(_) => 10,
    }
}

fn compare_by(sort: &Document, a: &Document, b: &Document) -> Ordering {
    for (path, direction) in sort {
        let (x, y) = (lookup(a, path), lookup(b, path));
        let ordering = type_rank(x).cmp(&type_rank(y)).then_with(|| match (x, y) {
            (Some(x), Some(y)) => same_type_cmp(x, y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        });
        let ordering = match number(direction) {
            Some(d) if d < 0.0 => ordering.reverse(),
            _ => ordering,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

enum Projection {
    Include { paths: Vec<String>, with_id: bool },
    Exclude { paths: Vec<String> },
}

impl Projection {
    fn parse(spec: &Document) -> ListQueryResult<Self> {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut with_id = true;

        for (path, flag) in spec {
            let on = match flag {
                Bson::Boolean(b) => *b,
                other => number(other).map(|n| n != 0.0).ok_or_else(|| unsupported(other))?,
            };
            match (path.as_str(), on) {
                ("_id", false) => with_id = false,
                ("_id", true) => {}
                (_, true) => included.push(path.clone()),
                (_, false) => excluded.push(path.clone()),
            }
        }

        let all: Vec<&String> = included.iter().chain(excluded.iter()).collect();
        for a in &all {
            for b in &all {
                if b.len() > a.len() && b.starts_with(a.as_str()) && b.as_bytes()[a.len()] == b'.' {
                    return Err(ListQueryError::ProjectionMismatch(format!(
                        "Path collision at {b}"
                    )));
                }
            }
        }

        match (included.is_empty(), excluded.is_empty()) {
            (false, false) => Err(ListQueryError::ProjectionMismatch(format!(
                "Cannot do exclusion on field {} in inclusion projection",
                excluded[0]
            ))),
            (true, false) => {
                if !with_id {
                    excluded.push("_id".to_string());
                }
                Ok(Projection::Exclude { paths: excluded })
            }
            (false, true) => Ok(Projection::Include {
                paths: included,
                with_id,
            }),
            (true, true) if with_id => Ok(Projection::Include {
                paths: vec!["_id".to_string()],
                with_id: true,
            }),
            (true, true) => Ok(Projection::Exclude {
                paths: vec!["_id".to_string()],
            }),
        }
    }

    fn apply(&self, record: &Document) -> Document {
        match self {
            Projection::Include { paths, with_id } => {
                let mut out = Document::new();
                if *with_id {
                    if let Some(id) = record.get("_id") {
                        out.insert("_id", id.clone());
                    }
                }
                for path in paths {
                    if let Some(value) = lookup(record, path) {
                        insert_path(&mut out, path, value.clone());
                    }
                }
                out
            }
            Projection::Exclude { paths } => {
                let mut out = record.clone();
                for path in paths {
                    remove_path(&mut out, path);
                }
                out
            }
        }
    }
}

fn insert_path(doc: &mut Document, path: &str, value: Bson) {
    match path.split_once('.') {
        None => {
            doc.insert(path, value);
        }
        Some((head, rest)) => {
            if !matches!(doc.get(head), Some(Bson::Document(_))) {
                doc.insert(head, Document::new());
            }
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                insert_path(inner, rest, value);
            }
        }
    }
}

fn remove_path(doc: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            doc.remove(path);
        }
        Some((head, rest)) => {
            if let Some(Bson::Document(inner)) = doc.get_mut(head) {
                remove_path(inner, rest);
            }
        }
    }
}

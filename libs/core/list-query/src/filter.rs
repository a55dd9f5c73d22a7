//! Filter normalization: caller filter plus the free-text search clause.

use mongodb::bson::{Bson, Document, doc};

use crate::error::{ListQueryError, ListQueryResult};
use crate::profile::EntityProfile;

/// Operators that run server-side JavaScript, or read a field by a computed
/// name that no path check can see
const FORBIDDEN_OPERATORS: [&str; 6] = [
    "$where",
    "$function",
    "$accumulator",
    "$getField",
    "$setField",
    "$unsetField",
];

/// Variables bound to the whole record
const RECORD_VARIABLES: [&str; 2] = ["$$ROOT", "$$CURRENT"];

/// Split free text into search tokens on whitespace and commas
pub fn tokenize_search(search: &str) -> Vec<&str> {
    search
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .collect()
}

/// Compose the caller filter with the search clause.
///
/// Each token is a case-insensitive literal substring match. A field matches
/// when it contains every token; a record matches when any searchable field
/// does. The result is AND-ed with the caller filter.
pub fn normalize_filter(
    profile: &EntityProfile,
    filter: Option<&Document>,
    search: Option<&str>,
) -> ListQueryResult<Document> {
    let base = filter.cloned().unwrap_or_default();
    check_document(profile, &base)?;

    let tokens = search.map(tokenize_search).unwrap_or_default();
    if tokens.is_empty() {
        return Ok(base);
    }

    let clause = search_clause(profile, &tokens)?;
    if base.is_empty() {
        Ok(clause)
    } else {
        Ok(doc! { "$and": [base, clause] })
    }
}

fn search_clause(profile: &EntityProfile, tokens: &[&str]) -> ListQueryResult<Document> {
    let fields = profile.searchable_fields();
    if fields.is_empty() {
        return Err(ListQueryError::invalid(format!(
            "{} does not support search",
            profile.name()
        )));
    }

    let mut per_field: Vec<Document> = fields
        .iter()
        .map(|field| {
            let mut matches: Vec<Document> = tokens
                .iter()
                .map(|token| doc! { *field: { "$regex": regex::escape(token), "$options": "i" } })
                .collect();
            if matches.len() == 1 {
                matches.remove(0)
            } else {
                doc! { "$and": matches }
            }
        })
        .collect();

    if per_field.len() == 1 {
        Ok(per_field.remove(0))
    } else {
        Ok(doc! { "$or": per_field })
    }
}

fn check_document(profile: &EntityProfile, filter: &Document) -> ListQueryResult<()> {
    for (key, value) in filter {
        if FORBIDDEN_OPERATORS.contains(&key.as_str()) {
            return Err(ListQueryError::invalid(format!("operator {key} is not allowed")));
        }
        if !key.starts_with('$') && profile.touches_sensitive(key) {
            return Err(ListQueryError::invalid(format!("cannot filter on {key}")));
        }
        check_value(profile, value)?;
    }
    Ok(())
}

fn check_value(profile: &EntityProfile, value: &Bson) -> ListQueryResult<()> {
    match value {
        Bson::Document(inner) => check_document(profile, inner),
        Bson::Array(items) => items.iter().try_for_each(|item| check_value(profile, item)),
        Bson::String(s) if s.starts_with("$$") => check_variable(profile, s),
        // `$expr` style field references
        Bson::String(s) if s.starts_with('$') => {
            if profile.touches_sensitive(&s[1..]) {
                Err(ListQueryError::invalid(format!("cannot reference {s}")))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

/// `$$ROOT.path` and `$$CURRENT.path` are field references too; the bare
/// variables carry the whole record, sensitive fields included.
fn check_variable(profile: &EntityProfile, reference: &str) -> ListQueryResult<()> {
    for variable in RECORD_VARIABLES {
        let Some(rest) = reference.strip_prefix(variable) else {
            continue;
        };
        if rest.is_empty() {
            return Err(ListQueryError::invalid(format!("cannot reference {reference}")));
        }
        if let Some(path) = rest.strip_prefix('.') {
            if profile.touches_sensitive(path) {
                return Err(ListQueryError::invalid(format!("cannot reference {reference}")));
            }
            return Ok(());
        }
    }
    Ok(())
}

use mongodb::bson::{Bson, Document, doc};

use crate::error::{ListQueryError, ListQueryResult};
use crate::profile::EntityProfile;

/// Resolve the caller's sort into `field: 1 | -1` pairs.
///
/// An absent or empty sort means newest first. `_id` ascending is appended
/// unless already present so that ties come back in the same order on
/// every call.
pub fn resolve_sort(profile: &EntityProfile, sort: Option<&Document>) -> ListQueryResult<Document> {
    let mut resolved = Document::new();

    match sort {
        Some(requested) if !requested.is_empty() => {
            for (field, value) in requested {
                if field.is_empty() || field.starts_with('$') {
                    return Err(ListQueryError::invalid(format!("invalid sort field '{field}'")));
                }
                if profile.touches_sensitive(field) {
                    return Err(ListQueryError::invalid(format!("cannot sort on {field}")));
                }
                resolved.insert(field.clone(), direction(field, value)?);
            }
        }
        _ => return Ok(default_sort(profile)),
    }

    if !resolved.contains_key("_id") {
        resolved.insert("_id", 1);
    }
    Ok(resolved)
}

fn direction(field: &str, value: &Bson) -> ListQueryResult<i32> {
    let parsed = match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(n) if n.fract() == 0.0 => Some(*n as i64),
        Bson::String(s) => match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(1),
            "desc" | "descending" => Some(-1),
            _ => None,
        },
        _ => None,
    };

    match parsed {
        Some(1) => Ok(1),
        Some(-1) => Ok(-1),
        _ => Err(ListQueryError::invalid(format!(
            "invalid sort direction for '{field}': {value}"
        ))),
    }
}

/// Sort used when the caller gives none
pub fn default_sort(profile: &EntityProfile) -> Document {
    doc! { profile.timestamp(): -1, "_id": 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> EntityProfile {
        EntityProfile::new("users", "users").sensitive(&["password"])
    }

    #[test]
    fn test_default_is_newest_first() {
        let expected = doc! { "createdAt": -1, "_id": 1 };
        assert_eq!(resolve_sort(&users(), None).unwrap(), expected);
        assert_eq!(resolve_sort(&users(), Some(&doc! {})).unwrap(), expected);
        assert_eq!(default_sort(&users()), expected);
    }

    #[test]
    fn test_caller_sort_kept_in_order() {
        let sort = doc! { "name": "asc", "age": -1_i64, "score": "DESCENDING", "rank": 1.0 };
        let resolved = resolve_sort(&users(), Some(&sort)).unwrap();
        assert_eq!(resolved, doc! { "name": 1, "age": -1, "score": -1, "rank": 1, "_id": 1 });
    }

    #[test]
    fn test_explicit_id_is_not_duplicated() {
        let resolved = resolve_sort(&users(), Some(&doc! { "_id": -1 })).unwrap();
        assert_eq!(resolved, doc! { "_id": -1 });
    }

    #[test]
    fn test_invalid_directions_rejected() {
        for bad in [doc! { "name": 2 }, doc! { "name": "up" }, doc! { "name": 0.5 }, doc! { "name": true }] {
            let err = resolve_sort(&users(), Some(&bad)).unwrap_err();
            assert!(matches!(err, ListQueryError::InvalidSpecification(_)), "{bad}");
        }
    }

    #[test]
    fn test_sensitive_and_operator_fields_rejected() {
        assert!(resolve_sort(&users(), Some(&doc! { "password": 1 })).is_err());
        assert!(resolve_sort(&users(), Some(&doc! { "$natural": 1 })).is_err());
    }
}

use mongodb::bson::{Bson, Document};

use crate::error::{ListQueryError, ListQueryResult};
use crate::profile::EntityProfile;
use crate::query::Selection;

/// Resolve the caller's selection into a projection that cannot expose a
/// sensitive field.
///
/// Sensitive keys are dropped from the selection. An exclusion-style
/// projection additionally excludes every sensitive field. When nothing is
/// left the entity's safe default applies. `None` means no `$project` stage.
pub fn resolve_projection(
    profile: &EntityProfile,
    select: Option<&Selection>,
) -> ListQueryResult<Option<Document>> {
    let requested = match select {
        Some(selection) => parse_selection(selection)?,
        None => Vec::new(),
    };

    let kept: Vec<(String, bool)> = requested
        .into_iter()
        .filter(|(field, _)| !profile.is_sensitive(field))
        .collect();

    if kept.is_empty() {
        return Ok(profile.safe_projection());
    }

    let exclusion_only = kept.iter().all(|(field, include)| !include || field == "_id")
        && kept.iter().any(|(_, include)| !include);

    let mut projection: Document = kept
        .into_iter()
        .map(|(field, include)| (field, Bson::Int32(i32::from(include))))
        .collect();

    if exclusion_only {
        for (field, value) in profile.exclusion_of_sensitive().unwrap_or_default() {
            projection.insert(field, value);
        }
    }
    Ok(Some(projection))
}

fn parse_selection(selection: &Selection) -> ListQueryResult<Vec<(String, bool)>> {
    let entries = match selection {
        Selection::Fields(list) => list
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty())
            .map(|token| match token.strip_prefix('-') {
                Some(field) => (field.to_string(), false),
                None => (token.trim_start_matches('+').to_string(), true),
            })
            .collect::<Vec<_>>(),
        Selection::Map(map) => map
            .iter()
            .map(|(field, value)| Ok((field.clone(), flag(field, value)?)))
            .collect::<ListQueryResult<Vec<_>>>()?,
    };

    for (field, _) in &entries {
        if field.is_empty() || field.starts_with('$') || field.contains("..") {
            return Err(ListQueryError::invalid(format!("invalid select field '{field}'")));
        }
    }
    Ok(entries)
}

fn flag(field: &str, value: &Bson) -> ListQueryResult<bool> {
    match value {
        Bson::Boolean(b) => Ok(*b),
        Bson::Int32(0) | Bson::Int64(0) => Ok(false),
        Bson::Int32(1) | Bson::Int64(1) => Ok(true),
        Bson::Double(n) if *n == 0.0 => Ok(false),
        Bson::Double(n) if *n == 1.0 => Ok(true),
        _ => Err(ListQueryError::invalid(format!(
            "select value for '{field}' must be 0, 1, true or false"
        ))),
    }
}

/// Strip every sensitive path from a fetched record.
///
/// Also walks arrays of sub-documents, so `items.secret` is removed from each
/// element of `items`.
pub fn redact(profile: &EntityProfile, record: &mut Document) {
    for field in profile.sensitive_fields() {
        let path: Vec<&str> = field.split('.').collect();
        remove_path(record, &path);
    }
}

fn remove_path(doc: &mut Document, path: &[&str]) {
    match path {
        [] => {}
        [last] => {
            doc.remove(*last);
        }
        [head, rest @ ..] => match doc.get_mut(*head) {
            Some(Bson::Document(inner)) => remove_path(inner, rest),
            Some(Bson::Array(items)) => {
                for item in items {
                    if let Bson::Document(inner) = item {
                        remove_path(inner, rest);
                    }
                }
            }
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn users() -> EntityProfile {
        EntityProfile::new("users", "users")
            .default_projection(&["name", "email", "createdAt"])
            .sensitive(&["password"])
    }

    fn map(select: Document) -> Selection {
        Selection::Map(select)
    }

    #[test]
    fn test_no_selection_uses_default() {
        let projection = resolve_projection(&users(), None).unwrap();
        assert_eq!(projection, Some(doc! { "name": 1, "email": 1, "createdAt": 1 }));
    }

    #[test]
    fn test_sensitive_only_selection_falls_back_to_default() {
        let projection = resolve_projection(&users(), Some(&map(doc! { "password": 1 }))).unwrap();
        assert_eq!(projection, Some(doc! { "name": 1, "email": 1, "createdAt": 1 }));
    }

    #[test]
    fn test_inclusion_strips_sensitive_keys() {
        let select = map(doc! { "name": 1, "password": 1, "password.salt": true });
        let projection = resolve_projection(&users(), Some(&select)).unwrap();
        assert_eq!(projection, Some(doc! { "name": 1 }));
    }

    #[test]
    fn test_exclusion_also_hides_sensitive() {
        let select = map(doc! { "phone": 0, "_id": 0 });
        let projection = resolve_projection(&users(), Some(&select)).unwrap();
        assert_eq!(projection, Some(doc! { "phone": 0, "_id": 0, "password": 0 }));
    }

    #[test]
    fn test_id_only_inclusion_is_not_exclusion() {
        let projection = resolve_projection(&users(), Some(&map(doc! { "_id": 1 }))).unwrap();
        assert_eq!(projection, Some(doc! { "_id": 1 }));
    }

    #[test]
    fn test_string_selection() {
        let select = Selection::Fields("name, email -phone +role".to_string());
        let projection = resolve_projection(&users(), Some(&select)).unwrap();
        assert_eq!(projection, Some(doc! { "name": 1, "email": 1, "phone": 0, "role": 1 }));
    }

    #[test]
    fn test_computed_values_rejected() {
        for select in [doc! { "p": "$password" }, doc! { "name": 2 }, doc! { "name": { "$slice": 1 } }] {
            let err = resolve_projection(&users(), Some(&map(select))).unwrap_err();
            assert!(matches!(err, ListQueryError::InvalidSpecification(_)));
        }
    }

    #[test]
    fn test_operator_keys_rejected() {
        let select = Selection::Fields("$where name".to_string());
        assert!(resolve_projection(&users(), Some(&select)).is_err());
    }

    #[test]
    fn test_redact_nested_and_arrays() {
        let profile = EntityProfile::new("admins", "admins").sensitive(&["password", "sessions.token"]);
        let mut record = doc! {
            "name": "Ada",
            "password": "$argon2id$...",
            "sessions": [{ "token": "t1", "ip": "10.0.0.1" }, { "token": "t2" }],
        };
        redact(&profile, &mut record);
        assert_eq!(
            record,
            doc! { "name": "Ada", "sessions": [{ "ip": "10.0.0.1" }, {}] }
        );
    }
}

//! Back-office service: list queries plus the write rules of each entity

use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use list_query::{Listing, QuerySpec, redact};
use mongodb::bson::{Bson, DateTime, Document, oid::ObjectId};
use std::sync::Arc;
use tracing::{debug, instrument};
use validator::{Validate, ValidateEmail};

use crate::entity::{EntityDefinition, EntityKind, SLUG_FIELD};
use crate::error::{BackofficeError, BackofficeResult};
use crate::models::RecordPayload;
use crate::repository::RecordRepository;
use crate::slug::{candidate, slugify};

/// Slug suffixes tried before giving up
const MAX_SLUG_ATTEMPTS: u32 = 50;

pub struct BackofficeService<R: RecordRepository> {
    repository: Arc<R>,
}

impl<R: RecordRepository> BackofficeService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, spec), fields(entity = %entity))]
    pub async fn list(&self, entity: EntityKind, spec: QuerySpec) -> BackofficeResult<Listing> {
        spec.validate()
            .map_err(|e| BackofficeError::Validation(e.to_string()))?;
        self.repository.list(entity, &spec).await
    }

    #[instrument(skip(self), fields(entity = %entity))]
    pub async fn get(&self, entity: EntityKind, id: ObjectId) -> BackofficeResult<Document> {
        self.repository
            .find_by_id(entity, id)
            .await?
            .ok_or(BackofficeError::NotFound {
                entity: entity.profile().name(),
                id,
            })
    }

    #[instrument(skip(self, payload), fields(entity = %entity))]
    pub async fn create(&self, entity: EntityKind, payload: RecordPayload) -> BackofficeResult<Document> {
        let def = entity.definition();
        let mut record = payload.into_document()?;

        for field in def.required {
            if is_blank(record.get(*field)) {
                return Err(BackofficeError::validation(format!("{field} is required")));
            }
        }
        self.prepare(def, &mut record, None).await?;

        let now = DateTime::now();
        record.insert("createdAt", now);
        record.insert("updatedAt", now);

        let mut stored = self.repository.insert(entity, record).await?;
        redact(&def.profile, &mut stored);
        Ok(stored)
    }

    #[instrument(skip(self, payload), fields(entity = %entity))]
    pub async fn update(
        &self,
        entity: EntityKind,
        id: ObjectId,
        payload: RecordPayload,
    ) -> BackofficeResult<Document> {
        let def = entity.definition();
        let mut changes = payload.into_document()?;
        if changes.is_empty() {
            return Err(BackofficeError::validation("no fields to update"));
        }

        for field in def.required {
            if changes.contains_key(*field) && is_blank(changes.get(*field)) {
                return Err(BackofficeError::validation(format!("{field} cannot be empty")));
            }
        }
        self.prepare(def, &mut changes, Some(id)).await?;
        changes.insert("updatedAt", DateTime::now());

        let mut stored = self
            .repository
            .update(entity, id, changes)
            .await?
            .ok_or(BackofficeError::NotFound {
                entity: def.profile.name(),
                id,
            })?;
        redact(&def.profile, &mut stored);
        Ok(stored)
    }

    #[instrument(skip(self), fields(entity = %entity))]
    pub async fn delete(&self, entity: EntityKind, id: ObjectId) -> BackofficeResult<()> {
        if self.repository.delete(entity, id).await? {
            Ok(())
        } else {
            Err(BackofficeError::NotFound {
                entity: entity.profile().name(),
                id,
            })
        }
    }

    /// Field rules shared by create and update. `except` is the record being
    /// updated, which may keep its own unique values.
    async fn prepare(
        &self,
        def: &EntityDefinition,
        record: &mut Document,
        except: Option<ObjectId>,
    ) -> BackofficeResult<()> {
        for key in record.keys() {
            if def.profile.touches_sensitive(key) && def.credential != Some(key.as_str()) {
                return Err(BackofficeError::validation(format!("{key} cannot be written")));
            }
        }

        for field in def.email_fields {
            match record.get(*field) {
                None | Some(Bson::Null) => {}
                Some(Bson::String(email)) if email.validate_email() => {}
                Some(_) => {
                    return Err(BackofficeError::validation(format!(
                        "{field} must be a valid email address"
                    )));
                }
            }
        }

        if let Some(field) = def.credential {
            if let Some(value) = record.get(field) {
                let password = value
                    .as_str()
                    .ok_or_else(|| BackofficeError::validation(format!("{field} must be a string")))?;
                validate_password(password)?;
                let hash = hash_password(password.to_string()).await?;
                record.insert(field, hash);
            }
        }

        if def.has_slug() {
            self.assign_slug(def, record, except).await?;
        }

        for field in def.unique.iter().filter(|f| **f != SLUG_FIELD) {
            let Some(value) = record.get(*field) else {
                continue;
            };
            if self
                .repository
                .exists(def.kind, field, value, except)
                .await?
            {
                return Err(BackofficeError::Duplicate {
                    field: field.to_string(),
                    value: display(value),
                });
            }
        }

        Ok(())
    }

    /// An explicit `slug` wins over the source fields; either way the result
    /// is slugified and suffixed until it is free.
    async fn assign_slug(
        &self,
        def: &EntityDefinition,
        record: &mut Document,
        except: Option<ObjectId>,
    ) -> BackofficeResult<()> {
        let source = std::iter::once(SLUG_FIELD)
            .chain(def.slug_sources.iter().copied())
            .find_map(|field| record.get_str(field).ok().filter(|s| !s.trim().is_empty()));

        let Some(source) = source else {
            // Updates that leave the sources alone keep their slug
            return match except {
                Some(_) => Ok(()),
                None => Err(BackofficeError::validation(format!(
                    "one of {} is required",
                    def.slug_sources.join(", ")
                ))),
            };
        };

        let base = slugify(source);
        if base.is_empty() {
            return Err(BackofficeError::validation(
                "slug source must contain ASCII letters or digits",
            ));
        }

        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = candidate(&base, attempt);
            let taken = self
                .repository
                .exists(def.kind, SLUG_FIELD, &Bson::String(slug.clone()), except)
                .await?;
            if !taken {
                debug!(slug = %slug, attempt, "Slug assigned");
                record.insert(SLUG_FIELD, slug);
                return Ok(());
            }
        }

        Err(BackofficeError::Duplicate {
            field: SLUG_FIELD.to_string(),
            value: base,
        })
    }
}

impl<R: RecordRepository> Clone for BackofficeService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

fn is_blank(value: Option<&Bson>) -> bool {
    match value {
        None | Some(Bson::Null) => true,
        Some(Bson::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn display(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn validate_password(password: &str) -> BackofficeResult<()> {
    let length = password.chars().count();
    if length < 8 {
        return Err(BackofficeError::validation("Password must be at least 8 characters"));
    }
    if length > 128 {
        return Err(BackofficeError::validation("Password cannot exceed 128 characters"));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(BackofficeError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(BackofficeError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(BackofficeError::validation("Password must contain at least one digit"));
    }
    Ok(())
}

/// Argon2id PHC string, computed off the async runtime
async fn hash_password(password: String) -> BackofficeResult<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| BackofficeError::Internal(format!("password hashing failed: {e}")))
    })
    .await
    .map_err(|e| BackofficeError::Internal(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockRecordRepository;
    use mongodb::bson::doc;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> RecordPayload {
        serde_json::from_value(value).unwrap()
    }

    fn echo_insert(repo: &mut MockRecordRepository) {
        repo.expect_insert().returning(|_, mut record| {
            record.insert("_id", ObjectId::new());
            Ok(record)
        });
    }

    #[tokio::test]
    async fn test_create_user_hashes_password_and_hides_it() {
        let mut repo = MockRecordRepository::new();
        repo.expect_exists()
            .withf(|entity, field, _, except| *entity == EntityKind::Users && field == "email" && except.is_none())
            .times(1)
            .returning(|_, _, _, _| Ok(false));
        repo.expect_insert()
            .withf(|_, record| {
                record
                    .get_str("password")
                    .is_ok_and(|hash| hash.starts_with("$argon2id$"))
                    && record.get_datetime("createdAt").is_ok()
                    && record.get_datetime("updatedAt").is_ok()
            })
            .times(1)
            .returning(|_, mut record| {
                record.insert("_id", ObjectId::new());
                Ok(record)
            });

        let service = BackofficeService::new(repo);
        let stored = service
            .create(
                EntityKind::Users,
                payload(json!({ "name": "Ada", "email": "ada@example.com", "password": "Analytical1" })),
            )
            .await
            .unwrap();

        assert!(!stored.contains_key("password"));
        assert_eq!(stored.get_str("name").unwrap(), "Ada");
    }

    #[tokio::test]
    async fn test_create_rejects_weak_password_before_writing() {
        let mut repo = MockRecordRepository::new();
        repo.expect_insert().never();
        repo.expect_exists().never();

        let service = BackofficeService::new(repo);
        let err = service
            .create(
                EntityKind::Admins,
                payload(json!({ "name": "Root", "email": "root@example.com", "password": "short" })),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(ref m) if m.contains("8 characters")));
    }

    #[tokio::test]
    async fn test_create_requires_fields() {
        let mut repo = MockRecordRepository::new();
        repo.expect_insert().never();

        let service = BackofficeService::new(repo);
        let err = service
            .create(EntityKind::Contacts, payload(json!({ "name": "Ada", "email": "ada@example.com", "message": "  " })))
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(ref m) if m == "message is required"));
    }

    #[tokio::test]
    async fn test_create_validates_email() {
        let mut repo = MockRecordRepository::new();
        repo.expect_insert().never();

        let service = BackofficeService::new(repo);
        let err = service
            .create(EntityKind::Contacts, payload(json!({ "name": "Ada", "email": "not-an-email", "message": "hi" })))
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_unique_value() {
        let mut repo = MockRecordRepository::new();
        repo.expect_exists().returning(|_, _, _, _| Ok(true));
        repo.expect_insert().never();

        let service = BackofficeService::new(repo);
        let err = service
            .create(EntityKind::Newsletters, payload(json!({ "email": "ada@example.com" })))
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::Duplicate { ref field, .. } if field == "email"));
    }

    #[tokio::test]
    async fn test_gallery_slug_gets_numeric_suffix_on_collision() {
        let mut repo = MockRecordRepository::new();
        repo.expect_exists()
            .withf(|_, field, value, _| field == "slug" && value.as_str() == Some("summer-sale"))
            .returning(|_, _, _, _| Ok(true));
        repo.expect_exists()
            .withf(|_, field, value, _| field == "slug" && value.as_str() == Some("summer-sale-2"))
            .returning(|_, _, _, _| Ok(false));
        echo_insert(&mut repo);

        let service = BackofficeService::new(repo);
        let stored = service
            .create(EntityKind::Galleries, payload(json!({ "title": "Summer Sale!" })))
            .await
            .unwrap();
        assert_eq!(stored.get_str("slug").unwrap(), "summer-sale-2");
    }

    #[tokio::test]
    async fn test_special_package_slug_falls_back_to_name() {
        let mut repo = MockRecordRepository::new();
        repo.expect_exists().returning(|_, _, _, _| Ok(false));
        echo_insert(&mut repo);

        let service = BackofficeService::new(repo);
        let stored = service
            .create(EntityKind::SpecialPackages, payload(json!({ "name": "Family Pack", "price": 99 })))
            .await
            .unwrap();
        assert_eq!(stored.get_str("slug").unwrap(), "family-pack");
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let mut repo = MockRecordRepository::new();
        repo.expect_update().returning(|_, _, _| Ok(None));

        let service = BackofficeService::new(repo);
        let err = service
            .update(EntityKind::Contacts, ObjectId::new(), payload(json!({ "status": "read" })))
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::NotFound { entity: "contacts", .. }));
    }

    #[tokio::test]
    async fn test_update_bumps_updated_at_and_rehashes_password() {
        let id = ObjectId::new();
        let mut repo = MockRecordRepository::new();
        repo.expect_exists().returning(|_, _, _, _| Ok(false));
        repo.expect_update()
            .withf(move |entity, target, changes| {
                *entity == EntityKind::Admins
                    && *target == id
                    && changes.get_datetime("updatedAt").is_ok()
                    && !changes.contains_key("createdAt")
                    && changes.get_str("password").is_ok_and(|h| h.starts_with("$argon2id$"))
            })
            .times(1)
            .returning(|_, id, changes| {
                let mut stored = doc! { "_id": id, "name": "Root" };
                for (key, value) in changes {
                    stored.insert(key, value);
                }
                Ok(Some(stored))
            });

        let service = BackofficeService::new(repo);
        let stored = service
            .update(EntityKind::Admins, id, payload(json!({ "password": "N3wSecret", "createdAt": "2020-01-01" })))
            .await
            .unwrap();
        assert!(!stored.contains_key("password"));
    }

    #[tokio::test]
    async fn test_update_cannot_blank_required_field() {
        let service = BackofficeService::new(MockRecordRepository::new());
        let err = service
            .update(EntityKind::Profiles, ObjectId::new(), payload(json!({ "firstName": "" })))
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_without_fields_is_rejected() {
        let service = BackofficeService::new(MockRecordRepository::new());
        let err = service
            .update(EntityKind::Discounts, ObjectId::new(), payload(json!({ "_id": "x" })))
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(ref m) if m == "no fields to update"));
    }

    #[tokio::test]
    async fn test_update_unique_check_excludes_self() {
        let id = ObjectId::new();
        let mut repo = MockRecordRepository::new();
        repo.expect_exists()
            .withf(move |_, field, _, except| field == "code" && *except == Some(id))
            .times(1)
            .returning(|_, _, _, _| Ok(false));
        repo.expect_update().returning(|_, _, changes| Ok(Some(changes)));

        let service = BackofficeService::new(repo);
        service
            .update(EntityKind::Discounts, id, payload(json!({ "code": "SUMMER10" })))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_and_delete_not_found() {
        let mut repo = MockRecordRepository::new();
        repo.expect_find_by_id().returning(|_, _| Ok(None));
        repo.expect_delete().returning(|_, _| Ok(false));

        let service = BackofficeService::new(repo);
        let id = ObjectId::new();
        assert!(matches!(
            service.get(EntityKind::Manuscripts, id).await,
            Err(BackofficeError::NotFound { entity: "manuscripts", .. })
        ));
        assert!(matches!(
            service.delete(EntityKind::Manuscripts, id).await,
            Err(BackofficeError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_validates_spec_before_querying() {
        let mut repo = MockRecordRepository::new();
        repo.expect_list().never();

        let service = BackofficeService::new(repo);
        let err = service
            .list(EntityKind::Contacts, QuerySpec::new().with_search("x".repeat(201)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackofficeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_passes_through() {
        let mut repo = MockRecordRepository::new();
        repo.expect_list()
            .withf(|entity, spec| *entity == EntityKind::Users && spec.search.as_deref() == Some("ada"))
            .times(1)
            .returning(|_, _| {
                Ok(Listing {
                    data: vec![doc! { "name": "Ada" }],
                    count: 1,
                })
            });

        let service = BackofficeService::new(repo);
        let listing = service
            .list(EntityKind::Users, QuerySpec::new().with_search("ada"))
            .await
            .unwrap();
        assert_eq!(listing.count, 1);
    }
}

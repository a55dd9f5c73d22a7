//! The entity catalogue: one [`EntityDefinition`] per back-office collection.

use std::sync::LazyLock;

use list_query::EntityProfile;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use utoipa::ToSchema;

/// Entities served under `/api/{entity}`
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    ToSchema,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    Contacts,
    Newsletters,
    Galleries,
    Manuscripts,
    Profiles,
    Discounts,
    SpecialPackages,
    Admins,
    Users,
}

impl EntityKind {
    pub fn definition(self) -> &'static EntityDefinition {
        &CATALOGUE[self as usize]
    }

    pub fn profile(self) -> &'static EntityProfile {
        &self.definition().profile
    }
}

/// A list profile plus the rules applied when records are written.
#[derive(Debug)]
pub struct EntityDefinition {
    pub kind: EntityKind,
    pub profile: EntityProfile,
    /// Singular noun used in messages ("contact", "special package")
    pub label: &'static str,
    /// Must be present and non-empty on create
    pub required: &'static [&'static str],
    /// Must hold a valid e-mail address when present
    pub email_fields: &'static [&'static str],
    /// Checked for collisions before writes and backed by unique indexes
    pub unique: &'static [&'static str],
    /// First present field is slugified into `slug`
    pub slug_sources: &'static [&'static str],
    /// Plain-text password on input, argon2 hash at rest
    pub credential: Option<&'static str>,
}

impl EntityDefinition {
    pub fn has_slug(&self) -> bool {
        !self.slug_sources.is_empty()
    }
}

pub const SLUG_FIELD: &str = "slug";

static CATALOGUE: LazyLock<Vec<EntityDefinition>> =
    LazyLock::new(|| EntityKind::iter().map(define).collect());

fn define(kind: EntityKind) -> EntityDefinition {
    match kind {
        EntityKind::Contacts => EntityDefinition {
            kind,
            profile: EntityProfile::new("contacts", "contacts")
                .searchable(&["name", "email", "phone", "subject"])
                .default_projection(&["name", "email", "phone", "subject", "message", "status", "createdAt"]),
            label: "contact",
            required: &["name", "email", "message"],
            email_fields: &["email"],
            unique: &[],
            slug_sources: &[],
            credential: None,
        },
        EntityKind::Newsletters => EntityDefinition {
            kind,
            profile: EntityProfile::new("newsletters", "newsletters")
                .searchable(&["email"])
                .default_projection(&["email", "isSubscribed", "createdAt"]),
            label: "newsletter subscription",
            required: &["email"],
            email_fields: &["email"],
            unique: &["email"],
            slug_sources: &[],
            credential: None,
        },
        EntityKind::Galleries => EntityDefinition {
            kind,
            profile: EntityProfile::new("galleries", "galleries")
                .searchable(&["title", "description"])
                .default_projection(&["title", "slug", "description", "images", "isPublished", "createdAt"]),
            label: "gallery",
            required: &["title"],
            email_fields: &[],
            unique: &[SLUG_FIELD],
            slug_sources: &["title"],
            credential: None,
        },
        EntityKind::Manuscripts => EntityDefinition {
            kind,
            profile: EntityProfile::new("manuscripts", "manuscripts")
                .searchable(&["title", "authorName", "email"])
                .default_projection(&["title", "slug", "authorName", "email", "status", "createdAt"]),
            label: "manuscript",
            required: &["title", "authorName", "email"],
            email_fields: &["email"],
            unique: &[SLUG_FIELD],
            slug_sources: &["title", "name"],
            credential: None,
        },
        EntityKind::Profiles => EntityDefinition {
            kind,
            profile: EntityProfile::new("profiles", "profiles")
                .searchable(&["firstName", "lastName", "email", "phone"])
                .default_projection(&["firstName", "lastName", "email", "phone", "address", "createdAt"]),
            label: "profile",
            required: &["firstName", "email"],
            email_fields: &["email"],
            unique: &["email"],
            slug_sources: &[],
            credential: None,
        },
        EntityKind::Discounts => EntityDefinition {
            kind,
            profile: EntityProfile::new("discounts", "discounts")
                .searchable(&["code", "description"])
                .default_projection(&[
                    "code",
                    "description",
                    "percentage",
                    "amount",
                    "validFrom",
                    "validUntil",
                    "isActive",
                    "createdAt",
                ]),
            label: "discount",
            required: &["code"],
            email_fields: &[],
            unique: &["code"],
            slug_sources: &[],
            credential: None,
        },
        EntityKind::SpecialPackages => EntityDefinition {
            kind,
            profile: EntityProfile::new("special-packages", "specialpackages")
                .searchable(&["name", "title", "description"])
                .default_projection(&["name", "title", "slug", "price", "description", "isActive", "createdAt"]),
            label: "special package",
            required: &["name"],
            email_fields: &[],
            unique: &[SLUG_FIELD],
            slug_sources: &["title", "name"],
            credential: None,
        },
        EntityKind::Admins => EntityDefinition {
            kind,
            profile: EntityProfile::new("admins", "admins")
                .searchable(&["name", "email"])
                .default_projection(&["name", "email", "role", "status", "createdAt"])
                .sensitive(&["password"]),
            label: "admin",
            required: &["name", "email", "password"],
            email_fields: &["email"],
            unique: &["email"],
            slug_sources: &[],
            credential: Some("password"),
        },
        EntityKind::Users => EntityDefinition {
            kind,
            profile: EntityProfile::new("users", "users")
                .searchable(&["name", "email", "phone"])
                .default_projection(&["name", "email", "phone", "status", "createdAt"])
                .sensitive(&["password"]),
            label: "user",
            required: &["name", "email", "password"],
            email_fields: &["email"],
            unique: &["email"],
            slug_sources: &[],
            credential: Some("password"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_catalogue_is_indexed_by_kind() {
        for kind in EntityKind::iter() {
            assert_eq!(kind.definition().kind, kind);
            assert_eq!(kind.profile().name(), kind.to_string());
        }
    }

    #[test]
    fn test_kebab_case_names() {
        assert_eq!(EntityKind::SpecialPackages.to_string(), "special-packages");
        assert_eq!(EntityKind::from_str("special-packages").unwrap(), EntityKind::SpecialPackages);
        assert!(EntityKind::from_str("orders").is_err());
    }

    #[test]
    fn test_credentials_are_sensitive() {
        for kind in EntityKind::iter() {
            let def = kind.definition();
            if let Some(field) = def.credential {
                assert!(def.profile.is_sensitive(field), "{kind}");
            }
        }
    }

    #[test]
    fn test_every_entity_is_searchable() {
        for kind in EntityKind::iter() {
            assert!(!kind.profile().searchable_fields().is_empty(), "{kind}");
        }
    }

    #[test]
    fn test_slug_entities_keep_slugs_unique() {
        for kind in EntityKind::iter() {
            let def = kind.definition();
            assert_eq!(def.has_slug(), def.unique.contains(&SLUG_FIELD), "{kind}");
        }
    }
}

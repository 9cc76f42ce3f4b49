use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use userbook_core_types::Sensitive;

/// Age at which a user counts as an adult for `get_adults`
pub const ADULT_AGE: i64 = 18;

/// Caller-supplied values of a user record
///
/// Everything except the identifier. Inserts take a `UserFields` and the
/// store assigns the id; updates take a full [`User`] and overwrite every
/// field listed here.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserFields {
    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Defaults to 0 when absent
    #[serde(default)]
    pub age: i64,

    /// Added in schema version 2
    #[serde(default)]
    pub email: Option<String>,

    /// Creation time in milliseconds since the Unix epoch
    #[serde(default)]
    pub created_at: Option<i64>,

    /// Raw image bytes, serialized as base64.
    ///
    /// Kept small: callers with real images should store a path in their own
    /// table instead of the bytes.
    #[serde(default, with = "avatar_base64")]
    pub avatar: Option<Vec<u8>>,
}

impl UserFields {
    /// Create fields with names and age; everything else absent
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, age: i64) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            age,
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_created_at(mut self, created_at_ms: i64) -> Self {
        self.created_at = Some(created_at_ms);
        self
    }

    pub fn with_avatar(mut self, avatar: Vec<u8>) -> Self {
        self.avatar = Some(avatar);
        self
    }

    /// `first_name` and `last_name` joined by a single space
    ///
    /// Computed on every call and never persisted. A missing part renders as
    /// the empty string.
    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
    }

    pub fn is_adult(&self) -> bool {
        self.age >= ADULT_AGE
    }
}

impl std::fmt::Debug for UserFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserFields")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("age", &self.age)
            .field("email", &self.email.as_ref().map(Sensitive::new))
            .field("created_at", &self.created_at)
            .field("avatar_len", &self.avatar.as_ref().map(Vec::len))
            .finish()
    }
}

/// A persisted user record
///
/// `id` is assigned by the store on first insert and never changes; it is
/// the only part of a record used for identity.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    #[serde(flatten)]
    pub fields: UserFields,
}

impl User {
    pub fn new(id: i64, fields: UserFields) -> Self {
        Self { id, fields }
    }

    pub fn full_name(&self) -> String {
        self.fields.full_name()
    }

    pub fn into_fields(self) -> UserFields {
        self.fields
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("fields", &self.fields)
            .finish()
    }
}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ID: {}, Name: {}, Age: {}",
            self.id,
            self.full_name(),
            self.fields.age
        )
    }
}

mod avatar_base64 {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => s.serialize_some(&STANDARD.encode(bytes)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded: Option<String> = Option::deserialize(d)?;
        encoded
            .map(|text| STANDARD.decode(text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

//! User records as they arrive on the wire and as they are stored.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Unsigned user identifier
pub type UserId = u64;

/// A stored address belonging to a user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The normalized user entity
///
/// `addresses` is always serialized as a list, empty when the user has none.
/// Timestamps are assigned by the repository when absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One record from an import stream
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ImportUser {
    #[serde(default)]
    pub id: NumericId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Vec<ImportAddress>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ImportAddress {
    #[serde(default, deserialize_with = "null_as_default")]
    pub street: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zip_code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub country: String,
}

impl From<ImportUser> for User {
    fn from(raw: ImportUser) -> Self {
        User {
            id: raw.id.get(),
            name: raw.name,
            email: raw.email,
            phone_number: raw.phone_number,
            addresses: raw
                .addresses
                .into_iter()
                .map(|addr| Address {
                    street: addr.street,
                    city: addr.city,
                    state: addr.state,
                    zip_code: addr.zip_code,
                    country: addr.country,
                    ..Address::default()
                })
                .collect(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// An identifier that accepts a JSON number or a JSON string of digits
///
/// `null` decodes to zero so that validation, not decoding, reports the
/// missing id. Empty, non-numeric, negative and fractional values are
/// decoding errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NumericId(u64);

impl NumericId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> UserId {
        self.0
    }
}

impl fmt::Display for NumericId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for NumericId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NumericIdVisitor)
    }
}

struct NumericIdVisitor;

impl<'de> de::Visitor<'de> for NumericIdVisitor {
    type Value = NumericId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer or a string of digits")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<NumericId, E> {
        Ok(NumericId(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<NumericId, E> {
        u64::try_from(v)
            .map(NumericId)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<NumericId, E> {
        Err(E::invalid_type(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<NumericId, E> {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            return Err(E::custom("id is required"));
        }
        // `u64::from_str` takes a leading '+', which is not a digit
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(E::custom(format!("id must be numeric: {trimmed:?}")));
        }
        trimmed
            .parse::<u64>()
            .map(NumericId)
            .map_err(|e| E::custom(format!("id must be numeric: {e}")))
    }

    fn visit_unit<E: de::Error>(self) -> Result<NumericId, E> {
        Ok(NumericId::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<NumericId, E> {
        Ok(NumericId::default())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> Result<ImportUser, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_string_id_matches_numeric_id() {
        let from_string = decode(r#"{"id":"42","name":"Ada"}"#).unwrap();
        let from_number = decode(r#"{"id":42,"name":"Ada"}"#).unwrap();
        assert_eq!(from_string, from_number);
        assert_eq!(from_string.id.get(), 42);
    }

    #[test]
    fn test_string_id_is_trimmed() {
        let user = decode(r#"{"id":"  7 \n","name":"Ada"}"#).unwrap();
        assert_eq!(user.id.get(), 7);
    }

    #[test]
    fn test_empty_string_id_is_required_error() {
        let err = decode(r#"{"id":"   ","name":"Ada"}"#).unwrap_err();
        assert!(err.to_string().contains("id is required"), "{err}");
    }

    #[test]
    fn test_non_numeric_id_is_rejected() {
        let err = decode(r#"{"id":"abc","name":"Ada"}"#).unwrap_err();
        assert!(err.to_string().contains("id must be numeric"), "{err}");
    }

    #[test]
    fn test_signed_string_ids_are_rejected() {
        for id in ["+5", "-5", " +5 ", "5e2", "0x10"] {
            let json = format!(r#"{{"id":"{id}","name":"Ada"}}"#);
            let err = decode(&json).unwrap_err();
            assert!(err.to_string().contains("id must be numeric"), "{id}: {err}");
        }
    }

    #[test]
    fn test_duplicate_keys_are_a_decode_error() {
        let err = decode(r#"{"id":1,"id":2,"name":"Ada"}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate field `id`"), "{err}");
    }

    #[test]
    fn test_negative_and_fractional_ids_are_rejected() {
        assert!(decode(r#"{"id":-3}"#).is_err());
        assert!(decode(r#"{"id":1.5}"#).is_err());
    }

    #[test]
    fn test_missing_or_null_id_decodes_to_zero() {
        assert_eq!(decode(r#"{"name":"Ada"}"#).unwrap().id.get(), 0);
        assert_eq!(decode(r#"{"id":null,"name":"Ada"}"#).unwrap().id.get(), 0);
    }

    #[test]
    fn test_null_fields_become_empty() {
        let user = decode(r#"{"id":1,"name":null,"addresses":null}"#).unwrap();
        assert_eq!(user.name, "");
        assert!(user.addresses.is_empty());
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let user = decode(r#"{"id":1,"name":"Ada","nickname":"countess"}"#).unwrap();
        assert_eq!(user.name, "Ada");
    }

    #[test]
    fn test_conversion_keeps_address_order() {
        let raw = decode(
            r#"{"id":9,"name":"Ada","email":"ada@example.com","phone_number":"555",
                "addresses":[{"street":"1 First St","city":"A"},{"street":"2 Second St","city":"B"}]}"#,
        )
        .unwrap();
        let user = User::from(raw);
        assert_eq!(user.id, 9);
        assert_eq!(user.addresses.len(), 2);
        assert_eq!(user.addresses[0].street, "1 First St");
        assert_eq!(user.addresses[1].city, "B");
        assert!(user.created_at.is_none());
    }

    #[test]
    fn test_user_without_addresses_serializes_empty_list() {
        let user = User {
            id: 3,
            name: "Ada".to_string(),
            ..User::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["addresses"], serde_json::json!([]));
    }
}

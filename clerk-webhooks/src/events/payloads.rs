//! Payload shapes carried in the `data` field of Clerk webhook events.
//!
//! Only the commonly used fields are typed. Everything else the provider
//! sends is kept in `extra`, so a payload can always be re-serialized
//! without losing information. Every field defaults when absent, which keeps
//! decoding tolerant of catalog additions on the provider side. An explicit
//! `null` is read the same way as an absent field.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Fields not modelled explicitly.
pub type Extra = Map<String, Value>;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Outbound email sent through Clerk (`email.created`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub slug: Option<String>,
    pub from_email_name: Option<String>,
    pub to_email_address: Option<String>,
    pub email_address_id: Option<String>,
    pub user_id: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub body_plain: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub delivered_by_clerk: bool,
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Outbound SMS sent through Clerk (`sms.created`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsMessageJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub slug: Option<String>,
    pub from_phone_number: Option<String>,
    pub to_phone_number: Option<String>,
    pub phone_number_id: Option<String>,
    pub user_id: Option<String>,
    pub message: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub delivered_by_clerk: bool,
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Tombstone sent for every `*.deleted` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletedObjectJson {
    pub object: Option<String>,
    pub id: Option<String>,
    pub slug: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub deleted: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAddressJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email_address: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhoneNumberJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_number: String,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub external_id: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    pub primary_email_address_id: Option<String>,
    pub primary_phone_number_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub email_addresses: Vec<EmailAddressJson>,
    #[serde(deserialize_with = "null_as_default")]
    pub phone_numbers: Vec<PhoneNumberJson>,
    #[serde(deserialize_with = "null_as_default")]
    pub banned: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub locked: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub public_metadata: Map<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub private_metadata: Map<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub unsafe_metadata: Map<String, Value>,
    pub last_sign_in_at: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl UserJson {
    /// The address referenced by `primary_email_address_id`, if present.
    pub fn primary_email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref()?;
        self.email_addresses
            .iter()
            .find(|e| e.id == primary)
            .map(|e| e.email_address.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub client_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub last_active_organization_id: Option<String>,
    pub last_active_at: Option<i64>,
    pub expire_at: Option<i64>,
    pub abandon_at: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub name: Option<String>,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub has_image: bool,
    pub members_count: Option<u64>,
    pub max_allowed_memberships: Option<u64>,
    #[serde(deserialize_with = "null_as_default")]
    pub admin_delete_enabled: bool,
    pub created_by: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub public_metadata: Map<String, Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub private_metadata: Map<String, Value>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationDomainJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub name: Option<String>,
    pub organization_id: Option<String>,
    pub enrollment_mode: Option<String>,
    pub affiliation_email_address: Option<String>,
    pub verification: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub total_pending_invitations: u64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_pending_suggestions: u64,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationInvitationJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub email_address: Option<String>,
    pub organization_id: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub public_metadata: Map<String, Value>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicUserDataJson {
    pub user_id: Option<String>,
    pub identifier: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizationMembershipJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub role: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub permissions: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub organization: OrganizationJson,
    pub public_user_data: Option<PublicUserDataJson>,
    #[serde(deserialize_with = "null_as_default")]
    pub public_metadata: Map<String, Value>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub name: Option<String>,
    pub key: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub name: Option<String>,
    pub key: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_creator_eligible: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub permissions: Vec<PermissionJson>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Entry on the sign-up waitlist (`waitlistEntry.*`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitlistEntryJson {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    pub object: Option<String>,
    pub email_address: Option<String>,
    pub status: Option<String>,
    pub invitation: Option<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_locked: bool,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Extra,
}

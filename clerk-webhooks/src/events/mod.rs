//! Clerk webhook event catalog.
//!
//! Every known wire event type is one row in the `catalog!` table below.
//! Each row names the wire string, the configuration hook and the payload
//! type, and the macro derives from it:
//!
//! - [`EventType`], the tag enum with its wire strings,
//! - [`WebhookEvent`], the tagged union pairing each tag with its payload,
//! - the per-type handler slots in [`HandlerTable`] and the matching
//!   `on_*` builder methods on [`WebhookConfig`].
//!
//! Tracking a new provider event is a new row in the table.
//!
//! [`WebhookConfig`]: crate::config::WebhookConfig

pub mod envelope;
pub mod payloads;

use std::fmt;
use std::future::Future;
use std::str::FromStr;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::config::WebhookConfig;
use crate::handler::{Handler, HandlerResult};

pub use envelope::VerifiedEnvelope;
pub use payloads::*;

/// A wire event type outside the known catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

macro_rules! catalog {
    ($( $variant:ident => $wire:literal, $hook:ident, $payload:ty; )+) => {
        /// Known Clerk event types.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum EventType {
            $( $variant, )+
        }

        impl EventType {
            /// Every known event type, in catalog order.
            pub const ALL: &'static [EventType] = &[ $( EventType::$variant, )+ ];

            /// Wire name, e.g. `"user.created"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( EventType::$variant => $wire, )+
                }
            }

            /// Exact, case-sensitive lookup of a wire name.
            pub fn from_wire(wire: &str) -> Option<Self> {
                match wire {
                    $( $wire => Some(EventType::$variant), )+
                    _ => None,
                }
            }
        }

        /// A verified event with its payload decoded into the declared shape.
        #[derive(Debug, Clone, PartialEq)]
        pub enum WebhookEvent {
            $( $variant($payload), )+
        }

        impl WebhookEvent {
            pub fn event_type(&self) -> EventType {
                match self {
                    $( WebhookEvent::$variant(_) => EventType::$variant, )+
                }
            }

            /// Decode raw `data` into the payload declared for `event_type`.
            pub fn decode(event_type: EventType, data: Value) -> Result<Self, serde_json::Error> {
                match event_type {
                    $(
                        EventType::$variant => {
                            serde_json::from_value(data).map(WebhookEvent::$variant)
                        }
                    )+
                }
            }
        }

        /// One optional handler slot per event type.
        #[derive(Clone, Default)]
        pub struct HandlerTable {
            $( $hook: Option<Handler<$payload>>, )+
        }

        impl HandlerTable {
            pub fn is_registered(&self, event_type: EventType) -> bool {
                match event_type {
                    $( EventType::$variant => self.$hook.is_some(), )+
                }
            }

            /// Event types that have a handler, in catalog order.
            pub fn registered(&self) -> Vec<EventType> {
                EventType::ALL
                    .iter()
                    .copied()
                    .filter(|t| self.is_registered(*t))
                    .collect()
            }

            /// Start the handler for `event`, or `None` if none is registered.
            pub fn call(&self, event: WebhookEvent) -> Option<BoxFuture<'static, HandlerResult>> {
                match event {
                    $( WebhookEvent::$variant(payload) => {
                        self.$hook.as_ref().map(|handler| handler.call(payload))
                    } )+
                }
            }
        }

        impl WebhookConfig {
            $(
                #[doc = concat!("Handle `", $wire, "` events.")]
                pub fn $hook<F, Fut>(mut self, handler: F) -> Self
                where
                    F: Fn($payload) -> Fut + Send + Sync + 'static,
                    Fut: Future<Output = HandlerResult> + Send + 'static,
                {
                    self.handlers.$hook = Some(Handler::new(handler));
                    self
                }
            )+
        }
    };
}

catalog! {
    EmailCreated => "email.created", on_email_created, EmailJson;
    OrganizationCreated => "organization.created", on_organization_created, OrganizationJson;
    OrganizationDeleted => "organization.deleted", on_organization_deleted, DeletedObjectJson;
    OrganizationUpdated => "organization.updated", on_organization_updated, OrganizationJson;
    OrganizationDomainCreated => "organizationDomain.created", on_organization_domain_created, OrganizationDomainJson;
    OrganizationDomainDeleted => "organizationDomain.deleted", on_organization_domain_deleted, DeletedObjectJson;
    OrganizationDomainUpdated => "organizationDomain.updated", on_organization_domain_updated, OrganizationDomainJson;
    OrganizationInvitationAccepted => "organizationInvitation.accepted", on_organization_invitation_accepted, OrganizationInvitationJson;
    OrganizationInvitationCreated => "organizationInvitation.created", on_organization_invitation_created, OrganizationInvitationJson;
    OrganizationInvitationRevoked => "organizationInvitation.revoked", on_organization_invitation_revoked, OrganizationInvitationJson;
    OrganizationMembershipCreated => "organizationMembership.created", on_organization_membership_created, OrganizationMembershipJson;
    OrganizationMembershipDeleted => "organizationMembership.deleted", on_organization_membership_deleted, DeletedObjectJson;
    OrganizationMembershipUpdated => "organizationMembership.updated", on_organization_membership_updated, OrganizationMembershipJson;
    PermissionCreated => "permission.created", on_permission_created, PermissionJson;
    PermissionDeleted => "permission.deleted", on_permission_deleted, DeletedObjectJson;
    PermissionUpdated => "permission.updated", on_permission_updated, PermissionJson;
    RoleCreated => "role.created", on_role_created, RoleJson;
    RoleDeleted => "role.deleted", on_role_deleted, DeletedObjectJson;
    RoleUpdated => "role.updated", on_role_updated, RoleJson;
    SessionCreated => "session.created", on_session_created, SessionJson;
    SessionEnded => "session.ended", on_session_ended, SessionJson;
    SessionPending => "session.pending", on_session_pending, SessionJson;
    SessionRemoved => "session.removed", on_session_removed, SessionJson;
    SessionRevoked => "session.revoked", on_session_revoked, SessionJson;
    SmsCreated => "sms.created", on_sms_created, SmsMessageJson;
    UserCreated => "user.created", on_user_created, UserJson;
    UserCreatedAtEdge => "user.createdAtEdge", on_user_created_at_edge, UserJson;
    UserDeleted => "user.deleted", on_user_deleted, DeletedObjectJson;
    UserUpdated => "user.updated", on_user_updated, UserJson;
    WaitlistEntryCreated => "waitlistEntry.created", on_waitlist_entry_created, WaitlistEntryJson;
    WaitlistEntryUpdated => "waitlistEntry.updated", on_waitlist_entry_updated, WaitlistEntryJson;
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::from_wire(s).ok_or_else(|| UnknownEventType(s.to_string()))
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.registered().iter().map(|t| t.as_str()))
            .finish()
    }
}

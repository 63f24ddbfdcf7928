//! `IdentityStore` trait: the account-link mapping read by every webhook call.

use async_trait::async_trait;

use crate::error::IdentityError;

/// Durable mapping from an assistant-side identity to a chat account.
///
/// The external identity is an opaque key (an email-like handle or a
/// username) and is never validated for format. At most one account is
/// linked to an identity at any time.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Link `external_identity` to `account_id`.
    ///
    /// Create-if-absent: when two links for the same identity race, exactly
    /// one succeeds and the other gets [`IdentityError::AlreadyLinked`].
    async fn link(&self, external_identity: &str, account_id: &str) -> Result<(), IdentityError>;

    /// Remove the link for `external_identity`.
    ///
    /// After this returns `Ok`, `resolve` for the same identity fails with
    /// [`IdentityError::NotLinked`]. Unlinking an identity that has no link
    /// also reports `NotLinked`; [`IdentityError::NotFound`] is keyed by
    /// account id and belongs to the reverse lookup.
    async fn unlink(&self, external_identity: &str) -> Result<(), IdentityError>;

    /// Look up the account linked to `external_identity`.
    async fn resolve(&self, external_identity: &str) -> Result<String, IdentityError>;

    /// Reverse lookup: find the identity linked to `account_id`.
    ///
    /// This is a linear scan over at most one page of links; the table is
    /// expected to stay small.
    async fn resolve_by_account_id(&self, account_id: &str) -> Result<String, IdentityError>;
}

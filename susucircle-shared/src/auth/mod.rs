/// Authentication for SusuCircle
///
/// Credential storage and verification live with the external Identity
/// Provider; this module only carries the adapter contract and the
/// middleware support that turns a resolved identity into a request-scoped
/// [`middleware::AuthContext`].
///
/// # Modules
///
/// - [`identity`]: the `IdentityProvider` trait and its adapters (local
///   JWT validation, remote userinfo endpoint, static test table)
/// - [`middleware`]: bearer extraction, account lookup, `AuthContext`

pub mod identity;
pub mod middleware;

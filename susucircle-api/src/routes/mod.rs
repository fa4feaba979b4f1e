/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, and profile endpoints
/// - `groups`: Group lifecycle and membership endpoints
/// - `invitations`: Invitation issue/redeem/cancel endpoints
/// - `payments`: Contribution, settlement, and ledger endpoints

pub mod auth;
pub mod groups;
pub mod health;
pub mod invitations;
pub mod payments;

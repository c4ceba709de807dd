//! # Clubs Core
//!
//! Membership and attribute synchronization core for the clubs mobile app.
//! Keeps a user's followed-club list consistent between the in-memory cache,
//! the comma-joined roster attribute on their identity record, and the
//! denormalized per-club member counter in the club directory.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         CLUBS CORE MODULES                              │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Membership Coordinator                        │  │
//! │  │                                                                  │  │
//! │  │   membership set    admin set    directory snapshot              │  │
//! │  │   toggle_join       load         refresh_directory               │  │
//! │  │   filtered_by_role  create_club                                  │  │
//! │  └───────┬──────────────────────────────────────┬───────────────────┘  │
//! │          │                                      │                      │
//! │          ▼                                      ▼                      │
//! │  ┌───────────────────┐                ┌─────────────────────┐          │
//! │  │  Attribute Store  │                │   Club Directory    │          │
//! │  │                   │                │                     │          │
//! │  │ - roster get/set  │                │ - list clubs        │          │
//! │  │   on the identity │                │ - member counter    │          │
//! │  │   record          │                │ - admin listing     │          │
//! │  │                   │                │ - club creation     │          │
//! │  └───────────────────┘                └─────────────────────┘          │
//! │          │                                      │                      │
//! │          └───────────── HTTP (reqwest) ─────────┘                      │
//! │                                                                         │
//! │  Supporting: roster codec, session persistence, config, errors         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency Model
//!
//! Toggling membership mutates the local set synchronously and issues the
//! two remote writes (counter adjust, roster persist) as fire-and-forget
//! background work. Read failures degrade to "no data yet" or the previous
//! snapshot; background write failures are logged, never surfaced. The
//! member counter is a read-modify-write with no locking and can drift
//! under concurrent toggles — an accepted, documented weakness.
//!
//! ## Module Hierarchy
//!
//! - [`error`] - Error types for the entire library
//! - [`config`] - Endpoint, timeout, and attribute-name configuration
//! - [`roster`] - Comma-joined roster string codec
//! - [`session`] - Signed-in subject and its on-device persistence
//! - [`attributes`] - Identity attribute store client
//! - [`directory`] - Club directory client
//! - [`membership`] - The membership coordinator

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod attributes;
pub mod config;
pub mod directory;
pub mod error;
pub mod membership;
mod retry;
pub mod roster;
pub mod session;

// ============================================================================
// RE-EXPORTS
// ============================================================================

pub use attributes::{AttributeStore, HttpAttributeStore};
pub use config::CoreConfig;
pub use directory::{Club, ClubDirectory, ClubId, HttpClubDirectory};
pub use error::{Error, Result};
pub use membership::{MembershipCoordinator, Role};
pub use session::{Session, SessionStore};

use std::sync::Arc;

/// Build a coordinator wired to the HTTP clients described by `config`.
///
/// This is the production entry point; tests construct
/// [`MembershipCoordinator`] directly with in-memory clients.
pub fn coordinator_for(config: &CoreConfig, session: Session) -> Result<MembershipCoordinator> {
    let attributes = Arc::new(HttpAttributeStore::new(config)?);
    let clubs = Arc::new(HttpClubDirectory::new(config)?);
    Ok(MembershipCoordinator::new(
        session,
        attributes,
        clubs,
        config.clubs_attribute.clone(),
    ))
}

/// Returns the version of the clubs core
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_coordinator_for_wires_http_clients() {
        let coordinator =
            coordinator_for(&CoreConfig::default(), Session::new("sub-test")).unwrap();
        assert_eq!(coordinator.session().subject, "sub-test");
        assert!(coordinator.membership().is_empty());
    }
}

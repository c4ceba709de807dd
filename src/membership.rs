//! # Membership Coordinator
//!
//! The in-memory source of truth for "which clubs has this user joined" and
//! "which clubs does this user administer", and the one place that keeps
//! three things consistent: the local membership set, the remote roster
//! attribute string, and the remote per-club member counter.
//!
//! ## Toggle Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          TOGGLE-JOIN FLOW                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  UI event                                                              │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  toggle_join(club_id)          synchronous, never blocks on network    │
//! │     │                                                                   │
//! │     ├── 1. was_joined = membership.contains(club_id)                   │
//! │     ├── 2. mutate local set (add / remove) ── UI re-renders from here  │
//! │     │                                                                   │
//! │     └── 3. spawn background sync ──────────────┐                       │
//! │                                                 ▼                       │
//! │                     ┌──────────────────────────────────────────┐       │
//! │                     │ counter adjust        roster persist     │       │
//! │                     │ (read membersCount,   (write comma-join  │       │
//! │                     │  ±1, write back)       of local set)     │       │
//! │                     │        no ordering between the two       │       │
//! │                     └──────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Failures in the background sync are logged, never surfaced; local     │
//! │  and remote state may diverge until the next successful write.         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counter adjust is a read-modify-write with no locking: two sessions
//! toggling the same club can both read the same stale count and silently
//! lose one increment. That drift is accepted — the counter is an
//! approximate aggregate, clamped at zero, never a source of truth.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;

use crate::attributes::AttributeStore;
use crate::directory::{Club, ClubDirectory, ClubId};
use crate::error::{Error, Result};
use crate::roster;
use crate::session::Session;

/// Name of the club attribute holding the denormalized member counter.
const MEMBERS_COUNT_ATTRIBUTE: &str = "membersCount";

/// Which derived view of the directory to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Clubs the user administers.
    Admin,
    /// Clubs the user follows.
    Following,
}

/// Coordinates club membership state for one signed-in session.
///
/// One instance per active session, constructed explicitly with its remote
/// clients injected. There is no global instance and no "absent provider"
/// fallback: consumers always observe a fully-initialized coordinator.
pub struct MembershipCoordinator {
    /// The signed-in user's session (join key for per-user remote calls).
    session: Session,
    /// Identity attribute store (roster persistence).
    attributes: Arc<dyn AttributeStore>,
    /// Club directory (listing, counters, creation).
    clubs: Arc<dyn ClubDirectory>,
    /// Name of the roster attribute on the identity record.
    roster_attribute: String,
    /// Ids of clubs the user follows. Insertion-ordered, no duplicates.
    membership: Arc<RwLock<Vec<ClubId>>>,
    /// Ids of clubs the user administers. Read-only derived data.
    admins: Arc<RwLock<Vec<ClubId>>>,
    /// Latest directory snapshot.
    directory: Arc<RwLock<Vec<Club>>>,
    /// Monotonic id handed to each directory fetch.
    issued_generation: AtomicU64,
    /// Generation of the snapshot currently applied. A fetch that lost the
    /// race to a newer one is dropped instead of clobbering it.
    applied_generation: AtomicU64,
}

impl MembershipCoordinator {
    /// Create a coordinator for the given session.
    pub fn new(
        session: Session,
        attributes: Arc<dyn AttributeStore>,
        clubs: Arc<dyn ClubDirectory>,
        roster_attribute: impl Into<String>,
    ) -> Self {
        Self {
            session,
            attributes,
            clubs,
            roster_attribute: roster_attribute.into(),
            membership: Arc::new(RwLock::new(Vec::new())),
            admins: Arc::new(RwLock::new(Vec::new())),
            directory: Arc::new(RwLock::new(Vec::new())),
            issued_generation: AtomicU64::new(0),
            applied_generation: AtomicU64::new(0),
        }
    }

    // ── Initialization ───────────────────────────────────────────────────────

    /// Populate directory, membership, and admin state.
    ///
    /// The three fetches are independent and run concurrently; partial
    /// failure of any one leaves the corresponding state empty (or previous)
    /// rather than failing the whole initialization.
    pub async fn load(&self) {
        let generation = self.next_generation();
        let subject = self.session.subject.as_str();

        let (directory, roster, administered) = tokio::join!(
            self.clubs.list_clubs(),
            self.attributes.get_attribute(subject, &self.roster_attribute),
            self.clubs.list_administered(subject),
        );

        match directory {
            Ok(clubs) => {
                self.apply_directory_snapshot(generation, clubs);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Directory fetch failed during load");
            }
        }

        match roster {
            Ok(value) => {
                *self.membership.write() = roster::parse_roster(&value);
            }
            Err(e) if e.is_absence() => {
                // No roster attribute yet: the user follows no clubs.
                self.membership.write().clear();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Roster fetch failed during load");
            }
        }

        match administered {
            Ok(ids) => {
                *self.admins.write() = ids;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Admin listing failed during load");
            }
        }

        tracing::info!(
            clubs = self.directory.read().len(),
            following = self.membership.read().len(),
            administering = self.admins.read().len(),
            "Loaded membership state"
        );
    }

    // ── Toggle ───────────────────────────────────────────────────────────────

    /// Toggle membership of one club.
    ///
    /// The local set is mutated immediately and the call returns without
    /// waiting on the network; the counter adjustment and roster persist run
    /// in a background task whose handle is returned so callers may await or
    /// ignore it. Rapid repeated toggles each issue their own pair of remote
    /// calls in arrival order, with no cancellation of in-flight requests.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn toggle_join(&self, club_id: &str) -> JoinHandle<()> {
        let was_joined;
        let roster_value;
        {
            let mut membership = self.membership.write();
            was_joined = membership.iter().any(|id| id == club_id);
            if was_joined {
                membership.retain(|id| id != club_id);
            } else {
                membership.push(club_id.to_string());
            }
            roster_value = roster::serialize_roster(membership.iter());
        }

        tracing::info!(
            club_id,
            joined = !was_joined,
            "Toggled club membership locally"
        );

        let clubs = Arc::clone(&self.clubs);
        let attributes = Arc::clone(&self.attributes);
        let subject = self.session.subject.clone();
        let attribute = self.roster_attribute.clone();
        let club_id = club_id.to_string();

        tokio::spawn(async move {
            let counter = adjust_member_count(clubs.as_ref(), &club_id, was_joined);
            let persist = async {
                if !attributes
                    .set_attribute(&subject, &attribute, &roster_value)
                    .await
                {
                    tracing::warn!(club_id = club_id.as_str(), "Roster persist failed");
                }
            };
            // No defined ordering between the two remote writes.
            tokio::join!(counter, persist);
        })
    }

    // ── Directory ────────────────────────────────────────────────────────────

    /// Replace the directory wholesale from a fresh fetch.
    ///
    /// Does not touch membership or admin state. A refresh superseded by a
    /// newer one is dropped (last response wins); on failure the previous
    /// snapshot is retained and the error is returned.
    pub async fn refresh_directory(&self) -> Result<usize> {
        let generation = self.next_generation();
        let clubs = self.clubs.list_clubs().await?;
        let count = clubs.len();
        if self.apply_directory_snapshot(generation, clubs) {
            tracing::info!(clubs = count, "Refreshed club directory");
        }
        Ok(count)
    }

    fn next_generation(&self) -> u64 {
        self.issued_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a fetched snapshot unless a newer one already landed.
    fn apply_directory_snapshot(&self, generation: u64, clubs: Vec<Club>) -> bool {
        let mut directory = self.directory.write();
        let applied = self.applied_generation.load(Ordering::SeqCst);
        if generation <= applied {
            tracing::info!(generation, applied, "Dropping superseded directory snapshot");
            return false;
        }
        self.applied_generation.store(generation, Ordering::SeqCst);
        *directory = clubs;
        true
    }

    // ── Club creation ────────────────────────────────────────────────────────

    /// Create a club with the current user as its admin.
    ///
    /// Required fields are validated before any remote call. On success the
    /// new club is appended to the local directory snapshot and recorded in
    /// the admin set; the next refresh reconciles with the server view.
    pub async fn create_club(&self, name: &str, location: &str) -> Result<ClubId> {
        let name = name.trim();
        let location = location.trim();
        if name.is_empty() {
            return Err(Error::Validation("club name is required".into()));
        }
        if location.is_empty() {
            return Err(Error::Validation("club location is required".into()));
        }

        let id = self
            .clubs
            .create_club(name, location, &self.session.subject)
            .await?;

        self.directory.write().push(Club {
            id: id.clone(),
            name: name.to_string(),
            location: location.to_string(),
            members_count: 0,
            description: None,
            email: None,
            instagram: None,
        });
        self.admins.write().push(id.clone());

        tracing::info!(club_id = id.as_str(), name, "Created club");
        Ok(id)
    }

    // ── Derived views ────────────────────────────────────────────────────────

    /// Filtered view over the directory, preserving its relative ordering.
    ///
    /// Pure function of `(directory, admins, membership)`; cheap because the
    /// directory is expected to stay in the tens to low hundreds of clubs.
    pub fn filtered_by_role(&self, role: Role) -> Vec<Club> {
        let directory = self.directory.read();
        match role {
            Role::Admin => {
                let admins = self.admins.read();
                directory
                    .iter()
                    .filter(|club| admins.iter().any(|id| *id == club.id))
                    .cloned()
                    .collect()
            }
            Role::Following => {
                let membership = self.membership.read();
                directory
                    .iter()
                    .filter(|club| membership.iter().any(|id| *id == club.id))
                    .cloned()
                    .collect()
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    /// Ids of clubs the user follows.
    pub fn membership(&self) -> Vec<ClubId> {
        self.membership.read().clone()
    }

    /// Ids of clubs the user administers.
    pub fn admins(&self) -> Vec<ClubId> {
        self.admins.read().clone()
    }

    /// Latest directory snapshot.
    pub fn directory(&self) -> Vec<Club> {
        self.directory.read().clone()
    }

    /// Whether the user follows the given club.
    pub fn is_joined(&self, club_id: &str) -> bool {
        self.membership.read().iter().any(|id| id == club_id)
    }

    /// Whether the user administers the given club.
    pub fn is_admin(&self, club_id: &str) -> bool {
        self.admins.read().iter().any(|id| id == club_id)
    }

    /// The session this coordinator belongs to.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

/// Read-modify-write of a club's member counter.
///
/// No locking: the value read can already be stale by the time the write
/// lands. Never retried, since a retry could double-apply. A failed read
/// skips the write entirely rather than guessing.
async fn adjust_member_count(clubs: &dyn ClubDirectory, club_id: &str, was_joined: bool) {
    let current = match clubs
        .get_club_attribute(club_id, MEMBERS_COUNT_ATTRIBUTE)
        .await
    {
        Ok(value) => value.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0),
        Err(e) => {
            tracing::warn!(club_id, error = %e, "Member count read failed, skipping adjust");
            return;
        }
    };

    let adjusted = if was_joined {
        current.saturating_sub(1)
    } else {
        current.saturating_add(1)
    };

    clubs
        .set_club_attribute(club_id, MEMBERS_COUNT_ATTRIBUTE, &adjusted.to_string())
        .await;
}

// ============================================================================
// TESTS
// ============================================================================

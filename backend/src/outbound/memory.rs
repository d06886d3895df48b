//! In-memory adapters for the persistence-shaped ports.
//!
//! The relational store is an external collaborator; these adapters back
//! local serving and tests. Uniqueness invariants are enforced atomically
//! by doing the check and the insert under one write lock, mirroring the
//! unique constraints a relational adapter would rely on.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::impersonation::ImpersonationSession;
use crate::domain::portfolio::{Portfolio, PortfolioId, Position};
use crate::domain::ports::{
    ImpersonationRegistry, ImpersonationRegistryError, PortfolioStore, PortfolioStoreError,
    UserStore, UserStoreError,
};
use crate::domain::user::{EmailAddress, NewUser, User, UserId};

/// User store keeping accounts in a process-local map.
#[derive(Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    /// Remove an account outright.
    ///
    /// Deletion is an external operational action, not a core operation;
    /// this exists so tests can model it.
    pub fn remove(&self, id: UserId) -> Option<User> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, new_user: NewUser) -> Result<User, UserStoreError> {
        // Check-and-insert under one write lock: the in-memory analogue of
        // a unique index on email.
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.values().any(|u| u.email() == &new_user.email) {
            return Err(UserStoreError::DuplicateEmail);
        }
        let user = User::from_parts(
            UserId::random(),
            new_user.email,
            new_user.full_name,
            new_user.password_hash,
            new_user.is_superuser,
            new_user.created_at,
        );
        guard.insert(user.id(), user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserStoreError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserStoreError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.values().find(|u| u.email() == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, UserStoreError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut users: Vec<User> = guard.values().cloned().collect();
        users.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(users)
    }

    async fn set_superuser(&self, id: UserId, is_superuser: bool) -> Result<User, UserStoreError> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let existing = guard.get(&id).ok_or(UserStoreError::NotFound)?;
        let updated = User::from_parts(
            existing.id(),
            existing.email().clone(),
            existing.full_name().clone(),
            existing.password_hash().to_owned(),
            is_superuser,
            existing.created_at(),
        );
        guard.insert(id, updated.clone());
        Ok(updated)
    }
}

/// Portfolio store keyed by owner, enforcing one portfolio per user.
#[derive(Default)]
pub struct InMemoryPortfolioStore {
    inner: RwLock<HashMap<UserId, Portfolio>>,
}

#[async_trait]
impl PortfolioStore for InMemoryPortfolioStore {
    async fn create(
        &self,
        owner: UserId,
        positions: Vec<Position>,
        created_at: DateTime<Utc>,
    ) -> Result<Portfolio, PortfolioStoreError> {
        // Keying the map by owner makes the uniqueness constraint
        // structural; the occupied check and insert share one lock.
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.contains_key(&owner) {
            return Err(PortfolioStoreError::AlreadyExists);
        }
        let portfolio = Portfolio {
            id: PortfolioId::random(),
            owner,
            positions,
            created_at,
        };
        guard.insert(owner, portfolio.clone());
        Ok(portfolio)
    }

    async fn find_by_owner(&self, owner: UserId) -> Result<Option<Portfolio>, PortfolioStoreError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.get(&owner).cloned())
    }
}

/// Impersonation registry keyed by operator id.
#[derive(Default)]
pub struct InMemoryImpersonationRegistry {
    inner: RwLock<HashMap<UserId, ImpersonationSession>>,
}

#[async_trait]
impl ImpersonationRegistry for InMemoryImpersonationRegistry {
    async fn begin(
        &self,
        session: ImpersonationSession,
        now: DateTime<Utc>,
    ) -> Result<(), ImpersonationRegistryError> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = guard.get(&session.operator)
            && existing.is_active(now)
        {
            return Err(ImpersonationRegistryError::AlreadyActive);
        }
        // A lapsed or ended leftover is replaced in place.
        guard.insert(session.operator, session);
        Ok(())
    }

    async fn active(
        &self,
        operator: UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<ImpersonationSession>, ImpersonationRegistryError> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard
            .get(&operator)
            .filter(|session| session.is_active(now))
            .cloned())
    }

    async fn end(
        &self,
        operator: UserId,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<ImpersonationSession>, ImpersonationRegistryError> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(existing) = guard.get(&operator) else {
            return Ok(None);
        };
        if !existing.is_active(ended_at) {
            return Ok(None);
        }
        let mut ended = existing.clone();
        ended.ended_at = Some(ended_at);
        guard.remove(&operator);
        Ok(Some(ended))
    }
}

#[cfg(test)]
mod tests {
    //! Invariant coverage for the in-memory adapters.
    use super::*;
    use crate::domain::user::FullName;
    use chrono::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: EmailAddress::new(email).expect("valid email"),
            full_name: FullName::new("Test User").expect("valid name"),
            password_hash: "$argon2id$fixture".to_owned(),
            is_superuser: false,
            created_at: Utc::now(),
        }
    }

    fn position() -> Position {
        Position {
            symbol: "VTI".to_owned(),
            quantity: 10.0,
            price: 220.35,
            trade_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 15).expect("date"),
            equity_balance: 25_000.0,
        }
    }

    fn session(operator: UserId, now: DateTime<Utc>) -> ImpersonationSession {
        ImpersonationSession {
            operator,
            target: UserId::random(),
            started_at: now,
            expires_at: now + Duration::hours(8),
            ended_at: None,
        }
    }

    #[actix_web::test]
    async fn duplicate_emails_are_rejected_atomically() {
        let store = InMemoryUserStore::default();
        store.create(new_user("ada@example.com")).await.expect("first insert");
        let err = store
            .create(new_user("Ada@Example.com"))
            .await
            .expect_err("case-insensitive duplicate");
        assert_eq!(err, UserStoreError::DuplicateEmail);
        assert_eq!(store.list().await.expect("list works").len(), 1);
    }

    #[actix_web::test]
    async fn concurrent_registrations_with_one_email_have_one_winner() {
        let store = InMemoryUserStore::default();
        let (a, b) = futures_util::future::join(
            store.create(new_user("race@example.com")),
            store.create(new_user("race@example.com")),
        )
        .await;
        assert_ne!(a.is_ok(), b.is_ok(), "exactly one create must win");
        assert_eq!(store.list().await.expect("list works").len(), 1);
    }

    #[actix_web::test]
    async fn concurrent_portfolio_commits_have_one_winner() {
        let store = InMemoryPortfolioStore::default();
        let owner = UserId::random();
        let (a, b) = futures_util::future::join(
            store.create(owner, vec![position()], Utc::now()),
            store.create(owner, vec![position(), position()], Utc::now()),
        )
        .await;
        assert_ne!(a.is_ok(), b.is_ok(), "exactly one commit must win");
    }

    #[actix_web::test]
    async fn concurrent_impersonation_begins_have_one_winner() {
        let registry = InMemoryImpersonationRegistry::default();
        let operator = UserId::random();
        let now = Utc::now();
        let (a, b) = futures_util::future::join(
            registry.begin(session(operator, now), now),
            registry.begin(session(operator, now), now),
        )
        .await;
        assert_ne!(a.is_ok(), b.is_ok(), "exactly one begin must win");
    }

    #[actix_web::test]
    async fn set_superuser_on_missing_user_fails() {
        let store = InMemoryUserStore::default();
        let err = store
            .set_superuser(UserId::random(), true)
            .await
            .expect_err("missing user");
        assert_eq!(err, UserStoreError::NotFound);
    }

    #[actix_web::test]
    async fn one_portfolio_per_owner() {
        let store = InMemoryPortfolioStore::default();
        let owner = UserId::random();
        store
            .create(owner, vec![position()], Utc::now())
            .await
            .expect("first commit");
        let err = store
            .create(owner, vec![position(), position()], Utc::now())
            .await
            .expect_err("second commit");
        assert_eq!(err, PortfolioStoreError::AlreadyExists);

        // The loser's rows never replaced the winner's.
        let stored = store
            .find_by_owner(owner)
            .await
            .expect("lookup works")
            .expect("portfolio exists");
        assert_eq!(stored.positions.len(), 1);
    }

    #[actix_web::test]
    async fn registry_enforces_one_active_session_per_operator() {
        let registry = InMemoryImpersonationRegistry::default();
        let operator = UserId::random();
        let now = Utc::now();

        registry
            .begin(session(operator, now), now)
            .await
            .expect("first begin");
        let err = registry
            .begin(session(operator, now), now)
            .await
            .expect_err("second begin");
        assert_eq!(err, ImpersonationRegistryError::AlreadyActive);

        // A different operator is unaffected.
        let other = UserId::random();
        registry
            .begin(session(other, now), now)
            .await
            .expect("other operator begins");
    }

    #[actix_web::test]
    async fn expired_sessions_are_replaceable_and_not_endable() {
        let registry = InMemoryImpersonationRegistry::default();
        let operator = UserId::random();
        let now = Utc::now();

        registry
            .begin(session(operator, now), now)
            .await
            .expect("begin");

        let later = now + Duration::hours(9);
        assert!(registry
            .active(operator, later)
            .await
            .expect("query works")
            .is_none());
        assert!(registry.end(operator, later).await.expect("end works").is_none());
        registry
            .begin(session(operator, later), later)
            .await
            .expect("lapsed session is replaced");
    }

    #[actix_web::test]
    async fn end_stamps_the_session() {
        let registry = InMemoryImpersonationRegistry::default();
        let operator = UserId::random();
        let now = Utc::now();
        registry
            .begin(session(operator, now), now)
            .await
            .expect("begin");

        let stop_at = now + Duration::minutes(30);
        let ended = registry
            .end(operator, stop_at)
            .await
            .expect("end works")
            .expect("session existed");
        assert_eq!(ended.ended_at, Some(stop_at));
        assert!(registry
            .active(operator, stop_at)
            .await
            .expect("query works")
            .is_none());
    }
}

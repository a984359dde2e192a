// src/store.rs

use crate::database;
use crate::error::EngineResult;
use crate::models::PerformanceProfile;
use crate::repository;
use log::{debug, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Persistence boundary for performance profiles. `save` must be atomic per profile.
pub trait ProfileStore {
    fn load(&self, student_id: &str) -> EngineResult<PerformanceProfile>;
    fn save(&self, profile: &PerformanceProfile) -> EngineResult<()>;
}

/// SQLite-backed store. All access goes through one connection behind a mutex,
/// and writes run in `IMMEDIATE` transactions so other processes sharing the
/// file are serialized too.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> EngineResult<Self> {
        database::init_db(&conn)?;
        Ok(SqliteStore {
            db: Mutex::new(conn),
        })
    }

    pub fn open(path: impl AsRef<Path>) -> EngineResult<Self> {
        info!("Database path: {:?}", path.as_ref());
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> EngineResult<Self> {
        Self::new(Connection::open_in_memory()?)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read-only access to the connection.
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> EngineResult<T>) -> EngineResult<T> {
        let conn = self.conn();
        f(&conn)
    }

    /// Runs `f` in a single transaction. Any error rolls back everything `f` wrote.
    pub fn transact<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    /// Load-modify-save of one student's profile with no interleaving writer.
    /// Whatever `f` writes through the transaction commits with the profile.
    pub fn update(
        &self,
        student_id: &str,
        f: impl FnOnce(&Transaction<'_>, &mut PerformanceProfile) -> EngineResult<()>,
    ) -> EngineResult<PerformanceProfile> {
        self.transact(|tx| {
            let mut profile = repository::load_profile(tx, student_id)?;
            f(tx, &mut profile)?;
            repository::save_profile(tx, &profile)?;
            debug!("[Store] Updated profile {}", student_id);
            Ok(profile)
        })
    }
}

impl ProfileStore for SqliteStore {
    fn load(&self, student_id: &str) -> EngineResult<PerformanceProfile> {
        self.with_conn(|conn| repository::load_profile(conn, student_id))
    }

    fn save(&self, profile: &PerformanceProfile) -> EngineResult<()> {
        self.transact(|tx| repository::save_profile(tx, profile))
    }
}

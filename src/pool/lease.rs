/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *  
 */
use std::time::{Duration, Instant};
use chrono::{DateTime, Local};
use rusqlite::{Connection, Params, Row};
use tracing::{debug, error, warn};
use uuid::Uuid;
use crate::driver::sqlite::SqliteConnection;
use crate::errors::{Result, RosterError};
use crate::interceptor::StatementLogger;

/// Transaction isolation requested for a lease.
///
/// SQLite transactions are always serializable; the weaker levels only relax
/// locking. `ReadUncommitted` turns on `read_uncommitted` for shared-cache
/// readers, the two weakest levels begin lazily (`DEFERRED`) and the two
/// strongest take the write lock up front (`IMMEDIATE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IsolationLevel {
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    #[default]
    Serializable,
}

impl IsolationLevel {
    fn begin_sql(&self) -> &'static str {
        match self {
            IsolationLevel::ReadUncommitted | IsolationLevel::ReadCommitted => "BEGIN DEFERRED",
            IsolationLevel::RepeatableRead | IsolationLevel::Serializable => "BEGIN IMMEDIATE",
        }
    }
}

/// How a unit of work wants its lease prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaseOptions {
    pub auto_commit: bool,
    pub isolation: IsolationLevel,
}

impl Default for LeaseOptions {
    fn default() -> Self {
        Self { auto_commit: true, isolation: IsolationLevel::default() }
    }
}

impl LeaseOptions {
    pub fn transactional(isolation: IsolationLevel) -> Self {
        Self { auto_commit: false, isolation }
    }
}

/// A connection borrowed from the pool, used by one caller at a time.
///
/// Dropping the lease hands the connection back. A transaction still open at
/// that point is rolled back first.
#[derive(Debug)]
pub struct Lease {
    conn: SqliteConnection,
    id: Uuid,
    tag: String,
    borrowed_at: DateTime<Local>,
    borrowed: Instant,
    auto_commit: bool,
    isolation: IsolationLevel,
    logger: StatementLogger,
}

impl Lease {
    pub(crate) fn new(conn: SqliteConnection, logger: StatementLogger) -> Self {
        let id = Uuid::new_v4();
        let tag = id.simple().to_string()[..8].to_string();
        debug!(lease = tag.as_str(), "Connection leased");
        Lease {
            conn,
            id,
            tag,
            borrowed_at: Local::now(),
            borrowed: Instant::now(),
            auto_commit: true,
            isolation: IsolationLevel::default(),
            logger,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn borrowed_at(&self) -> DateTime<Local> {
        self.borrowed_at
    }

    pub fn held_for(&self) -> Duration {
        self.borrowed.elapsed()
    }

    pub fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation
    }

    /// The raw connection, for anything the statement helpers do not cover.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Disabling auto-commit opens a transaction; re-enabling it commits the open one.
    pub fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        match (self.auto_commit, auto_commit) {
            (true, false) => self.begin(),
            (false, true) => self.commit(),
            _ => Ok(()),
        }
    }

    /// Must be chosen before a transaction starts.
    pub fn set_isolation_level(&mut self, isolation: IsolationLevel) -> Result<()> {
        if self.isolation == isolation {
            return Ok(());
        }
        if self.in_transaction() {
            return Err(RosterError::invalid_argument("cannot change isolation inside a transaction"));
        }
        if isolation == IsolationLevel::ReadUncommitted {
            self.run_batch("PRAGMA read_uncommitted = 1")?;
        } else if self.isolation == IsolationLevel::ReadUncommitted {
            self.run_batch("PRAGMA read_uncommitted = 0")?;
        }
        self.isolation = isolation;
        Ok(())
    }

    pub fn begin(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(RosterError::invalid_argument("a transaction is already open on this lease"));
        }
        self.run_batch(self.isolation.begin_sql())?;
        self.auto_commit = false;
        Ok(())
    }

    pub fn commit(&mut self) -> Result<()> {
        if self.auto_commit {
            return Err(RosterError::invalid_argument("commit requested while auto-commit is enabled"));
        }
        self.run_batch("COMMIT")?;
        self.auto_commit = true;
        Ok(())
    }

    /// Roll back the open transaction, if any.
    pub fn rollback(&mut self) -> Result<()> {
        if self.in_transaction() {
            self.run_batch("ROLLBACK")?;
        }
        self.auto_commit = true;
        Ok(())
    }

    /// Execute a statement, returning the number of rows changed.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<usize> {
        let started = self.logger.before(&self.tag, sql);
        let result = self.conn
            .prepare_cached(sql)
            .and_then(|mut stmt| stmt.execute(params))
            .map_err(RosterError::from);
        self.logger.after(&self.tag, sql, started, &result, |changed| *changed);
        result
    }

    /// Run a query and map every row.
    pub fn query<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Vec<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let started = self.logger.before(&self.tag, sql);
        let result = collect_rows(&self.conn, sql, params, f).map_err(RosterError::from);
        self.logger.after(&self.tag, sql, started, &result, Vec::len);
        result
    }

    /// Run a query expected to match at most one row.
    pub fn query_opt<T, P, F>(&self, sql: &str, params: P, f: F) -> Result<Option<T>>
    where
        P: Params,
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut rows = self.query(sql, params, f)?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            n => Err(RosterError::DataError(format!("expected at most one row, got {n}"))),
        }
    }

    pub fn last_insert_id(&self) -> i64 {
        self.conn.last_insert_rowid()
    }

    fn run_batch(&self, sql: &str) -> Result<()> {
        let started = self.logger.before(&self.tag, sql);
        let result = self.conn.execute_batch(sql).map_err(RosterError::from);
        self.logger.after(&self.tag, sql, started, &result, |_| 0);
        result
    }
}

fn collect_rows<T, P, F>(conn: &Connection, sql: &str, params: P, f: F) -> rusqlite::Result<Vec<T>>
where
    P: Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt.query_map(params, f)?;
    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

impl Drop for Lease {
    /// Will rollback an abandoned transaction.
    fn drop(&mut self) {
        if self.in_transaction() {
            warn!(lease = self.tag.as_str(), "Lease released with an open transaction, rolling back");
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                error!(lease = self.tag.as_str(), "Rollback on release failed: {}", e);
            }
        }
        if self.isolation == IsolationLevel::ReadUncommitted {
            if let Err(e) = self.conn.execute_batch("PRAGMA read_uncommitted = 0") {
                error!(lease = self.tag.as_str(), "Could not reset read_uncommitted: {}", e);
            }
        }
        debug!(lease = self.tag.as_str(), "Connection released after {} ms", self.held_for().as_millis());
    }
}

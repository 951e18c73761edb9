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
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use r2d2::Pool;
use rusqlite::{Connection, OpenFlags};
use tracing::info;
use crate::config::{Endpoint, RosterConfig};
use crate::driver::sqlite::{register_functions, validate_connection};
use crate::errors::{Result, RosterError};
use crate::pool::events::{PoolEventLogger, TracingErrorHandler};

pub type SqlitePool = Pool<SqliteConnectionManager>;
pub type SqliteConnection = r2d2::PooledConnection<SqliteConnectionManager>;

type InitFn = dyn Fn(&mut Connection) -> std::result::Result<(), rusqlite::Error> + Send + Sync + 'static;

pub struct SqliteConnectionManager {
    path: PathBuf,
    flags: OpenFlags,
    busy_timeout: Duration,
    validation_query: String,
    validation_timeout: Duration,
    init: Option<Box<InitFn>>,
}

impl fmt::Debug for SqliteConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut builder = f.debug_struct("SqliteConnectionManager");
        let _ = builder.field("path", &self.path);
        let _ = builder.field("flags", &self.flags);
        let _ = builder.field("busy_timeout", &self.busy_timeout);
        let _ = builder.field("validation_query", &self.validation_query);
        let _ = builder.field("validation_timeout", &self.validation_timeout);
        let _ = builder.field("init", &self.init.as_ref().map(|_| "InitFn"));
        builder.finish()
    }
}

impl SqliteConnectionManager {

    pub fn new(cfg: &RosterConfig) -> Result<Self> {
        match cfg.endpoint()? {
            Endpoint::Sqlite(path) => Ok(Self::file(path)
                .with_busy_timeout(cfg.connection_timeout())
                .with_validation(cfg.validation_query(), cfg.validation_timeout())),
        }
    }

    /// Creates a new `SqliteConnectionManager` from file.
    ///
    /// See `rusqlite::Connection::open`
    pub fn file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            flags: OpenFlags::default(),
            busy_timeout: Duration::from_secs(5),
            validation_query: crate::config::DEFAULT_VALIDATION_QUERY.to_string(),
            validation_timeout: Duration::from_secs(5),
            init: None,
        }
    }

    /// Converts `SqliteConnectionManager` into one that sets OpenFlags upon
    /// connection creation.
    pub fn with_flags(self, flags: OpenFlags) -> Self {
        Self { flags, ..self }
    }

    /// How long a statement waits on a locked database before failing busy.
    pub fn with_busy_timeout(self, busy_timeout: Duration) -> Self {
        Self { busy_timeout, ..self }
    }

    pub fn with_validation<S: Into<String>>(self, query: S, timeout: Duration) -> Self {
        Self { validation_query: query.into(), validation_timeout: timeout, ..self }
    }

    /// Converts `SqliteConnectionManager` into one that calls an initialization
    /// function upon connection creation, after the built-in PRAGMAs and
    /// functions are in place.
    pub fn with_init<F>(self, init: F) -> Self
    where
        F: Fn(&mut Connection) -> std::result::Result<(), rusqlite::Error> + Send + Sync + 'static,
    {
        let init: Option<Box<InitFn>> = Some(Box::new(init));
        Self { init, ..self }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run the validation query against `conn`.
    pub fn validate(&self, conn: &Connection) -> Result<()> {
        validate_connection(conn, &self.validation_query, self.validation_timeout, self.busy_timeout)
    }
}

impl r2d2::ManageConnection for SqliteConnectionManager {
    type Connection = Connection;
    type Error = RosterError;

    fn connect(&self) -> Result<Connection> {
        let mut conn = Connection::open_with_flags(&self.path, self.flags)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(&conn)?;
        if let Some(ref init) = self.init {
            init(&mut conn)?;
        }
        Ok(conn)
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<()> {
        self.validate(conn)
    }

    /// A connection handed back inside an open transaction is not reused.
    fn has_broken(&self, conn: &mut Connection) -> bool {
        !conn.is_autocommit()
    }
}

///
/// Create a connection pool
/// cfg Configuration information
///
pub fn init_sqlite_pool(cfg: &RosterConfig) -> Result<SqlitePool> {
    init_sqlite_pool_with(cfg, SqliteConnectionManager::new(cfg)?)
}

/// Create a connection pool around an already configured manager.
pub fn init_sqlite_pool_with(cfg: &RosterConfig, manager: SqliteConnectionManager) -> Result<SqlitePool> {
    cfg.validate()?;
    let path = manager.path().to_path_buf();
    let builder = r2d2::Pool::builder()
        .max_size(cfg.max_size())
        .min_idle(Some(cfg.min_idle()))
        .connection_timeout(cfg.connection_timeout())
        .idle_timeout(Some(cfg.idle_timeout()))
        .max_lifetime(Some(cfg.max_lifetime()))
        .test_on_check_out(true)
        .error_handler(Box::new(TracingErrorHandler::new(cfg.pool_name())))
        .event_handler(Box::new(PoolEventLogger::new(cfg.pool_name(), cfg.leak_detection_threshold())));

    if !cfg.initialization_fail_fast() {
        info!("{} - Deferring connection to {} until first use", cfg.pool_name(), path.display());
        return Ok(builder.build_unchecked(manager));
    }

    let pool = builder.build(manager).map_err(|e| {
        RosterError::StartupError(format!("Failed to create SQLite connection pool for {}: {}", path.display(), e))
    })?;

    // Testing connections
    let conn = pool.get().map_err(|e| {
        RosterError::StartupError(format!("Failed to get connection from pool: {}", e))
    })?;
    drop(conn);

    Ok(pool)
}

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
//!
//! Common Errors.
//!
use std::fmt;
use rusqlite::ErrorCode;

pub type Result<T> = std::result::Result<T, RosterError>;

/// Broad classes a caller can map onto a response without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed settings or a store that cannot be reached at startup. Never retried.
    Configuration,
    /// Acquisition timeout, failed validation, busy or dropped connection.
    Transient,
    /// Uniqueness or check-constraint failure on write.
    Integrity,
    /// Rejected before reaching the store.
    Invalid,
    /// Any other statement failure reported by the engine.
    Query,
    /// A row could not be mapped into a record.
    Data,
}

#[derive(Debug)]
pub enum RosterError {
    ConfigError(String),
    UrlParseError(String),
    StartupError(String),
    PoolExhausted(String),
    PoolClosed,
    ValidationFailed(String),
    ConnectionError(String),
    IntegrityViolation(String),
    DatabaseError(String),
    DataError(String),
    InvalidRecord(String),
    InvalidArgument(String),
}

impl RosterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RosterError::ConfigError(_)
            | RosterError::UrlParseError(_)
            | RosterError::StartupError(_)
            | RosterError::PoolClosed => ErrorKind::Configuration,
            RosterError::PoolExhausted(_)
            | RosterError::ValidationFailed(_)
            | RosterError::ConnectionError(_) => ErrorKind::Transient,
            RosterError::IntegrityViolation(_) => ErrorKind::Integrity,
            RosterError::InvalidRecord(_) | RosterError::InvalidArgument(_) => ErrorKind::Invalid,
            RosterError::DatabaseError(_) => ErrorKind::Query,
            RosterError::DataError(_) => ErrorKind::Data,
        }
    }

    /// Only transient connection and acquisition failures may be retried.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// The store could not be reached at all, as opposed to rejecting a statement.
    pub fn is_unavailable(&self) -> bool {
        self.is_retryable() || matches!(self, RosterError::PoolClosed)
    }

    pub fn config_error<T: Into<String>>(msg: T) -> Self {
        RosterError::ConfigError(msg.into())
    }

    pub fn invalid_record<T: Into<String>>(msg: T) -> Self {
        RosterError::InvalidRecord(msg.into())
    }

    pub fn invalid_argument<T: Into<String>>(msg: T) -> Self {
        RosterError::InvalidArgument(msg.into())
    }
}

impl fmt::Display for RosterError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RosterError::ConfigError(e) => write!(f, "Configuration Error: {e}"),
            RosterError::UrlParseError(e) => write!(f, "Url Parse Error: {e}"),
            RosterError::StartupError(e) => write!(f, "Startup Error: {e}"),
            RosterError::PoolExhausted(e) => write!(f, "Connection pool exhausted: {e}"),
            RosterError::PoolClosed => write!(f, "Connection pool is closed"),
            RosterError::ValidationFailed(e) => write!(f, "Connection validation failed: {e}"),
            RosterError::ConnectionError(e) => write!(f, "Connection Error: {e}"),
            RosterError::IntegrityViolation(e) => write!(f, "Integrity Violation: {e}"),
            RosterError::DatabaseError(e) => write!(f, "Database Error: {e}"),
            RosterError::DataError(e) => write!(f, "Data Error: {e}"),
            RosterError::InvalidRecord(e) => write!(f, "Invalid Record: {e}"),
            RosterError::InvalidArgument(e) => write!(f, "Invalid Argument: {e}"),
        }
    }
}

impl std::error::Error for RosterError {}

impl From<rusqlite::Error> for RosterError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, _) => match failure.code {
                ErrorCode::ConstraintViolation => RosterError::IntegrityViolation(err.to_string()),
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::OperationInterrupted => RosterError::ConnectionError(err.to_string()),
                _ => RosterError::DatabaseError(err.to_string()),
            },
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::InvalidColumnIndex(_)
            | rusqlite::Error::InvalidColumnName(_)
            | rusqlite::Error::IntegralValueOutOfRange(..)
            | rusqlite::Error::UserFunctionError(_) => RosterError::DataError(err.to_string()),
            _ => RosterError::DatabaseError(err.to_string()),
        }
    }
}

impl From<r2d2::Error> for RosterError {
    fn from(err: r2d2::Error) -> Self {
        RosterError::PoolExhausted(err.to_string())
    }
}

impl From<url::ParseError> for RosterError {
    fn from(err: url::ParseError) -> Self {
        RosterError::UrlParseError(err.to_string())
    }
}


#[cfg(test)]
mod test {
    use rusqlite::ffi;
    use super::*;

    fn sqlite_failure(result_code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(ffi::Error::new(result_code), Some("boom".to_string()))
    }

    #[test]
    fn constraint_failures_are_integrity_and_not_retried() {
        let err = RosterError::from(sqlite_failure(ffi::SQLITE_CONSTRAINT_UNIQUE));
        assert_eq!(err.kind(), ErrorKind::Integrity);
        assert!(!err.is_retryable());
    }

    #[test]
    fn busy_and_unopenable_stores_are_transient() {
        for code in [ffi::SQLITE_BUSY, ffi::SQLITE_LOCKED, ffi::SQLITE_CANTOPEN] {
            let err = RosterError::from(sqlite_failure(code));
            assert!(err.is_retryable(), "result code {code} should be retryable");
        }
    }

    #[test]
    fn pool_closed_is_fatal() {
        assert!(RosterError::PoolClosed.is_fatal());
        assert!(!RosterError::PoolClosed.is_retryable());
        assert!(RosterError::PoolExhausted("all leased".to_string()).is_retryable());
    }
}

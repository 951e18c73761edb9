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
//! Pool manager tests.
//!
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use roster::prelude::*;
mod common;
use common::*;

#[test]
fn test_pool_creation() {
    let (_dir, url) = temp_store();
    let pool = PoolManager::new(create_test_cfg(&url));
    assert!(pool.is_ok(), "The pool should start: {:?}", pool.err());
    let pool = pool.unwrap();
    assert_eq!(pool.name(), "TestPool");
    assert!(!pool.is_closed());
    assert!(pool.status().total >= 1);
}

#[test]
fn test_malformed_config_is_fatal() {
    let bad = [
        RosterConfig::new("not a url"),
        RosterConfig::new("postgres://localhost/db"),
        RosterConfig::new("sqlite://x.db").set_max_size(0),
        RosterConfig::new("sqlite://x.db").set_max_size(2).set_min_idle(3),
        RosterConfig::new("sqlite://x.db").set_validation_query("  "),
    ];
    for cfg in bad {
        let err = PoolManager::new(cfg).unwrap_err();
        assert!(err.is_fatal(), "expected a fatal error, got {err}");
        assert!(!err.is_retryable());
    }
}

#[test]
fn test_unreachable_store_fails_fast_at_startup() {
    let cfg = create_test_cfg(&unreachable_url()).set_connection_timeout(Duration::from_millis(200));
    let err = PoolManager::new(cfg).unwrap_err();
    assert!(matches!(err, RosterError::StartupError(_)), "got {err}");
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_third_acquire_waits_at_max_size_two() {
    let (_dir, url) = temp_store();
    let pool = PoolManager::new(create_test_cfg(&url).set_max_size(2).set_min_idle(0)).unwrap();
    let first = pool.acquire().unwrap();
    let _second = pool.acquire().unwrap();

    let started = Instant::now();
    let err = pool.acquire_timeout(Duration::from_millis(200)).unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert!(err.is_retryable(), "acquire timeout should be transient, got {err}");
    let status = pool.status();
    assert_eq!(status.total, 2);
    assert_eq!(status.active, 2);

    drop(first);
    assert!(pool.acquire_timeout(Duration::from_millis(200)).is_ok());
}

#[test]
fn test_waiting_caller_gets_released_lease() {
    let (_dir, url) = temp_store();
    let pool = PoolManager::new(create_test_cfg(&url).set_max_size(1).set_min_idle(0)).unwrap();
    let held = pool.acquire().unwrap();
    let barrier = Arc::new(Barrier::new(2));

    let waiter = {
        let pool = pool.clone();
        let barrier = barrier.clone();
        thread::spawn(move || {
            barrier.wait();
            pool.acquire_timeout(Duration::from_secs(5)).map(|lease| lease.id())
        })
    };
    barrier.wait();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(pool.status().waiting, 1);
    drop(held);
    assert!(waiter.join().unwrap().is_ok());
    assert_eq!(pool.status().waiting, 0);
}

#[test]
fn test_status_counts_stay_consistent() {
    let (_dir, url) = temp_store();
    let pool = PoolManager::new(create_test_cfg(&url).set_min_idle(0)).unwrap();
    let leases: Vec<Lease> = (0..3).map(|_| pool.acquire().unwrap()).collect();
    let status = pool.status();
    assert_eq!(status.active + status.idle, status.total);
    assert!(status.total <= 4);
    assert_eq!(status.active, 3);
    drop(leases);
    let status = pool.status();
    assert_eq!(status.active, 0);
    assert_eq!(status.idle, status.total);
}

#[test]
fn test_failing_validation_query_never_hands_out_connections() {
    let (_dir, url) = temp_store();
    let cfg = create_test_cfg(&url)
        .set_min_idle(0)
        .set_validation_query("SELECT * FROM no_such_table")
        .set_initialization_fail_fast(false);
    let pool = PoolManager::new(cfg).unwrap();
    let err = pool.acquire_timeout(Duration::from_millis(200)).unwrap_err();
    assert!(err.is_retryable(), "got {err}");
}

#[test]
fn test_lease_metadata_and_validation() {
    let (_dir, url) = temp_store();
    let pool = PoolManager::new(create_test_cfg(&url)).unwrap();
    let lease = pool.acquire().unwrap();
    assert!(lease.auto_commit());
    assert!(!lease.in_transaction());
    assert!(lease.held_for() < Duration::from_secs(5));
    assert!(pool.validate(&lease).is_ok());
    let other = pool.acquire().unwrap();
    assert_ne!(lease.id(), other.id());
}

#[test]
fn test_shutdown_rejects_new_leases() {
    let (_dir, url) = temp_store();
    let pool = PoolManager::new(create_test_cfg(&url)).unwrap();
    let outstanding = pool.acquire().unwrap();
    pool.shutdown();
    pool.shutdown();
    assert!(pool.is_closed());
    assert!(matches!(pool.acquire(), Err(RosterError::PoolClosed)));
    assert_eq!(pool.status().total, 0);
    // An outstanding lease still works until it is released.
    assert_eq!(outstanding.query("SELECT 1", [], |row| row.get::<_, i64>(0)).unwrap(), vec![1]);
    drop(outstanding);
    assert!(matches!(pool.acquire(), Err(RosterError::PoolClosed)));
    assert_eq!(pool.status().total, 0);
}

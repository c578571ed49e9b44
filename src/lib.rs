//! Sales Ledger - indexed in-memory sales store
//!
//! Records time-stamped sales per store and answers "revenue for store S
//! between t1 and t2" from running totals and a sparse time index, without
//! rescanning the store's history.

pub mod config;
pub mod domain;
pub mod http;
pub mod service;
pub mod storage;
pub mod utils;

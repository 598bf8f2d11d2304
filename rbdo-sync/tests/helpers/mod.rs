//! Test Helper Utilities
//!
//! Shared utilities for testing rbdo-sync

pub mod catalog;

pub use catalog::{
    create_test_library, read_created_at, read_row, sync_config, StaticLikes, TestLibrary,
    TestTrack,
};

//! Test fixtures for territory-engine.
//!
//! Provides realistic test data including:
//! - Residential blocks in Henderson, NV drawn as agent polygons
//! - Door-knocking stops around Green Valley with `[lng, lat]` coordinates

#![allow(dead_code)]

pub mod henderson_neighborhood;

pub use henderson_neighborhood::*;

// crates/compliance-kpi-config/src/lib.rs
// ============================================================================
// Module: Compliance KPI Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for compliance-kpi.toml semantics.
// Dependencies: compliance-kpi-core, serde, toml
// ============================================================================

//! ## Overview
//! `compliance-kpi-config` defines the configuration model for compliance
//! runs. Loading is strict and fail-closed: oversized, non-UTF-8, unknown, or
//! inconsistent configuration is rejected before any run starts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;

#![allow(dead_code)]
//! The rules engine: one `impl GameState` block per operational concern,
//! mirroring `original_source/game/*.go`'s one-file-per-concern split on
//! top of a single `Game` struct (spec.md §4.3/§4.4).
//!
//! Every operation here is synchronous and takes any player choice it
//! needs as an already-resolved parameter (a tile coordinate, a chosen
//! resource, a discard vector) rather than blocking on a prompt itself.
//! Obtaining that choice by suspending on `BlockForAction` is `session`'s
//! job (spec.md §4.5) — this split keeps the engine directly unit
//! testable without a reactor.

pub mod actions;
pub mod barbarian;
pub mod build;
pub mod city_improvements;
pub mod dev_cards;
pub mod dice;
pub mod extra_vp;
pub mod progress_cards;
pub mod replay;
pub mod state;
pub mod trade;
pub mod turn;

pub use state::GameState;

// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Strongly-typed configuration structs for notebook server profiles.
//!
//! Every section corresponds to one configuration namespace (`ServerApp`,
//! `LabApp`, ...). All option fields are `Option<T>`: an unset field means the
//! documented built-in default applies, so a profile serializes back to exactly
//! the assignments it was loaded from.
//!
//! The two profile roots, [`LabProfile`] and [`NotebookProfile`], are extracted
//! from a validated JSON document by `nbp-config-core`.

pub mod lab;
pub mod profile;
pub mod server;
pub mod services;

pub use lab::{LabApp, LabServerApp};
pub use profile::{LabProfile, NotebookProfile, Profile, ProfileKind};
pub use server::{NotebookApp, ServerApp};
pub use services::{ContentsManager, MappingKernelManager};

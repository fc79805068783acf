#![doc = "kotlin-release-core: orchestration library for Kotlin compiler and IDE plugin releases."]

//! This crate contains the whole release sequence: fetching pinned JDKs,
//! running gradle, resetting and switching the checkout, and uploading the
//! resulting archives. It never implements any of those tools itself; each
//! step is an external command run through the [`contract::CommandRunner`] seam.
//!
//! # Usage
//! Build a [`config::ReleaseConfig`], pick a runner and a working-directory
//! implementation from [`process`] (or mocks in tests), and call
//! [`release::Release::run`].

pub mod checkout;
pub mod config;
pub mod contract;
pub mod download;
pub mod environment;
pub mod process;
pub mod release;
pub mod upload;
pub mod workdir;

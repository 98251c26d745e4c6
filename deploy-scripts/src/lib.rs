//! Scripts for deploying the Balloons token and the DEX, and seeding the DEX
//! with its initial liquidity.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod cli;
mod commands;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod deployments;
pub mod environment;
pub mod errors;
pub mod rpc;
pub mod script;
mod solidity;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod units;
pub mod verify;

//! Hash computation and object identity for the gitr git implementation.
//!
//! This crate provides the core `ObjectId` type, hash computation, and hex
//! encoding/decoding used throughout gitr.

mod algorithm;
mod error;
pub mod hasher;
pub mod hex;
mod oid;

pub use algorithm::HashAlgorithm;
pub use error::HashError;
pub use oid::ObjectId;

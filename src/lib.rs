// src/lib.rs

//! GovHelper announcement collector library

pub mod error;
pub mod mapper;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub mod testutil;

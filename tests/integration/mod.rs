//! Integration tests for recipe baking

mod backend_oven;
mod config_integration;
mod cookbook_roundtrip;
mod direct_dispatch;
mod oven_dispatch;
mod test_utils;

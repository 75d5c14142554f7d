//! Integration tests for vol-spike

mod config_test;
mod monitor_test;
mod restart_test;
mod support;

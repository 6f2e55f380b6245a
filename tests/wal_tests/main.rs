//! WAL test suite

mod common;

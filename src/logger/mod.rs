//! Activity logging: typed suite events written as append-only JSONL.

pub mod activity;
pub mod jsonl;

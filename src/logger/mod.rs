//! Session logging: append-only JSONL lifecycle events with graceful degradation.

pub mod jsonl;

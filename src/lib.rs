//! chain-map: a single-threaded, separate-chaining hash map from `String`
//! keys to `i32` values, with binary and text persistence.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: a small map whose growth policy and on-disk formats are exact and
//!   reproducible, so files written by one table decode into an equivalent
//!   table bucket for bucket.
//! - Layers:
//!   - `digest`: the `Digest` trait and the default 32-bit FNV-1a; bucket
//!     index is `digest(key) % capacity`.
//!   - `chain`: singly linked collision lists whose nodes live in one
//!     generational arena (`slotmap`) per table; a chain is just a head key.
//!   - `ChainMap<D>`: the bucket table. Owns the arena and the bucket
//!     vector, applies the growth policy, exposes the public API.
//!   - `codec`: stateless binary/text encoders and decoders over
//!     `Write`/`Read`, plus file helpers on `ChainMap`.
//!
//! Constraints
//! - Single writer: no internal locking; wrap in a `Mutex` to share.
//! - No per-entry heap allocation beyond the key's `String` and the arena slot.
//! - Growth: before every insert, if `len >= 0.75 * capacity` the bucket
//!   count doubles and every node is relinked (not cloned) into its new
//!   chain. Removal never shrinks.
//! - Keys are unique; inserting an existing key overwrites its value.
//!
//! Persistence
//! - Both formats record capacity, size and every entry in bucket-then-chain
//!   order. Decoding allocates a table of the recorded capacity and places
//!   entries directly, without growth, appending to each chain so the
//!   original order is restored.
//! - Decoding is all or nothing: on error the partially built table is
//!   dropped and a typed `DecodeError` is returned. Header and length fields
//!   are bounded by `DecodeLimits` before any allocation depends on them.
//!
//! Notes and non-goals
//! - The digest is fast, not adversarially robust.
//! - Values are fixed `i32`; keys are UTF-8 strings.
//! - Iteration order is an artifact of digest and capacity; do not rely on it.

mod chain;
mod chain_map;
#[cfg(test)]
mod chain_map_proptest;
pub mod codec;
pub mod digest;
mod error;

// Public surface
pub use chain_map::{ChainMap, Iter, Keys, DEFAULT_CAPACITY, MAX_LOAD_FACTOR};
pub use codec::{DecodeLimits, Format};
pub use digest::{fnv1a, Digest, Fnv1a};
pub use error::{DecodeError, EncodeError, Error, FileOp, Result};

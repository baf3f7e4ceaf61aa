//! # horcrux
//!
//! split a file into encrypted shards so that any `threshold` of `total`
//! shards rebuild it, while fewer reveal nothing about the key.
//!
//! ## architecture
//!
//! ```text
//!        source file                         fresh 32-byte key
//!             │                                     │
//!             │ aes-256-ofb (zero iv)               │ shamir over GF(256)
//!             ▼                                     ▼
//!      encrypted stream                   one key fragment per shard
//!             │                                     │
//!   threshold == total ?                            │
//!     yes: deal 100-byte runs round-robin           │
//!     no:  full copy into every shard               │
//!             │                                     │
//!             └──────────────┬──────────────────────┘
//!                            ▼
//!   ┌──────────────────────────────────────────────────┐
//!   │ banner │ -- HEADER -- │ json │ -- BODY -- │ body │   name_i_of_n.horcrux
//!   └──────────────────────────────────────────────────┘
//! ```
//!
//! binding runs the same pipeline backwards: parse headers, combine key
//! fragments, re-interleave or pick one body, decrypt.
//!
//! ## caveats
//!
//! - shards carry no checksum or mac; tampered or out-of-order bodies decrypt
//!   to garbage without an error
//! - a failed split or bind leaves partial files behind
//! - the cipher iv is fixed, which is only sound because every split draws a
//!   new key
//!
//! ## usage
//!
//! ```rust,ignore
//! use horcrux::{bind, find_shards, split, SplitConfig};
//!
//! let config = SplitConfig::new(5, 3)?;
//! let shards = split("diary.txt", "shards/", &config)?;
//!
//! // later, with at least 3 of the 5 files
//! bind(find_shards("shards/")?, "diary.txt", false)?;
//! ```

pub mod bind;
pub mod cipher;
pub mod config;
pub mod error;
pub mod header;
pub mod mux;
pub mod sharing;
pub mod split;

mod gf256;

pub use bind::{bind, find_shards, ShareSet};
pub use config::SplitConfig;
pub use error::{Error, ErrorKind, Result};
pub use header::{ShardHeader, ShardInfo};
pub use sharing::Share;
pub use split::split;

//! Copy-on-write small vectors and friends.
//!
//! The centerpiece is [`SocowVec`], a vector that stores up to `N` elements
//! inline and moves to a reference-counted heap buffer beyond that. Cloning
//! a heap-backed `SocowVec` is O(1); the buffer is copied only when one of
//! the owners mutates it. Around it sit a few independent containers that
//! share the same hand-rolled style:
//!
//! | Type | Summary |
//! |------|---------|
//! | [`SocowVec`] | small-buffer vector with copy-on-write sharing |
//! | [`DynVec`] | plain growable vector, exclusive ownership |
//! | [`List`] | doubly-linked list with O(1) splice |
//! | [`Matrix`] | dense row-major matrix with operator arithmetic |
//! | [`BigInt`] | signed arbitrary-precision integer |
//!
//! The crate is `no_std` (with `alloc`). Feature flags:
//!
//! - `std` (default): `std::io::Write` for the byte vectors.
//! - `serde`: sequence (de)serialization for the containers, decimal
//!   strings for [`BigInt`].
//!
//! # Examples
//!
//! ```
//! use socow::{socowvec, SocowVec};
//!
//! let a: SocowVec<i32, 4> = socowvec![1, 2, 3, 4, 5];
//! let mut b = a.clone(); // O(1), shares the heap buffer
//! b.push(6); // copy-on-write
//! assert_eq!(a, [1, 2, 3, 4, 5]);
//! assert_eq!(b, [1, 2, 3, 4, 5, 6]);
//! ```

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod bigint;
pub mod dyn_vec;
pub mod list;
pub mod matrix;
pub mod socow_vec;

mod raw;
mod utils;

#[cfg(feature = "serde")]
mod serde;

#[cfg(feature = "std")]
mod std_io;

pub use bigint::{BigInt, ParseBigIntError};
pub use dyn_vec::DynVec;
pub use list::List;
pub use matrix::{Col, Matrix};
pub use socow_vec::SocowVec;

//! Runtime values for Kata shape applications.
//!
//! This crate is the leaf of the workspace: it defines the dynamic value
//! model that shapes describe and applications (cloners, comparers,
//! generators) operate on, plus the [`TypeKey`] identity that tags record
//! values with their declaring type.
//!
//! # Arc Enforcement Architecture
//!
//! All heap-allocated payloads go through factory methods on [`Value`].
//! The [`Heap<T>`] wrapper has a crate-private constructor, so external
//! code cannot build heap variants directly:
//!
//! ```text
//! let s = Value::string("hello");       // OK
//! let list = Value::list(vec![]);       // OK
//! let s = Value::Str(Heap::new(..));    // ERROR: Heap::new is pub(crate)
//! ```
//!
//! # Thread Safety
//!
//! Every heap payload is an immutable `Arc` internally. `Value::clone` is
//! shallow (it shares allocations); producing a structurally equal but
//! allocation-distinct tree is the job of a deep-clone application, and
//! [`Value::ptr_eq`] is how tests tell the two apart.

mod heap;
mod key;
mod value;

pub use heap::Heap;
pub use key::TypeKey;
pub use value::Value;

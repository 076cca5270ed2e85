//! cinderc-util - Foundation types shared by every compiler phase.
//!
//! The compiler keeps its nodes in arenas and refers to them through typed
//! `u32` indices instead of pointers. This crate provides the [`Idx`] trait,
//! the [`IndexVec`] arena, and the [`define_idx!`] macro that stamps out new
//! index types.

mod index_vec;

pub use index_vec::{Idx, IndexVec};

// Re-export the hash map flavor used for compiler side tables.
pub use rustc_hash::FxHashMap;
pub use rustc_hash::FxHashSet;

/// Define a typed `u32` index for use with [`IndexVec`].
///
/// # Example
///
/// ```
/// use cinderc_util::{define_idx, IndexVec};
///
/// define_idx!(NodeId);
///
/// let mut nodes: IndexVec<NodeId, &str> = IndexVec::new();
/// let id = nodes.push("hello");
/// assert_eq!(nodes[id], "hello");
/// ```
#[macro_export]
macro_rules! define_idx {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u32);

        impl $crate::Idx for $name {
            fn from_usize(idx: usize) -> Self {
                assert!(idx <= u32::MAX as usize);
                $name(idx as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

//! Cell scalar types and their atomic counterparts.

use std::fmt;
use std::sync::atomic::{AtomicI16, AtomicI32, AtomicI64, AtomicI8, Ordering};

/// An integer type that can be stored in a [`Buffer`](crate::Buffer).
///
/// Cell deltas are updated with atomic fetch-add, so every scalar pairs
/// with a native atomic. All arithmetic wraps.
///
/// Cell accesses use `Relaxed` ordering: phases of a tick are separated by
/// mutex-backed barriers, which provide the happens-before edges.
pub trait Scalar: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Atomic storage for one value.
    type Atomic: Send + Sync;

    /// The additive identity.
    const ZERO: Self;

    /// Wrap a value in its atomic.
    fn new_atomic(value: Self) -> Self::Atomic;

    /// Read an atomic.
    fn load(cell: &Self::Atomic) -> Self;

    /// Overwrite an atomic.
    fn store(cell: &Self::Atomic, value: Self);

    /// Atomically add, wrapping on overflow.
    fn fetch_add(cell: &Self::Atomic, value: Self);

    /// Atomically replace with zero, returning the previous value.
    fn take(cell: &Self::Atomic) -> Self;

    /// `self + rhs`, wrapping.
    fn wrapping_add(self, rhs: Self) -> Self;

    /// `self - rhs`, wrapping.
    fn wrapping_sub(self, rhs: Self) -> Self;
}

macro_rules! impl_scalar {
    ($($t:ty => $atomic:ty),* $(,)?) => {
        $(
            impl Scalar for $t {
                type Atomic = $atomic;

                const ZERO: Self = 0;

                #[inline]
                fn new_atomic(value: Self) -> Self::Atomic {
                    <$atomic>::new(value)
                }

                #[inline]
                fn load(cell: &Self::Atomic) -> Self {
                    cell.load(Ordering::Relaxed)
                }

                #[inline]
                fn store(cell: &Self::Atomic, value: Self) {
                    cell.store(value, Ordering::Relaxed)
                }

                #[inline]
                fn fetch_add(cell: &Self::Atomic, value: Self) {
                    cell.fetch_add(value, Ordering::Relaxed);
                }

                #[inline]
                fn take(cell: &Self::Atomic) -> Self {
                    cell.swap(0, Ordering::Relaxed)
                }

                #[inline]
                fn wrapping_add(self, rhs: Self) -> Self {
                    <$t>::wrapping_add(self, rhs)
                }

                #[inline]
                fn wrapping_sub(self, rhs: Self) -> Self {
                    <$t>::wrapping_sub(self, rhs)
                }
            }
        )*
    };
}

impl_scalar!(
    i8 => AtomicI8,
    i16 => AtomicI16,
    i32 => AtomicI32,
    i64 => AtomicI64,
);

/// Marks the containing branch as unlikely.
///
/// Calling a `#[cold]` function from a branch tells the optimizer to lay the
/// surrounding code out for the other path.
#[cold]
#[inline(always)]
pub(crate) fn cold_path() {}

#[inline(always)]
pub(crate) fn split_range_bound(
    src: &impl core::ops::RangeBounds<usize>,
    len: usize,
) -> (usize, usize) {
    let start = match src.start_bound() {
        core::ops::Bound::Included(&i) => i,
        core::ops::Bound::Excluded(&i) => i + 1,
        core::ops::Bound::Unbounded => 0,
    };

    let end = match src.end_bound() {
        core::ops::Bound::Included(&i) => i + 1,
        core::ops::Bound::Excluded(&i) => i,
        core::ops::Bound::Unbounded => len,
    };
    (start, end)
}

/// Implements the read-only slice-backed trait surface for a vector type.
///
/// Only traits that observe the elements are generated here. Mutable
/// counterparts (`DerefMut`, `IndexMut`, `AsMut`, ...) are implemented per
/// type, because `SocowVec` must unshare (and therefore needs `T: Clone`)
/// before handing out mutable access.
macro_rules! impl_slice_traits {
    ([$($gen:tt)*] $name:ty) => {
        impl<$($gen)*> core::ops::Deref for $name {
            type Target = [T];
            #[inline]
            fn deref(&self) -> &Self::Target {
                self.as_slice()
            }
        }

        impl<$($gen)*> core::fmt::Debug for $name
        where
            T: core::fmt::Debug,
        {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Debug::fmt(self.as_slice(), f)
            }
        }

        impl<$($gen)*> core::convert::AsRef<[T]> for $name {
            #[inline]
            fn as_ref(&self) -> &[T] {
                self.as_slice()
            }
        }

        impl<$($gen)*> alloc::borrow::Borrow<[T]> for $name {
            #[inline]
            fn borrow(&self) -> &[T] {
                self.as_slice()
            }
        }

        impl<$($gen)*> core::hash::Hash for $name
        where
            T: core::hash::Hash,
        {
            #[inline]
            fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
                core::hash::Hash::hash(self.as_slice(), state);
            }
        }

        impl<I: core::slice::SliceIndex<[T]>, $($gen)*> core::ops::Index<I> for $name {
            type Output = <I as core::slice::SliceIndex<[T]>>::Output;
            #[inline]
            fn index(&self, index: I) -> &Self::Output {
                core::ops::Index::index(self.as_slice(), index)
            }
        }

        impl<'a, $($gen)*> IntoIterator for &'a $name {
            type Item = &'a T;
            type IntoIter = core::slice::Iter<'a, T>;
            #[inline]
            fn into_iter(self) -> Self::IntoIter {
                self.as_slice().iter()
            }
        }

        impl<$($gen)*> Eq for $name where T: Eq {}

        impl<$($gen)*> core::cmp::Ord for $name
        where
            T: core::cmp::Ord,
        {
            #[inline]
            fn cmp(&self, other: &Self) -> core::cmp::Ordering {
                core::cmp::Ord::cmp(self.as_slice(), other.as_slice())
            }
        }

        impl<$($gen)*> core::cmp::PartialOrd for $name
        where
            T: core::cmp::PartialOrd,
        {
            #[inline]
            fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
                core::cmp::PartialOrd::partial_cmp(self.as_slice(), other.as_slice())
            }
        }

        impl<U, $($gen)*> core::cmp::PartialEq<&[U]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &&[U]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), *other)
            }
        }

        impl<U, $($gen)*> core::cmp::PartialEq<[U]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &[U]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), other)
            }
        }

        impl<U, const P: usize, $($gen)*> core::cmp::PartialEq<[U; P]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &[U; P]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), other.as_slice())
            }
        }

        impl<U, const P: usize, $($gen)*> core::cmp::PartialEq<&[U; P]> for $name
        where
            T: core::cmp::PartialEq<U>,
        {
            #[inline]
            fn eq(&self, other: &&[U; P]) -> bool {
                core::cmp::PartialEq::eq(self.as_slice(), other.as_slice())
            }
        }
    };
}

pub(crate) use impl_slice_traits;

use core::fmt;
use core::iter::FusedIterator;
use core::mem::{self, ManuallyDrop, MaybeUninit};
use core::ptr;

use alloc::vec::Vec;

use crate::dyn_vec::DynVec;
use crate::raw::SharedVec;
use crate::utils::{cold_path, split_range_bound};

/// Inline storage for the small representation: `N` uninitialized slots plus
/// the count of constructed ones.
pub(crate) struct InlineBuf<T, const N: usize> {
    data: [MaybeUninit<T>; N],
    len: usize,
}

impl<T, const N: usize> InlineBuf<T, N> {
    #[inline]
    pub(crate) const fn new() -> Self {
        Self {
            // SAFETY: an uninitialized array of `MaybeUninit` is always valid.
            data: unsafe { MaybeUninit::<[MaybeUninit<T>; N]>::uninit().assume_init() },
            len: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn as_ptr(&self) -> *const T {
        self.data.as_ptr() as *const T
    }

    #[inline(always)]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.data.as_mut_ptr() as *mut T
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are constructed.
        unsafe { core::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// # Safety
    /// `len < N`.
    #[inline]
    pub(crate) unsafe fn push_unchecked(&mut self, value: T) {
        debug_assert!(self.len < N);
        unsafe {
            ptr::write(self.as_mut_ptr().add(self.len), value);
        }
        self.len += 1;
    }

    pub(crate) fn clear(&mut self) {
        let len = mem::replace(&mut self.len, 0);
        if len > 0 {
            // SAFETY: exactly `len` slots were constructed.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), len));
            }
        }
    }
}

impl<T, const N: usize> Drop for InlineBuf<T, N> {
    fn drop(&mut self) {
        self.clear();
    }
}

enum Inner<T, const N: usize> {
    Small(InlineBuf<T, N>),
    Big(SharedVec<T>),
}

/// A small-buffer-optimized, copy-on-write vector.
///
/// Up to `N` elements are stored inline with no heap allocation. Once that
/// threshold is exceeded the elements move to a heap buffer that is
/// *reference counted*: cloning a big `SocowVec` is O(1) and aliases the
/// buffer, and the buffer is only copied again when one of the owners
/// mutates through it ("unsharing").
///
/// Read-only access ([`as_slice`](SocowVec::as_slice), indexing, iteration)
/// never unshares; every mutable accessor does.
///
/// # Examples
///
/// ```
/// use socow::SocowVec;
///
/// let mut vec: SocowVec<i32, 4> = SocowVec::new();
/// vec.push(1);
/// vec.push(2);
/// vec.push(3);
/// assert!(vec.is_small()); // still inline
///
/// let mut copy = vec.clone();
/// copy.push(4); // fills the inline buffer of the copy
/// copy.push(5); // spills the copy to the heap
///
/// // The original is unaffected by anything the copy did.
/// assert_eq!(vec, [1, 2, 3]);
/// assert_eq!(copy, [1, 2, 3, 4, 5]);
/// ```
///
/// Cloning a heap-backed vector is O(1); the buffer is copied only when one
/// of the owners writes:
///
/// ```
/// # use socow::{socowvec, SocowVec};
/// let a: SocowVec<i32, 2> = socowvec![1, 2, 3, 4];
/// let mut b = a.clone(); // O(1), shares the buffer
/// assert!(b.is_shared());
///
/// b[0] = 9; // copy-on-write happens here
/// assert!(!b.is_shared());
/// assert_eq!(a, [1, 2, 3, 4]);
/// assert_eq!(b, [9, 2, 3, 4]);
/// ```
///
/// # Sharing and threads
///
/// The reference count is not atomic: `SocowVec` is a single-threaded value
/// type and is neither `Send` nor `Sync`.
pub struct SocowVec<T, const N: usize> {
    inner: Inner<T, N>,
}

/// Creates a [`SocowVec`] containing the arguments.
///
/// The syntax is similar to [`vec!`](https://doc.rust-lang.org/std/macro.vec.html).
/// The inline capacity must be explicitly specified; element counts above it
/// simply start out on the heap.
///
/// # Examples
///
/// ```
/// # use socow::{socowvec, SocowVec};
/// let vec: SocowVec<i32, 4> = socowvec![];
/// let vec: SocowVec<i64, 4> = socowvec![7; 3]; // needs Clone
/// let vec: SocowVec<_, 4> = socowvec![1, 2, 3, 4, 5];
/// assert!(!vec.is_small());
/// ```
#[macro_export]
macro_rules! socowvec {
    [] => { $crate::SocowVec::new() };
    [$elem:expr; $n:expr] => { $crate::SocowVec::from_elem($elem, $n) };
    [$($item:expr),+ $(,)?] => { $crate::SocowVec::from_buf([ $($item),+ ]) };
}

impl<T, const N: usize> SocowVec<T, N> {
    /// Constructs a new, empty `SocowVec` in the small representation.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::SocowVec;
    /// let vec: SocowVec<i32, 8> = SocowVec::new();
    /// assert!(vec.is_empty());
    /// assert_eq!(vec.capacity(), 8);
    /// ```
    #[inline]
    pub const fn new() -> Self {
        Self {
            inner: Inner::Small(InlineBuf::new()),
        }
    }

    /// Moves the elements of an array into a new vector.
    ///
    /// Inline if `P <= N`, heap-backed otherwise.
    pub fn from_buf<const P: usize>(arr: [T; P]) -> Self {
        let arr = ManuallyDrop::new(arr);
        if P <= N {
            let mut buf = InlineBuf::new();
            // SAFETY: `P <= N` slots; the source is forgotten afterwards.
            unsafe {
                ptr::copy_nonoverlapping(arr.as_ptr(), buf.as_mut_ptr(), P);
            }
            buf.len = P;
            Self {
                inner: Inner::Small(buf),
            }
        } else {
            let mut buf = SharedVec::with_capacity(P);
            // SAFETY: fresh unique buffer of capacity `P`.
            unsafe {
                ptr::copy_nonoverlapping(arr.as_ptr(), buf.as_mut_ptr(), P);
                buf.set_len(P);
            }
            Self {
                inner: Inner::Big(buf),
            }
        }
    }

    /// Returns the number of elements in the vector.
    #[inline]
    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::Small(buf) => buf.len,
            Inner::Big(buf) => buf.len(),
        }
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current capacity: `N` while small, the heap buffer's
    /// capacity otherwise. Never less than `N`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::{socowvec, SocowVec};
    /// let vec: SocowVec<i32, 4> = socowvec![1, 2];
    /// assert_eq!(vec.capacity(), 4);
    /// ```
    #[inline]
    pub fn capacity(&self) -> usize {
        match &self.inner {
            Inner::Small(_) => N,
            Inner::Big(buf) => buf.capacity(),
        }
    }

    /// Returns `true` while the elements live in the inline buffer.
    #[inline]
    pub fn is_small(&self) -> bool {
        matches!(self.inner, Inner::Small(_))
    }

    /// Returns `true` if the vector aliases a heap buffer together with at
    /// least one other vector.
    #[inline]
    pub fn is_shared(&self) -> bool {
        match &self.inner {
            Inner::Small(_) => false,
            Inner::Big(buf) => buf.is_shared(),
        }
    }

    /// Extracts a slice containing the entire vector.
    ///
    /// Never unshares: reading through a shared buffer is safe.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        match &self.inner {
            Inner::Small(buf) => buf.as_slice(),
            Inner::Big(buf) => buf.as_slice(),
        }
    }

    /// Returns a raw pointer to the element storage without unsharing.
    ///
    /// The pointer may alias other vectors' storage; do not write through it.
    #[inline]
    pub fn as_ptr(&self) -> *const T {
        match &self.inner {
            Inner::Small(buf) => buf.as_ptr(),
            Inner::Big(buf) => buf.as_ptr(),
        }
    }

    /// Returns a reference to the element at `index`, or `None` if out of
    /// bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Returns a reference to the first element, or `None` if empty.
    #[inline]
    pub fn front(&self) -> Option<&T> {
        self.as_slice().first()
    }

    /// Returns a reference to the last element, or `None` if empty.
    #[inline]
    pub fn back(&self) -> Option<&T> {
        self.as_slice().last()
    }

    /// Returns an iterator over the elements. Never unshares.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Removes all elements.
    ///
    /// If the buffer is shared this is O(1): the reference is released and
    /// the vector resets to the empty small state. An exclusively owned
    /// buffer keeps its capacity and has its elements destroyed in place.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::{socowvec, SocowVec};
    /// let a: SocowVec<i32, 2> = socowvec![1, 2, 3];
    /// let mut b = a.clone();
    /// b.clear();
    /// assert!(b.is_small());
    /// assert_eq!(a, [1, 2, 3]); // untouched
    /// ```
    pub fn clear(&mut self) {
        if let Inner::Big(buf) = &mut self.inner {
            if buf.is_shared() {
                self.inner = Inner::Small(InlineBuf::new());
                return;
            }
        }
        match &mut self.inner {
            Inner::Small(buf) => buf.clear(),
            // SAFETY: the shared case returned above.
            Inner::Big(buf) => unsafe { buf.clear_unique() },
        }
    }

    /// Swaps the contents of two vectors. O(1), no-throw.
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Pointer to the storage, ignoring sharing.
    ///
    /// # Safety
    /// The caller must hold the unique reference before writing.
    #[inline]
    unsafe fn data_ptr_mut(&mut self) -> *mut T {
        match &mut self.inner {
            Inner::Small(buf) => buf.as_mut_ptr(),
            Inner::Big(buf) => buf.as_mut_ptr(),
        }
    }

    /// # Safety
    /// Same contract as the representations' `set_len`.
    #[inline]
    unsafe fn set_len(&mut self, new_len: usize) {
        match &mut self.inner {
            Inner::Small(buf) => {
                debug_assert!(new_len <= N);
                buf.len = new_len;
            }
            Inner::Big(buf) => unsafe { buf.set_len(new_len) },
        }
    }
}

impl<T: Clone, const N: usize> SocowVec<T, N> {
    /// Creates a `SocowVec` with `num` clones of `elem`.
    pub fn from_elem(elem: T, num: usize) -> Self {
        let mut vec = Self::new();
        vec.resize(num, elem);
        vec
    }

    /// Extracts a mutable slice of the entire vector, unsharing first.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::{socowvec, SocowVec};
    /// let a: SocowVec<i32, 2> = socowvec![1, 2, 3];
    /// let mut b = a.clone();
    /// b.as_mut_slice()[2] = 9;
    /// assert_eq!(a, [1, 2, 3]);
    /// assert_eq!(b, [1, 2, 9]);
    /// ```
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        self.unshare();
        let len = self.len();
        // SAFETY: unique after `unshare`; first `len` slots constructed.
        unsafe { core::slice::from_raw_parts_mut(self.data_ptr_mut(), len) }
    }

    /// Returns a raw mutable pointer to the storage, unsharing first.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.unshare();
        // SAFETY: unique after `unshare`.
        unsafe { self.data_ptr_mut() }
    }

    /// Returns a mutable reference to the element at `index`, or `None` if
    /// out of bounds. Unshares.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Mutable reference to the first element. Unshares.
    #[inline]
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().first_mut()
    }

    /// Mutable reference to the last element. Unshares.
    #[inline]
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.as_mut_slice().last_mut()
    }

    /// Returns an iterator of mutable references. Unshares.
    #[inline]
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Obtains exclusive ownership of the storage without changing the
    /// observable contents.
    ///
    /// No-op unless the heap buffer is currently shared; in that case the
    /// live elements are cloned into a fresh private buffer of the same
    /// capacity and the old reference is released. Strong guarantee: if an
    /// element `clone` panics the vector still aliases the original buffer.
    pub fn unshare(&mut self) {
        if self.is_shared() {
            let capacity = self.capacity();
            self.reallocate(capacity);
        }
    }

    /// Clones the live elements into a fresh private buffer of capacity
    /// `new_cap` and commits it. `new_cap >= len` required.
    fn reallocate(&mut self, new_cap: usize) {
        debug_assert!(new_cap >= self.len());
        let mut buf = SharedVec::with_capacity(new_cap);
        for item in self.as_slice() {
            // SAFETY: `buf` is unique and has room for every element.
            unsafe { buf.push_unchecked(item.clone()) };
        }
        self.inner = Inner::Big(buf);
    }

    /// Clones the live elements into inline storage and commits it,
    /// releasing the current buffer reference. `len <= N` required.
    fn big_to_small(&mut self) {
        debug_assert!(self.len() <= N);
        let mut buf = InlineBuf::new();
        for item in self.as_slice() {
            // SAFETY: at most `N` elements.
            unsafe { buf.push_unchecked(item.clone()) };
        }
        self.inner = Inner::Small(buf);
    }

    /// Adjusts the capacity of the vector.
    ///
    /// Requests below the current length are silently ignored (not an
    /// error). A request of at most `N` on a heap-backed vector moves the
    /// elements back into inline storage. Otherwise the elements are copied
    /// into a fresh buffer of exactly `new_capacity` slots whenever the
    /// request exceeds the current capacity or the buffer is shared.
    ///
    /// Strong guarantee: a panicking element `clone` leaves the vector
    /// unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::{socowvec, SocowVec};
    /// let mut vec: SocowVec<i32, 2> = socowvec![1, 2, 3];
    /// assert!(!vec.is_small());
    ///
    /// vec.set_capacity(1); // below len: ignored
    /// assert_eq!(vec.len(), 3);
    ///
    /// vec.pop();
    /// vec.set_capacity(2); // fits inline again
    /// assert!(vec.is_small());
    /// ```
    pub fn set_capacity(&mut self, new_capacity: usize) {
        if new_capacity < self.len() {
            return;
        }

        if !self.is_small() && new_capacity <= N {
            self.big_to_small();
        } else if new_capacity > self.capacity() || self.is_shared() {
            self.reallocate(new_capacity);
        }
    }

    /// Ensures the capacity is at least `new_capacity`.
    ///
    /// Note that like [`set_capacity`](SocowVec::set_capacity) this takes an
    /// absolute capacity, not an additional element count.
    #[inline]
    pub fn reserve(&mut self, new_capacity: usize) {
        self.set_capacity(new_capacity);
    }

    /// Shrinks the capacity to the current length (or to `N`, whichever is
    /// larger -- the inline buffer never goes away).
    pub fn shrink_to_fit(&mut self) {
        if self.len() != self.capacity() {
            if self.len() > N {
                self.reallocate(self.len());
            } else {
                self.set_capacity(self.len());
            }
        }
    }

    /// Appends an element to the back of the vector.
    ///
    /// Amortized O(1). Reallocates (doubling) on overflow; unshares first if
    /// the buffer is shared. Both reallocating paths carry the strong
    /// guarantee.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::SocowVec;
    /// let mut vec: SocowVec<i32, 2> = SocowVec::new();
    /// vec.push(1);
    /// vec.push(2);
    /// vec.push(3); // moves to the heap
    /// assert_eq!(vec, [1, 2, 3]);
    /// assert!(!vec.is_small());
    /// ```
    #[inline]
    pub fn push(&mut self, value: T) {
        let len = self.len();
        self.insert(len, value);
    }

    /// Removes the last element and returns it, or `None` if empty.
    ///
    /// Never changes the capacity. On a shared buffer the element is cloned
    /// out and the rest copied into a private buffer.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            cold_path();
            None
        } else {
            Some(self.remove(self.len() - 1))
        }
    }

    /// Inserts `element` at position `index`, shifting everything after it
    /// to the right.
    ///
    /// If the vector must grow or is shared, the surrounding elements are
    /// cloned into a fresh buffer built off to the side and committed only
    /// on success (strong guarantee). Otherwise the tail is shifted in
    /// place, which cannot fail.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, element: T) {
        let len = self.len();
        assert!(index <= len, "insertion index should be <= len");

        let cap = self.capacity();
        if len + 1 > cap || self.is_shared() {
            let new_cap = if len + 1 > cap {
                (cap * 2).max(len + 1)
            } else {
                cap
            };
            let mut buf = SharedVec::with_capacity(new_cap);
            let src = self.as_slice();
            // SAFETY: `buf` is unique with room for `len + 1` elements; a
            // panicking clone drops `buf` with an accurate length.
            unsafe {
                for item in &src[..index] {
                    buf.push_unchecked(item.clone());
                }
                buf.push_unchecked(element);
                for item in &src[index..] {
                    buf.push_unchecked(item.clone());
                }
            }
            self.inner = Inner::Big(buf);
            return;
        }

        // Unique with spare capacity: shift the tail up and write. Pointer
        // moves cannot fail, so this path is no-throw.
        unsafe {
            let ptr = self.data_ptr_mut().add(index);
            if index < len {
                ptr::copy(ptr, ptr.add(1), len - index);
            }
            ptr::write(ptr, element);
            self.set_len(len + 1);
        }
    }

    /// Removes the element at `index` and returns it, shifting everything
    /// after it to the left.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        let len = self.len();
        assert!(index < len, "removal index should be < len");

        if self.is_shared() {
            let cap = self.capacity();
            let src = self.as_slice();
            let value = src[index].clone();
            let mut buf = SharedVec::with_capacity(cap);
            // SAFETY: as in `insert`: unique buffer, accurate length.
            unsafe {
                for item in &src[..index] {
                    buf.push_unchecked(item.clone());
                }
                for item in &src[index + 1..] {
                    buf.push_unchecked(item.clone());
                }
            }
            self.inner = Inner::Big(buf);
            return value;
        }

        // SAFETY: unique storage; the gap is closed before the length drops.
        unsafe {
            let ptr = self.data_ptr_mut().add(index);
            let value = ptr::read(ptr);
            ptr::copy(ptr.add(1), ptr, len - index - 1);
            self.set_len(len - 1);
            value
        }
    }

    /// Removes the elements in `range`, shifting the tail to the left.
    ///
    /// No-throw on exclusively owned storage; on a shared buffer the kept
    /// elements are cloned into a private buffer (strong guarantee).
    ///
    /// # Panics
    /// Panics if the range is out of bounds or decreasing.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::{socowvec, SocowVec};
    /// let mut vec: SocowVec<i32, 8> = socowvec![1, 2, 3, 4, 5];
    /// vec.remove_range(1..3);
    /// assert_eq!(vec, [1, 4, 5]);
    /// ```
    pub fn remove_range<R: core::ops::RangeBounds<usize>>(&mut self, range: R) {
        let len = self.len();
        let (start, end) = split_range_bound(&range, len);
        assert!(start <= end, "range start should be <= end");
        assert!(end <= len, "range end should be <= len");

        if start == end {
            return;
        }

        if self.is_shared() {
            let cap = self.capacity();
            let src = self.as_slice();
            let mut buf = SharedVec::with_capacity(cap);
            // SAFETY: as in `insert`.
            unsafe {
                for item in &src[..start] {
                    buf.push_unchecked(item.clone());
                }
                for item in &src[end..] {
                    buf.push_unchecked(item.clone());
                }
            }
            self.inner = Inner::Big(buf);
            return;
        }

        // SAFETY: unique storage. Drop the doomed elements, close the gap.
        unsafe {
            let ptr = self.data_ptr_mut();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr.add(start), end - start));
            ptr::copy(ptr.add(end), ptr.add(start), len - end);
            self.set_len(len - (end - start));
        }
    }

    /// Shortens the vector to `len` elements; no effect if already shorter.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.remove_range(len..self.len());
        }
    }

    /// Resizes the vector so that `len` equals `new_len`, filling with
    /// clones of `value` when growing.
    pub fn resize(&mut self, new_len: usize, value: T) {
        let len = self.len();
        if new_len < len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len);
        // SAFETY: unique with capacity for `new_len` after `reserve`; the
        // length is bumped per element so a panicking clone leaks nothing.
        unsafe {
            for i in len..new_len {
                ptr::write(self.data_ptr_mut().add(i), value.clone());
                self.set_len(i + 1);
            }
        }
    }

    /// Appends clones of every element of `other`.
    pub fn extend_from_slice(&mut self, other: &[T]) {
        let len = self.len();
        let needed = len + other.len();
        if needed > self.capacity() || self.is_shared() {
            self.reserve(needed.max(self.capacity() * 2));
        }
        // SAFETY: unique with sufficient capacity; length bumped per element.
        unsafe {
            for (i, item) in other.iter().enumerate() {
                ptr::write(self.data_ptr_mut().add(len + i), item.clone());
                self.set_len(len + i + 1);
            }
        }
    }

    /// Retains only the elements for which `f` returns `true`, in order.
    /// Unshares first.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) {
        self.unshare();
        let len = self.len();
        let mut kept = 0usize;
        // SAFETY: unique storage; a single forward compaction pass over
        // constructed slots.
        unsafe {
            let base = self.data_ptr_mut();
            // Keep the length accurate while user code (`f`, drops) runs.
            self.set_len(0);
            for index in 0..len {
                let src = base.add(index);
                if f(&*src) {
                    if index != kept {
                        ptr::copy_nonoverlapping(src, base.add(kept), 1);
                    }
                    kept += 1;
                } else {
                    ptr::drop_in_place(src);
                }
                self.set_len(kept);
            }
        }
    }
}

impl<T, const N: usize> Default for SocowVec<T, N> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const N: usize> Clone for SocowVec<T, N> {
    /// O(1) for heap-backed vectors (aliases the buffer and bumps the
    /// reference count); O(len) deep copy for small ones.
    fn clone(&self) -> Self {
        match &self.inner {
            Inner::Big(buf) => Self {
                inner: Inner::Big(buf.clone()),
            },
            Inner::Small(buf) => {
                let mut copy = InlineBuf::new();
                for item in buf.as_slice() {
                    // SAFETY: the source holds at most `N` elements.
                    unsafe { copy.push_unchecked(item.clone()) };
                }
                Self {
                    inner: Inner::Small(copy),
                }
            }
        }
    }

    fn clone_from(&mut self, source: &Self) {
        match &source.inner {
            Inner::Big(buf) => self.inner = Inner::Big(buf.clone()),
            Inner::Small(buf) => {
                // Build the inline copy first, commit after: a panicking
                // clone leaves `self` untouched.
                let mut copy = InlineBuf::new();
                for item in buf.as_slice() {
                    // SAFETY: at most `N` elements.
                    unsafe { copy.push_unchecked(item.clone()) };
                }
                self.inner = Inner::Small(copy);
            }
        }
    }
}

impl<T, U, const N: usize, const P: usize> PartialEq<SocowVec<U, P>> for SocowVec<T, N>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &SocowVec<U, P>) -> bool {
        PartialEq::eq(self.as_slice(), other.as_slice())
    }
}

crate::utils::impl_slice_traits!([T, const N: usize] SocowVec<T, N>);

impl<T: Clone, const N: usize> core::ops::DerefMut for SocowVec<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone, const N: usize> core::convert::AsMut<[T]> for SocowVec<T, N> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T: Clone, I, const N: usize> core::ops::IndexMut<I> for SocowVec<T, N>
where
    I: core::slice::SliceIndex<[T]>,
{
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        core::ops::IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<'a, T: Clone, const N: usize> IntoIterator for &'a mut SocowVec<T, N> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, const N: usize, const P: usize> From<[T; P]> for SocowVec<T, N> {
    #[inline]
    fn from(value: [T; P]) -> Self {
        Self::from_buf(value)
    }
}

impl<T: Clone, const N: usize> From<&[T]> for SocowVec<T, N> {
    fn from(value: &[T]) -> Self {
        let mut vec = Self::new();
        vec.extend_from_slice(value);
        vec
    }
}

impl<T, const N: usize> From<Vec<T>> for SocowVec<T, N> {
    /// Moves the elements out of a `Vec`; no `Clone` required.
    fn from(value: Vec<T>) -> Self {
        Self::from(DynVec::from(value))
    }
}

impl<T, const N: usize> From<DynVec<T>> for SocowVec<T, N> {
    /// Moves the elements out of a [`DynVec`]; no `Clone` required.
    fn from(mut value: DynVec<T>) -> Self {
        let len = value.len();
        if len <= N {
            let mut buf = InlineBuf::new();
            // SAFETY: the source's length is zeroed before it drops, so the
            // moved elements are owned exactly once.
            unsafe {
                ptr::copy_nonoverlapping(value.as_ptr(), buf.as_mut_ptr(), len);
                buf.len = len;
                value.set_len(0);
            }
            Self {
                inner: Inner::Small(buf),
            }
        } else {
            let mut buf = SharedVec::with_capacity(len);
            // SAFETY: as above; the fresh buffer has room for `len`.
            unsafe {
                ptr::copy_nonoverlapping(value.as_ptr(), buf.as_mut_ptr(), len);
                buf.set_len(len);
                value.set_len(0);
            }
            Self {
                inner: Inner::Big(buf),
            }
        }
    }
}

impl<T: Clone, const N: usize> FromIterator<T> for SocowVec<T, N> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut vec = Self::new();
        for item in iter {
            vec.push(item);
        }
        vec
    }
}

impl<T: Clone, const N: usize> Extend<T> for SocowVec<T, N> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: 'a + Clone, const N: usize> Extend<&'a T> for SocowVec<T, N> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item.clone());
        }
    }
}

/// An iterator that consumes a [`SocowVec`] and yields its items by value.
///
/// The vector is unshared up front, after which elements are moved out.
pub struct IntoIter<T: Clone, const N: usize> {
    vec: ManuallyDrop<SocowVec<T, N>>,
    index: usize,
}

impl<T: Clone, const N: usize> IntoIterator for SocowVec<T, N> {
    type Item = T;
    type IntoIter = IntoIter<T, N>;

    fn into_iter(mut self) -> Self::IntoIter {
        self.unshare();
        IntoIter {
            vec: ManuallyDrop::new(self),
            index: 0,
        }
    }
}

impl<T: Clone, const N: usize> Iterator for IntoIter<T, N> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.index < self.vec.len() {
            // SAFETY: storage is unique; each slot is read exactly once.
            let value = unsafe { ptr::read(self.vec.as_ptr().add(self.index)) };
            self.index += 1;
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.vec.len() - self.index;
        (rest, Some(rest))
    }
}

impl<T: Clone, const N: usize> ExactSizeIterator for IntoIter<T, N> {}
impl<T: Clone, const N: usize> FusedIterator for IntoIter<T, N> {}

impl<T: Clone, const N: usize> Drop for IntoIter<T, N> {
    fn drop(&mut self) {
        // SAFETY: slots before `index` were moved out; drop the rest, then
        // release the storage with a zero length.
        unsafe {
            let len = self.vec.len();
            let ptr = self.vec.data_ptr_mut();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                ptr.add(self.index),
                len - self.index,
            ));
            self.vec.set_len(0);
            ManuallyDrop::drop(&mut self.vec);
        }
    }
}

impl<T: Clone + fmt::Debug, const N: usize> fmt::Debug for IntoIter<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(&self.vec.as_slice()[self.index..])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::SocowVec;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    #[test]
    fn stays_small_up_to_n() {
        let mut vec: SocowVec<i32, 4> = SocowVec::new();
        for i in 0..4 {
            vec.push(i);
            assert!(vec.is_small());
        }
        vec.push(4);
        assert!(!vec.is_small());
        assert_eq!(vec, [0, 1, 2, 3, 4]);
        assert!(vec.capacity() >= 5);
    }

    #[test]
    fn capacity_never_below_n() {
        let mut vec: SocowVec<i32, 4> = SocowVec::new();
        assert_eq!(vec.capacity(), 4);
        for i in 0..32 {
            vec.push(i);
            assert!(vec.capacity() >= 4);
            assert!(vec.len() <= vec.capacity());
        }
        vec.clear();
        assert!(vec.capacity() >= 4);
    }

    #[test]
    fn cow_isolation_after_clone() {
        // Concrete scenario from the contract: 3 pushes, clone, then the
        // copy pushes a 4th (still inline-sized) and a 5th (heap growth).
        let mut vec: SocowVec<i32, 4> = SocowVec::new();
        vec.push(1);
        vec.push(2);
        vec.push(3);

        let mut copy = vec.clone();
        copy.push(4);
        copy.push(5);

        assert_eq!(vec, [1, 2, 3]);
        assert_eq!(copy, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn clone_of_big_is_shared_until_write() {
        let mut a: SocowVec<i32, 2> = SocowVec::new();
        for i in 0..6 {
            a.push(i);
        }
        let mut b = a.clone();
        assert!(a.is_shared());
        assert!(b.is_shared());
        assert_eq!(a.as_ptr(), b.as_ptr());

        b[3] = 33;
        assert!(!b.is_shared());
        assert!(!a.is_shared());
        assert_eq!(a, [0, 1, 2, 3, 4, 5]);
        assert_eq!(b, [0, 1, 2, 33, 4, 5]);
    }

    #[test]
    fn const_access_does_not_unshare() {
        let mut a: SocowVec<i32, 1> = SocowVec::new();
        a.push(1);
        a.push(2);
        let b = a.clone();
        assert_eq!(b[0], 1);
        assert_eq!(b.as_slice(), [1, 2]);
        assert_eq!(b.iter().count(), 2);
        // Reads through either alias keep the buffer shared.
        assert!(a.is_shared() && b.is_shared());
    }

    #[test]
    fn push_pop_round_trip_preserves_capacity() {
        let mut vec: SocowVec<i32, 4> = SocowVec::new();
        for i in 0..20 {
            vec.push(i);
        }
        let cap = vec.capacity();
        for _ in 0..20 {
            vec.pop();
        }
        assert!(vec.is_empty());
        assert_eq!(vec.capacity(), cap);
        assert_eq!(vec.pop(), None);
    }

    #[test]
    fn insert_and_remove_in_place() {
        let mut vec: SocowVec<i32, 8> = crate::socowvec![1, 2, 4, 5];
        vec.insert(2, 3);
        assert_eq!(vec, [1, 2, 3, 4, 5]);
        assert_eq!(vec.remove(0), 1);
        assert_eq!(vec, [2, 3, 4, 5]);
    }

    #[test]
    fn insert_into_shared_leaves_other_alone() {
        let a: SocowVec<i32, 2> = crate::socowvec![1, 2, 3, 4];
        let mut b = a.clone();
        b.insert(1, 9);
        assert_eq!(a, [1, 2, 3, 4]);
        assert_eq!(b, [1, 9, 2, 3, 4]);
    }

    #[test]
    fn remove_range_matches_contract() {
        let mut vec: SocowVec<i32, 8> = crate::socowvec![1, 2, 3, 4, 5];
        vec.remove_range(1..3);
        assert_eq!(vec, [1, 4, 5]);

        let shared: SocowVec<i32, 2> = crate::socowvec![1, 2, 3, 4, 5];
        let mut copy = shared.clone();
        copy.remove_range(1..3);
        assert_eq!(shared, [1, 2, 3, 4, 5]);
        assert_eq!(copy, [1, 4, 5]);
    }

    #[test]
    fn set_capacity_transitions() {
        let mut vec: SocowVec<i32, 4> = crate::socowvec![1, 2, 3, 4, 5, 6];
        assert!(!vec.is_small());

        // Shrink request below len is ignored.
        vec.set_capacity(2);
        assert_eq!(vec.len(), 6);

        vec.truncate(3);
        vec.set_capacity(3);
        assert!(vec.is_small());
        assert_eq!(vec, [1, 2, 3]);
        assert_eq!(vec.capacity(), 4);

        vec.set_capacity(10);
        assert!(!vec.is_small());
        assert_eq!(vec.capacity(), 10);
        assert_eq!(vec, [1, 2, 3]);
    }

    #[test]
    fn shrink_to_fit_prefers_inline() {
        let mut vec: SocowVec<i32, 4> = crate::socowvec![1, 2, 3, 4, 5, 6, 7];
        vec.truncate(2);
        vec.shrink_to_fit();
        assert!(vec.is_small());

        let mut vec: SocowVec<i32, 2> = crate::socowvec![1, 2, 3, 4, 5, 6, 7];
        vec.truncate(5);
        vec.shrink_to_fit();
        assert_eq!(vec.capacity(), 5);
        assert_eq!(vec, [1, 2, 3, 4, 5]);
    }

    #[test]
    fn clear_on_shared_is_release_only() {
        let witness = Rc::new(());
        let a: SocowVec<Rc<()>, 1> = crate::socowvec![witness.clone(), witness.clone()];
        let mut b = a.clone();
        b.clear();
        assert!(b.is_empty() && b.is_small());
        // Elements still alive through `a`.
        assert_eq!(Rc::strong_count(&witness), 3);
        drop(a);
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[test]
    fn drop_releases_shared_buffer_once() {
        let witness = Rc::new(());
        {
            let a: SocowVec<Rc<()>, 1> = crate::socowvec![witness.clone(), witness.clone()];
            let b = a.clone();
            let c = b.clone();
            assert_eq!(Rc::strong_count(&witness), 3);
            drop(a);
            drop(c);
            assert_eq!(Rc::strong_count(&witness), 3);
        }
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[test]
    fn into_iter_moves_and_drops_cleanly() {
        let vec: SocowVec<Rc<()>, 2> = {
            let witness = Rc::new(());
            crate::socowvec![witness.clone(), witness.clone(), witness]
        };
        let collected: Vec<Rc<()>> = vec.into_iter().collect();
        assert_eq!(collected.len(), 3);

        // Partial consumption must not leak the tail.
        let witness = Rc::new(());
        let vec: SocowVec<Rc<()>, 2> =
            crate::socowvec![witness.clone(), witness.clone(), witness.clone()];
        let mut iter = vec.into_iter();
        let _first = iter.next();
        drop(iter);
        drop(_first);
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[test]
    fn retain_and_resize() {
        let mut vec: SocowVec<i32, 4> = crate::socowvec![1, 2, 3, 4, 5, 6];
        vec.retain(|x| x % 2 == 0);
        assert_eq!(vec, [2, 4, 6]);
        vec.resize(5, 0);
        assert_eq!(vec, [2, 4, 6, 0, 0]);
        vec.resize(1, 9);
        assert_eq!(vec, [2]);
    }

    #[test]
    fn from_vec_moves_without_clone() {
        #[derive(Debug, PartialEq)]
        struct NoClone(i32);
        let source = alloc::vec![NoClone(1), NoClone(2)];
        let vec: SocowVec<NoClone, 4> = source.into();
        assert!(vec.is_small());
        assert_eq!(vec.len(), 2);
        assert_eq!(vec[1], NoClone(2));
    }

    #[test]
    fn swap_is_total() {
        let mut a: SocowVec<i32, 2> = crate::socowvec![1, 2, 3];
        let mut b: SocowVec<i32, 2> = crate::socowvec![9];
        a.swap(&mut b);
        assert_eq!(a, [9]);
        assert_eq!(b, [1, 2, 3]);
        assert!(a.is_small());
        assert!(!b.is_small());
    }

    /// Clone bomb: decrements the shared fuse on every clone and panics
    /// once it reaches zero.
    #[cfg(feature = "std")]
    #[derive(Debug)]
    struct Fragile {
        value: i32,
        fuse: Rc<core::cell::Cell<usize>>,
    }

    #[cfg(feature = "std")]
    impl Clone for Fragile {
        fn clone(&self) -> Self {
            let left = self.fuse.get();
            if left == 0 {
                panic!("clone fuse burned out");
            }
            self.fuse.set(left - 1);
            Fragile {
                value: self.value,
                fuse: Rc::clone(&self.fuse),
            }
        }
    }

    #[cfg(feature = "std")]
    fn fragile(value: i32, fuse: &Rc<core::cell::Cell<usize>>) -> Fragile {
        Fragile {
            value,
            fuse: Rc::clone(fuse),
        }
    }

    #[cfg(feature = "std")]
    fn values<const N: usize>(vec: &SocowVec<Fragile, N>) -> Vec<i32> {
        vec.iter().map(|f| f.value).collect()
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_clone_during_insert_leaves_vector_unchanged() {
        use core::cell::Cell;
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let fuse = Rc::new(Cell::new(usize::MAX));
        let mut a: SocowVec<Fragile, 2> = SocowVec::new();
        for v in 0..4 {
            a.push(fragile(v, &fuse));
        }
        let mut b = a.clone();
        assert!(b.is_shared());

        fuse.set(2); // third element clone blows up
        let err = catch_unwind(AssertUnwindSafe(|| b.insert(3, fragile(9, &fuse))));
        assert!(err.is_err());

        assert_eq!(values(&a), [0, 1, 2, 3]);
        assert_eq!(values(&b), [0, 1, 2, 3]);
        assert!(a.is_shared() && b.is_shared());
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_clone_during_set_capacity_leaves_vector_unchanged() {
        use core::cell::Cell;
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let fuse = Rc::new(Cell::new(usize::MAX));
        let mut vec: SocowVec<Fragile, 4> = SocowVec::new();
        for v in 0..5 {
            vec.push(fragile(v, &fuse));
        }
        vec.pop();
        vec.pop();
        assert!(!vec.is_small());
        let cap = vec.capacity();

        fuse.set(1); // second element clone blows up
        let err = catch_unwind(AssertUnwindSafe(|| vec.set_capacity(3)));
        assert!(err.is_err());

        assert!(!vec.is_small());
        assert_eq!(vec.capacity(), cap);
        assert_eq!(values(&vec), [0, 1, 2]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn panicking_clone_during_clone_from_leaves_target_unchanged() {
        use core::cell::Cell;
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let fuse = Rc::new(Cell::new(usize::MAX));
        let mut src: SocowVec<Fragile, 4> = SocowVec::new();
        for v in 10..13 {
            src.push(fragile(v, &fuse));
        }
        let mut dst: SocowVec<Fragile, 4> = SocowVec::new();
        dst.push(fragile(0, &fuse));

        fuse.set(1); // second element clone blows up
        let err = catch_unwind(AssertUnwindSafe(|| dst.clone_from(&src)));
        assert!(err.is_err());

        assert_eq!(values(&dst), [0]);
        assert_eq!(values(&src), [10, 11, 12]);
    }
}

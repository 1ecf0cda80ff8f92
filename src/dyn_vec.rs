use core::alloc::Layout;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem::{self, ManuallyDrop};
use core::ptr::{self, NonNull};

use alloc::alloc::{alloc, dealloc, handle_alloc_error};
use alloc::vec::Vec;

use crate::utils::{cold_path, split_range_bound};

/// A growable vector with exclusive ownership and geometric growth.
///
/// Unlike [`SocowVec`](crate::SocowVec) there is no sharing and no inline
/// buffer: every instance owns its heap block alone, `clone` is always a
/// deep copy, and mutation never clones elements behind your back. Growth
/// doubles the capacity (starting at 1); [`reserve`](DynVec::reserve) and
/// [`shrink_to_fit`](DynVec::shrink_to_fit) reallocate to the exact
/// requested size.
///
/// Zero-sized element types never allocate and report a capacity of
/// `usize::MAX`.
///
/// # Examples
///
/// ```
/// use socow::DynVec;
///
/// let mut vec: DynVec<i32> = DynVec::new();
/// assert_eq!(vec.capacity(), 0); // empty vectors do not allocate
/// vec.push(1);
/// vec.push(2);
/// vec.insert(1, 9);
/// assert_eq!(vec, [1, 9, 2]);
/// assert_eq!(vec.remove(0), 1);
/// ```
pub struct DynVec<T> {
    ptr: NonNull<T>,
    len: usize,
    cap: usize,
    _marker: PhantomData<T>,
}

// Exclusive ownership: the usual container bounds apply.
unsafe impl<T: Send> Send for DynVec<T> {}
unsafe impl<T: Sync> Sync for DynVec<T> {}

/// Creates a [`DynVec`] containing the arguments, `vec!`-style.
///
/// # Examples
///
/// ```
/// # use socow::{dynvec, DynVec};
/// let vec: DynVec<i32> = dynvec![];
/// let vec = dynvec![0u8; 4];
/// let vec = dynvec![1, 2, 3];
/// assert_eq!(vec, [1, 2, 3]);
/// ```
#[macro_export]
macro_rules! dynvec {
    [] => { $crate::DynVec::new() };
    [$elem:expr; $n:expr] => { $crate::DynVec::from_elem($elem, $n) };
    [$($item:expr),+ $(,)?] => { $crate::DynVec::from_buf([ $($item),+ ]) };
}

#[inline]
fn is_zst<T>() -> bool {
    mem::size_of::<T>() == 0
}

/// Allocates an array block for `cap` elements. `cap > 0`, `T` not a ZST.
fn allocate<T>(cap: usize) -> NonNull<T> {
    debug_assert!(cap > 0 && !is_zst::<T>());
    let Ok(layout) = Layout::array::<T>(cap) else {
        panic!("capacity overflow in `DynVec`");
    };
    // SAFETY: the layout has non-zero size.
    let raw = unsafe { alloc(layout) };
    let Some(ptr) = NonNull::new(raw.cast::<T>()) else {
        handle_alloc_error(layout)
    };
    ptr
}

/// Frees a block previously returned by [`allocate`] for the same `cap`.
unsafe fn deallocate<T>(ptr: NonNull<T>, cap: usize) {
    debug_assert!(cap > 0 && !is_zst::<T>());
    // SAFETY: same layout as the allocation; guaranteed valid by `allocate`.
    unsafe {
        let layout = Layout::array::<T>(cap).unwrap_unchecked();
        dealloc(ptr.as_ptr().cast::<u8>(), layout);
    }
}

impl<T> DynVec<T> {
    /// Constructs a new, empty `DynVec` without allocating.
    #[inline]
    pub const fn new() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            cap: if mem::size_of::<T>() == 0 {
                usize::MAX
            } else {
                0
            },
            _marker: PhantomData,
        }
    }

    /// Constructs an empty `DynVec` with space for exactly `capacity`
    /// elements.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut vec = Self::new();
        if capacity > 0 && !is_zst::<T>() {
            vec.ptr = allocate::<T>(capacity);
            vec.cap = capacity;
        }
        vec
    }

    /// Moves the elements of an array into a new vector.
    pub fn from_buf<const P: usize>(arr: [T; P]) -> Self {
        let arr = ManuallyDrop::new(arr);
        let mut vec = Self::with_capacity(P);
        // SAFETY: room for `P` elements; the source is forgotten.
        unsafe {
            ptr::copy_nonoverlapping(arr.as_ptr(), vec.as_mut_ptr(), P);
            vec.len = P;
        }
        vec
    }

    /// Returns the number of elements in the vector.
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector contains no elements.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of elements the vector can hold without
    /// reallocating.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.cap
    }

    /// Returns a raw pointer to the vector's buffer.
    #[inline]
    pub const fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    /// Returns a raw mutable pointer to the vector's buffer.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut T {
        self.ptr.as_ptr()
    }

    /// Extracts a slice containing the entire vector.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are constructed.
        unsafe { core::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// Extracts a mutable slice of the entire vector.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as `as_slice`, with exclusive access.
        unsafe { core::slice::from_raw_parts_mut(self.as_mut_ptr(), self.len) }
    }

    /// Forces the length to `new_len`.
    ///
    /// # Safety
    /// `new_len <= capacity()` and the first `new_len` slots must be
    /// constructed; slots beyond become uninitialized.
    #[inline]
    pub unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.cap);
        self.len = new_len;
    }

    /// Returns a reference to the element at `index`, or `None` if out of
    /// bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    /// Returns a mutable reference to the element at `index`, or `None` if
    /// out of bounds.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
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

    /// Returns an iterator over the elements.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Returns an iterator of mutable references.
    #[inline]
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Moves the elements into a block of exactly `new_cap` slots.
    /// `new_cap >= len` required; element moves cannot fail.
    fn reallocate(&mut self, new_cap: usize) {
        debug_assert!(new_cap >= self.len);
        if is_zst::<T>() {
            return;
        }
        let new_ptr = if new_cap == 0 {
            NonNull::dangling()
        } else {
            let new_ptr = allocate::<T>(new_cap);
            // SAFETY: distinct blocks; the first `len` slots are live.
            unsafe {
                ptr::copy_nonoverlapping(self.as_ptr(), new_ptr.as_ptr(), self.len);
            }
            new_ptr
        };
        if self.cap > 0 {
            // SAFETY: the old block was allocated with capacity `cap`.
            unsafe { deallocate(self.ptr, self.cap) };
        }
        self.ptr = new_ptr;
        self.cap = new_cap;
    }

    /// Ensures the capacity is at least `new_capacity`, reallocating to
    /// exactly that size if it is larger than the current capacity.
    pub fn reserve(&mut self, new_capacity: usize) {
        if new_capacity > self.cap {
            self.reallocate(new_capacity);
        }
    }

    /// Shrinks the capacity to the current length, freeing the block
    /// entirely when empty.
    pub fn shrink_to_fit(&mut self) {
        if self.cap != self.len && !is_zst::<T>() {
            self.reallocate(self.len);
        }
    }

    #[inline]
    fn grow_for_push(&mut self) {
        let new_cap = if self.cap == 0 { 1 } else { self.cap * 2 };
        self.reallocate(new_cap);
    }

    /// Appends an element to the back of the vector. Amortized O(1).
    #[inline]
    pub fn push(&mut self, value: T) {
        if self.len == self.cap {
            cold_path();
            self.grow_for_push();
        }
        // SAFETY: there is room after the growth check.
        unsafe {
            ptr::write(self.as_mut_ptr().add(self.len), value);
        }
        self.len += 1;
    }

    /// Removes the last element and returns it, or `None` if empty.
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            cold_path();
            None
        } else {
            self.len -= 1;
            // SAFETY: slot `len` was constructed and is now untracked.
            Some(unsafe { ptr::read(self.as_ptr().add(self.len)) })
        }
    }

    /// Inserts `element` at position `index`, shifting everything after it
    /// to the right.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, element: T) {
        assert!(index <= self.len, "insertion index should be <= len");
        if self.len == self.cap {
            cold_path();
            self.grow_for_push();
        }
        // SAFETY: capacity ensured; the tail shift keeps every slot owned
        // exactly once.
        unsafe {
            let ptr = self.as_mut_ptr().add(index);
            if index < self.len {
                ptr::copy(ptr, ptr.add(1), self.len - index);
            }
            ptr::write(ptr, element);
        }
        self.len += 1;
    }

    /// Removes the element at `index` and returns it, shifting everything
    /// after it to the left.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "removal index should be < len");
        // SAFETY: the gap is closed before the length drops.
        unsafe {
            let ptr = self.as_mut_ptr().add(index);
            let value = ptr::read(ptr);
            ptr::copy(ptr.add(1), ptr, self.len - index - 1);
            self.len -= 1;
            value
        }
    }

    /// Removes the elements in `range`, shifting the tail to the left.
    ///
    /// # Panics
    /// Panics if the range is out of bounds or decreasing.
    pub fn remove_range<R: core::ops::RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = split_range_bound(&range, self.len);
        assert!(start <= end, "range start should be <= end");
        assert!(end <= self.len, "range end should be <= len");
        if start == end {
            return;
        }
        // SAFETY: drop the doomed elements, close the gap.
        unsafe {
            let ptr = self.as_mut_ptr();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(ptr.add(start), end - start));
            ptr::copy(ptr.add(end), ptr.add(start), self.len - end);
        }
        self.len -= end - start;
    }

    /// Shortens the vector to `len` elements; no effect if already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            let rest = self.len - len;
            // Shrink first so a panicking element drop cannot double-drop.
            self.len = len;
            // SAFETY: slots `len..old_len` were constructed.
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                    self.as_mut_ptr().add(len),
                    rest,
                ));
            }
        }
    }

    /// Removes all elements, keeping the capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Retains only the elements for which `f` returns `true`, in order.
    pub fn retain<F: FnMut(&T) -> bool>(&mut self, mut f: F) {
        let len = self.len;
        let mut kept = 0usize;
        // SAFETY: length stays accurate while user code runs.
        unsafe {
            let base = self.as_mut_ptr();
            self.len = 0;
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
                self.len = kept;
            }
        }
    }

    /// Swaps the contents of two vectors. O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<T: Clone> DynVec<T> {
    /// Creates a `DynVec` with `num` clones of `elem`.
    pub fn from_elem(elem: T, num: usize) -> Self {
        let mut vec = Self::with_capacity(num);
        vec.resize(num, elem);
        vec
    }

    /// Resizes the vector so that `len` equals `new_len`, filling with
    /// clones of `value` when growing.
    pub fn resize(&mut self, new_len: usize, value: T) {
        if new_len < self.len {
            self.truncate(new_len);
            return;
        }
        self.reserve(new_len);
        // SAFETY: capacity ensured; length bumped per element so a panicking
        // clone leaks nothing it should not.
        unsafe {
            while self.len < new_len {
                ptr::write(self.as_mut_ptr().add(self.len), value.clone());
                self.len += 1;
            }
        }
    }

    /// Appends clones of every element of `other`.
    pub fn extend_from_slice(&mut self, other: &[T]) {
        let needed = self.len + other.len();
        if needed > self.cap {
            self.reserve(needed.max(self.cap * 2));
        }
        // SAFETY: capacity ensured; length bumped per element.
        unsafe {
            for item in other {
                ptr::write(self.as_mut_ptr().add(self.len), item.clone());
                self.len += 1;
            }
        }
    }
}

impl<T> Default for DynVec<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for DynVec<T> {
    fn drop(&mut self) {
        // SAFETY: the first `len` slots are constructed.
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), self.len));
        }
        if self.cap > 0 && !is_zst::<T>() {
            // SAFETY: block allocated with capacity `cap`.
            unsafe { deallocate(self.ptr, self.cap) };
        }
    }
}

impl<T: Clone> Clone for DynVec<T> {
    /// Always a deep copy of exactly `len` slots.
    fn clone(&self) -> Self {
        let mut vec = Self::with_capacity(self.len);
        vec.extend_from_slice(self.as_slice());
        vec
    }
}

impl<T, U> PartialEq<DynVec<U>> for DynVec<T>
where
    T: PartialEq<U>,
{
    #[inline]
    fn eq(&self, other: &DynVec<U>) -> bool {
        PartialEq::eq(self.as_slice(), other.as_slice())
    }
}

crate::utils::impl_slice_traits!([T] DynVec<T>);

impl<T> core::ops::DerefMut for DynVec<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T> core::convert::AsMut<[T]> for DynVec<T> {
    #[inline]
    fn as_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, I> core::ops::IndexMut<I> for DynVec<T>
where
    I: core::slice::SliceIndex<[T]>,
{
    #[inline]
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        core::ops::IndexMut::index_mut(self.as_mut_slice(), index)
    }
}

impl<'a, T> IntoIterator for &'a mut DynVec<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;
    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T, const P: usize> From<[T; P]> for DynVec<T> {
    #[inline]
    fn from(value: [T; P]) -> Self {
        Self::from_buf(value)
    }
}

impl<T: Clone> From<&[T]> for DynVec<T> {
    fn from(value: &[T]) -> Self {
        let mut vec = Self::with_capacity(value.len());
        vec.extend_from_slice(value);
        vec
    }
}

impl<T> From<Vec<T>> for DynVec<T> {
    /// Takes over the `Vec`'s allocation; no elements are moved or cloned.
    fn from(value: Vec<T>) -> Self {
        let mut value = ManuallyDrop::new(value);
        let cap = if is_zst::<T>() {
            usize::MAX
        } else {
            value.capacity()
        };
        Self {
            // SAFETY: `Vec`'s buffer pointer is non-null (dangling when
            // unallocated) and was allocated with `Layout::array::<T>(cap)`,
            // the same layout `deallocate` will use.
            ptr: unsafe { NonNull::new_unchecked(value.as_mut_ptr()) },
            len: value.len(),
            cap,
            _marker: PhantomData,
        }
    }
}

impl<T> From<DynVec<T>> for Vec<T> {
    /// Hands the allocation to a `Vec`; no elements are moved or cloned.
    fn from(value: DynVec<T>) -> Self {
        let value = ManuallyDrop::new(value);
        let cap = if is_zst::<T>() { value.len } else { value.cap };
        // SAFETY: the block satisfies `Vec::from_raw_parts`'s contract (see
        // the matching `From<Vec<T>>` above).
        unsafe { Vec::from_raw_parts(value.ptr.as_ptr(), value.len, cap) }
    }
}

impl<T> FromIterator<T> for DynVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut vec = Self::with_capacity(iter.size_hint().0);
        for item in iter {
            vec.push(item);
        }
        vec
    }
}

impl<T> Extend<T> for DynVec<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T: 'a + Clone> Extend<&'a T> for DynVec<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item.clone());
        }
    }
}

/// An iterator that consumes a [`DynVec`] and yields its items by value.
pub struct IntoIter<T> {
    vec: ManuallyDrop<DynVec<T>>,
    index: usize,
}

impl<T> IntoIterator for DynVec<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            vec: ManuallyDrop::new(self),
            index: 0,
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        if self.index < self.vec.len {
            // SAFETY: each slot is read exactly once.
            let value = unsafe { ptr::read(self.vec.as_ptr().add(self.index)) };
            self.index += 1;
            Some(value)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.vec.len - self.index;
        (rest, Some(rest))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

impl<T> Drop for IntoIter<T> {
    fn drop(&mut self) {
        // SAFETY: slots before `index` were moved out; drop the rest, then
        // free the block with a zero length.
        unsafe {
            let len = self.vec.len;
            let ptr = self.vec.as_mut_ptr();
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                ptr.add(self.index),
                len - self.index,
            ));
            self.vec.len = 0;
            ManuallyDrop::drop(&mut self.vec);
        }
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(&self.vec.as_slice()[self.index..])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::DynVec;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    #[test]
    fn empty_never_allocates() {
        let vec: DynVec<i32> = DynVec::new();
        assert_eq!(vec.capacity(), 0);
        assert!(vec.is_empty());
    }

    #[test]
    fn growth_doubles() {
        let mut vec: DynVec<i32> = DynVec::new();
        vec.push(0);
        assert_eq!(vec.capacity(), 1);
        vec.push(1);
        assert_eq!(vec.capacity(), 2);
        vec.push(2);
        assert_eq!(vec.capacity(), 4);
        for i in 3..9 {
            vec.push(i);
        }
        assert_eq!(vec.capacity(), 16);
        assert_eq!(vec, [0, 1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn push_pop_round_trip_preserves_capacity() {
        let mut vec: DynVec<i32> = DynVec::new();
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
    fn reserve_is_exact() {
        let mut vec: DynVec<i32> = DynVec::new();
        vec.reserve(7);
        assert_eq!(vec.capacity(), 7);
        vec.reserve(3); // never shrinks
        assert_eq!(vec.capacity(), 7);
    }

    #[test]
    fn shrink_to_fit_frees_when_empty() {
        let mut vec: DynVec<i32> = DynVec::with_capacity(10);
        vec.push(1);
        vec.push(2);
        vec.shrink_to_fit();
        assert_eq!(vec.capacity(), 2);
        vec.clear();
        vec.shrink_to_fit();
        assert_eq!(vec.capacity(), 0);
    }

    #[test]
    fn insert_remove_and_ranges() {
        let mut vec = crate::dynvec![1, 2, 3, 4, 5];
        vec.remove_range(1..3);
        assert_eq!(vec, [1, 4, 5]);
        vec.insert(1, 9);
        assert_eq!(vec, [1, 9, 4, 5]);
        assert_eq!(vec.remove(2), 4);
        assert_eq!(vec, [1, 9, 5]);
        vec.truncate(1);
        assert_eq!(vec, [1]);
    }

    #[test]
    fn retain_keeps_order() {
        let mut vec = crate::dynvec![1, 2, 3, 4, 5, 6];
        vec.retain(|x| x % 2 == 1);
        assert_eq!(vec, [1, 3, 5]);
    }

    #[test]
    fn vec_round_trip_steals_allocation() {
        let source = alloc::vec![1, 2, 3];
        let ptr = source.as_ptr();
        let vec: DynVec<i32> = source.into();
        assert_eq!(vec.as_ptr(), ptr);
        let back: Vec<i32> = vec.into();
        assert_eq!(back.as_ptr(), ptr);
        assert_eq!(back, [1, 2, 3]);
    }

    #[test]
    fn drops_every_element_once() {
        let witness = Rc::new(());
        {
            let mut vec: DynVec<Rc<()>> = DynVec::new();
            for _ in 0..5 {
                vec.push(witness.clone());
            }
            assert_eq!(Rc::strong_count(&witness), 6);
            vec.remove(0);
            vec.remove_range(1..3);
            assert_eq!(Rc::strong_count(&witness), 3);
        }
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[test]
    fn into_iter_partial_consumption() {
        let witness = Rc::new(());
        let vec = crate::dynvec![witness.clone(), witness.clone(), witness.clone()];
        let mut iter = vec.into_iter();
        assert!(iter.next().is_some());
        drop(iter);
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[test]
    fn zero_sized_elements() {
        let mut vec: DynVec<()> = DynVec::new();
        assert_eq!(vec.capacity(), usize::MAX);
        for _ in 0..100 {
            vec.push(());
        }
        assert_eq!(vec.len(), 100);
        assert_eq!(vec.pop(), Some(()));
        assert_eq!(vec.len(), 99);
    }
}

//! Reference-counted heap buffer shared between [`SocowVec`](crate::SocowVec)
//! instances.
//!
//! A buffer is a single allocation holding a small header (`capacity`,
//! `ref_count`) followed by `capacity` element slots. The live-element count
//! is deliberately *not* part of the header: every owning vector tracks its
//! own length, and the last owner to release the buffer passes the count of
//! elements it knows to be constructed.

use core::alloc::Layout;
use core::cell::Cell;
use core::marker::PhantomData;
use core::mem;
use core::ptr::{self, NonNull};

use alloc::alloc::{alloc, dealloc, handle_alloc_error};

/// Header placed at the start of every shared allocation.
///
/// The element slots follow the header in the same allocation, at the offset
/// computed by [`buffer_layout`].
struct Header {
    capacity: usize,
    ref_count: Cell<usize>,
}

/// Layout of a buffer for `capacity` slots of `T`, and the byte offset of the
/// first slot.
///
/// # Panics
/// Panics if the required size overflows `isize`.
fn buffer_layout<T>(capacity: usize) -> (Layout, usize) {
    let header = Layout::new::<Header>();
    let Ok(array) = Layout::array::<T>(capacity) else {
        panic!("capacity overflow in shared buffer");
    };
    let Ok((layout, offset)) = header.extend(array) else {
        panic!("capacity overflow in shared buffer");
    };
    (layout.pad_to_align(), offset)
}

/// One owner's handle to a shared buffer.
///
/// Cloning is O(1) and only bumps the reference count; the clone observes the
/// same `len`. Dropping releases the reference, and the owner that takes the
/// count to zero destroys its `len` live elements and frees the block.
///
/// The count is a non-atomic [`Cell`], so the handle is neither `Send` nor
/// `Sync` -- sharing is a single-threaded discipline.
pub(crate) struct SharedVec<T> {
    ptr: NonNull<Header>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T> SharedVec<T> {
    /// Allocates a fresh buffer with `ref_count == 1` and no live elements.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let (layout, _) = buffer_layout::<T>(capacity);
        debug_assert!(layout.size() > 0);

        // SAFETY: the layout has non-zero size (it contains the header).
        let raw = unsafe { alloc(layout) };
        let Some(ptr) = NonNull::new(raw.cast::<Header>()) else {
            handle_alloc_error(layout)
        };

        // SAFETY: freshly allocated, properly aligned for `Header`.
        unsafe {
            ptr.as_ptr().write(Header {
                capacity,
                ref_count: Cell::new(1),
            });
        }

        Self {
            ptr,
            len: 0,
            _marker: PhantomData,
        }
    }

    #[inline]
    fn header(&self) -> &Header {
        // SAFETY: the header stays valid for as long as any handle exists.
        unsafe { self.ptr.as_ref() }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.header().capacity
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// `true` if more than one handle points at this buffer.
    #[inline]
    pub(crate) fn is_shared(&self) -> bool {
        self.header().ref_count.get() > 1
    }

    /// Pointer to the first element slot.
    #[inline]
    pub(crate) fn as_ptr(&self) -> *const T {
        let (_, offset) = buffer_layout::<T>(self.header().capacity);
        // SAFETY: `offset` is within the allocation by construction.
        unsafe { self.ptr.as_ptr().cast::<u8>().add(offset).cast::<T>() }
    }

    /// Mutable pointer to the first element slot.
    ///
    /// Writing through this pointer while the buffer is shared violates the
    /// copy-on-write discipline; callers must hold the unique reference.
    #[inline]
    pub(crate) fn as_mut_ptr(&mut self) -> *mut T {
        self.as_ptr() as *mut T
    }

    #[inline]
    pub(crate) fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots are constructed.
        unsafe { core::slice::from_raw_parts(self.as_ptr(), self.len) }
    }

    /// Forces the live-element count to `new_len`.
    ///
    /// # Safety
    /// `new_len <= capacity()`, the first `new_len` slots must be
    /// constructed, and slots beyond must be treated as uninitialized.
    #[inline]
    pub(crate) unsafe fn set_len(&mut self, new_len: usize) {
        debug_assert!(new_len <= self.capacity());
        self.len = new_len;
    }

    /// Appends a value without checking capacity.
    ///
    /// Keeping `len` accurate after every write is what makes a partially
    /// filled handle safe to drop when an element `clone` panics mid-build.
    ///
    /// # Safety
    /// `len < capacity()` and the handle must be the unique reference.
    #[inline]
    pub(crate) unsafe fn push_unchecked(&mut self, value: T) {
        debug_assert!(self.len < self.capacity());
        debug_assert!(!self.is_shared());
        unsafe {
            ptr::write(self.as_mut_ptr().add(self.len), value);
        }
        self.len += 1;
    }

    /// Destroys all live elements in place, keeping the allocation.
    ///
    /// # Safety
    /// The handle must be the unique reference.
    pub(crate) unsafe fn clear_unique(&mut self) {
        debug_assert!(!self.is_shared());
        let len = mem::replace(&mut self.len, 0);
        if len > 0 {
            unsafe {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), len));
            }
        }
    }
}

impl<T> Clone for SharedVec<T> {
    /// O(1): bumps the reference count and aliases the buffer.
    #[inline]
    fn clone(&self) -> Self {
        let count = self.header().ref_count.get();
        self.header().ref_count.set(count + 1);
        Self {
            ptr: self.ptr,
            len: self.len,
            _marker: PhantomData,
        }
    }
}

impl<T> Drop for SharedVec<T> {
    fn drop(&mut self) {
        let count = self.header().ref_count.get();
        if count > 1 {
            self.header().ref_count.set(count - 1);
            return;
        }

        // Last owner: destroy the elements this handle knows to be live,
        // then free the block.
        let capacity = self.header().capacity;
        unsafe {
            if self.len > 0 {
                ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.as_mut_ptr(), self.len));
            }
            let (layout, _) = buffer_layout::<T>(capacity);
            dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SharedVec;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    #[test]
    fn alias_and_release() {
        let mut a: SharedVec<i32> = SharedVec::with_capacity(4);
        unsafe {
            a.push_unchecked(1);
            a.push_unchecked(2);
        }
        let b = a.clone();
        assert!(a.is_shared());
        assert_eq!(b.as_slice(), &[1, 2]);
        drop(b);
        assert!(!a.is_shared());
        assert_eq!(a.as_slice(), &[1, 2]);
    }

    #[test]
    fn last_owner_drops_elements() {
        let witness = Rc::new(());
        let mut a: SharedVec<Rc<()>> = SharedVec::with_capacity(2);
        unsafe {
            a.push_unchecked(witness.clone());
            a.push_unchecked(witness.clone());
        }
        let b = a.clone();
        assert_eq!(Rc::strong_count(&witness), 3);
        drop(a);
        // Elements survive as long as one owner remains.
        assert_eq!(Rc::strong_count(&witness), 3);
        drop(b);
        assert_eq!(Rc::strong_count(&witness), 1);
    }

    #[test]
    fn zero_sized_elements() {
        let mut a: SharedVec<()> = SharedVec::with_capacity(8);
        unsafe {
            a.push_unchecked(());
            a.push_unchecked(());
        }
        assert_eq!(a.len(), 2);
        assert_eq!(a.capacity(), 8);
        let _keep: Vec<()> = a.as_slice().to_vec();
    }
}

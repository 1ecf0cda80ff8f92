use core::fmt;
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use alloc::boxed::Box;

use crate::utils::split_range_bound;

/// One link of the ring. The sentinel is a `Node` whose `value` is never
/// initialized, so every link operation is uniform and needs no null checks.
struct Node<T> {
    prev: NonNull<Node<T>>,
    next: NonNull<Node<T>>,
    value: MaybeUninit<T>,
}

/// A doubly-linked list built as a closed ring around a sentinel node.
///
/// `sentinel.next` is the first element and `sentinel.prev` the last; an
/// empty list is the sentinel linked to itself. Positions in the API are
/// plain indices. Element handles stay valid across insertions and removals
/// elsewhere in the list, which is what makes O(1)
/// [`splice`](List::splice) possible.
///
/// # Examples
///
/// ```
/// use socow::List;
///
/// let mut list: List<i32> = List::new();
/// list.push_back(2);
/// list.push_front(1);
/// list.push_back(3);
/// assert_eq!(list.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
/// assert_eq!(list.pop_front(), Some(1));
/// ```
pub struct List<T> {
    root: NonNull<Node<T>>,
    len: usize,
    _marker: PhantomData<Box<Node<T>>>,
}

unsafe impl<T: Send> Send for List<T> {}
unsafe impl<T: Sync> Sync for List<T> {}

impl<T> List<T> {
    /// Constructs a new, empty list. Allocates the sentinel node.
    pub fn new() -> Self {
        let root = NonNull::from(Box::leak(Box::new(Node {
            prev: NonNull::dangling(),
            next: NonNull::dangling(),
            value: MaybeUninit::uninit(),
        })));
        // SAFETY: close the ring on the freshly allocated sentinel.
        unsafe {
            (*root.as_ptr()).prev = root;
            (*root.as_ptr()).next = root;
        }
        Self {
            root,
            len: 0,
            _marker: PhantomData,
        }
    }

    /// Returns the number of elements in the list.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Node at `index`, walking from the nearer end. `index == len` yields
    /// the sentinel, i.e. the one-past-the-end position.
    fn node_at(&self, index: usize) -> NonNull<Node<T>> {
        debug_assert!(index <= self.len);
        // SAFETY: the ring is closed and holds `len` element nodes.
        unsafe {
            if index <= self.len / 2 {
                let mut node = (*self.root.as_ptr()).next;
                for _ in 0..index {
                    node = (*node.as_ptr()).next;
                }
                node
            } else {
                let mut node = self.root;
                for _ in index..self.len {
                    node = (*node.as_ptr()).prev;
                }
                node
            }
        }
    }

    /// Links a new node holding `value` directly before `pos`.
    ///
    /// # Safety
    /// `pos` must be a node of this list's ring (the sentinel included).
    unsafe fn link_before(&mut self, pos: NonNull<Node<T>>, value: T) {
        unsafe {
            let prev = (*pos.as_ptr()).prev;
            let node = NonNull::from(Box::leak(Box::new(Node {
                prev,
                next: pos,
                value: MaybeUninit::new(value),
            })));
            (*prev.as_ptr()).next = node;
            (*pos.as_ptr()).prev = node;
        }
        self.len += 1;
    }

    /// Unlinks an element node, frees it, and returns its value.
    ///
    /// # Safety
    /// `node` must be an element node of this list's ring (not the
    /// sentinel).
    unsafe fn unlink(&mut self, node: NonNull<Node<T>>) -> T {
        debug_assert!(node != self.root);
        unsafe {
            let prev = (*node.as_ptr()).prev;
            let next = (*node.as_ptr()).next;
            (*prev.as_ptr()).next = next;
            (*next.as_ptr()).prev = prev;
            self.len -= 1;
            let node = Box::from_raw(node.as_ptr());
            node.value.assume_init()
        }
    }

    /// Inserts `value` at position `index`. O(min(index, len - index)) to
    /// find the spot, O(1) to link.
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: T) {
        assert!(index <= self.len, "insertion index should be <= len");
        let pos = self.node_at(index);
        // SAFETY: `node_at` returns a node of this ring.
        unsafe { self.link_before(pos, value) };
    }

    /// Removes and returns the element at position `index`.
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> T {
        assert!(index < self.len, "removal index should be < len");
        let node = self.node_at(index);
        // SAFETY: `index < len`, so this is an element node.
        unsafe { self.unlink(node) }
    }

    /// Appends an element to the back of the list. O(1).
    #[inline]
    pub fn push_back(&mut self, value: T) {
        // SAFETY: linking before the sentinel appends.
        unsafe { self.link_before(self.root, value) };
    }

    /// Prepends an element to the front of the list. O(1).
    #[inline]
    pub fn push_front(&mut self, value: T) {
        // SAFETY: the first node (or the sentinel when empty) is in the ring.
        unsafe {
            let first = (*self.root.as_ptr()).next;
            self.link_before(first, value);
        }
    }

    /// Removes the last element and returns it, or `None` if empty. O(1).
    pub fn pop_back(&mut self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            // SAFETY: non-empty, so `root.prev` is an element node.
            unsafe {
                let last = (*self.root.as_ptr()).prev;
                Some(self.unlink(last))
            }
        }
    }

    /// Removes the first element and returns it, or `None` if empty. O(1).
    pub fn pop_front(&mut self) -> Option<T> {
        if self.is_empty() {
            None
        } else {
            // SAFETY: non-empty, so `root.next` is an element node.
            unsafe {
                let first = (*self.root.as_ptr()).next;
                Some(self.unlink(first))
            }
        }
    }

    /// Returns a reference to the first element, or `None` if empty.
    pub fn front(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            // SAFETY: non-empty, so the first node's value is initialized.
            unsafe { Some((*(*self.root.as_ptr()).next.as_ptr()).value.assume_init_ref()) }
        }
    }

    /// Returns a mutable reference to the first element, or `None` if empty.
    pub fn front_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            None
        } else {
            // SAFETY: as `front`, with exclusive access.
            unsafe { Some((*(*self.root.as_ptr()).next.as_ptr()).value.assume_init_mut()) }
        }
    }

    /// Returns a reference to the last element, or `None` if empty.
    pub fn back(&self) -> Option<&T> {
        if self.is_empty() {
            None
        } else {
            // SAFETY: non-empty, so the last node's value is initialized.
            unsafe { Some((*(*self.root.as_ptr()).prev.as_ptr()).value.assume_init_ref()) }
        }
    }

    /// Returns a mutable reference to the last element, or `None` if empty.
    pub fn back_mut(&mut self) -> Option<&mut T> {
        if self.is_empty() {
            None
        } else {
            // SAFETY: as `back`, with exclusive access.
            unsafe { Some((*(*self.root.as_ptr()).prev.as_ptr()).value.assume_init_mut()) }
        }
    }

    /// Moves the elements of `other` in `range` into this list before
    /// position `at`, preserving their order. No elements are copied,
    /// moved in memory, or dropped; only links are rewired.
    ///
    /// Splicing the full range of `other` (`..`) is O(1). A partial range
    /// costs a walk to its endpoints.
    ///
    /// # Panics
    /// Panics if `at > self.len` or the range is out of bounds or
    /// decreasing.
    ///
    /// # Examples
    ///
    /// ```
    /// # use socow::List;
    /// let mut a: List<i32> = (1..=3).collect();
    /// let mut b: List<i32> = (4..=6).collect();
    /// a.splice(1, &mut b, 1..3);
    /// assert_eq!(a.iter().copied().collect::<Vec<_>>(), [1, 5, 6, 2, 3]);
    /// assert_eq!(b.iter().copied().collect::<Vec<_>>(), [4]);
    /// ```
    pub fn splice<R: core::ops::RangeBounds<usize>>(
        &mut self,
        at: usize,
        other: &mut List<T>,
        range: R,
    ) {
        assert!(at <= self.len, "splice position should be <= len");
        let (start, end) = split_range_bound(&range, other.len);
        assert!(start <= end, "range start should be <= end");
        assert!(end <= other.len, "range end should be <= len");

        let count = end - start;
        if count == 0 {
            return;
        }

        // SAFETY: `first..=last` is a non-empty run of element nodes in
        // `other`'s ring; it is cut out whole and stitched in before `pos`.
        unsafe {
            let first = other.node_at(start);
            let last = if end == other.len {
                // Full tail: the last node is at hand, no walk needed.
                (*other.root.as_ptr()).prev
            } else {
                let mut node = first;
                for _ in 1..count {
                    node = (*node.as_ptr()).next;
                }
                node
            };
            let pos = self.node_at(at);

            let before_run = (*first.as_ptr()).prev;
            let after_run = (*last.as_ptr()).next;
            (*before_run.as_ptr()).next = after_run;
            (*after_run.as_ptr()).prev = before_run;

            let before_pos = (*pos.as_ptr()).prev;
            (*before_pos.as_ptr()).next = first;
            (*first.as_ptr()).prev = before_pos;
            (*last.as_ptr()).next = pos;
            (*pos.as_ptr()).prev = last;
        }

        other.len -= count;
        self.len += count;
    }

    /// Moves every element of `other` to the back of this list. O(1).
    #[inline]
    pub fn append(&mut self, other: &mut List<T>) {
        self.splice(self.len, other, ..);
    }

    /// Removes the elements in `range`.
    ///
    /// The doomed run is spliced out in O(1) link updates (plus the walk to
    /// its endpoints) and dropped as a detached list.
    ///
    /// # Panics
    /// Panics if the range is out of bounds or decreasing.
    pub fn remove_range<R: core::ops::RangeBounds<usize>>(&mut self, range: R) {
        let (start, end) = split_range_bound(&range, self.len);
        let mut scratch = List::new();
        scratch.splice(0, self, start..end);
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    /// Swaps the contents of two lists. O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Returns a double-ended iterator over the elements.
    pub fn iter(&self) -> Iter<'_, T> {
        // SAFETY: the ring is closed; bounds come from `len`.
        unsafe {
            Iter {
                head: (*self.root.as_ptr()).next,
                tail: (*self.root.as_ptr()).prev,
                rem: self.len,
                _marker: PhantomData,
            }
        }
    }

    /// Returns a double-ended iterator of mutable references.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        // SAFETY: as `iter`, with exclusive access.
        unsafe {
            IterMut {
                head: (*self.root.as_ptr()).next,
                tail: (*self.root.as_ptr()).prev,
                rem: self.len,
                _marker: PhantomData,
            }
        }
    }
}

impl<T> Default for List<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for List<T> {
    fn drop(&mut self) {
        self.clear();
        // SAFETY: all element nodes are gone; free the sentinel. Its value
        // was never initialized, so nothing of type `T` drops here.
        unsafe {
            drop(Box::from_raw(self.root.as_ptr()));
        }
    }
}

impl<T: Clone> Clone for List<T> {
    fn clone(&self) -> Self {
        let mut list = Self::new();
        for item in self {
            list.push_back(item.clone());
        }
        list
    }
}

impl<T: PartialEq> PartialEq for List<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for List<T> {}

impl<T: fmt::Debug> fmt::Debug for List<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T> FromIterator<T> for List<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T> Extend<T> for List<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

impl<'a, T: 'a + Clone> Extend<&'a T> for List<T> {
    fn extend<I: IntoIterator<Item = &'a T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item.clone());
        }
    }
}

/// A borrowing iterator over a [`List`].
pub struct Iter<'a, T> {
    head: NonNull<Node<T>>,
    tail: NonNull<Node<T>>,
    rem: usize,
    _marker: PhantomData<&'a T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.rem == 0 {
            None
        } else {
            // SAFETY: `rem > 0` keeps `head` on an initialized element node.
            unsafe {
                let value = (*self.head.as_ptr()).value.assume_init_ref();
                self.head = (*self.head.as_ptr()).next;
                self.rem -= 1;
                Some(value)
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rem, Some(self.rem))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.rem == 0 {
            None
        } else {
            // SAFETY: as `next`, from the back.
            unsafe {
                let value = (*self.tail.as_ptr()).value.assume_init_ref();
                self.tail = (*self.tail.as_ptr()).prev;
                self.rem -= 1;
                Some(value)
            }
        }
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head,
            tail: self.tail,
            rem: self.rem,
            _marker: PhantomData,
        }
    }
}

/// A mutably borrowing iterator over a [`List`].
pub struct IterMut<'a, T> {
    head: NonNull<Node<T>>,
    tail: NonNull<Node<T>>,
    rem: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        if self.rem == 0 {
            None
        } else {
            // SAFETY: each node is visited once, so the references are
            // disjoint.
            unsafe {
                let value = (*self.head.as_ptr()).value.assume_init_mut();
                self.head = (*self.head.as_ptr()).next;
                self.rem -= 1;
                Some(value)
            }
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.rem, Some(self.rem))
    }
}

impl<'a, T> DoubleEndedIterator for IterMut<'a, T> {
    fn next_back(&mut self) -> Option<&'a mut T> {
        if self.rem == 0 {
            None
        } else {
            // SAFETY: as `next`, from the back.
            unsafe {
                let value = (*self.tail.as_ptr()).value.assume_init_mut();
                self.tail = (*self.tail.as_ptr()).prev;
                self.rem -= 1;
                Some(value)
            }
        }
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}
impl<T> FusedIterator for IterMut<'_, T> {}

/// An iterator that consumes a [`List`] and yields its items by value.
pub struct IntoIter<T> {
    list: List<T>,
}

impl<T> IntoIterator for List<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { list: self }
    }
}

impl<'a, T> IntoIterator for &'a List<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut List<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len, Some(self.list.len))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    #[inline]
    fn next_back(&mut self) -> Option<T> {
        self.list.pop_back()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
impl<T> FusedIterator for IntoIter<T> {}

#[cfg(test)]
mod tests {
    use crate::List;
    use alloc::rc::Rc;
    use alloc::vec::Vec;

    fn items(list: &List<i32>) -> Vec<i32> {
        list.iter().copied().collect()
    }

    #[test]
    fn push_pop_both_ends() {
        let mut list: List<i32> = List::new();
        list.push_back(2);
        list.push_front(1);
        list.push_back(3);
        assert_eq!(items(&list), [1, 2, 3]);
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(list.pop_back(), Some(3));
        assert_eq!(list.pop_back(), Some(2));
        assert_eq!(list.pop_back(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn front_back_accessors() {
        let mut list: List<i32> = (1..=3).collect();
        assert_eq!(list.front(), Some(&1));
        assert_eq!(list.back(), Some(&3));
        *list.front_mut().unwrap() = 10;
        *list.back_mut().unwrap() = 30;
        assert_eq!(items(&list), [10, 2, 30]);
    }

    #[test]
    fn insert_remove_by_index() {
        let mut list: List<i32> = (1..=4).collect();
        list.insert(2, 9);
        assert_eq!(items(&list), [1, 2, 9, 3, 4]);
        assert_eq!(list.remove(0), 1);
        assert_eq!(list.remove(3), 4);
        assert_eq!(items(&list), [2, 9, 3]);
    }

    #[test]
    fn splice_conserves_elements() {
        let mut a: List<i32> = (1..=3).collect();
        let mut b: List<i32> = (4..=6).collect();
        let total = a.len() + b.len();
        a.splice(1, &mut b, 1..3);
        assert_eq!(a.len() + b.len(), total);
        assert_eq!(items(&a), [1, 5, 6, 2, 3]);
        assert_eq!(items(&b), [4]);
    }

    #[test]
    fn splice_full_range_and_append() {
        let mut a: List<i32> = (1..=2).collect();
        let mut b: List<i32> = (3..=5).collect();
        a.append(&mut b);
        assert_eq!(items(&a), [1, 2, 3, 4, 5]);
        assert!(b.is_empty());
        // The emptied source must remain usable.
        b.push_back(7);
        assert_eq!(items(&b), [7]);
    }

    #[test]
    fn remove_range_drops_the_run() {
        let mut list: List<i32> = (1..=5).collect();
        list.remove_range(1..3);
        assert_eq!(items(&list), [1, 4, 5]);
        list.remove_range(..);
        assert!(list.is_empty());
    }

    #[test]
    fn double_ended_iteration() {
        let list: List<i32> = (1..=5).collect();
        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&5));
        assert_eq!(iter.next_back(), Some(&4));
        assert_eq!(iter.next(), Some(&2));
        assert_eq!(iter.next(), Some(&3));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);

        let rev: Vec<i32> = list.into_iter().rev().collect();
        assert_eq!(rev, [5, 4, 3, 2, 1]);
    }

    #[test]
    fn iter_mut_touches_every_element() {
        let mut list: List<i32> = (1..=4).collect();
        for item in &mut list {
            *item *= 10;
        }
        assert_eq!(items(&list), [10, 20, 30, 40]);
    }

    #[test]
    fn clone_and_eq() {
        let list: List<i32> = (1..=4).collect();
        let copy = list.clone();
        assert_eq!(list, copy);
        let shorter: List<i32> = (1..=3).collect();
        assert_ne!(list, shorter);
    }

    #[test]
    fn drops_every_element() {
        let witness = Rc::new(());
        {
            let mut list: List<Rc<()>> = List::new();
            for _ in 0..5 {
                list.push_back(witness.clone());
            }
            list.remove_range(1..4);
            assert_eq!(Rc::strong_count(&witness), 3);
        }
        assert_eq!(Rc::strong_count(&witness), 1);
    }
}

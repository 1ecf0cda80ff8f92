use core::fmt;
use core::iter::FusedIterator;
use core::mem;
use core::ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Sub, SubAssign};

use alloc::boxed::Box;
use alloc::vec::Vec;

/// A dense, row-major matrix.
///
/// Elements live in one contiguous block; `(row, col)` maps to
/// `row * cols + col`. Rows are therefore plain slices, while columns are
/// walked through the strided [`Col`] iterator. A matrix with zero rows or
/// zero columns normalizes to the empty `0 x 0` shape and holds no storage.
///
/// Arithmetic goes through the standard operator traits:
/// elementwise `+`/`-` on equal shapes, matrix `*` on compatible shapes,
/// and scalar `*`.
///
/// # Examples
///
/// ```
/// use socow::Matrix;
///
/// let a = Matrix::from([[1, 2], [3, 4]]);
/// let b = Matrix::from([[0, 1], [1, 0]]);
/// assert_eq!(&a * &b, Matrix::from([[2, 1], [4, 3]]));
/// assert_eq!(a[(1, 0)], 3);
/// assert_eq!(a.col(1).copied().collect::<Vec<_>>(), [2, 4]);
/// ```
pub struct Matrix<T> {
    data: Box<[T]>,
    rows: usize,
    cols: usize,
}

impl<T> Matrix<T> {
    fn from_boxed(data: Box<[T]>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        if rows == 0 || cols == 0 {
            Self::empty()
        } else {
            Self { data, rows, cols }
        }
    }

    fn empty() -> Self {
        Self {
            data: Vec::new().into_boxed_slice(),
            rows: 0,
            cols: 0,
        }
    }

    /// Builds a `rows x cols` matrix by calling `f(row, col)` for every
    /// position, in row-major order.
    pub fn from_fn<F: FnMut(usize, usize) -> T>(rows: usize, cols: usize, mut f: F) -> Self {
        let mut data = Vec::with_capacity(rows.checked_mul(cols).unwrap_or(0));
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self::from_boxed(data.into_boxed_slice(), rows, cols)
    }

    /// Returns the number of rows.
    #[inline]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[inline]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the total number of elements.
    #[inline]
    pub const fn size(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns `true` for the empty `0 x 0` matrix.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// All elements in row-major order.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// All elements in row-major order, mutably.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Row `r` as a contiguous slice.
    ///
    /// # Panics
    /// Panics if `r >= rows`.
    #[inline]
    pub fn row(&self, r: usize) -> &[T] {
        assert!(r < self.rows, "row index should be < rows");
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Row `r` as a contiguous mutable slice.
    ///
    /// # Panics
    /// Panics if `r >= rows`.
    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [T] {
        assert!(r < self.rows, "row index should be < rows");
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Strided iterator over column `c`, top to bottom.
    ///
    /// # Panics
    /// Panics if `c >= cols`.
    pub fn col(&self, c: usize) -> Col<'_, T> {
        assert!(c < self.cols, "column index should be < cols");
        Col {
            matrix: self,
            front: 0,
            back: self.rows,
            col: c,
        }
    }

    /// Returns a reference to the element at `(r, c)`, or `None` if out of
    /// bounds.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> Option<&T> {
        if r < self.rows && c < self.cols {
            Some(&self.data[r * self.cols + c])
        } else {
            None
        }
    }

    /// Returns a mutable reference to the element at `(r, c)`, or `None` if
    /// out of bounds.
    #[inline]
    pub fn get_mut(&mut self, r: usize, c: usize) -> Option<&mut T> {
        if r < self.rows && c < self.cols {
            Some(&mut self.data[r * self.cols + c])
        } else {
            None
        }
    }

    /// Iterator over all elements in row-major order.
    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.data.iter()
    }

    /// Mutable iterator over all elements in row-major order.
    #[inline]
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.data.iter_mut()
    }

    /// Moves the contents out, leaving the empty matrix behind.
    #[inline]
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }

    /// Swaps the contents of two matrices. O(1).
    #[inline]
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }
}

impl<T: Default> Matrix<T> {
    /// Creates a `rows x cols` matrix of default-constructed elements.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_fn(rows, cols, |_, _| T::default())
    }
}

impl<T> Default for Matrix<T> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, const R: usize, const C: usize> From<[[T; C]; R]> for Matrix<T> {
    fn from(value: [[T; C]; R]) -> Self {
        let mut data = Vec::with_capacity(R * C);
        for row in value {
            data.extend(row);
        }
        Self::from_boxed(data.into_boxed_slice(), R, C)
    }
}

impl<T: Clone> Clone for Matrix<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl<T: PartialEq> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.rows == other.rows && self.cols == other.cols && self.data == other.data
    }
}

impl<T: Eq> Eq for Matrix<T> {}

impl<T: fmt::Debug> fmt::Debug for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..self.rows).map(|r| self.row(r)))
            .finish()
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &T {
        assert!(r < self.rows, "row index should be < rows");
        assert!(c < self.cols, "column index should be < cols");
        &self.data[r * self.cols + c]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        assert!(r < self.rows, "row index should be < rows");
        assert!(c < self.cols, "column index should be < cols");
        &mut self.data[r * self.cols + c]
    }
}

impl<'a, T> IntoIterator for &'a Matrix<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Matrix<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Strided iterator over one column of a [`Matrix`].
pub struct Col<'a, T> {
    matrix: &'a Matrix<T>,
    front: usize,
    back: usize,
    col: usize,
}

impl<'a, T> Iterator for Col<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        if self.front < self.back {
            let item = &self.matrix.data[self.front * self.matrix.cols + self.col];
            self.front += 1;
            Some(item)
        } else {
            None
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.back - self.front;
        (rest, Some(rest))
    }
}

impl<'a, T> DoubleEndedIterator for Col<'a, T> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a T> {
        if self.front < self.back {
            self.back -= 1;
            Some(&self.matrix.data[self.back * self.matrix.cols + self.col])
        } else {
            None
        }
    }
}

impl<T> ExactSizeIterator for Col<'_, T> {}
impl<T> FusedIterator for Col<'_, T> {}

impl<T> Clone for Col<'_, T> {
    fn clone(&self) -> Self {
        Self {
            matrix: self.matrix,
            front: self.front,
            back: self.back,
            col: self.col,
        }
    }
}

impl<T> AddAssign<&Matrix<T>> for Matrix<T>
where
    T: AddAssign<T> + Clone,
{
    fn add_assign(&mut self, rhs: &Matrix<T>) {
        assert!(
            self.rows == rhs.rows && self.cols == rhs.cols,
            "matrix shapes should match for elementwise arithmetic"
        );
        for (lhs, rhs) in self.data.iter_mut().zip(rhs.data.iter()) {
            *lhs += rhs.clone();
        }
    }
}

impl<T> SubAssign<&Matrix<T>> for Matrix<T>
where
    T: SubAssign<T> + Clone,
{
    fn sub_assign(&mut self, rhs: &Matrix<T>) {
        assert!(
            self.rows == rhs.rows && self.cols == rhs.cols,
            "matrix shapes should match for elementwise arithmetic"
        );
        for (lhs, rhs) in self.data.iter_mut().zip(rhs.data.iter()) {
            *lhs -= rhs.clone();
        }
    }
}

impl<T> Add<&Matrix<T>> for Matrix<T>
where
    T: AddAssign<T> + Clone,
{
    type Output = Matrix<T>;

    fn add(mut self, rhs: &Matrix<T>) -> Matrix<T> {
        self += rhs;
        self
    }
}

impl<T> Add for &Matrix<T>
where
    T: AddAssign<T> + Clone,
{
    type Output = Matrix<T>;

    fn add(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.clone() + rhs
    }
}

impl<T> Add for Matrix<T>
where
    T: AddAssign<T> + Clone,
{
    type Output = Matrix<T>;

    fn add(self, rhs: Matrix<T>) -> Matrix<T> {
        self + &rhs
    }
}

impl<T> Sub<&Matrix<T>> for Matrix<T>
where
    T: SubAssign<T> + Clone,
{
    type Output = Matrix<T>;

    fn sub(mut self, rhs: &Matrix<T>) -> Matrix<T> {
        self -= rhs;
        self
    }
}

impl<T> Sub for &Matrix<T>
where
    T: SubAssign<T> + Clone,
{
    type Output = Matrix<T>;

    fn sub(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.clone() - rhs
    }
}

impl<T> Sub for Matrix<T>
where
    T: SubAssign<T> + Clone,
{
    type Output = Matrix<T>;

    fn sub(self, rhs: Matrix<T>) -> Matrix<T> {
        self - &rhs
    }
}

impl<T> Mul for &Matrix<T>
where
    T: Default + AddAssign<T> + Clone + Mul<Output = T>,
{
    type Output = Matrix<T>;

    /// Matrix product. `self.cols` must equal `rhs.rows`.
    fn mul(self, rhs: &Matrix<T>) -> Matrix<T> {
        assert!(
            self.cols == rhs.rows,
            "lhs cols should equal rhs rows for matrix multiplication"
        );
        Matrix::from_fn(self.rows, rhs.cols, |r, c| {
            let mut acc = T::default();
            for k in 0..self.cols {
                acc += self[(r, k)].clone() * rhs[(k, c)].clone();
            }
            acc
        })
    }
}

impl<T> Mul for Matrix<T>
where
    T: Default + AddAssign<T> + Clone + Mul<Output = T>,
{
    type Output = Matrix<T>;

    fn mul(self, rhs: Matrix<T>) -> Matrix<T> {
        &self * &rhs
    }
}

impl<T> MulAssign<&Matrix<T>> for Matrix<T>
where
    T: Default + AddAssign<T> + Clone + Mul<Output = T>,
{
    fn mul_assign(&mut self, rhs: &Matrix<T>) {
        *self = &*self * rhs;
    }
}

impl<T> Mul<T> for Matrix<T>
where
    T: MulAssign<T> + Clone,
{
    type Output = Matrix<T>;

    /// Scalar product.
    fn mul(mut self, rhs: T) -> Matrix<T> {
        self *= rhs;
        self
    }
}

impl<T> Mul<T> for &Matrix<T>
where
    T: MulAssign<T> + Clone,
{
    type Output = Matrix<T>;

    fn mul(self, rhs: T) -> Matrix<T> {
        self.clone() * rhs
    }
}

impl<T> MulAssign<T> for Matrix<T>
where
    T: MulAssign<T> + Clone,
{
    fn mul_assign(&mut self, rhs: T) {
        for item in self.data.iter_mut() {
            *item *= rhs.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Matrix;
    use alloc::vec::Vec;

    #[test]
    fn shape_and_indexing() {
        let m = Matrix::from([[1, 2, 3], [4, 5, 6]]);
        assert_eq!((m.rows(), m.cols(), m.size()), (2, 3, 6));
        assert_eq!(m[(0, 2)], 3);
        assert_eq!(m[(1, 0)], 4);
        assert_eq!(m.get(2, 0), None);
        assert_eq!(m.get(0, 3), None);
    }

    #[test]
    fn zero_dimension_normalizes_to_empty() {
        let m: Matrix<i32> = Matrix::new(3, 0);
        assert!(m.is_empty());
        assert_eq!((m.rows(), m.cols()), (0, 0));
        let m: Matrix<i32> = Matrix::new(0, 7);
        assert_eq!((m.rows(), m.cols()), (0, 0));
    }

    #[test]
    fn rows_are_slices_cols_are_strided() {
        let m = Matrix::from([[1, 2], [3, 4], [5, 6]]);
        assert_eq!(m.row(1), [3, 4]);
        let col: Vec<i32> = m.col(1).copied().collect();
        assert_eq!(col, [2, 4, 6]);
        let col_rev: Vec<i32> = m.col(0).rev().copied().collect();
        assert_eq!(col_rev, [5, 3, 1]);
    }

    #[test]
    fn col_references_outlive_the_iterator() {
        let m = Matrix::from([[1, 2], [3, 4], [5, 6]]);
        let mut col = m.col(1);
        let last = col.next_back().unwrap();
        let first = col.next().unwrap();
        drop(col);
        assert_eq!((*first, *last), (2, 6));
    }

    #[test]
    fn elementwise_arithmetic() {
        let a = Matrix::from([[1, 2], [3, 4]]);
        let b = Matrix::from([[10, 20], [30, 40]]);
        assert_eq!(&a + &b, Matrix::from([[11, 22], [33, 44]]));
        assert_eq!(&b - &a, Matrix::from([[9, 18], [27, 36]]));
        assert_eq!(&a * 2, Matrix::from([[2, 4], [6, 8]]));
    }

    #[test]
    fn matrix_product_shapes() {
        let a = Matrix::from([[1, 2, 3], [4, 5, 6]]); // 2x3
        let b = Matrix::from([[7, 8], [9, 10], [11, 12]]); // 3x2
        let prod = &a * &b;
        assert_eq!(prod, Matrix::from([[58, 64], [139, 154]]));
    }

    #[test]
    fn multiplication_is_associative() {
        // Small pseudo-random integer matrices keep this exact.
        let mut seed = 0x2545_f491u32;
        let mut next = || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % 10) as i64
        };
        let a = Matrix::from_fn(3, 4, |_, _| next());
        let b = Matrix::from_fn(4, 2, |_, _| next());
        let c = Matrix::from_fn(2, 5, |_, _| next());
        assert_eq!(&(&a * &b) * &c, &a * &(&b * &c));
    }

    #[test]
    fn take_leaves_empty() {
        let mut m = Matrix::from([[1, 2], [3, 4]]);
        let taken = m.take();
        assert!(m.is_empty());
        assert_eq!(taken, Matrix::from([[1, 2], [3, 4]]));
    }

    #[test]
    fn iteration_is_row_major() {
        let m = Matrix::from([[1, 2], [3, 4]]);
        let all: Vec<i32> = m.iter().copied().collect();
        assert_eq!(all, [1, 2, 3, 4]);
    }
}

//! Fixed-size matrix helpers for the EKF
//!
//! Plain arrays with const generic dimensions, no heap allocation and no
//! general linear-algebra dependency. The battery filter has a single scalar
//! measurement, so the innovation covariance is a scalar and the only
//! "inversion" ever needed is a division.

/// Matrix type using const generics
pub type Matrix<const R: usize, const C: usize> = [[f32; C]; R];

/// Square matrix type
pub type SquareMatrix<const N: usize> = Matrix<N, N>;

/// Column vector type
pub type Vector<const N: usize> = [f32; N];

/// Identity matrix
pub fn identity<const N: usize>() -> SquareMatrix<N> {
    diagonal(&[1.0; N])
}

/// Diagonal matrix from its diagonal entries
pub fn diagonal<const N: usize>(diag: &Vector<N>) -> SquareMatrix<N> {
    let mut m = [[0.0; N]; N];
    for i in 0..N {
        m[i][i] = diag[i];
    }
    m
}

/// Matrix multiplication: C = A × B
///
/// Dimensions: A[R×K] × B[K×C] = C[R×C]
pub fn multiply<const R: usize, const K: usize, const C: usize>(
    a: &Matrix<R, K>,
    b: &Matrix<K, C>,
) -> Matrix<R, C> {
    let mut result = [[0.0; C]; R];
    for i in 0..R {
        for j in 0..C {
            for k in 0..K {
                result[i][j] += a[i][k] * b[k][j];
            }
        }
    }
    result
}

/// Matrix transpose: B = Aᵀ
pub fn transpose<const R: usize, const C: usize>(a: &Matrix<R, C>) -> Matrix<C, R> {
    let mut result = [[0.0; R]; C];
    for i in 0..R {
        for j in 0..C {
            result[j][i] = a[i][j];
        }
    }
    result
}

/// Matrix addition: C = A + B
pub fn add<const R: usize, const C: usize>(a: &Matrix<R, C>, b: &Matrix<R, C>) -> Matrix<R, C> {
    let mut result = *a;
    for i in 0..R {
        for j in 0..C {
            result[i][j] += b[i][j];
        }
    }
    result
}

/// Matrix-vector multiplication: y = A × x
pub fn matvec<const R: usize, const C: usize>(matrix: &Matrix<R, C>, vector: &Vector<C>) -> Vector<R> {
    let mut result = [0.0; R];
    for i in 0..R {
        for j in 0..C {
            result[i] += matrix[i][j] * vector[j];
        }
    }
    result
}

/// Dot product of two vectors
pub fn dot<const N: usize>(a: &Vector<N>, b: &Vector<N>) -> f32 {
    let mut sum = 0.0;
    for i in 0..N {
        sum += a[i] * b[i];
    }
    sum
}

/// Outer product: M = a × bᵀ
pub fn outer<const N: usize>(a: &Vector<N>, b: &Vector<N>) -> SquareMatrix<N> {
    let mut m = [[0.0; N]; N];
    for i in 0..N {
        for j in 0..N {
            m[i][j] = a[i] * b[j];
        }
    }
    m
}

/// Quadratic form h × P × hᵀ for a row vector h
pub fn quadratic_form<const N: usize>(h: &Vector<N>, p: &SquareMatrix<N>) -> f32 {
    dot(h, &matvec(p, h))
}

/// Make matrix symmetric: A = (A + Aᵀ) / 2
///
/// Keeps covariance matrices symmetric despite rounding.
pub fn make_symmetric<const N: usize>(matrix: &mut SquareMatrix<N>) {
    for i in 0..N {
        for j in i + 1..N {
            let avg = (matrix[i][j] + matrix[j][i]) * 0.5;
            matrix[i][j] = avg;
            matrix[j][i] = avg;
        }
    }
}

/// True if every entry is finite
pub fn is_finite<const R: usize, const C: usize>(matrix: &Matrix<R, C>) -> bool {
    matrix.iter().all(|row| row.iter().all(|v| v.is_finite()))
}

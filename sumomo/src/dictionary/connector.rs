mod builder;

use bincode::{Decode, Encode};

use crate::errors::{Result, SumomoError};

/// Matrix of connection costs between adjacent words.
///
/// The cost of connecting a word `u` to its successor `v` is
/// `cost(u.right_id, v.left_id)`, stored row-major at
/// `right_id * num_cols + left_id`.
#[derive(Default, Debug, Clone, Decode, Encode)]
pub struct ConnectionTable {
    num_rows: usize,
    num_cols: usize,
    data: Vec<i16>,
}

impl ConnectionTable {
    /// Creates a new instance.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when `data` does not have
    /// `num_rows * num_cols` elements.
    pub fn new(num_rows: usize, num_cols: usize, data: Vec<i16>) -> Result<Self> {
        let conn = Self {
            num_rows,
            num_cols,
            data,
        };
        conn.verify()?;
        Ok(conn)
    }

    /// Gets the number of rows, which bounds right ids.
    #[inline(always)]
    pub const fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Gets the number of columns, which bounds left ids.
    #[inline(always)]
    pub const fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Gets the connection cost from a predecessor's `right_id` to a
    /// successor's `left_id`.
    #[inline(always)]
    pub fn cost(&self, right_id: i16, left_id: i16) -> i32 {
        let index = self.index(right_id, left_id);
        i32::from(self.data[index])
    }

    #[inline(always)]
    fn index(&self, right_id: i16, left_id: i16) -> usize {
        debug_assert!(right_id >= 0 && (right_id as usize) < self.num_rows);
        debug_assert!(left_id >= 0 && (left_id as usize) < self.num_cols);
        right_id as usize * self.num_cols + left_id as usize
    }

    pub(crate) fn verify(&self) -> Result<()> {
        if self.num_rows == 0 || self.num_cols == 0 {
            return Err(SumomoError::invalid_format(
                "connection",
                "The matrix must have at least one row and one column.",
            ));
        }
        let expected = self.num_rows.checked_mul(self.num_cols);
        if expected != Some(self.data.len()) {
            let msg = format!(
                "The matrix must have {}x{} elements, but has {}",
                self.num_rows,
                self.num_cols,
                self.data.len()
            );
            return Err(SumomoError::invalid_format("connection", msg));
        }
        Ok(())
    }
}

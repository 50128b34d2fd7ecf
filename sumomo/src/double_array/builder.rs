use crate::double_array::{Cell, DoubleArray, ROOT, TERMINATOR};
use crate::errors::{Result, SumomoError};

const INIT_CAPACITY: usize = 1 << 10;

// A free cell failing this many times as the first target is dropped from
// the free list until the final relink.
const MAX_PROBES: u8 = 16;

impl DoubleArray {
    /// Builds a new instance from sorted keys, whose ids are their indices.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when the keys are not sorted, or when
    /// a key is empty or contains `\0`.
    pub fn build<K>(keys: &[K]) -> Result<Self>
    where
        K: AsRef<[u8]>,
    {
        let ids = (0..keys.len())
            .map(u32::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::build_with_ids(keys, &ids)
    }

    /// Builds a new instance from sorted keys and their ids.
    ///
    /// When a key is repeated, the id of the first occurrence is kept.
    ///
    /// # Errors
    ///
    /// [`SumomoError`] is returned when
    ///  - the numbers of keys and ids are different,
    ///  - the keys are not sorted,
    ///  - a key is empty or contains `\0`, or
    ///  - an id exceeds `i32::MAX`.
    pub fn build_with_ids<K>(keys: &[K], ids: &[u32]) -> Result<Self>
    where
        K: AsRef<[u8]>,
    {
        if keys.len() != ids.len() {
            return Err(SumomoError::invalid_argument(
                "ids",
                "The numbers of keys and ids must be the same.",
            ));
        }
        for (i, key) in keys.iter().enumerate() {
            let key = key.as_ref();
            if key.is_empty() || key.contains(&TERMINATOR) {
                let msg = format!("A key must be non-empty and must not contain \\0, {key:?}");
                return Err(SumomoError::invalid_argument("keys", msg));
            }
            if i != 0 && keys[i - 1].as_ref() > key {
                return Err(SumomoError::invalid_argument(
                    "keys",
                    "The keys must be sorted in ascending order.",
                ));
            }
        }
        if ids.iter().any(|&id| i32::try_from(id).is_err()) {
            return Err(SumomoError::invalid_argument(
                "ids",
                "An id must be no more than i32::MAX.",
            ));
        }
        if keys.is_empty() {
            return Ok(Self::default());
        }

        let mut builder = DoubleArrayBuilder::new(INIT_CAPACITY.max(keys.len()))?;
        builder.insert(ROOT, 0, keys, ids)?;
        builder.shrink();
        Ok(Self {
            cells: builder.cells,
        })
    }
}

struct DoubleArrayBuilder {
    cells: Vec<Cell>,
    // Number of failed probes of each free cell; `u8::MAX` marks a cell
    // dropped from the free list.
    probes: Vec<u8>,
}

#[inline(always)]
fn to_i32(x: usize) -> i32 {
    // `expand()` keeps every index within i32.
    debug_assert!(i32::try_from(x).is_ok());
    x as i32
}

#[inline(always)]
fn to_usize(x: i32) -> usize {
    debug_assert!(x >= 0);
    x as usize
}

impl DoubleArrayBuilder {
    fn new(capacity: usize) -> Result<Self> {
        let mut builder = Self {
            cells: vec![Cell { base: 1, check: 0 }],
            probes: vec![0],
        };
        while builder.cells.len() < capacity {
            builder.expand()?;
        }
        Ok(builder)
    }

    #[inline(always)]
    fn head(&self) -> usize {
        to_usize(-self.cells[ROOT].check)
    }

    #[inline(always)]
    fn set_head(&mut self, i: usize) {
        self.cells[ROOT].check = -to_i32(i);
    }

    #[inline(always)]
    fn prev(&self, i: usize) -> usize {
        to_usize(-self.cells[i].base)
    }

    #[inline(always)]
    fn next(&self, i: usize) -> usize {
        to_usize(-self.cells[i].check)
    }

    #[inline(always)]
    fn is_free(&self, i: usize) -> bool {
        i >= self.cells.len() || (i != ROOT && self.cells[i].check < 0)
    }

    /// Doubles the capacity and splices the new cells into the free list.
    fn expand(&mut self) -> Result<()> {
        let old_len = self.cells.len();
        let new_len = old_len * 2;
        if i32::try_from(new_len).is_err() {
            return Err(SumomoError::invalid_argument(
                "keys",
                "The double array exceeds the maximum number of cells.",
            ));
        }
        self.cells.reserve(new_len - old_len);
        for i in old_len..new_len {
            self.cells.push(Cell {
                base: -to_i32(i - 1),
                check: -to_i32(i + 1),
            });
        }
        self.probes.resize(new_len, 0);

        let head = self.head();
        if head == 0 {
            self.cells[old_len].base = -to_i32(new_len - 1);
            self.cells[new_len - 1].check = -to_i32(old_len);
            self.set_head(old_len);
        } else {
            let tail = self.prev(head);
            self.cells[tail].check = -to_i32(old_len);
            self.cells[old_len].base = -to_i32(tail);
            self.cells[new_len - 1].check = -to_i32(head);
            self.cells[head].base = -to_i32(new_len - 1);
        }
        Ok(())
    }

    /// Removes a free cell from the free list.
    fn unlink(&mut self, i: usize) {
        debug_assert!(self.is_free(i));
        if self.probes[i] == u8::MAX {
            return;
        }
        let prev = self.prev(i);
        let next = self.next(i);
        if next == i {
            self.set_head(0);
        } else {
            self.cells[prev].check = -to_i32(next);
            self.cells[next].base = -to_i32(prev);
            if self.head() == i {
                self.set_head(next);
            }
        }
        self.probes[i] = u8::MAX;
    }

    /// Finds a base such that all the labels land on free cells, and
    /// places the transitions of `p` there.
    fn seek_and_mark(&mut self, p: usize, labels: &[u8]) -> Result<usize> {
        debug_assert!(!labels.is_empty());
        let first = usize::from(labels[0]);
        loop {
            let head = self.head();
            if head != 0 {
                let mut f = head;
                let mut exhausted = vec![];
                let found = loop {
                    if f > first {
                        let base = f - first;
                        if labels[1..]
                            .iter()
                            .all(|&c| self.is_free(base + usize::from(c)))
                        {
                            break Some(base);
                        }
                    }
                    self.probes[f] += 1;
                    if self.probes[f] >= MAX_PROBES {
                        exhausted.push(f);
                    }
                    f = self.next(f);
                    if f == head {
                        break None;
                    }
                };
                // Unlinking during the scan would break the ring walk.
                for i in exhausted {
                    self.unlink(i);
                }
                if let Some(base) = found {
                    return self.mark(p, base, labels);
                }
            }
            self.expand()?;
        }
    }

    fn mark(&mut self, p: usize, base: usize, labels: &[u8]) -> Result<usize> {
        let last = base + usize::from(labels[labels.len() - 1]);
        while self.cells.len() <= last {
            self.expand()?;
        }
        self.cells[p].base = to_i32(base);
        for &c in labels {
            let q = base + usize::from(c);
            self.unlink(q);
            self.cells[q] = Cell {
                base: 0,
                check: to_i32(p),
            };
        }
        Ok(base)
    }

    fn insert<K>(&mut self, p: usize, depth: usize, keys: &[K], ids: &[u32]) -> Result<()>
    where
        K: AsRef<[u8]>,
    {
        let label_at = |key: &K| key.as_ref().get(depth).copied().unwrap_or(TERMINATOR);

        let mut labels = vec![];
        let mut ranges = vec![];
        let mut i = 0;
        while i < keys.len() {
            let label = label_at(&keys[i]);
            let start = i;
            while i < keys.len() && label_at(&keys[i]) == label {
                i += 1;
            }
            labels.push(label);
            ranges.push(start..i);
        }

        let base = self.seek_and_mark(p, &labels)?;
        for (label, range) in labels.into_iter().zip(ranges) {
            let q = base + usize::from(label);
            if label == TERMINATOR {
                self.cells[q].base = -i32::try_from(ids[range.start])?;
            } else {
                self.insert(q, depth + 1, &keys[range.clone()], &ids[range])?;
            }
        }
        Ok(())
    }

    /// Trims trailing free cells and relinks the remaining ones.
    fn shrink(&mut self) {
        let last = self
            .cells
            .iter()
            .rposition(|c| c.check >= 0)
            .unwrap_or(ROOT);
        self.cells.truncate(last + 1);
        self.probes.clear();

        let free: Vec<usize> = (1..self.cells.len())
            .filter(|&i| self.cells[i].check < 0)
            .collect();
        let n = free.len();
        for (k, &i) in free.iter().enumerate() {
            let prev = free[(k + n - 1) % n];
            let next = free[(k + 1) % n];
            self.cells[i] = Cell {
                base: -to_i32(prev),
                check: -to_i32(next),
            };
        }
        self.set_head(free.first().copied().unwrap_or(0));
    }
}

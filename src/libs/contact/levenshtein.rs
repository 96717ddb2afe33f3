/// Edit distance with two rolling rows that are kept between calls.
///
/// A worker evaluating many pairs creates one engine and reuses it, so the rows
/// are allocated once per worker task instead of once per pair.
///
/// ```
/// use gcmap::libs::contact::Levenshtein;
/// let mut engine = Levenshtein::new();
/// assert_eq!(engine.distance(b"kitten", b"sitting"), 3);
/// assert_eq!(engine.distance(b"AAAA", b"AAAT"), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct Levenshtein {
    prev: Vec<u32>,
    curr: Vec<u32>,
}

impl Levenshtein {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance(&mut self, a: &[u8], b: &[u8]) -> u32 {
        // Rows span the shorter operand
        let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        if short.is_empty() {
            return long.len() as u32;
        }

        let width = short.len();
        self.prev.clear();
        self.prev.extend(0..=width as u32);
        self.curr.clear();
        self.curr.resize(width + 1, 0);

        for (row, &lc) in long.iter().enumerate() {
            self.curr[0] = row as u32 + 1;
            for (col, &sc) in short.iter().enumerate() {
                let cost = if sc == lc { 0 } else { 1 };
                self.curr[col + 1] = (self.prev[col + 1] + 1)
                    .min(self.curr[col] + 1)
                    .min(self.prev[col] + cost);
            }
            std::mem::swap(&mut self.prev, &mut self.curr);
        }

        self.prev[width]
    }
}

/// Minimum number of single-symbol insertions, deletions or substitutions
/// turning `a` into `b`.
///
/// ```
/// assert_eq!(gcmap::libs::contact::levenshtein(b"", b"ACGT"), 4);
/// assert_eq!(gcmap::libs::contact::levenshtein(b"ACGT", b"ACGT"), 0);
/// ```
pub fn levenshtein(a: &[u8], b: &[u8]) -> u32 {
    Levenshtein::new().distance(a, b)
}

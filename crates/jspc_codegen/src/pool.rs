use fxhash::FxHashMap;
use smallvec::SmallVec;

/// Literals longer than this are split before pooling
pub const STRING_SPLIT_THRESHOLD: usize = 32_000;

/// Length of the leading chunk of a split literal
pub const STRING_CHUNK_LEN: usize = 16_384;

/// Text literals of one compilation, emitted as `char[]` constants and referenced by index
#[derive(Debug, Default)]
pub struct StringPool {
    entries: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl StringPool {
    /// Pools a literal and returns the indices of its chunks, in order.
    /// Equal chunks share one entry.
    pub fn add(&mut self, text: &str) -> SmallVec<[usize; 1]> {
        split_literal(text)
            .into_iter()
            .map(|chunk| self.add_chunk(chunk))
            .collect()
    }

    fn add_chunk(&mut self, chunk: &str) -> usize {
        if let Some(&idx) = self.index.get(chunk) {
            return idx;
        }

        let idx = self.entries.len();
        self.entries.push(chunk.to_owned());
        self.index.insert(chunk.to_owned(), idx);
        idx
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

/// Splits a literal so that no chunk exceeds [`STRING_SPLIT_THRESHOLD`] UTF-16 code units,
/// the unit a Java string literal is measured in.
/// The first chunk of a split literal is [`STRING_CHUNK_LEN`] units long, the rest is split again.
/// A surrogate pair is never cut, such a chunk ends one unit short.
pub fn split_literal(text: &str) -> SmallVec<[&str; 1]> {
    let mut chunks = SmallVec::new();
    let mut rest = text;
    let mut remaining = rest.encode_utf16().count();

    while remaining > STRING_SPLIT_THRESHOLD {
        let mut units = 0;
        let mut split_idx = rest.len();
        for (idx, ch) in rest.char_indices() {
            if units + ch.len_utf16() > STRING_CHUNK_LEN {
                split_idx = idx;
                break;
            }
            units += ch.len_utf16();
        }

        let (chunk, tail) = rest.split_at(split_idx);
        chunks.push(chunk);
        rest = tail;
        remaining -= units;
    }

    chunks.push(rest);
    chunks
}

/// Runtime expressions of one compilation, parsed once into `_jsp_expr_N` fields
#[derive(Debug, Default)]
pub struct ExprPool {
    entries: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl ExprPool {
    /// Registers an expression and returns its stable index.
    /// Registering the same text again returns the same index.
    pub fn add(&mut self, expr: &str) -> usize {
        if let Some(&idx) = self.index.get(expr) {
            return idx;
        }

        let idx = self.entries.len();
        self.entries.push(expr.to_owned());
        self.index.insert(expr.to_owned(), idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}

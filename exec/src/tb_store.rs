use std::collections::HashMap;

use sh4jit_core::tb::{TbState, TranslationBlock, TARGET_PAGE_BITS, TB_HASH_SIZE};

use crate::ExecError;

/// Storage and hash-table lookup for translation blocks.
///
/// Blocks are addressed by index. Indices stay valid until the next
/// [`flush`](Self::flush); a stale block keeps its slot so that links
/// held by the execution loop can be checked instead of dereferenced
/// blindly.
pub struct TbStore {
    tbs: Vec<TranslationBlock>,
    hash: Vec<Option<usize>>,
    /// Guest page number -> blocks with code on that page.
    pages: HashMap<u32, Vec<usize>>,
    next_seq: u64,
    max_tbs: usize,
}

impl TbStore {
    pub fn new(max_tbs: usize) -> Self {
        Self {
            tbs: Vec::new(),
            hash: vec![None; TB_HASH_SIZE],
            pages: HashMap::new(),
            next_seq: 0,
            max_tbs,
        }
    }

    /// Allocate a new block in the `Compiling` state.
    pub fn alloc(&mut self, pc: u32, flags: u32) -> Result<usize, ExecError> {
        if self.tbs.len() >= self.max_tbs {
            return Err(ExecError::StoreFull);
        }
        let idx = self.tbs.len();
        self.tbs.push(TranslationBlock::new(pc, flags, self.next_seq));
        self.next_seq += 1;
        Ok(idx)
    }

    pub fn get(&self, idx: usize) -> &TranslationBlock {
        &self.tbs[idx]
    }

    pub fn get_mut(&mut self, idx: usize) -> &mut TranslationBlock {
        &mut self.tbs[idx]
    }

    /// Whether `idx` names a resident block for `(pc, flags)`.
    pub fn is_valid_target(&self, idx: usize, pc: u32, flags: u32) -> bool {
        self.tbs
            .get(idx)
            .is_some_and(|tb| tb.is_resident() && tb.pc == pc && tb.flags == flags)
    }

    /// Lookup a resident block by (pc, flags) in the hash table.
    pub fn lookup(&self, pc: u32, flags: u32) -> Option<usize> {
        let mut cur = self.hash[TranslationBlock::hash(pc, flags)];
        while let Some(idx) = cur {
            let tb = &self.tbs[idx];
            if tb.is_resident() && tb.pc == pc && tb.flags == flags {
                return Some(idx);
            }
            cur = tb.hash_next;
        }
        None
    }

    /// Publish a compiled block: hash chain and page index.
    pub fn insert(&mut self, idx: usize) {
        let (pc, flags, size) = {
            let tb = &self.tbs[idx];
            (tb.pc, tb.flags, tb.size)
        };
        let bucket = TranslationBlock::hash(pc, flags);
        self.tbs[idx].hash_next = self.hash[bucket];
        self.hash[bucket] = Some(idx);

        for page in page_span(pc, size) {
            self.pages.entry(page).or_default().push(idx);
        }
    }

    /// Resident blocks whose guest range intersects `[start, end)`.
    pub fn find_overlapping(&self, start: u32, end: u32) -> Vec<usize> {
        if end <= start {
            return Vec::new();
        }
        let mut out: Vec<usize> = page_span(start, end - start)
            .filter_map(|p| self.pages.get(&p))
            .flatten()
            .copied()
            .filter(|&i| {
                let tb = &self.tbs[i];
                tb.is_resident() && tb.overlaps(start, end)
            })
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Mark a block stale, unlink all chained jumps, and remove it from
    /// the hash chain and page index.
    pub fn invalidate(&mut self, idx: usize) {
        if self.tbs[idx].state == TbState::Stale {
            return;
        }
        self.tbs[idx].state = TbState::Stale;

        // 1. Unlink incoming edges.
        let incoming = std::mem::take(&mut self.tbs[idx].jmp_list);
        for (src, slot) in incoming {
            if self.tbs[src].jmp_dest[slot] == Some(idx) {
                self.tbs[src].jmp_dest[slot] = None;
            }
        }

        // 2. Unlink outgoing edges.
        for slot in 0..2 {
            if let Some(dst) = self.tbs[idx].jmp_dest[slot].take() {
                self.tbs[dst].jmp_list.retain(|&(s, n)| !(s == idx && n == slot));
            }
        }
        self.tbs[idx].exit_target = None;

        // 3. Remove from hash chain.
        let (pc, flags, size) = {
            let tb = &self.tbs[idx];
            (tb.pc, tb.flags, tb.size)
        };
        let bucket = TranslationBlock::hash(pc, flags);
        let mut prev: Option<usize> = None;
        let mut cur = self.hash[bucket];
        while let Some(i) = cur {
            let next = self.tbs[i].hash_next;
            if i == idx {
                match prev {
                    Some(p) => self.tbs[p].hash_next = next,
                    None => self.hash[bucket] = next,
                }
                self.tbs[i].hash_next = None;
                break;
            }
            prev = cur;
            cur = next;
        }

        // 4. Drop from the page index.
        for page in page_span(pc, size) {
            if let Some(list) = self.pages.get_mut(&page) {
                list.retain(|&i| i != idx);
                if list.is_empty() {
                    self.pages.remove(&page);
                }
            }
        }
    }

    /// Mark a block that failed to compile as stale. It was never
    /// published, so there is nothing to unlink.
    pub fn abandon(&mut self, idx: usize) {
        self.tbs[idx].state = TbState::Stale;
    }

    /// Record a chain from `src` exit `slot` to `dst`.
    pub fn add_jump(&mut self, src: usize, slot: usize, dst: usize) {
        if self.tbs[src].jmp_dest[slot] == Some(dst) {
            return;
        }
        if let Some(old) = self.tbs[src].jmp_dest[slot].take() {
            self.tbs[old].jmp_list.retain(|&(s, n)| !(s == src && n == slot));
        }
        self.tbs[src].jmp_dest[slot] = Some(dst);
        self.tbs[dst].jmp_list.push((src, slot));
    }

    /// Mark every block stale without freeing anything.
    pub fn invalidate_all(&mut self) {
        for tb in &mut self.tbs {
            tb.state = TbState::Stale;
            tb.jmp_dest = [None; 2];
            tb.jmp_list.clear();
            tb.exit_target = None;
            tb.hash_next = None;
        }
        self.hash.fill(None);
        self.pages.clear();
    }

    /// Drop all blocks. Sequence numbers keep counting.
    pub fn flush(&mut self) {
        self.tbs.clear();
        self.hash.fill(None);
        self.pages.clear();
    }

    pub fn len(&self) -> usize {
        self.tbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tbs.is_empty()
    }

    pub fn resident_count(&self) -> usize {
        self.tbs.iter().filter(|tb| tb.is_resident()).count()
    }

    /// Next sequence number to be handed out.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

/// Guest page numbers covered by `[start, start + len)`.
fn page_span(start: u32, len: u32) -> impl Iterator<Item = u32> {
    let first = start >> TARGET_PAGE_BITS;
    let last = (start as u64 + len.max(1) as u64 - 1) >> TARGET_PAGE_BITS;
    (first as u64..=last).map(|p| p as u32)
}

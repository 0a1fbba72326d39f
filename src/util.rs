/// Occupancy of level-1 slots during construction.
///
/// One bit per slot; a bucket's trial slots are checked against it and only
/// written back once the whole bucket fits.
#[derive(Debug)]
pub struct SlotSet {
    bits: Vec<u64>,
    len: usize,
    taken: usize,
}

impl SlotSet {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0; len.div_ceil(64)],
            len,
            taken: 0,
        }
    }

    #[inline]
    pub fn is_taken(&self, slot: usize) -> bool {
        debug_assert!(slot < self.len);
        let (w, b) = (slot / 64, slot % 64);
        (self.bits[w] >> b) & 1 == 1
    }

    /// Marks every slot in `slots` as taken. Callers guarantee the slots were free.
    #[inline]
    pub fn commit(&mut self, slots: impl IntoIterator<Item = usize>) {
        for slot in slots {
            debug_assert!(!self.is_taken(slot));
            let (w, b) = (slot / 64, slot % 64);
            self.bits[w] |= 1u64 << b;
            self.taken += 1;
        }
    }

    pub fn taken(&self) -> usize {
        self.taken
    }

    pub fn free(&self) -> usize {
        self.len - self.taken
    }
}

/// Smallest power of two `>= n`, and at least 1.
#[inline]
pub fn next_pow2(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

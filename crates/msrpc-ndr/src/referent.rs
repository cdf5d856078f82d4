//! Referent IDs
//!
//! NDR represents an embedded `[unique]` pointer as a 4-byte referent ID at
//! the point of reference; the pointee follows later in the stream. Zero
//! means null. Any other value only means "present": this client never
//! aliases pointers, so every present pointer gets a fresh ID.

/// Referent ID of a null pointer
pub const NULL_REFERENT: u32 = 0;

/// First referent ID handed out in a marshalling pass
pub const FIRST_REFERENT: u32 = 0x0002_0000;

const REFERENT_STEP: u32 = 4;

/// Hands out referent IDs for one marshalling pass
#[derive(Debug, Clone)]
pub struct ReferentRegistry {
    next: u32,
}

impl ReferentRegistry {
    pub fn new() -> Self {
        Self {
            next: FIRST_REFERENT,
        }
    }

    /// Referent ID for a pointer that is present or null
    pub fn referent_for(&mut self, present: bool) -> u32 {
        if !present {
            return NULL_REFERENT;
        }
        let id = self.next;
        self.next = self.next.wrapping_add(REFERENT_STEP);
        if self.next == NULL_REFERENT {
            self.next = FIRST_REFERENT;
        }
        id
    }
}

impl Default for ReferentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

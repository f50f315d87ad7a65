//! Mutable decoding context: compatibility mode flags and the
//! repeat-prefix address set.
//!
//! A single architecture instance may be queried from several analysis
//! threads at once, so every piece of mutable state sits behind one
//! mutex. A decode that installs a repeat marker at address A must be
//! observed by any later decode of A, and a mode-change instruction must
//! not leave another thread reading a torn mode value.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// OBJMODE: which half of the dual opcode map is live. The part resets
/// into C27x object compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectMode {
    #[default]
    C27,
    C28,
}

/// AMODE: selects how the `loc16`/`loc32` addressing byte renders. Does
/// not gate which encodings are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressMode {
    #[default]
    Amode0,
    Amode1,
}

bitflags! {
    /// ST0 bits addressed by the SETC/CLRC mask operand.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Status: u8 {
        const SXM   = 1 << 0;
        const OVM   = 1 << 1;
        const TC    = 1 << 2;
        const C     = 1 << 3;
        const INTM  = 1 << 4;
        const DBGM  = 1 << 5;
        const PAGE0 = 1 << 6;
        const VMAP  = 1 << 7;
    }
}

#[derive(Debug, Default)]
struct Inner {
    object: ObjectMode,
    address: AddressMode,
    repeat: HashSet<u64>,
}

#[derive(Debug, Default)]
pub struct DecodeState {
    inner: Mutex<Inner>,
}

impl DecodeState {
    pub fn new(object: ObjectMode, address: AddressMode) -> Self {
        Self {
            inner: Mutex::new(Inner {
                object,
                address,
                repeat: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave Inner in a bad
        // state; keep decoding with whatever was last written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn object_mode(&self) -> ObjectMode {
        self.lock().object
    }

    pub fn set_object_mode(&self, mode: ObjectMode) {
        self.lock().object = mode;
    }

    pub fn address_mode(&self) -> AddressMode {
        self.lock().address
    }

    pub fn set_address_mode(&self, mode: AddressMode) {
        self.lock().address = mode;
    }

    /// Flag `addr` as the target of an RPT prefix. Idempotent; entries
    /// are never removed for the lifetime of the context.
    pub fn mark_repeat(&self, addr: u64) {
        self.lock().repeat.insert(addr);
    }

    pub fn is_repeat(&self, addr: u64) -> bool {
        self.lock().repeat.contains(&addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_defaults_are_c27_amode0() {
        let st = DecodeState::default();
        assert_eq!(st.object_mode(), ObjectMode::C27);
        assert_eq!(st.address_mode(), AddressMode::Amode0);
    }

    #[test]
    fn repeat_marking_is_idempotent() {
        let st = DecodeState::default();
        assert!(!st.is_repeat(0x100));
        st.mark_repeat(0x100);
        st.mark_repeat(0x100);
        assert!(st.is_repeat(0x100));
        assert!(!st.is_repeat(0x102));
    }

    #[test]
    fn repeat_markers_visible_across_threads() {
        use std::sync::Arc;

        let st = Arc::new(DecodeState::default());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let st = Arc::clone(&st);
                std::thread::spawn(move || st.mark_repeat(0x1000 + i * 2))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..4 {
            assert!(st.is_repeat(0x1000 + i * 2));
        }
    }

    #[test]
    fn mode_writes_overwrite_unconditionally() {
        let st = DecodeState::new(ObjectMode::C28, AddressMode::Amode1);
        st.set_object_mode(ObjectMode::C27);
        st.set_object_mode(ObjectMode::C27);
        st.set_address_mode(AddressMode::Amode0);
        assert_eq!(st.object_mode(), ObjectMode::C27);
        assert_eq!(st.address_mode(), AddressMode::Amode0);
    }
}

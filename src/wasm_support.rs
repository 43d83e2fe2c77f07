// SPDX-License-Identifier: MIT OR Apache-2.0
//! Detects whether the current wasm32 context may block.
//!
//! Browser main threads forbid `Atomics.wait`, which is what thread parking
//! compiles down to. The `_sync` strategies ask here before parking and spin
//! instead when blocking is unavailable.

use std::cell::Cell;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(inline_js = "
export function _rdm_canAtomicsWait() {
    if (typeof SharedArrayBuffer === 'undefined') return false;
    if (typeof Atomics === 'undefined' || typeof Atomics.wait !== 'function') return false;

    try {
        const probe = new Int32Array(new SharedArrayBuffer(4));
        const result = Atomics.wait(probe, 0, 0, 0);
        return result === 'timed-out' || result === 'not-equal';
    } catch (_) {
        return false;
    }
}
")]
extern "C" {
    fn _rdm_canAtomicsWait() -> bool;
}

thread_local! {
    // Cached per thread: a worker may block where the main thread may not.
    static ATOMICS_WAIT: Cell<Option<bool>> = const { Cell::new(None) };
}

/// Returns whether `Atomics.wait` may be called on this thread.
pub(crate) fn atomics_wait_supported() -> bool {
    ATOMICS_WAIT.with(|cached| match cached.get() {
        Some(supported) => supported,
        None => {
            let supported = _rdm_canAtomicsWait();
            cached.set(Some(supported));
            supported
        }
    })
}

//! `critical-section` provider for ESP-IDF builds.
//!
//! `embassy-sync` guards every queue and wake slot with a critical
//! section.  Host builds get one from the `std` feature of the
//! `critical-section` crate; on ESP-IDF the two link symbols below supply
//! it.  A single process-wide mutex is taken on the outermost acquire of
//! each thread and released when that thread's nesting drops back to zero.

#[cfg(target_os = "espidf")]
use std::cell::RefCell;
#[cfg(target_os = "espidf")]
use std::sync::{Mutex, MutexGuard, PoisonError};

#[cfg(target_os = "espidf")]
static SECTION: Mutex<()> = Mutex::new(());

/// Per-thread nesting state.
#[cfg(target_os = "espidf")]
#[derive(Default)]
struct Nesting {
    depth: u8,
    held: Option<MutexGuard<'static, ()>>,
}

#[cfg(target_os = "espidf")]
thread_local! {
    static NESTING: RefCell<Nesting> = RefCell::new(Nesting::default());
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_acquire() -> u8 {
    NESTING.with(|cell| {
        let mut nesting = cell.borrow_mut();
        if nesting.depth == 0 {
            // Nothing lives behind the mutex, so a poisoned one is still usable.
            nesting.held = Some(SECTION.lock().unwrap_or_else(PoisonError::into_inner));
        }
        nesting.depth = nesting.depth.saturating_add(1);
        nesting.depth
    })
}

#[cfg(target_os = "espidf")]
#[unsafe(no_mangle)]
pub extern "C" fn _critical_section_1_0_release(_token: u8) {
    NESTING.with(|cell| {
        let mut nesting = cell.borrow_mut();
        match nesting.depth {
            0 => {}
            1 => {
                nesting.depth = 0;
                nesting.held = None;
            }
            _ => nesting.depth -= 1,
        }
    });
}

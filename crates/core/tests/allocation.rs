//! Heap usage of the scan loop, measured with a counting allocator.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use x16r_core::{DigestSuite, HeaderTemplate, Scanner, Solution, Target, derive_order};

struct Counting;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|count| count.set(count.get() + 1));
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

fn allocations() -> usize {
    ALLOCATIONS.with(Cell::get)
}

/// Previous hash `00 01 .. 1f`; its order starts with the interleaved SHA-512
fn interleaved_first_header() -> HeaderTemplate {
    let mut bytes = [0u8; 80];
    for (i, byte) in bytes[4..36].iter_mut().enumerate() {
        *byte = i as u8;
    }
    HeaderTemplate::new(bytes)
}

#[test]
fn test_repeated_scans_do_not_allocate() {
    let header = interleaved_first_header();
    assert_eq!(derive_order(&header).to_string(), "F434695CAE72162C");

    let mut scanner = Scanner::new(Arc::new(DigestSuite), 8).unwrap();
    let unreachable = Target::from_words([0; 8]);
    let cancel = AtomicBool::new(false);
    let sink = Mutex::new(Vec::<Solution>::with_capacity(16));

    // first call derives and caches the order
    scanner.scan(&header, 0..=63, &unreachable, &cancel, &sink);

    let before = allocations();
    let mut attempted = 0;
    for chunk in 1..=10u32 {
        let base = chunk * 64;
        attempted += scanner
            .scan(&header, base..=base + 63, &unreachable, &cancel, &sink)
            .attempted;
    }
    let after = allocations();

    assert_eq!(attempted, 640);
    assert_eq!(after - before, 0, "allocations across 10 scan calls");
    assert_eq!(scanner.order_cache().derivations(), 1);
}

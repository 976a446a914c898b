use sh4jit_core::tb::TARGET_PAGE_SIZE;
use sh4jit_core::{GuestEnv, MemOp};
use sh4jit_exec::{cpu_exec_loop, ExitReason, GuestCpu, Invalidation};
use sh4jit_frontend::sh4::helper::Sh4Helper;
use sh4jit_guest::regs::{CCR_ADDR, MMUCR_ADDR, PTEH_ADDR, PTEL_ADDR, QACR0_ADDR, QACR1_ADDR};
use sh4jit_guest::{Ccr, MachineConfig, Mmucr, Sh4Machine};

use crate::util::{exec_env, image, machine, BASE};

const SLEEP: u16 = 0x001b;

fn run_once(m: &mut Sh4Machine) {
    let mut env = exec_env();
    assert_eq!(cpu_exec_loop(&mut env, m).unwrap(), ExitReason::Sleep);
}

#[test]
fn reset_queues_full_invalidation() {
    let m = Sh4Machine::new(&MachineConfig::default());
    assert_eq!(m.pending_invalidations(), &[Invalidation::All]);
    assert_eq!(m.cpu.pc, 0x8c01_0000);
    assert!(m.cpu.md());
}

#[test]
fn config_overrides_sr() {
    let m = Sh4Machine::new(&MachineConfig {
        sr: Some(0),
        entry_pc: 0x8c02_0000,
        ..MachineConfig::default()
    });
    assert!(!m.cpu.md());
    assert_eq!(m.flags(), 0);
    assert_eq!(m.pc(), 0x8c02_0000);
}

#[test]
fn loads_are_extended() {
    let mut m = machine(&[0x80ff]);
    assert_eq!(m.load(BASE, MemOp::ub()), 0xff);
    assert_eq!(m.load(BASE, MemOp::sb()), 0xffff_ffff);
    assert_eq!(m.load(BASE, MemOp::sw()), 0xffff_80ff);
    assert_eq!(m.read(BASE, MemOp::sw()), 0x80ff);
}

#[test]
fn control_registers() {
    let mut m = machine(&[]);
    m.write(MMUCR_ADDR, 0x0000_0101, MemOp::ul());
    assert_eq!(m.read(MMUCR_ADDR, MemOp::ul()), 0x101);
    assert_eq!(m.ccn.mmucr, Mmucr::AT | Mmucr::SV);

    m.write(QACR0_ADDR, 0xffff_ffff, MemOp::ul());
    m.write(QACR1_ADDR, 0x0000_0008, MemOp::ul());
    assert_eq!(m.read(QACR0_ADDR, MemOp::ul()), 0xffff_ffff);
    assert_eq!(m.read(QACR1_ADDR, MemOp::ul()), 0x08);

    m.write(PTEH_ADDR, 0xe000_0000, MemOp::ul());
    m.write(PTEL_ADDR, 0x0c00_0000, MemOp::ul());
    assert_eq!(m.read(PTEH_ADDR, MemOp::ul()), 0xe000_0000);
    assert_eq!(m.read(PTEL_ADDR, MemOp::ul()), 0x0c00_0000);

    // Unknown P4 registers read as zero.
    m.write(0xff80_0000, 0x1234, MemOp::ul());
    assert_eq!(m.read(0xff80_0000, MemOp::ul()), 0);
}

#[test]
fn ccr_write_through_the_bus() {
    let mut m = machine(&[]);
    m.write(CCR_ADDR, (Ccr::ICE | Ccr::ICI).bits(), MemOp::ul());
    assert_eq!(m.read(CCR_ADDR, MemOp::ul()), Ccr::ICE.bits());
    assert_eq!(m.take_invalidations(), vec![Invalidation::All]);

    m.write(CCR_ADDR, Ccr::ICE.bits(), MemOp::ul());
    assert!(m.take_invalidations().is_empty());
}

#[test]
fn cache_ram_needs_ora() {
    let mut m = machine(&[]);
    m.write(0x7c00_0000, 0xabcd, MemOp::ul());
    assert_eq!(m.read(0x7c00_0000, MemOp::ul()), 0);

    m.write(CCR_ADDR, Ccr::ORA.bits(), MemOp::ul());
    m.write(0x7c00_0000, 0xabcd, MemOp::ul());
    assert_eq!(m.read(0x7c00_0000, MemOp::ul()), 0xabcd);
    assert_eq!(m.read(0x7c00_0001, MemOp::ub()), 0xab);
}

#[test]
fn cache_arrays_read_zero() {
    let mut m = machine(&[]);
    m.write(0xf000_0000, 0xffff_ffff, MemOp::ul());
    m.write(0xf400_0000, 0xffff_ffff, MemOp::ul());
    assert_eq!(m.read(0xf000_0000, MemOp::ul()), 0);
    assert_eq!(m.read(0xf400_0000, MemOp::ul()), 0);
}

#[test]
fn store_queue_flush_via_pref() {
    let mut m = machine(&[]);
    m.write(QACR0_ADDR, 0x0c, MemOp::ul());
    for i in 0..8 {
        m.write(0xe000_0200 + 4 * i, 0xcafe_0000 + i, MemOp::ul());
    }
    assert_eq!(m.read(0xe000_0204, MemOp::ul()), 0xcafe_0001);

    m.call_helper(Sh4Helper::Pref as u32, [0xe000_0200, 0, 0]);
    for i in 0..8 {
        assert_eq!(m.read(0x8c00_0200 + 4 * i, MemOp::ul()), 0xcafe_0000 + i);
    }
}

#[test]
fn pref_outside_store_queues_is_a_hint() {
    let mut m = machine(&[]);
    m.call_helper(Sh4Helper::Pref as u32, [0x8c00_0000, 0, 0]);
    m.call_helper(Sh4Helper::Ocbi as u32, [0x8c00_0000, 0, 0]);
    assert_eq!(m.read(0x8c00_0000, MemOp::ul()), 0);
    assert!(m.take_invalidations().is_empty());
}

#[test]
fn ldtlb_helper_remaps_store_queues() {
    let mut m = machine(&[]);
    m.write(PTEH_ADDR, 0xe000_0000, MemOp::ul());
    m.write(PTEL_ADDR, 0x0c10_0000, MemOp::ul());
    m.call_helper(Sh4Helper::Ldtlb as u32, [0; 3]);
    m.write(MMUCR_ADDR, Mmucr::AT.bits(), MemOp::ul());
    assert_eq!(m.ccn.sq_dest(0xe000_0020), 0x0c10_0020);
}

#[test]
fn unknown_helper_returns_zero() {
    let mut m = machine(&[]);
    assert_eq!(m.call_helper(0xdead, [1, 2, 3]), 0);
}

#[test]
fn code_page_writes_are_queued() {
    let mut m = machine(&[0xe001, SLEEP]);
    run_once(&mut m);

    // Data page: nothing.
    m.write(0x8c00_0000, 1, MemOp::ul());
    assert!(m.pending_invalidations().is_empty());

    m.write(BASE + 2, 0x0009, MemOp::uw());
    assert_eq!(
        m.take_invalidations(),
        vec![Invalidation::Range {
            start: BASE,
            end: BASE + TARGET_PAGE_SIZE
        }]
    );

    // Already reported until the page is translated again.
    m.write(BASE + 2, 0x0009, MemOp::uw());
    assert!(m.take_invalidations().is_empty());
}

#[test]
fn uncached_alias_write_hits_cached_code() {
    let mut m = machine(&[0xe001, SLEEP]);
    run_once(&mut m);
    m.write(BASE + 0x2000_0000, 0xe002, MemOp::uw());
    assert_eq!(
        m.take_invalidations(),
        vec![Invalidation::Range {
            start: BASE,
            end: BASE + TARGET_PAGE_SIZE
        }]
    );
}

#[test]
fn icache_invalidate_forgets_code_pages() {
    let mut m = machine(&[0xe001, SLEEP]);
    run_once(&mut m);
    m.write(CCR_ADDR, Ccr::ICI.bits(), MemOp::ul());
    m.write(BASE, 0xe002, MemOp::uw());
    assert_eq!(m.take_invalidations(), vec![Invalidation::All]);
}

#[test]
fn reloading_code_is_queued() {
    let mut m = machine(&[0xe001, SLEEP]);
    run_once(&mut m);
    assert!(m.load_image(BASE, &image(&[0xe002, SLEEP])));
    assert_eq!(
        m.take_invalidations(),
        vec![Invalidation::Range {
            start: BASE,
            end: BASE + TARGET_PAGE_SIZE
        }]
    );
    assert!(!m.load_image(0x8d00_0000, &image(&[SLEEP])));
}

#[test]
fn reloading_through_another_area_hits_translated_pages() {
    let mut m = machine(&[0xe001, SLEEP]);
    run_once(&mut m);
    // P0 view of the same RAM.
    assert!(m.load_image(BASE & 0x1fff_ffff, &image(&[0xe002, SLEEP])));
    assert_eq!(
        m.take_invalidations(),
        vec![Invalidation::Range {
            start: BASE,
            end: BASE + TARGET_PAGE_SIZE
        }]
    );
}

#[test]
fn image_ending_on_an_unaligned_page_is_covered() {
    // Code in the second page only.
    let mut m = machine(&[]);
    assert!(m.load_image(BASE + 0x1000, &image(&[0xe001, SLEEP])));
    m.cpu.pc = BASE + 0x1000;
    m.take_invalidations();
    run_once(&mut m);

    // Starts 16 bytes before that page and ends inside it.
    assert!(m.load_image(BASE + 0xff0, &image(&[0x0009; 16])));
    assert_eq!(
        m.take_invalidations(),
        vec![Invalidation::Range {
            start: BASE + 0x1000,
            end: BASE + 0x1000 + TARGET_PAGE_SIZE
        }]
    );
}

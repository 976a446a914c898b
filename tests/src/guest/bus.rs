use sh4jit_core::MemOp;
use sh4jit_guest::Bus;

const RAM: u32 = 0x0c00_0000;

fn bus() -> Bus {
    Bus::new(RAM, 0x10_0000)
}

#[test]
fn segments_alias_physical_ram() {
    let mut b = bus();
    assert!(b.load(0x8c00_0010, &[0x78, 0x56, 0x34, 0x12]));
    assert_eq!(b.read(0x0c00_0010, MemOp::ul()), 0x1234_5678);
    assert_eq!(b.read(0xac00_0010, MemOp::uw()), 0x5678);
    assert_eq!(b.read(0x8c00_0013, MemOp::ub()), 0x12);
    assert!(b.is_ram(0xac0f_ffff));
    assert!(!b.is_ram(0x8c10_0000));
}

#[test]
fn out_of_range_access() {
    let mut b = bus();
    assert!(!b.load(0x8c0f_fffe, &[0; 4]));
    assert_eq!(b.read(0x0800_0000, MemOp::ul()), 0);
    assert_eq!(b.write(0x0800_0000, 1, MemOp::ul()), None);
    // A word straddling the end of RAM is unmapped.
    assert_eq!(b.read(0x0c0f_fffe, MemOp::ul()), 0);
}

#[test]
fn writes_to_plain_data_report_nothing() {
    let mut b = bus();
    assert_eq!(b.write(0x8c00_0100, 0xabcd, MemOp::uw()), None);
    assert_eq!(b.read(0x8c00_0100, MemOp::ul()), 0xabcd);
}

#[test]
fn code_write_reports_guest_page_once() {
    let mut b = bus();
    b.mark_code(0x8c01_0000, 4);
    assert!(b.is_code_page(0x0c01_0800));
    assert_eq!(b.write(0x8c01_0002, 0x0009, MemOp::uw()), Some(vec![0x8c01_0000]));
    assert!(!b.is_code_page(0x8c01_0000));
    assert_eq!(b.write(0x8c01_0002, 0x0009, MemOp::uw()), None);
}

#[test]
fn aliased_write_hits_every_view() {
    let mut b = bus();
    b.mark_code(0x8c01_0000, 2);
    b.mark_code(0xac01_0100, 2);
    let mut pages = b.write(0x0c01_0004, 0, MemOp::ul()).unwrap();
    pages.sort_unstable();
    assert_eq!(pages, vec![0x8c01_0000, 0xac01_0000]);
}

#[test]
fn blocks_across_a_page_mark_both() {
    let mut b = bus();
    b.mark_code(0x8c01_0ffe, 4);
    assert!(b.is_code_page(0x8c01_0000));
    assert!(b.is_code_page(0x8c01_1000));
    // A store straddling the boundary reports both pages.
    let mut pages = b.write(0x8c01_0ffe, 0, MemOp::ul()).unwrap();
    pages.sort_unstable();
    assert_eq!(pages, vec![0x8c01_0000, 0x8c01_1000]);
}

#[test]
fn clearing_forgets_code() {
    let mut b = bus();
    b.mark_code(0x8c01_0000, 2);
    b.mark_code(0x8c00_0000, 0);
    assert!(!b.is_code_page(0x8c00_0000));
    b.clear_code_pages();
    assert_eq!(b.write(0x8c01_0000, 0, MemOp::uw()), None);
}

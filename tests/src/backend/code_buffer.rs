use sh4jit_backend::{BackendError, CodeBuffer};

#[test]
fn emits_little_endian() {
    let mut buf = CodeBuffer::new(16, 16);
    buf.emit_u8(0xaa).unwrap();
    buf.emit_u32(0x1122_3344).unwrap();
    assert_eq!(buf.as_slice(), &[0xaa, 0x44, 0x33, 0x22, 0x11]);
    assert_eq!(buf.offset(), 5);
    assert_eq!(buf.remaining(), 11);
}

#[test]
fn grows_up_to_limit() {
    let mut buf = CodeBuffer::new(4, 64);
    buf.emit_bytes(&[0; 4]).unwrap();
    assert_eq!(buf.grow_count(), 0);
    buf.emit_bytes(&[1; 20]).unwrap();
    assert!(buf.grow_count() >= 1);
    assert!(buf.capacity() >= 24);
    assert!(buf.capacity() <= 64);
    assert_eq!(&buf.as_slice()[..4], &[0; 4]);
    assert_eq!(&buf.as_slice()[4..], &[1; 20]);
}

#[test]
fn full_buffer_reports_and_keeps_contents() {
    let mut buf = CodeBuffer::new(8, 8);
    buf.emit_bytes(&[7; 6]).unwrap();
    assert_eq!(
        buf.emit_bytes(&[0; 3]),
        Err(BackendError::BufferFull { needed: 3, capacity: 8 })
    );
    assert_eq!(buf.offset(), 6);
    buf.emit_bytes(&[8; 2]).unwrap();
    assert_eq!(buf.remaining(), 0);
}

#[test]
fn limit_is_never_below_size() {
    let buf = CodeBuffer::new(32, 8);
    assert_eq!(buf.limit(), 32);
}

#[test]
fn relocate_keeps_contents() {
    let mut buf = CodeBuffer::new(16, 16);
    buf.emit_bytes(&[1, 2, 3]).unwrap();
    let before = buf.relocation_count();
    buf.relocate();
    assert_eq!(buf.relocation_count(), before + 1);
    assert_eq!(buf.as_slice(), &[1, 2, 3]);
    buf.emit_u8(4).unwrap();
    assert_eq!(buf.as_slice(), &[1, 2, 3, 4]);
}

#[test]
fn set_offset_and_reset() {
    let mut buf = CodeBuffer::new(16, 16);
    buf.emit_bytes(&[1, 2, 3, 4]).unwrap();
    buf.set_offset(2);
    assert_eq!(buf.as_slice(), &[1, 2]);
    buf.reset();
    assert_eq!(buf.offset(), 0);
    assert_eq!(buf.remaining(), 16);
}

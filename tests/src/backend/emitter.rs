use sh4jit_backend::host::emitter::{Emitter, OPC_JMP_NEAR, OPC_JMP_SHORT};
use sh4jit_backend::BackendError;
use sh4jit_core::Cond;

/// Jump back over `nops` bytes to a label placed at offset 0.
fn backward(nops: usize) -> Vec<u8> {
    let mut e = Emitter::new();
    let l = e.new_label();
    e.bind(l);
    e.emit_nops(nops);
    e.jmp(l, false);
    let code = e.finish().unwrap();
    code[nops..].to_vec()
}

/// Jump forward over `nops` bytes.
fn forward(nops: usize, short: bool) -> Result<Vec<u8>, BackendError> {
    let mut e = Emitter::new();
    let l = e.new_label();
    e.jmp(l, short);
    e.emit_nops(nops);
    e.bind(l);
    let code = e.finish()?;
    let len = code.len() - nops;
    Ok(code[..len].to_vec())
}

#[test]
fn backward_jumps_pick_shortest_form() {
    assert_eq!(backward(0), [OPC_JMP_SHORT, 0xfe]);
    assert_eq!(backward(1), [OPC_JMP_SHORT, 0xfd]);
    assert_eq!(backward(126), [OPC_JMP_SHORT, 0x80]);
    assert_eq!(backward(127), [OPC_JMP_NEAR, 0x7c, 0xff, 0xff, 0xff]);
}

#[test]
fn forward_short_jumps() {
    assert_eq!(forward(0, true).unwrap(), [OPC_JMP_SHORT, 0x00]);
    assert_eq!(forward(1, true).unwrap(), [OPC_JMP_SHORT, 0x01]);
    assert_eq!(forward(127, true).unwrap(), [OPC_JMP_SHORT, 0x7f]);
}

#[test]
fn forward_jumps_default_to_near() {
    assert_eq!(forward(128, false).unwrap(), [OPC_JMP_NEAR, 0x80, 0, 0, 0]);
    assert_eq!(forward(0, false).unwrap(), [OPC_JMP_NEAR, 0, 0, 0, 0]);
}

#[test]
fn short_forward_jump_out_of_range() {
    assert_eq!(
        forward(128, true),
        Err(BackendError::LabelOutOfRange { label: 0, disp: 128 })
    );
}

#[test]
fn unbound_label_is_an_error() {
    let mut e = Emitter::new();
    let _ = e.new_label();
    let l = e.new_label();
    e.jcc(Cond::Eq, 0, 1, l, false);
    assert_eq!(e.finish(), Err(BackendError::UnboundLabel(1)));
}

#[test]
fn unused_label_is_fine() {
    let mut e = Emitter::new();
    let _ = e.new_label();
    e.exit(7);
    assert_eq!(e.finish().unwrap().len(), 5);
}

#[test]
fn conditional_jump_displacement_follows_operands() {
    let mut e = Emitter::new();
    let l = e.new_label();
    e.jcc(Cond::Ne, 2, 3, l, true);
    e.emit_nops(4);
    e.bind(l);
    let code = e.finish().unwrap();
    // opcode, cond, a, b, rel8
    assert_eq!(code.len(), 7 + 4);
    assert_eq!(code[1], Cond::Ne as u8);
    assert_eq!(&code[2..6], &[2, 0, 3, 0]);
    assert_eq!(code[6], 4);
}

//! Interfaces between generated code, guest state and the block cache.

use crate::types::MemOp;

/// Guest state as seen by generated code.
///
/// Executed blocks reach guest registers, guest memory and runtime helpers
/// only through this trait, so no host pointers are baked into the code.
pub trait GuestEnv {
    fn read_reg(&mut self, reg: u32) -> u32;
    fn write_reg(&mut self, reg: u32, val: u32);
    /// Load with the size/sign of `memop`; the result is already extended.
    fn load(&mut self, addr: u32, memop: MemOp) -> u32;
    fn store(&mut self, addr: u32, val: u32, memop: MemOp);
    fn call_helper(&mut self, helper: u32, args: [u32; 3]) -> u32;
    /// Record the guest address execution continues at when a block exits.
    fn set_pc(&mut self, pc: u32);
}

/// Guest memory space.
pub trait GuestMemory {
    /// Read `memop.size_bytes()` bytes; the result is zero-extended.
    fn read(&mut self, addr: u32, memop: MemOp) -> u32;
    fn write(&mut self, addr: u32, val: u32, memop: MemOp);

    /// Fetch an instruction word for translation.
    fn fetch16(&mut self, addr: u32) -> u16 {
        self.read(addr, MemOp::uw()) as u16
    }
}

/// Receiver of code invalidation requests.
pub trait CodeInvalidator {
    /// Discard every block whose guest range intersects `[start, end)`.
    fn invalidate_range(&mut self, start: u32, end: u32);
    /// Discard every block.
    fn invalidate_all(&mut self);
}

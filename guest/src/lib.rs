//! SH4 machine model: RAM, the cache/store-queue controller and the glue
//! that lets the execution engine run guest code against them.

pub mod bus;
pub mod ccn;
pub mod machine;
pub mod regs;

pub use bus::Bus;
pub use ccn::{cache_offset, Ccn};
pub use machine::{MachineConfig, Sh4Machine};
pub use regs::{Ccr, Mmucr};

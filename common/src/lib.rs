pub mod constants;
pub mod mem;
pub mod regs;

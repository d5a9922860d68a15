// Set in an address byte to select a write. Register addresses never use it.
pub const WRITE_FLAG: u8 = 0o100;

// Address byte that requests a global reset. Carries no payload and gets no
// response.
pub const RESET_ADDR: u8 = 0o60;

// Trails every register response.
pub const ACK: u8 = 1;

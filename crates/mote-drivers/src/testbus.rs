//! Scripted register-map I²C bus for driver unit tests.

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

/// Emulates a register-pointer I²C peripheral: a write sets the register
/// pointer (and stores any trailing payload bytes), a read streams bytes
/// from the pointer onward.
pub struct RegisterBus {
    pub regs: [u8; 256],
    pub last_addr: Option<u8>,
    pub fail: bool,
    ptr: u8,
}

impl RegisterBus {
    pub fn new() -> Self {
        Self {
            regs: [0; 256],
            last_addr: None,
            fail: false,
            ptr: 0,
        }
    }

    pub fn load(&mut self, start: u8, bytes: &[u8]) {
        for (i, b) in bytes.iter().enumerate() {
            self.regs[start as usize + i] = *b;
        }
    }
}

impl ErrorType for RegisterBus {
    type Error = ErrorKind;
}

impl I2c for RegisterBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if self.fail {
            return Err(ErrorKind::Other);
        }
        self.last_addr = Some(address);
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    if let Some((reg, payload)) = bytes.split_first() {
                        self.ptr = *reg;
                        for (i, b) in payload.iter().enumerate() {
                            self.regs[self.ptr as usize + i] = *b;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, slot) in buf.iter_mut().enumerate() {
                        *slot = self.regs[self.ptr as usize + i];
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay provider that returns immediately.
pub struct NoDelay;

impl embedded_hal::delay::DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

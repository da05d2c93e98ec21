//! Virtual machine.
use std::{
    fmt::{self, Write},
    time::Duration,
};

use log::warn;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    constants::*,
    cpu::{CallStack, Registers},
    display::{Chip8DisplayBuffer, Framebuffer},
    error::{LoadError, VmFault},
    keypad::KeyCode,
    memory::Memory,
    opcode::Op,
    timer::Timers,
};

/// Complete machine state plus the interpreter that steps it.
///
/// All state is created together when a program image is loaded,
/// and replaced together when another image is loaded.
pub struct Chip8Vm {
    memory: Memory,
    registers: Registers,
    stack: CallStack,
    timers: Timers,
    display: Framebuffer,
    /// Source for `Cxnn (RND Vx, byte)`.
    rng: StdRng,
    /// Interrupt for VM loop, set by the host to stop execution.
    trap: bool,
    conf: Chip8Conf,
}

impl Chip8Vm {
    /// Create a machine with the given program image loaded at [`MEM_START`].
    pub fn load(bytecode: &[u8], conf: Chip8Conf) -> Result<Self, LoadError> {
        let memory = Memory::load(bytecode)?;
        let rng = match conf.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Chip8Vm {
            memory,
            registers: Registers::new(),
            stack: CallStack::new(),
            timers: Timers::new(),
            display: Framebuffer::new(),
            rng,
            trap: false,
            conf,
        })
    }

    /// Replace the running program with a new image.
    ///
    /// The whole machine is reset. On error the current state is kept.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Result<(), LoadError> {
        // Start with clean memory to avoid leaking previous program.
        self.memory = Memory::load(bytecode)?;
        self.registers = Registers::new();
        self.stack = CallStack::new();
        self.timers = Timers::new();
        self.display.clear();
        self.trap = false;

        Ok(())
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    pub fn display_buffer(&self) -> Chip8DisplayBuffer<'_> {
        self.display.buffer()
    }

    pub fn display(&self) -> &Framebuffer {
        &self.display
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
}

/// Outcome of a single interpreter step, telling the host what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Nothing observable changed.
    Continue,
    /// The display buffer changed and should be rendered.
    NeedsRedraw,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`). The program
    /// counter is not advanced, so the same instruction runs again on the
    /// next step, until a key is supplied.
    AwaitingKey,
    /// The host requested the machine to stop.
    Halted,
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// Seed for the random number generator. Seeded from system entropy when empty.
    pub rng_seed: Option<u64>,
}

/// CPU clock frequency, in hertz (per second)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Hz(pub u64);

impl From<Hz> for Duration {
    fn from(freq: Hz) -> Self {
        if freq.0 == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(NANOS_IN_SECOND / freq.0)
        }
    }
}

/// Interpreter
impl Chip8Vm {
    /// Request the machine to stop. Every following step reports [`ExecutionStatus::Halted`].
    pub fn halt(&mut self) {
        self.trap = true;
    }

    pub fn is_halted(&self) -> bool {
        self.trap
    }

    /// Count down the delay and sound timers.
    ///
    /// Must be called at 60Hz by the host, regardless of how many
    /// instructions are executed, including while waiting for a key.
    /// Returns whether the buzzer should sound during this tick.
    pub fn tick(&mut self) -> bool {
        self.timers.tick()
    }

    /// Run up to `step_count` instructions with the same latched key.
    ///
    /// Stops early when the machine has to wait for a key, or was halted.
    pub fn run_steps(
        &mut self,
        step_count: usize,
        key: Option<KeyCode>,
    ) -> Result<ExecutionStatus, VmFault> {
        let mut status = ExecutionStatus::Continue;

        for _ in 0..step_count {
            status = self.step(key)?;
            if matches!(
                status,
                ExecutionStatus::AwaitingKey | ExecutionStatus::Halted
            ) {
                break;
            }
        }

        Ok(status)
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// `key` is the key currently considered pressed, if any.
    ///
    /// A fault leaves the machine as it was before the instruction.
    pub fn step(&mut self, key: Option<KeyCode>) -> Result<ExecutionStatus, VmFault> {
        if self.trap {
            // Interrupt signal is set.
            return Ok(ExecutionStatus::Halted);
        }

        let pc = self.registers.pc;

        // Each instruction is two bytes, with the opcode identity in the first 4-bit nibble.
        let result = self
            .memory
            .read_word(pc as usize)
            .and_then(|code| self.exec(pc, code, key));

        if let Err(ref fault) = result {
            warn!("fault at 0x{pc:04X}: {fault}");
        }

        result
    }

    fn exec(
        &mut self,
        pc: Address,
        code: u16,
        key: Option<KeyCode>,
    ) -> Result<ExecutionStatus, VmFault> {
        let op = Op::decode(code);
        op_trace(pc, code, &op);

        // The program counter is only written once the instruction has
        // fully succeeded, so a fault never leaves it half executed.
        let mut next_pc = pc + 2;
        let mut status = ExecutionStatus::Continue;

        let regs = &mut self.registers;

        match op {
            Op::ClearScreen => {
                self.display.clear();
                status = ExecutionStatus::NeedsRedraw;
            }
            Op::Return => next_pc = self.stack.pop(pc)?,
            Op::Jump { address } => next_pc = address,
            Op::Call { address } => {
                // Return to the instruction after the call.
                self.stack.push(next_pc, pc)?;
                next_pc = address;
            }
            Op::Skip_Eq_Byte { vx, nn } => {
                if regs.get(vx) == nn {
                    next_pc += 2;
                }
            }
            Op::Skip_NotEq_Byte { vx, nn } => {
                if regs.get(vx) != nn {
                    next_pc += 2;
                }
            }
            Op::Skip_Eq { vx, vy } => {
                if regs.get(vx) == regs.get(vy) {
                    next_pc += 2;
                }
            }
            Op::Skip_NotEq { vx, vy } => {
                if regs.get(vx) != regs.get(vy) {
                    next_pc += 2;
                }
            }
            Op::Load_Byte { vx, nn } => regs.set(vx, nn),
            Op::Add_Byte { vx, nn } => regs.set(vx, regs.get(vx).wrapping_add(nn)),
            // ----------------------------------------------------------------
            // Math. Flags are computed from the operands before the
            // destination is written, and VF is always written last.
            Op::Load_Vx_Vy { vx, vy } => regs.set(vx, regs.get(vy)),
            Op::Or_Vx_Vy { vx, vy } => regs.set(vx, regs.get(vx) | regs.get(vy)),
            Op::And_Vx_Vy { vx, vy } => regs.set(vx, regs.get(vx) & regs.get(vy)),
            Op::Xor_Vx_Vy { vx, vy } => regs.set(vx, regs.get(vx) ^ regs.get(vy)),
            Op::Add_Vx_Vy { vx, vy } => {
                let (result, carry) = regs.get(vx).overflowing_add(regs.get(vy));
                regs.set(vx, result);
                regs.set_flag(carry);
            }
            Op::Sub_Vx_Vy { vx, vy } => {
                let (x, y) = (regs.get(vx), regs.get(vy));
                regs.set(vx, x.wrapping_sub(y));
                regs.set_flag(x >= y);
            }
            Op::ShiftRight { vx } => {
                let x = regs.get(vx);
                regs.set(vx, x >> 1);
                regs.set_flag(x & 1 == 1);
            }
            Op::SubReverse_Vx_Vy { vx, vy } => {
                let (x, y) = (regs.get(vx), regs.get(vy));
                regs.set(vx, y.wrapping_sub(x));
                regs.set_flag(y >= x);
            }
            Op::ShiftLeft { vx } => {
                let x = regs.get(vx);
                regs.set(vx, x << 1);
                regs.set_flag(x >> 7 == 1);
            }
            // ----------------------------------------------------------------
            Op::Load_Address { address } => regs.address = address,
            Op::Jump_V0 { address } => next_pc = address + regs.get(0) as Address,
            Op::Random { vx, nn } => regs.set(vx, self.rng.gen::<u8>() & nn),
            Op::Draw { vx, vy, n } => {
                let (x, y) = (regs.get(vx) as usize, regs.get(vy) as usize);
                let sprite = self.memory.read_slice(regs.address as usize, n as usize)?;

                // If a pixel was erased, then a collision occurred.
                let is_erased = self.display.draw_sprite(x, y, sprite);
                regs.set_flag(is_erased);
                status = ExecutionStatus::NeedsRedraw;
            }
            // ----------------------------------------------------------------
            Op::Skip_Key { vx } => {
                if key.map_or(false, |k| k.as_u8() == regs.get(vx)) {
                    next_pc += 2;
                }
            }
            Op::Skip_NotKey { vx } => {
                if !key.map_or(false, |k| k.as_u8() == regs.get(vx)) {
                    next_pc += 2;
                }
            }
            // ----------------------------------------------------------------
            Op::Load_Vx_Delay { vx } => regs.set(vx, self.timers.delay),
            Op::Load_Vx_Key { vx } => match key {
                Some(k) => regs.set(vx, k.as_u8()),
                // Stall the machine on this instruction.
                None => return Ok(ExecutionStatus::AwaitingKey),
            },
            Op::Load_Delay_Vx { vx } => self.timers.delay = regs.get(vx),
            Op::Load_Sound_Vx { vx } => self.timers.sound = regs.get(vx),
            Op::Add_Address_Vx { vx } => {
                let sum = regs.address as usize + regs.get(vx) as usize;
                regs.address = regs.address.wrapping_add(regs.get(vx) as Address);
                regs.set_flag(sum > ADDRESS_MASK as usize);
            }
            Op::Load_Font_Vx { vx } => {
                let digit = (regs.get(vx) & 0xF) as Address;
                regs.address = FONTSET_START + digit * FONTSET_HEIGHT as Address;
            }
            #[rustfmt::skip]
            Op::Store_Bcd { vx } => {
                let x = regs.get(vx);
                let digits = [
                    x / 100,
                    x / 10  % 10,
                    x       % 10,
                ];
                self.memory.write_slice(regs.address as usize, &digits)?;
            }
            Op::Store_Registers { vx } => {
                let count = vx as usize + 1;
                self.memory
                    .write_slice(regs.address as usize, &regs.v[..count])?;
            }
            Op::Load_Registers { vx } => {
                let count = vx as usize + 1;
                let data = self.memory.read_slice(regs.address as usize, count)?;
                regs.v[..count].copy_from_slice(data);
            }
            // ----------------------------------------------------------------
            Op::Unknown { code } => {
                warn!("unknown opcode {code:04X} at 0x{pc:04X}, skipped");
            }
        }

        self.registers.pc = next_pc;

        Ok(status)
    }
}

/// Troubleshooting
impl Chip8Vm {
    /// Returns `count` bytes of the program area as human readable words.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let ram = self.memory.as_slice();
        let end = (MEM_START + count).min(MEM_SIZE);
        let mut buf = String::new();

        for (i, word) in ram[MEM_START..end].chunks(2).enumerate() {
            let addr = MEM_START + i * 2;
            match word {
                [a, b] => writeln!(buf, "{addr:04X}: {a:02X}{b:02X}")?,
                [a] => writeln!(buf, "{addr:04X}: {a:02X}")?,
                _ => unreachable!("chunks are never empty"),
            }
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        self.display.dump()
    }

    pub fn dump_registers(&self) -> Result<String, fmt::Error> {
        let regs = &self.registers;
        let mut buf = String::new();

        write!(buf, "PC={:04X} I={:04X} SP={:X}", regs.pc, regs.address, self.stack.depth())?;
        write!(buf, " DT={:02X} ST={:02X}", self.timers.delay, self.timers.sound)?;
        writeln!(buf)?;
        for (i, v) in regs.v.iter().enumerate() {
            write!(buf, "v{i:X}={v:02X}")?;
            buf.write_char(if i % 8 == 7 { '\n' } else { ' ' })?;
        }

        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(pc: Address, code: u16, op: &Op) {
    log::trace!("{pc:04X}: {code:04X}  {op}");
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: Address, _: u16, _: &Op) {}

#[cfg(test)]
mod test {
    use super::*;

    fn vm_with(program: &[u8]) -> Chip8Vm {
        let conf = Chip8Conf { rng_seed: Some(8) };
        Chip8Vm::load(program, conf).unwrap()
    }

    #[test]
    fn test_clock_hz() {
        let interval: Duration = Hz(60).into();
        assert_eq!(interval.as_millis(), 16);
        assert_eq!(Duration::from(Hz(0)), Duration::ZERO);
    }

    /// Fx0A (LD Vx, K)
    ///
    /// Wait for a keypress, then store the key value in Vx.
    /// The VM must stall while waiting, and signal the state to the outer executer.
    #[test]
    #[rustfmt::skip]
    fn test_key_wait() {
        let mut vm = vm_with(&[
            0xF1, 0x0A, // LD v1, K
            0x62, 0x42  // LD v2, 0x42  ; sentinal
        ]);

        // machine must stall
        for _ in 0..6 {
            assert_eq!(vm.step(None), Ok(ExecutionStatus::AwaitingKey));
            assert_eq!(vm.registers.pc, MEM_START as Address);
        }

        // machine will now advance
        assert_eq!(vm.step(Some(KeyCode::Key5)), Ok(ExecutionStatus::Continue));
        assert_eq!(vm.registers.pc, MEM_START as Address + 2);
        assert_eq!(vm.registers.v[1], 0x05);

        // Ensure the machine is continuing
        vm.step(None).unwrap();
        assert_eq!(vm.registers.pc, MEM_START as Address + 4);
        assert_eq!(vm.registers.v[2], 0x42); // sentinal
    }

    #[test]
    fn test_draw_collision_flag_cleared() {
        #[rustfmt::skip]
        let mut vm = vm_with(&[
            0xA2, 0x0A, // LD I, 0x20A
            0x6F, 0x07, // LD vF, 7     ; stale flag must be cleared
            0xD0, 0x01, // DRW v0, v0, 1
            0xD0, 0x01, // DRW v0, v0, 1
            0x12, 0x08, // JP 0x208
            0b1111_0000,
        ]);

        vm.run_steps(2, None).unwrap();
        assert_eq!(vm.step(None), Ok(ExecutionStatus::NeedsRedraw));
        assert_eq!(vm.registers.v[0xF], 0);
        assert!(vm.display.pixel(3, 0));

        assert_eq!(vm.step(None), Ok(ExecutionStatus::NeedsRedraw));
        assert_eq!(vm.registers.v[0xF], 1);
        assert!(vm.display.is_blank());
    }

    #[test]
    fn test_fault_leaves_state() {
        #[rustfmt::skip]
        let mut vm = vm_with(&[
            0xAF, 0xFE, // LD I, 0xFFE
            0xF3, 0x55, // LD [I], v3
        ]);

        vm.step(None).unwrap();
        assert_eq!(
            vm.step(None),
            Err(VmFault::AddressOutOfRange { address: MEM_SIZE })
        );
        assert_eq!(vm.registers.pc, 0x202);
        assert_eq!(vm.memory.read_byte(0xFFE), Ok(0));
    }

    #[test]
    fn test_halt() {
        let mut vm = vm_with(&[0x12, 0x00]); // JP 0x200
        assert_eq!(vm.step(None), Ok(ExecutionStatus::Continue));
        vm.halt();
        assert_eq!(vm.step(None), Ok(ExecutionStatus::Halted));
        assert_eq!(vm.run_steps(10, None), Ok(ExecutionStatus::Halted));

        vm.load_bytecode(&[0x00, 0xE0]).unwrap();
        assert!(!vm.is_halted());
        assert_eq!(vm.step(None), Ok(ExecutionStatus::NeedsRedraw));
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let program = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0x0F];
        let mut a = vm_with(&program);
        let mut b = vm_with(&program);

        a.run_steps(3, None).unwrap();
        b.run_steps(3, None).unwrap();
        assert_eq!(a.registers.v, b.registers.v);
        assert!(a.registers.v[2] <= 0x0F);
    }

    #[test]
    fn test_dump_registers() {
        let vm = vm_with(&[]);
        let dump = vm.dump_registers().unwrap();
        assert!(dump.starts_with("PC=0200 I=0000 SP=0 DT=00 ST=00\n"));
        assert_eq!(dump.lines().count(), 3);
    }

    #[test]
    fn test_dump_ram() {
        let vm = vm_with(&[0x00, 0xE0, 0x12]);
        assert_eq!(vm.dump_ram(3).unwrap(), "0200: 00E0\n0202: 12\n");
    }
}

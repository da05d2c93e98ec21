use chip8::{constants::*, prelude::*};

/// Build a machine from a program written as instruction words.
fn vm(program: &[u16]) -> Chip8Vm {
    let bytecode: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
    Chip8Vm::load(&bytecode, Chip8Conf { rng_seed: Some(0) }).unwrap()
}

fn pc(vm: &Chip8Vm) -> Address {
    vm.registers().pc
}

#[test]
fn test_add_byte_wraps_without_flag() {
    for a in 0..=u8::MAX {
        for b in [0x00, 0x01, 0x7F, 0x80, 0xFE, 0xFF, a] {
            let mut vm = vm(&[
                0x6000 | a as u16, // LD v0, a
                0x6F5A,            // LD vF, 0x5A
                0x7000 | b as u16, // ADD v0, b
            ]);
            vm.run_steps(3, None).unwrap();
            assert_eq!(vm.registers().v[0], a.wrapping_add(b));
            assert_eq!(vm.registers().v[0xF], 0x5A, "flag must be untouched");
        }
    }
}

#[test]
fn test_add_registers_carry() {
    let mut vm = vm(&[0x60FF, 0x6101, 0x8014]);
    vm.run_steps(3, None).unwrap();
    assert_eq!(vm.registers().v[0], 0x00);
    assert_eq!(vm.registers().v[0xF], 1);

    let mut vm = self::vm(&[0x6001, 0x6101, 0x6F01, 0x8014]);
    vm.run_steps(4, None).unwrap();
    assert_eq!(vm.registers().v[0], 0x02);
    assert_eq!(vm.registers().v[0xF], 0);
}

#[test]
fn test_sub_registers_borrow() {
    let mut vm = vm(&[0x6005, 0x6103, 0x8015]);
    vm.run_steps(3, None).unwrap();
    assert_eq!(vm.registers().v[0], 0x02);
    assert_eq!(vm.registers().v[0xF], 1);

    let mut vm = self::vm(&[0x6003, 0x6105, 0x8015]);
    vm.run_steps(3, None).unwrap();
    assert_eq!(vm.registers().v[0], 0xFE);
    assert_eq!(vm.registers().v[0xF], 0);

    // SUBN v0, v1: v0 = v1 - v0
    let mut vm = self::vm(&[0x6003, 0x6105, 0x8017]);
    vm.run_steps(3, None).unwrap();
    assert_eq!(vm.registers().v[0], 0x02);
    assert_eq!(vm.registers().v[0xF], 1);
}

#[test]
fn test_shifts_extract_flag() {
    // SHR v0
    let mut vm = vm(&[0x6081, 0x8006]);
    vm.run_steps(2, None).unwrap();
    assert_eq!(vm.registers().v[0], 0x40);
    assert_eq!(vm.registers().v[0xF], 1);

    // SHL v0
    let mut vm = self::vm(&[0x6081, 0x800E]);
    vm.run_steps(2, None).unwrap();
    assert_eq!(vm.registers().v[0], 0x02);
    assert_eq!(vm.registers().v[0xF], 1);

    // Flag wins over the result when the destination is vF itself.
    let mut vm = self::vm(&[0x6F02, 0x8F06]);
    vm.run_steps(2, None).unwrap();
    assert_eq!(vm.registers().v[0xF], 0);
}

#[test]
fn test_flag_from_pre_op_operands() {
    // ADD vF, v1 with vF = 0xFF: carry is computed before vF is overwritten.
    let mut vm = vm(&[0x6FFF, 0x6102, 0x8F14]);
    vm.run_steps(3, None).unwrap();
    assert_eq!(vm.registers().v[0xF], 1);
}

#[test]
fn test_bitwise() {
    let mut vm = vm(&[
        0x60F0, // LD v0, 0xF0
        0x613C, // LD v1, 0x3C
        0x8011, // OR v0, v1
        0x8012, // AND v0, v1
        0x8013, // XOR v0, v1
        0x8010, // LD v0, v1
    ]);
    vm.run_steps(2, None).unwrap();

    vm.step(None).unwrap();
    assert_eq!(vm.registers().v[0], 0xFC);
    vm.step(None).unwrap();
    assert_eq!(vm.registers().v[0], 0x3C);
    vm.step(None).unwrap();
    assert_eq!(vm.registers().v[0], 0x00);
    vm.step(None).unwrap();
    assert_eq!(vm.registers().v[0], 0x3C);
    assert_eq!(vm.registers().v[1], 0x3C);
}

#[test]
fn test_clear_screen() {
    let mut vm = vm(&[
        0xF029, // LD F, v0  ; glyph "0"
        0xD005, // DRW v0, v0, 5
        0x00E0, // CLS
        0x00E0, // CLS
    ]);
    vm.step(None).unwrap();
    assert_eq!(vm.step(None), Ok(ExecutionStatus::NeedsRedraw));
    assert!(!vm.display().is_blank());

    assert_eq!(vm.step(None), Ok(ExecutionStatus::NeedsRedraw));
    assert!(vm.display_buffer().iter().all(|px| !px));

    // Already blank
    assert_eq!(vm.step(None), Ok(ExecutionStatus::NeedsRedraw));
    assert!(vm.display().is_blank());
}

#[test]
fn test_call_stack_discipline() {
    // Each subroutine calls the next one, 17 levels deep, then they
    // all return in turn.
    //
    // 0x200: CALL 0x300
    // 0x300: CALL 0x302
    // 0x302: CALL 0x304
    // ...
    let mut program = vec![0x0000; 0x100 / 2 + 17];
    program[0] = 0x2300;
    for level in 0..16 {
        program[0x80 + level] = 0x2302 + level as u16 * 2;
    }
    program[0x80 + 16] = 0x00EE;
    let mut vm = vm(&program);

    let mut return_addrs = vec![];
    for _ in 0..STACK_SIZE {
        return_addrs.push(pc(&vm) + 2);
        assert_eq!(vm.step(None), Ok(ExecutionStatus::Continue));
    }
    assert_eq!(vm.stack().depth(), STACK_SIZE);
    assert_eq!(vm.stack().frames(), return_addrs.as_slice());

    // 17th call
    let before = pc(&vm);
    assert_eq!(vm.step(None), Err(VmFault::StackOverflow { pc: before }));
    assert_eq!(pc(&vm), before);
    assert_eq!(vm.stack().depth(), STACK_SIZE);

    // Return through all levels by jumping onto a RET instruction.
    let mut vm = self::vm(&[
        0x2206, // 0x200: CALL 0x206
        0x0000, // 0x202
        0x0000, // 0x204
        0x00EE, // 0x206: RET
    ]);
    vm.step(None).unwrap();
    assert_eq!(vm.step(None), Ok(ExecutionStatus::Continue));
    assert_eq!(pc(&vm), 0x202);
    assert!(vm.stack().is_empty());
}

#[test]
fn test_nested_returns_in_reverse_order() {
    // Sixteen nested calls through a table of CALL/RET pairs. Every
    // return lands on the RET of its caller, unwinding in reverse order.
    //
    // 0x200:          CALL 0x300
    // 0x202:          JP 0x202        ; parked after unwinding
    // 0x300 + 4n:     CALL 0x300 + 4(n+1)
    // 0x300 + 4n + 2: RET
    // 0x33C:          RET             ; innermost
    let mut program = vec![0x0000; 0x100 / 2 + 64];
    program[0] = 0x2300; // CALL 0x300
    program[1] = 0x1202; // JP 0x202
    for n in 0..15 {
        program[0x80 + n * 2] = 0x2300 + (n as u16 + 1) * 4;
        program[0x80 + n * 2 + 1] = 0x00EE;
    }
    program[0x80 + 30] = 0x00EE; // innermost subroutine returns immediately
    let mut vm = vm(&program);

    let mut expected = vec![];
    for _ in 0..STACK_SIZE {
        expected.push(pc(&vm) + 2);
        vm.step(None).unwrap();
    }
    assert_eq!(vm.stack().depth(), STACK_SIZE);

    for addr in expected.iter().rev() {
        vm.step(None).unwrap();
        assert_eq!(pc(&vm), *addr);
        if *addr != 0x202 {
            assert_eq!(vm.memory().read_word(*addr as usize), Ok(0x00EE));
        }
    }
    assert!(vm.stack().is_empty());
    assert_eq!(pc(&vm), 0x202);

    // 17th return with an empty stack.
    let mut vm = self::vm(&[0x00EE]);
    assert_eq!(vm.step(None), Err(VmFault::StackUnderflow { pc: 0x200 }));
    assert_eq!(pc(&vm), 0x200);
}

#[test]
fn test_skips() {
    let cases: Vec<(Vec<u16>, Address)> = vec![
        (vec![0x6042, 0x3042], 0x206), // SE v0, 0x42
        (vec![0x6042, 0x3043], 0x204),
        (vec![0x6042, 0x4043], 0x206), // SNE v0, 0x43
        (vec![0x6042, 0x4042], 0x204),
        (vec![0x6042, 0x6142, 0x5010], 0x208), // SE v0, v1
        (vec![0x6042, 0x6143, 0x5010], 0x206),
        (vec![0x6042, 0x6143, 0x9010], 0x208), // SNE v0, v1
        (vec![0x6042, 0x6142, 0x9010], 0x206),
    ];

    for (program, expected) in cases {
        let mut vm = vm(&program);
        vm.run_steps(program.len(), None).unwrap();
        assert_eq!(pc(&vm), expected, "program {program:04X?}");
    }
}

#[test]
fn test_jumps() {
    let mut vm = vm(&[0x1208, 0, 0, 0, 0x6010, 0xB300]);
    vm.step(None).unwrap();
    assert_eq!(pc(&vm), 0x208);
    vm.run_steps(2, None).unwrap();
    assert_eq!(pc(&vm), 0x310);
}

#[test]
fn test_jump_out_of_memory_faults_on_fetch() {
    let mut vm = vm(&[0x60FF, 0xBFFF]);
    vm.run_steps(2, None).unwrap();
    assert_eq!(pc(&vm), 0x10FE);
    assert_eq!(
        vm.step(None),
        Err(VmFault::AddressOutOfRange { address: 0x10FE })
    );
}

#[test]
fn test_bcd() {
    let mut vm = vm(&[0x60EA, 0xA300, 0xF033]);
    vm.run_steps(3, None).unwrap();
    let mem = vm.memory();
    assert_eq!(mem.read_slice(0x300, 3), Ok(&[2, 3, 4][..]));
}

#[test]
fn test_store_load_registers_roundtrip() {
    let mut vm = vm(&[
        0x6011, 0x6122, 0x6233, 0x6344, 0x6455, // LD v0..v4
        0xA400, // LD I, 0x400
        0xF355, // LD [I], v3
        0x6000, 0x6100, 0x6200, 0x6300, // zero v0..v3
        0xF365, // LD v3, [I]
    ]);
    vm.run_steps(7, None).unwrap();
    assert_eq!(
        vm.memory().read_slice(0x400, 5),
        Ok(&[0x11, 0x22, 0x33, 0x44, 0x00][..])
    );
    // I is not incremented.
    assert_eq!(vm.registers().address, 0x400);

    vm.run_steps(4, None).unwrap();
    assert_eq!(&vm.registers().v[..4], &[0, 0, 0, 0]);

    vm.step(None).unwrap();
    assert_eq!(&vm.registers().v[..5], &[0x11, 0x22, 0x33, 0x44, 0x55]);
}

#[test]
fn test_draw_twice_restores() {
    let mut vm = vm(&[
        0x600A, // LD v0, 10
        0x6105, // LD v1, 5
        0x620F, // LD v2, 0xF
        0xF229, // LD F, v2
        0xD015, // DRW v0, v1, 5
        0xD015, // DRW v0, v1, 5
        0xA300, // LD I, 0x300   ; zeroed memory, blank sprite
        0xD015, // DRW v0, v1, 5
        0xD015, // DRW v0, v1, 5
    ]);
    let before = vm.display().clone();

    vm.run_steps(4, None).unwrap();
    assert_eq!(vm.registers().address, 0xF * 5);
    assert_eq!(vm.step(None), Ok(ExecutionStatus::NeedsRedraw));
    assert_eq!(vm.registers().v[0xF], 0);
    assert_ne!(vm.display(), &before);
    // Top row of the "F" glyph is 0xF0.
    assert!((10..14).all(|x| vm.display().pixel(x, 5)));

    vm.step(None).unwrap();
    assert_eq!(vm.display(), &before);
    // Every pixel of the first draw was erased again.
    assert_eq!(vm.registers().v[0xF], 1);

    // A blank sprite never collides.
    vm.step(None).unwrap();
    vm.step(None).unwrap();
    assert_eq!(vm.registers().v[0xF], 0);
    vm.step(None).unwrap();
    assert_eq!(vm.registers().v[0xF], 0);
    assert_eq!(vm.display(), &before);
}

#[test]
fn test_draw_out_of_memory_faults() {
    let mut vm = vm(&[0xAFFE, 0xD005]);
    vm.step(None).unwrap();
    assert_eq!(
        vm.step(None),
        Err(VmFault::AddressOutOfRange { address: MEM_SIZE })
    );
    assert!(vm.display().is_blank());
    assert_eq!(pc(&vm), 0x202);
}

#[test]
fn test_key_wait_protocol() {
    let mut vm = vm(&[0xF30A, 0x6001]);

    for _ in 0..10 {
        assert_eq!(vm.step(None), Ok(ExecutionStatus::AwaitingKey));
        assert_eq!(pc(&vm), 0x200);
        // Timers keep running while the machine waits.
        vm.tick();
    }

    assert_eq!(vm.step(Some(KeyCode::KeyB)), Ok(ExecutionStatus::Continue));
    assert_eq!(vm.registers().v[3], 0xB);
    assert_eq!(pc(&vm), 0x202);
    vm.step(Some(KeyCode::KeyB)).unwrap();
    assert_eq!(pc(&vm), 0x204);
}

#[test]
fn test_key_skips() {
    // SKP v0 with v0 = 5
    let program = [0x6005, 0xE09E];
    let mut pressed = vm(&program);
    pressed.run_steps(2, Some(KeyCode::Key5)).unwrap();
    assert_eq!(pc(&pressed), 0x206);

    let mut other = vm(&program);
    other.run_steps(2, Some(KeyCode::Key6)).unwrap();
    assert_eq!(pc(&other), 0x204);

    let mut none = vm(&program);
    none.run_steps(2, None).unwrap();
    assert_eq!(pc(&none), 0x204);

    // SKNP v0 with v0 = 5
    let program = [0x6005, 0xE0A1];
    let mut pressed = vm(&program);
    pressed.run_steps(2, Some(KeyCode::Key5)).unwrap();
    assert_eq!(pc(&pressed), 0x204);

    let mut none = vm(&program);
    none.run_steps(2, None).unwrap();
    assert_eq!(pc(&none), 0x206);
}

#[test]
fn test_timers() {
    let mut vm = vm(&[
        0x6003, // LD v0, 3
        0xF015, // LD DT, v0
        0xF018, // LD ST, v0
        0xF107, // LD v1, DT
    ]);
    vm.run_steps(3, None).unwrap();
    assert_eq!(vm.timers().delay, 3);
    assert_eq!(vm.timers().sound, 3);

    assert!(vm.tick());
    assert!(vm.tick());
    vm.step(None).unwrap();
    assert_eq!(vm.registers().v[1], 1);

    assert!(vm.tick());
    assert!(!vm.tick());
    assert_eq!(vm.timers().delay, 0);
}

#[test]
fn test_add_address_overflow_flag() {
    let mut vm = vm(&[0x6010, 0xAFF8, 0xF01E, 0xA100, 0xF01E]);
    vm.run_steps(3, None).unwrap();
    assert_eq!(vm.registers().address, 0x1008);
    assert_eq!(vm.registers().v[0xF], 1);

    vm.run_steps(2, None).unwrap();
    assert_eq!(vm.registers().address, 0x110);
    assert_eq!(vm.registers().v[0xF], 0);
}

#[test]
fn test_font_address_uses_low_nibble() {
    let mut vm = vm(&[0x601A, 0xF029]);
    vm.run_steps(2, None).unwrap();
    assert_eq!(vm.registers().address, FONTSET_START + 0xA * 5);
}

#[test]
fn test_random_masked() {
    let mut vm = vm(&[0xC000, 0xC10F]);
    vm.run_steps(2, None).unwrap();
    assert_eq!(vm.registers().v[0], 0);
    assert!(vm.registers().v[1] <= 0x0F);
}

#[test]
fn test_unknown_opcode_is_skipped() {
    let mut vm = vm(&[0x0123, 0x5121, 0xFFFF, 0x6007]);
    assert_eq!(
        vm.run_steps(4, None),
        Ok(ExecutionStatus::Continue)
    );
    assert_eq!(pc(&vm), 0x208);
    assert_eq!(vm.registers().v[0], 7);
}

#[test]
fn test_image_too_large() {
    let rom = vec![0u8; MAX_PROGRAM_SIZE + 1];
    match Chip8Vm::load(&rom, Chip8Conf::default()) {
        Err(LoadError::ImageTooLarge { size }) => assert_eq!(size, MAX_PROGRAM_SIZE + 1),
        _ => panic!("expected load error"),
    }
}

//! Instruction-level scenarios for the virtual machine.

use chip8_vm::emu::{DISPLAY_X, Keypad, Quirks, StepOutcome, Vm, VmError, glyph_address};
use chip8_vm::u4;

fn vm_with(program: &[u8]) -> Vm {
    let mut vm = Vm::new();
    vm.load(program).unwrap();
    vm
}

fn run(program: &[u8], steps: usize) -> Vm {
    let mut vm = vm_with(program);
    for _ in 0..steps {
        vm.step().unwrap();
    }
    vm
}

/// Runs a single-instruction program for every (a, b) register pair.
fn for_all_pairs(word: u16, mut check: impl FnMut(u8, u8, &Vm)) {
    let mut vm = vm_with(&word.to_be_bytes());
    for a in 0..=u8::MAX {
        for b in 0..=u8::MAX {
            vm.set_program_counter(0x200);
            vm.set_register(0, a).unwrap();
            vm.set_register(1, b).unwrap();
            vm.set_register(0xF, 0xAA).unwrap();
            vm.step().unwrap();
            check(a, b, &vm);
        }
    }
}

#[test]
fn load_and_set_register() {
    let vm = run(&[0x60, 0x05], 1);
    assert_eq!(vm.register(0), Ok(5));
    assert_eq!(vm.program_counter(), 0x202);
}

#[test]
fn add_immediate_wraps_without_flag() {
    let mut vm = vm_with(&[0x70, 0x00]);
    for a in 0..=u8::MAX {
        for b in 0..=u8::MAX {
            vm.write_byte(0x201, b).unwrap();
            vm.set_program_counter(0x200);
            vm.set_register(0, a).unwrap();
            vm.set_register(0xF, 0x55).unwrap();
            vm.step().unwrap();

            assert_eq!(vm.register(0), Ok(a.wrapping_add(b)));
            assert_eq!(vm.register(0xF), Ok(0x55));
        }
    }
}

#[test]
fn add_registers_sets_carry() {
    for_all_pairs(0x8014, |a, b, vm| {
        let sum = a as u16 + b as u16;
        assert_eq!(vm.register(0), Ok(sum as u8));
        assert_eq!(vm.register(0xF), Ok((sum > 255) as u8));
    });
}

#[test]
fn sub_registers_sets_no_borrow() {
    for_all_pairs(0x8015, |a, b, vm| {
        assert_eq!(vm.register(0), Ok(a.wrapping_sub(b)));
        assert_eq!(vm.register(0xF), Ok((a > b) as u8));
    });
}

#[test]
fn reverse_sub_sets_no_borrow() {
    for_all_pairs(0x8017, |a, b, vm| {
        assert_eq!(vm.register(0), Ok(b.wrapping_sub(a)));
        assert_eq!(vm.register(0xF), Ok((b > a) as u8));
    });
}

#[test]
fn logic_ops_leave_flag_alone_by_default() {
    for_all_pairs(0x8011, |a, b, vm| {
        assert_eq!(vm.register(0), Ok(a | b));
        assert_eq!(vm.register(0xF), Ok(0xAA));
    });
    for_all_pairs(0x8012, |a, b, vm| assert_eq!(vm.register(0), Ok(a & b)));
    for_all_pairs(0x8013, |a, b, vm| assert_eq!(vm.register(0), Ok(a ^ b)));
}

#[test]
fn flag_wins_when_vf_is_the_destination() {
    // VF = 0xFF, V1 = 0x01, VF += V1
    let vm = run(&[0x6F, 0xFF, 0x61, 0x01, 0x8F, 0x14], 3);
    assert_eq!(vm.register(0xF), Ok(1));
}

#[test]
fn shifts_read_vy_and_report_shifted_bit() {
    // V1 = 0x81, V0 = V1 >> 1, then V2 = V1 << 1
    let vm = run(&[0x61, 0x81, 0x80, 0x16], 2);
    assert_eq!(vm.register(0), Ok(0x40));
    assert_eq!(vm.register(0xF), Ok(1));

    let vm = run(&[0x61, 0x81, 0x82, 0x1E], 2);
    assert_eq!(vm.register(2), Ok(0x02));
    assert_eq!(vm.register(0xF), Ok(1));
}

#[test]
fn shift_quirk_shifts_vx_in_place() {
    let mut vm = Vm::with_quirks(Quirks {
        shift_uses_vx: true,
        ..Quirks::default()
    });
    vm.load(&[0x60, 0x04, 0x61, 0xFF, 0x80, 0x16]).unwrap();
    for _ in 0..3 {
        vm.step().unwrap();
    }

    assert_eq!(vm.register(0), Ok(0x02));
    assert_eq!(vm.register(0xF), Ok(0));
}

#[test]
fn logic_quirk_resets_flag() {
    let mut vm = Vm::with_quirks(Quirks {
        logic_resets_vf: true,
        ..Quirks::default()
    });
    vm.load(&[0x6F, 0x07, 0x80, 0x11]).unwrap();
    vm.step().unwrap();
    vm.step().unwrap();

    assert_eq!(vm.register(0xF), Ok(0));
}

#[test]
fn skips_advance_by_four() {
    // V0 = 5; SE V0, 5 skips; SNE V0, 5 does not
    let vm = run(&[0x60, 0x05, 0x30, 0x05], 2);
    assert_eq!(vm.program_counter(), 0x206);

    let vm = run(&[0x60, 0x05, 0x40, 0x05], 2);
    assert_eq!(vm.program_counter(), 0x204);

    let vm = run(&[0x60, 0x05, 0x61, 0x05, 0x50, 0x10], 3);
    assert_eq!(vm.program_counter(), 0x208);

    let vm = run(&[0x60, 0x05, 0x61, 0x05, 0x90, 0x10], 3);
    assert_eq!(vm.program_counter(), 0x206);
}

#[test]
fn jumps() {
    let vm = run(&[0x13, 0x45], 1);
    assert_eq!(vm.program_counter(), 0x345);

    // V0 = 4, JP V0, 300
    let vm = run(&[0x60, 0x04, 0xB3, 0x00], 2);
    assert_eq!(vm.program_counter(), 0x304);

    let mut vm = Vm::with_quirks(Quirks {
        jump_uses_vx: true,
        ..Quirks::default()
    });
    // V3 = 2, B310 jumps to 310 + V3
    vm.load(&[0x63, 0x02, 0xB3, 0x10]).unwrap();
    vm.step().unwrap();
    vm.step().unwrap();
    assert_eq!(vm.program_counter(), 0x312);
}

#[test]
fn call_then_return_resumes_after_the_call() {
    // 200: CALL 206, 202: LD V1, 1, 204: JP 204, 206: RET
    let mut vm = vm_with(&[0x22, 0x06, 0x61, 0x01, 0x12, 0x04, 0x00, 0xEE]);
    let depth_before = vm.registers().call_stack().len();

    vm.step().unwrap();
    assert_eq!(vm.program_counter(), 0x206);
    assert_eq!(vm.registers().call_stack(), &[0x200]);

    vm.step().unwrap();
    assert_eq!(vm.program_counter(), 0x202);
    assert_eq!(vm.registers().call_stack().len(), depth_before);

    vm.step().unwrap();
    assert_eq!(vm.register(1), Ok(1));
}

#[test]
fn seventeenth_nested_call_overflows() {
    // 200: CALL 200, forever
    let mut vm = vm_with(&[0x22, 0x00]);
    for _ in 0..16 {
        vm.step().unwrap();
    }
    let before = vm.registers();

    assert_eq!(vm.step(), Err(VmError::StackOverflow { address: 0x200 }));
    assert_eq!(vm.registers(), before);
}

#[test]
fn return_with_empty_stack_underflows() {
    let mut vm = vm_with(&[0x00, 0xEE]);
    assert_eq!(vm.step(), Err(VmError::StackUnderflow));
    assert_eq!(vm.program_counter(), 0x200);
}

#[test]
fn unknown_opcode_is_skipped() {
    let mut vm = vm_with(&[0x60, 0x07, 0xFF, 0xFF, 0x01, 0x23]);
    vm.step().unwrap();
    let before = vm.registers();

    assert_eq!(
        vm.step(),
        Ok(StepOutcome::UnknownOpcode {
            address: 0x202,
            opcode: 0xFFFF
        })
    );
    let after = vm.registers();
    assert_eq!(after.pc, 0x204);
    assert_eq!(after.v, before.v);
    assert_eq!(after.i, before.i);

    // 0nnn machine-code routines are not supported either
    assert!(matches!(vm.step(), Ok(StepOutcome::UnknownOpcode { .. })));
    assert_eq!(vm.program_counter(), 0x206);
}

#[test]
fn draw_twice_restores_the_screen() {
    // I = glyph 0, draw at (10, 5), draw again
    let program = [0xA0, 0x00, 0x60, 0x0A, 0x61, 0x05, 0xD0, 0x15, 0xD0, 0x15];
    let mut vm = run(&program, 3);
    let blank = vm.framebuffer().clone();

    assert_eq!(vm.step(), Ok(StepOutcome::Drew));
    assert_eq!(vm.register(0xF), Ok(0));
    assert!(vm.framebuffer().is_lit(10, 5));
    assert!(!vm.framebuffer().is_lit(11, 6));
    assert_ne!(vm.framebuffer(), &blank);

    vm.step().unwrap();
    assert_eq!(vm.register(0xF), Ok(1));
    assert_eq!(vm.framebuffer(), &blank);
}

#[test]
fn draw_wraps_columns_and_clips_rows() {
    // I = glyph 8 (F0 90 F0 90 F0), V0 = 62, V1 = 30
    let program = [0xA0, 0x28, 0x60, 0x3E, 0x61, 0x1E, 0xD0, 0x15];
    let vm = run(&program, 4);
    let fb = vm.framebuffer();

    // F0 on row 30: columns 62, 63, 0, 1
    for x in [62, 63, 0, 1] {
        assert!(fb.is_lit(x, 30), "x = {x}");
    }
    assert!(!fb.is_lit(2, 30));
    // 90 on row 31: columns 62 and 1
    assert!(fb.is_lit(62, 31));
    assert!(fb.is_lit(1, 31));
    assert!(!fb.is_lit(63, 31));
    // Remaining rows fall off the bottom and are not wrapped to the top
    assert!(fb.rows().take(30).all(|row| row.iter().all(|&p| p == 0)));
    assert_eq!(fb.as_bytes().iter().filter(|&&p| p == 1).count(), 6);
    assert_eq!(fb.as_bytes().len(), DISPLAY_X * 32);
}

#[test]
fn draw_collision_is_cleared_by_next_clean_draw() {
    // Draw glyph 0 at (0,0) twice to set VF, then at (20,0)
    let program = [0xA0, 0x00, 0xD0, 0x05, 0xD0, 0x05, 0x60, 0x14, 0xD0, 0x05];
    let vm = run(&program, 5);
    assert_eq!(vm.register(0xF), Ok(0));
}

#[test]
fn draw_reading_past_memory_is_fatal_and_atomic() {
    // I = FFE, draw 5 rows
    let mut vm = run(&[0xAF, 0xFE, 0xD0, 0x05], 1);
    let before = vm.clone();

    assert_eq!(
        vm.step(),
        Err(VmError::MemoryOutOfBounds { address: 0x1000 })
    );
    assert_eq!(vm.registers(), before.registers());
    assert_eq!(vm.framebuffer(), before.framebuffer());
}

#[test]
fn clear_display() {
    let vm = run(&[0xD0, 0x05, 0x00, 0xE0], 2);
    assert!(vm.framebuffer().as_bytes().iter().all(|&p| p == 0));
}

#[test]
fn bcd_stores_three_digits() {
    // V0 = 123, I = 300, LD B, V0
    let vm = run(&[0x60, 0x7B, 0xA3, 0x00, 0xF0, 0x33], 3);
    assert_eq!(vm.peek_range(0x300, 3), &[1, 2, 3]);
}

#[test]
fn bcd_into_font_area_is_rejected() {
    let mut vm = run(&[0x60, 0x7B, 0xA0, 0x10, 0xF0, 0x33], 2);
    assert_eq!(vm.step(), Err(VmError::ReservedWrite { address: 0x10 }));
}

#[test]
fn font_char_points_at_glyph() {
    // V0 = 0xA, LD F, V0
    let vm = run(&[0x60, 0x0A, 0xF0, 0x29], 2);
    assert_eq!(vm.address_register(), 50);
    assert_eq!(glyph_address(0xA), 50);
    assert_eq!(vm.peek_range(50, 5), &[0xF0, 0x90, 0xF0, 0x90, 0x90]);
}

#[test]
fn font_char_scales_values_past_the_hex_digits() {
    // V0 = 0x1A, LD F, V0
    let vm = run(&[0x60, 0x1A, 0xF0, 0x29], 2);
    assert_eq!(vm.address_register(), 130);

    let vm = run(&[0x60, 0xFF, 0xF0, 0x29], 2);
    assert_eq!(vm.address_register(), 1275);
}

#[test]
fn store_and_load_registers() {
    // V0..V2 = 1,2,3; I = 400; store V0-V2; clear V0-V2; load V0-V1
    let program = [
        0x60, 0x01, 0x61, 0x02, 0x62, 0x03, 0xA4, 0x00, 0xF2, 0x55, 0x60, 0x00, 0x61, 0x00,
        0x62, 0x00, 0xF1, 0x65,
    ];
    let vm = run(&program, 9);

    assert_eq!(vm.peek_range(0x400, 3), &[1, 2, 3]);
    assert_eq!(vm.registers().v[..3], [1, 2, 0]);
    assert_eq!(vm.address_register(), 0x400);
}

#[test]
fn load_store_quirk_advances_index() {
    let mut vm = Vm::with_quirks(Quirks {
        load_store_increments_i: true,
        ..Quirks::default()
    });
    vm.load(&[0xA4, 0x00, 0xF3, 0x55]).unwrap();
    vm.step().unwrap();
    vm.step().unwrap();

    assert_eq!(vm.address_register(), 0x404);
}

#[test]
fn add_to_index() {
    let vm = run(&[0xA1, 0x00, 0x60, 0x20, 0xF0, 0x1E], 3);
    assert_eq!(vm.address_register(), 0x120);
}

#[test]
fn random_is_masked() {
    let mut vm = vm_with(&[0xC0, 0x0F, 0xC1, 0x00]);
    vm.step().unwrap();
    vm.step().unwrap();

    assert!(vm.register(0).unwrap() <= 0x0F);
    assert_eq!(vm.register(1), Ok(0));
}

#[test]
fn timers_decay_independently_of_steps() {
    // V0 = 3; DT = V0; ST = V0; V1 = DT
    let mut vm = run(&[0x60, 0x03, 0xF0, 0x15, 0xF0, 0x18], 3);
    assert!(vm.sound_active());

    vm.tick_timers();
    vm.tick_timers();
    assert_eq!(vm.registers().delay_timer, 1);
    assert!(vm.sound_active());

    vm.tick_timers();
    vm.tick_timers();
    assert_eq!(vm.registers().delay_timer, 0);
    assert_eq!(vm.registers().sound_timer, 0);
    assert!(!vm.sound_active());
}

#[test]
fn read_delay_timer() {
    let mut vm = vm_with(&[0xF2, 0x07]);
    vm.set_delay_timer(42);
    vm.step().unwrap();
    assert_eq!(vm.register(2), Ok(42));
}

#[test]
fn key_skips_default_to_not_pressed() {
    // V0 = 7; SKP V0 does not skip; SKNP V0 skips
    let vm = run(&[0x60, 0x07, 0xE0, 0x9E], 2);
    assert_eq!(vm.program_counter(), 0x204);

    let vm = run(&[0x60, 0x07, 0xE0, 0xA1], 2);
    assert_eq!(vm.program_counter(), 0x206);
}

#[test]
fn key_skips_follow_the_keypad_snapshot() {
    let mut vm = vm_with(&[0x60, 0x07, 0xE0, 0x9E]);
    let mut keys = [false; 16];
    keys[7] = true;
    vm.set_keypad(Keypad::from_keys(keys));

    vm.step().unwrap();
    vm.step().unwrap();
    assert_eq!(vm.program_counter(), 0x206);
}

#[test]
fn wait_for_key_needs_press_and_release() {
    let mut vm = vm_with(&[0xF3, 0x0A]);
    let key = u4::from_low_bits(0xC);

    assert_eq!(vm.step(), Ok(StepOutcome::WaitingForKey));
    assert_eq!(vm.program_counter(), 0x200);

    vm.set_key(key, true);
    assert_eq!(vm.step(), Ok(StepOutcome::WaitingForKey));
    assert_eq!(vm.program_counter(), 0x200);

    vm.set_key(key, false);
    assert_eq!(vm.step(), Ok(StepOutcome::Continue));
    assert_eq!(vm.register(3), Ok(0xC));
    assert_eq!(vm.program_counter(), 0x202);
}

#[test]
fn oversized_program_is_rejected_before_mutation() {
    let mut vm = Vm::new();
    let program = vec![0xAB; 4096 - 0x200 + 1];

    assert_eq!(
        vm.load(&program),
        Err(VmError::ProgramTooLarge {
            size: 3585,
            max_size: 3584
        })
    );
    assert_eq!(vm.peek(0x200), Ok(0));

    assert!(vm.load(&program[1..]).is_ok());
    assert_eq!(vm.peek(0xFFF), Ok(0xAB));
}

#[test]
fn load_after_first_step_is_rejected() {
    let mut vm = vm_with(&[0x60, 0x01]);
    vm.step().unwrap();
    assert_eq!(vm.load(&[0x00, 0xE0]), Err(VmError::ProgramAlreadyRunning));
    assert_eq!(vm.peek(0x200), Ok(0x60));
}

#[test]
fn failed_first_step_still_allows_loading() {
    let mut vm = vm_with(&[0x00, 0xEE]);
    assert_eq!(vm.step(), Err(VmError::StackUnderflow));

    vm.load(&[0x60, 0x07]).unwrap();
    assert_eq!(vm.step(), Ok(StepOutcome::Continue));
    assert_eq!(vm.register(0), Ok(7));
}

#[test]
fn fetch_past_end_of_memory_is_fatal() {
    let mut vm = Vm::new();
    vm.set_program_counter(0xFFF);
    assert_eq!(vm.step(), Err(VmError::MemoryOutOfBounds { address: 0x1000 }));
}

#[test]
fn register_access_is_bounds_checked() {
    let mut vm = Vm::new();
    assert_eq!(vm.register(16), Err(VmError::RegisterOutOfBounds { index: 16 }));
    assert_eq!(
        vm.set_register(16, 0),
        Err(VmError::RegisterOutOfBounds { index: 16 })
    );
}

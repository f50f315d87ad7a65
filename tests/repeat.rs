use std::sync::Arc;

use c28x_rs::render::fmt_tokens;
use c28x_rs::C28x;

fn text(arch: &C28x, data: &[u8], addr: u64) -> String {
    let (_, toks) = arch.instruction_text(data, addr).unwrap();
    fmt_tokens(&toks)
}

#[test]
fn rpt_marks_the_following_address() {
    let arch = C28x::default();
    // 0x100: rpt #3 ; 0x102: mov @0x12, al (repeatable)
    let info = arch.instruction_info(&[0xF6, 0x03], 0x100).unwrap();
    assert_eq!(info.size, 2);
    assert!(info.flow.falls_through);
    assert!(arch.state().is_repeat(0x102));
    assert!(!arch.state().is_repeat(0x100));

    assert_eq!(text(&arch, &[0xF6, 0x03], 0x100), "rpt #0x3");
    assert_eq!(text(&arch, &[0x96, 0x12], 0x102), "|| mov @0x12, al");
}

#[test]
fn rpt_with_loc_operand_also_marks() {
    let arch = C28x::default();
    // rpt @0x20
    arch.instruction_info(&[0xF7, 0x20], 0x200).unwrap();
    assert!(arch.state().is_repeat(0x202));
    assert_eq!(text(&arch, &[0xF7, 0x20], 0x200), "rpt @0x20");
}

#[test]
fn prefix_renders_only_for_repeatable_followers() {
    let arch = C28x::default();
    arch.instruction_info(&[0xF6, 0x03], 0x100).unwrap();
    // add al, loc16 is not a repeatable encoding; the marker stays but
    // the rendering carries no prefix
    assert_eq!(text(&arch, &[0x81, 0x12], 0x102), "add al, @0x12");
}

#[test]
fn markers_are_sticky_and_idempotent() {
    let arch = C28x::default();
    arch.instruction_info(&[0xF6, 0x03], 0x100).unwrap();
    arch.instruction_info(&[0xF6, 0x03], 0x100).unwrap();
    assert!(arch.state().is_repeat(0x102));
    // Re-rendering later still sees the marker
    assert_eq!(text(&arch, &[0x77, 0x00], 0x102), "|| nop");
    assert_eq!(text(&arch, &[0x77, 0x00], 0x102), "|| nop");
}

#[test]
fn shared_context_is_thread_safe() {
    let arch = Arc::new(C28x::default());
    let handles: Vec<_> = (0u64..4)
        .map(|i| {
            let arch = Arc::clone(&arch);
            std::thread::spawn(move || {
                let addr = 0x1000 + i * 0x10;
                arch.instruction_info(&[0xF6, 0x03], addr).unwrap();
                arch.instruction_info(&[0x77, 0x00], addr + 2).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    for i in 0u64..4 {
        assert!(arch.state().is_repeat(0x1000 + i * 0x10 + 2));
    }
}

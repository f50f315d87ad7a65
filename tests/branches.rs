use c28x_rs::flow::{FlowKind, Target};
use c28x_rs::render::fmt_tokens;
use c28x_rs::C28x;

fn info(arch: &C28x, data: &[u8], addr: u64) -> c28x_rs::InstrInfo {
    arch.instruction_info(data, addr).unwrap()
}

fn text(arch: &C28x, data: &[u8], addr: u64) -> String {
    let (_, toks) = arch.instruction_text(data, addr).unwrap();
    fmt_tokens(&toks)
}

#[test]
fn long_branch_targets_past_the_instruction() {
    // b +0x10 at 0x100: 4-byte instruction, so the branch lands at
    // 0x100 + 4 + 0x10 = 0x114
    let arch = C28x::default();
    let data = [0xFF, 0xE0, 0x00, 0x10];
    let i = info(&arch, &data, 0x100);
    assert_eq!(i.size, 4);
    assert!(i.flow.is_branch());
    assert!(!i.flow.falls_through);
    assert_eq!(i.flow.target(), Some(0x114));
    assert_eq!(text(&arch, &data, 0x100), "b 0x114");
}

#[test]
fn long_branch_displacement_is_signed() {
    // 21-bit displacement of -4: 0x1FFFFC
    let arch = C28x::default();
    let data = [0xFF, 0xFF, 0xFF, 0xFC];
    let i = info(&arch, &data, 0x100);
    assert_eq!(i.flow.target(), Some(0x100));
}

#[test]
fn short_branch_conditional_unless_cond_is_unc() {
    let arch = C28x::default();
    // sb +0x10, neq
    let i = info(&arch, &[0x60, 0x10], 0x100);
    assert_eq!(i.size, 2);
    assert_eq!(
        i.flow.kind,
        FlowKind::Branch {
            target: Target::Absolute(0x112),
            conditional: true,
        }
    );
    assert!(i.flow.falls_through);
    assert_eq!(text(&arch, &[0x60, 0x10], 0x100), "sb 0x112, neq");

    // sb +0x10, unc: same family, no fallthrough
    let i = info(&arch, &[0x6F, 0x10], 0x100);
    assert!(!i.flow.falls_through);
    assert_eq!(text(&arch, &[0x6F, 0x10], 0x100), "sb 0x112, unc");
}

#[test]
fn bf_carries_a_sixteen_bit_displacement() {
    let arch = C28x::default();
    // bf +0x10, gt (cond in bits 19:16)
    let data = [0x56, 0x02, 0x00, 0x10];
    let i = info(&arch, &data, 0x100);
    assert_eq!(i.size, 4);
    assert_eq!(i.flow.target(), Some(0x114));
    assert!(i.flow.falls_through);
    assert_eq!(text(&arch, &data, 0x100), "bf 0x114, gt");
}

#[test]
fn banz_is_always_conditional() {
    let arch = C28x::default();
    // banz -2, *ar3--
    let data = [0x58, 0x03, 0xFF, 0xFE];
    let i = info(&arch, &data, 0x100);
    assert_eq!(i.flow.target(), Some(0x102));
    assert!(i.flow.falls_through);
    assert_eq!(text(&arch, &data, 0x100), "banz 0x102, *ar3--");
}

#[test]
fn absolute_calls_and_branches_use_the_raw_immediate() {
    let arch = C28x::default();
    // lcr 0x1234
    let data = [0x76, 0x40, 0x12, 0x34];
    let i = info(&arch, &data, 0x100);
    assert!(i.flow.is_call());
    assert!(i.flow.falls_through);
    assert_eq!(i.flow.target(), Some(0x1234));
    assert_eq!(text(&arch, &data, 0x100), "lcr 0x1234");

    // lb 0x1234: same immediate, no fallthrough
    let data = [0x76, 0x80, 0x12, 0x34];
    let i = info(&arch, &data, 0x100);
    assert!(i.flow.is_branch());
    assert!(!i.flow.falls_through);
    assert_eq!(i.flow.target(), Some(0x1234));
}

#[test]
fn indirect_transfers_have_no_static_target() {
    let arch = C28x::default();
    // lb *xar7
    let i = info(&arch, &[0x76, 0x27], 0);
    assert!(i.flow.is_branch());
    assert!(!i.flow.falls_through);
    assert_eq!(i.flow.target(), None);
    assert_eq!(text(&arch, &[0x76, 0x27], 0), "lb *xar7");

    // lcr *xar3
    let i = info(&arch, &[0x3E, 0x63], 0);
    assert!(i.flow.is_call());
    assert!(i.flow.falls_through);
    assert_eq!(i.flow.target(), None);
    assert_eq!(text(&arch, &[0x3E, 0x63], 0), "lcr *xar3");
}

#[test]
fn returns_do_not_fall_through() {
    let arch = C28x::default();
    for ret in [[0x76u8, 0x05], [0x76, 0x02]] {
        let i = info(&arch, &ret, 0);
        assert!(i.flow.is_return());
        assert!(!i.flow.falls_through);
    }
}

#[test]
fn trap_resumes_after_the_instruction() {
    let arch = C28x::default();
    let i = info(&arch, &[0x00, 0x25], 0);
    assert_eq!(i.flow.kind, FlowKind::Trap);
    assert!(i.flow.falls_through);
    assert_eq!(text(&arch, &[0x00, 0x25], 0), "trap #0x5");
}

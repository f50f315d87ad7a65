use pretty_assertions::assert_eq;

use c28x_rs::render::fmt_tokens;
use c28x_rs::{C28x, DecodeError, LiftError};

fn text(arch: &C28x, data: &[u8], addr: u64) -> (usize, String) {
    let (size, toks) = arch.instruction_text(data, addr).unwrap();
    (size, fmt_tokens(&toks))
}

#[test]
fn eallow_decodes_as_two_byte_sequential() {
    let arch = C28x::default();
    assert_eq!(text(&arch, &[0x76, 0x22], 0), (2, "eallow".to_string()));
    let info = arch.instruction_info(&[0x76, 0x22], 0).unwrap();
    assert_eq!(info.size, 2);
    assert!(info.flow.falls_through);
    assert_eq!(info.flow.target(), None);
}

#[test]
fn unknown_word_reports_no_match_with_address() {
    let arch = C28x::default();
    let err = arch.instruction_text(&[0x00, 0x00], 0x200).unwrap_err();
    assert_eq!(err, DecodeError::NoMatch { addr: 0x200 });
    assert_eq!(err.to_string(), "no instruction decodes at 0x0200");
}

#[test]
fn immediate_with_shift_attaches_to_operand() {
    // mov acc, #0x1234 << #2: shift count in bits 19:16
    let arch = C28x::default();
    assert_eq!(
        text(&arch, &[0xFF, 0x22, 0x12, 0x34], 0),
        (4, "mov acc, #0x1234 << #2".to_string())
    );
}

#[test]
fn status_bit_masks_render_by_name() {
    let arch = C28x::default();
    // 0x09 = SXM | C
    assert_eq!(text(&arch, &[0x29, 0x09], 0), (2, "clrc sxm|c".to_string()));
    assert_eq!(text(&arch, &[0x3B, 0x10], 0), (2, "setc intm".to_string()));
}

#[test]
fn byte_immediates_render_signed_and_unsigned() {
    let arch = C28x::default();
    assert_eq!(text(&arch, &[0x9E, 0x2A], 0), (2, "movb al, #0x2a".to_string()));
    // ADDB takes a signed byte
    assert_eq!(text(&arch, &[0x9C, 0xFE], 0), (2, "addb al, #-0x2".to_string()));
}

#[test]
fn shift_counts_are_stored_off_by_one() {
    let arch = C28x::default();
    assert_eq!(text(&arch, &[0xFF, 0xC0], 0), (2, "lsr acc, #1".to_string()));
    assert_eq!(text(&arch, &[0xFF, 0xDF], 0), (2, "lsl acc, #16".to_string()));
}

#[test]
fn lifting_is_reserved_but_still_decodes_first() {
    let arch = C28x::default();
    assert_eq!(
        arch.instruction_il(&[0x76, 0x22], 0),
        Err(LiftError::Unimplemented { mnemonic: "eallow" })
    );
    // Decode failures surface as decode failures, not as a missing lifter
    assert_eq!(
        arch.instruction_il(&[0x00, 0x00], 0x40),
        Err(LiftError::Decode(DecodeError::NoMatch { addr: 0x40 }))
    );
}

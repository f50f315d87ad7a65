use c28x_rs::decoder::{read_word16, read_word32, select, validate, Size};
use c28x_rs::isa::c28::CATALOG;
use c28x_rs::ObjectMode;

#[test]
fn shipped_catalog_validates() {
    validate(CATALOG).unwrap();
}

#[test]
fn word_patterns_fit_sixteen_bits() {
    for enc in CATALOG {
        if enc.size == Size::Word {
            assert!(enc.bits <= 0xFFFF, "{} bits {:#x}", enc.mnemonic, enc.bits);
            assert!(enc.mask <= 0xFFFF, "{} mask {:#x}", enc.mnemonic, enc.mask);
        }
    }
}

#[test]
fn four_byte_patterns_win_over_two_byte() {
    // 0xFFE00010 is simultaneously a long branch (32-bit, 0xFFE00000
    // family) and, in its leading half, an SFR shift (16-bit, 0xFFE0
    // family). With four bytes available the long branch must win.
    let data = [0xFF, 0xE0, 0x00, 0x10];
    assert!(read_word32(&data).is_some());
    let m = select(CATALOG, &data, ObjectMode::C27).unwrap();
    assert_eq!(m.enc.mnemonic, "b");
    assert_eq!(m.size(), 4);
}

#[test]
fn truncated_window_falls_back_to_word_patterns() {
    // Same leading bytes, but only two of them: the 4-byte family is
    // never consulted and the 16-bit shift claims the word.
    let data = [0xFF, 0xE0];
    let m = select(CATALOG, &data, ObjectMode::C27).unwrap();
    assert_eq!(m.enc.mnemonic, "sfr");
    assert_eq!(m.size(), 2);
}

#[test]
fn short_buffer_with_only_dword_candidates_matches_nothing() {
    // 0x5602 is the leading half of a BF encoding and no 16-bit
    // pattern claims it. With two bytes the 4-byte family cannot be
    // consulted, so the whole decode comes up empty instead of
    // guessing at the truncated long form.
    let data = [0x56, 0x02];
    assert!(select(CATALOG, &data, ObjectMode::C27).is_none());
    assert!(select(CATALOG, &data, ObjectMode::C28).is_none());
    // The same leading bytes with the full word present decode as BF
    let m = select(CATALOG, &[0x56, 0x02, 0x00, 0x10], ObjectMode::C27).unwrap();
    assert_eq!(m.enc.mnemonic, "bf");
    assert_eq!(m.size(), 4);
}

#[test]
fn sub_word_window_matches_nothing() {
    assert_eq!(read_word16(&[0x76]), None);
    assert!(select(CATALOG, &[0x76], ObjectMode::C27).is_none());
    assert!(select(CATALOG, &[], ObjectMode::C28).is_none());
}

#[test]
fn undefined_word_matches_nothing() {
    assert!(select(CATALOG, &[0x00, 0x00], ObjectMode::C27).is_none());
    assert!(select(CATALOG, &[0x00, 0x00], ObjectMode::C28).is_none());
}

use anyhow::Result;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Segment {
    pub name: String,
    pub base: u64,
    pub bytes: Vec<u8>,
    pub perms: &'static str, // e.g., "r-x"
    pub kind: &'static str,  // e.g., "raw"
}

#[derive(Debug, Clone)]
pub struct Image {
    pub segments: Vec<Segment>,
}

pub fn load_raw_bin(path: &Path, base: u64, skip: usize, len: Option<usize>) -> Result<Image> {
    let file = std::fs::read(path)?;
    anyhow::ensure!(skip <= file.len(), "--skip exceeds file size");
    let mut payload = &file[skip..];
    if let Some(lim) = len {
        anyhow::ensure!(lim <= payload.len(), "--len exceeds remaining file size after skip");
        payload = &payload[..lim];
    }
    let seg = Segment {
        name: "segment0".into(),
        base,
        bytes: payload.to_vec(),
        perms: "r-x",
        kind: "raw",
    };
    Ok(Image {
        segments: vec![seg],
    })
}

/// Remaining bytes of the segment containing `addr`; the decoder takes
/// whatever window is left and fails closed near the segment end.
pub fn window(img: &Image, addr: u64) -> Option<&[u8]> {
    for s in &img.segments {
        let start = s.base;
        let end = s.base.wrapping_add(s.bytes.len() as u64);
        if addr >= start && addr < end {
            return Some(&s.bytes[(addr - start) as usize..]);
        }
    }
    None
}

pub fn read_u8(img: &Image, addr: u64) -> Option<u8> {
    window(img, addr).and_then(|w| w.first().copied())
}

pub fn read_be16(img: &Image, addr: u64) -> Option<u16> {
    let b0 = read_u8(img, addr)?;
    let b1 = read_u8(img, addr.wrapping_add(1))?;
    Some(u16::from_be_bytes([b0, b1]))
}

pub fn is_mapped(img: &Image, addr: u64) -> bool {
    window(img, addr).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loader_maps_skip_and_len() {
        // unique scratch path; nothing lands in the source tree even
        // when an assertion fails
        let path = std::env::temp_dir().join(format!("c28x_loader_{}.bin", std::process::id()));
        std::fs::write(&path, [0u8, 1, 2, 3, 4, 5]).unwrap();
        let img = load_raw_bin(&path, 0x8000, 2, Some(3)).unwrap();
        assert_eq!(img.segments.len(), 1);
        let s = &img.segments[0];
        assert_eq!(s.base, 0x8000);
        assert_eq!(s.bytes, vec![2, 3, 4]);
        assert_eq!(read_be16(&img, 0x8000), Some(0x0203));
        assert_eq!(read_be16(&img, 0x8002), None);
        assert_eq!(window(&img, 0x8002).map(<[u8]>::len), Some(1));
        let _ = std::fs::remove_file(&path);
    }
}

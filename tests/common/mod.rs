
//! Assemble file headers byte by byte.

#![allow(dead_code)]

pub const MAGIC: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

pub const SCAN_LINE: u32 = 0x2;
pub const TILED: u32 = 0x202;

/// Every required attribute of scan line files, in canonical order.
pub const REQUIRED: [&str; 8] = [
    "channels", "compression", "dataWindow", "displayWindow",
    "lineOrder", "pixelAspectRatio", "screenWindowCenter", "screenWindowWidth",
];

pub const HALF: i32 = 1;
pub const FLOAT: i32 = 2;


#[derive(Clone, Debug)]
pub struct HeaderBytes {
    bytes: Vec<u8>,
}

impl HeaderBytes {
    pub fn new(version: u32) -> Self {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        HeaderBytes { bytes }
    }

    pub fn attribute(self, name: &str, kind: &str, payload: &[u8]) -> Self {
        let size = payload.len() as i32;
        self.attribute_sized(name, kind, size, payload)
    }

    pub fn attribute_sized(mut self, name: &str, kind: &str, declared_size: i32, payload: &[u8]) -> Self {
        push_text(&mut self.bytes, name);
        push_text(&mut self.bytes, kind);
        self.bytes.extend_from_slice(&declared_size.to_le_bytes());
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Terminate the attribute list.
    pub fn finish(mut self) -> Vec<u8> {
        self.bytes.push(0);
        self.bytes
    }
}

fn push_text(bytes: &mut Vec<u8>, text: &str) {
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(0);
}


/// Channel list payload with `(name, pixel type, x sampling, y sampling)` entries.
pub fn channels(list: &[(&str, i32, i32, i32)]) -> Vec<u8> {
    let mut bytes = Vec::new();

    for &(name, pixel_type, x_sampling, y_sampling) in list {
        push_text(&mut bytes, name);
        bytes.extend_from_slice(&pixel_type.to_le_bytes());
        bytes.extend_from_slice(&[ 0, 0, 0, 0 ]); // linear flag and reserved bytes
        bytes.extend_from_slice(&x_sampling.to_le_bytes());
        bytes.extend_from_slice(&y_sampling.to_le_bytes());
    }

    bytes.push(0);
    bytes
}

pub fn i32s(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

pub fn f32s(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

pub fn tile_description(width: u32, height: u32, mode: u8) -> Vec<u8> {
    let mut bytes = width.to_le_bytes().to_vec();
    bytes.extend_from_slice(&height.to_le_bytes());
    bytes.push(mode);
    bytes
}

/// Add the value of a required attribute with typical contents.
/// The image is four by four pixels, `ZIP16` compressed, with half `RGBA` channels.
pub fn required(header: HeaderBytes, name: &str) -> HeaderBytes {
    match name {
        "channels" => header.attribute(name, "chlist", &channels(&[
            ("G", HALF, 1, 1), ("R", HALF, 1, 1), ("B", HALF, 1, 1), ("A", HALF, 1, 1),
        ])),

        "compression" => header.attribute(name, "compression", &[ 3 ]),
        "dataWindow" => header.attribute(name, "box2i", &i32s(&[ 0, 0, 3, 3 ])),
        "displayWindow" => header.attribute(name, "box2i", &i32s(&[ 0, 0, 3, 3 ])),
        "lineOrder" => header.attribute(name, "lineOrder", &[ 0 ]),
        "pixelAspectRatio" => header.attribute(name, "float", &f32s(&[ 1.0 ])),
        "screenWindowCenter" => header.attribute(name, "v2f", &f32s(&[ 0.0, 0.0 ])),
        "screenWindowWidth" => header.attribute(name, "float", &f32s(&[ 1.0 ])),
        "tiles" => header.attribute(name, "tiledesc", &tile_description(32, 32, 0)),
        other => panic!("{} is not a required attribute", other),
    }
}

/// A scan line header with all required attributes except the skipped one.
pub fn scan_line_header_without(skipped: Option<&str>) -> HeaderBytes {
    REQUIRED.iter()
        .filter(|&&name| Some(name) != skipped)
        .fold(HeaderBytes::new(SCAN_LINE), |header, name| required(header, name))
}

/// A scan line header with all required attributes and no terminator.
pub fn scan_line_header() -> HeaderBytes {
    scan_line_header_without(None)
}

/// A tiled header with all required attributes, the specified tile mode and no terminator.
pub fn tiled_header(tile_mode: u8) -> HeaderBytes {
    REQUIRED.iter()
        .fold(HeaderBytes::new(TILED), |header, name| required(header, name))
        .attribute("tiles", "tiledesc", &tile_description(32, 32, tile_mode))
}

/// Append an offset table and the blocks it points to.
/// Each block is a `(y, bytes)` pair.
pub fn with_blocks(mut header: Vec<u8>, blocks: &[(i32, &[u8])]) -> Vec<u8> {
    let mut position = (header.len() + blocks.len() * 8) as u64;

    for (_, bytes) in blocks {
        header.extend_from_slice(&position.to_le_bytes());
        position += 8 + bytes.len() as u64;
    }

    for (y, bytes) in blocks {
        header.extend_from_slice(&y.to_le_bytes());
        header.extend_from_slice(&(bytes.len() as i32).to_le_bytes());
        header.extend_from_slice(bytes);
    }

    header
}

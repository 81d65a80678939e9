
//! Fuzzy testing.
//! Tries to discover panics by mutating valid headers at random.
//! The long-running variant is marked with `#[ignore]`. To run it, use `cargo test -- --ignored`.

extern crate aces;
use aces::prelude::*;

use std::io::Cursor;
use std::panic::catch_unwind;
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;

mod common;
use common::*;


fn valid_files() -> Vec<Vec<u8>> {
    let with_user_attributes = scan_line_header()
        .attribute("comments", "string", b"fuzzy")
        .attribute("owners", "stringvector", &[ 3, 0, 0, 0, b'a', b'b', b'c' ])
        .attribute("preview", "preview", &[ 1, 0, 0, 0, 1, 0, 0, 0, 9, 9, 9, 9 ])
        .attribute("studio", "studioBlob", &[ 1, 2, 3 ])
        .attribute("matrix", "m33f", &f32s(&[ 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0 ]))
        .finish();

    vec![
        with_blocks(scan_line_header().finish(), &[ (0, &[ 1, 2, 3, 4 ]) ]),
        with_user_attributes,
        tiled_header(0).finish(),
    ]
}

/// Open, query and read the file without checking any result.
fn exercise(bytes: Vec<u8>) {
    let options = ReadOptions::default().with_error_sink(|_| {});

    if let Ok(mut file) = ImageFile::from_stream(Cursor::new(bytes), "fuzz", options) {
        let _ = file.image_byte_size();
        let _ = file.plane_byte_size("R");

        let mut summary = Vec::new();
        let _ = file.print_header(&mut summary, true);

        let mut pixels = vec![ 0_u8; 256 ];
        let _ = file.read_image(&mut pixels, 32);
        let _ = file.read_plane("G", &mut pixels, 8);
        file.close();
    }
}

fn mutate(random: &mut StdRng, files: &[Vec<u8>]) -> Vec<u8> {
    let mut file = files[random.random_range(0 .. files.len())].clone();

    for _ in 0 .. random.random_range(1 .. 4) {
        let index = random.random_range(0 .. file.len());

        match random.random_range(0 .. 3) {
            0 => file[index] = random.random(),
            1 => file.truncate(index),
            _ => file.insert(index, random.random()),
        }

        if file.is_empty() { break; }
    }

    file
}

fn fuzz_with(iterations: u64, seed: u64) {
    let files = valid_files();
    let mut random = StdRng::seed_from_u64(seed);

    for fuzz_index in 0 .. iterations {
        let file = mutate(&mut random, &files);
        let for_panic_message = file.clone();

        let result = catch_unwind(move || exercise(file));
        assert!(result.is_ok(), "panic at fuzz index {} with bytes {:?}", fuzz_index, for_panic_message);
    }
}


#[test]
fn valid_files_open(){
    for bytes in valid_files() {
        let options = ReadOptions::default().with_error_sink(|message| panic!("{}", message));
        assert!(ImageFile::from_stream(Cursor::new(bytes), "valid", options).is_ok());
    }
}

#[test]
fn mutations_do_not_panic(){
    fuzz_with(4096, 2020);
}

#[test]
#[ignore]
fn fuzz(){
    fuzz_with(1024 * 1024, 11);
}

/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

#![no_main]

use libfuzzer_sys::fuzz_target;
use tessera_jpeg::idct::lanes::idct_lanes;
use tessera_jpeg::idct::scalar::idct_int;

fuzz_target!(|data: [i32; 64]| {
    let mut scalar_in = data;
    let mut lanes_in = data;

    let mut scalar_out = [0_i16; 64];
    let mut lanes_out = [0_i16; 64];

    idct_int(&mut scalar_in, &mut scalar_out, 8);
    idct_lanes(&mut lanes_in, &mut lanes_out, 8);

    assert_eq!(scalar_out, lanes_out);
});

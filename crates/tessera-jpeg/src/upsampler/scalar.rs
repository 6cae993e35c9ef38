/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

/// Double the width of a row with the triangle filter
///
/// `output` must be twice as long as `input`.
pub fn upsample_horizontal(input: &[i16], output: &mut [i16]) {
    debug_assert_eq!(
        input.len() * 2,
        output.len(),
        "Input length is not half the size of the output length"
    );

    match input.len() {
        0 => return,
        1 => {
            output.fill(input[0]);
            return;
        }
        _ => ()
    }

    output[0] = input[0];
    output[1] = (input[0] * 3 + input[1] + 2) >> 2;

    // The output of a pixel is determined by it's surrounding neighbours but we attach more weight to it's nearest
    // neighbour (input[i]) than to the next nearest neighbour.
    for (output_window, input_window) in output[2..].chunks_exact_mut(2).zip(input.windows(3)) {
        let sample = 3 * input_window[1] + 2;

        output_window[0] = (sample + input_window[0]) >> 2;
        output_window[1] = (sample + input_window[2]) >> 2;
    }
    // the last input sample has no right neighbour
    let last = input.len() - 1;
    let out_len = output.len();

    output[out_len - 2] = (3 * input[last] + input[last - 1] + 2) >> 2;
    output[out_len - 1] = input[last];
}

/// Produce one output row of a vertically doubled plane
///
/// `near` is the input row closest to the output row, `far` the
/// neighbour on the other side.
pub fn upsample_vertical(near: &[i16], far: &[i16], output: &mut [i16]) {
    for ((near, far), out) in near.iter().zip(far.iter()).zip(output.iter_mut()) {
        *out = ((3 * near) + 2 + far) >> 2;
    }
}

/// Stretch a row by an integral factor by repeating samples
pub fn upsample_replicate(input: &[i16], factor: usize, output: &mut [i16]) {
    for (out, sample) in output.chunks_mut(factor).zip(input.iter()) {
        out.fill(*sample);
    }
}

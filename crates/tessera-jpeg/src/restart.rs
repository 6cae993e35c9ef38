/*
 * Copyright (c) 2023.
 *
 * This software is free software;
 *
 * You can redistribute it or modify it under terms of the MIT, Apache License or Zlib license
 */

//! Restart interval handling
//!
//! At the end of every restart interval the stream should carry
//! `RSTn` with `n` cycling through 0..=7. When something else is found
//! the decoder picks one of three ways to get back in sync, the stream
//! is never read backwards past the marker being looked at.

use tessera_core::log::trace;

use crate::bitstream::BitStream;
use crate::decoder::JpegDecoder;
use crate::errors::{DecodeErrors, DecodeWarning};
use crate::marker::find_marker;

/// What to do with an unexpected marker at a restart boundary
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ResyncAction {
    /// Drop the marker, entropy decoding resumes at the next byte
    Discard,
    /// Drop the marker and scan forward for the next one
    SeekNext,
    /// Leave the marker in the stream, the interval decodes as empty
    /// and the marker is looked at again later
    KeepMarker
}

/// Choose how to recover when `marker` is found where `RST{expected}` should be
///
/// `marker` is the byte following `0xFF`.
pub fn resync_action(marker: u8, expected: u8) -> ResyncAction {
    if marker < 0xC0 {
        // not a legal marker, junk in the stream
        return ResyncAction::SeekNext;
    }
    if !(0xD0..=0xD7).contains(&marker) {
        return ResyncAction::KeepMarker;
    }
    let found = marker - 0xD0;

    if found == (expected + 1) & 7 || found == (expected + 2) & 7 {
        // a few intervals went missing, the marker belongs to a later interval
        ResyncAction::KeepMarker
    } else if found == expected.wrapping_sub(1) & 7 || found == expected.wrapping_sub(2) & 7 {
        // a marker we already passed, look for the right one
        ResyncAction::SeekNext
    } else {
        ResyncAction::Discard
    }
}

/// Restart bookkeeping for a single scan
pub(crate) struct RestartState {
    /// MCUs between restart markers, zero disables restarts
    interval:                 usize,
    /// MCUs left in the current interval
    todo:                     usize,
    /// Index of the next expected `RSTn`
    pub expected:             u8,
    /// The stream can no longer be synchronized, remaining
    /// restarts in this scan are no-ops
    pub stalled:              bool,
    /// The current interval is known to be empty
    pub dummy_segment:        bool,
    /// A missing data warning was already recorded for this interval
    pub truncation_reported:  bool
}

impl RestartState {
    pub(crate) const fn new(interval: usize) -> RestartState {
        RestartState {
            interval,
            todo: interval,
            expected: 0,
            stalled: false,
            dummy_segment: false,
            truncation_reported: false
        }
    }

    /// Account for the MCU about to be decoded
    ///
    /// Returns true if a restart marker must be processed before it.
    #[inline(always)]
    pub(crate) fn restart_due(&mut self) -> bool {
        if self.interval == 0 {
            return false;
        }
        let due = self.todo == 0;

        if due {
            self.todo = self.interval;
        }
        self.todo -= 1;
        due
    }
}

impl<'a> JpegDecoder<'a> {
    /// Process a restart boundary
    ///
    /// Entropy state is always reset, the marker is then located
    /// and checked against the expected index.
    #[cold]
    pub(crate) fn handle_rst(
        &mut self, stream: &mut BitStream, state: &mut RestartState
    ) -> Result<(), DecodeErrors> {
        stream.reset();
        self.components.iter_mut().for_each(|x| x.dc_pred = 0);

        let expected = state.expected;

        state.expected = (expected + 1) & 7;
        state.dummy_segment = false;

        if state.stalled {
            return Ok(());
        }
        state.truncation_reported = false;

        if stream.marker.is_none() {
            // bytes of the previous interval may still be unread
            stream.refill(&mut self.stream);
            stream.reset();
        }

        loop {
            let marker = match stream.marker.take() {
                Some(marker) => {
                    self.stream.skip(2);
                    marker
                }
                None => match find_marker(&mut self.stream) {
                    (Some(marker), _) => marker,
                    (None, _) => {
                        state.stalled = true;
                        state.truncation_reported = true;

                        return self.push_warning(DecodeWarning::MissingRestartMarker { expected });
                    }
                }
            };

            if marker == 0xD0 + expected {
                trace!("RST{expected}");
                return Ok(());
            }

            let action = resync_action(marker, expected);

            self.push_warning(DecodeWarning::RestartResync {
                expected,
                found: marker,
                action
            })?;

            match action {
                ResyncAction::Discard => return Ok(()),
                ResyncAction::SeekNext => continue,
                ResyncAction::KeepMarker => {
                    // put the marker back, the reader sits on its 0xFF
                    self.stream.rewind(2)?;
                    stream.marker = Some(marker);

                    if (0xD0..=0xD7).contains(&marker) {
                        state.dummy_segment = true;
                    } else {
                        state.stalled = true;
                        state.truncation_reported = true;
                    }
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{resync_action, ResyncAction, RestartState};

    #[test]
    fn restarts_ahead_are_kept() {
        for expected in 0..8_u8 {
            let ahead_one = 0xD0 + ((expected + 1) & 7);
            let ahead_two = 0xD0 + ((expected + 2) & 7);

            assert_eq!(resync_action(ahead_one, expected), ResyncAction::KeepMarker);
            assert_eq!(resync_action(ahead_two, expected), ResyncAction::KeepMarker);
        }
    }

    #[test]
    fn restarts_behind_seek() {
        for expected in 0..8_u8 {
            let behind_one = 0xD0 + (expected.wrapping_sub(1) & 7);
            let behind_two = 0xD0 + (expected.wrapping_sub(2) & 7);

            assert_eq!(resync_action(behind_one, expected), ResyncAction::SeekNext);
            assert_eq!(resync_action(behind_two, expected), ResyncAction::SeekNext);
        }
    }

    #[test]
    fn restarts_far_away_are_discarded() {
        // 3, 4 and 5 steps away from RST0
        for far in [0xD3, 0xD4, 0xD5] {
            assert_eq!(resync_action(far, 0), ResyncAction::Discard);
        }
        assert_eq!(resync_action(0xD4, 7), ResyncAction::Discard);
    }

    #[test]
    fn other_markers() {
        // junk below SOF0 is skipped, real markers are left for the parser
        assert_eq!(resync_action(0x01, 0), ResyncAction::SeekNext);
        assert_eq!(resync_action(0xBF, 0), ResyncAction::SeekNext);
        assert_eq!(resync_action(0xD9, 0), ResyncAction::KeepMarker);
        assert_eq!(resync_action(0xC4, 3), ResyncAction::KeepMarker);
    }

    #[test]
    fn restart_due_every_interval() {
        let mut state = RestartState::new(3);
        let due: Vec<bool> = (0..7).map(|_| state.restart_due()).collect();
        assert_eq!(due, [false, false, false, true, false, false, true]);

        let mut state = RestartState::new(0);
        assert!((0..10).all(|_| !state.restart_due()));
    }
}

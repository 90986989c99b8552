//! Edits to the main Elite code file (gma6), as loaded in memory.

use c64patch::{Patch, PatchScript};

// Helper routines appended to the end of the code by `extra.bin`.
const LSPUT: u16 = 0xCCE0;
const FLICKER_PATCH1: u16 = 0xCD1E;
const FLICKER_PATCH2: u16 = 0xCD35;

// Entry points inside `editor.bin`, which replaces the music data.
const EDITOR: u16 = 0xB72D;
const EDITOR_PATCH1: u16 = 0xB72D;
const EDITOR_PATCH2: u16 = 0xB738;
const EDITOR_PATCH3: u16 = 0xB745;

/// Flicker-free ship drawing followed by the Universe Editor.
pub fn gma6() -> PatchScript {
    let mut script = flicker_free();
    script.extend(universe_editor().patches().iter().cloned());
    script
}

/// Ship lines are erased and redrawn one at a time instead of wiping the whole
/// ship first.
pub fn flicker_free() -> PatchScript {
    [
        // SHPPT, shorter than the original.
        Patch::blob(0x9932, "shppt.bin"),
        // LL9 part 1: LDA #31 / STA XX4 moves into PATCH1.
        Patch::jsr(0x9A8A, FLICKER_PATCH1),
        Patch::filler(0x9A8D, 1),
        // LL9 part 9, EE31: LDY #9 / LDA (XX0),Y / STA XX20.
        Patch::bytes(0x9F2A, [0xA0, 0x09, 0xB1, 0x57, 0x85, 0xAE]),
        Patch::filler(0x9F30, 3),
        // LL9 part 9, after LL74: LDY #0 / STY XX17.
        Patch::bytes(0x9F39, [0xA0, 0x00, 0x84, 0x9F]),
        Patch::filler(0x9F3D, 10),
        // LL9 part 9, line heap stores go through LSPUT.
        Patch::jsr(0x9F87, LSPUT),
        Patch::filler(0x9F8A, 21),
        // LL9 part 10, LL75: STA CNT / LDY #0.
        Patch::bytes(0x9FB4, [0x85, 0x30, 0xA0, 0x00]),
        Patch::filler(0x9FC1, 1),
        // LL9 part 10, LL79: INY / LDA (V),Y / TAX, then the four LDA/STA
        // pairs move down to make room.
        Patch::bytes(0x9FD9, [0xC8, 0xB1, 0x5B, 0xAA]),
        Patch::shift(0x9FE1, 0x9FDD, 4 * 5),
        Patch::bytes(0x9FF1, [0xC8, 0xB1, 0x5B, 0xAA]),
        Patch::filler(0x9FF5, 2),
        // LL9 part 10: JMP LL80 becomes JMP PATCH2.
        Patch::jmp(0xA010, FLICKER_PATCH2),
        // LL9 part 11.
        Patch::filler(0xA13F, 28),
        Patch::blob(0xA15B, "ll78.bin"),
        // LL9 part 12.
        Patch::blob(0xA178, "ll155.bin"),
        // LSPUT, PATCH1 and PATCH2 at the tail. Must stay after the edits
        // above that call into it.
        Patch::append("extra.bin"),
    ]
    .into_iter()
    .collect()
}

/// Universe Editor over the title and docking music.
pub fn universe_editor() -> PatchScript {
    [
        // Music routine returns at once.
        Patch::rts(0x920D),
        // BR1: JSR TITLE.
        Patch::jsr(0x8899, EDITOR_PATCH1),
        // TITLE: subtitle.
        Patch::jsr(0x8969, EDITOR_PATCH2),
        Patch::filler(0x896C, 12),
        // BEGIN: JSR JAMESON, defaults to disk.
        Patch::jsr(0x8879, EDITOR_PATCH3),
        Patch::blob(EDITOR, "editor.bin"),
    ]
    .into_iter()
    .collect()
}
